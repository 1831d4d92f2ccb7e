//! Derive macros for Livelist
//!
//! This crate provides procedural macros to reduce boilerplate in action
//! enums driven through the Livelist store.
//!
//! # Available Macros
//!
//! - `#[derive(Action)]` - Generates helpers for action enums (commands/events)
//!
//! # Example
//!
//! ```ignore
//! use livelist_macros::Action;
//!
//! #[derive(Action, Clone, Debug)]
//! enum TodoAction {
//!     #[command]
//!     AddTodo { text: String },
//!
//!     #[event]
//!     SnapshotUpdated { owner: OwnerId, state: QueryState },
//! }
//!
//! // Generated methods:
//! assert!(TodoAction::AddTodo { text: "buy milk".into() }.is_command());
//! assert_eq!(TodoAction::AddTodo { text: "buy milk".into() }.name(), "AddTodo");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

use proc_macro::TokenStream;
use quote::quote;
use syn::{parse_macro_input, Attribute, Data, DeriveInput, Fields, Variant};

/// Derive macro for Action enums
///
/// Generates helper methods for action enums:
/// - `is_command()` - Returns true if this variant is a command (user intent)
/// - `is_event()` - Returns true if this variant is an event (something observed)
/// - `name()` - Returns the variant name, for logs and metrics labels
///
/// # Attributes
///
/// - `#[command]` - Mark a variant as a command
/// - `#[event]` - Mark a variant as an event
///
/// # Panics
///
/// This macro will produce a compile error (not a runtime panic) if:
/// - Applied to a non-enum type
/// - A variant has both `#[command]` and `#[event]` attributes
///
/// # Example
///
/// ```ignore
/// #[derive(Action, Clone, Debug)]
/// enum TodoAction {
///     #[command]
///     ToggleTodo { id: ItemId },
///
///     #[command]
///     DeleteCompleted,
///
///     #[event]
///     SnapshotUpdated { owner: OwnerId, state: QueryState },
/// }
///
/// let action = TodoAction::DeleteCompleted;
///
/// assert!(action.is_command());
/// assert!(!action.is_event());
/// assert_eq!(action.name(), "DeleteCompleted");
/// ```
#[proc_macro_derive(Action, attributes(command, event))]
pub fn derive_action(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    let name = &input.ident;

    let Data::Enum(data_enum) = &input.data else {
        return syn::Error::new_spanned(
            input,
            "#[derive(Action)] can only be used on enums"
        )
        .to_compile_error()
        .into();
    };

    let mut command_arms = Vec::new();
    let mut event_arms = Vec::new();
    let mut name_arms = Vec::new();

    for variant in &data_enum.variants {
        let is_command = has_attribute(&variant.attrs, "command");
        let is_event = has_attribute(&variant.attrs, "event");

        if is_command && is_event {
            return syn::Error::new_spanned(
                variant,
                "Variant cannot be both #[command] and #[event]"
            )
            .to_compile_error()
            .into();
        }

        let pattern = variant_pattern(variant);

        if is_command {
            command_arms.push(quote! { #pattern => true, });
        }

        if is_event {
            event_arms.push(quote! { #pattern => true, });
        }

        let variant_name = variant.ident.to_string();
        name_arms.push(quote! { #pattern => #variant_name, });
    }

    let expanded = quote! {
        impl #name {
            /// Returns true if this action is a command
            #[must_use]
            #[allow(unreachable_patterns)]
            pub const fn is_command(&self) -> bool {
                match self {
                    #(#command_arms)*
                    _ => false,
                }
            }

            /// Returns true if this action is an event
            #[must_use]
            #[allow(unreachable_patterns)]
            pub const fn is_event(&self) -> bool {
                match self {
                    #(#event_arms)*
                    _ => false,
                }
            }

            /// Returns the variant name
            #[must_use]
            pub const fn name(&self) -> &'static str {
                match self {
                    #(#name_arms)*
                }
            }
        }
    };

    TokenStream::from(expanded)
}

/// Pattern matching any value of `variant`, ignoring its fields
fn variant_pattern(variant: &Variant) -> proc_macro2::TokenStream {
    let ident = &variant.ident;
    match variant.fields {
        Fields::Named(_) => quote! { Self::#ident { .. } },
        Fields::Unnamed(_) => quote! { Self::#ident(..) },
        Fields::Unit => quote! { Self::#ident },
    }
}

/// Helper function to check if an attribute list contains a specific attribute
fn has_attribute(attrs: &[Attribute], name: &str) -> bool {
    attrs.iter().any(|attr| attr.path().is_ident(name))
}
