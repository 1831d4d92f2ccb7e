//! Identity boundary.
//!
//! The identity provider is external; the core only consumes its current
//! [`Session`]. A missing or empty user identifier is treated as signed out
//! and never scopes a subscription or a mutation.

use crate::item::OwnerId;
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Current authentication state.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Session {
    /// No user is signed in
    #[default]
    SignedOut,
    /// A user is signed in
    SignedIn(OwnerId),
}

impl Session {
    /// Builds a session from the provider's raw user identifier.
    ///
    /// `None` and `Some("")` both mean signed out.
    ///
    /// ```
    /// use livelist_core::identity::Session;
    ///
    /// assert_eq!(Session::from_user_id(None::<String>), Session::SignedOut);
    /// assert_eq!(Session::from_user_id(Some("")), Session::SignedOut);
    /// assert!(Session::from_user_id(Some("u1")).is_signed_in());
    /// ```
    #[must_use]
    pub fn from_user_id<S: Into<String>>(user_id: Option<S>) -> Self {
        user_id
            .and_then(OwnerId::new)
            .map_or(Self::SignedOut, Self::SignedIn)
    }

    /// The signed-in owner, if any
    #[must_use]
    pub const fn owner(&self) -> Option<&OwnerId> {
        match self {
            Self::SignedIn(owner) => Some(owner),
            Self::SignedOut => None,
        }
    }

    /// Returns true if a user is signed in
    #[must_use]
    pub const fn is_signed_in(&self) -> bool {
        matches!(self, Self::SignedIn(_))
    }
}

/// Trait for identity providers.
///
/// Providers expose the current session and a watch channel that changes on
/// sign-in and sign-out.
pub trait IdentityProvider: Send + Sync {
    /// Current session
    fn session(&self) -> Session;

    /// Receiver notified on every session change
    fn watch(&self) -> watch::Receiver<Session>;
}
