//! Declarative macros for ergonomic effect construction
//!
//! These macros reduce boilerplate when creating `Effect` variants that
//! talk to the remote store.

/// Create an `Effect::Transact` submitting a batch
///
/// # Example
///
/// ```rust,ignore
/// use livelist_core::transact;
///
/// transact! {
///     remote: env.remote,
///     batch: Batch::items().with(Mutation::Delete { id }),
/// }
/// ```
#[macro_export]
macro_rules! transact {
    (
        remote: $remote:expr,
        batch: $batch:expr $(,)?
    ) => {
        $crate::effect::Effect::Transact($crate::effect::TransactOperation {
            remote: ::std::sync::Arc::clone(&$remote),
            batch: $batch,
        })
    };
}

/// Create an `Effect::Subscribe` feeding snapshots back as actions
///
/// # Example
///
/// ```rust,ignore
/// use livelist_core::subscribe;
///
/// subscribe! {
///     remote: env.remote,
///     query: Query::items_owned_by(owner.clone()),
///     on_update: |state| Some(TodoAction::SnapshotUpdated { owner: owner.clone(), state }),
/// }
/// ```
#[macro_export]
macro_rules! subscribe {
    (
        remote: $remote:expr,
        query: $query:expr,
        on_update: |$state:ident| $body:expr $(,)?
    ) => {
        $crate::effect::Effect::Subscribe($crate::effect::SubscribeOperation {
            remote: ::std::sync::Arc::clone(&$remote),
            query: $query,
            on_update: ::std::boxed::Box::new(move |$state| $body),
        })
    };
}
