//! Remote store abstraction.
//!
//! The remote store owns persistence, real-time push and conflict
//! resolution. This crate only builds well-formed queries and batches for
//! it; the [`RemoteStore`] trait is the whole boundary.
//!
//! # Implementations
//!
//! - `InMemoryRemoteStore` in `livelist-testing` - for tests and the demo
//!   binary (atomic batches, owner-filtered push)
//! - a hosted sync service client in production

use crate::item::Item;
use crate::mutation::Batch;
use crate::query::Query;
use futures::Stream;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Errors reported by a remote store.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    /// The subscription could not be established or was terminated
    #[error("Subscription failed: {0}")]
    SubscriptionFailed(String),

    /// The remote refused a batch as a whole
    #[error("Transaction rejected: {0}")]
    TransactionRejected(String),

    /// An insert reused an id that already exists
    #[error("Item {0} already exists")]
    Conflict(String),

    /// An update targeted an item that does not exist
    #[error("Item {0} not found")]
    NotFound(String),

    /// Network or transport error
    #[error("Transport error: {0}")]
    Transport(String),
}

/// Stream of materialized result sets pushed by the remote.
///
/// Each item is the full, ordered result set of the query after a change.
/// An `Err` item is terminal for the subscription.
pub type SnapshotStream = Pin<Box<dyn Stream<Item = Result<Vec<Item>, SyncError>> + Send>>;

/// Trait for remote reactive stores.
///
/// # Dyn Compatibility
///
/// Uses explicit `Pin<Box<dyn Future>>` returns instead of `async fn` so
/// effects can capture an `Arc<dyn RemoteStore>`.
pub trait RemoteStore: Send + Sync {
    /// Open a standing subscription.
    ///
    /// The returned stream yields the current result set first and then a
    /// new result set every time a change affecting the query is applied.
    /// Only items matching `query` are ever yielded.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::SubscriptionFailed`] if the subscription cannot be
    /// established (e.g. auth or network failure).
    fn subscribe(
        &self,
        query: Query,
    ) -> Pin<Box<dyn Future<Output = Result<SnapshotStream, SyncError>> + Send + '_>>;

    /// Apply a batch atomically.
    ///
    /// Either every mutation applies or none does. The effect becomes
    /// visible through subscription pushes, not through the return value.
    ///
    /// # Errors
    ///
    /// Returns an error if the batch was rejected; nothing was applied.
    fn transact(
        &self,
        batch: Batch,
    ) -> Pin<Box<dyn Future<Output = Result<(), SyncError>> + Send + '_>>;
}
