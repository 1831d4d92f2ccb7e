//! Sync client: live subscriptions and fire-and-forget transactions.
//!
//! The [`SyncClient`] bridges a [`RemoteStore`] and local consumers:
//!
//! - [`SyncClient::subscribe`] opens a [`LiveQuery`], a handle whose
//!   [`QueryState`] is updated in place by a background pump every time the
//!   remote pushes a new result set.
//! - [`SyncClient::submit`] hands a [`Batch`] to the remote and returns
//!   immediately. Its outcome is only visible through later snapshots.
//!
//! The client never retries. Transport-level retry and reconciliation are
//! the remote's job; the client reports whatever terminal state it gets.
//!
//! # Example
//!
//! ```ignore
//! let client = SyncClient::new(remote);
//! let mut live = client.subscribe(Query::items_owned_by(owner.clone()));
//!
//! client.submit(Batch::items().with(Mutation::Insert { id, fields }));
//!
//! live.changed().await?;
//! println!("{} remaining", live.snapshot().remaining());
//! ```

use crate::metrics::SyncMetrics;
use futures::StreamExt;
use livelist_core::mutation::Batch;
use livelist_core::query::Query;
use livelist_core::remote::{RemoteStore, SyncError};
use livelist_core::snapshot::{QueryState, SubscriptionStatus};
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Returned when waiting on a subscription that will never change again.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Subscription closed")]
pub struct SubscriptionClosed;

/// Client for a remote reactive store.
///
/// Cheap to clone; all clones share the same remote handle.
#[derive(Clone)]
pub struct SyncClient {
    remote: Arc<dyn RemoteStore>,
}

impl SyncClient {
    /// Create a client over an explicitly injected remote store
    #[must_use]
    pub fn new(remote: Arc<dyn RemoteStore>) -> Self {
        Self { remote }
    }

    /// The remote store this client talks to
    #[must_use]
    pub fn remote(&self) -> Arc<dyn RemoteStore> {
        Arc::clone(&self.remote)
    }

    /// Open a standing, owner-scoped subscription.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    #[tracing::instrument(skip(self, query), fields(owner = %query.owner()), name = "sync_subscribe")]
    pub fn subscribe(&self, query: Query) -> LiveQuery {
        LiveQuery::open(self.remote(), query)
    }

    /// Submit a batch, fire-and-forget.
    ///
    /// Returns immediately. Failures are logged and counted but never
    /// surfaced to the caller. An empty batch performs no transaction.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn submit(&self, batch: Batch) {
        let _ = self.spawn_submit(batch);
    }

    /// [`SyncClient::submit`], returning the transaction task so the store
    /// runtime can track its completion. `None` for an empty batch.
    #[tracing::instrument(skip(self, batch), fields(size = batch.len()), name = "sync_submit")]
    pub(crate) fn spawn_submit(&self, batch: Batch) -> Option<JoinHandle<()>> {
        if batch.is_empty() {
            tracing::trace!("Skipping empty batch");
            SyncMetrics::record_skipped_empty();
            return None;
        }
        Some(tokio::spawn(dispatch(self.remote(), batch)))
    }
}

impl std::fmt::Debug for SyncClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncClient").finish_non_exhaustive()
    }
}

/// Send one batch to the remote and record the outcome.
async fn dispatch(remote: Arc<dyn RemoteStore>, batch: Batch) {
    let size = batch.len();
    let collection = batch.collection().to_string();
    SyncMetrics::record_submit(size);

    let start = Instant::now();
    let result = remote.transact(batch).await;
    let duration = start.elapsed();

    match result {
        Ok(()) => {
            tracing::debug!(collection = %collection, size, "Batch applied");
            SyncMetrics::record_outcome(true, duration);
        },
        Err(error) => {
            tracing::warn!(
                collection = %collection,
                size,
                error = %error,
                "Batch rejected by remote"
            );
            SyncMetrics::record_outcome(false, duration);
        },
    }
}

/// Handle to a live, owner-scoped subscription.
///
/// The handle starts `Pending`, becomes `Active` on the first push and stays
/// `Active` across pushes, or ends `Failed`. Closing or dropping the handle
/// aborts the background pump; watchers then observe `Closed`.
pub struct LiveQuery {
    query: Query,
    state: watch::Receiver<QueryState>,
    pump: JoinHandle<()>,
}

impl LiveQuery {
    /// Open a subscription on `remote`.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn open(remote: Arc<dyn RemoteStore>, query: Query) -> Self {
        let (tx, rx) = watch::channel(QueryState::pending());
        let pump = tokio::spawn(pump(remote, query.clone(), tx));
        SyncMetrics::record_subscription_opened();
        tracing::debug!(owner = %query.owner(), "Subscription opened");

        Self {
            query,
            state: rx,
            pump,
        }
    }

    /// The query this subscription was opened with
    #[must_use]
    pub const fn query(&self) -> &Query {
        &self.query
    }

    /// Latest snapshot, marking it as seen for [`LiveQuery::changed`]
    #[must_use]
    pub fn snapshot(&mut self) -> QueryState {
        self.state.borrow_and_update().clone()
    }

    /// Latest snapshot without marking it as seen
    #[must_use]
    pub fn current(&self) -> QueryState {
        self.state.borrow().clone()
    }

    /// Current lifecycle status
    #[must_use]
    pub fn status(&self) -> SubscriptionStatus {
        status_of(&self.state)
    }

    /// Wait until a snapshot newer than the last one seen is available.
    ///
    /// # Errors
    ///
    /// Returns [`SubscriptionClosed`] once the pump has finished (failure or
    /// remote end of stream) and no unseen snapshot remains.
    pub async fn changed(&mut self) -> Result<(), SubscriptionClosed> {
        self.state.changed().await.map_err(|_| SubscriptionClosed)
    }

    /// Wait until `predicate` holds for the latest snapshot and return it.
    ///
    /// # Errors
    ///
    /// Returns [`SubscriptionClosed`] if the subscription ends first.
    pub async fn wait_for<F>(&mut self, predicate: F) -> Result<QueryState, SubscriptionClosed>
    where
        F: FnMut(&QueryState) -> bool,
    {
        self.state
            .wait_for(predicate)
            .await
            .map(|state| state.clone())
            .map_err(|_| SubscriptionClosed)
    }

    /// A read-only watcher sharing this subscription's snapshots
    #[must_use]
    pub fn watcher(&self) -> SnapshotWatcher {
        SnapshotWatcher {
            state: self.state.clone(),
        }
    }

    /// Stop delivery and release the subscription
    pub fn close(self) {
        drop(self);
    }
}

impl Drop for LiveQuery {
    fn drop(&mut self) {
        self.pump.abort();
        SyncMetrics::record_subscription_closed();
        tracing::debug!(owner = %self.query.owner(), "Subscription closed");
    }
}

impl std::fmt::Debug for LiveQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LiveQuery")
            .field("query", &self.query)
            .field("status", &self.status())
            .finish_non_exhaustive()
    }
}

/// Read-only view of a [`LiveQuery`]'s snapshots.
#[derive(Clone, Debug)]
pub struct SnapshotWatcher {
    state: watch::Receiver<QueryState>,
}

impl SnapshotWatcher {
    /// Latest snapshot
    #[must_use]
    pub fn current(&self) -> QueryState {
        self.state.borrow().clone()
    }

    /// Current lifecycle status, `Closed` once the handle is gone
    #[must_use]
    pub fn status(&self) -> SubscriptionStatus {
        status_of(&self.state)
    }

    /// Wait for the next snapshot.
    ///
    /// # Errors
    ///
    /// Returns [`SubscriptionClosed`] once no further snapshot can arrive.
    pub async fn changed(&mut self) -> Result<(), SubscriptionClosed> {
        self.state.changed().await.map_err(|_| SubscriptionClosed)
    }
}

fn status_of(state: &watch::Receiver<QueryState>) -> SubscriptionStatus {
    let status = state.borrow().status();
    match status {
        SubscriptionStatus::Failed => status,
        _ if state.has_changed().is_err() => SubscriptionStatus::Closed,
        _ => status,
    }
}

/// Background task moving remote pushes into the watch channel.
async fn pump(remote: Arc<dyn RemoteStore>, query: Query, tx: watch::Sender<QueryState>) {
    let owner = query.owner().clone();

    let mut stream = match remote.subscribe(query).await {
        Ok(stream) => stream,
        Err(error) => {
            fail(&tx, &error);
            return;
        },
    };

    while let Some(next) = stream.next().await {
        match next {
            Ok(items) => {
                tracing::trace!(owner = %owner, count = items.len(), "Snapshot pushed");
                SyncMetrics::record_push();
                tx.send_replace(QueryState::ready(items));
            },
            Err(error) => {
                fail(&tx, &error);
                return;
            },
        }
    }

    tracing::debug!(owner = %owner, "Remote ended subscription");
}

fn fail(tx: &watch::Sender<QueryState>, error: &SyncError) {
    tracing::warn!(error = %error, "Subscription failed");
    SyncMetrics::record_subscription_failed();
    let message = error.to_string();
    tx.send_modify(|state| {
        state.loading = false;
        state.error = Some(message);
    });
}
