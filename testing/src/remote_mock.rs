//! In-memory remote store for fast, deterministic tests
//!
//! [`InMemoryRemoteStore`] behaves like the hosted store as far as the sync
//! layer can observe:
//!
//! - batches apply atomically or not at all
//! - every subscription gets the current result set first, then a fresh
//!   result set after each applied batch
//! - pushes only ever contain items matching the subscription's filter
//!
//! Failures can be injected per call to exercise error paths.

#![allow(clippy::unwrap_used)] // Test infrastructure uses unwrap for simplicity
#![allow(clippy::missing_panics_doc)] // Only panics on a poisoned lock

use livelist_core::item::{Item, ItemId};
use livelist_core::mutation::{Batch, Mutation};
use livelist_core::query::{Query, ITEMS_COLLECTION};
use livelist_core::remote::{RemoteStore, SnapshotStream, SyncError};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, RwLock};
use tokio::sync::broadcast;

/// Change notification fanned out to open subscriptions
#[derive(Clone, Debug)]
enum Change {
    Applied,
    Terminated(SyncError),
}

#[derive(Debug, Default)]
struct Inner {
    items: Vec<Item>,
    applied: Vec<Batch>,
    rejected: usize,
    fail_next_transact: Option<SyncError>,
    fail_subscriptions: Option<SyncError>,
}

/// In-memory remote store.
///
/// Items are kept in insertion order, so snapshots list items oldest first.
///
/// # Example
///
/// ```
/// use futures::StreamExt;
/// use livelist_core::item::{ItemFields, ItemId, OwnerId};
/// use livelist_core::mutation::{Batch, Mutation};
/// use livelist_core::query::Query;
/// use livelist_core::remote::RemoteStore;
/// use livelist_testing::InMemoryRemoteStore;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let remote = InMemoryRemoteStore::new();
/// let owner = OwnerId::new("u1").ok_or("empty owner")?;
///
/// let mut snapshots = remote.subscribe(Query::items_owned_by(owner.clone())).await?;
/// assert_eq!(snapshots.next().await.transpose()?.map(|s| s.len()), Some(0));
///
/// remote
///     .transact(Batch::items().with(Mutation::Insert {
///         id: ItemId::new(),
///         fields: ItemFields {
///             text: "buy milk".to_string(),
///             done: false,
///             created_at: chrono::Utc::now(),
///             owner_id: owner,
///         },
///     }))
///     .await?;
/// assert_eq!(snapshots.next().await.transpose()?.map(|s| s.len()), Some(1));
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct InMemoryRemoteStore {
    inner: Arc<RwLock<Inner>>,
    changes: broadcast::Sender<Change>,
}

impl InMemoryRemoteStore {
    /// Create a new empty store
    #[must_use]
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(64);
        Self {
            inner: Arc::new(RwLock::new(Inner::default())),
            changes,
        }
    }

    /// Create a store pre-populated with items (no transaction recorded)
    #[must_use]
    pub fn with_items(items: impl IntoIterator<Item = Item>) -> Self {
        let store = Self::new();
        store.inner.write().unwrap().items.extend(items);
        store
    }

    /// Every item, regardless of owner, in insertion order
    #[must_use]
    pub fn items(&self) -> Vec<Item> {
        self.inner.read().unwrap().items.clone()
    }

    /// Look up one item by id
    #[must_use]
    pub fn get(&self, id: ItemId) -> Option<Item> {
        self.inner
            .read()
            .unwrap()
            .items
            .iter()
            .find(|item| item.id == id)
            .cloned()
    }

    /// Number of batches applied so far
    ///
    /// Empty batches never reach the store, so they are never counted.
    #[must_use]
    pub fn transaction_count(&self) -> usize {
        self.inner.read().unwrap().applied.len()
    }

    /// Batches applied so far, in order
    #[must_use]
    pub fn applied_batches(&self) -> Vec<Batch> {
        self.inner.read().unwrap().applied.clone()
    }

    /// Number of batches rejected so far
    #[must_use]
    pub fn rejected_count(&self) -> usize {
        self.inner.read().unwrap().rejected
    }

    /// Reject the next batch with `error`
    pub fn fail_next_transact(&self, error: SyncError) {
        self.inner.write().unwrap().fail_next_transact = Some(error);
    }

    /// Refuse every new subscription with `error` until cleared
    pub fn fail_subscriptions(&self, error: SyncError) {
        self.inner.write().unwrap().fail_subscriptions = Some(error);
    }

    /// Accept new subscriptions again
    pub fn clear_subscription_failure(&self) {
        self.inner.write().unwrap().fail_subscriptions = None;
    }

    /// End every open subscription with `error`
    pub fn terminate_subscriptions(&self, error: SyncError) {
        let _ = self.changes.send(Change::Terminated(error));
    }

    /// Number of currently open subscription streams
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.changes.receiver_count()
    }

    fn snapshot(inner: &RwLock<Inner>, query: &Query) -> Vec<Item> {
        inner
            .read()
            .unwrap()
            .items
            .iter()
            .filter(|item| query.matches(ITEMS_COLLECTION, item))
            .cloned()
            .collect()
    }

    fn apply(items: &mut Vec<Item>, batch: &Batch) -> Result<(), SyncError> {
        if batch.collection() != ITEMS_COLLECTION {
            return Err(SyncError::TransactionRejected(format!(
                "unknown collection '{}'",
                batch.collection()
            )));
        }

        for mutation in batch {
            match mutation {
                Mutation::Insert { id, fields } => {
                    if items.iter().any(|item| item.id == *id) {
                        return Err(SyncError::Conflict(id.to_string()));
                    }
                    items.push(Item::from_fields(*id, fields.clone()));
                },
                Mutation::Update { id, patch } => {
                    let item = items
                        .iter_mut()
                        .find(|item| item.id == *id)
                        .ok_or_else(|| SyncError::NotFound(id.to_string()))?;
                    item.apply(patch);
                },
                Mutation::Delete { id } => {
                    items.retain(|item| item.id != *id);
                },
            }
        }
        Ok(())
    }
}

impl Default for InMemoryRemoteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl RemoteStore for InMemoryRemoteStore {
    fn subscribe(
        &self,
        query: Query,
    ) -> Pin<Box<dyn Future<Output = Result<SnapshotStream, SyncError>> + Send + '_>> {
        Box::pin(async move {
            if let Some(error) = self.inner.read().unwrap().fail_subscriptions.clone() {
                return Err(error);
            }

            let inner = Arc::clone(&self.inner);
            let mut changes = self.changes.subscribe();

            let stream = async_stream::stream! {
                yield Ok(Self::snapshot(&inner, &query));

                loop {
                    match changes.recv().await {
                        Ok(Change::Applied) | Err(broadcast::error::RecvError::Lagged(_)) => {
                            yield Ok(Self::snapshot(&inner, &query));
                        },
                        Ok(Change::Terminated(error)) => {
                            yield Err(error);
                            break;
                        },
                        Err(broadcast::error::RecvError::Closed) => break,
                    }
                }
            };

            Ok(Box::pin(stream) as SnapshotStream)
        })
    }

    fn transact(
        &self,
        batch: Batch,
    ) -> Pin<Box<dyn Future<Output = Result<(), SyncError>> + Send + '_>> {
        Box::pin(async move {
            {
                let mut inner = self.inner.write().unwrap();

                if let Some(error) = inner.fail_next_transact.take() {
                    inner.rejected += 1;
                    return Err(error);
                }

                let mut staged = inner.items.clone();
                if let Err(error) = Self::apply(&mut staged, &batch) {
                    inner.rejected += 1;
                    return Err(error);
                }

                inner.items = staged;
                inner.applied.push(batch);
            }

            let _ = self.changes.send(Change::Applied);
            Ok(())
        })
    }
}
