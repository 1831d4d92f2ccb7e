//! Integration tests for the sync client against the in-memory remote store.

#![allow(clippy::unwrap_used)] // Tests can use unwrap
#![allow(clippy::expect_used)] // Tests can use expect

use livelist_core::environment::Clock;
use livelist_core::item::{ItemFields, ItemId, ItemPatch};
use livelist_core::mutation::{Batch, Mutation};
use livelist_core::query::Query;
use livelist_core::remote::SyncError;
use livelist_core::snapshot::{QueryState, SubscriptionStatus};
use livelist_runtime::{LiveQuery, SyncClient};
use livelist_testing::helpers::{init_tracing, item, owner};
use livelist_testing::{test_clock, InMemoryRemoteStore, SequentialIdGenerator};
use std::sync::Arc;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(2);

fn client() -> (SyncClient, Arc<InMemoryRemoteStore>) {
    init_tracing();
    let remote = Arc::new(InMemoryRemoteStore::new());
    (SyncClient::new(remote.clone()), remote)
}

fn insert(n: u128, text: &str, user: &str) -> Mutation {
    Mutation::Insert {
        id: SequentialIdGenerator::nth(n),
        fields: ItemFields {
            text: text.to_string(),
            done: false,
            created_at: test_clock().now(),
            owner_id: owner(user),
        },
    }
}

async fn wait_for<F>(live: &mut LiveQuery, predicate: F) -> QueryState
where
    F: FnMut(&QueryState) -> bool,
{
    tokio::time::timeout(TIMEOUT, live.wait_for(predicate))
        .await
        .expect("timed out waiting for snapshot")
        .expect("subscription closed")
}

async fn wait_until(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(TIMEOUT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("timed out waiting for condition");
}

#[tokio::test]
async fn test_subscription_starts_pending_then_active() {
    let (client, _remote) = client();
    let mut live = client.subscribe(Query::items_owned_by(owner("u1")));

    let first = live.current();
    assert!(first.loading || first.data.is_some());

    let state = wait_for(&mut live, |s| !s.loading).await;
    assert_eq!(state.data, Some(vec![]));
    assert_eq!(live.status(), SubscriptionStatus::Active);
}

#[tokio::test]
async fn test_submitted_insert_is_pushed() {
    let (client, remote) = client();
    let mut live = client.subscribe(Query::items_owned_by(owner("u1")));
    wait_for(&mut live, |s| !s.loading).await;

    client.submit(Batch::items().with(insert(1, "buy milk", "u1")));

    let state = wait_for(&mut live, |s| s.items().len() == 1).await;
    let added = &state.items()[0];
    assert_eq!(added.text, "buy milk");
    assert!(!added.done);
    assert_eq!(added.owner_id, owner("u1"));
    assert_eq!(state.remaining(), 1);
    assert_eq!(remote.transaction_count(), 1);
}

#[tokio::test]
async fn test_owner_isolation() {
    let (client, _remote) = client();
    let mut alice = client.subscribe(Query::items_owned_by(owner("alice")));
    let mut bob = client.subscribe(Query::items_owned_by(owner("bob")));
    wait_for(&mut alice, |s| !s.loading).await;
    wait_for(&mut bob, |s| !s.loading).await;

    client.submit(Batch::items().with(insert(1, "alice's", "alice")));
    client.submit(Batch::items().with(insert(2, "bob's", "bob")));

    let alice_state = wait_for(&mut alice, |s| s.items().len() == 1).await;
    let bob_state = wait_for(&mut bob, |s| s.items().len() == 1).await;

    assert!(alice_state.items().iter().all(|i| i.owner_id == owner("alice")));
    assert!(bob_state.items().iter().all(|i| i.owner_id == owner("bob")));
}

#[tokio::test]
async fn test_empty_batch_performs_no_transaction() {
    let (client, remote) = client();
    client.submit(Batch::items());

    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(remote.transaction_count(), 0);
    assert_eq!(remote.rejected_count(), 0);
}

#[tokio::test]
async fn test_batch_applies_atomically() {
    let (client, remote) = client();
    let mut live = client.subscribe(Query::items_owned_by(owner("u1")));
    wait_for(&mut live, |s| !s.loading).await;

    // The update targets a missing item, so the insert must not apply
    client.submit(
        Batch::items()
            .with(insert(1, "a", "u1"))
            .with(Mutation::Update {
                id: ItemId::new(),
                patch: ItemPatch::done(true),
            }),
    );

    wait_until(|| remote.rejected_count() == 1).await;

    assert!(remote.items().is_empty());
    assert!(live.current().items().is_empty());
}

#[tokio::test]
async fn test_rejected_batch_is_not_surfaced() {
    let (client, remote) = client();
    let mut live = client.subscribe(Query::items_owned_by(owner("u1")));
    wait_for(&mut live, |s| !s.loading).await;

    remote.fail_next_transact(SyncError::Transport("offline".to_string()));
    client.submit(Batch::items().with(insert(1, "lost", "u1")));
    wait_until(|| remote.rejected_count() == 1).await;

    client.submit(Batch::items().with(insert(2, "kept", "u1")));

    let state = wait_for(&mut live, |s| !s.items().is_empty()).await;
    assert!(state.error.is_none());
    assert_eq!(state.items()[0].text, "kept");
    assert_eq!(remote.rejected_count(), 1);
    assert_eq!(remote.items().len(), 1);
}

#[tokio::test]
async fn test_subscription_failure_sets_error() {
    let (client, remote) = client();
    remote.fail_subscriptions(SyncError::SubscriptionFailed("permission denied".to_string()));

    let mut live = client.subscribe(Query::items_owned_by(owner("u1")));
    let state = wait_for(&mut live, |s| s.error.is_some()).await;

    assert!(!state.loading);
    assert_eq!(state.data, None);
    assert_eq!(
        state.error.as_deref(),
        Some("Subscription failed: permission denied")
    );
    assert_eq!(live.status(), SubscriptionStatus::Failed);
}

#[tokio::test]
async fn test_failure_after_push_keeps_last_data() {
    let remote = Arc::new(InMemoryRemoteStore::with_items([item(
        SequentialIdGenerator::nth(1),
        "a",
        false,
        "u1",
    )]));
    let client = SyncClient::new(remote.clone());

    let mut live = client.subscribe(Query::items_owned_by(owner("u1")));
    wait_for(&mut live, |s| s.items().len() == 1).await;

    remote.terminate_subscriptions(SyncError::Transport("connection reset".to_string()));
    let state = wait_for(&mut live, |s| s.error.is_some()).await;

    assert_eq!(state.items().len(), 1);
    assert_eq!(live.status(), SubscriptionStatus::Failed);
    // Failed is terminal
    assert!(tokio::time::timeout(TIMEOUT, live.changed()).await.unwrap().is_err());
}

#[tokio::test]
async fn test_close_stops_delivery() {
    let (client, remote) = client();
    let mut live = client.subscribe(Query::items_owned_by(owner("u1")));
    wait_for(&mut live, |s| !s.loading).await;

    let watcher = live.watcher();
    live.close();

    wait_until(|| watcher.status() == SubscriptionStatus::Closed).await;

    client.submit(Batch::items().with(insert(1, "late", "u1")));
    tokio::time::sleep(Duration::from_millis(50)).await;

    assert_eq!(remote.transaction_count(), 1);
    assert!(watcher.current().items().is_empty());
    assert_eq!(remote.subscriber_count(), 0);
}

#[tokio::test]
async fn test_watchers_share_snapshots() {
    let (client, _remote) = client();
    let mut live = client.subscribe(Query::items_owned_by(owner("u1")));
    let mut watcher = live.watcher();
    wait_for(&mut live, |s| !s.loading).await;

    client.submit(Batch::items().with(insert(1, "a", "u1")));
    wait_for(&mut live, |s| s.items().len() == 1).await;

    tokio::time::timeout(TIMEOUT, async {
        while watcher.current().items().is_empty() {
            watcher.changed().await.unwrap();
        }
    })
    .await
    .unwrap();
    assert_eq!(watcher.status(), SubscriptionStatus::Active);
}
