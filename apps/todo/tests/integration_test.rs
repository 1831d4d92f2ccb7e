//! End-to-end tests: store, reducer and in-memory remote wired together.

#![allow(clippy::unwrap_used)] // Tests can use unwrap
#![allow(clippy::expect_used)] // Tests can use expect

use livelist_core::environment::Clock;
use livelist_core::identity::IdentityProvider;
use livelist_core::item::{ItemFields, ItemId};
use livelist_core::mutation::{Batch, Mutation};
use livelist_core::remote::{RemoteStore, SyncError};
use livelist_runtime::{Store, StoreError};
use livelist_testing::helpers::{init_tracing, item, owner};
use livelist_testing::{
    test_clock, InMemoryIdentityProvider, InMemoryRemoteStore, SequentialIdGenerator,
};
use std::sync::Arc;
use std::time::Duration;
use todo::{Screen, TodoAction, TodoEnvironment, TodoReducer, TodoState};

type TodoStore = Store<TodoState, TodoAction, TodoEnvironment, TodoReducer>;

const TIMEOUT: Duration = Duration::from_secs(2);

struct Harness {
    store: TodoStore,
    remote: Arc<InMemoryRemoteStore>,
}

fn harness() -> Harness {
    harness_with(InMemoryRemoteStore::new())
}

fn harness_with(remote: InMemoryRemoteStore) -> Harness {
    init_tracing();
    let remote = Arc::new(remote);
    let env = TodoEnvironment::new(
        Arc::new(test_clock()),
        Arc::new(SequentialIdGenerator::new()),
        remote.clone(),
    );
    let store = Store::new(TodoState::new(), TodoReducer::new(), env);
    Harness { store, remote }
}

impl Harness {
    async fn send(&self, action: TodoAction) {
        self.store.send(action).await.unwrap();
    }

    async fn sign_in(&self, user: &str) {
        self.send(TodoAction::SignIn { owner: owner(user) }).await;
        let expected = owner(user);
        self.wait_until(move |s| s.owner() == Some(&expected) && !s.query.loading)
            .await;
    }

    async fn wait_until<F>(&self, done: F)
    where
        F: Fn(&TodoState) -> bool,
    {
        tokio::time::timeout(TIMEOUT, async {
            while !self.store.state(&done).await {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("timed out waiting for state");
    }

    async fn screen(&self) -> Screen {
        self.store.state(Screen::from_state).await
    }

    async fn first_id(&self) -> ItemId {
        self.store
            .state(|s| s.items().first().map(|item| item.id))
            .await
            .expect("list is empty")
    }
}

async fn poll(mut condition: impl FnMut() -> bool) {
    tokio::time::timeout(TIMEOUT, async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("timed out waiting for condition");
}

#[tokio::test]
async fn test_buy_milk_round_trip() {
    let h = harness();
    h.sign_in("u1").await;

    h.send(TodoAction::AddTodo { text: "buy milk".to_string() }).await;
    h.wait_until(|s| s.items().len() == 1).await;
    assert_eq!(h.store.state(TodoState::remaining).await, 1);

    let id = h.first_id().await;
    h.send(TodoAction::ToggleTodo { id }).await;
    h.wait_until(|s| s.remaining() == 0).await;
    assert_eq!(
        h.screen().await.to_string(),
        "todos\n[x] buy milk\nRemaining todos: 0\nDelete Completed"
    );

    h.send(TodoAction::DeleteCompleted).await;
    h.wait_until(|s| s.items().is_empty()).await;

    assert_eq!(h.remote.transaction_count(), 3);
    assert!(h.remote.items().is_empty());
}

#[tokio::test]
async fn test_owners_only_see_their_items() {
    let h = harness_with(InMemoryRemoteStore::with_items([
        item(SequentialIdGenerator::nth(100), "bob's secret", false, "bob"),
    ]));
    h.sign_in("alice").await;
    assert!(h.store.state(|s| s.items().is_empty()).await);

    h.send(TodoAction::AddTodo { text: "alice's".to_string() }).await;
    h.wait_until(|s| s.items().len() == 1).await;

    let items = h.store.state(|s| s.items().to_vec()).await;
    assert!(items.iter().all(|i| i.owner_id == owner("alice")));
    assert_eq!(items[0].created_at, test_clock().now());
    assert_eq!(h.remote.items().len(), 2);
}

#[tokio::test]
async fn test_toggle_all_twice_restores_uniform_list() {
    let h = harness();
    h.sign_in("u1").await;

    for text in ["a", "b"] {
        h.send(TodoAction::AddTodo { text: text.to_string() }).await;
    }
    h.wait_until(|s| s.items().len() == 2).await;

    h.send(TodoAction::ToggleAll).await;
    h.wait_until(|s| s.remaining() == 0).await;

    h.send(TodoAction::ToggleAll).await;
    h.wait_until(|s| s.remaining() == 2).await;

    assert!(h.remote.items().iter().all(|i| !i.done));
}

#[tokio::test]
async fn test_delete_completed_with_nothing_done_sends_nothing() {
    let h = harness();
    h.sign_in("u1").await;
    h.send(TodoAction::AddTodo { text: "open".to_string() }).await;
    h.wait_until(|s| s.items().len() == 1).await;

    h.send(TodoAction::DeleteCompleted).await;
    h.send(TodoAction::ToggleAll).await;
    h.wait_until(|s| s.remaining() == 0).await;

    // Only the insert and the toggle reached the remote
    assert_eq!(h.remote.transaction_count(), 2);
    assert!(h.store.state(|s| s.last_error.is_none()).await);
}

#[tokio::test]
async fn test_signed_out_commands_are_rejected() {
    let h = harness();

    h.send(TodoAction::AddTodo { text: "nobody's".to_string() }).await;

    assert_eq!(h.screen().await, Screen::SignIn);
    assert!(h.store.state(|s| s.last_error.is_some()).await);
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(h.remote.transaction_count(), 0);
}

#[tokio::test]
async fn test_switching_owner_replaces_subscription() {
    let h = harness();
    h.sign_in("u1").await;
    h.send(TodoAction::AddTodo { text: "u1 item".to_string() }).await;
    h.wait_until(|s| s.items().len() == 1).await;

    h.sign_in("u2").await;
    assert!(h.store.state(|s| s.items().is_empty()).await);
    poll(|| h.remote.subscriber_count() == 1).await;

    // A later write for u1 must not reach u2's screen
    let mut batch = Batch::items();
    batch.push(Mutation::Insert {
        id: SequentialIdGenerator::nth(50),
        fields: ItemFields {
            text: "late".to_string(),
            done: false,
            created_at: test_clock().now(),
            owner_id: owner("u1"),
        },
    });
    h.remote.transact(batch).await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert!(h.store.state(|s| s.items().is_empty()).await);
    assert_eq!(h.store.state(|s| s.owner().cloned()).await, Some(owner("u2")));
}

#[tokio::test]
async fn test_subscription_failure_renders_error() {
    let remote = InMemoryRemoteStore::new();
    remote.fail_subscriptions(SyncError::SubscriptionFailed("permission denied".to_string()));
    let h = harness_with(remote);

    h.send(TodoAction::SignIn { owner: owner("u1") }).await;

    h.wait_until(|s| s.query.error.is_some()).await;
    assert_eq!(
        h.screen().await.to_string(),
        "Error querying data: Subscription failed: permission denied"
    );
}

#[tokio::test]
async fn test_sign_in_again_recovers_failed_subscription() {
    let remote = InMemoryRemoteStore::new();
    remote.fail_subscriptions(SyncError::Transport("offline".to_string()));
    let h = harness_with(remote);

    h.send(TodoAction::SignIn { owner: owner("u1") }).await;
    h.wait_until(|s| s.query.error.is_some()).await;

    h.remote.clear_subscription_failure();
    h.send(TodoAction::SignIn { owner: owner("u1") }).await;
    h.wait_until(|s| !s.query.loading && s.query.error.is_none()).await;

    assert!(matches!(h.screen().await, Screen::List { .. }));
}

#[tokio::test]
async fn test_identity_provider_drives_session() {
    let h = harness();
    let identity = InMemoryIdentityProvider::new();
    let _feed = h.store.observe(identity.watch(), TodoAction::from);

    identity.sign_in("u1");
    h.wait_until(|s| s.owner() == Some(&owner("u1")) && !s.query.loading)
        .await;
    assert!(matches!(h.screen().await, Screen::List { .. }));

    identity.sign_out();
    h.wait_until(|s| s.owner().is_none()).await;
    assert_eq!(h.screen().await, Screen::SignIn);
    poll(|| h.remote.subscriber_count() == 0).await;
}

#[tokio::test]
async fn test_shutdown_closes_subscription_and_rejects_commands() {
    let h = harness();
    h.sign_in("u1").await;

    h.store.shutdown(TIMEOUT).await.unwrap();
    poll(|| h.remote.subscriber_count() == 0).await;

    let result = h.store.send(TodoAction::AddTodo { text: "late".to_string() }).await;
    assert!(matches!(result, Err(StoreError::ShutdownInProgress)));
}
