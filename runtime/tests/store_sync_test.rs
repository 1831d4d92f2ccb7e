//! Store effects that reach a remote: transactions, subscriptions, cancel.

#![allow(clippy::unwrap_used)] // Tests can use unwrap
#![allow(clippy::expect_used)] // Tests can use expect

use livelist_core::effect::{Effect, EffectId};
use livelist_core::item::OwnerId;
use livelist_core::mutation::{Batch, Mutation};
use livelist_core::query::Query;
use livelist_core::reducer::Reducer;
use livelist_core::remote::RemoteStore;
use livelist_core::snapshot::QueryState;
use livelist_core::{smallvec, subscribe, transact, SmallVec};
use livelist_runtime::Store;
use livelist_testing::helpers::{init_tracing, item, owner};
use livelist_testing::{InMemoryRemoteStore, SequentialIdGenerator};
use std::sync::Arc;
use std::time::Duration;

const TIMEOUT: Duration = Duration::from_secs(2);
const WATCH: &str = "watch";

#[derive(Clone, Debug, Default)]
struct WatchState {
    latest: Option<QueryState>,
    pushes: usize,
}

#[derive(Clone, Debug)]
enum WatchAction {
    Submit(Batch),
    Watch(OwnerId),
    Unwatch,
    Snapshot(QueryState),
}

#[derive(Clone)]
struct WatchEnv {
    remote: Arc<dyn RemoteStore>,
}

#[derive(Clone)]
struct WatchReducer;

impl Reducer for WatchReducer {
    type State = WatchState;
    type Action = WatchAction;
    type Environment = WatchEnv;

    fn reduce(
        &self,
        state: &mut WatchState,
        action: WatchAction,
        env: &WatchEnv,
    ) -> SmallVec<[Effect<WatchAction>; 4]> {
        match action {
            WatchAction::Submit(batch) => smallvec![transact! {
                remote: env.remote,
                batch: batch,
            }],
            WatchAction::Watch(owner) => smallvec![subscribe! {
                remote: env.remote,
                query: Query::items_owned_by(owner),
                on_update: |snapshot| Some(WatchAction::Snapshot(snapshot)),
            }
            .cancellable(WATCH)],
            WatchAction::Unwatch => smallvec![Effect::Cancel(EffectId::new(WATCH))],
            WatchAction::Snapshot(snapshot) => {
                state.latest = Some(snapshot);
                state.pushes += 1;
                SmallVec::new()
            },
        }
    }
}

type WatchStore = Store<WatchState, WatchAction, WatchEnv, WatchReducer>;

fn store_with(remote: InMemoryRemoteStore) -> (WatchStore, Arc<InMemoryRemoteStore>) {
    init_tracing();
    let remote = Arc::new(remote);
    let env = WatchEnv {
        remote: remote.clone(),
    };
    (Store::new(WatchState::default(), WatchReducer, env), remote)
}

async fn wait_until<F>(store: &WatchStore, done: F)
where
    F: Fn(&WatchState) -> bool,
{
    tokio::time::timeout(TIMEOUT, async {
        while !store.state(&done).await {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("timed out waiting for state");
}

fn delete(n: u128) -> Batch {
    Batch::items().with(Mutation::Delete {
        id: SequentialIdGenerator::nth(n),
    })
}

#[tokio::test]
async fn test_transact_effect_reaches_remote() {
    let (store, remote) = store_with(InMemoryRemoteStore::with_items([item(
        SequentialIdGenerator::nth(1),
        "a",
        false,
        "u1",
    )]));

    let mut handle = store.send(WatchAction::Submit(delete(1))).await.unwrap();
    handle.wait_with_timeout(TIMEOUT).await.unwrap();

    assert_eq!(remote.transaction_count(), 1);
    assert!(remote.items().is_empty());
}

#[tokio::test]
async fn test_empty_transact_effect_is_skipped() {
    let (store, remote) = store_with(InMemoryRemoteStore::new());

    let mut handle = store.send(WatchAction::Submit(Batch::items())).await.unwrap();
    handle.wait_with_timeout(TIMEOUT).await.unwrap();

    assert_eq!(remote.transaction_count(), 0);
    assert_eq!(remote.rejected_count(), 0);
}

#[tokio::test]
async fn test_subscribe_effect_feeds_snapshots_back() {
    let (store, _remote) = store_with(InMemoryRemoteStore::with_items([
        item(SequentialIdGenerator::nth(1), "mine", false, "u1"),
        item(SequentialIdGenerator::nth(2), "theirs", false, "u2"),
    ]));

    store.send(WatchAction::Watch(owner("u1"))).await.unwrap();
    wait_until(&store, |s| s.latest.as_ref().is_some_and(|q| !q.loading)).await;

    store.send(WatchAction::Submit(delete(1))).await.unwrap();
    wait_until(&store, |s| {
        s.latest.as_ref().is_some_and(|q| !q.loading && q.items().is_empty())
    })
    .await;

    let latest = store.state(|s| s.latest.clone()).await.unwrap();
    assert!(latest.items().iter().all(|i| i.owner_id == owner("u1")));
}

#[tokio::test]
async fn test_cancel_closes_subscription() {
    let (store, remote) = store_with(InMemoryRemoteStore::new());

    store.send(WatchAction::Watch(owner("u1"))).await.unwrap();
    wait_until(&store, |s| s.latest.as_ref().is_some_and(|q| !q.loading)).await;
    assert_eq!(remote.subscriber_count(), 1);

    store.send(WatchAction::Unwatch).await.unwrap();
    tokio::time::timeout(TIMEOUT, async {
        while remote.subscriber_count() > 0 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .unwrap();

    let pushes = store.state(|s| s.pushes).await;
    store.send(WatchAction::Submit(delete(9))).await.unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(store.state(|s| s.pushes).await, pushes);
}

#[tokio::test]
async fn test_rewatch_replaces_previous_subscription() {
    let (store, remote) = store_with(InMemoryRemoteStore::new());

    store.send(WatchAction::Watch(owner("u1"))).await.unwrap();
    store.send(WatchAction::Watch(owner("u2"))).await.unwrap();

    wait_until(&store, |s| s.latest.as_ref().is_some_and(|q| !q.loading)).await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert_eq!(remote.subscriber_count(), 1);
}
