//! # Livelist Testing
//!
//! Testing utilities and helpers for the Livelist sync layer.
//!
//! This crate provides:
//! - Mock implementations of Environment traits
//! - An in-memory remote store with owner-filtered push
//! - Test helpers and builders
//! - Assertion helpers for reducers
//!
//! ## Example
//!
//! ```ignore
//! use livelist_testing::{test_clock, InMemoryRemoteStore, SequentialIdGenerator};
//! use livelist_runtime::Store;
//!
//! #[tokio::test]
//! async fn test_add_flow() {
//!     let remote = Arc::new(InMemoryRemoteStore::new());
//!     let env = TodoEnvironment::new(test_clock(), SequentialIdGenerator::new(), remote.clone());
//!     let store = Store::new(TodoState::default(), TodoReducer::new(), env);
//!
//!     store.send(TodoAction::SignIn { owner: owner("u1") }).await?;
//!     store.send(TodoAction::AddTodo { text: "buy milk".into() }).await?;
//!
//!     assert_eq!(remote.items().len(), 1);
//! }
//! ```

use chrono::{DateTime, Utc};
use livelist_core::environment::{Clock, IdGenerator};
use livelist_core::identity::{IdentityProvider, Session};
use livelist_core::item::ItemId;


/// In-memory remote store
pub mod remote_mock;

/// Mock implementations for testing.
pub mod mocks {
    use super::{Clock, DateTime, IdGenerator, IdentityProvider, ItemId, Session, Utc};
    use std::sync::atomic::{AtomicU64, Ordering};
    use std::sync::Arc;
    use tokio::sync::watch;
    use uuid::Uuid;

    /// Fixed clock for deterministic tests
    ///
    /// Always returns the same time, making tests reproducible.
    ///
    /// # Example
    ///
    /// ```
    /// use livelist_testing::mocks::FixedClock;
    /// use livelist_core::environment::Clock;
    /// use chrono::Utc;
    ///
    /// let clock = FixedClock::new(Utc::now());
    /// let time1 = clock.now();
    /// let time2 = clock.now();
    /// assert_eq!(time1, time2); // Always the same!
    /// ```
    #[derive(Debug, Clone)]
    pub struct FixedClock {
        time: DateTime<Utc>,
    }

    impl FixedClock {
        /// Create a new fixed clock with the given time
        #[must_use]
        pub const fn new(time: DateTime<Utc>) -> Self {
            Self { time }
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.time
        }
    }

    /// Create a default fixed clock for tests (2025-01-01 00:00:00 UTC)
    #[must_use]
    pub fn test_clock() -> FixedClock {
        FixedClock::new(DateTime::<Utc>::UNIX_EPOCH + chrono::Duration::days(20_089))
    }

    /// Predictable item ids: `00000000-0000-0000-0000-000000000001`, `...02`, ...
    ///
    /// Clones share the counter.
    #[derive(Debug, Clone, Default)]
    pub struct SequentialIdGenerator {
        next: Arc<AtomicU64>,
    }

    impl SequentialIdGenerator {
        /// Start counting at 1
        #[must_use]
        pub fn new() -> Self {
            Self::default()
        }

        /// The id the `n`th call to `next_id` returns (1-based)
        #[must_use]
        pub const fn nth(n: u128) -> ItemId {
            ItemId::from_uuid(Uuid::from_u128(n))
        }
    }

    impl IdGenerator for SequentialIdGenerator {
        fn next_id(&self) -> ItemId {
            Self::nth(u128::from(self.next.fetch_add(1, Ordering::SeqCst)) + 1)
        }
    }

    /// Identity provider driven by the test
    ///
    /// ```
    /// use livelist_core::identity::{IdentityProvider, Session};
    /// use livelist_testing::mocks::InMemoryIdentityProvider;
    ///
    /// let identity = InMemoryIdentityProvider::new();
    /// let rx = identity.watch();
    ///
    /// identity.sign_in("u1");
    /// assert!(rx.borrow().is_signed_in());
    ///
    /// identity.sign_out();
    /// assert_eq!(identity.session(), Session::SignedOut);
    /// ```
    #[derive(Debug, Clone)]
    pub struct InMemoryIdentityProvider {
        session: Arc<watch::Sender<Session>>,
    }

    impl InMemoryIdentityProvider {
        /// Start signed out
        #[must_use]
        pub fn new() -> Self {
            let (tx, _) = watch::channel(Session::SignedOut);
            Self {
                session: Arc::new(tx),
            }
        }

        /// Sign in as `user_id`; an empty id signs out
        pub fn sign_in(&self, user_id: &str) {
            self.session.send_replace(Session::from_user_id(Some(user_id)));
        }

        /// Sign out
        pub fn sign_out(&self) {
            self.session.send_replace(Session::SignedOut);
        }
    }

    impl Default for InMemoryIdentityProvider {
        fn default() -> Self {
            Self::new()
        }
    }

    impl IdentityProvider for InMemoryIdentityProvider {
        fn session(&self) -> Session {
            self.session.borrow().clone()
        }

        fn watch(&self) -> watch::Receiver<Session> {
            self.session.subscribe()
        }
    }
}

/// Test helpers and utilities.
pub mod helpers {
    use livelist_core::item::{Item, ItemId, OwnerId};

    /// Owner id from a literal; empty ids are a test bug
    ///
    /// # Panics
    ///
    /// Panics if `id` is empty.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn owner(id: &str) -> OwnerId {
        OwnerId::new(id).expect("test owner ids are non-empty")
    }

    /// A materialized item created at the test clock's time
    #[must_use]
    pub fn item(id: ItemId, text: &str, done: bool, owner_id: &str) -> Item {
        use livelist_core::environment::Clock;

        Item {
            id,
            text: text.to_string(),
            done,
            created_at: super::test_clock().now(),
            owner_id: owner(owner_id),
        }
    }

    /// Install a `tracing` subscriber honoring `RUST_LOG`, once per process
    pub fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }
}

/// Property-based testing utilities using proptest.
pub mod properties {
    use livelist_core::item::Item;
    use proptest::prelude::*;

    use super::mocks::SequentialIdGenerator;

    /// Up to `max` items for one owner with arbitrary text and done flags
    pub fn items_for(owner_id: &'static str, max: usize) -> impl Strategy<Value = Vec<Item>> {
        prop::collection::vec(("[a-z ]{1,12}", any::<bool>()), 0..=max).prop_map(move |specs| {
            specs
                .into_iter()
                .zip(1u128..)
                .map(|((text, done), n)| {
                    super::helpers::item(SequentialIdGenerator::nth(n), &text, done, owner_id)
                })
                .collect()
        })
    }
}

// Re-export commonly used items
pub use mocks::{FixedClock, InMemoryIdentityProvider, SequentialIdGenerator, test_clock};
pub use reducer_test::{ReducerTest, assertions};
pub use remote_mock::InMemoryRemoteStore;

#[cfg(test)]
mod tests {
    use super::*;
    use livelist_core::environment::Clock;

    #[test]
    fn test_fixed_clock() {
        let clock = test_clock();
        let time1 = clock.now();
        let time2 = clock.now();
        assert_eq!(time1, time2);
        assert_eq!(time1.to_rfc3339(), "2025-01-01T00:00:00+00:00");
    }

    #[test]
    fn test_sequential_ids() {
        let ids = SequentialIdGenerator::new();
        let shared = ids.clone();
        assert_eq!(ids.next_id(), SequentialIdGenerator::nth(1));
        assert_eq!(shared.next_id(), SequentialIdGenerator::nth(2));
    }

    #[test]
    fn test_identity_provider_empty_id_is_signed_out() {
        let identity = InMemoryIdentityProvider::new();
        identity.sign_in("");
        assert_eq!(identity.session(), Session::SignedOut);
    }

    #[test]
    fn test_identity_watch_sees_sign_in() {
        let identity = InMemoryIdentityProvider::new();
        let mut rx = identity.watch();

        identity.sign_in("u1");
        tokio_test::assert_ok!(tokio_test::block_on(rx.changed()));
        assert_eq!(
            rx.borrow().owner().map(|o| o.as_str().to_string()),
            Some("u1".to_string())
        );
    }
}
