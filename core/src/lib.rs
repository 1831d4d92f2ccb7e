//! # Livelist Core
//!
//! Core traits and types for the Livelist reactive sync layer.
//!
//! This crate provides the data model of a single-owner to-do list backed by
//! a remote reactive store, and the abstractions used to drive it with the
//! Reducer pattern.
//!
//! ## Core Concepts
//!
//! - **Item / Query / Batch**: the entity, the owner-scoped subscription
//!   filter, and atomic mutation batches sent to the remote
//! - **`RemoteStore`**: the boundary to the hosted store (subscribe, transact)
//! - **`QueryState`**: the observable `data` / `loading` / `error` snapshot
//! - **Reducer**: Pure function `(State, Action, Environment) → (State, Effects)`
//! - **Effect**: Side effect descriptions (not execution)
//! - **Environment**: Injected dependencies via traits
//!
//! ## Example
//!
//! ```ignore
//! use livelist_core::*;
//!
//! impl Reducer for TodoReducer {
//!     type State = TodoState;
//!     type Action = TodoAction;
//!     type Environment = TodoEnvironment;
//!
//!     fn reduce(
//!         &self,
//!         state: &mut TodoState,
//!         action: TodoAction,
//!         env: &TodoEnvironment,
//!     ) -> SmallVec<[Effect<TodoAction>; 4]> {
//!         // Build a batch, describe the transaction
//!         smallvec![transact!(remote: env.remote, batch: batch)]
//!     }
//! }
//! ```

// Re-export commonly used types
pub use chrono::{DateTime, Utc};
pub use serde::{Deserialize, Serialize};
pub use smallvec::{smallvec, SmallVec};

/// Item entity and identifiers
pub mod item;

/// Owner-scoped queries
pub mod query;

/// Mutations and atomic batches
pub mod mutation;

/// Subscription snapshot state
pub mod snapshot;

/// Remote store boundary
pub mod remote;

/// Identity boundary
pub mod identity;

/// Declarative macros for effect construction
pub mod effect_macros;

/// Reducer module - The core trait for business logic
///
/// Reducers are pure functions: `(State, Action, Environment) → (State, Effects)`
///
/// They contain all business logic and are deterministic and testable.
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// The Reducer trait - core abstraction for business logic
    ///
    /// # Type Parameters
    ///
    /// - `State`: The domain state this reducer operates on
    /// - `Action`: The action type this reducer processes
    /// - `Environment`: The injected dependencies this reducer needs
    pub trait Reducer {
        /// The state type this reducer operates on
        type State;

        /// The action type this reducer processes
        type Action;

        /// The environment type with injected dependencies
        type Environment;

        /// Reduce an action into state changes and effects
        ///
        /// This is a pure function that:
        /// 1. Validates the action
        /// 2. Updates state in place
        /// 3. Returns effect descriptions to be executed
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Effect module - Side effect descriptions
///
/// Effects describe side effects to be performed by the runtime.
/// They are values (not execution) and are composable and cancellable.
pub mod effect {
    use crate::mutation::Batch;
    use crate::query::Query;
    use crate::remote::RemoteStore;
    use crate::snapshot::QueryState;
    use std::fmt;
    use std::future::Future;
    use std::pin::Pin;
    use std::sync::Arc;
    use std::time::Duration;

    /// Identifier grouping cancellable effects.
    #[derive(Clone, Debug, PartialEq, Eq, Hash)]
    pub struct EffectId(String);

    impl EffectId {
        /// Create a new effect id
        #[must_use]
        pub fn new(id: impl Into<String>) -> Self {
            Self(id.into())
        }

        /// Get the id as a string slice
        #[must_use]
        pub fn as_str(&self) -> &str {
            &self.0
        }
    }

    impl fmt::Display for EffectId {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "{}", self.0)
        }
    }

    impl From<&str> for EffectId {
        fn from(id: &str) -> Self {
            Self(id.to_string())
        }
    }

    /// Submit a batch to a remote store, fire-and-forget.
    pub struct TransactOperation {
        /// Store the batch is submitted to
        pub remote: Arc<dyn RemoteStore>,
        /// Mutations to apply atomically
        pub batch: Batch,
    }

    /// Callback mapping a subscription snapshot to an action
    pub type SnapshotCallback<Action> = Box<dyn Fn(QueryState) -> Option<Action> + Send + Sync>;

    /// Open a standing subscription and feed every snapshot back as an action.
    pub struct SubscribeOperation<Action> {
        /// Store to subscribe to
        pub remote: Arc<dyn RemoteStore>,
        /// Owner-scoped query
        pub query: Query,
        /// Called with the initial pending state and after every change
        pub on_update: SnapshotCallback<Action>,
    }

    /// Effect type - describes a side effect to be executed
    ///
    /// Effects are NOT executed immediately. They are descriptions of what should happen,
    /// returned from reducers and executed by the Store runtime.
    pub enum Effect<Action> {
        /// No-op effect
        None,

        /// Run effects in parallel
        Parallel(Vec<Effect<Action>>),

        /// Run effects sequentially
        Sequential(Vec<Effect<Action>>),

        /// Delayed action
        Delay {
            /// How long to wait
            duration: Duration,
            /// Action to dispatch after delay
            action: Box<Action>,
        },

        /// Arbitrary async computation
        ///
        /// Returns `Option<Action>` - if Some, the action is fed back into the reducer
        Future(Pin<Box<dyn Future<Output = Option<Action>> + Send>>),

        /// Submit a mutation batch (fire-and-forget, never fed back)
        Transact(TransactOperation),

        /// Open a standing subscription
        ///
        /// Subscriptions live until cancelled or the store shuts down.
        Subscribe(SubscribeOperation<Action>),

        /// Run `effect` under `id`, aborting anything already in flight under `id`
        Cancellable {
            /// Cancellation group
            id: EffectId,
            /// Effect to run
            effect: Box<Effect<Action>>,
        },

        /// Abort every in-flight effect registered under the id
        Cancel(EffectId),
    }

    // Manual Debug implementation since Future doesn't implement Debug
    impl<Action> fmt::Debug for Effect<Action>
    where
        Action: fmt::Debug,
    {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            match self {
                Effect::None => write!(f, "Effect::None"),
                Effect::Parallel(effects) => {
                    f.debug_tuple("Effect::Parallel").field(effects).finish()
                },
                Effect::Sequential(effects) => {
                    f.debug_tuple("Effect::Sequential").field(effects).finish()
                },
                Effect::Delay { duration, action } => f
                    .debug_struct("Effect::Delay")
                    .field("duration", duration)
                    .field("action", action)
                    .finish(),
                Effect::Future(_) => write!(f, "Effect::Future(<future>)"),
                Effect::Transact(op) => f
                    .debug_struct("Effect::Transact")
                    .field("batch", &op.batch)
                    .finish_non_exhaustive(),
                Effect::Subscribe(op) => f
                    .debug_struct("Effect::Subscribe")
                    .field("query", &op.query)
                    .finish_non_exhaustive(),
                Effect::Cancellable { id, effect } => f
                    .debug_struct("Effect::Cancellable")
                    .field("id", id)
                    .field("effect", effect)
                    .finish(),
                Effect::Cancel(id) => f.debug_tuple("Effect::Cancel").field(id).finish(),
            }
        }
    }

    impl<Action> Effect<Action> {
        /// Combine effects to run in parallel
        #[must_use]
        pub const fn merge(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Parallel(effects)
        }

        /// Chain effects to run sequentially
        #[must_use]
        pub const fn chain(effects: Vec<Effect<Action>>) -> Effect<Action> {
            Effect::Sequential(effects)
        }

        /// Wrap this effect in a cancellation group
        #[must_use]
        pub fn cancellable(self, id: impl Into<EffectId>) -> Effect<Action> {
            Effect::Cancellable {
                id: id.into(),
                effect: Box::new(self),
            }
        }

        /// The batch of a `Transact` effect, if this is one
        #[must_use]
        pub const fn as_batch(&self) -> Option<&Batch> {
            match self {
                Effect::Transact(op) => Some(&op.batch),
                _ => None,
            }
        }
    }
}

/// Environment module - Dependency injection traits
///
/// All external dependencies are abstracted behind traits and injected
/// via the Environment parameter.
pub mod environment {
    use crate::item::ItemId;
    use chrono::{DateTime, Utc};

    /// Clock trait - abstracts time operations for testability
    pub trait Clock: Send + Sync {
        /// Get the current time
        fn now(&self) -> DateTime<Utc>;
    }

    /// Production clock backed by the system time
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }

    /// Generates item ids before the first write
    pub trait IdGenerator: Send + Sync {
        /// A fresh, never used id
        fn next_id(&self) -> ItemId;
    }

    /// Production id generator (UUID v4)
    #[derive(Debug, Clone, Copy, Default)]
    pub struct UuidGenerator;

    impl IdGenerator for UuidGenerator {
        fn next_id(&self) -> ItemId {
            ItemId::new()
        }
    }
}
