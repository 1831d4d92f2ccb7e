//! # Livelist Runtime
//!
//! Runtime implementation for the Livelist sync layer.
//!
//! This crate provides the [`SyncClient`] that keeps live, owner-scoped
//! snapshots of a remote store, and the [`Store`] runtime that coordinates
//! reducer execution and effect handling.
//!
//! ## Core Components
//!
//! - **`SyncClient` / `LiveQuery`**: Subscriptions and fire-and-forget transactions
//! - **Store**: The runtime that manages state and executes effects
//! - **Effect Executor**: Executes effect descriptions and feeds actions back to reducers
//!
//! ## Example
//!
//! ```ignore
//! use livelist_runtime::Store;
//!
//! let store = Store::new(TodoState::default(), TodoReducer::new(), environment);
//!
//! // Send an action
//! store.send(TodoAction::AddTodo { text: "buy milk".into() }).await?;
//!
//! // Read state
//! let remaining = store.state(|s| s.remaining()).await;
//! ```

use livelist_core::effect::{Effect, EffectId};
use livelist_core::reducer::Reducer;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::{watch, RwLock};
use tokio::task::AbortHandle;

/// Prometheus metrics for observability
pub mod metrics;

/// Live subscriptions and transactions against a remote store
pub mod sync;

pub use sync::{LiveQuery, SnapshotWatcher, SubscriptionClosed, SyncClient};

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug)]
    pub enum StoreError {
        /// Store is shutting down and not accepting new actions
        ///
        /// This error is returned when `send()` is called after shutdown initiated.
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown timed out waiting for effects to complete
        ///
        /// Some effects were still running when the timeout elapsed.
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),

        /// Timeout waiting for an action
        ///
        /// Returned by `send_and_wait_for` when the timeout expires before
        /// a matching action is received.
        #[error("Timeout waiting for action")]
        Timeout,

        /// Action broadcast channel closed
        #[error("Action broadcast channel closed")]
        ChannelClosed,
    }
}

pub use error::StoreError;

/// Configuration for Store instances
///
/// # Example
///
/// ```ignore
/// let config = StoreConfig::default()
///     .with_broadcast_capacity(256)
///     .with_shutdown_timeout(Duration::from_secs(5));
///
/// let store = Store::with_config(state, reducer, env, config);
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Capacity of the action broadcast channel
    pub broadcast_capacity: usize,
    /// Default timeout for graceful shutdown
    pub default_shutdown_timeout: Duration,
}

impl StoreConfig {
    /// Set the action broadcast capacity
    #[must_use]
    pub const fn with_broadcast_capacity(mut self, capacity: usize) -> Self {
        self.broadcast_capacity = capacity;
        self
    }

    /// Set the default shutdown timeout
    #[must_use]
    pub const fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.default_shutdown_timeout = timeout;
        self
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            broadcast_capacity: 16,
            default_shutdown_timeout: Duration::from_secs(30),
        }
    }
}

/// Handle for tracking effect completion
///
/// Returned by [`Store::send()`] to allow waiting for the effects an action
/// produced. Standing subscriptions are not tracked: they only end when
/// cancelled or at shutdown.
///
/// # Example
///
/// ```ignore
/// let mut handle = store.send(Action::Start).await?;
/// handle.wait_with_timeout(Duration::from_secs(5)).await?;
/// ```
#[derive(Clone)]
pub struct EffectHandle {
    effects: Arc<AtomicUsize>,
    completion: watch::Receiver<()>,
}

impl EffectHandle {
    fn new() -> (Self, EffectTracking) {
        let counter = Arc::new(AtomicUsize::new(0));
        let (tx, rx) = watch::channel(());

        let handle = Self {
            effects: Arc::clone(&counter),
            completion: rx,
        };
        let tracking = EffectTracking {
            counter,
            notifier: tx,
        };

        (handle, tracking)
    }

    /// Create a handle that's already complete
    #[must_use]
    pub fn completed() -> Self {
        let (tx, rx) = watch::channel(());
        let _ = tx.send(());

        Self {
            effects: Arc::new(AtomicUsize::new(0)),
            completion: rx,
        }
    }

    /// Wait for all tracked effects to complete
    pub async fn wait(&mut self) {
        while self.effects.load(Ordering::SeqCst) > 0 {
            if self.completion.changed().await.is_err() {
                break;
            }
        }
    }

    /// Wait for all tracked effects to complete with a timeout
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Timeout`] if the timeout expires before all
    /// effects complete.
    pub async fn wait_with_timeout(&mut self, timeout: Duration) -> Result<(), StoreError> {
        tokio::time::timeout(timeout, self.wait())
            .await
            .map_err(|_| StoreError::Timeout)
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending_effects", &self.effects.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}

/// Internal: effect tracking context passed through effect execution
#[derive(Clone)]
struct EffectTracking {
    counter: Arc<AtomicUsize>,
    notifier: watch::Sender<()>,
}

impl EffectTracking {
    fn increment(&self) {
        self.counter.fetch_add(1, Ordering::SeqCst);
    }

    fn decrement(&self) {
        if self.counter.fetch_sub(1, Ordering::SeqCst) == 1 {
            let _ = self.notifier.send(());
        }
    }
}

/// Internal: RAII guard that decrements effect counter on drop
///
/// Runs on completion, panic, and abort alike.
struct DecrementGuard(EffectTracking);

impl Drop for DecrementGuard {
    fn drop(&mut self) {
        self.0.decrement();
    }
}

/// Guard that decrements an atomic counter on drop (for shutdown tracking)
struct AtomicCounterGuard(Arc<AtomicUsize>);

impl Drop for AtomicCounterGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Internal: in-flight tasks grouped by cancellation id, plus standing
/// subscriptions to abort at shutdown.
#[derive(Clone, Default)]
struct Cancellations {
    groups: Arc<Mutex<HashMap<EffectId, Vec<AbortHandle>>>>,
    standing: Arc<Mutex<Vec<AbortHandle>>>,
}

impl Cancellations {
    fn register(&self, id: &EffectId, handle: AbortHandle) {
        let mut groups = self.groups.lock().unwrap_or_else(PoisonError::into_inner);
        let group = groups.entry(id.clone()).or_default();
        group.retain(|h| !h.is_finished());
        group.push(handle);
    }

    fn register_standing(&self, handle: AbortHandle) {
        let mut standing = self.standing.lock().unwrap_or_else(PoisonError::into_inner);
        standing.retain(|h| !h.is_finished());
        standing.push(handle);
    }

    /// Abort every task under `id`; returns how many were still running
    fn cancel(&self, id: &EffectId) -> usize {
        let handles = self
            .groups
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(id)
            .unwrap_or_default();

        let mut aborted = 0;
        for handle in handles {
            if !handle.is_finished() {
                handle.abort();
                aborted += 1;
            }
        }
        aborted
    }

    fn abort_standing(&self) -> usize {
        let handles: Vec<AbortHandle> = self
            .standing
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .drain(..)
            .collect();
        let count = handles.iter().filter(|h| !h.is_finished()).count();
        for handle in handles {
            handle.abort();
        }
        count
    }
}

/// Store module - The runtime for reducers
///
/// Store runtime for coordinating reducer execution and effect handling.
pub mod store {
    use super::{
        Arc, AtomicBool, AtomicCounterGuard, AtomicUsize, Cancellations, DecrementGuard,
        Duration, Effect, EffectHandle, EffectId, EffectTracking, Ordering, Reducer, RwLock,
        StoreConfig, StoreError,
    };
    use crate::sync::SyncClient;
    use tokio::sync::{broadcast, watch};
    use tokio::task::JoinHandle;

    /// The Store - runtime coordinator for a reducer
    ///
    /// The Store manages:
    /// 1. State (behind `RwLock` for concurrent access)
    /// 2. Reducer (business logic)
    /// 3. Environment (injected dependencies)
    /// 4. Effect execution (with feedback loop)
    ///
    /// # Type Parameters
    ///
    /// - `S`: State type
    /// - `A`: Action type
    /// - `E`: Environment type
    /// - `R`: Reducer implementation
    pub struct Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E>,
    {
        state: Arc<RwLock<S>>,
        reducer: R,
        environment: E,
        shutdown: Arc<AtomicBool>,
        pending_effects: Arc<AtomicUsize>,
        cancellations: Cancellations,
        /// Action broadcast channel for observing actions produced by effects.
        action_broadcast: broadcast::Sender<A>,
    }

    impl<S, A, E, R> Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
        A: Send + Clone + 'static,
        S: Send + Sync + 'static,
        E: Send + Sync + 'static,
    {
        /// Create a new store with initial state, reducer, and environment
        #[must_use]
        pub fn new(initial_state: S, reducer: R, environment: E) -> Self {
            Self::with_config(initial_state, reducer, environment, StoreConfig::default())
        }

        /// Create a new Store with custom configuration
        #[must_use]
        pub fn with_config(
            initial_state: S,
            reducer: R,
            environment: E,
            config: StoreConfig,
        ) -> Self {
            let (action_broadcast, _) = broadcast::channel(config.broadcast_capacity.max(1));

            Self {
                state: Arc::new(RwLock::new(initial_state)),
                reducer,
                environment,
                shutdown: Arc::new(AtomicBool::new(false)),
                pending_effects: Arc::new(AtomicUsize::new(0)),
                cancellations: Cancellations::default(),
                action_broadcast,
            }
        }

        /// Initiate graceful shutdown of the store
        ///
        /// This method:
        /// 1. Sets the shutdown flag (rejecting new actions)
        /// 2. Aborts standing subscriptions
        /// 3. Waits for pending effects to complete (with timeout)
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if the timeout expires before all
        /// pending effects complete.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating graceful shutdown");
            metrics::counter!("store.shutdown.initiated").increment(1);

            self.shutdown.store(true, Ordering::Release);

            let aborted = self.cancellations.abort_standing();
            tracing::debug!(subscriptions = aborted, "Aborted standing subscriptions");

            let start = std::time::Instant::now();
            let poll_interval = Duration::from_millis(10);

            loop {
                let pending = self.pending_effects.load(Ordering::Acquire);

                if pending == 0 {
                    tracing::info!("All effects completed, shutdown successful");
                    return Ok(());
                }

                if start.elapsed() >= timeout {
                    tracing::error!(
                        pending_effects = pending,
                        "Shutdown timeout: {} effects still running", pending
                    );
                    return Err(StoreError::ShutdownTimeout(pending));
                }

                tokio::time::sleep(poll_interval).await;
            }
        }

        /// Send an action to the store
        ///
        /// 1. Acquires write lock on state
        /// 2. Calls reducer with (state, action, environment)
        /// 3. Executes returned effects asynchronously
        ///
        /// `send()` returns after starting effect execution, not completion.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] if the store is shutting down.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: A) -> Result<EffectHandle, StoreError>
        where
            R: Clone,
            E: Clone,
        {
            if self.shutdown.load(Ordering::Acquire) {
                tracing::warn!("Rejected action: store is shutting down");
                return Err(StoreError::ShutdownInProgress);
            }

            tracing::debug!("Processing action");
            metrics::counter!("store.commands.total").increment(1);

            let (handle, tracking) = EffectHandle::new();

            let effects = {
                let mut state = self.state.write().await;

                let span = tracing::debug_span!("reducer_execution");
                let _enter = span.enter();

                let start = std::time::Instant::now();
                let effects = self.reducer.reduce(&mut *state, action, &self.environment);
                metrics::histogram!("store.reducer.duration_seconds")
                    .record(start.elapsed().as_secs_f64());

                tracing::trace!("Reducer completed, returned {} effects", effects.len());
                effects
            };

            for effect in effects {
                self.execute_effect(effect, &tracking, None);
            }

            Ok(handle)
        }

        /// Send an action and wait for a matching action produced by effects
        ///
        /// Subscribes to the action broadcast before sending, so no matching
        /// action can be missed.
        ///
        /// # Errors
        ///
        /// - [`StoreError::Timeout`]: Timeout expired before matching action received
        /// - [`StoreError::ChannelClosed`]: Action broadcast channel closed
        /// - [`StoreError::ShutdownInProgress`]: Store is shutting down
        pub async fn send_and_wait_for<F>(
            &self,
            action: A,
            predicate: F,
            timeout: Duration,
        ) -> Result<A, StoreError>
        where
            R: Clone,
            E: Clone,
            F: Fn(&A) -> bool,
        {
            let mut rx = self.action_broadcast.subscribe();

            self.send(action).await?;

            tokio::time::timeout(timeout, async {
                loop {
                    match rx.recv().await {
                        Ok(action) if predicate(&action) => return Ok(action),
                        Ok(_) => {},
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            tracing::warn!(skipped, "Action observer lagged, {} actions skipped", skipped);
                        },
                        Err(broadcast::error::RecvError::Closed) => {
                            return Err(StoreError::ChannelClosed);
                        },
                    }
                }
            })
            .await
            .map_err(|_| StoreError::Timeout)?
        }

        /// Subscribe to all actions produced by effects
        ///
        /// Only actions fed back by effects (snapshots, delayed actions, future
        /// results) are broadcast, not actions passed to `send` directly.
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<A> {
            self.action_broadcast.subscribe()
        }

        /// Forward every value of a watch channel into the store as an action.
        ///
        /// The current value is sent first. Forwarding stops when the channel
        /// closes or the store shuts down.
        pub fn observe<T, F>(&self, mut rx: watch::Receiver<T>, to_action: F) -> JoinHandle<()>
        where
            T: Clone + Send + Sync + 'static,
            F: Fn(T) -> A + Send + 'static,
            R: Clone,
            E: Clone,
        {
            let store = self.clone();
            tokio::spawn(async move {
                loop {
                    let value = rx.borrow_and_update().clone();
                    if store.send(to_action(value)).await.is_err() {
                        break;
                    }
                    if rx.changed().await.is_err() {
                        break;
                    }
                }
            })
        }

        /// Read current state via a closure
        ///
        /// ```ignore
        /// let remaining = store.state(|s| s.remaining()).await;
        /// ```
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&S) -> T,
        {
            let state = self.state.read().await;
            f(&*state)
        }

        /// Spawn a tracked task, registering it under `scope` if cancellable
        fn spawn_tracked<F>(&self, task: F, tracking: &EffectTracking, scope: Option<&EffectId>)
        where
            F: std::future::Future<Output = ()> + Send + 'static,
        {
            tracking.increment();
            self.pending_effects.fetch_add(1, Ordering::SeqCst);
            let pending_guard = AtomicCounterGuard(Arc::clone(&self.pending_effects));
            let guard = DecrementGuard(tracking.clone());

            let handle = tokio::spawn(async move {
                let _guard = guard;
                let _pending_guard = pending_guard;
                task.await;
            });

            if let Some(id) = scope {
                self.cancellations.register(id, handle.abort_handle());
            }
        }

        /// Feed an action produced by an effect back into the store
        async fn feed_back(&self, action: A) -> Result<EffectHandle, StoreError>
        where
            R: Clone,
            E: Clone,
        {
            let _ = self.action_broadcast.send(action.clone());
            self.send(action).await
        }

        /// Execute an effect
        ///
        /// # Error Handling Strategy
        ///
        /// **Reducer panics**: Propagate (fail fast).
        ///
        /// **Effect execution failures**: Log and continue. Effects are
        /// fire-and-forget; the [`DecrementGuard`] keeps counters right even
        /// when a task panics or is aborted.
        #[allow(clippy::too_many_lines)]
        fn execute_effect(&self, effect: Effect<A>, tracking: &EffectTracking, scope: Option<&EffectId>)
        where
            R: Clone,
            E: Clone,
        {
            match effect {
                Effect::None => {
                    metrics::counter!("store.effects.executed", "type" => "none").increment(1);
                },
                Effect::Future(fut) => {
                    tracing::trace!("Executing Effect::Future");
                    metrics::counter!("store.effects.executed", "type" => "future").increment(1);

                    let store = self.clone();
                    self.spawn_tracked(
                        async move {
                            if let Some(action) = fut.await {
                                let _ = store.feed_back(action).await;
                            }
                        },
                        tracking,
                        scope,
                    );
                },
                Effect::Delay { duration, action } => {
                    tracing::trace!("Executing Effect::Delay (duration: {:?})", duration);
                    metrics::counter!("store.effects.executed", "type" => "delay").increment(1);

                    let store = self.clone();
                    self.spawn_tracked(
                        async move {
                            tokio::time::sleep(duration).await;
                            let _ = store.feed_back(*action).await;
                        },
                        tracking,
                        scope,
                    );
                },
                Effect::Parallel(effects) => {
                    tracing::trace!("Executing Effect::Parallel with {} effects", effects.len());
                    metrics::counter!("store.effects.executed", "type" => "parallel").increment(1);

                    for effect in effects {
                        self.execute_effect(effect, tracking, scope);
                    }
                },
                Effect::Sequential(effects) => {
                    let effect_count = effects.len();
                    tracing::trace!("Executing Effect::Sequential with {} effects", effect_count);
                    metrics::counter!("store.effects.executed", "type" => "sequential").increment(1);

                    let store = self.clone();
                    let inner_scope = scope.cloned();
                    self.spawn_tracked(
                        async move {
                            for (idx, effect) in effects.into_iter().enumerate() {
                                tracing::trace!(
                                    "Executing sequential effect {} of {}",
                                    idx + 1,
                                    effect_count
                                );

                                let (mut sub_handle, sub_tracking) = EffectHandle::new();
                                store.execute_effect(effect, &sub_tracking, inner_scope.as_ref());
                                sub_handle.wait().await;
                            }
                        },
                        tracking,
                        scope,
                    );
                },
                Effect::Transact(op) => {
                    metrics::counter!("store.effects.executed", "type" => "transact").increment(1);

                    // In-flight transactions are never cancelled, so no scope
                    if let Some(task) = SyncClient::new(op.remote).spawn_submit(op.batch) {
                        self.spawn_tracked(
                            async move {
                                if let Err(error) = task.await {
                                    tracing::error!(error = %error, "Transaction task failed");
                                }
                            },
                            tracking,
                            None,
                        );
                    }
                },
                Effect::Subscribe(op) => {
                    tracing::debug!(owner = %op.query.owner(), "Executing Effect::Subscribe");
                    metrics::counter!("store.effects.executed", "type" => "subscribe").increment(1);

                    let store = self.clone();
                    let task = tokio::spawn(async move {
                        let mut live = SyncClient::new(op.remote).subscribe(op.query);
                        loop {
                            let snapshot = live.snapshot();
                            if let Some(action) = (op.on_update)(snapshot) {
                                if store.feed_back(action).await.is_err() {
                                    break;
                                }
                            }
                            if live.changed().await.is_err() {
                                break;
                            }
                        }
                    });

                    let abort = task.abort_handle();
                    if let Some(id) = scope {
                        self.cancellations.register(id, abort.clone());
                    }
                    self.cancellations.register_standing(abort);
                },
                Effect::Cancellable { id, effect } => {
                    let aborted = self.cancellations.cancel(&id);
                    if aborted > 0 {
                        tracing::debug!(id = %id, aborted, "Replaced in-flight effects");
                        metrics::counter!("store.effects.cancelled").increment(aborted as u64);
                    }
                    self.execute_effect(*effect, tracking, Some(&id));
                },
                Effect::Cancel(id) => {
                    let aborted = self.cancellations.cancel(&id);
                    tracing::debug!(id = %id, aborted, "Cancelled effects");
                    metrics::counter!("store.effects.cancelled").increment(aborted as u64);
                },
            }
        }
    }

    impl<S, A, E, R> Clone for Store<S, A, E, R>
    where
        R: Reducer<State = S, Action = A, Environment = E> + Clone,
        E: Clone,
    {
        fn clone(&self) -> Self {
            Self {
                state: Arc::clone(&self.state),
                reducer: self.reducer.clone(),
                environment: self.environment.clone(),
                shutdown: Arc::clone(&self.shutdown),
                pending_effects: Arc::clone(&self.pending_effects),
                cancellations: self.cancellations.clone(),
                action_broadcast: self.action_broadcast.clone(),
            }
        }
    }
}

// Re-export for convenience
pub use store::Store;
