//! Reducer logic for the to-do screen.
//!
//! Commands are checked against the session and the current snapshot, then
//! turned into transactions built by [`crate::view_model`]. Nothing is
//! applied locally: the state only changes when the subscription pushes the
//! result back.

use crate::types::{TodoAction, TodoState};
use crate::view_model;
use livelist_core::{
    effect::{Effect, EffectId},
    environment::{Clock, IdGenerator},
    identity::Session,
    item::{Item, ItemId, OwnerId},
    mutation::Batch,
    query::Query,
    reducer::Reducer,
    remote::RemoteStore,
    smallvec,
    snapshot::{QueryState, SubscriptionStatus},
    subscribe, transact, SmallVec,
};
use std::sync::Arc;

/// Cancellation id of the owner-scoped items subscription
pub const ITEMS_SUBSCRIPTION: &str = "todo.items";

/// Environment dependencies for the to-do reducer
#[derive(Clone)]
pub struct TodoEnvironment {
    /// Clock for creation timestamps
    pub clock: Arc<dyn Clock>,
    /// Source of fresh item ids
    pub ids: Arc<dyn IdGenerator>,
    /// Remote store holding the items
    pub remote: Arc<dyn RemoteStore>,
}

impl TodoEnvironment {
    /// Creates a new `TodoEnvironment`
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
        remote: Arc<dyn RemoteStore>,
    ) -> Self {
        Self { clock, ids, remote }
    }
}

/// Reducer for the to-do screen
#[derive(Clone, Debug)]
pub struct TodoReducer;

impl TodoReducer {
    /// Creates a new `TodoReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// The signed-in owner, or the reason a mutation is refused
    fn require_owner(state: &TodoState) -> Result<&OwnerId, String> {
        state
            .owner()
            .ok_or_else(|| "Sign in before changing the list".to_string())
    }

    /// An item of the current snapshot, or the reason it cannot be used
    fn require_item(state: &TodoState, id: ItemId) -> Result<&Item, String> {
        Self::require_owner(state)?;
        state
            .get(id)
            .ok_or_else(|| format!("Todo {id} is not in the current list"))
    }

    /// Records a refused command; no effects
    fn reject(state: &mut TodoState, error: String) -> SmallVec<[Effect<TodoAction>; 4]> {
        tracing::warn!(error = %error, "Command rejected");
        state.last_error = Some(error);
        SmallVec::new()
    }

    /// Submits `batch`; an empty batch is dropped by the runtime
    fn submit(
        state: &mut TodoState,
        batch: Batch,
        env: &TodoEnvironment,
    ) -> SmallVec<[Effect<TodoAction>; 4]> {
        state.last_error = None;
        smallvec![transact! {
            remote: env.remote,
            batch: batch,
        }]
    }

    /// Opens the items subscription for `owner`, replacing any previous one
    fn open_subscription(owner: &OwnerId, env: &TodoEnvironment) -> Effect<TodoAction> {
        let for_owner = owner.clone();
        subscribe! {
            remote: env.remote,
            query: Query::items_owned_by(owner.clone()),
            on_update: |state| Some(TodoAction::SnapshotUpdated {
                owner: for_owner.clone(),
                state,
            }),
        }
        .cancellable(ITEMS_SUBSCRIPTION)
    }
}

impl Default for TodoReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl Reducer for TodoReducer {
    type State = TodoState;
    type Action = TodoAction;
    type Environment = TodoEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        tracing::debug!(action = action.name(), "Reducing action");

        match action {
            // ========== Identity ==========
            TodoAction::SignIn { owner } => {
                if state.owner() == Some(&owner) {
                    if state.query.status() != SubscriptionStatus::Failed {
                        return SmallVec::new();
                    }
                    tracing::info!(owner = %owner, "Reopening failed subscription");
                } else {
                    tracing::info!(owner = %owner, "Signed in");
                }

                let effect = Self::open_subscription(&owner, env);
                state.session = Session::SignedIn(owner);
                state.query = QueryState::pending();
                state.last_error = None;
                smallvec![effect]
            },

            TodoAction::SignOut => {
                if state.owner().is_none() {
                    return SmallVec::new();
                }

                tracing::info!("Signed out");
                *state = TodoState::new();
                smallvec![Effect::Cancel(EffectId::new(ITEMS_SUBSCRIPTION))]
            },

            // ========== Mutations ==========
            TodoAction::AddTodo { text } => {
                let batch = match Self::require_owner(state) {
                    Ok(owner) => view_model::add(text, owner, env.ids.next_id(), env.clock.now()),
                    Err(error) => return Self::reject(state, error),
                };
                Self::submit(state, batch, env)
            },

            TodoAction::ToggleTodo { id } => {
                let batch = match Self::require_item(state, id) {
                    Ok(item) => view_model::toggle_one(item),
                    Err(error) => return Self::reject(state, error),
                };
                Self::submit(state, batch, env)
            },

            TodoAction::ToggleAll => {
                if let Err(error) = Self::require_owner(state) {
                    return Self::reject(state, error);
                }
                let batch = view_model::toggle_all(state.items());
                Self::submit(state, batch, env)
            },

            TodoAction::DeleteTodo { id } => {
                let batch = match Self::require_item(state, id) {
                    Ok(item) => view_model::delete_one(item),
                    Err(error) => return Self::reject(state, error),
                };
                Self::submit(state, batch, env)
            },

            TodoAction::DeleteCompleted => {
                if let Err(error) = Self::require_owner(state) {
                    return Self::reject(state, error);
                }
                let batch = view_model::delete_completed(state.items());
                Self::submit(state, batch, env)
            },

            // ========== Subscription ==========
            TodoAction::SnapshotUpdated { owner, state: snapshot } => {
                if state.owner() == Some(&owner) {
                    state.query = snapshot;
                } else {
                    tracing::debug!(owner = %owner, "Dropping snapshot for stale owner");
                }
                SmallVec::new()
            },
        }
    }
}
