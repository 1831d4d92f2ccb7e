//! Domain types for the to-do list.
//!
//! The list itself lives in the remote store. Local state is only the
//! session, the latest snapshot of the owner's items, and the last rejected
//! command.

use livelist_core::identity::Session;
use livelist_core::item::{Item, ItemId, OwnerId};
use livelist_core::snapshot::QueryState;
use livelist_macros::Action;
use serde::{Deserialize, Serialize};

/// State of the to-do screen
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoState {
    /// Who is signed in
    pub session: Session,
    /// Latest snapshot of the signed-in owner's items
    pub query: QueryState,
    /// Last rejected command (if any)
    pub last_error: Option<String>,
}

impl TodoState {
    /// Creates a signed-out state
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The signed-in owner, if any
    #[must_use]
    pub const fn owner(&self) -> Option<&OwnerId> {
        self.session.owner()
    }

    /// Items of the current snapshot, in store order
    #[must_use]
    pub fn items(&self) -> &[Item] {
        self.query.items()
    }

    /// Finds an item of the current snapshot by id
    #[must_use]
    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items().iter().find(|item| item.id == id)
    }

    /// Number of items not yet done, derived from the snapshot
    #[must_use]
    pub fn remaining(&self) -> usize {
        crate::view_model::remaining(self.items())
    }
}

/// Actions of the to-do screen
///
/// Commands come from the user or the identity provider. Events come back
/// from the subscription.
#[derive(Action, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TodoAction {
    // ========== Commands ==========
    /// Command: A user signed in
    #[command]
    SignIn {
        /// The signed-in user
        owner: OwnerId,
    },

    /// Command: The user signed out
    #[command]
    SignOut,

    /// Command: Add an item
    #[command]
    AddTodo {
        /// Item label, stored as entered
        text: String,
    },

    /// Command: Flip one item's done flag
    #[command]
    ToggleTodo {
        /// Item to toggle
        id: ItemId,
    },

    /// Command: Set every item to the same done flag
    #[command]
    ToggleAll,

    /// Command: Delete one item
    #[command]
    DeleteTodo {
        /// Item to delete
        id: ItemId,
    },

    /// Command: Delete every done item
    #[command]
    DeleteCompleted,

    // ========== Events ==========
    /// Event: The subscription for `owner` produced a new snapshot
    #[event]
    SnapshotUpdated {
        /// Owner the subscription was opened for
        owner: OwnerId,
        /// New snapshot
        state: QueryState,
    },
}

impl From<Session> for TodoAction {
    fn from(session: Session) -> Self {
        match session {
            Session::SignedIn(owner) => Self::SignIn { owner },
            Session::SignedOut => Self::SignOut,
        }
    }
}
