//! Render gate of the to-do screen.
//!
//! [`Screen::from_state`] decides what the user sees. Loading and error
//! states replace the list entirely; the list is only shown once a snapshot
//! for the signed-in owner has arrived.

use crate::types::TodoState;
use livelist_core::item::ItemId;
use std::fmt;

/// Text shown while waiting for the first snapshot
pub const LOADING: &str = "Loading...";

/// Prefix of the subscription error message
pub const ERROR_PREFIX: &str = "Error querying data: ";

/// Label of the bulk delete action
pub const DELETE_COMPLETED: &str = "Delete Completed";

/// One visible item
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Row {
    /// Item the row's toggle and delete act on
    pub id: ItemId,
    /// Label, as entered
    pub text: String,
    /// Checkbox state
    pub done: bool,
}

/// What the screen shows
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Screen {
    /// Nobody is signed in
    SignIn,
    /// Subscription has not answered yet
    Loading,
    /// Subscription failed
    Error(String),
    /// The owner's items, in snapshot order
    List {
        /// Visible items
        rows: Vec<Row>,
        /// Items not yet done
        remaining: usize,
    },
}

impl Screen {
    /// Picks the screen for `state`
    #[must_use]
    pub fn from_state(state: &TodoState) -> Self {
        if state.owner().is_none() {
            return Self::SignIn;
        }
        if state.query.loading {
            return Self::Loading;
        }
        if let Some(error) = &state.query.error {
            return Self::Error(error.clone());
        }

        Self::List {
            rows: state
                .items()
                .iter()
                .map(|item| Row {
                    id: item.id,
                    text: item.text.clone(),
                    done: item.done,
                })
                .collect(),
            remaining: state.remaining(),
        }
    }
}

impl fmt::Display for Screen {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SignIn => write!(f, "Sign in"),
            Self::Loading => write!(f, "{LOADING}"),
            Self::Error(message) => write!(f, "{ERROR_PREFIX}{message}"),
            Self::List { rows, remaining } => {
                writeln!(f, "todos")?;
                for row in rows {
                    let mark = if row.done { "x" } else { " " };
                    writeln!(f, "[{mark}] {}", row.text)?;
                }
                writeln!(f, "Remaining todos: {remaining}")?;
                write!(f, "{DELETE_COMPLETED}")
            },
        }
    }
}
