//! Observable state of a subscription.
//!
//! A [`QueryState`] is what consumers read from a live subscription: the
//! materialized items (once the first response arrived), whether the first
//! response is still outstanding, and the terminal error if the
//! subscription failed.

use crate::item::Item;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a subscription handle.
///
/// ```text
/// Pending ──first push──▶ Active ──push──▶ Active
///    │                      │
///    └──────failure─────────┴──▶ Failed
///
/// any ──close/drop──▶ Closed
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubscriptionStatus {
    /// No response yet
    Pending,
    /// Data is populated and updates keep arriving
    Active,
    /// The subscription failed; no implicit recovery
    Failed,
    /// The handle was closed; no further delivery
    Closed,
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Active => write!(f, "active"),
            Self::Failed => write!(f, "failed"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// Read-only snapshot of a subscription: `data`, `loading`, `error`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryState {
    /// Materialized collection, `None` before the first response
    pub data: Option<Vec<Item>>,
    /// True until the first response (or failure) arrives
    pub loading: bool,
    /// Failure message, set once the subscription failed
    pub error: Option<String>,
}

impl QueryState {
    /// State of a freshly opened subscription
    #[must_use]
    pub const fn pending() -> Self {
        Self {
            data: None,
            loading: true,
            error: None,
        }
    }

    /// State after a push of `items`
    #[must_use]
    pub const fn ready(items: Vec<Item>) -> Self {
        Self {
            data: Some(items),
            loading: false,
            error: None,
        }
    }

    /// Transition to `Failed`, keeping the last delivered data
    #[must_use]
    pub fn failed(self, error: impl Into<String>) -> Self {
        Self {
            data: self.data,
            loading: false,
            error: Some(error.into()),
        }
    }

    /// Current lifecycle status derived from the fields
    #[must_use]
    pub const fn status(&self) -> SubscriptionStatus {
        if self.error.is_some() {
            SubscriptionStatus::Failed
        } else if self.loading {
            SubscriptionStatus::Pending
        } else {
            SubscriptionStatus::Active
        }
    }

    /// Items of the snapshot, empty before the first response
    #[must_use]
    pub fn items(&self) -> &[Item] {
        self.data.as_deref().unwrap_or_default()
    }

    /// Live count of items not yet done
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.items().iter().filter(|item| !item.done).count()
    }
}

impl Default for QueryState {
    fn default() -> Self {
        Self::pending()
    }
}
