//! Owner-scoped subscription queries.
//!
//! A [`Query`] names a collection and a filter. The only filter this system
//! issues is `ownerId == <session owner>`; it is what keeps one user's items
//! out of another user's snapshot, so it is always required.

use crate::item::{Item, OwnerId};
use serde::{Deserialize, Serialize};

/// Name of the remote collection holding to-do items.
pub const ITEMS_COLLECTION: &str = "items";

/// Filter predicate of a subscription.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Filter {
    /// Only items owned by this user match
    pub owner_id: OwnerId,
}

impl Filter {
    /// Filter matching items owned by `owner_id`
    #[must_use]
    pub const fn owned_by(owner_id: OwnerId) -> Self {
        Self { owner_id }
    }

    /// Returns true if the item satisfies the predicate
    #[must_use]
    pub fn matches(&self, item: &Item) -> bool {
        item.owner_id == self.owner_id
    }
}

/// A standing query over one collection.
///
/// Serializes to the remote's subscribe payload:
///
/// ```
/// use livelist_core::item::OwnerId;
/// use livelist_core::query::Query;
///
/// let query = Query::items_owned_by(OwnerId::new("u1").unwrap());
/// assert_eq!(
///     serde_json::to_string(&query).unwrap(),
///     r#"{"collection":"items","where":{"ownerId":"u1"}}"#
/// );
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Query {
    /// Collection name
    pub collection: String,
    /// Filter predicate
    #[serde(rename = "where")]
    pub filter: Filter,
}

impl Query {
    /// The items of a single owner
    #[must_use]
    pub fn items_owned_by(owner_id: OwnerId) -> Self {
        Self {
            collection: ITEMS_COLLECTION.to_string(),
            filter: Filter::owned_by(owner_id),
        }
    }

    /// The owner this query is scoped to
    #[must_use]
    pub const fn owner(&self) -> &OwnerId {
        &self.filter.owner_id
    }

    /// Returns true if the item belongs to this query's result set
    #[must_use]
    pub fn matches(&self, collection: &str, item: &Item) -> bool {
        self.collection == collection && self.filter.matches(item)
    }
}
