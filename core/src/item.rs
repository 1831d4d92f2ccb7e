//! Item entity and identifier types.
//!
//! An [`Item`] is a single to-do entry. Its [`ItemId`] is generated on the
//! client before the first write so creation never needs a round trip, and
//! its [`OwnerId`] scopes every subscription that can observe it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Globally unique identifier of an item.
///
/// Generated client-side (UUID v4) exactly once per logical creation and
/// never changed afterwards. It is the sole key used by mutations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(Uuid);

impl ItemId {
    /// Creates a new random `ItemId`
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates an `ItemId` from a UUID
    #[must_use]
    pub const fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }

    /// Returns the inner UUID
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ItemId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned when parsing an [`OwnerId`] from an empty string.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Owner ID cannot be empty")]
pub struct EmptyOwnerIdError;

/// Opaque identifier of the user that owns an item.
///
/// Issued by the identity provider. An `OwnerId` is never empty: an empty
/// or missing user identifier means "signed out" and cannot own anything.
///
/// # Examples
///
/// ```
/// use livelist_core::item::OwnerId;
///
/// let owner: OwnerId = "user_2abc".parse().unwrap();
/// assert_eq!(owner.as_str(), "user_2abc");
/// assert!("".parse::<OwnerId>().is_err());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OwnerId(String);

impl OwnerId {
    /// Creates an `OwnerId`, returning `None` for an empty identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.is_empty() { None } else { Some(Self(id)) }
    }

    /// Get the owner ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for OwnerId {
    type Err = EmptyOwnerIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s).ok_or(EmptyOwnerIdError)
    }
}

impl TryFrom<String> for OwnerId {
    type Error = EmptyOwnerIdError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::new(s).ok_or(EmptyOwnerIdError)
    }
}

impl From<OwnerId> for String {
    fn from(id: OwnerId) -> Self {
        id.0
    }
}

impl AsRef<str> for OwnerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Every field of an item except its id, as written by an insert.
///
/// Serialized with the remote schema's field names:
/// `{ "text", "done", "createdAt", "ownerId" }`, with `createdAt` as epoch
/// milliseconds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemFields {
    /// User-entered label
    pub text: String,
    /// Completion flag
    pub done: bool,
    /// Creation time
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    /// Owning user
    pub owner_id: OwnerId,
}

/// Partial update of an item. Only `done` is ever mutated after creation.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPatch {
    /// New completion flag, if changed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
}

impl ItemPatch {
    /// A patch that sets `done` to the given value
    #[must_use]
    pub const fn done(done: bool) -> Self {
        Self { done: Some(done) }
    }

    /// Returns true if the patch changes nothing
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.done.is_none()
    }
}

/// A single to-do item as materialized in a snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    /// Unique identifier
    pub id: ItemId,
    /// User-entered label
    pub text: String,
    /// Whether the item is completed
    pub done: bool,
    /// When the item was created
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
    /// Owning user
    pub owner_id: OwnerId,
}

impl Item {
    /// Builds an item from its id and inserted fields
    #[must_use]
    pub fn from_fields(id: ItemId, fields: ItemFields) -> Self {
        Self {
            id,
            text: fields.text,
            done: fields.done,
            created_at: fields.created_at,
            owner_id: fields.owner_id,
        }
    }

    /// Applies a partial update in place
    pub fn apply(&mut self, patch: &ItemPatch) {
        if let Some(done) = patch.done {
            self.done = done;
        }
    }
}
