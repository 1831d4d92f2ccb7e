//! Mutations and atomic batches.
//!
//! Every write is expressed as a [`Batch`] of [`Mutation`]s against one
//! collection. A batch is atomic: observers see either all of it or none of
//! it. Batches are submitted fire-and-forget; their effect shows up only in
//! a later snapshot.

use crate::item::{ItemFields, ItemId, ItemPatch};
use crate::query::ITEMS_COLLECTION;
use serde::{Deserialize, Serialize};

/// A single write against one item, keyed by its id.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mutation {
    /// Create a new item. The id must never have been written before.
    Insert {
        /// Client-generated id
        id: ItemId,
        /// All fields of the new item
        fields: ItemFields,
    },
    /// Change fields of an existing item
    Update {
        /// Item to update
        id: ItemId,
        /// Fields to change
        patch: ItemPatch,
    },
    /// Remove an item
    Delete {
        /// Item to remove
        id: ItemId,
    },
}

impl Mutation {
    /// The id this mutation is keyed by
    #[must_use]
    pub const fn id(&self) -> ItemId {
        match self {
            Self::Insert { id, .. } | Self::Update { id, .. } | Self::Delete { id } => *id,
        }
    }

    /// Wire operation name
    #[must_use]
    pub const fn op(&self) -> MutationOp {
        match self {
            Self::Insert { .. } => MutationOp::Insert,
            Self::Update { .. } => MutationOp::Update,
            Self::Delete { .. } => MutationOp::Delete,
        }
    }
}

/// Operation tag of a wire mutation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationOp {
    /// Insert
    Insert,
    /// Update
    Update,
    /// Delete
    Delete,
}

/// A mutation as sent to the remote store:
/// `{ "collection", "id", "op", "fields"? }`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WireMutation {
    /// Collection name
    pub collection: String,
    /// Item id
    pub id: ItemId,
    /// Operation tag
    pub op: MutationOp,
    /// Inserted or updated fields; absent for deletes
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fields: Option<serde_json::Value>,
}

/// An ordered, atomic set of mutations against one collection.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Batch {
    collection: String,
    mutations: Vec<Mutation>,
}

impl Batch {
    /// An empty batch against `collection`
    #[must_use]
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            mutations: Vec::new(),
        }
    }

    /// An empty batch against the items collection
    #[must_use]
    pub fn items() -> Self {
        Self::new(ITEMS_COLLECTION)
    }

    /// Appends a mutation
    #[must_use]
    pub fn with(mut self, mutation: Mutation) -> Self {
        self.mutations.push(mutation);
        self
    }

    /// Appends a mutation in place
    pub fn push(&mut self, mutation: Mutation) {
        self.mutations.push(mutation);
    }

    /// Target collection
    #[must_use]
    pub fn collection(&self) -> &str {
        &self.collection
    }

    /// Mutations in submission order
    #[must_use]
    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    /// Number of mutations
    #[must_use]
    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    /// Returns true if the batch has no mutations
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    /// Builds the wire payload for this batch.
    ///
    /// # Errors
    ///
    /// Returns a serialization error if a field value cannot be encoded.
    pub fn to_wire(&self) -> Result<Vec<WireMutation>, serde_json::Error> {
        self.mutations
            .iter()
            .map(|mutation| {
                let fields = match mutation {
                    Mutation::Insert { fields, .. } => Some(serde_json::to_value(fields)?),
                    Mutation::Update { patch, .. } => Some(serde_json::to_value(patch)?),
                    Mutation::Delete { .. } => None,
                };
                Ok(WireMutation {
                    collection: self.collection.clone(),
                    id: mutation.id(),
                    op: mutation.op(),
                    fields,
                })
            })
            .collect()
    }
}

impl Extend<Mutation> for Batch {
    fn extend<T: IntoIterator<Item = Mutation>>(&mut self, iter: T) {
        self.mutations.extend(iter);
    }
}

impl<'a> IntoIterator for &'a Batch {
    type Item = &'a Mutation;
    type IntoIter = std::slice::Iter<'a, Mutation>;

    fn into_iter(self) -> Self::IntoIter {
        self.mutations.iter()
    }
}
