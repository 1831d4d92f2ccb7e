//! Mutation policies of the to-do list.
//!
//! Every user operation is a pure function from the current working set (the
//! items of the latest snapshot) to one atomic [`Batch`]. Nothing here talks
//! to the remote; the reducer wraps the batches in effects.

use chrono::{DateTime, Utc};
use livelist_core::item::{Item, ItemFields, ItemId, ItemPatch, OwnerId};
use livelist_core::mutation::{Batch, Mutation};

/// One insert of a new, not-done item owned by `owner`.
///
/// `id` must be fresh: resubmitting an insert with a used id conflicts.
#[must_use]
pub fn add(text: impl Into<String>, owner: &OwnerId, id: ItemId, now: DateTime<Utc>) -> Batch {
    Batch::items().with(Mutation::Insert {
        id,
        fields: ItemFields {
            text: text.into(),
            done: false,
            created_at: now,
            owner_id: owner.clone(),
        },
    })
}

/// One update flipping `item.done`.
#[must_use]
pub fn toggle_one(item: &Item) -> Batch {
    Batch::items().with(Mutation::Update {
        id: item.id,
        patch: ItemPatch::done(!item.done),
    })
}

/// The value toggle-all writes: `true` unless every item is already done.
///
/// An empty list counts as all done, so the target is `false`.
#[must_use]
pub fn toggle_all_target(items: &[Item]) -> bool {
    !items.iter().all(|item| item.done)
}

/// One update per item setting `done` to [`toggle_all_target`].
///
/// Items already at the target are written too.
#[must_use]
pub fn toggle_all(items: &[Item]) -> Batch {
    let target = toggle_all_target(items);
    let mut batch = Batch::items();
    batch.extend(items.iter().map(|item| Mutation::Update {
        id: item.id,
        patch: ItemPatch::done(target),
    }));
    batch
}

/// One delete of `item`.
#[must_use]
pub fn delete_one(item: &Item) -> Batch {
    Batch::items().with(Mutation::Delete { id: item.id })
}

/// One delete per done item; empty when nothing is done.
#[must_use]
pub fn delete_completed(items: &[Item]) -> Batch {
    let mut batch = Batch::items();
    batch.extend(
        items
            .iter()
            .filter(|item| item.done)
            .map(|item| Mutation::Delete { id: item.id }),
    );
    batch
}

/// Number of items not yet done.
#[must_use]
pub fn remaining(items: &[Item]) -> usize {
    items.iter().filter(|item| !item.done).count()
}
