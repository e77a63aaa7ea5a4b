//! Back-reference index.
//!
//! The index is the inverse of the entities' outgoing references: it maps
//! a referenced id plus the reference slot to the set of ids pointing at
//! it. It is maintained incrementally, so each transaction costs
//! proportional to the number of changed references, not to graph size.

use crate::entity::{Entity, EntryMap};
use crate::types::{Id, RefSlot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Key of the back-reference index: a referenced id and the reference
/// slot of the *source* entity that holds the reference.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct BackRef {
    /// Id of the referenced (target) entity.
    pub target: Id,
    /// Reference slot of the source entity.
    pub slot: RefSlot,
}

impl BackRef {
    /// Creates a back-reference key.
    #[must_use]
    pub const fn new(target: Id, slot: RefSlot) -> Self {
        Self { target, slot }
    }
}

impl fmt::Display for BackRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.target, self.slot)
    }
}

/// Persistent map from back-reference key to the set of source ids.
pub type BackRefIndex = im::HashMap<BackRef, im::HashSet<Id>>;

/// Applies the delta for one reference slot of one source entity.
///
/// Ids in `after - before` gain a back reference to `source`; ids in
/// `before - after` lose theirs. Entries whose set becomes empty are
/// dropped from the index.
pub(crate) fn apply_slot_delta(
    index: &mut BackRefIndex,
    source: Id,
    slot: RefSlot,
    before: &im::HashSet<Id>,
    after: &im::HashSet<Id>,
) {
    for target in after.iter() {
        if before.contains(target) {
            continue;
        }
        let key = BackRef::new(*target, slot);
        let mut sources = index.get(&key).cloned().unwrap_or_default();
        sources.insert(source);
        index.insert(key, sources);
    }
    for target in before.iter() {
        if after.contains(target) {
            continue;
        }
        let key = BackRef::new(*target, slot);
        if let Some(existing) = index.get(&key) {
            let mut sources = existing.clone();
            sources.remove(&source);
            if sources.is_empty() {
                index.remove(&key);
            } else {
                index.insert(key, sources);
            }
        }
    }
}

/// Applies the deltas between two revisions of the same entity, covering
/// every slot present in either revision's declaration.
pub(crate) fn apply_entity_delta(
    index: &mut BackRefIndex,
    source: Id,
    before: &crate::entity::RefSets,
    after: &crate::entity::RefSets,
) {
    let slots: BTreeSet<RefSlot> = before.keys().chain(after.keys()).copied().collect();
    let empty = im::HashSet::new();
    for slot in slots {
        let before_ids = before.get(&slot).unwrap_or(&empty);
        let after_ids = after.get(&slot).unwrap_or(&empty);
        apply_slot_delta(index, source, slot, before_ids, after_ids);
    }
}

/// Builds the index from scratch by scanning every entity's references.
///
/// Used when bootstrapping a snapshot from a full record; live commits
/// always go through the incremental delta path.
pub(crate) fn index_entries<E: Entity>(entries: &EntryMap<E>) -> BackRefIndex {
    let mut index = BackRefIndex::new();
    let empty = im::HashSet::new();
    for entry in entries.values() {
        for (slot, targets) in entry.referenced_ids() {
            apply_slot_delta(&mut index, entry.id(), slot, &empty, &targets);
        }
    }
    index
}
