//! Immutable snapshots.
//!
//! A snapshot is a complete, frozen view of the object graph at one
//! version. Successive snapshots share unchanged structure through the
//! persistent maps, so taking one is cheap regardless of graph size.

use crate::backref::{self, BackRefIndex};
use crate::entity::{Entity, EntryMap};
use crate::error::{CoreError, CoreResult};
use crate::records::{DiffRecord, FullRecord};
use crate::types::{Id, RefSlot, SnapshotVersion};
use std::fmt;
use std::sync::Arc;

/// One frozen version of the object graph.
pub struct Snapshot<E: Entity> {
    version: SnapshotVersion,
    time_millis: u64,
    root_id: Id,
    entries: EntryMap<E>,
    changed: im::HashSet<Id>,
    history: im::HashMap<SnapshotVersion, Arc<Snapshot<E>>>,
    back_refs: BackRefIndex,
}

impl<E: Entity> Snapshot<E> {
    /// Creates the initial snapshot (version 0) containing only the root.
    pub(crate) fn init(root: Arc<E>, time_millis: u64) -> Self {
        let root_id = root.id();
        let mut entries = EntryMap::new();
        entries.insert(root_id, root);
        let back_refs = backref::index_entries(&entries);
        let mut changed = im::HashSet::new();
        changed.insert(root_id);
        Self {
            version: SnapshotVersion::new(0),
            time_millis,
            root_id,
            entries,
            changed,
            history: im::HashMap::new(),
            back_refs,
        }
    }

    /// Builds the next snapshot from a set of changed revisions and the
    /// already-updated back-reference index. The current snapshot is
    /// pushed onto the new snapshot's history.
    pub(crate) fn successor(
        self: &Arc<Self>,
        changed: EntryMap<E>,
        back_refs: BackRefIndex,
        time_millis: u64,
    ) -> Self {
        let mut entries = self.entries.clone();
        let mut changed_ids = im::HashSet::new();
        for (id, entry) in changed {
            changed_ids.insert(id);
            entries.insert(id, entry);
        }
        let mut history = self.history.clone();
        history.insert(self.version, Arc::clone(self));
        Self {
            version: self.version.next(),
            time_millis,
            root_id: self.root_id,
            entries,
            changed: changed_ids,
            history,
            back_refs,
        }
    }

    /// Same graph and version, but with the history chain dropped.
    pub(crate) fn cleared(&self) -> Self {
        Self {
            version: self.version,
            time_millis: self.time_millis,
            root_id: self.root_id,
            entries: self.entries.clone(),
            changed: im::HashSet::new(),
            history: im::HashMap::new(),
            back_refs: self.back_refs.clone(),
        }
    }

    /// Rebuilds version 0 from its diff record.
    pub(crate) fn from_initial_diff(record: &DiffRecord<E>) -> CoreResult<Self> {
        if record.version.as_u64() != 0 {
            return Err(CoreError::replay(format!(
                "initial record has version {}, expected v0",
                record.version
            )));
        }
        let mut entries = EntryMap::new();
        let mut changed = im::HashSet::new();
        for entry in &record.changed {
            changed.insert(entry.id());
            entries.insert(entry.id(), Arc::clone(entry));
        }
        if !entries.contains_key(&record.root_id) {
            return Err(CoreError::replay(format!(
                "initial record does not contain root {}",
                record.root_id
            )));
        }
        let back_refs = backref::index_entries(&entries);
        Ok(Self {
            version: record.version,
            time_millis: record.time_millis,
            root_id: record.root_id,
            entries,
            changed,
            history: im::HashMap::new(),
            back_refs,
        })
    }

    /// Applies the next diff record on top of this snapshot.
    pub(crate) fn apply_diff(self: &Arc<Self>, record: &DiffRecord<E>) -> CoreResult<Self> {
        if record.version != self.version.next() {
            return Err(CoreError::replay(format!(
                "diff record {} does not follow snapshot {}",
                record.version, self.version
            )));
        }
        let mut back_refs = self.back_refs.clone();
        let mut changed = EntryMap::new();
        let empty = crate::entity::RefSets::new();
        for entry in &record.changed {
            let before = self
                .entries
                .get(&entry.id())
                .map(|prior| prior.referenced_ids());
            backref::apply_entity_delta(
                &mut back_refs,
                entry.id(),
                before.as_ref().unwrap_or(&empty),
                &entry.referenced_ids(),
            );
            changed.insert(entry.id(), Arc::clone(entry));
        }
        Ok(self.successor(changed, back_refs, record.time_millis))
    }

    /// Rebuilds a snapshot from a full record. The resulting snapshot has
    /// no in-memory history; older versions remain reachable only through
    /// earlier records on disk.
    pub(crate) fn from_full(record: &FullRecord<E>) -> CoreResult<Self> {
        let mut entries = EntryMap::new();
        for entry in &record.entries {
            entries.insert(entry.id(), Arc::clone(entry));
        }
        if !entries.contains_key(&record.root_id) {
            return Err(CoreError::replay(format!(
                "full record {} does not contain root {}",
                record.version, record.root_id
            )));
        }
        let back_refs = backref::index_entries(&entries);
        Ok(Self {
            version: record.version,
            time_millis: record.time_millis,
            root_id: record.root_id,
            entries,
            changed: im::HashSet::new(),
            history: im::HashMap::new(),
            back_refs,
        })
    }

    /// Snapshot version.
    #[must_use]
    pub fn version(&self) -> SnapshotVersion {
        self.version
    }

    /// Commit time in milliseconds since the Unix epoch.
    #[must_use]
    pub fn time_millis(&self) -> u64 {
        self.time_millis
    }

    /// Id of the root entity.
    #[must_use]
    pub fn root_id(&self) -> Id {
        self.root_id
    }

    /// Looks up the revision of `id` in this snapshot.
    #[must_use]
    pub fn get(&self, id: Id) -> Option<&Arc<E>> {
        self.entries.get(&id)
    }

    /// Whether `id` exists in this snapshot.
    #[must_use]
    pub fn contains(&self, id: Id) -> bool {
        self.entries.contains_key(&id)
    }

    /// Number of entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the snapshot holds no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Ids of all entities.
    pub fn ids(&self) -> impl Iterator<Item = Id> + '_ {
        self.entries.keys().copied()
    }

    /// All entity revisions in this snapshot.
    pub(crate) fn entries(&self) -> &EntryMap<E> {
        &self.entries
    }

    /// Ids changed by the transaction that produced this snapshot.
    pub fn changed_ids(&self) -> impl Iterator<Item = Id> + '_ {
        self.changed.iter().copied()
    }

    /// Number of ids changed by the producing transaction.
    #[must_use]
    pub fn changed_len(&self) -> usize {
        self.changed.len()
    }

    /// Looks up an older snapshot retained in the history chain.
    #[must_use]
    pub fn history_snapshot(&self, version: SnapshotVersion) -> Option<&Arc<Snapshot<E>>> {
        self.history.get(&version)
    }

    /// Number of retained historical snapshots.
    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    pub(crate) fn history(&self) -> &im::HashMap<SnapshotVersion, Arc<Snapshot<E>>> {
        &self.history
    }

    pub(crate) fn back_refs(&self) -> &BackRefIndex {
        &self.back_refs
    }

    /// Ids of entities whose slot `slot` references `target`.
    #[must_use]
    pub fn referenced_by(&self, target: Id, slot: RefSlot) -> im::HashSet<Id> {
        self.back_refs
            .get(&crate::backref::BackRef::new(target, slot))
            .cloned()
            .unwrap_or_default()
    }

    /// Checks the incremental back-reference index against a full rebuild.
    #[must_use]
    pub fn verify_back_refs(&self) -> bool {
        backref::index_entries(&self.entries) == self.back_refs
    }
}

impl<E: Entity> fmt::Debug for Snapshot<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Snapshot")
            .field("version", &self.version)
            .field("root_id", &self.root_id)
            .field("entries", &self.entries.len())
            .field("changed", &self.changed.len())
            .field("history", &self.history.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::TestNode;

    #[test]
    fn init_contains_only_root() {
        let root = Arc::new(TestNode::root());
        let snap = Snapshot::init(Arc::clone(&root), 1_000);

        assert_eq!(snap.version(), SnapshotVersion::new(0));
        assert_eq!(snap.len(), 1);
        assert!(snap.contains(root.id()));
        assert_eq!(snap.changed_len(), 1);
        assert_eq!(snap.history_len(), 0);
        assert!(snap.verify_back_refs());
    }

    #[test]
    fn successor_shares_unchanged_entries() {
        let root = Arc::new(TestNode::root());
        let snap = Arc::new(Snapshot::init(Arc::clone(&root), 0));

        let child = Arc::new(TestNode::child(Id::new(2), root.id(), 1));
        let mut changed = EntryMap::new();
        changed.insert(child.id(), Arc::clone(&child));
        let mut back_refs = snap.back_refs().clone();
        crate::backref::apply_entity_delta(
            &mut back_refs,
            child.id(),
            &crate::entity::RefSets::new(),
            &child.referenced_ids(),
        );
        let next = snap.successor(changed, back_refs, 5);

        assert_eq!(next.version(), SnapshotVersion::new(1));
        assert_eq!(next.len(), 2);
        // The untouched root revision is the same allocation in both.
        assert!(Arc::ptr_eq(snap.get(root.id()).unwrap(), next.get(root.id()).unwrap()));
        assert!(next.history_snapshot(SnapshotVersion::new(0)).is_some());
        assert!(next.verify_back_refs());
    }

    #[test]
    fn cleared_drops_history_but_keeps_graph() {
        let root = Arc::new(TestNode::root());
        let snap = Arc::new(Snapshot::init(Arc::clone(&root), 0));
        let child = Arc::new(TestNode::child(Id::new(2), root.id(), 1));
        let mut changed = EntryMap::new();
        changed.insert(child.id(), Arc::clone(&child));
        let next = snap.successor(changed, snap.back_refs().clone(), 5);

        let cleared = next.cleared();
        assert_eq!(cleared.version(), next.version());
        assert_eq!(cleared.len(), next.len());
        assert_eq!(cleared.history_len(), 0);
        assert_eq!(cleared.changed_len(), 0);
    }
}
