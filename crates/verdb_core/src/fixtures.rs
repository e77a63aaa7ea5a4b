//! Minimal entity type for engine-level tests.

use crate::context::ChangeContext;
use crate::entity::{Entity, RefSets};
use crate::types::{Id, RefSlot, SnapshotVersion};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A named node with one reference slot pointing at other nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) struct TestNode {
    id: Id,
    version: u64,
    snapshot_version: SnapshotVersion,
    name: String,
    refs: BTreeSet<Id>,
}

impl TestNode {
    pub(crate) const REFS: RefSlot = RefSlot::new(0);

    pub(crate) fn new(
        id: Id,
        version: u64,
        snapshot_version: SnapshotVersion,
        name: impl Into<String>,
        refs: im::HashSet<Id>,
    ) -> Self {
        Self {
            id,
            version,
            snapshot_version,
            name: name.into(),
            refs: refs.into_iter().collect(),
        }
    }

    /// The root node every fixture database starts with: id 1, version 0.
    pub(crate) fn root() -> Self {
        Self::new(
            Id::new(1),
            0,
            SnapshotVersion::new(0),
            "root",
            im::HashSet::new(),
        )
    }

    /// A node referencing `parent`, stamped with an explicit snapshot
    /// version.
    pub(crate) fn child(id: Id, parent: Id, snapshot_version: u64) -> Self {
        let mut refs = im::HashSet::new();
        refs.insert(parent);
        Self::new(
            id,
            0,
            SnapshotVersion::new(snapshot_version),
            "child",
            refs,
        )
    }

    /// A node referencing `parent`, stamped for the running transaction.
    pub(crate) fn child_at(id: Id, parent: Id, tx: &ChangeContext<'_, Self>) -> Self {
        Self::child(id, parent, tx.next_snapshot_version().as_u64())
    }

    /// Successor revision with `child` added to the reference slot.
    pub(crate) fn with_child_at(&self, child: Id, tx: &ChangeContext<'_, Self>) -> Self {
        let mut next = self.clone();
        next.version += 1;
        next.snapshot_version = tx.next_snapshot_version();
        next.refs.insert(child);
        next
    }

    /// Successor revision with a new name.
    pub(crate) fn renamed(&self, name: impl Into<String>, tx: &ChangeContext<'_, Self>) -> Self {
        let mut next = self.clone();
        next.version += 1;
        next.snapshot_version = tx.next_snapshot_version();
        next.name = name.into();
        next
    }

    pub(crate) fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn children(&self) -> im::HashSet<Id> {
        self.refs.iter().copied().collect()
    }
}

impl Entity for TestNode {
    fn id(&self) -> Id {
        self.id
    }

    fn version(&self) -> u64 {
        self.version
    }

    fn snapshot_version(&self) -> SnapshotVersion {
        self.snapshot_version
    }

    fn referenced_ids(&self) -> RefSets {
        let mut sets = RefSets::new();
        if !self.refs.is_empty() {
            sets.insert(Self::REFS, self.children());
        }
        sets
    }
}
