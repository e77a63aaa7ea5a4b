//! History traversal.

use crate::context::read::SnapshotContext;
use crate::database::Database;
use crate::entity::Entity;
use crate::snapshot::Snapshot;
use crate::types::SnapshotVersion;
use std::fmt;
use std::sync::Arc;

/// A historical revision together with a read context bound to the
/// snapshot that authored it, so reference walks from the revision see
/// the graph as it was then.
pub struct HistoryEntry<'db, E: Entity> {
    context: SnapshotContext<'db, E>,
    entry: Arc<E>,
}

impl<'db, E: Entity> HistoryEntry<'db, E> {
    pub(crate) fn new(
        database: &'db Database<E>,
        snapshot: Arc<Snapshot<E>>,
        entry: Arc<E>,
    ) -> Self {
        Self {
            context: SnapshotContext::with_snapshot(database, snapshot),
            entry,
        }
    }

    /// The historical revision.
    #[must_use]
    pub fn entry(&self) -> &Arc<E> {
        &self.entry
    }

    /// Version of the snapshot the revision was written in.
    #[must_use]
    pub fn snapshot_version(&self) -> SnapshotVersion {
        self.entry.snapshot_version()
    }

    /// The read context bound to the authoring snapshot.
    #[must_use]
    pub fn context(&self) -> &SnapshotContext<'db, E> {
        &self.context
    }

    /// Runs `f` against the authoring snapshot's context.
    pub fn perform<R>(&self, f: impl FnOnce(&SnapshotContext<'db, E>) -> R) -> R {
        f(&self.context)
    }
}

impl<E: Entity> fmt::Debug for HistoryEntry<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HistoryEntry")
            .field("snapshot_version", &self.snapshot_version())
            .field("entry", &self.entry)
            .finish()
    }
}

/// Finds the revision of `entity` that preceded it, searching the
/// history chain reachable from `snapshot`.
///
/// The snapshot one version before the entity's own `snapshot_version`
/// is the newest one that can hold an older revision. The entry found
/// there may itself have been written even earlier; in that case the
/// authoring snapshot is looked up through the entry's own
/// `snapshot_version`.
pub(crate) fn version_before_in<'db, E: Entity>(
    database: &'db Database<E>,
    snapshot: &Arc<Snapshot<E>>,
    entity: &Arc<E>,
) -> Option<HistoryEntry<'db, E>> {
    let prior_version = entity.snapshot_version().prev()?;
    let prior = if prior_version == snapshot.version() {
        Arc::clone(snapshot)
    } else {
        Arc::clone(snapshot.history_snapshot(prior_version)?)
    };
    let candidate = Arc::clone(prior.get(entity.id())?);
    let authoring = if candidate.snapshot_version() == prior.version() {
        prior
    } else {
        match snapshot.history_snapshot(candidate.snapshot_version()) {
            Some(origin) => Arc::clone(origin),
            None => prior,
        }
    };
    Some(HistoryEntry::new(database, authoring, candidate))
}

/// Iterator over earlier revisions of one entity, newest first. Lazy
/// and finite; ends where the retained history does.
pub struct VersionsBefore<'db, E: Entity> {
    database: &'db Database<E>,
    snapshot: Arc<Snapshot<E>>,
    current: Option<Arc<E>>,
}

impl<'db, E: Entity> VersionsBefore<'db, E> {
    pub(crate) fn new(
        database: &'db Database<E>,
        snapshot: Arc<Snapshot<E>>,
        start: Arc<E>,
    ) -> Self {
        Self {
            database,
            snapshot,
            current: Some(start),
        }
    }
}

impl<'db, E: Entity> Iterator for VersionsBefore<'db, E> {
    type Item = HistoryEntry<'db, E>;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.current.take()?;
        let entry = version_before_in(self.database, &self.snapshot, &current)?;
        self.current = Some(Arc::clone(entry.entry()));
        Some(entry)
    }
}
