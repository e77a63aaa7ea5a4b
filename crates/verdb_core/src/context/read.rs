//! Read transactions.

use crate::context::history::{self, HistoryEntry};
use crate::context::{ChangeContext, ReadContext};
use crate::database::Database;
use crate::entity::Entity;
use crate::error::{CoreError, CoreResult};
use crate::snapshot::Snapshot;
use crate::types::{Id, RefSlot};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;

/// A read transaction bound to one snapshot.
///
/// The binding is stable across concurrent commits by other threads; a
/// successful [`update`](SnapshotContext::update) through this context
/// rebinds it to the snapshot that update produced.
pub struct SnapshotContext<'db, E: Entity> {
    database: &'db Database<E>,
    snapshot: RwLock<Arc<Snapshot<E>>>,
}

impl<'db, E: Entity> SnapshotContext<'db, E> {
    pub(crate) fn new(database: &'db Database<E>) -> Self {
        Self {
            database,
            snapshot: RwLock::new(database.current_snapshot()),
        }
    }

    pub(crate) fn with_snapshot(database: &'db Database<E>, snapshot: Arc<Snapshot<E>>) -> Self {
        Self {
            database,
            snapshot: RwLock::new(snapshot),
        }
    }

    /// Runs a write transaction and, on success, rebinds this context to
    /// the snapshot it produced.
    pub fn update<R>(
        &self,
        f: impl FnOnce(&mut ChangeContext<'db, E>) -> CoreResult<R>,
    ) -> CoreResult<R> {
        let result = self.database.update(f)?;
        *self.snapshot.write() = self.database.current_snapshot();
        Ok(result)
    }
}

impl<'db, E: Entity> ReadContext<'db, E> for SnapshotContext<'db, E> {
    fn database(&self) -> &'db Database<E> {
        self.database
    }

    fn snapshot(&self) -> Arc<Snapshot<E>> {
        Arc::clone(&self.snapshot.read())
    }

    fn resolve(&self, id: Id) -> CoreResult<Arc<E>> {
        let snapshot = self.snapshot.read();
        snapshot
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::entry_not_found(id, snapshot.version()))
    }

    fn referenced_by(&self, target: Id, slot: RefSlot) -> CoreResult<Vec<Arc<E>>> {
        let snapshot = self.snapshot();
        let mut sources: Vec<Arc<E>> = snapshot
            .referenced_by(target, slot)
            .iter()
            .map(|id| self.resolve(*id))
            .collect::<CoreResult<_>>()?;
        sources.sort_by_key(|entry| entry.id());
        Ok(sources)
    }

    fn check_is_current(&self, entity: &Arc<E>) -> CoreResult<()> {
        let latest = self.database.current_snapshot();
        match latest.get(entity.id()) {
            Some(live) if Arc::ptr_eq(live, entity) => Ok(()),
            Some(_) => Err(CoreError::stale_read(entity.id())),
            None => Err(CoreError::entry_not_found(entity.id(), latest.version())),
        }
    }

    fn version_before(&self, entity: &Arc<E>) -> Option<HistoryEntry<'db, E>> {
        history::version_before_in(self.database, &self.snapshot(), entity)
    }
}

impl<E: Entity> fmt::Debug for SnapshotContext<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotContext")
            .field("version", &self.snapshot.read().version())
            .finish()
    }
}
