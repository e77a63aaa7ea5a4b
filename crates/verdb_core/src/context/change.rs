//! Write transactions.

use crate::backref::{self, BackRefIndex};
use crate::context::history::{self, HistoryEntry};
use crate::context::ReadContext;
use crate::database::Database;
use crate::entity::{Entity, EntryMap, RefSets};
use crate::error::{CoreError, CoreResult};
use crate::snapshot::Snapshot;
use crate::types::{Id, RefSlot, SnapshotVersion};
use std::fmt;
use std::sync::Arc;

/// Working state of one write transaction.
///
/// Created by the database commit protocol and handed to the update
/// closure. Pending revisions and the working back-reference index are
/// private copies; nothing is visible to other contexts until the
/// transaction commits.
pub struct ChangeContext<'db, E: Entity> {
    database: &'db Database<E>,
    base: Arc<Snapshot<E>>,
    next_version: SnapshotVersion,
    changed: EntryMap<E>,
    back_refs: BackRefIndex,
}

impl<'db, E: Entity> ChangeContext<'db, E> {
    pub(crate) fn new(database: &'db Database<E>, base: Arc<Snapshot<E>>) -> Self {
        let next_version = base.version().next();
        let back_refs = base.back_refs().clone();
        Self {
            database,
            base,
            next_version,
            changed: EntryMap::new(),
            back_refs,
        }
    }

    /// Version the snapshot under construction will carry. New entity
    /// revisions stamp this as their `snapshot_version`.
    #[must_use]
    pub fn next_snapshot_version(&self) -> SnapshotVersion {
        self.next_version
    }

    /// Draws a fresh id from the database's generator.
    #[must_use]
    pub fn next_id(&self) -> Id {
        self.database.next_id()
    }

    /// Records a new revision of an entity.
    ///
    /// Returns the input unchanged when it is already the pending or
    /// committed revision for its id. Fails with `StaleWrite` when the
    /// committed revision is at least as new as the one the caller
    /// derived from.
    ///
    /// The working back-reference index is updated here, from the delta
    /// between the superseded revision's `referenced_ids` and the new
    /// one's. The same derivation runs during replay, so the index of a
    /// live snapshot and of its replayed twin always agree.
    pub fn persist(&mut self, entity: Arc<E>) -> CoreResult<Arc<E>> {
        let id = entity.id();
        if let Some(pending) = self.changed.get(&id) {
            if Arc::ptr_eq(pending, &entity) {
                return Ok(entity);
            }
        }
        if let Some(committed) = self.base.get(id) {
            if Arc::ptr_eq(committed, &entity) {
                return Ok(entity);
            }
            if committed.version() >= entity.version() {
                return Err(CoreError::stale_write(
                    id,
                    entity.version(),
                    committed.version(),
                ));
            }
        }
        let before = self
            .changed
            .get(&id)
            .or_else(|| self.base.get(id))
            .map(|prior| prior.referenced_ids());
        let empty = RefSets::new();
        backref::apply_entity_delta(
            &mut self.back_refs,
            id,
            before.as_ref().unwrap_or(&empty),
            &entity.referenced_ids(),
        );
        self.changed.insert(id, Arc::clone(&entity));
        Ok(entity)
    }

    /// Whether any revision is pending.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        !self.changed.is_empty()
    }

    pub(crate) fn into_parts(self) -> (EntryMap<E>, BackRefIndex) {
        (self.changed, self.back_refs)
    }
}

impl<'db, E: Entity> ReadContext<'db, E> for ChangeContext<'db, E> {
    fn database(&self) -> &'db Database<E> {
        self.database
    }

    fn snapshot(&self) -> Arc<Snapshot<E>> {
        Arc::clone(&self.base)
    }

    fn resolve(&self, id: Id) -> CoreResult<Arc<E>> {
        if let Some(pending) = self.changed.get(&id) {
            return Ok(Arc::clone(pending));
        }
        self.base
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::entry_not_found(id, self.base.version()))
    }

    fn referenced_by(&self, target: Id, slot: RefSlot) -> CoreResult<Vec<Arc<E>>> {
        let key = crate::backref::BackRef::new(target, slot);
        let mut sources: Vec<Arc<E>> = match self.back_refs.get(&key) {
            Some(ids) => ids
                .iter()
                .map(|id| self.resolve(*id))
                .collect::<CoreResult<_>>()?,
            None => Vec::new(),
        };
        sources.sort_by_key(|entry| entry.id());
        Ok(sources)
    }

    fn check_is_current(&self, entity: &Arc<E>) -> CoreResult<()> {
        let id = entity.id();
        let live = self.changed.get(&id).or_else(|| self.base.get(id));
        match live {
            Some(live) if Arc::ptr_eq(live, entity) => Ok(()),
            Some(_) => Err(CoreError::stale_read(id)),
            None => Err(CoreError::entry_not_found(id, self.base.version())),
        }
    }

    fn version_before(&self, entity: &Arc<E>) -> Option<HistoryEntry<'db, E>> {
        history::version_before_in(self.database, &self.base, entity)
    }
}

impl<E: Entity> fmt::Debug for ChangeContext<'_, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeContext")
            .field("base_version", &self.base.version())
            .field("pending", &self.changed.len())
            .finish()
    }
}
