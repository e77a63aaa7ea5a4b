//! Transaction contexts.
//!
//! All reads and writes happen through a context. A [`SnapshotContext`]
//! binds a read transaction to one snapshot; a [`ChangeContext`] is the
//! working state of a write transaction. Both expose the same read
//! surface through [`ReadContext`], so domain code written against the
//! trait runs unchanged inside and outside a transaction.

mod change;
mod history;
mod read;

pub use change::ChangeContext;
pub use history::{HistoryEntry, VersionsBefore};
pub use read::SnapshotContext;

use crate::database::Database;
use crate::entity::Entity;
use crate::error::CoreResult;
use crate::snapshot::Snapshot;
use crate::types::{Id, RefSlot};
use std::sync::Arc;

/// Read surface shared by both context kinds.
pub trait ReadContext<'db, E: Entity> {
    /// The owning database.
    fn database(&self) -> &'db Database<E>;

    /// The snapshot this context currently reads from.
    fn snapshot(&self) -> Arc<Snapshot<E>>;

    /// Looks up the revision of `id` visible to this context.
    fn resolve(&self, id: Id) -> CoreResult<Arc<E>>;

    /// All entities whose reference slot `slot` points at `target`,
    /// sorted by id. Empty if nothing references it.
    fn referenced_by(&self, target: Id, slot: RefSlot) -> CoreResult<Vec<Arc<E>>>;

    /// Fails with `StaleRead` unless `entity` is the live revision for
    /// its id: pointer-identical to the entry in the database's latest
    /// published snapshot (or, inside a write transaction, to the
    /// pending revision).
    fn check_is_current(&self, entity: &Arc<E>) -> CoreResult<()>;

    /// The revision of `entity` that preceded it, paired with a context
    /// bound to the snapshot that authored it. `None` for the first
    /// revision or when the history has been cleared past it.
    fn version_before(&self, entity: &Arc<E>) -> Option<HistoryEntry<'db, E>>;

    /// Resolves the root entity.
    fn root(&self) -> CoreResult<Arc<E>> {
        let root_id = self.snapshot().root_id();
        self.resolve(root_id)
    }

    /// Iterates all earlier revisions of `entity`, newest first,
    /// stopping where the history ends.
    fn versions_before(&self, entity: &Arc<E>) -> VersionsBefore<'db, E> {
        VersionsBefore::new(self.database(), self.snapshot(), Arc::clone(entity))
    }
}
