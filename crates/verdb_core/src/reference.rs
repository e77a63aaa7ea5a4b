//! Identity-only reference handles.

use crate::context::ReadContext;
use crate::entity::Entity;
use crate::error::CoreResult;
use crate::types::Id;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

/// A serializable, identity-only pointer to an entity.
///
/// A reference carries no borrow on any snapshot, so it can outlive the
/// snapshot it was taken from and be resolved against a later one.
/// Resolution fails with `EntryNotFound` if the identifier does not exist
/// in the bound context.
#[derive(Serialize, Deserialize)]
#[serde(transparent)]
pub struct Reference<E> {
    id: Id,
    #[serde(skip)]
    _marker: PhantomData<fn() -> E>,
}

impl<E: Entity> Reference<E> {
    /// Creates a reference from a raw id.
    #[must_use]
    pub const fn new(id: Id) -> Self {
        Self {
            id,
            _marker: PhantomData,
        }
    }

    /// Creates a reference to the given entity revision.
    #[must_use]
    pub fn to(entity: &E) -> Self {
        Self::new(entity.id())
    }

    /// Returns the referenced id.
    #[must_use]
    pub const fn id(&self) -> Id {
        self.id
    }

    /// Resolves this reference in the given context.
    ///
    /// # Errors
    ///
    /// Returns `EntryNotFound` if the id has no entry there.
    pub fn resolve<'db, C: ReadContext<'db, E>>(&self, ctx: &C) -> CoreResult<Arc<E>> {
        ctx.resolve(self.id)
    }
}

impl<E> Clone for Reference<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for Reference<E> {}

impl<E> PartialEq for Reference<E> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<E> Eq for Reference<E> {}

impl<E> std::hash::Hash for Reference<E> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<E> fmt::Debug for Reference<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Reference({})", self.id)
    }
}
