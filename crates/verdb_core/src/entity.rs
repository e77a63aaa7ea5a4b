//! Entity model.

use crate::types::{Id, RefSlot, SnapshotVersion};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Outgoing reference declaration: ordered mapping from slot to target ids.
///
/// An entity with no outgoing references yields an empty mapping.
pub type RefSets = BTreeMap<RefSlot, im::HashSet<Id>>;

/// Persistent map from id to the current revision of an entity.
pub type EntryMap<E> = im::HashMap<Id, Arc<E>>;

/// The versioned, identity-bearing unit of storage.
///
/// Applications implement this for a **closed sum type** over their
/// concrete entity kinds and match exhaustively; the engine never inspects
/// the payload beyond these accessors.
///
/// # Invariants
///
/// - Entities are immutable values; "changing" one produces a new value
///   with the same `id` and `version + 1`.
/// - `snapshot_version` is the version of the snapshot whose transaction
///   created the revision.
/// - Revision identity is `Arc` pointer identity: the engine hands out
///   `Arc<E>` and decides "is this the current revision" by
///   [`Arc::ptr_eq`], never by value comparison.
pub trait Entity: fmt::Debug + Send + Sync + Serialize + DeserializeOwned + 'static {
    /// The identifier, assigned once and kept across revisions.
    fn id(&self) -> Id;

    /// The revision number, starting at 0 and incremented by exactly 1
    /// for each successor revision.
    fn version(&self) -> u64;

    /// The snapshot version at which this revision was created.
    fn snapshot_version(&self) -> SnapshotVersion;

    /// The outgoing references of this revision.
    fn referenced_ids(&self) -> RefSets;
}
