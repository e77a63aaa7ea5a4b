//! Core type definitions for VerDB.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an entity.
///
/// Ids are 64-bit integers, unique within one database, assigned once and
/// never reused. Every revision of an entity keeps its id.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Id(pub u64);

impl Id {
    /// Creates an id from its raw value.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the raw id value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "id:{}", self.0)
    }
}

/// Version of a snapshot.
///
/// Snapshot versions are monotonic per database, starting at 0; each
/// committed transaction produces exactly one successor version.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct SnapshotVersion(pub u64);

impl SnapshotVersion {
    /// Creates a snapshot version from its raw value.
    #[must_use]
    pub const fn new(version: u64) -> Self {
        Self(version)
    }

    /// Returns the raw version value.
    #[must_use]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    /// Returns the next snapshot version.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// Returns the previous snapshot version, or `None` for version 0.
    #[must_use]
    pub fn prev(self) -> Option<Self> {
        self.0.checked_sub(1).map(Self)
    }
}

impl fmt::Display for SnapshotVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Slot number of an outgoing reference declaration.
///
/// An entity declares its outgoing references as an ordered mapping from
/// slot to a set of target ids; the slot distinguishes reference roles
/// (e.g. "member items" vs "owner") within one entity kind.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RefSlot(pub u8);

impl RefSlot {
    /// Creates a reference slot from its raw value.
    #[must_use]
    pub const fn new(slot: u8) -> Self {
        Self(slot)
    }

    /// Returns the raw slot value.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self.0
    }
}

impl fmt::Display for RefSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "slot:{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn id_display() {
        assert_eq!(format!("{}", Id::new(42)), "id:42");
    }

    #[test]
    fn snapshot_version_next_and_prev() {
        let v = SnapshotVersion::new(3);
        assert_eq!(v.next(), SnapshotVersion::new(4));
        assert_eq!(v.prev(), Some(SnapshotVersion::new(2)));
        assert_eq!(SnapshotVersion::new(0).prev(), None);
    }

    #[test]
    fn ordering() {
        assert!(SnapshotVersion::new(1) < SnapshotVersion::new(2));
        assert!(Id::new(1) < Id::new(2));
    }
}
