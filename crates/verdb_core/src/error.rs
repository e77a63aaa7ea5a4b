//! Error types for VerDB core.

use crate::types::{Id, SnapshotVersion};
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in VerDB core operations.
///
/// All errors are synchronous and abort the enclosing transaction without
/// partial effect; the engine never retries on its own.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Storage backend error.
    #[error("storage error: {0}")]
    Storage(#[from] verdb_storage::StorageError),

    /// Codec error.
    #[error("codec error: {0}")]
    Codec(#[from] verdb_codec::CodecError),

    /// Identifier has no entry in the bound snapshot.
    #[error("entry {id} not found in snapshot {snapshot_version}")]
    EntryNotFound {
        /// The identifier that was looked up.
        id: Id,
        /// The snapshot the lookup ran against.
        snapshot_version: SnapshotVersion,
    },

    /// A revision with an equal-or-newer version is already committed.
    #[error(
        "stale write on entry {id}: version {version} is not newer than committed version {committed_version}"
    )]
    StaleWrite {
        /// The conflicting identifier.
        id: Id,
        /// The version of the revision the caller tried to persist.
        version: u64,
        /// The version already committed for that id.
        committed_version: u64,
    },

    /// The caller is operating on a revision superseded by a newer commit.
    #[error("stale read: entry {id} is an old revision")]
    StaleRead {
        /// The identifier of the stale revision.
        id: Id,
    },

    /// `update` was invoked from inside another `update`.
    #[error("a nested update is not possible")]
    NestedTransaction,

    /// Internal consistency check failed; indicates an engine bug.
    #[error("invariant violation: {message}")]
    InvariantViolation {
        /// Description of the violated invariant.
        message: String,
    },

    /// The persistence log cannot be replayed.
    #[error("replay failed: {message}")]
    ReplayError {
        /// Description of the replay problem.
        message: String,
    },
}

impl CoreError {
    /// Creates an entry-not-found error.
    #[must_use]
    pub fn entry_not_found(id: Id, snapshot_version: SnapshotVersion) -> Self {
        Self::EntryNotFound {
            id,
            snapshot_version,
        }
    }

    /// Creates a stale-write error.
    #[must_use]
    pub fn stale_write(id: Id, version: u64, committed_version: u64) -> Self {
        Self::StaleWrite {
            id,
            version,
            committed_version,
        }
    }

    /// Creates a stale-read error.
    #[must_use]
    pub fn stale_read(id: Id) -> Self {
        Self::StaleRead { id }
    }

    /// Creates an invariant-violation error.
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::InvariantViolation {
            message: message.into(),
        }
    }

    /// Creates a replay error.
    pub fn replay(message: impl Into<String>) -> Self {
        Self::ReplayError {
            message: message.into(),
        }
    }
}
