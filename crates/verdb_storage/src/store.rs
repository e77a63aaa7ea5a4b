//! Log store trait and record addressing.

use crate::error::StorageResult;
use std::fmt;

/// Kind of a persistence-log record.
///
/// The ordering (`Diff < Full`) matters: when a diff and a full record
/// exist for the same version (a full record written by `clear_history`
/// next to the regular diff), a sorted listing places the full record
/// last, so replay can pick the latest recovery baseline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecordKind {
    /// Only the entities changed by one transaction.
    Diff,
    /// A complete snapshot baseline.
    Full,
}

impl RecordKind {
    /// Returns the file-name token for this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Diff => "diff",
            Self::Full => "full",
        }
    }

    /// Parses a file-name token back into a kind.
    #[must_use]
    pub fn from_str_token(token: &str) -> Option<Self> {
        match token {
            "diff" => Some(Self::Diff),
            "full" => Some(Self::Full),
            _ => None,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Address of one persistence-log record.
///
/// Records are named by database name, snapshot version and kind; the
/// file-name rendering is `{database}_v{version}_{kind}.{ext}`.
/// Sorting record names yields replay order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordName {
    /// Name of the owning database.
    pub database: String,
    /// Snapshot version the record belongs to.
    pub version: u64,
    /// Diff or full.
    pub kind: RecordKind,
}

impl RecordName {
    /// Creates a record name.
    pub fn new(database: impl Into<String>, version: u64, kind: RecordKind) -> Self {
        Self {
            database: database.into(),
            version,
            kind,
        }
    }

    /// Renders the file name for this record with the given extension.
    #[must_use]
    pub fn file_name(&self, extension: &str) -> String {
        format!(
            "{}_v{}_{}.{}",
            self.database, self.version, self.kind, extension
        )
    }

    /// Parses a file name of the form `{database}_v{version}_{kind}.{ext}`.
    ///
    /// Returns `None` for file names that do not match the scheme.
    #[must_use]
    pub fn parse(file_name: &str) -> Option<(Self, &str)> {
        let (stem, extension) = file_name.rsplit_once('.')?;
        let (rest, kind_token) = stem.rsplit_once('_')?;
        let kind = RecordKind::from_str_token(kind_token)?;
        let (database, version_token) = rest.rsplit_once("_v")?;
        let version: u64 = version_token.parse().ok()?;
        if database.is_empty() {
            return None;
        }
        Some((Self::new(database, version, kind), extension))
    }
}

impl fmt::Display for RecordName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_v{}_{}", self.database, self.version, self.kind)
    }
}

/// An append-only record store for the VerDB persistence log.
///
/// Stores are **opaque record stores**: one byte blob per [`RecordName`],
/// contents uninterpreted. VerDB owns all record format interpretation.
///
/// # Invariants
///
/// - `read` returns exactly the bytes previously appended under that name
/// - `append` for an existing name replaces the record (used when
///   `clear_history` re-baselines an already-logged version)
/// - after `append` returns, the record is durable
/// - stores must be `Send + Sync` for concurrent access
pub trait LogStore: Send + Sync {
    /// Writes one record, replacing any record with the same name.
    ///
    /// # Errors
    ///
    /// Returns an error if an I/O error occurs.
    fn append(&self, name: &RecordName, bytes: &[u8]) -> StorageResult<()>;

    /// Reads the record with the given name.
    ///
    /// # Errors
    ///
    /// Returns [`crate::StorageError::RecordNotFound`] if the record does
    /// not exist, or an I/O error.
    fn read(&self, name: &RecordName) -> StorageResult<Vec<u8>>;

    /// Lists all records belonging to `database`, unordered.
    ///
    /// # Errors
    ///
    /// Returns an error if the store cannot be enumerated.
    fn list(&self, database: &str) -> StorageResult<Vec<RecordName>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_round_trip() {
        let name = RecordName::new("shop", 12, RecordKind::Diff);
        let rendered = name.file_name("json");
        assert_eq!(rendered, "shop_v12_diff.json");

        let (parsed, ext) = RecordName::parse(&rendered).unwrap();
        assert_eq!(parsed, name);
        assert_eq!(ext, "json");
    }

    #[test]
    fn parse_full_record() {
        let (parsed, _) = RecordName::parse("shop_v0_full.json").unwrap();
        assert_eq!(parsed.kind, RecordKind::Full);
        assert_eq!(parsed.version, 0);
    }

    #[test]
    fn parse_database_name_with_underscores() {
        let (parsed, _) = RecordName::parse("my_shop_v3_diff.json").unwrap();
        assert_eq!(parsed.database, "my_shop");
        assert_eq!(parsed.version, 3);
    }

    #[test]
    fn parse_rejects_foreign_files() {
        assert!(RecordName::parse("README.md").is_none());
        assert!(RecordName::parse("shop_v3_chunk.json").is_none());
        assert!(RecordName::parse("shop_vx_diff.json").is_none());
        assert!(RecordName::parse("_v1_diff.json").is_none());
    }

    #[test]
    fn replay_ordering_puts_full_after_diff_of_same_version() {
        let diff = RecordName::new("shop", 3, RecordKind::Diff);
        let full = RecordName::new("shop", 3, RecordKind::Full);
        assert!(diff < full);
        assert!(full < RecordName::new("shop", 4, RecordKind::Diff));
    }
}
