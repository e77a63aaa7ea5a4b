//! In-memory log store for testing.

use crate::error::{StorageError, StorageResult};
use crate::store::{LogStore, RecordName};
use parking_lot::RwLock;
use std::collections::BTreeMap;

/// An in-memory log store.
///
/// This store keeps all records in memory and is suitable for:
/// - Unit tests
/// - Integration tests (including replay round trips)
/// - Ephemeral databases that don't need persistence
///
/// # Thread Safety
///
/// This store is thread-safe and can be shared across threads.
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<BTreeMap<RecordName, Vec<u8>>>,
}

impl MemoryStore {
    /// Creates a new empty in-memory store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of records currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    /// Checks whether the store holds no records.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Removes one record, returning whether it existed. Handy for
    /// simulating a damaged log in tests.
    pub fn remove(&self, name: &RecordName) -> bool {
        self.records.write().remove(name).is_some()
    }

    /// Removes all records.
    pub fn clear(&self) {
        self.records.write().clear();
    }
}

impl LogStore for MemoryStore {
    fn append(&self, name: &RecordName, bytes: &[u8]) -> StorageResult<()> {
        self.records.write().insert(name.clone(), bytes.to_vec());
        Ok(())
    }

    fn read(&self, name: &RecordName) -> StorageResult<Vec<u8>> {
        self.records
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| StorageError::record_not_found(name.to_string()))
    }

    fn list(&self, database: &str) -> StorageResult<Vec<RecordName>> {
        Ok(self
            .records
            .read()
            .keys()
            .filter(|name| name.database == database)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RecordKind;

    #[test]
    fn append_and_read() {
        let store = MemoryStore::new();
        let name = RecordName::new("db", 0, RecordKind::Diff);
        store.append(&name, b"abc").unwrap();
        assert_eq!(store.read(&name).unwrap(), b"abc");
    }

    #[test]
    fn append_replaces_existing_record() {
        let store = MemoryStore::new();
        let name = RecordName::new("db", 2, RecordKind::Full);
        store.append(&name, b"one").unwrap();
        store.append(&name, b"two").unwrap();
        assert_eq!(store.read(&name).unwrap(), b"two");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn read_missing_record_fails() {
        let store = MemoryStore::new();
        let name = RecordName::new("db", 9, RecordKind::Diff);
        assert!(matches!(
            store.read(&name),
            Err(StorageError::RecordNotFound { .. })
        ));
    }

    #[test]
    fn list_filters_by_database() {
        let store = MemoryStore::new();
        store
            .append(&RecordName::new("a", 0, RecordKind::Diff), b"x")
            .unwrap();
        store
            .append(&RecordName::new("b", 0, RecordKind::Diff), b"y")
            .unwrap();
        store
            .append(&RecordName::new("a", 1, RecordKind::Diff), b"z")
            .unwrap();

        let names = store.list("a").unwrap();
        assert_eq!(names.len(), 2);
        assert!(names.iter().all(|n| n.database == "a"));
    }
}
