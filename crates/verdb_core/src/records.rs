//! Wire records for the append-only log.
//!
//! Two record shapes exist: a diff record with the revisions changed by
//! one transaction, and a full record with every entity of a snapshot.
//! Records are plain serde structs; the codec crate turns them into
//! bytes.

use crate::entity::Entity;
use crate::snapshot::Snapshot;
use crate::types::{Id, SnapshotVersion};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Changed revisions of a single transaction.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(
    serialize = "E: Serialize",
    deserialize = "E: serde::de::DeserializeOwned"
))]
pub struct DiffRecord<E> {
    /// Version of the snapshot the record produces.
    pub version: SnapshotVersion,
    /// Commit time in milliseconds since the Unix epoch.
    pub time_millis: u64,
    /// Id of the root entity.
    pub root_id: Id,
    /// Revisions written by the transaction.
    pub changed: Vec<Arc<E>>,
}

impl<E: Entity> DiffRecord<E> {
    /// Captures the changed set of `snapshot` as a diff record.
    #[must_use]
    pub fn from_snapshot(snapshot: &Snapshot<E>) -> Self {
        let mut changed: Vec<Arc<E>> = snapshot
            .changed_ids()
            .filter_map(|id| snapshot.get(id).cloned())
            .collect();
        changed.sort_by_key(|entry| entry.id());
        Self {
            version: snapshot.version(),
            time_millis: snapshot.time_millis(),
            root_id: snapshot.root_id(),
            changed,
        }
    }
}

/// Complete state of one snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(
    serialize = "E: Serialize",
    deserialize = "E: serde::de::DeserializeOwned"
))]
pub struct FullRecord<E> {
    /// Version of the captured snapshot.
    pub version: SnapshotVersion,
    /// Commit time in milliseconds since the Unix epoch.
    pub time_millis: u64,
    /// Id of the root entity.
    pub root_id: Id,
    /// Every entity revision of the snapshot.
    pub entries: Vec<Arc<E>>,
    /// Changed-id sets of the retained history, by version. Kept for
    /// auditing; replay from a full record starts with empty history.
    pub history: BTreeMap<SnapshotVersion, Vec<Id>>,
}

impl<E: Entity> FullRecord<E> {
    /// Captures the whole of `snapshot` as a full record.
    #[must_use]
    pub fn from_snapshot(snapshot: &Snapshot<E>) -> Self {
        let mut entries: Vec<Arc<E>> = snapshot.entries().values().cloned().collect();
        entries.sort_by_key(|entry| entry.id());
        let history = snapshot
            .history()
            .iter()
            .map(|(version, old)| {
                let mut ids: Vec<Id> = old.changed_ids().collect();
                ids.sort_unstable();
                (*version, ids)
            })
            .collect();
        Self {
            version: snapshot.version(),
            time_millis: snapshot.time_millis(),
            root_id: snapshot.root_id(),
            entries,
            history,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::TestNode;
    use verdb_codec::{from_payload, to_payload, JsonCodec};

    #[test]
    fn diff_record_round_trips_through_codec() {
        let root = Arc::new(TestNode::root());
        let snapshot = Snapshot::init(root, 42);
        let record = DiffRecord::from_snapshot(&snapshot);

        let codec = JsonCodec::compact();
        let bytes = to_payload(&codec, &record).unwrap();
        let decoded: DiffRecord<TestNode> = from_payload(&codec, &bytes).unwrap();

        assert_eq!(decoded.version, record.version);
        assert_eq!(decoded.root_id, record.root_id);
        assert_eq!(decoded.changed.len(), 1);
    }

    #[test]
    fn full_record_captures_history_summary() {
        let root = Arc::new(TestNode::root());
        let snap = Arc::new(Snapshot::init(Arc::clone(&root), 0));
        let child = Arc::new(TestNode::child(Id::new(2), root.id(), 1));
        let mut changed = crate::entity::EntryMap::new();
        changed.insert(child.id(), child);
        let next = snap.successor(changed, snap.back_refs().clone(), 7);

        let record = FullRecord::from_snapshot(&next);
        assert_eq!(record.entries.len(), 2);
        assert_eq!(record.history.len(), 1);
        assert_eq!(
            record.history.get(&SnapshotVersion::new(0)).map(Vec::len),
            Some(1)
        );
    }
}
