//! The database facade.
//!
//! A [`Database`] owns the published snapshot, the id generator and the
//! persistence log. Reads clone the published `Arc` and never block
//! writers; writes serialize on one mutex and publish a new snapshot
//! only after the log append succeeded.

use crate::config::Config;
use crate::context::{ChangeContext, SnapshotContext};
use crate::entity::Entity;
use crate::error::{CoreError, CoreResult};
use crate::records::{DiffRecord, FullRecord};
use crate::snapshot::Snapshot;
use crate::types::{Id, SnapshotVersion};
use parking_lot::{Mutex, RwLock};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, ThreadId};
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};
use verdb_codec::{from_payload, to_payload, Codec, JsonCodec};
use verdb_storage::{FileStore, LogStore, MemoryStore, RecordKind, RecordName};

/// An embeddable, snapshot-versioned object database.
///
/// The type parameter is the application's closed entity type. All
/// access goes through [`perform`](Database::perform) (reads) and
/// [`update`](Database::update) (writes).
pub struct Database<E: Entity> {
    name: String,
    config: Config,
    snapshot: RwLock<Arc<Snapshot<E>>>,
    id_gen: AtomicU64,
    writer: Mutex<()>,
    writer_thread: RwLock<Option<ThreadId>>,
    store: Arc<dyn LogStore>,
    codec: Arc<dyn Codec>,
}

/// Clears the current-writer slot when the commit scope ends, also on
/// panic or early return.
struct WriterSlotGuard<'a> {
    slot: &'a RwLock<Option<ThreadId>>,
}

impl<'a> WriterSlotGuard<'a> {
    fn claim(slot: &'a RwLock<Option<ThreadId>>) -> Self {
        *slot.write() = Some(thread::current().id());
        Self { slot }
    }
}

impl Drop for WriterSlotGuard<'_> {
    fn drop(&mut self) {
        *self.slot.write() = None;
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

impl<E: Entity> Database<E> {
    /// Opens a file-backed database in `config.directory()`.
    ///
    /// With persistence enabled, an empty log is seeded with the
    /// version-0 baseline record for `root`; an existing log is left
    /// untouched until [`read_from_file_system`](Self::read_from_file_system)
    /// replays it.
    ///
    /// # Errors
    ///
    /// Fails if the store cannot be opened or the baseline record
    /// cannot be written.
    pub fn new(name: impl Into<String>, root: Arc<E>, config: Config) -> CoreResult<Self> {
        let store = Arc::new(FileStore::open(config.directory())?);
        let codec: Arc<dyn Codec> = if config.pretty_print() {
            Arc::new(JsonCodec::pretty())
        } else {
            Arc::new(JsonCodec::compact())
        };
        Self::with_parts(name, root, config, store, codec)
    }

    /// Opens an ephemeral database backed by an in-memory store with
    /// persistence disabled.
    ///
    /// # Errors
    ///
    /// Infallible in practice; kept fallible for constructor parity.
    pub fn in_memory(name: impl Into<String>, root: Arc<E>) -> CoreResult<Self> {
        Self::with_parts(
            name,
            root,
            Config::ephemeral(),
            Arc::new(MemoryStore::new()),
            Arc::new(JsonCodec::compact()),
        )
    }

    /// Opens a database over caller-provided store and codec.
    ///
    /// # Errors
    ///
    /// Fails if the store cannot be listed or the version-0 baseline
    /// record cannot be written.
    pub fn with_parts(
        name: impl Into<String>,
        root: Arc<E>,
        config: Config,
        store: Arc<dyn LogStore>,
        codec: Arc<dyn Codec>,
    ) -> CoreResult<Self> {
        let name = name.into();
        let next_id = root.id().as_u64() + 1;
        let snapshot = Arc::new(Snapshot::init(root, now_millis()));
        let database = Self {
            name,
            config,
            snapshot: RwLock::new(snapshot),
            id_gen: AtomicU64::new(next_id),
            writer: Mutex::new(()),
            writer_thread: RwLock::new(None),
            store,
            codec,
        };
        if database.config.write_to_file() && database.store.list(&database.name)?.is_empty() {
            let baseline = database.current_snapshot();
            database.append_diff(&baseline)?;
        }
        Ok(database)
    }

    /// Database name; prefixes every record file.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The configuration this database was opened with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The latest published snapshot.
    #[must_use]
    pub fn current_snapshot(&self) -> Arc<Snapshot<E>> {
        Arc::clone(&self.snapshot.read())
    }

    /// Version of the latest published snapshot.
    #[must_use]
    pub fn current_version(&self) -> SnapshotVersion {
        self.snapshot.read().version()
    }

    /// Draws a fresh, never-reused id.
    #[must_use]
    pub fn next_id(&self) -> Id {
        Id::new(self.id_gen.fetch_add(1, Ordering::Relaxed))
    }

    /// Runs a read transaction against the latest published snapshot.
    ///
    /// The context stays bound to that snapshot for the closure's whole
    /// run, unaffected by concurrent commits.
    pub fn perform<'db, R>(&'db self, f: impl FnOnce(&SnapshotContext<'db, E>) -> R) -> R {
        let context = SnapshotContext::new(self);
        f(&context)
    }

    /// Runs a write transaction.
    ///
    /// The closure works against a [`ChangeContext`] based on the latest
    /// snapshot, fetched under the writer mutex. When the closure
    /// succeeds and persisted at least one revision, the successor
    /// snapshot is built, its record appended to the log, and the result
    /// published. A closure error, a conflict or an I/O failure aborts
    /// the transaction with no effect.
    ///
    /// # Errors
    ///
    /// `NestedTransaction` when called from inside a running update on
    /// the same thread; otherwise whatever the closure or the log append
    /// fails with.
    pub fn update<'db, R>(
        &'db self,
        f: impl FnOnce(&mut ChangeContext<'db, E>) -> CoreResult<R>,
    ) -> CoreResult<R> {
        self.check_not_reentrant()?;
        let _writer = self.writer.lock();
        let _slot = WriterSlotGuard::claim(&self.writer_thread);

        let base = self.current_snapshot();
        let mut context = ChangeContext::new(self, Arc::clone(&base));
        let result = f(&mut context)?;
        if !context.has_changes() {
            debug!(database = %self.name, version = %base.version(), "update made no changes");
            return Ok(result);
        }

        let (changed, back_refs) = context.into_parts();
        let next_version = base.version().next();
        for entry in changed.values() {
            if entry.snapshot_version() != next_version {
                return Err(CoreError::invariant(format!(
                    "revision of {} is stamped {}, expected {}",
                    entry.id(),
                    entry.snapshot_version(),
                    next_version
                )));
            }
        }

        let changed_len = changed.len();
        let snapshot = Arc::new(base.successor(changed, back_refs, now_millis()));
        if self.config.write_to_file() {
            if self.config.diff_policy().write_diff(snapshot.version()) {
                self.append_diff(&snapshot)?;
            } else {
                self.append_full(&snapshot)?;
            }
        }
        *self.snapshot.write() = Arc::clone(&snapshot);
        debug!(
            database = %self.name,
            version = %snapshot.version(),
            changed = changed_len,
            "committed snapshot"
        );
        Ok(result)
    }

    /// Drops the in-memory history chain and re-baselines the log with a
    /// full record of the current version.
    ///
    /// Older versions stop being reachable through the live snapshot;
    /// their log records remain on disk until the caller deletes them.
    ///
    /// # Errors
    ///
    /// `NestedTransaction` from inside an update; otherwise log append
    /// failures.
    pub fn clear_history(&self) -> CoreResult<()> {
        self.check_not_reentrant()?;
        let _writer = self.writer.lock();
        let _slot = WriterSlotGuard::claim(&self.writer_thread);

        let current = self.current_snapshot();
        if self.config.write_to_file() {
            self.append_full(&current)?;
        }
        let cleared = Arc::new(current.cleared());
        *self.snapshot.write() = cleared;
        info!(database = %self.name, version = %current.version(), "cleared history");
        Ok(())
    }

    /// Replaces the in-memory state with the state replayed from the
    /// log: the newest full record (or the version-0 baseline) plus all
    /// diff records after it, in version order.
    ///
    /// An empty log leaves the database untouched. The id generator is
    /// re-seeded past the highest replayed id.
    ///
    /// # Errors
    ///
    /// `ReplayError` on gaps, out-of-order records or a missing
    /// baseline; storage and codec failures pass through.
    pub fn read_from_file_system(&self) -> CoreResult<()> {
        self.check_not_reentrant()?;
        let _writer = self.writer.lock();
        let _slot = WriterSlotGuard::claim(&self.writer_thread);

        let mut names = self.store.list(&self.name)?;
        names.sort();
        if names.is_empty() {
            debug!(database = %self.name, "no records to replay");
            return Ok(());
        }

        let baseline = names.iter().rposition(|name| name.kind == RecordKind::Full);
        let (mut snapshot, replay_from) = match baseline {
            Some(index) => {
                let record: FullRecord<E> = self.read_record(&names[index])?;
                let version = record.version;
                (Arc::new(Snapshot::from_full(&record)?), version)
            }
            None => {
                let record: DiffRecord<E> = self.read_record(&names[0])?;
                (Arc::new(Snapshot::from_initial_diff(&record)?), SnapshotVersion::new(0))
            }
        };

        for name in &names {
            if name.kind != RecordKind::Diff || name.version <= replay_from.as_u64() {
                continue;
            }
            let record: DiffRecord<E> = self.read_record(name)?;
            snapshot = Arc::new(snapshot.apply_diff(&record)?);
        }

        let max_id = snapshot.ids().map(Id::as_u64).max().unwrap_or(0);
        self.id_gen.store(max_id + 1, Ordering::Relaxed);
        info!(
            database = %self.name,
            version = %snapshot.version(),
            entries = snapshot.len(),
            "replayed database from log"
        );
        *self.snapshot.write() = snapshot;
        Ok(())
    }

    fn check_not_reentrant(&self) -> CoreResult<()> {
        if *self.writer_thread.read() == Some(thread::current().id()) {
            return Err(CoreError::NestedTransaction);
        }
        Ok(())
    }

    fn append_diff(&self, snapshot: &Snapshot<E>) -> CoreResult<()> {
        let record = DiffRecord::from_snapshot(snapshot);
        self.append_record(snapshot.version(), RecordKind::Diff, &record)
    }

    fn append_full(&self, snapshot: &Snapshot<E>) -> CoreResult<()> {
        let record = FullRecord::from_snapshot(snapshot);
        self.append_record(snapshot.version(), RecordKind::Full, &record)
    }

    fn append_record<T: serde::Serialize>(
        &self,
        version: SnapshotVersion,
        kind: RecordKind,
        record: &T,
    ) -> CoreResult<()> {
        let bytes = to_payload(self.codec.as_ref(), record)?;
        let name = RecordName::new(self.name.clone(), version.as_u64(), kind);
        self.store.append(&name, &bytes)?;
        debug!(record = %name, bytes = bytes.len(), "appended record");
        Ok(())
    }

    fn read_record<T: serde::de::DeserializeOwned>(&self, name: &RecordName) -> CoreResult<T> {
        let bytes = self.store.read(name)?;
        Ok(from_payload(self.codec.as_ref(), &bytes)?)
    }
}

impl<E: Entity> fmt::Debug for Database<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("name", &self.name)
            .field("version", &self.current_version())
            .finish()
    }
}
