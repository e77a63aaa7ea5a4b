//! # VerDB Core
//!
//! Snapshot/versioning engine for VerDB.
//!
//! VerDB is an embeddable, in-process object database. The whole state is
//! an immutable, versioned graph of entities held in memory; committing a
//! write transaction produces the next [`Snapshot`] by structural sharing
//! and appends a diff record to the persistence log.
//!
//! This crate provides:
//! - The [`Entity`] model and identity-only [`Reference`] handles
//! - Immutable, structurally shared [`Snapshot`]s with a bounded history
//!   chain and an incrementally maintained back-reference index
//! - Read ([`SnapshotContext`]) and write ([`ChangeContext`]) transaction
//!   contexts with optimistic concurrency control
//! - The [`Database`] facade: single-writer commit, history pruning, and
//!   log replay
//!
//! # Example
//!
//! ```rust,ignore
//! use verdb_core::{Database, ReadContext};
//!
//! let db = Database::in_memory("shop", Shop::empty())?;
//! db.update(|tx| Shop::change(&tx.root()?, tx, "My Shop"))?;
//! let root = db.perform(|ctx| ctx.root())?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backref;
mod config;
mod context;
mod database;
mod entity;
mod error;
mod records;
mod reference;
mod snapshot;
mod types;

#[cfg(test)]
pub(crate) mod fixtures;

pub use backref::{BackRef, BackRefIndex};
pub use config::{Config, DiffPolicy};
pub use context::{ChangeContext, HistoryEntry, ReadContext, SnapshotContext, VersionsBefore};
pub use database::Database;
pub use entity::{Entity, EntryMap, RefSets};
pub use error::{CoreError, CoreResult};
pub use records::{DiffRecord, FullRecord};
pub use reference::Reference;
pub use snapshot::Snapshot;
pub use types::{Id, RefSlot, SnapshotVersion};
