//! # VerDB Storage
//!
//! Persistence-log store trait and implementations for VerDB.
//!
//! This crate provides the lowest-level persistence abstraction for VerDB.
//! A [`LogStore`] is an **opaque record store**: it keeps one byte blob per
//! [`RecordName`] and can enumerate the records belonging to a database.
//! VerDB owns all record format interpretation - stores do not understand
//! snapshots, diffs, or entities.
//!
//! ## Design Principles
//!
//! - Stores are simple record stores (append, read, list)
//! - No knowledge of VerDB record formats
//! - Must be `Send + Sync` for concurrent access
//!
//! ## Available Stores
//!
//! - [`MemoryStore`] - For testing and ephemeral databases
//! - [`FileStore`] - For persistent storage using OS file APIs
//!
//! ## Example
//!
//! ```rust
//! use verdb_storage::{LogStore, MemoryStore, RecordKind, RecordName};
//!
//! let store = MemoryStore::new();
//! let name = RecordName::new("shop", 1, RecordKind::Diff);
//! store.append(&name, b"{}").unwrap();
//! assert_eq!(store.read(&name).unwrap(), b"{}");
//! assert_eq!(store.list("shop").unwrap(), vec![name]);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod file;
mod memory;
mod store;

pub use error::{StorageError, StorageResult};
pub use file::FileStore;
pub use memory::MemoryStore;
pub use store::{LogStore, RecordKind, RecordName};
