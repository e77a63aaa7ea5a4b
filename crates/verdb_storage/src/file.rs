//! File-based log store for persistent storage.

use crate::error::{StorageError, StorageResult};
use crate::store::{LogStore, RecordName};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// A file-based log store.
///
/// Each record is one file inside a directory, named
/// `{database}_v{version}_{kind}.{ext}`. Data survives process restarts.
///
/// # Durability
///
/// `append` writes the record and calls `sync_all` before returning, so a
/// record that has been appended survives process termination.
///
/// # Example
///
/// ```no_run
/// use verdb_storage::{FileStore, LogStore, RecordKind, RecordName};
///
/// let store = FileStore::open("shop_db").unwrap();
/// let name = RecordName::new("shop", 1, RecordKind::Diff);
/// store.append(&name, b"{}").unwrap();
/// ```
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    extension: String,
}

impl FileStore {
    /// Opens a file store with the default `json` extension.
    ///
    /// The directory is created if it does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open(dir: impl AsRef<Path>) -> StorageResult<Self> {
        Self::open_with_extension(dir, "json")
    }

    /// Opens a file store writing records with the given file extension.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn open_with_extension(dir: impl AsRef<Path>, extension: &str) -> StorageResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            extension: extension.to_string(),
        })
    }

    /// Returns the directory this store writes into.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, name: &RecordName) -> PathBuf {
        self.dir.join(name.file_name(&self.extension))
    }
}

impl LogStore for FileStore {
    fn append(&self, name: &RecordName, bytes: &[u8]) -> StorageResult<()> {
        let path = self.path_for(name);
        let mut file = File::create(&path)?;
        file.write_all(bytes)?;
        file.sync_all()?;
        Ok(())
    }

    fn read(&self, name: &RecordName) -> StorageResult<Vec<u8>> {
        let path = self.path_for(name);
        match fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::record_not_found(name.to_string()))
            }
            Err(e) => Err(e.into()),
        }
    }

    fn list(&self, database: &str) -> StorageResult<Vec<RecordName>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(&self.dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            // Foreign files in the directory are ignored, not errors.
            if let Some((name, ext)) = RecordName::parse(file_name) {
                if name.database == database && ext == self.extension {
                    names.push(name);
                }
            }
        }
        Ok(names)
    }
}
