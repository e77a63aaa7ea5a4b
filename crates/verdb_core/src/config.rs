//! Database configuration.

use crate::types::SnapshotVersion;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Decides, per committed version, whether to append a diff record or a
/// full record to the log.
#[derive(Clone)]
pub struct DiffPolicy(Arc<dyn Fn(SnapshotVersion) -> bool + Send + Sync>);

impl DiffPolicy {
    /// Every version is written as a diff record.
    #[must_use]
    pub fn always_diff() -> Self {
        Self(Arc::new(|_| true))
    }

    /// Every version is written as a full record.
    #[must_use]
    pub fn always_full() -> Self {
        Self(Arc::new(|_| false))
    }

    /// Diff records, with a full record every `interval` versions.
    ///
    /// An `interval` of zero behaves like [`DiffPolicy::always_diff`].
    #[must_use]
    pub fn full_every(interval: u64) -> Self {
        Self(Arc::new(move |version: SnapshotVersion| {
            interval == 0 || version.as_u64() % interval != 0
        }))
    }

    /// A caller-provided policy. Returning `true` selects a diff record.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(SnapshotVersion) -> bool + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Whether `version` should be written as a diff record.
    #[must_use]
    pub fn write_diff(&self, version: SnapshotVersion) -> bool {
        (self.0)(version)
    }
}

impl Default for DiffPolicy {
    fn default() -> Self {
        Self::always_diff()
    }
}

impl fmt::Debug for DiffPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DiffPolicy(..)")
    }
}

/// Tunables for a database instance. Built with the `with_*` methods:
///
/// ```
/// use verdb_core::{Config, DiffPolicy};
///
/// let config = Config::new()
///     .with_directory("data")
///     .with_diff_policy(DiffPolicy::full_every(100));
/// assert!(config.write_to_file());
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    write_to_file: bool,
    directory: PathBuf,
    pretty_print: bool,
    diff_policy: DiffPolicy,
}

impl Config {
    /// Default configuration: persistence on, current directory, compact
    /// output, diff records only.
    #[must_use]
    pub fn new() -> Self {
        Self {
            write_to_file: true,
            directory: PathBuf::from("."),
            pretty_print: false,
            diff_policy: DiffPolicy::default(),
        }
    }

    /// Configuration with persistence disabled.
    #[must_use]
    pub fn ephemeral() -> Self {
        Self::new().with_write_to_file(false)
    }

    /// Enables or disables writing records to the log store.
    #[must_use]
    pub fn with_write_to_file(mut self, write_to_file: bool) -> Self {
        self.write_to_file = write_to_file;
        self
    }

    /// Directory the file-backed store writes to.
    #[must_use]
    pub fn with_directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = directory.into();
        self
    }

    /// Pretty-prints serialized records. Larger files, easier diffing.
    #[must_use]
    pub fn with_pretty_print(mut self, pretty_print: bool) -> Self {
        self.pretty_print = pretty_print;
        self
    }

    /// Sets the diff-versus-full record policy.
    #[must_use]
    pub fn with_diff_policy(mut self, diff_policy: DiffPolicy) -> Self {
        self.diff_policy = diff_policy;
        self
    }

    /// Whether commits append records to the log store.
    #[must_use]
    pub fn write_to_file(&self) -> bool {
        self.write_to_file
    }

    /// Directory of the file-backed store.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Whether records are pretty-printed.
    #[must_use]
    pub fn pretty_print(&self) -> bool {
        self.pretty_print
    }

    /// The diff-versus-full record policy.
    #[must_use]
    pub fn diff_policy(&self) -> &DiffPolicy {
        &self.diff_policy
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_every_selects_full_on_multiples() {
        let policy = DiffPolicy::full_every(3);
        assert!(!policy.write_diff(SnapshotVersion::new(3)));
        assert!(!policy.write_diff(SnapshotVersion::new(6)));
        assert!(policy.write_diff(SnapshotVersion::new(1)));
        assert!(policy.write_diff(SnapshotVersion::new(4)));
    }

    #[test]
    fn full_every_zero_never_selects_full() {
        let policy = DiffPolicy::full_every(0);
        assert!(policy.write_diff(SnapshotVersion::new(0)));
        assert!(policy.write_diff(SnapshotVersion::new(10)));
    }

    #[test]
    fn builder_applies_all_fields() {
        let config = Config::new()
            .with_write_to_file(false)
            .with_directory("/tmp/db")
            .with_pretty_print(true);
        assert!(!config.write_to_file());
        assert_eq!(config.directory(), Path::new("/tmp/db"));
        assert!(config.pretty_print());
    }
}
