//! Watch configuration.
//!
//! A [`WatchTarget`] is fixed at construction and never mutated once the
//! watch starts: the directory to observe, an optional glob filter on file
//! names, and the [`NotifyMask`] of raw notification categories to request
//! from the OS.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use bitflags::bitflags;
use glob::Pattern;
use serde::{Deserialize, Serialize};

use crate::watcher::WatchError;

bitflags! {
    /// Raw notification categories requested from the OS facility.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct NotifyMask: u8 {
        /// Content writes (last-write-time changes).
        const LAST_WRITE = 1 << 0;
        /// Name changes: create, delete, rename.
        const FILE_NAME = 1 << 1;
        /// Metadata-only changes (permissions, ownership).
        const ATTRIBUTES = 1 << 2;
    }
}

impl Default for NotifyMask {
    /// Last-write and name changes only. Broader masks multiply
    /// near-duplicate notifications for a single file arrival.
    fn default() -> Self {
        Self::LAST_WRITE | Self::FILE_NAME
    }
}

/// Immutable configuration for a single-directory, non-recursive watch.
#[derive(Debug, Clone)]
pub struct WatchTarget {
    path: PathBuf,
    /// `None` matches every file name.
    filter: Option<Pattern>,
    mask: NotifyMask,
}

impl WatchTarget {
    /// Build a target with a glob filter on file names (e.g. `"*.txt"`).
    ///
    /// An invalid glob fails here, before any OS resource is touched.
    pub fn new(path: impl Into<PathBuf>, filter: &str) -> Result<Self, WatchError> {
        let pattern = Pattern::new(filter).map_err(|e| WatchError::InvalidFilter {
            pattern: filter.to_string(),
            reason: e.to_string(),
        })?;
        Ok(Self {
            path: path.into(),
            filter: Some(pattern),
            mask: NotifyMask::default(),
        })
    }

    /// Build a target that matches every file name in the directory.
    pub fn matching_all(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            filter: None,
            mask: NotifyMask::default(),
        }
    }

    /// Replace the notification mask.
    pub fn with_mask(mut self, mask: NotifyMask) -> Self {
        self.mask = mask;
        self
    }

    /// The watched directory.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The requested notification categories.
    pub fn mask(&self) -> NotifyMask {
        self.mask
    }

    /// Whether a bare file name passes the filter.
    pub fn matches_name(&self, name: &str) -> bool {
        self.filter.as_ref().is_none_or(|p| p.matches(name))
    }
}

/// Logging configuration: a default level plus per-module overrides.
///
/// ```toml
/// [logging]
/// default = "warn"
///
/// [logging.modules]
/// dropwatch = "debug"
/// ```
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Default log level when a module has no override.
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module level overrides, e.g. `dropwatch = "debug"`.
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_mask_is_last_write_and_file_name() {
        let mask = NotifyMask::default();
        assert!(mask.contains(NotifyMask::LAST_WRITE));
        assert!(mask.contains(NotifyMask::FILE_NAME));
        assert!(!mask.contains(NotifyMask::ATTRIBUTES));
    }

    #[test]
    fn invalid_glob_fails_at_construction() {
        let err = WatchTarget::new("/tmp", "[unclosed").unwrap_err();
        assert!(matches!(err, WatchError::InvalidFilter { .. }));
    }

    #[test]
    fn filter_matches_file_names_only() {
        let target = WatchTarget::new("/tmp", "*.txt").unwrap();
        assert!(target.matches_name("report.txt"));
        assert!(!target.matches_name("report.csv"));
    }

    #[test]
    fn missing_filter_matches_everything() {
        let target = WatchTarget::matching_all("/tmp");
        assert!(target.matches_name("anything.bin"));
    }

    #[test]
    fn glob_is_case_sensitive() {
        let target = WatchTarget::new("/tmp", "Monitored.Txt").unwrap();
        assert!(target.matches_name("Monitored.Txt"));
        assert!(!target.matches_name("monitored.txt"));
    }
}
