//! Raw filesystem events and the unified drop event.

use std::path::{Path, PathBuf};

/// A platform-level filesystem notification.
///
/// One variant per emission channel; watcher failures travel a separate
/// error channel and are never unioned in here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RawEvent {
    Created {
        name: String,
        full_path: PathBuf,
    },
    Changed {
        name: String,
        full_path: PathBuf,
    },
    Deleted {
        name: String,
        full_path: PathBuf,
    },
    Renamed {
        name: String,
        full_path: PathBuf,
        /// `None` when the rename source was outside the watch scope and
        /// the platform reported only the destination.
        old_full_path: Option<PathBuf>,
    },
}

impl RawEvent {
    pub(crate) fn created(full_path: PathBuf) -> Self {
        Self::Created {
            name: file_name_of(&full_path),
            full_path,
        }
    }

    pub(crate) fn changed(full_path: PathBuf) -> Self {
        Self::Changed {
            name: file_name_of(&full_path),
            full_path,
        }
    }

    pub(crate) fn deleted(full_path: PathBuf) -> Self {
        Self::Deleted {
            name: file_name_of(&full_path),
            full_path,
        }
    }

    pub(crate) fn renamed(full_path: PathBuf, old_full_path: Option<PathBuf>) -> Self {
        Self::Renamed {
            name: file_name_of(&full_path),
            full_path,
            old_full_path,
        }
    }

    /// Final path component of the event's (new) path.
    pub fn name(&self) -> &str {
        match self {
            Self::Created { name, .. }
            | Self::Changed { name, .. }
            | Self::Deleted { name, .. }
            | Self::Renamed { name, .. } => name,
        }
    }

    /// The event's (new) full path.
    pub fn full_path(&self) -> &Path {
        match self {
            Self::Created { full_path, .. }
            | Self::Changed { full_path, .. }
            | Self::Deleted { full_path, .. }
            | Self::Renamed { full_path, .. } => full_path,
        }
    }
}

/// A file matching the filter is now present or updated in the watched
/// directory, regardless of whether it arrived by creation, rename,
/// overwrite, or was discovered by a poll.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDropped {
    /// Final path component of `full_path`.
    pub name: String,
    pub full_path: PathBuf,
}

impl FileDropped {
    /// Project a raw event onto a drop.
    ///
    /// Deletions never count as drops; renames project the new name and
    /// path, not the old one.
    pub fn from_raw(event: &RawEvent) -> Option<Self> {
        match event {
            RawEvent::Created { name, full_path }
            | RawEvent::Changed { name, full_path }
            | RawEvent::Renamed {
                name, full_path, ..
            } => Some(Self {
                name: name.clone(),
                full_path: full_path.clone(),
            }),
            RawEvent::Deleted { .. } => None,
        }
    }

    /// Build a drop from a bare path, e.g. one found by a directory poll.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let full_path = path.into();
        Self {
            name: file_name_of(&full_path),
            full_path,
        }
    }
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}
