//! Error types for directory watching.

use std::path::PathBuf;
use thiserror::Error;

/// Errors from watch construction, lifecycle, and polling.
///
/// Payloads are plain strings so the type stays `Clone` and can travel the
/// broadcast error channel alongside being returned from fallible calls.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WatchError {
    #[error("failed to initialize watcher: {reason}")]
    InitFailed { reason: String },

    #[error("invalid name filter '{pattern}': {reason}")]
    InvalidFilter { pattern: String, reason: String },

    #[error("cannot watch path {path}: {reason}")]
    PathWatchFailed { path: PathBuf, reason: String },

    #[error("file system event error: {details}")]
    EventError { details: String },

    #[error("failed to poll {path}: {reason}")]
    PollFailed { path: PathBuf, reason: String },

    #[error("watcher already disposed")]
    Disposed,

    #[error("event channel closed unexpectedly")]
    ChannelClosed,
}

impl From<notify::Error> for WatchError {
    fn from(e: notify::Error) -> Self {
        WatchError::InitFailed {
            reason: e.to_string(),
        }
    }
}
