//! The drop unifier: one stream for "a file has arrived".
//!
//! [`DropWatcher`] merges the adapter's created, renamed, and changed
//! channels into a single multicast stream of [`FileDropped`] events, and
//! feeds poll results into the same fan-in point so a consumer cannot tell
//! a polled file from a watched one.

use std::fs;
use std::path::PathBuf;

use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::{NotifyMask, WatchTarget};
use crate::{debug_event, log_event};

use super::error::WatchError;
use super::event::{FileDropped, RawEvent};
use super::raw::RawWatcher;

const DROP_CHANNEL_CAPACITY: usize = 256;

/// Watches a directory for files arriving by creation, rename, or
/// overwrite, unified into one stream.
///
/// Subscribe via [`dropped`](Self::dropped) before calling
/// [`start`](Self::start) to guarantee no arrival is missed; the stream is
/// live, so a late subscriber sees only events emitted after it subscribed.
#[derive(Debug)]
pub struct DropWatcher {
    raw: RawWatcher,
    dropped_tx: broadcast::Sender<FileDropped>,
    merge: JoinHandle<()>,
    disposed: bool,
}

impl DropWatcher {
    /// Create a drop watcher over `path` with a glob `filter` on file names.
    ///
    /// The merge over the adapter's channels is established before this
    /// returns, so a subscriber taken before [`start`](Self::start) cannot
    /// race the first event. Requires a tokio runtime.
    pub fn new(path: impl Into<PathBuf>, filter: &str) -> Result<Self, WatchError> {
        Self::with_target(WatchTarget::new(path, filter)?)
    }

    /// Like [`new`](Self::new), but every file name matches.
    pub fn matching_all(path: impl Into<PathBuf>) -> Result<Self, WatchError> {
        Self::with_target(WatchTarget::matching_all(path))
    }

    fn with_target(target: WatchTarget) -> Result<Self, WatchError> {
        // Last-write and name changes only: a wider mask multiplies
        // near-duplicate notifications for a single drop.
        let target = target.with_mask(NotifyMask::LAST_WRITE | NotifyMask::FILE_NAME);
        let raw = RawWatcher::new(target)?;

        let (dropped_tx, _) = broadcast::channel(DROP_CHANNEL_CAPACITY);
        let merge = tokio::spawn(merge_loop(
            raw.created(),
            raw.renamed(),
            raw.changed(),
            dropped_tx.clone(),
        ));

        Ok(Self {
            raw,
            dropped_tx,
            merge,
            disposed: false,
        })
    }

    /// Subscribe to the unified stream.
    ///
    /// Drops arrive in observation order across all four sources (created,
    /// renamed, changed, poll). No deduplication is performed: a file that
    /// is created and immediately written may surface twice, and every poll
    /// re-emits current matches. Consumers needing idempotent handling
    /// should dedupe on `full_path`.
    pub fn dropped(&self) -> broadcast::Receiver<FileDropped> {
        self.dropped_tx.subscribe()
    }

    /// Subscribe to adapter failures (e.g. the watched directory itself was
    /// removed). Failures are never routed into the drop stream.
    pub fn errors(&self) -> broadcast::Receiver<WatchError> {
        self.raw.errors()
    }

    /// Start the underlying watch; raw events begin flowing immediately.
    pub fn start(&mut self) -> Result<(), WatchError> {
        if self.disposed {
            return Err(WatchError::Disposed);
        }
        self.raw.start()
    }

    /// Stop the underlying watch. Polling stays usable either way.
    pub fn stop(&mut self) -> Result<(), WatchError> {
        self.raw.stop()
    }

    /// Release the OS watch. Terminal: no further raw events reach the
    /// drop stream, and polling fails with [`WatchError::Disposed`].
    pub fn dispose(&mut self) {
        if self.disposed {
            return;
        }
        self.raw.dispose();
        self.merge.abort();
        self.disposed = true;
        debug_event!("drop", "disposed");
    }

    /// Scan the directory once and emit a drop for every existing file
    /// whose name matches the filter.
    ///
    /// Blocking directory I/O on the calling thread. Callable whether or
    /// not the watch is started; each call re-emits every current match
    /// (no memory of previous polls). Returns the number of files surfaced.
    pub fn poll_existing(&self) -> Result<usize, WatchError> {
        if self.disposed {
            return Err(WatchError::Disposed);
        }

        let dir = self.raw.target().path();
        let poll_err = |e: std::io::Error| WatchError::PollFailed {
            path: dir.to_path_buf(),
            reason: e.to_string(),
        };

        let mut found = 0;
        for entry in fs::read_dir(dir).map_err(poll_err)? {
            let entry = entry.map_err(poll_err)?;
            if !entry.file_type().map_err(poll_err)?.is_file() {
                continue;
            }
            let dropped = FileDropped::from_path(entry.path());
            if !self.raw.target().matches_name(&dropped.name) {
                continue;
            }
            debug_event!("drop", "poll match", "{}", dropped.full_path.display());
            let _ = self.dropped_tx.send(dropped);
            found += 1;
        }

        log_event!("drop", "polled", "{found} existing files");
        Ok(found)
    }
}

impl Drop for DropWatcher {
    fn drop(&mut self) {
        self.merge.abort();
    }
}

/// Fan created, renamed, and changed raw events into the unified stream in
/// arrival order. Poll results enter through the same sender, so the merge
/// point is uniform across all four sources.
async fn merge_loop(
    mut created: broadcast::Receiver<RawEvent>,
    mut renamed: broadcast::Receiver<RawEvent>,
    mut changed: broadcast::Receiver<RawEvent>,
    dropped_tx: broadcast::Sender<FileDropped>,
) {
    loop {
        let received = tokio::select! {
            r = created.recv() => r,
            r = renamed.recv() => r,
            r = changed.recv() => r,
        };
        match received {
            Ok(event) => {
                if let Some(dropped) = FileDropped::from_raw(&event) {
                    debug_event!("drop", "merged", "{}", dropped.full_path.display());
                    // No subscribers is fine; the stream is hot.
                    let _ = dropped_tx.send(dropped);
                }
            }
            Err(broadcast::error::RecvError::Lagged(missed)) => {
                tracing::warn!("[drop] merge lagged, {missed} raw events skipped");
            }
            Err(broadcast::error::RecvError::Closed) => break,
        }
    }
}
