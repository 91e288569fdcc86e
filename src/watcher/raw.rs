//! Adapter over the OS notification facility.
//!
//! [`RawWatcher`] owns one `notify` watcher and re-architects its callback
//! delivery as channels: the callback pushes every notification into an
//! internal queue, and a dispatch task classifies, mask-gates, name-filters,
//! and fans each event out onto the per-kind broadcast channel it belongs to.

use std::path::PathBuf;

use notify::event::{EventKind, ModifyKind, RenameMode};
use notify::{Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;

use crate::config::{NotifyMask, WatchTarget};
use crate::{debug_event, log_event};

use super::error::WatchError;
use super::event::RawEvent;

/// Queue between the notify callback thread and the dispatch task.
const EVENT_QUEUE_CAPACITY: usize = 256;

/// Ring-buffer depth of each emission channel. A subscriber that falls
/// further behind than this observes a lag error, not a stall.
const CHANNEL_CAPACITY: usize = 256;

/// Broadcast senders for the five emission channels.
#[derive(Debug, Clone)]
struct Channels {
    created: broadcast::Sender<RawEvent>,
    changed: broadcast::Sender<RawEvent>,
    deleted: broadcast::Sender<RawEvent>,
    renamed: broadcast::Sender<RawEvent>,
    errors: broadcast::Sender<WatchError>,
}

impl Channels {
    fn new() -> Self {
        Self {
            created: broadcast::channel(CHANNEL_CAPACITY).0,
            changed: broadcast::channel(CHANNEL_CAPACITY).0,
            deleted: broadcast::channel(CHANNEL_CAPACITY).0,
            renamed: broadcast::channel(CHANNEL_CAPACITY).0,
            errors: broadcast::channel(CHANNEL_CAPACITY).0,
        }
    }
}

/// Watches one directory (non-recursive) and emits raw events onto five
/// independent hot channels: created, changed, deleted, renamed, errors.
///
/// Lifecycle: `Created -> Started <-> Stopped -> Disposed` (terminal).
/// Dropping the watcher releases everything a [`dispose`](Self::dispose)
/// would.
#[derive(Debug)]
pub struct RawWatcher {
    target: WatchTarget,
    /// `None` after dispose; dropping it releases the OS handle.
    watcher: Option<RecommendedWatcher>,
    channels: Channels,
    dispatch: JoinHandle<()>,
}

impl RawWatcher {
    /// Create the underlying OS watcher and spawn the dispatch task.
    ///
    /// No events flow until [`start`](Self::start). Requires a tokio
    /// runtime.
    pub fn new(target: WatchTarget) -> Result<Self, WatchError> {
        let (queue_tx, queue_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);

        // The callback runs on notify's own thread; blocking_send bridges
        // it into the async side.
        let watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = queue_tx.blocking_send(res);
        })?;

        let channels = Channels::new();
        let dispatch = tokio::spawn(dispatch_loop(queue_rx, target.clone(), channels.clone()));

        Ok(Self {
            target,
            watcher: Some(watcher),
            channels,
            dispatch,
        })
    }

    /// Begin emitting events for the target directory.
    pub fn start(&mut self) -> Result<(), WatchError> {
        let watcher = self.watcher.as_mut().ok_or(WatchError::Disposed)?;
        watcher
            .watch(self.target.path(), RecursiveMode::NonRecursive)
            .map_err(|e| WatchError::PathWatchFailed {
                path: self.target.path().to_path_buf(),
                reason: e.to_string(),
            })?;
        log_event!("raw", "started", "{}", self.target.path().display());
        Ok(())
    }

    /// Cease emitting events. Safe to call before [`start`](Self::start)
    /// or after [`dispose`](Self::dispose).
    pub fn stop(&mut self) -> Result<(), WatchError> {
        let Some(watcher) = self.watcher.as_mut() else {
            return Ok(());
        };
        match watcher.unwatch(self.target.path()) {
            Ok(()) => {
                log_event!("raw", "stopped", "{}", self.target.path().display());
                Ok(())
            }
            // Never started (or already stopped): nothing to undo.
            Err(e) if matches!(e.kind, notify::ErrorKind::WatchNotFound) => Ok(()),
            Err(e) => Err(WatchError::PathWatchFailed {
                path: self.target.path().to_path_buf(),
                reason: e.to_string(),
            }),
        }
    }

    /// Release the OS watch handle and halt dispatch. Terminal: after this,
    /// no channel receives further events and [`start`](Self::start) fails
    /// with [`WatchError::Disposed`].
    pub fn dispose(&mut self) {
        if self.watcher.is_none() {
            return;
        }
        let _ = self.stop();
        self.watcher = None;
        self.dispatch.abort();
        debug_event!("raw", "disposed");
    }

    /// The configuration this watcher was built with.
    pub fn target(&self) -> &WatchTarget {
        &self.target
    }

    /// Subscribe to file creations. Hot: only events after the subscription.
    pub fn created(&self) -> broadcast::Receiver<RawEvent> {
        self.channels.created.subscribe()
    }

    /// Subscribe to content changes.
    pub fn changed(&self) -> broadcast::Receiver<RawEvent> {
        self.channels.changed.subscribe()
    }

    /// Subscribe to file deletions.
    pub fn deleted(&self) -> broadcast::Receiver<RawEvent> {
        self.channels.deleted.subscribe()
    }

    /// Subscribe to renames within the watch scope.
    pub fn renamed(&self) -> broadcast::Receiver<RawEvent> {
        self.channels.renamed.subscribe()
    }

    /// Subscribe to watcher failures, including removal of the watched
    /// directory itself.
    pub fn errors(&self) -> broadcast::Receiver<WatchError> {
        self.channels.errors.subscribe()
    }
}

impl Drop for RawWatcher {
    fn drop(&mut self) {
        self.dispatch.abort();
    }
}

async fn dispatch_loop(
    mut queue_rx: mpsc::Receiver<notify::Result<Event>>,
    target: WatchTarget,
    channels: Channels,
) {
    // From-half of an in-flight rename, waiting for its To-half.
    let mut pending_rename: Option<PathBuf> = None;

    while let Some(res) = queue_rx.recv().await {
        match res {
            Ok(event) => dispatch_event(event, &target, &channels, &mut pending_rename),
            Err(e) => {
                let _ = channels.errors.send(WatchError::EventError {
                    details: e.to_string(),
                });
            }
        }
    }
}

fn dispatch_event(
    event: Event,
    target: &WatchTarget,
    channels: &Channels,
    pending_rename: &mut Option<PathBuf>,
) {
    // Removal of the watch root is a watcher failure, not a file event.
    if matches!(event.kind, EventKind::Remove(_))
        && event.paths.iter().any(|p| p == target.path())
    {
        let _ = channels.errors.send(WatchError::EventError {
            details: format!("watched directory removed: {}", target.path().display()),
        });
        return;
    }

    let mask = target.mask();
    match event.kind {
        EventKind::Create(_) if mask.contains(NotifyMask::FILE_NAME) => {
            for path in event.paths {
                emit(&channels.created, RawEvent::created(path), target);
            }
        }
        EventKind::Remove(_) if mask.contains(NotifyMask::FILE_NAME) => {
            for path in event.paths {
                emit(&channels.deleted, RawEvent::deleted(path), target);
            }
        }
        EventKind::Modify(ModifyKind::Name(mode)) if mask.contains(NotifyMask::FILE_NAME) => {
            dispatch_rename(mode, event.paths, target, channels, pending_rename);
        }
        EventKind::Modify(ModifyKind::Data(_)) | EventKind::Modify(ModifyKind::Any)
            if mask.contains(NotifyMask::LAST_WRITE) =>
        {
            for path in event.paths {
                emit(&channels.changed, RawEvent::changed(path), target);
            }
        }
        EventKind::Modify(ModifyKind::Metadata(_)) if mask.contains(NotifyMask::ATTRIBUTES) => {
            for path in event.paths {
                emit(&channels.changed, RawEvent::changed(path), target);
            }
        }
        kind => {
            debug_event!("raw", "ignored", "{kind:?}");
        }
    }
}

/// Pair rename halves into a single `Renamed` event.
///
/// The name filter applies to the destination name only, so a rename from a
/// non-matching name into a matching one still surfaces.
fn dispatch_rename(
    mode: RenameMode,
    mut paths: Vec<PathBuf>,
    target: &WatchTarget,
    channels: &Channels,
    pending_rename: &mut Option<PathBuf>,
) {
    match mode {
        RenameMode::Both => {
            if let [old, new] = paths.as_slice() {
                let event = RawEvent::renamed(new.clone(), Some(old.clone()));
                *pending_rename = None;
                emit(&channels.renamed, event, target);
            }
        }
        RenameMode::From => {
            *pending_rename = paths.pop();
        }
        RenameMode::To => {
            if let Some(new) = paths.pop() {
                let old = pending_rename.take();
                emit(&channels.renamed, RawEvent::renamed(new, old), target);
            }
        }
        // Single-path notification with no direction (FSEvents-style):
        // the path still existing means it is the destination half.
        _ => {
            if let Some(path) = paths.pop() {
                if path.exists() {
                    let old = pending_rename.take();
                    emit(&channels.renamed, RawEvent::renamed(path, old), target);
                } else {
                    *pending_rename = Some(path);
                }
            }
        }
    }
}

fn emit(sender: &broadcast::Sender<RawEvent>, event: RawEvent, target: &WatchTarget) {
    if !target.matches_name(event.name()) {
        debug_event!("raw", "filtered", "{}", event.name());
        return;
    }
    // No receivers is fine; the channels are hot.
    let _ = sender.send(event);
}
