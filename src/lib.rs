//! Reactive file-drop detection for watched directories.
//!
//! A "drop" means a file matching the filter is now present or updated in
//! the watched directory, whether it arrived by creation, rename,
//! overwrite, or was found by an explicit poll of pre-existing files.
//!
//! ```no_run
//! use dropwatch::DropWatcher;
//!
//! # async fn demo() -> Result<(), dropwatch::WatchError> {
//! let mut watcher = DropWatcher::new("/var/inbox", "*.txt")?;
//! let mut dropped = watcher.dropped(); // subscribe before start
//! watcher.start()?;
//! watcher.poll_existing()?; // surface files that predate the watch
//!
//! while let Ok(file) = dropped.recv().await {
//!     println!("{} arrived at {}", file.name, file.full_path.display());
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod logging;
pub mod watcher;

pub use config::{LoggingConfig, NotifyMask, WatchTarget};
pub use watcher::{DropWatcher, FileDropped, RawEvent, RawWatcher, WatchError};
