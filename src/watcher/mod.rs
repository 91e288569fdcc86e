//! Directory watching with unified file-drop detection.
//!
//! Two layers:
//!
//! ```text
//! DropWatcher
//!   - owns one RawWatcher (mask: last-write + name changes)
//!   - merge task: created + renamed + changed -> dropped
//!   - poll_existing() injects into the same stream
//!         |
//!     RawWatcher
//!       - single notify::RecommendedWatcher
//!       - dispatch task fans raw events out by kind
//!       - channels: created / changed / deleted / renamed / errors
//! ```

mod dropped;
mod error;
mod event;
mod raw;

pub use dropped::DropWatcher;
pub use error::WatchError;
pub use event::{FileDropped, RawEvent};
pub use raw::RawWatcher;
