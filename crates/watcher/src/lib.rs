//! Inbox watcher
//!
//! Turns raw OS change notifications on the inbox into exactly one
//! [`NewFileEvent`] per file that finished arriving.

pub mod event;
pub mod temp_filter;
pub mod tracker;
pub mod watcher;

pub use event::{classify, Change, NewFileEvent, RawEvent, WatcherStatus};
pub use temp_filter::TempFilter;
pub use tracker::{FileState, Tracker, WatchedFile};
pub use watcher::{InboxWatcher, WatcherHandle};
