//! Events in and out of the inbox watcher

use std::path::{Path, PathBuf};

use notify::event::{EventKind, ModifyKind, RenameMode};
use serde::Serialize;
use tidybox_guard::AccessError;

/// A file that finished arriving in the inbox
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewFileEvent {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
}

/// Whether file detection is running, reported once at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum WatcherStatus {
    Active { inbox: PathBuf },
    /// Turned off in configuration
    Disabled,
    /// The OS subscription could not be established
    Unavailable { reason: String },
}

impl WatcherStatus {
    pub fn is_active(&self) -> bool {
        matches!(self, WatcherStatus::Active { .. })
    }

    /// The error to show the user, if detection is unavailable
    pub fn as_error(&self) -> Option<AccessError> {
        match self {
            WatcherStatus::Unavailable { reason } => {
                Some(AccessError::WatcherUnavailable(reason.clone()))
            }
            _ => None,
        }
    }
}

/// What happened to a path, reduced to what the tracker cares about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    Created,
    Modified,
    Removed,
    RenamedFrom,
    RenamedTo,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    pub path: PathBuf,
    pub change: Change,
}

impl RawEvent {
    pub fn new(path: impl Into<PathBuf>, change: Change) -> Self {
        Self {
            path: path.into(),
            change,
        }
    }
}

/// Reduce a notify event to tracker changes.
///
/// Backends that report renames without a direction are resolved with
/// `exists`: a path that is still there was renamed to, otherwise from.
/// Access and metadata-only events produce nothing.
pub fn classify(event: &notify::Event, exists: impl Fn(&Path) -> bool) -> Vec<RawEvent> {
    let each = |change: Change| -> Vec<RawEvent> {
        event
            .paths
            .iter()
            .map(|p| RawEvent::new(p.clone(), change))
            .collect()
    };

    match &event.kind {
        EventKind::Create(_) => each(Change::Created),
        EventKind::Remove(_) => each(Change::Removed),
        EventKind::Modify(ModifyKind::Metadata(_)) => Vec::new(),
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => each(Change::RenamedFrom),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => each(Change::RenamedTo),
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => {
            let mut out = Vec::with_capacity(2);
            if let Some(from) = event.paths.first() {
                out.push(RawEvent::new(from.clone(), Change::RenamedFrom));
            }
            if let Some(to) = event.paths.get(1) {
                out.push(RawEvent::new(to.clone(), Change::RenamedTo));
            }
            out
        }
        EventKind::Modify(ModifyKind::Name(_)) => event
            .paths
            .iter()
            .map(|p| {
                let change = if exists(p) {
                    Change::RenamedTo
                } else {
                    Change::RenamedFrom
                };
                RawEvent::new(p.clone(), change)
            })
            .collect(),
        EventKind::Modify(_) | EventKind::Any => each(Change::Modified),
        EventKind::Access(_) | EventKind::Other => Vec::new(),
    }
}
