//! History records

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// What was done to a file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Moved,
    Deleted,
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Action::Moved => "moved",
            Action::Deleted => "deleted",
        };
        f.pad(label)
    }
}

/// One completed operation. Never modified once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub id: String,
    pub name: String,
    pub original_path: PathBuf,
    pub size: u64,
    pub timestamp: DateTime<Local>,
    pub action: Action,
    /// Set for moves only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<PathBuf>,
}

impl HistoryEntry {
    fn new(original_path: &Path, size: u64, action: Action, destination: Option<PathBuf>) -> Self {
        let name = original_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| original_path.display().to_string());

        Self {
            id: Uuid::new_v4().to_string()[..8].to_string(),
            name,
            original_path: original_path.to_path_buf(),
            size,
            timestamp: Local::now(),
            action,
            destination,
        }
    }

    pub fn moved(original_path: &Path, size: u64, destination: impl Into<PathBuf>) -> Self {
        Self::new(original_path, size, Action::Moved, Some(destination.into()))
    }

    pub fn deleted(original_path: &Path, size: u64) -> Self {
        Self::new(original_path, size, Action::Deleted, None)
    }
}

/// On-disk layout of the history file
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct HistoryStore {
    pub version: u32,
    pub entries: Vec<HistoryEntry>,
}

impl Default for HistoryStore {
    fn default() -> Self {
        Self {
            version: 1,
            entries: Vec::new(),
        }
    }
}
