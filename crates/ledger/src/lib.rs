//! History and recent destinations, persisted as JSON

pub mod entry;
pub mod recents;

pub use entry::{Action, HistoryEntry, HistoryStore};
pub use recents::{RecentDestinations, DEFAULT_RECENTS_CAP};

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("ledger i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("ledger encode error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Append-only history plus the recent destination list.
///
/// Every mutation is written through to disk before it returns.
pub struct Ledger {
    history_path: PathBuf,
    recents_path: PathBuf,
    history: HistoryStore,
    recents: RecentDestinations,
}

impl Ledger {
    /// Open both files, treating missing or unreadable ones as empty
    pub async fn open(
        history_path: impl AsRef<Path>,
        recents_path: impl AsRef<Path>,
        recents_cap: usize,
    ) -> Self {
        let history_path = history_path.as_ref().to_path_buf();
        let recents_path = recents_path.as_ref().to_path_buf();

        let history: HistoryStore = load_or_default(&history_path).await;
        let mut recents: RecentDestinations = load_or_default(&recents_path).await;
        recents.set_cap(recents_cap);

        debug!(
            "ledger opened with {} entries and {} recents",
            history.entries.len(),
            recents.len()
        );

        Self {
            history_path,
            recents_path,
            history,
            recents,
        }
    }

    pub async fn append(&mut self, entry: HistoryEntry) -> Result<()> {
        debug!("history: {} {}", entry.action, entry.name);
        self.history.entries.push(entry);
        if let Err(e) = write_atomic(&self.history_path, &self.history).await {
            self.history.entries.pop();
            return Err(e);
        }
        Ok(())
    }

    /// Entries in the order they were appended
    pub fn entries(&self) -> &[HistoryEntry] {
        &self.history.entries
    }

    /// Newest entries first
    pub fn recent(&self, limit: usize) -> Vec<&HistoryEntry> {
        self.history.entries.iter().rev().take(limit).collect()
    }

    pub fn len(&self) -> usize {
        self.history.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.entries.is_empty()
    }

    /// Wipe history. Recent destinations are kept.
    pub async fn clear(&mut self) -> Result<()> {
        let cleared = std::mem::take(&mut self.history.entries);
        if let Err(e) = write_atomic(&self.history_path, &self.history).await {
            self.history.entries = cleared;
            return Err(e);
        }
        info!("◆ HISTORY CLEARED ({} ENTRIES)", cleared.len());
        Ok(())
    }

    pub fn recent_destinations(&self) -> &[PathBuf] {
        self.recents.paths()
    }

    pub async fn note_destination(&mut self, path: impl Into<PathBuf>) -> Result<()> {
        let previous = self.recents.clone();
        self.recents.note(path);
        if let Err(e) = write_atomic(&self.recents_path, &self.recents).await {
            self.recents = previous;
            return Err(e);
        }
        Ok(())
    }

    pub fn history_path(&self) -> &Path {
        &self.history_path
    }
}

async fn load_or_default<T: DeserializeOwned + Default>(path: &Path) -> T {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return T::default(),
        Err(e) => {
            warn!("Failed to read {}: {}, starting empty", path.display(), e);
            return T::default();
        }
    };

    match serde_json::from_str(&content) {
        Ok(value) => value,
        Err(e) => {
            warn!("Failed to parse {}: {}, starting empty", path.display(), e);
            T::default()
        }
    }
}

/// Write to a sibling temp file, then rename over the target
async fn write_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let content = serde_json::to_string_pretty(value)?;
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    tokio::fs::write(&tmp, content).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
