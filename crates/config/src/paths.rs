//! Data directory layout

use std::path::{Path, PathBuf};

/// Application data directory (~/.tidybox)
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .expect("◆ FAILED TO LOCATE HOME DIRECTORY")
        .join(".tidybox")
}

/// Settings file location
pub fn config_path() -> PathBuf {
    data_dir().join("config.json")
}

/// Operation history ledger
pub fn history_path() -> PathBuf {
    data_dir().join("history.json")
}

/// Recent destination list
pub fn recents_path() -> PathBuf {
    data_dir().join("recents.json")
}

/// Default inbox: the platform Downloads folder, or ~/Downloads when the
/// platform does not report one.
pub fn default_inbox() -> PathBuf {
    dirs::download_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join("Downloads")))
        .unwrap_or_else(|| PathBuf::from("Downloads"))
}

/// Ensure directory exists
pub async fn ensure_dir(path: &Path) -> std::io::Result<()> {
    tokio::fs::create_dir_all(path).await
}

/// Expand a leading `~` to the home directory.
pub fn expand_tilde(path: &str) -> PathBuf {
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    } else if let Some(rest) = path.strip_prefix("~/").or_else(|| path.strip_prefix("~\\")) {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    PathBuf::from(path)
}
