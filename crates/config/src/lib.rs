//! Configuration management for tidybox
//!
//! Settings live in a single JSON file under the data directory. Every
//! field has a serde default, so partial or missing files load cleanly.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

pub mod paths;

pub use paths::{config_path, data_dir, expand_tilde, history_path, recents_path};

/// Errors loading or saving settings
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("config i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// The watched inbox folder
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboxConfig {
    #[serde(default = "default_inbox")]
    pub path: String,
    #[serde(default = "default_true")]
    pub watch: bool,
}

impl Default for InboxConfig {
    fn default() -> Self {
        Self {
            path: default_inbox(),
            watch: true,
        }
    }
}

fn default_inbox() -> String {
    paths::default_inbox().display().to_string()
}

fn default_true() -> bool {
    true
}

/// Which folders may be touched, and the path limits applied to input
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessConfig {
    /// Allowlist every mounted drive root at startup
    #[serde(default = "default_true")]
    pub include_drives: bool,
    /// Additional allowlisted roots
    #[serde(default)]
    pub extra_roots: Vec<String>,
    #[serde(default = "default_max_path_len")]
    pub max_path_len: usize,
    #[serde(default = "default_max_name_len")]
    pub max_name_len: usize,
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            include_drives: true,
            extra_roots: Vec::new(),
            max_path_len: default_max_path_len(),
            max_name_len: default_max_name_len(),
        }
    }
}

fn default_max_path_len() -> usize {
    4096
}

fn default_max_name_len() -> usize {
    255
}

/// Inbox watcher timing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Quiet period after the last write before a file counts as arrived
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
    /// How often in-flight files are checked for stability
    #[serde(default = "default_sweep_interval_ms")]
    pub sweep_interval_ms: u64,
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
    /// Extra in-progress download suffixes, e.g. ".dlpart"
    #[serde(default)]
    pub extra_temp_suffixes: Vec<String>,
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
            sweep_interval_ms: default_sweep_interval_ms(),
            channel_capacity: default_channel_capacity(),
            extra_temp_suffixes: Vec::new(),
        }
    }
}

impl WatcherConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_millis(self.sweep_interval_ms.max(1))
    }
}

fn default_debounce_ms() -> u64 {
    1500
}

fn default_sweep_interval_ms() -> u64 {
    250
}

fn default_channel_capacity() -> usize {
    64
}

/// What a move does when the destination already holds an entry with the
/// same name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConflictPolicy {
    /// Fail the move with a conflict error
    #[default]
    Reject,
    /// Replace an existing file (never a directory)
    Overwrite,
}

/// Filesystem gateway behaviour
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatewayConfig {
    #[serde(default)]
    pub on_conflict: ConflictPolicy,
}

/// History and recents
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default = "default_recents_cap")]
    pub recents_cap: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            recents_cap: default_recents_cap(),
        }
    }
}

fn default_recents_cap() -> usize {
    5
}

/// Root settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub inbox: InboxConfig,
    #[serde(default)]
    pub access: AccessConfig,
    #[serde(default)]
    pub watcher: WatcherConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub ledger: LedgerConfig,
}

impl Config {
    /// Load settings from the default location
    pub async fn load() -> Result<Self> {
        let path = config_path();
        Self::load_from(&path).await
    }

    /// Load from specific location
    pub async fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("◆ NO CONFIG AT {:?}, USING DEFAULTS", path);
            return Ok(Config::default());
        }

        debug!("◆ LOADING CONFIG FROM {:?}", path);
        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        Ok(config)
    }

    /// Save settings to the default location
    pub async fn save(&self) -> Result<()> {
        let path = config_path();
        self.save_to(&path).await
    }

    /// Save to specific location
    pub async fn save_to(&self, path: &Path) -> Result<()> {
        debug!("◆ SAVING CONFIG TO {:?}", path);

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }

    /// Inbox folder with `~` expanded
    pub fn inbox_path(&self) -> PathBuf {
        expand_tilde(&self.inbox.path)
    }

    /// Extra allowlist roots with `~` expanded
    pub fn extra_roots(&self) -> Vec<PathBuf> {
        self.access
            .extra_roots
            .iter()
            .map(|root| expand_tilde(root))
            .collect()
    }
}

/// Write a default config if none exists and make sure the data directory
/// is in place.
pub async fn init() -> Result<Config> {
    let config_path = config_path();

    if config_path.exists() {
        warn!("◆ CONFIG ALREADY EXISTS AT {:?}", config_path);
    } else {
        let config = Config::default();
        config.save().await?;
        info!("◆ CONFIG WRITTEN TO {:?}", config_path);
    }

    paths::ensure_dir(&data_dir()).await?;

    Config::load().await
}
