//! Wiring shared by every command

use std::sync::Arc;

use anyhow::{Context, Result};
use tidybox_config::{history_path, recents_path, Config};
use tidybox_gateway::{DriveSource, Gateway, SystemDrives, SystemRecycler};
use tidybox_guard::{Allowlist, Limits, ValidatedPath, Validator};
use tidybox_ledger::Ledger;
use tracing::{debug, info, warn};

pub struct App {
    pub config: Config,
    pub gateway: Gateway,
    pub ledger: Ledger,
}

impl App {
    /// Load config from disk and seed the allowlist from the real system
    pub async fn load() -> Result<Self> {
        let config = Config::load().await.context("Failed to load config")?;
        Self::from_config(config, &SystemDrives).await
    }

    pub async fn from_config(config: Config, drives: &dyn DriveSource) -> Result<Self> {
        let validator = Validator::new(Limits::from(&config.access));

        let allowlist = Arc::new(Allowlist::new());
        allowlist.seed(seed_roots(&config, &validator, drives));

        let gateway = Gateway::new(allowlist, Arc::new(SystemRecycler))
            .with_validator(validator)
            .with_conflict_policy(config.gateway.on_conflict);

        let ledger = Ledger::open(history_path(), recents_path(), config.ledger.recents_cap).await;

        Ok(Self {
            config,
            gateway,
            ledger,
        })
    }
}

/// Initial allowlist: drive roots (unless disabled), the inbox and any
/// configured extra folders. Roots that do not resolve are skipped.
pub fn seed_roots(
    config: &Config,
    validator: &Validator,
    drives: &dyn DriveSource,
) -> Vec<ValidatedPath> {
    let mut candidates = Vec::new();

    if config.access.include_drives {
        candidates.extend(drives.drives().into_iter().map(|d| d.mount_point));
    }
    candidates.push(config.inbox_path());
    candidates.extend(config.extra_roots());

    let mut roots = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let raw = candidate.to_string_lossy();
        match validator.validate_root(&raw) {
            Ok(root) if root.as_path().is_dir() => {
                debug!("allow {}", root);
                roots.push(root);
            }
            Ok(root) => warn!("skipping allowed folder {}: not a folder", root),
            Err(e) => warn!("skipping allowed folder {}: {}", raw, e),
        }
    }

    info!("◆ {} ALLOWED FOLDERS", roots.len());
    roots
}
