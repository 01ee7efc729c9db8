//! Common test utilities for tidybox CLI tests
#![allow(dead_code)]

use std::path::{Path, PathBuf};

use assert_cmd::Command;
use tempfile::{tempdir, TempDir};

/// An isolated home directory with a config that allows only the inbox
/// and a `Documents` folder.
pub struct TestEnv {
    pub temp_dir: TempDir,
    pub home: PathBuf,
    pub data_dir: PathBuf,
    pub inbox: PathBuf,
    pub documents: PathBuf,
    pub outside: PathBuf,
}

impl TestEnv {
    pub fn new() -> anyhow::Result<Self> {
        let temp_dir = tempdir()?;
        let home = std::fs::canonicalize(temp_dir.path())?;
        let data_dir = home.join(".tidybox");
        let inbox = home.join("Downloads");
        let documents = home.join("Documents");
        let outside = home.join("outside");

        for dir in [&data_dir, &inbox, &documents, &outside] {
            std::fs::create_dir_all(dir)?;
        }

        Ok(Self {
            temp_dir,
            home,
            data_dir,
            inbox,
            documents,
            outside,
        })
    }

    /// Create a command running against this environment
    pub fn command(&self) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_tidybox"));
        cmd.env("HOME", &self.home);
        cmd.env("XDG_CONFIG_HOME", self.home.join(".config"));
        cmd.env("XDG_DATA_HOME", self.home.join(".local/share"));
        cmd.env_remove("RUST_LOG");
        cmd
    }

    pub fn config_file(&self) -> PathBuf {
        self.data_dir.join("config.json")
    }

    /// Write a config with drive roots disabled
    pub fn create_config(&self) -> anyhow::Result<()> {
        let config = serde_json::json!({
            "inbox": { "path": self.inbox, "watch": true },
            "access": {
                "include_drives": false,
                "extra_roots": [self.documents]
            },
            "ledger": { "recents_cap": 3 }
        });
        std::fs::write(self.config_file(), serde_json::to_string_pretty(&config)?)?;
        Ok(())
    }

    /// Drop a file into `dir`
    pub fn put_file(&self, dir: &Path, name: &str, contents: &[u8]) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, contents).expect("Failed to write test file");
        path
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new().expect("Failed to create test environment")
    }
}

/// Render a path for use as a CLI argument
pub fn arg(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
