//! Access errors surfaced to the UI

use serde::{Deserialize, Serialize};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Coarse error category the UI switches on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidCharacter,
    TooLong,
    InvalidName,
    NotFound,
    Unreadable,
    OutsideAllowlist,
    Conflict,
    PermissionDenied,
    WatcherUnavailable,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ErrorKind::InvalidCharacter => "invalid character",
            ErrorKind::TooLong => "too long",
            ErrorKind::InvalidName => "invalid name",
            ErrorKind::NotFound => "not found",
            ErrorKind::Unreadable => "unreadable",
            ErrorKind::OutsideAllowlist => "outside allowlist",
            ErrorKind::Conflict => "conflict",
            ErrorKind::PermissionDenied => "permission denied",
            ErrorKind::WatcherUnavailable => "watcher unavailable",
        };
        f.write_str(label)
    }
}

/// Error returned by path validation and every gateway operation
#[derive(Error, Debug)]
pub enum AccessError {
    #[error("path contains a null byte")]
    InvalidCharacter,

    #[error("path is {len} bytes long, the limit is {max}")]
    TooLong { len: usize, max: usize },

    #[error("invalid name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("no such file or folder: {}", .0.display())]
    NotFound(PathBuf),

    #[error("cannot read {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path} is outside the allowed folders: {reason}")]
    OutsideAllowlist { path: String, reason: &'static str },

    #[error("conflict at {}: {reason}", path.display())]
    Conflict { path: PathBuf, reason: String },

    #[error("permission denied for {}: {reason}", path.display())]
    PermissionDenied { path: PathBuf, reason: String },

    #[error("file detection unavailable: {0}")]
    WatcherUnavailable(String),
}

impl AccessError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AccessError::InvalidCharacter => ErrorKind::InvalidCharacter,
            AccessError::TooLong { .. } => ErrorKind::TooLong,
            AccessError::InvalidName { .. } => ErrorKind::InvalidName,
            AccessError::NotFound(_) => ErrorKind::NotFound,
            AccessError::Unreadable { .. } => ErrorKind::Unreadable,
            AccessError::OutsideAllowlist { .. } => ErrorKind::OutsideAllowlist,
            AccessError::Conflict { .. } => ErrorKind::Conflict,
            AccessError::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            AccessError::WatcherUnavailable(_) => ErrorKind::WatcherUnavailable,
        }
    }

    pub fn conflict(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        AccessError::Conflict {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn outside(path: impl AsRef<Path>, reason: &'static str) -> Self {
        AccessError::OutsideAllowlist {
            path: path.as_ref().display().to_string(),
            reason,
        }
    }

    /// Map an I/O failure while reading or resolving `path`.
    pub fn from_read(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => AccessError::NotFound(path.to_path_buf()),
            _ => AccessError::Unreadable {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }

    /// Map an I/O failure while mutating `path`.
    pub fn from_write(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => AccessError::NotFound(path.to_path_buf()),
            io::ErrorKind::AlreadyExists => AccessError::conflict(path, err.to_string()),
            _ => AccessError::PermissionDenied {
                path: path.to_path_buf(),
                reason: err.to_string(),
            },
        }
    }
}

pub type Result<T> = std::result::Result<T, AccessError>;
