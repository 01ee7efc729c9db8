//! Path validation for UI-supplied input
//!
//! Every path that reaches the gateway goes through here first. Checks run
//! cheapest-first: null bytes, length, traversal segments, then OS
//! canonicalization and allowlist containment.

use std::fmt;
use std::path::{Path, PathBuf};

use tidybox_config::{expand_tilde, AccessConfig};
use tracing::debug;

use crate::allowlist::AllowlistSnapshot;
use crate::error::{AccessError, Result};

/// Windows device names that cannot be used as file names, with or without
/// an extension.
#[cfg(windows)]
const RESERVED_DEVICE_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

#[cfg(windows)]
const RESERVED_CHARS: &[char] = &['<', '>', ':', '"', '|', '?', '*'];

/// An absolute, canonical path that passed validation.
///
/// Only this crate can construct one. Values are meant to be used for a
/// single operation and then dropped; revalidate on every call.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidatedPath(PathBuf);

impl ValidatedPath {
    pub fn as_path(&self) -> &Path {
        &self.0
    }

    pub fn into_path_buf(self) -> PathBuf {
        self.0
    }

    /// Final component as a display string
    pub fn file_name(&self) -> String {
        self.0
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.0.display().to_string())
    }
}

impl AsRef<Path> for ValidatedPath {
    fn as_ref(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for ValidatedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.display().fmt(f)
    }
}

/// Hard ceilings applied to input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_path_len: usize,
    pub max_name_len: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_path_len: 4096,
            max_name_len: 255,
        }
    }
}

impl From<&AccessConfig> for Limits {
    fn from(config: &AccessConfig) -> Self {
        Self {
            max_path_len: config.max_path_len,
            max_name_len: config.max_name_len,
        }
    }
}

/// Stateless validator; the allowlist is passed in per call.
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator {
    limits: Limits,
}

impl Validator {
    pub fn new(limits: Limits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    /// Validate a path that must already exist and lie under an allowlist
    /// entry.
    pub fn validate_existing(
        &self,
        candidate: &str,
        allowlist: &AllowlistSnapshot,
    ) -> Result<ValidatedPath> {
        let resolved = self.resolve(candidate)?;

        if !allowlist.contains(&resolved) {
            debug!("rejected {:?}: resolves outside allowlist", candidate);
            return Err(AccessError::outside(&resolved, "not under any allowed folder"));
        }

        Ok(ValidatedPath(resolved))
    }

    /// Validate an allowlist root. Same checks as [`validate_existing`]
    /// without the containment step.
    ///
    /// [`validate_existing`]: Validator::validate_existing
    pub fn validate_root(&self, candidate: &str) -> Result<ValidatedPath> {
        self.resolve(candidate).map(ValidatedPath)
    }

    /// Validate a single file or folder name for creation.
    pub fn validate_name<'a>(&self, name: &'a str) -> Result<&'a str> {
        self.check_raw(name)?;

        let invalid = |reason| AccessError::InvalidName {
            name: name.to_string(),
            reason,
        };

        if name.trim().is_empty() {
            return Err(invalid("name is empty"));
        }
        if name == "." || name == ".." {
            return Err(invalid("reserved path segment"));
        }
        if name.contains(['/', '\\']) {
            return Err(invalid("contains a path separator"));
        }
        if name.chars().any(char::is_control) {
            return Err(invalid("contains a control character"));
        }
        #[cfg(windows)]
        {
            if name.contains(RESERVED_CHARS) {
                return Err(invalid("contains a character Windows does not allow"));
            }
            if name.ends_with('.') || name.ends_with(' ') {
                return Err(invalid("ends with a dot or space"));
            }
            let stem = name.split('.').next().unwrap_or(name).trim_end();
            if RESERVED_DEVICE_NAMES
                .iter()
                .any(|reserved| stem.eq_ignore_ascii_case(reserved))
            {
                return Err(invalid("reserved device name"));
            }
        }
        if name.len() > self.limits.max_name_len {
            return Err(invalid("name is too long"));
        }

        Ok(name)
    }

    /// Validate `name` and join it onto an already validated parent folder.
    ///
    /// The result is not canonicalized since it may not exist yet. It stays
    /// inside the parent's allowlist entry because the name carries no
    /// separators or traversal segments.
    pub fn validate_new_entry(&self, parent: &ValidatedPath, name: &str) -> Result<ValidatedPath> {
        let name = self.validate_name(name)?;
        let joined = parent.as_path().join(name);

        let len = joined.as_os_str().len();
        if len > self.limits.max_path_len {
            return Err(AccessError::TooLong {
                len,
                max: self.limits.max_path_len,
            });
        }

        Ok(ValidatedPath(joined))
    }

    /// Validate a path whose final component is acted on itself.
    ///
    /// A symlink in last position is returned as the link, not its target,
    /// and only its parent folder has to be allowed. Anything else must
    /// resolve inside the allowlist as in [`validate_existing`].
    ///
    /// [`validate_existing`]: Validator::validate_existing
    pub fn validate_entry(
        &self,
        candidate: &str,
        allowlist: &AllowlistSnapshot,
    ) -> Result<ValidatedPath> {
        let expanded = self.prepare(candidate)?;
        let (Some(parent), Some(name)) = (expanded.parent(), expanded.file_name()) else {
            return self.validate_existing(candidate, allowlist);
        };

        let parent = std::fs::canonicalize(parent).map_err(|e| AccessError::from_read(parent, e))?;
        let entry = parent.join(name);
        let meta =
            std::fs::symlink_metadata(&entry).map_err(|e| AccessError::from_read(&entry, e))?;

        let allowed = if meta.file_type().is_symlink() {
            allowlist.contains(&parent)
        } else {
            allowlist.contains(&entry)
        };
        if !allowed {
            debug!("rejected {:?}: entry outside allowlist", candidate);
            return Err(AccessError::outside(&entry, "not under any allowed folder"));
        }

        Ok(ValidatedPath(entry))
    }

    /// Re-resolve an entry that was just created from
    /// [`validate_new_entry`], yielding its canonical form. The result must
    /// still lie inside the allowlist.
    ///
    /// [`validate_new_entry`]: Validator::validate_new_entry
    pub fn canonicalize_created(
        &self,
        entry: &ValidatedPath,
        allowlist: &AllowlistSnapshot,
    ) -> Result<ValidatedPath> {
        let canonical = std::fs::canonicalize(entry.as_path())
            .map_err(|e| AccessError::from_read(entry.as_path(), e))?;

        if !allowlist.contains(&canonical) {
            return Err(AccessError::outside(
                &canonical,
                "created folder resolves outside the allowed folders",
            ));
        }

        Ok(ValidatedPath(canonical))
    }

    /// Null byte and length checks shared by every entry point.
    fn check_raw(&self, candidate: &str) -> Result<()> {
        if candidate.contains('\0') {
            return Err(AccessError::InvalidCharacter);
        }
        if candidate.len() > self.limits.max_path_len {
            return Err(AccessError::TooLong {
                len: candidate.len(),
                max: self.limits.max_path_len,
            });
        }
        Ok(())
    }

    /// Raw checks, tilde expansion, traversal rejection and canonicalization.
    fn resolve(&self, candidate: &str) -> Result<PathBuf> {
        let expanded = self.prepare(candidate)?;
        std::fs::canonicalize(&expanded).map_err(|e| AccessError::from_read(&expanded, e))
    }

    /// Everything short of touching the filesystem.
    fn prepare(&self, candidate: &str) -> Result<PathBuf> {
        self.check_raw(candidate)?;

        // Both separators are checked so Windows-style input is caught on
        // every platform.
        if candidate.split(['/', '\\']).any(|segment| segment == "..") {
            return Err(AccessError::outside(candidate, "traversal segments are not allowed"));
        }

        let expanded = expand_tilde(candidate);
        if !expanded.is_absolute() {
            return Err(AccessError::outside(candidate, "path must be absolute"));
        }

        Ok(expanded)
    }
}

/// True if `path` equals `root` or descends from it. Comparison is by
/// whole components, so `/allowedfoo` is not inside `/allowed`.
pub fn is_within(path: &Path, root: &Path) -> bool {
    path.starts_with(root)
}
