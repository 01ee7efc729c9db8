//! The only code path that mutates the filesystem

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tidybox_config::ConflictPolicy;
use tidybox_guard::{AccessError, Allowlist, Result, ValidatedPath, Validator};
use tracing::{debug, info, warn};

use crate::bulk::BulkReport;
use crate::recycler::Recycler;

/// A single row of a directory listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DirEntry {
    pub name: String,
    pub path: PathBuf,
    pub is_dir: bool,
    /// Byte size for files, 0 for folders
    pub size: u64,
}

/// Validating front door to list, move, trash and create-folder.
///
/// Every call revalidates its input against the current allowlist
/// snapshot. Calls are independent and may run concurrently.
pub struct Gateway {
    allowlist: Arc<Allowlist>,
    validator: Validator,
    recycler: Arc<dyn Recycler>,
    on_conflict: ConflictPolicy,
}

impl Gateway {
    pub fn new(allowlist: Arc<Allowlist>, recycler: Arc<dyn Recycler>) -> Self {
        Self {
            allowlist,
            validator: Validator::default(),
            recycler,
            on_conflict: ConflictPolicy::default(),
        }
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_conflict_policy(mut self, policy: ConflictPolicy) -> Self {
        self.on_conflict = policy;
        self
    }

    pub fn allowlist(&self) -> &Arc<Allowlist> {
        &self.allowlist
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    fn validate(&self, candidate: &str) -> Result<ValidatedPath> {
        self.validator
            .validate_existing(candidate, &self.allowlist.snapshot())
    }

    /// List a folder: folders first, then files, each ordered by
    /// case-insensitive name.
    pub async fn list_directory(&self, path: &str) -> Result<Vec<DirEntry>> {
        let dir = self.validate(path)?;
        debug!("list {}", dir);

        let meta = tokio::fs::metadata(&dir)
            .await
            .map_err(|e| AccessError::from_read(dir.as_path(), e))?;
        if !meta.is_dir() {
            return Err(AccessError::conflict(dir.as_path(), "not a folder"));
        }

        let mut reader = tokio::fs::read_dir(&dir)
            .await
            .map_err(|e| AccessError::from_read(dir.as_path(), e))?;

        let mut entries = Vec::new();
        while let Some(entry) = reader
            .next_entry()
            .await
            .map_err(|e| AccessError::from_read(dir.as_path(), e))?
        {
            let path = entry.path();
            match describe(&path).await {
                Ok(item) => entries.push(item),
                // Entries can vanish between readdir and stat
                Err(e) => debug!("skipping {:?}: {}", path, e),
            }
        }

        sort_entries(&mut entries);
        Ok(entries)
    }

    /// Name, size and kind of one validated path
    pub async fn entry_info(&self, path: &str) -> Result<DirEntry> {
        let validated = self
            .validator
            .validate_entry(path, &self.allowlist.snapshot())?;
        describe(validated.as_path())
            .await
            .map_err(|e| AccessError::from_read(validated.as_path(), e))
    }

    /// Move `source` into `destination_dir`, keeping its name.
    ///
    /// A same-named entry at the destination is handled by the configured
    /// [`ConflictPolicy`]. Folders are never overwritten. A symlink source
    /// is moved as the link itself.
    pub async fn move_file(&self, source: &str, destination_dir: &str) -> Result<ValidatedPath> {
        let snapshot = self.allowlist.snapshot();
        let src = self.validator.validate_entry(source, &snapshot)?;
        let dest_dir = self
            .validator
            .validate_existing(destination_dir, &snapshot)?;

        if snapshot.is_root(src.as_path()) {
            return Err(AccessError::conflict(
                src.as_path(),
                "allowlisted roots cannot be moved",
            ));
        }

        let dest_meta = tokio::fs::metadata(&dest_dir)
            .await
            .map_err(|e| AccessError::from_read(dest_dir.as_path(), e))?;
        if !dest_meta.is_dir() {
            return Err(AccessError::conflict(
                dest_dir.as_path(),
                "destination is not a folder",
            ));
        }

        let src_meta = tokio::fs::symlink_metadata(&src)
            .await
            .map_err(|e| AccessError::from_read(src.as_path(), e))?;
        let src_is_dir = src_meta.is_dir();
        let src_is_link = src_meta.file_type().is_symlink();

        let name = src
            .as_path()
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| AccessError::conflict(src.as_path(), "source has no usable name"))?;
        let target = self.validator.validate_new_entry(&dest_dir, name)?;

        if target == src {
            return Err(AccessError::conflict(
                src.as_path(),
                "already in the destination folder",
            ));
        }
        if src_is_dir && dest_dir.as_path().starts_with(src.as_path()) {
            return Err(AccessError::conflict(
                src.as_path(),
                "a folder cannot be moved into itself",
            ));
        }

        match tokio::fs::symlink_metadata(&target).await {
            Ok(existing) => match self.on_conflict {
                ConflictPolicy::Reject => {
                    return Err(AccessError::conflict(
                        target.as_path(),
                        "an entry with this name already exists",
                    ));
                }
                ConflictPolicy::Overwrite if existing.is_dir() || src_is_dir => {
                    return Err(AccessError::conflict(
                        target.as_path(),
                        "folders are never overwritten",
                    ));
                }
                ConflictPolicy::Overwrite => {
                    warn!("overwriting {}", target);
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => return Err(AccessError::from_read(target.as_path(), e)),
        }

        match tokio::fs::rename(&src, &target).await {
            Ok(()) => {}
            Err(e) if is_cross_device(&e) && src_is_link => {
                return Err(AccessError::conflict(
                    src.as_path(),
                    "links cannot be moved across drives",
                ));
            }
            Err(e) if is_cross_device(&e) && !src_is_dir => {
                debug!("cross-device move, copying {} -> {}", src, target);
                tokio::fs::copy(&src, &target)
                    .await
                    .map_err(|e| AccessError::from_write(target.as_path(), e))?;
                tokio::fs::remove_file(&src)
                    .await
                    .map_err(|e| AccessError::from_write(src.as_path(), e))?;
            }
            Err(e) => return Err(AccessError::from_write(src.as_path(), e)),
        }

        info!("◆ MOVED {} -> {}", src, target);
        Ok(target)
    }

    /// Send a file or folder to the OS trash. Never deletes permanently.
    /// A symlink is trashed as the link; its target is left alone.
    pub async fn delete_file(&self, path: &str) -> Result<()> {
        let snapshot = self.allowlist.snapshot();
        let target = self.validator.validate_entry(path, &snapshot)?;

        if snapshot.is_root(target.as_path()) {
            return Err(AccessError::conflict(
                target.as_path(),
                "allowlisted roots cannot be deleted",
            ));
        }

        let recycler = Arc::clone(&self.recycler);
        let owned = target.as_path().to_path_buf();
        let outcome = tokio::task::spawn_blocking(move || {
            recycler.recycle(&owned).map_err(|e| e.to_string())
        })
        .await
        .map_err(|e| e.to_string())
        .and_then(|inner| inner);

        match outcome {
            Ok(()) => {
                info!("◆ TRASHED {}", target);
                Ok(())
            }
            Err(reason) => {
                warn!("trash failed for {}: {}", target, reason);
                Err(AccessError::PermissionDenied {
                    path: target.into_path_buf(),
                    reason,
                })
            }
        }
    }

    /// Create `name` inside `parent_dir` and allowlist it.
    ///
    /// An existing folder of that name counts as success.
    pub async fn create_folder(&self, parent_dir: &str, name: &str) -> Result<ValidatedPath> {
        let snapshot = self.allowlist.snapshot();
        let parent = self.validator.validate_existing(parent_dir, &snapshot)?;

        let parent_meta = tokio::fs::metadata(&parent)
            .await
            .map_err(|e| AccessError::from_read(parent.as_path(), e))?;
        if !parent_meta.is_dir() {
            return Err(AccessError::conflict(parent.as_path(), "parent is not a folder"));
        }

        let entry = self.validator.validate_new_entry(&parent, name)?;

        match tokio::fs::create_dir(&entry).await {
            Ok(()) => info!("◆ CREATED FOLDER {}", entry),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                let existing = tokio::fs::symlink_metadata(&entry)
                    .await
                    .map_err(|e| AccessError::from_read(entry.as_path(), e))?;
                if existing.file_type().is_symlink() {
                    return Err(AccessError::conflict(
                        entry.as_path(),
                        "a link with this name already exists",
                    ));
                }
                if !existing.is_dir() {
                    return Err(AccessError::conflict(
                        entry.as_path(),
                        "a file with this name already exists",
                    ));
                }
                debug!("folder {} already exists", entry);
            }
            Err(e) => return Err(AccessError::from_write(entry.as_path(), e)),
        }

        let canonical = self.validator.canonicalize_created(&entry, &snapshot)?;
        self.allowlist.add(canonical.clone());
        Ok(canonical)
    }

    /// Move each source independently. Earlier successes are kept when a
    /// later item fails.
    pub async fn move_many(
        &self,
        sources: &[String],
        destination_dir: &str,
    ) -> BulkReport<ValidatedPath> {
        let mut report = BulkReport::new();
        for source in sources {
            let outcome = async {
                let entry = self.entry_info(source).await?;
                let moved = self.move_file(source, destination_dir).await?;
                Ok::<_, AccessError>((entry, moved))
            }
            .await;
            report.record(source, outcome);
        }
        info!(
            "◆ BULK MOVE: {} succeeded, {} failed",
            report.succeeded_count(),
            report.failed_count()
        );
        report
    }

    /// Trash each path independently.
    pub async fn delete_many(&self, paths: &[String]) -> BulkReport<()> {
        let mut report = BulkReport::new();
        for path in paths {
            let outcome = async {
                let entry = self.entry_info(path).await?;
                self.delete_file(path).await?;
                Ok::<_, AccessError>((entry, ()))
            }
            .await;
            report.record(path, outcome);
        }
        info!(
            "◆ BULK TRASH: {} succeeded, {} failed",
            report.succeeded_count(),
            report.failed_count()
        );
        report
    }
}

async fn describe(path: &Path) -> io::Result<DirEntry> {
    // Follow symlinks for kind and size; fall back to the link itself
    // when the target is gone.
    let meta = match tokio::fs::metadata(path).await {
        Ok(meta) => meta,
        Err(_) => tokio::fs::symlink_metadata(path).await?,
    };
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());

    Ok(DirEntry {
        name,
        path: path.to_path_buf(),
        is_dir: meta.is_dir(),
        size: if meta.is_dir() { 0 } else { meta.len() },
    })
}

/// Folders first, then case-insensitive name, then exact name.
pub fn sort_entries(entries: &mut [DirEntry]) {
    entries.sort_by(|a, b| {
        b.is_dir
            .cmp(&a.is_dir)
            .then_with(|| a.name.to_lowercase().cmp(&b.name.to_lowercase()))
            .then_with(|| a.name.cmp(&b.name))
    });
}

fn is_cross_device(err: &io::Error) -> bool {
    // EXDEV on unix, ERROR_NOT_SAME_DEVICE on Windows
    #[cfg(unix)]
    {
        err.raw_os_error() == Some(18)
    }
    #[cfg(windows)]
    {
        err.raw_os_error() == Some(17)
    }
    #[cfg(not(any(unix, windows)))]
    {
        let _ = err;
        false
    }
}
