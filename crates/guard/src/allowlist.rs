//! Allowlisted directory roots
//!
//! Read on every gateway call, written only at startup and when a folder is
//! created. Writers build a fresh slice and swap it in under the write lock,
//! so readers holding a snapshot never see a half-inserted entry.

use std::path::Path;
use std::sync::{Arc, RwLock};

use tracing::{debug, info};

use crate::validator::{is_within, ValidatedPath};

/// Immutable view of the allowlist at one point in time
#[derive(Debug, Clone)]
pub struct AllowlistSnapshot {
    roots: Arc<[ValidatedPath]>,
}

impl AllowlistSnapshot {
    pub fn roots(&self) -> &[ValidatedPath] {
        &self.roots
    }

    /// True if `path` equals or descends from some root
    pub fn contains(&self, path: &Path) -> bool {
        self.roots.iter().any(|root| is_within(path, root.as_path()))
    }

    /// True if `path` is itself one of the roots
    pub fn is_root(&self, path: &Path) -> bool {
        self.roots.iter().any(|root| root.as_path() == path)
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

/// Shared allowlist store, injected as `Arc<Allowlist>`
#[derive(Debug)]
pub struct Allowlist {
    roots: RwLock<Arc<[ValidatedPath]>>,
}

impl Allowlist {
    pub fn new() -> Self {
        Self {
            roots: RwLock::new(Arc::from(Vec::new())),
        }
    }

    /// Insert the startup roots. Duplicates are skipped.
    pub fn seed(&self, roots: impl IntoIterator<Item = ValidatedPath>) {
        let mut guard = self.roots.write().unwrap_or_else(|e| e.into_inner());
        let mut next: Vec<ValidatedPath> = guard.to_vec();
        for root in roots {
            if !next.contains(&root) {
                next.push(root);
            }
        }
        info!("◆ ALLOWLIST SEEDED WITH {} ROOTS", next.len());
        *guard = Arc::from(next);
    }

    /// Add a single root. Returns false if it was already present.
    pub fn add(&self, root: ValidatedPath) -> bool {
        let mut guard = self.roots.write().unwrap_or_else(|e| e.into_inner());
        if guard.contains(&root) {
            return false;
        }
        debug!("allowlist += {}", root);
        let mut next: Vec<ValidatedPath> = Vec::with_capacity(guard.len() + 1);
        next.extend(guard.iter().cloned());
        next.push(root);
        *guard = Arc::from(next);
        true
    }

    pub fn snapshot(&self) -> AllowlistSnapshot {
        let roots = self.roots.read().unwrap_or_else(|e| e.into_inner());
        AllowlistSnapshot {
            roots: Arc::clone(&roots),
        }
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.snapshot().contains(path)
    }
}

impl Default for Allowlist {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validator::Validator;
    use std::fs;
    use tempfile::TempDir;

    fn root(dir: &Path) -> ValidatedPath {
        Validator::default()
            .validate_root(dir.to_str().unwrap())
            .unwrap()
    }

    #[test]
    fn test_empty_allows_nothing() {
        let allowlist = Allowlist::new();
        assert!(allowlist.snapshot().is_empty());
        assert!(!allowlist.contains(Path::new("/")));
    }

    #[test]
    fn test_seed_dedupes() {
        let temp = TempDir::new().unwrap();
        let allowlist = Allowlist::new();

        allowlist.seed(vec![root(temp.path()), root(temp.path())]);
        assert_eq!(allowlist.snapshot().len(), 1);
    }

    #[test]
    fn test_add_reports_novelty() {
        let temp = TempDir::new().unwrap();
        let sub = temp.path().join("sub");
        fs::create_dir(&sub).unwrap();

        let allowlist = Allowlist::new();
        assert!(allowlist.add(root(&sub)));
        assert!(!allowlist.add(root(&sub)));

        let canonical = sub.canonicalize().unwrap();
        assert!(allowlist.contains(&canonical.join("child.txt")));
        assert!(!allowlist.contains(temp.path().canonicalize().unwrap().as_path()));
    }

    #[test]
    fn test_snapshot_is_stable_across_add() {
        let temp = TempDir::new().unwrap();
        let a = temp.path().join("a");
        let b = temp.path().join("b");
        fs::create_dir(&a).unwrap();
        fs::create_dir(&b).unwrap();

        let allowlist = Allowlist::new();
        allowlist.add(root(&a));
        let before = allowlist.snapshot();
        allowlist.add(root(&b));

        assert_eq!(before.len(), 1);
        assert_eq!(allowlist.snapshot().len(), 2);
        assert!(allowlist.snapshot().is_root(&b.canonicalize().unwrap()));
    }
}
