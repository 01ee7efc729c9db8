//! Most-recently-used destination folders

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_RECENTS_CAP: usize = 5;

/// Bounded most-recent-first list without duplicates
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentDestinations {
    cap: usize,
    paths: Vec<PathBuf>,
}

impl RecentDestinations {
    pub fn new(cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            paths: Vec::new(),
        }
    }

    /// Insert at the front, or promote if already present. The least
    /// recently noted path falls off once the cap is exceeded.
    pub fn note(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        self.paths.retain(|p| *p != path);
        self.paths.insert(0, path);
        self.paths.truncate(self.cap);
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    pub fn get(&self, index: usize) -> Option<&Path> {
        self.paths.get(index).map(PathBuf::as_path)
    }

    pub fn cap(&self) -> usize {
        self.cap
    }

    /// Apply a new cap, dropping the oldest entries if it shrank
    pub fn set_cap(&mut self, cap: usize) {
        self.cap = cap.max(1);
        self.paths.truncate(self.cap);
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl Default for RecentDestinations {
    fn default() -> Self {
        Self::new(DEFAULT_RECENTS_CAP)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lru_order() {
        let mut recents = RecentDestinations::new(3);
        for p in ["A", "B", "A", "C"] {
            recents.note(p);
        }
        assert_eq!(
            recents.paths(),
            &[PathBuf::from("C"), PathBuf::from("A"), PathBuf::from("B")]
        );
    }

    #[test]
    fn test_eviction() {
        let mut recents = RecentDestinations::new(2);
        recents.note("A");
        recents.note("B");
        recents.note("C");
        assert_eq!(recents.paths(), &[PathBuf::from("C"), PathBuf::from("B")]);
        assert_eq!(recents.get(1), Some(Path::new("B")));
        assert_eq!(recents.get(2), None);
    }

    #[test]
    fn test_zero_cap_keeps_one() {
        let mut recents = RecentDestinations::new(0);
        recents.note("A");
        recents.note("B");
        assert_eq!(recents.len(), 1);
        assert_eq!(recents.cap(), 1);
    }

    #[test]
    fn test_shrink_cap() {
        let mut recents = RecentDestinations::new(5);
        for p in ["A", "B", "C", "D"] {
            recents.note(p);
        }
        recents.set_cap(2);
        assert_eq!(recents.paths(), &[PathBuf::from("D"), PathBuf::from("C")]);
    }
}
