//! Per-file arrival state, independent of any OS notification source.
//!
//! The tracker is fed classified changes and swept periodically. A file
//! is emitted once its size has held steady across two sweeps and no
//! change was seen for the debounce window. Emitted paths keep a
//! tombstone until they are removed or renamed away.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use tracing::debug;

use crate::event::{Change, NewFileEvent, RawEvent};
use crate::temp_filter::TempFilter;

#[derive(Debug, Clone)]
pub struct WatchedFile {
    pub path: PathBuf,
    /// Size at the last sweep, `None` until first measured
    pub size: Option<u64>,
    pub first_seen: Instant,
    pub last_change: Instant,
}

impl WatchedFile {
    fn new(path: PathBuf, now: Instant) -> Self {
        Self {
            path,
            size: None,
            first_seen: now,
            last_change: now,
        }
    }

    fn touch(&mut self, now: Instant) {
        self.last_change = now;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileState {
    Growing,
    Emitted,
}

pub struct Tracker {
    inbox: PathBuf,
    debounce: Duration,
    filter: TempFilter,
    growing: HashMap<PathBuf, WatchedFile>,
    emitted: HashSet<PathBuf>,
    /// temp companion path -> final path it is being written for
    companions: HashMap<PathBuf, PathBuf>,
}

impl Tracker {
    pub fn new(inbox: impl Into<PathBuf>, debounce: Duration, filter: TempFilter) -> Self {
        Self {
            inbox: inbox.into(),
            debounce,
            filter,
            growing: HashMap::new(),
            emitted: HashSet::new(),
            companions: HashMap::new(),
        }
    }

    pub fn inbox(&self) -> &Path {
        &self.inbox
    }

    pub fn observe(&mut self, event: &RawEvent, now: Instant) {
        if event.path.parent() != Some(self.inbox.as_path()) {
            return;
        }
        let Some(name) = event.path.file_name().map(|n| n.to_string_lossy()) else {
            return;
        };

        if self.filter.is_temp(&name) {
            match event.change {
                Change::Created | Change::Modified | Change::RenamedTo => {
                    if let Some(base) = self.filter.companion_base(&name) {
                        let base = self.inbox.join(base);
                        self.companions.insert(event.path.clone(), base);
                    }
                }
                Change::Removed | Change::RenamedFrom => {
                    self.companions.remove(&event.path);
                }
            }
            return;
        }

        match event.change {
            Change::Created | Change::RenamedTo => {
                if self.emitted.remove(&event.path) {
                    debug!("{} replaced after emission, tracking again", name);
                }
                self.growing
                    .entry(event.path.clone())
                    .and_modify(|file| {
                        file.size = None;
                        file.touch(now);
                    })
                    .or_insert_with(|| WatchedFile::new(event.path.clone(), now));
            }
            Change::Modified => {
                if self.emitted.contains(&event.path) {
                    return;
                }
                self.growing
                    .entry(event.path.clone())
                    .and_modify(|file| file.touch(now))
                    .or_insert_with(|| WatchedFile::new(event.path.clone(), now));
            }
            Change::Removed | Change::RenamedFrom => {
                if self.growing.remove(&event.path).is_some() {
                    debug!("{} vanished before it settled", name);
                }
                self.emitted.remove(&event.path);
            }
        }
    }

    /// Measure every growing file and return the ones that settled,
    /// oldest arrival first.
    ///
    /// `size_of` returns the size of a regular file, or `None` when the path
    /// is missing or not a regular file.
    pub fn sweep<F>(&mut self, now: Instant, mut size_of: F) -> Vec<NewFileEvent>
    where
        F: FnMut(&Path) -> Option<u64>,
    {
        self.companions.retain(|companion, _| size_of(companion).is_some());

        let mut settled = Vec::new();
        let mut vanished = Vec::new();

        for (path, file) in self.growing.iter_mut() {
            let Some(size) = size_of(path) else {
                vanished.push(path.clone());
                continue;
            };

            let measured_before = file.size.is_some();
            if file.size != Some(size) {
                if measured_before {
                    file.touch(now);
                }
                file.size = Some(size);
            }

            let quiet = now.saturating_duration_since(file.last_change) >= self.debounce;
            let awaiting_companion = self.companions.values().any(|base| base == path);
            if measured_before && quiet && !awaiting_companion {
                settled.push((file.first_seen, path.clone(), size));
            }
        }

        for path in vanished {
            debug!("{} vanished before it settled", path.display());
            self.growing.remove(&path);
        }

        settled.sort_by(|a, b| a.0.cmp(&b.0).then_with(|| a.1.cmp(&b.1)));
        settled
            .into_iter()
            .map(|(_, path, size)| {
                self.growing.remove(&path);
                self.emitted.insert(path.clone());
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                NewFileEvent { name, path, size }
            })
            .collect()
    }

    pub fn state_of(&self, path: &Path) -> Option<FileState> {
        if self.growing.contains_key(path) {
            Some(FileState::Growing)
        } else if self.emitted.contains(path) {
            Some(FileState::Emitted)
        } else {
            None
        }
    }

    /// Number of files still settling
    pub fn pending(&self) -> usize {
        self.growing.len()
    }
}
