//! Inbox watcher backed by OS change notifications

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tidybox_config::WatcherConfig;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::event::{classify, NewFileEvent, WatcherStatus};
use crate::temp_filter::TempFilter;
use crate::tracker::Tracker;

/// Watches one directory and reports files once they finish arriving
pub struct InboxWatcher {
    inbox: PathBuf,
    debounce: Duration,
    sweep_interval: Duration,
    capacity: usize,
    filter: TempFilter,
}

impl InboxWatcher {
    pub fn new(inbox: impl Into<PathBuf>, config: &WatcherConfig) -> Self {
        Self {
            inbox: inbox.into(),
            debounce: config.debounce(),
            sweep_interval: config.sweep_interval(),
            capacity: config.channel_capacity.max(1),
            filter: TempFilter::new(&config.extra_temp_suffixes),
        }
    }

    /// Subscribe to the inbox and spawn the debounce task.
    ///
    /// Never fails: when the subscription cannot be set up the returned
    /// handle reports [`WatcherStatus::Unavailable`] and its stream is
    /// already closed. Must be called inside a tokio runtime.
    pub fn start(self) -> WatcherHandle {
        let inbox = match std::fs::canonicalize(&self.inbox) {
            Ok(path) if path.is_dir() => path,
            Ok(path) => {
                return WatcherHandle::unavailable(format!("{} is not a folder", path.display()))
            }
            Err(e) => {
                return WatcherHandle::unavailable(format!(
                    "cannot open {}: {}",
                    self.inbox.display(),
                    e
                ))
            }
        };

        let (raw_tx, raw_rx) = mpsc::unbounded_channel();
        let mut watcher = match notify::recommended_watcher(
            move |res: notify::Result<notify::Event>| {
                let _ = raw_tx.send(res);
            },
        ) {
            Ok(w) => w,
            Err(e) => return WatcherHandle::unavailable(e.to_string()),
        };

        if let Err(e) = watcher.watch(&inbox, RecursiveMode::NonRecursive) {
            return WatcherHandle::unavailable(format!("cannot watch {}: {}", inbox.display(), e));
        }

        info!("◆ WATCHING {}", inbox.display());

        let (tx, rx) = mpsc::channel(self.capacity);
        let cancel = CancellationToken::new();
        let tracker = Tracker::new(inbox.clone(), self.debounce, self.filter);
        let task = tokio::spawn(run(
            watcher,
            tracker,
            raw_rx,
            tx,
            self.sweep_interval,
            cancel.clone(),
        ));

        WatcherHandle {
            status: WatcherStatus::Active { inbox },
            events: rx,
            cancel,
            task: Some(task),
        }
    }
}

async fn run(
    watcher: RecommendedWatcher,
    mut tracker: Tracker,
    mut raw_rx: mpsc::UnboundedReceiver<notify::Result<notify::Event>>,
    tx: mpsc::Sender<NewFileEvent>,
    sweep_interval: Duration,
    cancel: CancellationToken,
) {
    let mut tick = tokio::time::interval(sweep_interval);
    tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            raw = raw_rx.recv() => match raw {
                Some(Ok(event)) => {
                    let now = Instant::now();
                    for change in classify(&event, Path::exists) {
                        tracker.observe(&change, now);
                    }
                }
                Some(Err(e)) => warn!("watch error on {}: {}", tracker.inbox().display(), e),
                None => break,
            },
            _ = tick.tick() => {
                for event in tracker.sweep(Instant::now(), regular_file_size) {
                    info!("◆ NEW FILE {} ({} bytes)", event.name, event.size);
                    tokio::select! {
                        _ = cancel.cancelled() => return,
                        sent = tx.send(event) => {
                            if sent.is_err() {
                                debug!("event receiver dropped, stopping watcher");
                                return;
                            }
                        }
                    }
                }
            }
        }
    }

    drop(watcher);
    debug!("watcher on {} stopped", tracker.inbox().display());
}

/// Size of a regular file. Links are never followed, so a symlink dropped
/// into the inbox is never reported.
fn regular_file_size(path: &Path) -> Option<u64> {
    std::fs::symlink_metadata(path)
        .ok()
        .filter(|meta| meta.is_file())
        .map(|meta| meta.len())
}

/// Owner of a running watcher. Dropping it stops the task.
pub struct WatcherHandle {
    status: WatcherStatus,
    events: mpsc::Receiver<NewFileEvent>,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl WatcherHandle {
    fn inert(status: WatcherStatus) -> Self {
        let (_, events) = mpsc::channel(1);
        Self {
            status,
            events,
            cancel: CancellationToken::new(),
            task: None,
        }
    }

    fn unavailable(reason: String) -> Self {
        warn!("◆ FILE DETECTION UNAVAILABLE: {}", reason);
        Self::inert(WatcherStatus::Unavailable { reason })
    }

    /// A handle for when watching is turned off in configuration
    pub fn disabled() -> Self {
        Self::inert(WatcherStatus::Disabled)
    }

    pub fn status(&self) -> &WatcherStatus {
        &self.status
    }

    /// Next settled file, or `None` once the watcher has stopped
    pub async fn recv(&mut self) -> Option<NewFileEvent> {
        self.events.recv().await
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }

    /// Stop and wait for the task to finish
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
