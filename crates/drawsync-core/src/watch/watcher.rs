//! Watch loop over the downloads folder
//!
//! Change notifications from `notify` are bridged into a tokio channel and
//! filtered down to create/modify events of recognized files. The notification
//! stream is fallible: on any failure the watch is torn down and restarted
//! after an escalating delay, forever.

use std::convert::Infallible;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use backoff::ExponentialBackoff;
use backoff::backoff::Backoff;
use drawsync_fs::NameResolver;
use drawsync_fs::constants::MAX_WATCH_RETRY;
use notify::event::{Flag, ModifyKind, RenameMode};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::{debug, error, info, trace, warn};

use super::debounce::{DebounceAggregator, ScanSummary};
use crate::config::SyncConfig;
use crate::{Error, Result};

/// Keeps the debounce aggregator fed with events from the watched folder.
pub struct FolderWatcher {
    folder: PathBuf,
    resolver: NameResolver,
    aggregator: DebounceAggregator,
    retry: Duration,
    max_retry: Duration,
}

impl FolderWatcher {
    /// Create a watcher over the configured downloads folder.
    pub fn new(config: &SyncConfig, aggregator: DebounceAggregator) -> Result<Self> {
        Ok(Self {
            folder: config.watched_folder.clone(),
            resolver: config.name_resolver()?,
            aggregator,
            retry: config.watch_retry,
            max_retry: MAX_WATCH_RETRY.max(config.watch_retry),
        })
    }

    /// Override the ceiling of the restart delay.
    pub fn with_max_retry(mut self, max_retry: Duration) -> Self {
        self.max_retry = max_retry.max(self.retry);
        self
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn aggregator(&self) -> &DebounceAggregator {
        &self.aggregator
    }

    /// One full reconciliation pass over the watched folder.
    pub async fn scan(&self) -> Result<ScanSummary> {
        self.aggregator.scan(&self.folder, &self.resolver).await
    }

    fn restart_policy(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            current_interval: self.retry,
            initial_interval: self.retry,
            randomization_factor: 0.0,
            multiplier: 2.0,
            max_interval: self.max_retry,
            max_elapsed_time: None,
            ..ExponentialBackoff::default()
        }
    }

    /// Watch the folder and run the initial scan, until the future is dropped.
    ///
    /// The watch is registered before the initial scan so that saves landing
    /// during the scan still produce events. Only a failure to list the
    /// watched folder during the initial scan is returned; watch failures are
    /// logged and the watch is restarted.
    pub async fn run(&self) -> Result<()> {
        let mut session = self.open_session();
        self.scan().await?;

        let mut policy = self.restart_policy();
        loop {
            let started = Instant::now();
            let Err(e) = match session {
                Ok(session) => self.watch(session).await,
                Err(e) => Err(e),
            };
            error!(folder = %self.folder.display(), "Watch failed: {}", e);

            if started.elapsed() >= self.max_retry {
                policy.reset();
            }
            let delay = policy.next_backoff().unwrap_or(self.max_retry);
            warn!(folder = %self.folder.display(), "Restarting watch in {:?}", delay);
            tokio::time::sleep(delay).await;

            session = self.open_session();
            if session.is_ok() {
                self.rescan("watch restart").await;
            }
        }
    }

    /// Register a notify watcher over the folder.
    fn open_session(&self) -> Result<Session> {
        let (tx, events) = mpsc::unbounded_channel();
        let mut watcher = RecommendedWatcher::new(
            move |result: notify::Result<Event>| {
                // The receiver is gone once the session ended.
                let _ = tx.send(result);
            },
            notify::Config::default(),
        )?;
        watcher.watch(&self.folder, RecursiveMode::NonRecursive)?;
        info!(folder = %self.folder.display(), "Watching for changes");
        Ok(Session {
            _watcher: watcher,
            events,
        })
    }

    /// Consume events until the notification stream fails.
    async fn watch(&self, mut session: Session) -> Result<Infallible> {
        while let Some(result) = session.events.recv().await {
            let event = result?;
            trace!(?event, "Change notification");
            self.handle_event(&event).await?;
        }
        Err(Error::WatchStreamClosed {
            path: self.folder.clone(),
        })
    }

    /// Full scan whose failure is only logged.
    async fn rescan(&self, reason: &str) {
        match self.scan().await {
            Ok(summary) => debug!(reason, bases = summary.bases, "Rescanned watched folder"),
            Err(e) => warn!(reason, "Rescan failed: {}", e),
        }
    }

    async fn handle_event(&self, event: &Event) -> Result<()> {
        if matches!(event.flag(), Some(Flag::Rescan)) {
            warn!(folder = %self.folder.display(), "Change notifications were lost");
            self.rescan("lost notifications").await;
            return Ok(());
        }

        match event.kind {
            EventKind::Remove(_) if event.paths.iter().any(|p| p == &self.folder) => {
                Err(Error::WatchTargetRemoved {
                    path: self.folder.clone(),
                })
            }
            EventKind::Modify(ModifyKind::Name(RenameMode::From)) => Ok(()),
            EventKind::Create(_) | EventKind::Modify(_) => {
                for path in &event.paths {
                    if let Some(base) = self.relevant_base(path) {
                        debug!(base = %base, path = %path.display(), "Scheduling reconciliation");
                        self.aggregator.schedule(&base);
                    }
                }
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// Base name of `path` if it is a recognized file directly inside the watched folder.
    fn relevant_base(&self, path: &Path) -> Option<String> {
        if path.parent() != Some(self.folder.as_path()) {
            return None;
        }
        let name = path.file_name()?.to_str()?;
        if !self.resolver.matches(name) {
            return None;
        }
        let parsed = self.resolver.parse(name);
        parsed.is_reconcilable().then_some(parsed.base)
    }
}

/// A registered watcher and the channel its notifications arrive on.
struct Session {
    _watcher: RecommendedWatcher,
    events: mpsc::UnboundedReceiver<notify::Result<Event>>,
}
