// Progress sinks.
//
// Every accepted transition is recorded twice: synchronously into the local
// cache, and into a debounced remote writer that only sends the latest state
// once changes stop arriving for the quiet period.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, warn};
use uuid::Uuid;

use radar_common::QuizProgress;
use radar_store::QuizStore;

use crate::cache::{cache_key, CachedProgress, LocalCache};
use crate::machine::{AttemptState, Phase, SavedProgress};

pub const REMOTE_QUIET_PERIOD: Duration = Duration::from_secs(2);

/// Receives the attempt after each accepted change. Only in-progress
/// attempts are persisted.
pub trait ProgressSink: Send + Sync {
    fn record(&self, state: &AttemptState);
}

// ---------------------------------------------------------------------------
// LocalCacheSink
// ---------------------------------------------------------------------------

pub struct LocalCacheSink {
    cache: Arc<dyn LocalCache>,
}

impl LocalCacheSink {
    pub fn new(cache: Arc<dyn LocalCache>) -> Self {
        Self { cache }
    }

    /// Saved progress for the key. Unreadable or corrupt entries, and entries
    /// written for a different admission number, count as nothing saved.
    pub fn load(&self, quiz_id: Uuid, admission_number: &str) -> Option<SavedProgress> {
        let key = cache_key(quiz_id, admission_number);
        let raw = match self.cache.load(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(key = key.as_str(), error = %e, "Local progress unreadable");
                return None;
            }
        };
        match serde_json::from_str::<CachedProgress>(&raw) {
            Ok(cached) if cached.admission_number != admission_number => {
                warn!(
                    key = key.as_str(),
                    found = cached.admission_number.as_str(),
                    "Ignoring local progress saved for another student"
                );
                None
            }
            Ok(cached) => Some(cached.into_saved()),
            Err(e) => {
                warn!(key = key.as_str(), error = %e, "Discarding corrupt local progress");
                None
            }
        }
    }

    pub fn clear(&self, quiz_id: Uuid, admission_number: &str) {
        let key = cache_key(quiz_id, admission_number);
        if let Err(e) = self.cache.remove(&key) {
            warn!(key = key.as_str(), error = %e, "Failed to clear local progress");
        }
    }
}

impl ProgressSink for LocalCacheSink {
    fn record(&self, state: &AttemptState) {
        if state.phase != Phase::InProgress {
            return;
        }
        let key = cache_key(state.quiz_id, &state.admission_number);
        let result = serde_json::to_string(&CachedProgress::from_state(state, Utc::now()))
            .map_err(anyhow::Error::from)
            .and_then(|json| self.cache.store(&key, &json));
        if let Err(e) = result {
            warn!(key = key.as_str(), error = %e, "Local progress write failed");
        }
    }
}

// ---------------------------------------------------------------------------
// DebouncedRemoteSink
// ---------------------------------------------------------------------------

enum Command {
    Save(QuizProgress),
    Discard,
}

/// Background writer for the remote progress row.
///
/// A new state arriving inside the quiet period replaces the pending one and
/// restarts the timer. A failed save is logged and left to the next change.
pub struct DebouncedRemoteSink {
    tx: mpsc::UnboundedSender<Command>,
    handle: JoinHandle<()>,
}

impl DebouncedRemoteSink {
    pub fn spawn(store: Arc<dyn QuizStore>) -> Self {
        Self::with_quiet_period(store, REMOTE_QUIET_PERIOD)
    }

    pub fn with_quiet_period(store: Arc<dyn QuizStore>, quiet: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let handle = tokio::spawn(run_writer(store, quiet, rx));
        Self { tx, handle }
    }

    /// Drop the pending write, if any.
    pub fn discard(&self) {
        let _ = self.tx.send(Command::Discard);
    }

    /// Send whatever is pending now and stop the writer.
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.handle.await {
            warn!(error = %e, "Remote progress writer ended abnormally");
        }
    }
}

impl ProgressSink for DebouncedRemoteSink {
    fn record(&self, state: &AttemptState) {
        if state.phase != Phase::InProgress {
            return;
        }
        if self
            .tx
            .send(Command::Save(state.to_progress(Utc::now())))
            .is_err()
        {
            warn!("Remote progress writer is gone, change not queued");
        }
    }
}

async fn run_writer(
    store: Arc<dyn QuizStore>,
    quiet: Duration,
    mut rx: mpsc::UnboundedReceiver<Command>,
) {
    let mut pending: Option<QuizProgress> = None;

    loop {
        let command = if pending.is_some() {
            match tokio::time::timeout(quiet, rx.recv()).await {
                Ok(Some(command)) => command,
                Ok(None) => break,
                Err(_) => {
                    if let Some(progress) = pending.take() {
                        save(store.as_ref(), &progress).await;
                    }
                    continue;
                }
            }
        } else {
            match rx.recv().await {
                Some(command) => command,
                None => break,
            }
        };

        match command {
            Command::Save(progress) => pending = Some(progress),
            Command::Discard => pending = None,
        }
    }

    if let Some(progress) = pending {
        save(store.as_ref(), &progress).await;
    }
}

async fn save(store: &dyn QuizStore, progress: &QuizProgress) {
    match store.save_progress(progress).await {
        Ok(()) => debug!(
            quiz_id = %progress.quiz_id,
            current = progress.current_question,
            "Saved remote progress"
        ),
        Err(e) => warn!(
            quiz_id = %progress.quiz_id,
            error = %e,
            "Remote progress save failed"
        ),
    }
}
