//! Recording file watcher.
//!
//! Watches the vault for newly created recordings and emits an event once
//! each file is stable (size unchanged and non-zero for the stability delay).

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::{DateTime, Utc};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

/// Default recording extension (Obsidian's audio recorder writes webm)
pub const DEFAULT_EXTENSION: &str = "webm";

/// Stability windows a recording may stay empty before it is dropped
pub const MAX_EMPTY_CHECKS: u32 = 5;

/// Errors that can occur with the watcher
#[derive(Debug, Error)]
pub enum WatcherError {
    #[error("Watch directory does not exist: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("Notify error: {0}")]
    Notify(#[from] notify::Error),
}

/// Configuration for the watcher
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WatcherConfig {
    /// Path to watch
    pub watch_path: PathBuf,

    /// Recording file extension, without the dot
    pub extension: String,

    /// How long a file must be stable before processing (seconds)
    pub stability_delay_secs: u64,

    /// Watch subdirectories too
    pub recursive: bool,
}

impl WatcherConfig {
    /// Watch `watch_path` for webm recordings
    pub fn for_directory(watch_path: PathBuf) -> Self {
        Self {
            watch_path,
            extension: DEFAULT_EXTENSION.to_string(),
            stability_delay_secs: 2,
            recursive: true,
        }
    }

    /// Check if the watch path exists
    pub fn validate(&self) -> Result<(), WatcherError> {
        if !self.watch_path.exists() {
            return Err(WatcherError::DirectoryNotFound(self.watch_path.clone()));
        }
        Ok(())
    }

    /// Check if a path is a recording we care about
    pub fn is_recording(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case(&self.extension))
            .unwrap_or(false)
    }

    /// Recordings created by a file-system event; anything else yields nothing
    pub fn created_recordings(&self, event: &Event) -> Vec<PathBuf> {
        if !matches!(event.kind, EventKind::Create(_)) {
            return Vec::new();
        }

        event
            .paths
            .iter()
            .filter(|path| self.is_recording(path))
            .cloned()
            .collect()
    }
}

/// Event emitted when a new recording is detected and stable
#[derive(Debug, Clone)]
pub struct RecordingEvent {
    /// Path to the recording
    pub path: PathBuf,

    /// File size in bytes
    pub size: u64,

    /// When the file was detected
    pub detected_at: DateTime<Utc>,
}

/// Result of one stability check on a pending recording
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stability {
    /// Too soon to tell, or still changing
    Waiting,
    /// Size held for a full window; ready to process
    Ready(u64),
    /// File vanished before it settled
    Gone,
    /// Still empty after [`MAX_EMPTY_CHECKS`] windows
    Abandoned,
}

/// A created recording waiting for its size to settle
#[derive(Debug, Clone)]
pub struct PendingRecording {
    size: u64,
    last_seen: Instant,
    empty_checks: u32,
}

impl PendingRecording {
    pub fn new(size: u64, seen: Instant) -> Self {
        Self {
            size,
            last_seen: seen,
            empty_checks: 0,
        }
    }

    /// Compare the file's current size (`None` if it is gone) against the
    /// last one seen, once `delay` has passed since it last changed.
    pub fn check(&mut self, current: Option<u64>, now: Instant, delay: Duration) -> Stability {
        if now.duration_since(self.last_seen) < delay {
            return Stability::Waiting;
        }

        match current {
            None => Stability::Gone,
            Some(size) if size == self.size && size > 0 => Stability::Ready(size),
            Some(0) => {
                self.empty_checks += 1;
                if self.empty_checks >= MAX_EMPTY_CHECKS {
                    return Stability::Abandoned;
                }
                self.size = 0;
                self.last_seen = now;
                Stability::Waiting
            }
            Some(size) => {
                // Still being written, restart the clock
                self.size = size;
                self.last_seen = now;
                self.empty_checks = 0;
                Stability::Waiting
            }
        }
    }
}

/// Recording watcher with stability checking
pub struct RecordingWatcher {
    config: WatcherConfig,
}

impl RecordingWatcher {
    /// Create a watcher with custom configuration
    pub fn with_config(config: WatcherConfig) -> Self {
        Self { config }
    }

    /// Watch the directory and emit events for new stable recordings.
    /// Runs until stopped through the returned handle.
    pub fn watch(&self) -> Result<(mpsc::Receiver<RecordingEvent>, WatchHandle), WatcherError> {
        self.config.validate()?;

        let (event_tx, event_rx) = mpsc::channel::<RecordingEvent>(100);
        let (stop_tx, mut stop_rx) = mpsc::channel::<()>(1);

        // Register before spawning so setup errors reach the caller
        let (fs_tx, fs_rx) = std::sync::mpsc::channel();
        let mut watcher = notify::recommended_watcher(fs_tx)?;
        let mode = if self.config.recursive {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        watcher.watch(&self.config.watch_path, mode)?;

        let config = self.config.clone();

        // Spawn watcher task
        let handle = tokio::spawn(async move {
            run_watcher(config, watcher, fs_rx, event_tx, &mut stop_rx).await;
        });

        Ok((
            event_rx,
            WatchHandle {
                stop_tx,
                task: handle,
            },
        ))
    }
}

/// Handle to control the watcher
pub struct WatchHandle {
    stop_tx: mpsc::Sender<()>,
    task: tokio::task::JoinHandle<()>,
}

impl WatchHandle {
    /// Stop the watcher
    pub async fn stop(self) -> Result<()> {
        let _ = self.stop_tx.send(()).await;
        self.task.await?;
        Ok(())
    }
}

/// Internal watcher loop
async fn run_watcher(
    config: WatcherConfig,
    _watcher: RecommendedWatcher,
    fs_rx: std::sync::mpsc::Receiver<notify::Result<Event>>,
    event_tx: mpsc::Sender<RecordingEvent>,
    stop_rx: &mut mpsc::Receiver<()>,
) {
    // Files being stabilized
    let mut pending: HashMap<PathBuf, PendingRecording> = HashMap::new();
    let stability_delay = Duration::from_secs(config.stability_delay_secs);

    tracing::info!("Watching {} for .{} recordings", config.watch_path.display(), config.extension);

    loop {
        if stop_rx.try_recv().is_ok() {
            tracing::info!("Watcher stopping...");
            break;
        }

        // Drain file events without blocking the runtime
        loop {
            match fs_rx.try_recv() {
                Ok(Ok(event)) => {
                    for path in config.created_recordings(&event) {
                        tracing::debug!("Recording created: {}", path.display());
                        let size = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
                        pending.insert(path, PendingRecording::new(size, Instant::now()));
                    }
                }
                Ok(Err(e)) => tracing::warn!("Watcher error: {:?}", e),
                Err(std::sync::mpsc::TryRecvError::Empty) => break,
                Err(std::sync::mpsc::TryRecvError::Disconnected) => {
                    tracing::error!("Watcher channel disconnected");
                    return;
                }
            }
        }

        // Check for stable files
        let now = Instant::now();
        let mut settled = Vec::new();

        for (path, recording) in pending.iter_mut() {
            let current = std::fs::metadata(path).ok().map(|m| m.len());
            match recording.check(current, now, stability_delay) {
                Stability::Waiting => {}
                outcome => settled.push((path.clone(), outcome)),
            }
        }

        for (path, outcome) in settled {
            pending.remove(&path);
            let size = match outcome {
                Stability::Ready(size) => size,
                Stability::Gone => {
                    tracing::debug!("Recording disappeared: {}", path.display());
                    continue;
                }
                Stability::Abandoned => {
                    tracing::debug!("Recording still empty, giving up: {}", path.display());
                    continue;
                }
                Stability::Waiting => continue,
            };

            tracing::info!("New recording ready: {}", path.display());
            let event = RecordingEvent {
                path,
                size,
                detected_at: Utc::now(),
            };
            if event_tx.send(event).await.is_err() {
                return;
            }
        }

        // Small sleep to prevent busy loop
        tokio::time::sleep(Duration::from_millis(250)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind, RemoveKind};
    use tempfile::TempDir;

    fn config() -> WatcherConfig {
        WatcherConfig::for_directory(PathBuf::from("/vault"))
    }

    #[test]
    fn test_default_extension() {
        let config = config();
        assert_eq!(config.extension, "webm");
        assert!(config.recursive);
    }

    #[test]
    fn test_is_recording_ignores_case() {
        let config = config();
        assert!(config.is_recording(Path::new("/vault/Recording 20240101.webm")));
        assert!(config.is_recording(Path::new("/vault/Recording 20240101.WEBM")));
        assert!(!config.is_recording(Path::new("/vault/note.md")));
        assert!(!config.is_recording(Path::new("/vault/webm")));
    }

    #[test]
    fn test_only_create_events_count() {
        let config = config();
        let path = PathBuf::from("/vault/Recording 20240101.webm");

        let created = Event::new(EventKind::Create(CreateKind::File)).add_path(path.clone());
        assert_eq!(config.created_recordings(&created), vec![path.clone()]);

        let modified = Event::new(EventKind::Modify(ModifyKind::Any)).add_path(path.clone());
        assert!(config.created_recordings(&modified).is_empty());

        let removed = Event::new(EventKind::Remove(RemoveKind::File)).add_path(path);
        assert!(config.created_recordings(&removed).is_empty());
    }

    #[test]
    fn test_create_event_filters_extension() {
        let config = config();
        let event = Event::new(EventKind::Create(CreateKind::Any))
            .add_path(PathBuf::from("/vault/a.webm"))
            .add_path(PathBuf::from("/vault/b.md"));

        assert_eq!(config.created_recordings(&event), vec![PathBuf::from("/vault/a.webm")]);
    }

    #[test]
    fn test_stable_recording_is_ready() {
        let delay = Duration::from_secs(2);
        let start = Instant::now();
        let mut recording = PendingRecording::new(100, start);

        assert_eq!(recording.check(Some(100), start + Duration::from_secs(1), delay), Stability::Waiting);
        assert_eq!(recording.check(Some(100), start + delay, delay), Stability::Ready(100));
    }

    #[test]
    fn test_growing_recording_restarts_clock() {
        let delay = Duration::from_secs(2);
        let start = Instant::now();
        let mut recording = PendingRecording::new(100, start);

        assert_eq!(recording.check(Some(250), start + delay, delay), Stability::Waiting);
        assert_eq!(recording.check(Some(250), start + delay * 3 / 2, delay), Stability::Waiting);
        assert_eq!(recording.check(Some(250), start + delay * 2, delay), Stability::Ready(250));
    }

    #[test]
    fn test_empty_recording_is_abandoned() {
        let delay = Duration::from_secs(2);
        let start = Instant::now();
        let mut recording = PendingRecording::new(0, start);

        for window in 1..MAX_EMPTY_CHECKS {
            assert_eq!(recording.check(Some(0), start + delay * window, delay), Stability::Waiting);
        }
        assert_eq!(
            recording.check(Some(0), start + delay * MAX_EMPTY_CHECKS, delay),
            Stability::Abandoned
        );
    }

    #[test]
    fn test_late_audio_resets_empty_count() {
        let delay = Duration::from_secs(2);
        let start = Instant::now();
        let mut recording = PendingRecording::new(0, start);

        for window in 1..MAX_EMPTY_CHECKS {
            recording.check(Some(0), start + delay * window, delay);
        }
        let written = start + delay * MAX_EMPTY_CHECKS;
        assert_eq!(recording.check(Some(64), written, delay), Stability::Waiting);
        assert_eq!(recording.check(Some(64), written + delay, delay), Stability::Ready(64));
    }

    #[test]
    fn test_vanished_recording_is_gone() {
        let delay = Duration::from_secs(2);
        let start = Instant::now();
        let mut recording = PendingRecording::new(100, start);

        assert_eq!(recording.check(None, start + delay, delay), Stability::Gone);
    }

    #[test]
    fn test_missing_directory_is_rejected() {
        let temp = TempDir::new().unwrap();
        let watcher = RecordingWatcher::with_config(WatcherConfig::for_directory(temp.path().join("missing")));

        assert!(matches!(watcher.watch(), Err(WatcherError::DirectoryNotFound(_))));
    }
}
