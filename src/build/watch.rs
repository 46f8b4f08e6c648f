//! File watching for automatic rebuilds.
//!
//! Two backends report changed template files through the same callback:
//! - `Poll` stats every tracked file on a fixed interval and compares size
//!   and modification time against the previous observation.
//! - `Native` uses `notify-debouncer-full` for file system events.
//!
//! The polling backend tracks the files present when it started; files
//! created later are not picked up.

use std::collections::HashMap;
use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::time::{Duration, SystemTime};

use notify::event::ModifyKind;
use notify::{EventKind, RecommendedWatcher, RecursiveMode};
use notify_debouncer_full::{DebounceEventResult, Debouncer, RecommendedCache, new_debouncer};

use super::paths::matches_extension;
use super::walk::{self, WalkError};
use crate::config::{WatchBackend, WatchConfig};

/// How often the native backend checks for a stop request while idle.
const STOP_CHECK_INTERVAL: Duration = Duration::from_millis(250);

// =============================================================================
// Errors
// =============================================================================

#[derive(thiserror::Error, Debug)]
pub enum WatchError {
    #[error("watch directory does not exist: {0}")]
    DirectoryNotFound(PathBuf),

    #[error("failed to enumerate watch files: {0}")]
    Walk(#[from] WalkError),

    #[error("notify error: {0}")]
    Notify(#[from] notify::Error),
}

// =============================================================================
// Change detection
// =============================================================================

/// A stat snapshot of one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub path: PathBuf,
    pub size: u64,
    pub modified: SystemTime,
}

impl FileInfo {
    pub fn stat(path: &Path) -> std::io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            size: metadata.len(),
            modified: metadata.modified()?,
        })
    }

    fn differs_from(&self, other: &FileInfo) -> bool {
        self.size != other.size || self.modified != other.modified
    }
}

/// Last observation of every tracked file.
#[derive(Debug, Default, Clone)]
pub struct WatchState {
    baselines: HashMap<PathBuf, FileInfo>,
}

impl WatchState {
    /// Fold a new snapshot into the state.
    ///
    /// A file seen for the first time only records its baseline. A file
    /// whose size or modification time differs from its baseline is
    /// reported and becomes the new baseline. Files absent from the
    /// snapshot keep their previous baseline.
    pub fn advance(mut self, snapshot: Vec<FileInfo>) -> (Self, Vec<FileInfo>) {
        let mut changed = Vec::new();
        for info in snapshot {
            match self.baselines.get(&info.path) {
                None => {
                    self.baselines.insert(info.path.clone(), info);
                }
                Some(previous) if info.differs_from(previous) => {
                    changed.push(info.clone());
                    self.baselines.insert(info.path.clone(), info);
                }
                Some(_) => {}
            }
        }
        (self, changed)
    }

    #[cfg(test)]
    pub fn get(&self, path: &Path) -> Option<&FileInfo> {
        self.baselines.get(path)
    }

    pub fn len(&self) -> usize {
        self.baselines.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.baselines.is_empty()
    }
}

// =============================================================================
// Polling watcher
// =============================================================================

/// Stats a fixed set of files on an interval.
#[derive(Debug)]
pub struct PollWatcher {
    files: Vec<PathBuf>,
    interval: Duration,
}

impl PollWatcher {
    /// Enumerate the files to track under `dirs`. An empty `extensions`
    /// list tracks every file.
    pub fn new(
        dirs: &[PathBuf],
        extensions: &[String],
        interval: Duration,
    ) -> Result<Self, WatchError> {
        let mut files = Vec::new();
        for dir in dirs {
            require_dir(dir)?;
            files.extend(
                walk::files(dir, &[])?
                    .into_iter()
                    .filter(|path| matches_extension(path, extensions)),
            );
        }
        files.sort();
        files.dedup();

        Ok(Self { files, interval })
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Run one poll cycle: stat every tracked file and advance `state`.
    pub fn poll(&self, state: WatchState) -> (WatchState, Vec<FileInfo>) {
        let snapshot = self
            .files
            .iter()
            .filter_map(|path| match FileInfo::stat(path) {
                Ok(info) => Some(info),
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to stat watched file");
                    None
                }
            })
            .collect();
        state.advance(snapshot)
    }

    /// Poll until `stop` receives a message or its sender is dropped.
    pub fn run<F, E>(self, mut on_change: F, stop: Receiver<()>)
    where
        F: FnMut(&FileInfo) -> Result<(), E>,
        E: Display,
    {
        tracing::debug!(files = self.files().len(), interval = ?self.interval, "polling for changes");
        let (mut state, _) = self.poll(WatchState::default());
        tracing::debug!(tracked = state.len(), "recorded baseline");
        loop {
            match stop.recv_timeout(self.interval) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }

            let (next, changed) = self.poll(state);
            state = next;
            for info in &changed {
                dispatch(&mut on_change, info);
            }
        }
    }
}

// =============================================================================
// Native watcher
// =============================================================================

/// File system event watcher with debouncing.
pub struct NativeWatcher {
    _debouncer: Debouncer<RecommendedWatcher, RecommendedCache>,
    rx: Receiver<DebounceEventResult>,
    extensions: Vec<String>,
}

impl NativeWatcher {
    pub fn new(
        dirs: &[PathBuf],
        extensions: &[String],
        debounce: Duration,
    ) -> Result<Self, WatchError> {
        let (tx, rx) = mpsc::channel();
        let mut debouncer = new_debouncer(debounce, None, tx)?;
        for dir in dirs {
            require_dir(dir)?;
            debouncer.watch(dir, RecursiveMode::Recursive)?;
        }

        Ok(Self {
            _debouncer: debouncer,
            rx,
            extensions: extensions.to_vec(),
        })
    }

    /// Forward matching events until `stop` receives a message or its
    /// sender is dropped.
    pub fn run<F, E>(self, mut on_change: F, stop: Receiver<()>)
    where
        F: FnMut(&FileInfo) -> Result<(), E>,
        E: Display,
    {
        loop {
            match stop.try_recv() {
                Err(TryRecvError::Empty) => {}
                Ok(()) | Err(TryRecvError::Disconnected) => break,
            }

            match self.rx.recv_timeout(STOP_CHECK_INTERVAL) {
                Ok(Ok(events)) => {
                    let mut paths: Vec<&PathBuf> = events
                        .iter()
                        .filter(|event| is_relevant_event(&event.kind))
                        .flat_map(|event| event.paths.iter())
                        .filter(|path| !is_hidden(path))
                        .filter(|path| matches_extension(path, &self.extensions))
                        .collect();
                    paths.sort();
                    paths.dedup();

                    for path in paths {
                        match FileInfo::stat(path) {
                            Ok(info) => dispatch(&mut on_change, &info),
                            // Removed again before we got to it
                            Err(e) => {
                                tracing::debug!(path = %path.display(), error = %e, "skipping vanished file")
                            }
                        }
                    }
                }
                Ok(Err(errors)) => {
                    for e in errors {
                        tracing::warn!(error = %e, "watch error");
                    }
                }
                Err(RecvTimeoutError::Timeout) => continue,
                Err(RecvTimeoutError::Disconnected) => break,
            }
        }
    }
}

// =============================================================================
// Backend selection
// =============================================================================

/// A file watcher using either backend.
pub enum FileWatcher {
    Poll(PollWatcher),
    Native(NativeWatcher),
}

impl FileWatcher {
    pub fn new(
        dirs: &[PathBuf],
        extensions: &[String],
        config: &WatchConfig,
    ) -> Result<Self, WatchError> {
        match config.backend {
            WatchBackend::Poll => Ok(FileWatcher::Poll(PollWatcher::new(
                dirs,
                extensions,
                Duration::from_millis(config.poll_interval_ms),
            )?)),
            WatchBackend::Native => Ok(FileWatcher::Native(NativeWatcher::new(
                dirs,
                extensions,
                Duration::from_millis(config.debounce_ms),
            )?)),
        }
    }

    /// Block, calling `on_change` for every changed file, until stopped.
    /// Callback errors are logged and never end the watch.
    pub fn run<F, E>(self, on_change: F, stop: Receiver<()>)
    where
        F: FnMut(&FileInfo) -> Result<(), E>,
        E: Display,
    {
        match self {
            FileWatcher::Poll(watcher) => watcher.run(on_change, stop),
            FileWatcher::Native(watcher) => watcher.run(on_change, stop),
        }
    }
}

fn dispatch<F, E>(on_change: &mut F, info: &FileInfo)
where
    F: FnMut(&FileInfo) -> Result<(), E>,
    E: Display,
{
    if let Err(e) = on_change(info) {
        tracing::error!(path = %info.path.display(), error = %e, "change handler failed");
    }
}

fn require_dir(dir: &Path) -> Result<(), WatchError> {
    if dir.is_dir() {
        Ok(())
    } else {
        Err(WatchError::DirectoryNotFound(dir.to_path_buf()))
    }
}

fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .is_some_and(|n| n.to_string_lossy().starts_with('.'))
}

/// Check if an event kind is relevant for rebuilds.
fn is_relevant_event(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Create(_)
            | EventKind::Modify(ModifyKind::Data(_))
            | EventKind::Modify(ModifyKind::Name(_))
            | EventKind::Modify(ModifyKind::Any)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn info(path: &str, size: u64, secs: u64) -> FileInfo {
        FileInfo {
            path: PathBuf::from(path),
            size,
            modified: SystemTime::UNIX_EPOCH + Duration::from_secs(secs),
        }
    }

    fn append(path: &Path, data: &str) {
        let mut file = std::fs::OpenOptions::new().append(true).open(path).unwrap();
        file.write_all(data.as_bytes()).unwrap();
    }

    #[test]
    fn test_first_observation_is_baseline() {
        let (state, changed) = WatchState::default().advance(vec![info("a", 1, 1), info("b", 2, 2)]);
        assert!(changed.is_empty());
        assert!(!state.is_empty());
        assert_eq!(state.len(), 2);
        assert_eq!(state.get(Path::new("a")), Some(&info("a", 1, 1)));
    }

    #[test]
    fn test_unchanged_never_fires() {
        let (mut state, _) = WatchState::default().advance(vec![info("a", 1, 1)]);
        for _ in 0..3 {
            let (next, changed) = state.advance(vec![info("a", 1, 1)]);
            assert!(changed.is_empty());
            state = next;
        }
    }

    #[test]
    fn test_size_change_fires_once() {
        let (state, _) = WatchState::default().advance(vec![info("a", 1, 1)]);
        let (state, changed) = state.advance(vec![info("a", 5, 1)]);
        assert_eq!(changed, vec![info("a", 5, 1)]);
        let (_, changed) = state.advance(vec![info("a", 5, 1)]);
        assert!(changed.is_empty());
    }

    #[test]
    fn test_mtime_change_fires_with_new_values() {
        let (state, _) = WatchState::default().advance(vec![info("a", 1, 1), info("b", 1, 1)]);
        let (state, changed) = state.advance(vec![info("a", 1, 9), info("b", 1, 1)]);
        assert_eq!(changed, vec![info("a", 1, 9)]);
        assert_eq!(state.get(Path::new("a")), Some(&info("a", 1, 9)));
    }

    #[test]
    fn test_missing_file_keeps_baseline() {
        let (state, _) = WatchState::default().advance(vec![info("a", 1, 1)]);
        let (state, changed) = state.advance(vec![]);
        assert!(changed.is_empty());
        let (_, changed) = state.advance(vec![info("a", 1, 1)]);
        assert!(changed.is_empty());
    }

    #[test]
    fn test_poll_watcher_missing_dir() {
        let tmp = TempDir::new().unwrap();
        let err = PollWatcher::new(&[tmp.path().join("missing")], &[], Duration::from_secs(1))
            .unwrap_err();
        assert!(matches!(err, WatchError::DirectoryNotFound(_)));
    }

    #[test]
    fn test_poll_watcher_extension_filter() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().to_path_buf();
        std::fs::create_dir_all(dir.join("layouts")).unwrap();
        std::fs::write(dir.join("index.tmpl"), "").unwrap();
        std::fs::write(dir.join("layouts/default.tmpl"), "").unwrap();
        std::fs::write(dir.join("notes.md"), "").unwrap();

        let tmpl = PollWatcher::new(
            std::slice::from_ref(&dir),
            &[".tmpl".to_string()],
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(
            tmpl.files(),
            &[dir.join("index.tmpl"), dir.join("layouts/default.tmpl")]
        );

        let all = PollWatcher::new(std::slice::from_ref(&dir), &[], Duration::from_secs(1)).unwrap();
        assert_eq!(all.files().len(), 3);
    }

    #[test]
    fn test_poll_detects_write() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().to_path_buf();
        let file = dir.join("index.tmpl");
        std::fs::write(&file, "v1").unwrap();

        let watcher = PollWatcher::new(&[dir], &[], Duration::from_secs(1)).unwrap();
        let (state, changed) = watcher.poll(WatchState::default());
        assert!(changed.is_empty());

        append(&file, " and more");
        let (state, changed) = watcher.poll(state);
        assert_eq!(changed.len(), 1);
        assert_eq!(changed[0].path, file);
        assert_eq!(changed[0].size, "v1 and more".len() as u64);

        let (_, changed) = watcher.poll(state);
        assert!(changed.is_empty());
    }

    #[test]
    fn test_run_survives_handler_errors_and_stops() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().to_path_buf();
        let file = dir.join("index.tmpl");
        std::fs::write(&file, "v1").unwrap();

        let watcher = PollWatcher::new(&[dir], &[], Duration::from_millis(10)).unwrap();
        let (stop_tx, stop_rx) = mpsc::channel();
        let (seen_tx, seen_rx) = mpsc::channel();

        let handle = std::thread::spawn(move || {
            watcher.run(
                |info: &FileInfo| {
                    seen_tx.send(info.size).unwrap();
                    Err::<(), _>("handler failed")
                },
                stop_rx,
            )
        });

        // Let the first cycle record the baseline
        std::thread::sleep(Duration::from_millis(100));
        append(&file, "2");
        let first = seen_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(first, 3);

        // The failed handler did not end the loop
        append(&file, "3");
        let second = seen_rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(second, 4);

        stop_tx.send(()).unwrap();
        handle.join().unwrap();
    }
}
