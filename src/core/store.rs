use chrono::{DateTime, Local};
use log::{debug, error, info, warn};
use std::fs::{self, File, OpenOptions};
use std::io::{self, ErrorKind, Write};
use std::path::{Path, PathBuf};

use crate::core::model::Snapshot;
use crate::error::WatchError;

pub const LATEST_FILE: &str = "latest.json";
pub const HISTORY_PREFIX: &str = "gmgn_data_";

/// Outcome of [`SnapshotStore::persist`]. Failures are reported, never raised.
#[derive(Debug)]
pub enum PersistResult {
    Saved { history: PathBuf, latest: PathBuf },
    Failed(WatchError),
}

impl PersistResult {
    pub fn is_saved(&self) -> bool {
        matches!(self, PersistResult::Saved { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotFile {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
}

/// `gmgn_data_YYYYMMDD_HHMMSS_mmm.json`
pub fn history_file_name(at: DateTime<Local>) -> String {
    format!("{}{}.json", HISTORY_PREFIX, at.format("%Y%m%d_%H%M%S_%3f"))
}

/// Flat-file snapshot storage: one history file per collection plus `latest.json`.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
}

impl SnapshotStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn latest_path(&self) -> PathBuf {
        self.dir.join(LATEST_FILE)
    }

    pub fn persist(&self, snapshot: &Snapshot) -> PersistResult {
        match self.try_persist(snapshot) {
            Ok((history, latest)) => {
                info!(
                    "Saved {} records to {}",
                    snapshot.len(),
                    history.display()
                );
                PersistResult::Saved { history, latest }
            }
            Err(e) => {
                error!("Failed to save snapshot in {}: {}", self.dir.display(), e);
                PersistResult::Failed(e)
            }
        }
    }

    pub fn try_persist(&self, snapshot: &Snapshot) -> Result<(PathBuf, PathBuf), WatchError> {
        self.try_persist_at(snapshot, Local::now())
    }

    /// Writes `snapshot` as a history file named after `at` and replaces `latest.json`.
    ///
    /// History files are created, never truncated: if the name for `at` is
    /// taken, `at` moves forward one millisecond until a free name is found.
    pub fn try_persist_at(
        &self,
        snapshot: &Snapshot,
        at: DateTime<Local>,
    ) -> Result<(PathBuf, PathBuf), WatchError> {
        fs::create_dir_all(&self.dir)?;
        let bytes = serde_json::to_vec_pretty(snapshot)?;

        let history = self.write_history(at, |file| file.write_all(&bytes))?;
        let latest = self.replace_latest(&bytes)?;

        Ok((history, latest))
    }

    /// Creates the history file for `at` and fills it with `write`.
    /// A file whose write fails is removed again.
    fn write_history<F>(&self, mut at: DateTime<Local>, mut write: F) -> Result<PathBuf, WatchError>
    where
        F: FnMut(&mut File) -> io::Result<()>,
    {
        loop {
            let path = self.dir.join(history_file_name(at));
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    if let Err(e) = write(&mut file) {
                        drop(file);
                        discard(&path);
                        return Err(e.into());
                    }
                    return Ok(path);
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    debug!("{} already exists, trying next millisecond", path.display());
                    at += chrono::Duration::milliseconds(1);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    /// Writes a sibling temp file and renames it over `latest.json`, so readers
    /// see either the previous snapshot or the new one, never a partial file.
    fn replace_latest(&self, bytes: &[u8]) -> Result<PathBuf, WatchError> {
        let latest = self.latest_path();
        let temp = self
            .dir
            .join(format!(".{}.{}.tmp", LATEST_FILE, std::process::id()));

        if let Err(e) = fs::write(&temp, bytes) {
            discard(&temp);
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&temp, &latest) {
            discard(&temp);
            return Err(e.into());
        }
        Ok(latest)
    }

    pub fn load(&self, path: &Path) -> Result<Snapshot, WatchError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    /// The most recent snapshot, or an empty one when `latest.json` is absent or unreadable.
    pub fn load_latest(&self) -> Snapshot {
        let path = self.latest_path();
        if !path.exists() {
            debug!("{} not found, no data yet", path.display());
            return Snapshot::default();
        }
        match self.load(&path) {
            Ok(snapshot) => snapshot,
            Err(e) => {
                error!("Failed to load {}: {}", path.display(), e);
                Snapshot::default()
            }
        }
    }

    pub fn list_files(&self) -> Result<Vec<SnapshotFile>, WatchError> {
        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().into_owned();
            let is_snapshot = name == LATEST_FILE
                || (name.starts_with(HISTORY_PREFIX) && name.ends_with(".json"));
            if !is_snapshot {
                continue;
            }
            let metadata = entry.metadata()?;
            if !metadata.is_file() {
                continue;
            }
            files.push(SnapshotFile {
                name,
                path: entry.path(),
                size: metadata.len(),
            });
        }
        files.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(files)
    }
}

fn discard(path: &Path) {
    if let Err(e) = fs::remove_file(path) {
        if e.kind() != ErrorKind::NotFound {
            warn!("Could not remove {}: {}", path.display(), e);
        }
    }
}
