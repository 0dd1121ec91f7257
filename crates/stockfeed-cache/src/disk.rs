//! Persistent JSON store for cached tables.
//!
//! Layout: `{dir}/{fingerprint}.json`, one file per entry, written to a
//! `.tmp` sibling first and renamed into place.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use stockfeed_types::{FeedError, Result, Table};
use tracing::{debug, warn};

use crate::Fingerprint;

/// One persisted cache entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiskEntry {
    /// Hex fingerprint the entry is stored under.
    pub fingerprint: String,
    /// When the entry was written.
    pub created_at: DateTime<Utc>,
    /// When the entry stops being served.
    pub expires_at: DateTime<Utc>,
    /// The cached table.
    pub table: Table,
}

impl DiskEntry {
    /// Returns the time left before expiry, or None if already expired.
    #[must_use]
    pub fn remaining(&self, now: DateTime<Utc>) -> Option<Duration> {
        (self.expires_at - now)
            .to_std()
            .ok()
            .filter(|left| !left.is_zero())
    }
}

/// Directory of persisted cache entries.
#[derive(Debug, Clone)]
pub struct DiskStore {
    dir: PathBuf,
}

impl DiskStore {
    /// Opens a store rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| {
            FeedError::Cache(format!("create cache dir {}: {e}", dir.display()))
        })?;
        Ok(Self { dir })
    }

    /// Returns the platform cache directory for stockfeed.
    ///
    /// - Linux: `~/.cache/stockfeed/`
    /// - macOS: `~/Library/Caches/stockfeed/`
    /// - Windows: `C:\Users\<User>\AppData\Local\stockfeed\cache\`
    ///
    /// Falls back to `~/.stockfeed/cache/` when no platform location exists.
    #[must_use]
    pub fn default_dir() -> PathBuf {
        ProjectDirs::from("", "", "stockfeed").map_or_else(dirs_fallback, |proj_dirs| {
            proj_dirs.cache_dir().to_path_buf()
        })
    }

    /// Opens a store at [`DiskStore::default_dir`].
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created.
    pub fn with_default_dir() -> Result<Self> {
        Self::new(Self::default_dir())
    }

    /// Returns the store directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Returns the file path for a fingerprint.
    #[must_use]
    pub fn entry_path(&self, fingerprint: &Fingerprint) -> PathBuf {
        self.dir.join(format!("{fingerprint}.json"))
    }

    /// Reads a live entry.
    ///
    /// Expired, unreadable and corrupt files are removed and reported as
    /// absent.
    #[must_use]
    pub fn load(&self, fingerprint: &Fingerprint) -> Option<DiskEntry> {
        let path = self.entry_path(fingerprint);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "unreadable cache file");
                Self::discard(&path);
                return None;
            }
        };

        let entry: DiskEntry = match serde_json::from_str(&content) {
            Ok(entry) => entry,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "corrupt cache file");
                Self::discard(&path);
                return None;
            }
        };

        if entry.remaining(Utc::now()).is_none() {
            debug!(path = %path.display(), "expired cache file");
            Self::discard(&path);
            return None;
        }
        Some(entry)
    }

    /// Writes an entry that expires after `ttl`.
    ///
    /// # Errors
    ///
    /// Returns an error if the entry cannot be serialized or written.
    pub fn save(&self, fingerprint: &Fingerprint, table: &Table, ttl: Duration) -> Result<()> {
        let created_at = Utc::now();
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| FeedError::Cache(format!("ttl out of range: {e}")))?;
        let entry = DiskEntry {
            fingerprint: fingerprint.to_hex(),
            created_at,
            expires_at: created_at + ttl,
            table: table.clone(),
        };
        let json = serde_json::to_vec(&entry)?;

        let path = self.entry_path(fingerprint);
        let tmp_path = path.with_extension("json.tmp");
        fs::write(&tmp_path, json)
            .map_err(|e| FeedError::Cache(format!("write {}: {e}", tmp_path.display())))?;

        fs::rename(&tmp_path, &path).map_err(|e| {
            let _ = fs::remove_file(&tmp_path);
            FeedError::Cache(format!("rename into {}: {e}", path.display()))
        })
    }

    /// Deletes one entry, returning whether a file was removed.
    ///
    /// # Errors
    ///
    /// Returns an error if an existing file cannot be deleted.
    pub fn remove(&self, fingerprint: &Fingerprint) -> Result<bool> {
        let path = self.entry_path(fingerprint);
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(FeedError::Cache(format!("remove {}: {e}", path.display()))),
        }
    }

    /// Deletes every entry file in the store.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed or a file cannot be
    /// deleted.
    pub fn clear(&self) -> Result<usize> {
        let mut removed = 0;
        for path in self.entry_files()? {
            fs::remove_file(&path)
                .map_err(|e| FeedError::Cache(format!("remove {}: {e}", path.display())))?;
            removed += 1;
        }
        Ok(removed)
    }

    /// Deletes expired and corrupt entry files, returning how many went.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be listed.
    pub fn purge_expired(&self) -> Result<usize> {
        let now = Utc::now();
        let mut removed = 0;
        for path in self.entry_files()? {
            let live = fs::read_to_string(&path)
                .ok()
                .and_then(|content| serde_json::from_str::<DiskEntry>(&content).ok())
                .is_some_and(|entry| entry.remaining(now).is_some());
            if !live {
                Self::discard(&path);
                removed += 1;
            }
        }
        Ok(removed)
    }

    fn entry_files(&self) -> Result<Vec<PathBuf>> {
        let entries = fs::read_dir(&self.dir)
            .map_err(|e| FeedError::Cache(format!("read dir {}: {e}", self.dir.display())))?;

        let mut files = Vec::new();
        for entry in entries {
            let path = entry
                .map_err(|e| FeedError::Cache(format!("read dir {}: {e}", self.dir.display())))?
                .path();
            if path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        Ok(files)
    }

    fn discard(path: &Path) {
        if let Err(e) = fs::remove_file(path)
            && e.kind() != std::io::ErrorKind::NotFound
        {
            warn!(path = %path.display(), error = %e, "could not remove cache file");
        }
    }
}

fn dirs_fallback() -> PathBuf {
    std::env::var("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("."))
        .join(".stockfeed")
        .join("cache")
}
