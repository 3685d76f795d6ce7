//! Anonymous usage counter.
//!
//! The count is advisory: it lives on the user's machine and only gates how
//! many anonymous generations this client attempts.

use camino::{Utf8Path, Utf8PathBuf};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::{self, OpenOptions};
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicU32, Ordering};
use tracing::debug;

use studyforge_utils::atomic_write::write_file_atomic;
use studyforge_utils::error::UsageError;

/// Read and bump the number of anonymous generations used.
pub trait UsageCounter: Send + Sync {
    fn get(&self) -> Result<u32, UsageError>;

    /// Increment the count and return the new value.
    fn increment(&self) -> Result<u32, UsageError>;
}

/// Process-local counter.
#[derive(Debug, Default)]
pub struct InMemoryUsageCounter {
    count: AtomicU32,
}

impl InMemoryUsageCounter {
    #[must_use]
    pub fn starting_at(count: u32) -> Self {
        Self {
            count: AtomicU32::new(count),
        }
    }
}

impl UsageCounter for InMemoryUsageCounter {
    fn get(&self) -> Result<u32, UsageError> {
        Ok(self.count.load(Ordering::SeqCst))
    }

    fn increment(&self) -> Result<u32, UsageError> {
        Ok(self.count.fetch_add(1, Ordering::SeqCst).saturating_add(1))
    }
}

/// On-disk record.
#[derive(Debug, Default, Serialize, Deserialize)]
struct UsageRecord {
    anonymous_uses: u32,
    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

/// Counter persisted as JSON, guarded by an advisory lock file.
#[derive(Debug, Clone)]
pub struct FileUsageCounter {
    path: Utf8PathBuf,
}

impl FileUsageCounter {
    /// # Errors
    ///
    /// Returns `UsageError::Corrupt` if the path is not valid UTF-8.
    pub fn new(path: impl AsRef<Path>) -> Result<Self, UsageError> {
        let path = path.as_ref();
        let path = Utf8PathBuf::from_path_buf(path.to_path_buf()).map_err(|p| {
            UsageError::Corrupt {
                path: p.display().to_string(),
                reason: "path is not valid UTF-8".to_string(),
            }
        })?;
        Ok(Self { path })
    }

    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    fn io_error(&self, source: io::Error) -> UsageError {
        UsageError::Io {
            path: self.path.to_string(),
            source,
        }
    }

    /// Run `f` while holding an exclusive lock on `<path>.lock`.
    fn with_lock<R>(&self, f: impl FnOnce() -> Result<R, UsageError>) -> Result<R, UsageError> {
        if let Some(parent) = self.path.parent()
            && !parent.as_str().is_empty()
        {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(format!("{}.lock", self.path))
            .map_err(|e| self.io_error(e))?;
        let mut lock = fd_lock::RwLock::new(lock_file);
        let _guard = lock.write().map_err(|e| self.io_error(e))?;
        f()
    }

    fn read_record(&self) -> Result<UsageRecord, UsageError> {
        match fs::read_to_string(&self.path) {
            Ok(content) if content.trim().is_empty() => Ok(UsageRecord::default()),
            Ok(content) => serde_json::from_str(&content).map_err(|e| UsageError::Corrupt {
                path: self.path.to_string(),
                reason: e.to_string(),
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(UsageRecord::default()),
            Err(e) => Err(self.io_error(e)),
        }
    }

    fn write_record(&self, record: &UsageRecord) -> Result<(), UsageError> {
        let json = serde_json::to_string_pretty(record).map_err(|e| UsageError::Corrupt {
            path: self.path.to_string(),
            reason: e.to_string(),
        })?;
        write_file_atomic(&self.path, &json)
            .map_err(|e| self.io_error(io::Error::other(e.to_string())))
    }
}

impl UsageCounter for FileUsageCounter {
    fn get(&self) -> Result<u32, UsageError> {
        self.with_lock(|| Ok(self.read_record()?.anonymous_uses))
    }

    fn increment(&self) -> Result<u32, UsageError> {
        self.with_lock(|| {
            let mut record = self.read_record()?;
            record.anonymous_uses = record.anonymous_uses.saturating_add(1);
            record.updated_at = Some(Utc::now());
            self.write_record(&record)?;
            debug!(path = %self.path, uses = record.anonymous_uses, "Recorded anonymous use");
            Ok(record.anonymous_uses)
        })
    }
}
