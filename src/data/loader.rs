//! CSV Data Loader Module
//! Parses CSV files with Polars and memoizes the parsed frames by path.

use log::{debug, info};
use polars::prelude::*;
use std::collections::HashMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::SystemTime;
use thiserror::Error;

/// Raised when a dataset cannot be produced for a render.
#[derive(Error, Debug)]
pub enum DataUnavailable {
    #[error("Data file not found: {}", path.display())]
    NotFound { path: PathBuf },
    #[error("Cannot access {}: {source}", path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Failed to parse {} as CSV: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: PolarsError,
    },
    #[error("{} is missing required column '{column}'", path.display())]
    MissingColumn { path: PathBuf, column: String },
    #[error("{} column '{column}' row {row}: {reason}", path.display())]
    InvalidValue {
        path: PathBuf,
        column: String,
        row: usize,
        reason: String,
    },
}

impl DataUnavailable {
    pub fn path(&self) -> &Path {
        match self {
            Self::NotFound { path }
            | Self::Unreadable { path, .. }
            | Self::Parse { path, .. }
            | Self::MissingColumn { path, .. }
            | Self::InvalidValue { path, .. } => path,
        }
    }
}

struct CacheEntry {
    modified: Option<SystemTime>,
    frame: Arc<DataFrame>,
}

/// Path-keyed cache of parsed CSV frames.
///
/// Entries are immutable once inserted and live for the process lifetime.
/// A cached frame is reused until the file's modification time changes or the
/// entry is invalidated. Two threads missing on the same path both parse; the
/// first insert wins and the other thread receives that entry.
#[derive(Default)]
pub struct TableCache {
    entries: RwLock<HashMap<PathBuf, CacheEntry>>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load a CSV file, returning the cached frame when it is still fresh.
    pub fn load(&self, path: &Path) -> Result<Arc<DataFrame>, DataUnavailable> {
        let modified = Self::modified_time(path)?;

        if let Some(frame) = self.lookup(path, modified) {
            debug!("Cache hit for {}", path.display());
            return Ok(frame);
        }

        let frame = Arc::new(Self::parse_csv(path)?);
        info!(
            "Parsed {}: {} rows, {} columns",
            path.display(),
            frame.height(),
            frame.width()
        );

        let mut entries = self
            .entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if let Some(existing) = entries.get(path) {
            if existing.modified == modified {
                return Ok(Arc::clone(&existing.frame));
            }
        }
        entries.insert(
            path.to_path_buf(),
            CacheEntry {
                modified,
                frame: Arc::clone(&frame),
            },
        );
        Ok(frame)
    }

    /// Drop the entry for `path`. Returns whether an entry was present.
    pub fn invalidate(&self, path: &Path) -> bool {
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .remove(path)
            .is_some()
    }

    pub fn clear(&self) {
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clear();
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup(&self, path: &Path, modified: Option<SystemTime>) -> Option<Arc<DataFrame>> {
        let entries = self
            .entries
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries
            .get(path)
            .filter(|entry| entry.modified == modified)
            .map(|entry| Arc::clone(&entry.frame))
    }

    fn modified_time(path: &Path) -> Result<Option<SystemTime>, DataUnavailable> {
        match path.metadata() {
            Ok(meta) if meta.is_file() => Ok(meta.modified().ok()),
            Ok(_) => Err(DataUnavailable::NotFound {
                path: path.to_path_buf(),
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(DataUnavailable::NotFound {
                path: path.to_path_buf(),
            }),
            Err(source) => Err(DataUnavailable::Unreadable {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    fn parse_csv(path: &Path) -> Result<DataFrame, DataUnavailable> {
        let to_error = |source| DataUnavailable::Parse {
            path: path.to_path_buf(),
            source,
        };

        LazyCsvReader::new(path)
            .with_has_header(true)
            .with_infer_schema_length(Some(10000))
            .finish()
            .map_err(to_error)?
            .collect()
            .map_err(to_error)
    }
}
