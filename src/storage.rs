//! Local persistence for dispatch records.
//!
//! The whole store lives in a single JSON file:
//!
//! ```text
//! {
//!     "despachos": [ { "id_despacho": "INT-001", ... }, ... ],
//!     "next_id_interno": 2
//! }
//! ```
//!
//! The file is read once when the store is opened. Every mutation rewrites
//! it in full: the new contents go to a temporary sibling which is then
//! renamed over the old file, so a crash mid-write never truncates it.
//! Entries the store cannot type are written back untouched.

mod artifact;
mod dispatch;
mod ids;

use std::{
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
};

use uuid::Uuid;

use crate::model::DispatchRecord;

use artifact::RawEntry;

pub use artifact::LoadWarning;

/// Errors that can occur during store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("dispatch ID already exists: {0}")]
    DuplicateId(String),

    #[error("no dispatches in progress")]
    NothingInProgress,

    #[error("selection {} is out of range: {available} dispatch(es) in progress", .position + 1)]
    InvalidSelection { position: usize, available: usize },

    #[error("no automatic dispatch IDs left; enter an ID by hand")]
    IdsExhausted,

    #[error("failed to read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },

    #[error("failed to write {}: {source}", .path.display())]
    Write { path: PathBuf, source: io::Error },

    #[error("failed to encode dispatches: {0}")]
    Encode(#[from] serde_json::Error),
}

pub type Result<T> = core::result::Result<T, StoreError>;

/// How a load went.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// No data file yet; one is written on the first save.
    FirstRun,

    /// The data file was read.
    Loaded { records: usize },

    /// The data file could not be parsed (bad JSON, wrong shape or invalid
    /// UTF-8) and was discarded.
    Reset { reason: String },
}

/// The result of [`Store::load`]: the outcome plus per-record problems
/// that were repaired or skipped along the way.
#[derive(Debug)]
pub struct LoadReport {
    pub outcome: LoadOutcome,
    pub warnings: Vec<LoadWarning>,
}

/// File-backed store of dispatch records and the auto-ID counter.
pub struct Store {
    path: PathBuf,
    prefix: String,
    records: Vec<DispatchRecord>,
    raw: Vec<RawEntry>,
    next_id: u64,
}

impl Store {
    /// Prefix for auto-generated IDs when none is configured.
    pub const DEFAULT_PREFIX: &'static str = "INT";

    /// Opens the store backed by `path`, loading whatever it holds.
    ///
    /// Auto-generated IDs look like `<prefix>-001`.
    pub fn open(path: impl Into<PathBuf>, prefix: impl Into<String>) -> Result<(Self, LoadReport)> {
        let mut store = Self {
            path: path.into(),
            prefix: prefix.into(),
            records: Vec::new(),
            raw: Vec::new(),
            next_id: 1,
        };
        let report = store.load()?;
        Ok((store, report))
    }

    /// Replaces the in-memory state with the contents of the data file.
    ///
    /// A missing file is a first run and a file that fails to parse is
    /// discarded; both leave the store empty. Only a file that exists but
    /// cannot be read is an error, so unreadable data is never overwritten.
    pub fn load(&mut self) -> Result<LoadReport> {
        let contents = match fs::read(&self.path) {
            Ok(contents) => contents,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                log::info!(
                    "no data file at {}; a new one will be created on first save",
                    self.path.display()
                );
                self.reset();
                return Ok(LoadReport {
                    outcome: LoadOutcome::FirstRun,
                    warnings: Vec::new(),
                });
            }
            Err(source) => {
                return Err(StoreError::Read {
                    path: self.path.clone(),
                    source,
                });
            }
        };

        let decoded = match artifact::decode(&contents) {
            Ok(decoded) => decoded,
            Err(e) => {
                log::warn!(
                    "data file {} is corrupt ({e}); starting with an empty list",
                    self.path.display()
                );
                self.reset();
                return Ok(LoadReport {
                    outcome: LoadOutcome::Reset {
                        reason: e.to_string(),
                    },
                    warnings: Vec::new(),
                });
            }
        };

        for warning in &decoded.warnings {
            log::warn!("{warning}");
        }
        self.records = decoded.records;
        self.raw = decoded.raw;
        self.next_id = decoded.next_id;
        self.recompute_next_id();
        log::info!(
            "loaded {} dispatch(es) from {}",
            self.records.len(),
            self.path.display()
        );

        Ok(LoadReport {
            outcome: LoadOutcome::Loaded {
                records: self.records.len(),
            },
            warnings: decoded.warnings,
        })
    }

    /// Writes every record and the counter to the data file.
    ///
    /// Leaves the in-memory state untouched whether or not the write succeeds.
    pub fn save(&self) -> Result<()> {
        let contents = artifact::encode(&self.records, &self.raw, self.next_id)?;
        write_atomically(&self.path, &contents).map_err(|source| {
            log::error!("failed to save {}: {source}", self.path.display());
            StoreError::Write {
                path: self.path.clone(),
                source,
            }
        })?;
        log::debug!(
            "saved {} dispatch(es) to {}",
            self.records.len(),
            self.path.display()
        );
        Ok(())
    }

    /// The data file backing this store.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether any record, or any entry kept from the file untyped, already
    /// uses `id`.
    pub fn contains_id(&self, id: &str) -> bool {
        self.records.iter().any(|r| r.id == id)
            || self.raw.iter().any(|e| e.id.as_deref() == Some(id))
    }

    fn reset(&mut self) {
        self.records.clear();
        self.raw.clear();
        self.next_id = 1;
    }
}

/// Writes `contents` to a temporary sibling of `path`, then renames it into place.
fn write_atomically(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent)?;
    }

    let tmp = path.with_extension(format!("{}.tmp", Uuid::new_v4().simple()));
    let written = fs::File::create(&tmp).and_then(|mut file| {
        file.write_all(contents)?;
        file.sync_all()
    });
    if let Err(e) = written.and_then(|()| fs::rename(&tmp, path)) {
        // Best-effort cleanup.
        let _ = fs::remove_file(&tmp);
        return Err(e);
    }
    Ok(())
}
