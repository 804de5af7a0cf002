use crate::crash::normalize::{RawRecord, normalize_at};
use crate::crash::record::CrashRecord;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};
use std::time::SystemTime;
use thiserror::Error;
use time::OffsetDateTime;
use tracing::{info, warn};

#[derive(Debug, Error)]
pub enum DataLoadError {
    #[error("failed to open crash dataset {path}: {source}")]
    Open { path: PathBuf, source: csv::Error },
    #[error("failed to read crash dataset header: {0}")]
    Header(#[from] csv::Error),
    #[error("crash dataset cache lock poisoned")]
    CacheLock,
}

/// Normalized, read-only crash data shared by every scoring request.
#[derive(Debug, Default)]
pub struct CrashDataset {
    source: Option<PathBuf>,
    records: Vec<CrashRecord>,
    skipped: usize,
}

impl CrashDataset {
    pub fn new(records: Vec<CrashRecord>) -> Self {
        Self {
            source: None,
            records,
            skipped: 0,
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[CrashRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows dropped during load (bad CSV rows or unparseable timestamps).
    pub fn skipped(&self) -> usize {
        self.skipped
    }

    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }
}

pub fn load_csv(path: impl AsRef<Path>) -> Result<CrashDataset, DataLoadError> {
    load_csv_at(path, OffsetDateTime::now_utc())
}

pub fn load_csv_at(
    path: impl AsRef<Path>,
    now: OffsetDateTime,
) -> Result<CrashDataset, DataLoadError> {
    let path = path.as_ref();
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_path(path)
        .map_err(|source| DataLoadError::Open {
            path: path.to_path_buf(),
            source,
        })?;
    reader.headers()?;

    let mut rows = Vec::new();
    let mut bad_rows = 0usize;
    for (index, result) in reader.deserialize::<RawRecord>().enumerate() {
        match result {
            Ok(row) => rows.push(row),
            Err(err) => {
                bad_rows += 1;
                warn!(row = index, error = %err, "Skipping malformed crash dataset row");
            }
        }
    }

    let normalized = normalize_at(&rows, now);
    let skipped = bad_rows + normalized.skipped;
    info!(
        path = %path.display(),
        records = normalized.records.len(),
        skipped,
        "Crash dataset loaded"
    );

    Ok(CrashDataset {
        source: Some(path.to_path_buf()),
        records: normalized.records,
        skipped,
    })
}

/// Loads the dataset, recovering from any [`DataLoadError`] with an empty set
/// so scoring falls back to the no-data bucket defaults.
pub fn load_or_empty(path: impl AsRef<Path>) -> Arc<CrashDataset> {
    let path = path.as_ref();
    match load_cached(path) {
        Ok(dataset) => dataset,
        Err(err) => {
            warn!(
                path = %path.display(),
                error = %err,
                "Crash dataset unavailable, scoring with no historical data"
            );
            Arc::new(CrashDataset::empty())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DatasetKey {
    path: PathBuf,
    modified: Option<SystemTime>,
}

type DatasetCache = Mutex<HashMap<DatasetKey, Arc<CrashDataset>>>;

fn cache() -> &'static DatasetCache {
    static CACHE: OnceLock<DatasetCache> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Loads the dataset once per (path, modification time) for the life of the
/// process. A rewritten file gets a new key and is loaded again; older
/// versions of the same path are evicted.
pub fn load_cached(path: impl AsRef<Path>) -> Result<Arc<CrashDataset>, DataLoadError> {
    let path = path.as_ref();
    let key = DatasetKey {
        path: path.to_path_buf(),
        modified: std::fs::metadata(path).and_then(|m| m.modified()).ok(),
    };

    let mut guard = cache().lock().map_err(|_| DataLoadError::CacheLock)?;
    if let Some(dataset) = guard.get(&key) {
        return Ok(Arc::clone(dataset));
    }

    let dataset = Arc::new(load_csv(path)?);
    guard.retain(|cached, _| cached.path != key.path);
    guard.insert(key, Arc::clone(&dataset));
    Ok(dataset)
}
