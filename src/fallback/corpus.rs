//! FAQ corpus loading and caching

use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::SystemTime;
use thiserror::Error;

use super::tfidf::{TermCounts, Tokenizer};

#[derive(Error, Debug)]
pub enum CorpusError {
    #[error("Failed to open corpus {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse corpus {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("Corpus {path} has no rows")]
    Empty { path: String },

    #[error("Invalid token pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// One corpus row; columns other than url/title/body are ignored
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FaqRow {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub body: String,
}

impl FaqRow {
    /// Text indexed for lexical matching
    pub fn searchable_text(&self) -> String {
        format!("{} {}", self.title, self.body)
    }
}

/// Parsed rows with their term counts, aligned by position
#[derive(Debug)]
pub struct CorpusSnapshot {
    pub rows: Vec<FaqRow>,
    pub counts: Vec<TermCounts>,
}

/// Identity of a corpus file version
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    modified: Option<SystemTime>,
    len: u64,
}

impl FileStamp {
    fn of(path: &Path) -> Result<Self, CorpusError> {
        let meta = std::fs::metadata(path).map_err(|source| CorpusError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Self {
            modified: meta.modified().ok(),
            len: meta.len(),
        })
    }
}

/// Corpus reader with an optional cache keyed on file mtime and length
pub struct CorpusCache {
    path: PathBuf,
    enabled: bool,
    tokenizer: Tokenizer,
    cached: Mutex<Option<(FileStamp, Arc<CorpusSnapshot>)>>,
}

impl CorpusCache {
    pub fn new(path: PathBuf, enabled: bool) -> Result<Self, CorpusError> {
        Ok(Self {
            path,
            enabled,
            tokenizer: Tokenizer::new()?,
            cached: Mutex::new(None),
        })
    }

    pub fn tokenizer(&self) -> &Tokenizer {
        &self.tokenizer
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Current corpus contents, reloading if the file changed
    pub fn snapshot(&self) -> Result<Arc<CorpusSnapshot>, CorpusError> {
        let stamp = FileStamp::of(&self.path)?;

        if self.enabled {
            let cached = self.cached.lock().unwrap_or_else(|e| e.into_inner());
            if let Some((cached_stamp, snapshot)) = cached.as_ref() {
                if *cached_stamp == stamp {
                    return Ok(snapshot.clone());
                }
            }
        }

        let snapshot = Arc::new(self.load()?);
        if self.enabled {
            let mut cached = self.cached.lock().unwrap_or_else(|e| e.into_inner());
            *cached = Some((stamp, snapshot.clone()));
        }
        Ok(snapshot)
    }

    /// Drop the cached corpus so the next call re-reads the file
    pub fn invalidate(&self) {
        let mut cached = self.cached.lock().unwrap_or_else(|e| e.into_inner());
        if cached.take().is_some() {
            tracing::debug!("Corpus cache invalidated: {}", self.path.display());
        }
    }

    fn load(&self) -> Result<CorpusSnapshot, CorpusError> {
        let path = self.path.display().to_string();
        let rows = read_rows(&self.path)?;
        if rows.is_empty() {
            return Err(CorpusError::Empty { path });
        }

        let counts = rows
            .iter()
            .map(|row| self.tokenizer.counts(&row.searchable_text()))
            .collect();

        tracing::debug!("Loaded {} corpus rows from {}", rows.len(), path);
        Ok(CorpusSnapshot { rows, counts })
    }
}

/// Parse every row of a headered CSV file
pub fn read_rows(path: &Path) -> Result<Vec<FaqRow>, CorpusError> {
    let file = File::open(path).map_err(|source| CorpusError::Io {
        path: path.display().to_string(),
        source,
    })?;

    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(file);
    reader
        .deserialize()
        .collect::<Result<Vec<FaqRow>, _>>()
        .map_err(|source| CorpusError::Csv {
            path: path.display().to_string(),
            source,
        })
}
