//! Append-only JSONL request log

use crate::error::{FaqragError, Result};
use crate::retrieval::SourceRef;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;

/// Record type tag for chit-chat requests
pub const CHITCHAT_TYPE: &str = "chitchat";

/// One answered request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRecord {
    #[serde(alias = "q")]
    pub question: String,
    /// Seconds since the Unix epoch
    #[serde(alias = "t")]
    pub timestamp: f64,
    #[serde(default)]
    pub sources: Vec<SourceRef>,
    #[serde(alias = "latency")]
    pub latency_seconds: f64,
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
}

impl LogRecord {
    /// Record stamped with the current time
    pub fn new(question: &str, sources: Vec<SourceRef>, latency: Duration, chitchat: bool) -> Self {
        let now = chrono::Utc::now();
        Self {
            question: question.to_string(),
            timestamp: now.timestamp_micros() as f64 / 1_000_000.0,
            sources,
            latency_seconds: latency.as_secs_f64(),
            kind: chitchat.then(|| CHITCHAT_TYPE.to_string()),
        }
    }
}

/// Writer for the request log; one complete line per record
#[derive(Debug)]
pub struct RequestLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl RequestLog {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append `record`, creating the log and its directory if needed
    pub fn append(&self, record: &LogRecord) -> Result<()> {
        let mut line = serde_json::to_string(record).map_err(|e| FaqragError::Json {
            source: e,
            context: "Failed to serialize log record".to_string(),
        })?;
        line.push('\n');

        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| FaqragError::Io {
                    source: e,
                    context: format!("Failed to create log directory: {:?}", parent),
                })?;
            }
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| FaqragError::Io {
                source: e,
                context: format!("Failed to open request log: {:?}", self.path),
            })?;
        file.write_all(line.as_bytes()).map_err(|e| FaqragError::Io {
            source: e,
            context: format!("Failed to append to request log: {:?}", self.path),
        })?;

        Ok(())
    }
}
