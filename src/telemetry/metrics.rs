//! Metrics derived from the request log

use crate::error::{FaqragError, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader, ErrorKind};
use std::path::{Path, PathBuf};

/// Topic bucket for a logged question
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Topic {
    Pricing,
    Warranty,
    Howto,
    Other,
}

const TOPIC_KEYWORDS: [(Topic, &[&str]); 3] = [
    (Topic::Pricing, &["giá", "price", "báo giá"]),
    (Topic::Warranty, &["bảo hành", "warranty"]),
    (Topic::Howto, &["hướng dẫn", "manual", "setup"]),
];

impl Topic {
    /// First bucket whose keyword occurs in the lowercased question
    pub fn classify(question: &str) -> Self {
        let lowered = question.to_lowercase();
        TOPIC_KEYWORDS
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|k| lowered.contains(k)))
            .map(|(topic, _)| *topic)
            .unwrap_or(Topic::Other)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Topic::Pricing => "pricing",
            Topic::Warranty => "warranty",
            Topic::Howto => "howto",
            Topic::Other => "other",
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Aggregate view of the request log
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Records per topic; only topics that occurred
    pub counts: BTreeMap<String, u64>,
    /// 95th percentile latency in seconds
    pub p95_latency: f64,
    /// Lines that could not be parsed as records
    #[serde(default, skip_serializing_if = "is_zero")]
    pub malformed_lines: u64,
}

fn is_zero(n: &u64) -> bool {
    *n == 0
}

/// The fields metrics need, tolerant of older or partial records
#[derive(Deserialize)]
struct MetricsLine {
    #[serde(default, alias = "q")]
    question: Option<String>,
    #[serde(default, alias = "latency")]
    latency_seconds: Option<f64>,
}

pub struct MetricsAggregator {
    log_path: PathBuf,
}

impl MetricsAggregator {
    pub fn new(log_path: PathBuf) -> Self {
        Self { log_path }
    }

    pub fn log_path(&self) -> &Path {
        &self.log_path
    }

    /// Scan the whole log; a missing log yields empty metrics
    pub fn snapshot(&self) -> Result<MetricsSnapshot> {
        let file = match File::open(&self.log_path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(MetricsSnapshot::default()),
            Err(e) => {
                return Err(FaqragError::Io {
                    source: e,
                    context: format!("Failed to open request log: {:?}", self.log_path),
                })
            }
        };

        let mut snapshot = MetricsSnapshot::default();
        let mut latencies = Vec::new();

        for (number, line) in BufReader::new(file).split(b'\n').enumerate() {
            let line = line.map_err(|e| FaqragError::Io {
                source: e,
                context: format!("Failed to read request log: {:?}", self.log_path),
            })?;
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }

            let record: MetricsLine = match serde_json::from_slice(&line) {
                Ok(record) => record,
                Err(e) => {
                    tracing::debug!("Skipping malformed log line {}: {}", number + 1, e);
                    snapshot.malformed_lines += 1;
                    continue;
                }
            };

            latencies.push(record.latency_seconds.unwrap_or(0.0));
            let topic = Topic::classify(record.question.as_deref().unwrap_or(""));
            *snapshot.counts.entry(topic.to_string()).or_insert(0) += 1;
        }

        if snapshot.malformed_lines > 0 {
            tracing::warn!(
                "Request log {:?} has {} malformed lines",
                self.log_path,
                snapshot.malformed_lines
            );
        }

        snapshot.p95_latency = percentile(&latencies, 95.0);
        Ok(snapshot)
    }
}

/// Percentile `p` (0..=100) with linear interpolation between closest ranks
///
/// Returns 0.0 for an empty slice.
pub fn percentile(values: &[f64], p: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lower = rank.floor() as usize;
    let upper = rank.ceil() as usize;
    let weight = rank - lower as f64;

    sorted[lower] + (sorted[upper] - sorted[lower]) * weight
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_topic_order_and_case() {
        assert_eq!(Topic::classify("Báo GIÁ bảo hành?"), Topic::Pricing);
        assert_eq!(Topic::classify("Chính sách BẢO HÀNH"), Topic::Warranty);
        assert_eq!(Topic::classify("Setup guide"), Topic::Howto);
        assert_eq!(Topic::classify("Mitek là gì"), Topic::Other);
    }

    #[test]
    fn test_percentile_interpolates() {
        assert_eq!(percentile(&[], 95.0), 0.0);
        assert_eq!(percentile(&[2.0], 95.0), 2.0);
        let values: Vec<f64> = (1..=10).map(f64::from).collect();
        assert!((percentile(&values, 95.0) - 9.55).abs() < 1e-9);
        assert_eq!(percentile(&values, 0.0), 1.0);
        assert_eq!(percentile(&values, 100.0), 10.0);
    }

    #[test]
    fn test_missing_log_is_empty() {
        let temp = TempDir::new().unwrap();
        let metrics = MetricsAggregator::new(temp.path().join("absent.jsonl"));
        let snapshot = metrics.snapshot().unwrap();
        assert!(snapshot.counts.is_empty());
        assert_eq!(snapshot.p95_latency, 0.0);
        assert_eq!(
            serde_json::to_value(&snapshot).unwrap(),
            serde_json::json!({"counts": {}, "p95_latency": 0.0})
        );
    }

    #[test]
    fn test_snapshot_skips_bad_lines() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("log.jsonl");
        std::fs::write(
            &path,
            concat!(
                r#"{"question": "giá bao nhiêu", "timestamp": 1.0, "sources": [], "latency_seconds": 1.0}"#,
                "\n\n",
                r#"{"q": "bảo hành", "t": 2.0, "sources": [], "latency": 3.0}"#,
                "\n",
                "{truncated\n",
                r#"{"question": "hello", "timestamp": 3.0, "sources": [], "latency_seconds": 2.0, "type": "chitchat"}"#,
                "\n",
            ),
        )
        .unwrap();

        let snapshot = MetricsAggregator::new(path).snapshot().unwrap();
        assert_eq!(snapshot.counts.get("pricing"), Some(&1));
        assert_eq!(snapshot.counts.get("warranty"), Some(&1));
        assert_eq!(snapshot.counts.get("other"), Some(&1));
        assert!(!snapshot.counts.contains_key("howto"));
        assert_eq!(snapshot.malformed_lines, 1);
        assert!((snapshot.p95_latency - 2.9).abs() < 1e-9);
    }
}
