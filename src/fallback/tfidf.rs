//! Query-time TF-IDF space
//!
//! Vocabulary and inverse document frequencies depend on the query, which is
//! treated as one more row, so they are recomputed on every call. Only the
//! per-row term counts are reusable between calls.

use ahash::{HashMap, HashMapExt};
use regex::Regex;

/// Term -> occurrence count for one row
pub type TermCounts = HashMap<String, u32>;

const TOKEN_PATTERN: &str = r"(?u)\b\w\w+\b";

/// Lowercasing word tokenizer keeping tokens of two or more word characters
#[derive(Debug, Clone)]
pub struct Tokenizer {
    pattern: Regex,
}

impl Tokenizer {
    pub fn new() -> Result<Self, regex::Error> {
        Ok(Self {
            pattern: Regex::new(TOKEN_PATTERN)?,
        })
    }

    pub fn counts(&self, text: &str) -> TermCounts {
        let lowered = text.to_lowercase();
        let mut counts = TermCounts::new();
        for token in self.pattern.find_iter(&lowered) {
            *counts.entry(token.as_str().to_string()).or_insert(0) += 1;
        }
        counts
    }
}

/// Best-scoring row for `query` and its cosine similarity
///
/// The vocabulary keeps the `max_features` most frequent terms across all rows
/// and the query (ties broken alphabetically). Weights are raw counts times
/// smoothed idf `ln((1 + n) / (1 + df)) + 1`, L2-normalized per row. The first
/// row wins ties. Returns `None` only when there are no rows.
pub fn best_match(rows: &[TermCounts], query: &TermCounts, max_features: usize) -> Option<(usize, f32)> {
    if rows.is_empty() {
        return None;
    }

    let all_rows = || rows.iter().chain(std::iter::once(query));

    let mut totals: HashMap<&str, u64> = HashMap::new();
    for counts in all_rows() {
        for (term, count) in counts {
            *totals.entry(term.as_str()).or_insert(0) += u64::from(*count);
        }
    }

    let mut ranked: Vec<(&str, u64)> = totals.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked.truncate(max_features);

    let n = (rows.len() + 1) as f32;
    let mut idf: HashMap<&str, f32> = HashMap::with_capacity(ranked.len());
    for (term, _) in &ranked {
        let df = all_rows().filter(|counts| counts.contains_key(*term)).count() as f32;
        idf.insert(*term, ((1.0 + n) / (1.0 + df)).ln() + 1.0);
    }

    let query_vec = weigh(query, &idf);
    let mut best = (0usize, 0.0f32);
    for (i, counts) in rows.iter().enumerate() {
        let row_vec = weigh(counts, &idf);
        let score: f32 = query_vec
            .iter()
            .filter_map(|(term, q)| row_vec.get(term).map(|r| q * r))
            .sum();
        if score > best.1 {
            best = (i, score);
        }
    }

    Some(best)
}

/// L2-normalized tf-idf weights restricted to the vocabulary
fn weigh<'a>(counts: &'a TermCounts, idf: &HashMap<&str, f32>) -> HashMap<&'a str, f32> {
    let mut weights: HashMap<&'a str, f32> = HashMap::new();
    for (term, count) in counts {
        if let Some(w) = idf.get(term.as_str()) {
            weights.insert(term.as_str(), *count as f32 * w);
        }
    }

    let norm = weights.values().map(|w| w * w).sum::<f32>().sqrt();
    if norm > 0.0 {
        for w in weights.values_mut() {
            *w /= norm;
        }
    }
    weights
}
