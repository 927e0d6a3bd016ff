/// Passage vector index with exact (flat) and approximate (HNSW) search
use hnsw_rs::prelude::*;
use ndarray::{Array2, ArrayView1};
use std::cmp::Ordering;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use thiserror::Error;

const MAGIC: &[u8; 4] = b"FQIX";
const FORMAT_VERSION: u32 = 1;
/// magic + version + dimension + count
const HEADER_LEN: usize = 4 + 4 + 4 + 8;
const HNSW_MAX_LAYER: usize = 16;

#[derive(Error, Debug)]
pub enum VectorIndexError {
    #[error("Index initialization failed: {0}")]
    InitializationError(String),

    #[error("Index not found: {0}")]
    IndexNotFound(String),

    #[error("Corrupt index file: {0}")]
    CorruptIndex(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid dimension: expected {expected}, got {actual}")]
    InvalidDimension { expected: usize, actual: usize },
}

/// Search result with row position and similarity score
#[derive(Debug, Clone, PartialEq)]
pub struct SearchResult {
    /// Row of the vector in the index (aligned with passage metadata)
    pub row: usize,
    /// Inner product with the query (cosine for unit vectors)
    pub score: f32,
}

struct HnswGraph {
    hnsw: Hnsw<'static, f32, DistCosine>,
    ef_search: usize,
}

/// Read-only vector index
///
/// Rows are unit-normalized embeddings written by the index builder. The flat
/// matrix is always kept: it answers exact searches and rescores HNSW hits.
pub struct VectorIndex {
    vectors: Array2<f32>,
    graph: Option<HnswGraph>,
}

impl VectorIndex {
    /// Build an index from in-memory rows
    pub fn from_rows(dimension: usize, rows: &[Vec<f32>]) -> Result<Self, VectorIndexError> {
        if dimension == 0 {
            return Err(VectorIndexError::InitializationError(
                "dimension must be greater than 0".to_string(),
            ));
        }

        let mut data = Vec::with_capacity(rows.len() * dimension);
        for row in rows {
            if row.len() != dimension {
                return Err(VectorIndexError::InvalidDimension {
                    expected: dimension,
                    actual: row.len(),
                });
            }
            data.extend_from_slice(row);
        }

        let vectors = Array2::from_shape_vec((rows.len(), dimension), data)
            .map_err(|e| VectorIndexError::InitializationError(e.to_string()))?;
        Ok(Self {
            vectors,
            graph: None,
        })
    }

    /// Load an index file written by [`VectorIndex::save`] or the index builder
    pub fn load(path: &Path) -> Result<Self, VectorIndexError> {
        if !path.exists() {
            return Err(VectorIndexError::IndexNotFound(path.display().to_string()));
        }

        let bytes = std::fs::read(path)?;
        if bytes.len() < HEADER_LEN || &bytes[0..4] != MAGIC {
            return Err(VectorIndexError::CorruptIndex(
                "missing FQIX header".to_string(),
            ));
        }

        let version = read_u32(&bytes[4..8]);
        if version != FORMAT_VERSION {
            return Err(VectorIndexError::CorruptIndex(format!(
                "unsupported format version {}",
                version
            )));
        }

        let dimension = read_u32(&bytes[8..12]) as usize;
        let count = read_u64(&bytes[12..20]) as usize;
        if dimension == 0 {
            return Err(VectorIndexError::CorruptIndex(
                "dimension is zero".to_string(),
            ));
        }

        let payload = &bytes[HEADER_LEN..];
        let expected = count
            .checked_mul(dimension)
            .and_then(|n| n.checked_mul(4))
            .ok_or_else(|| VectorIndexError::CorruptIndex("row count overflows".to_string()))?;
        if payload.len() != expected {
            return Err(VectorIndexError::CorruptIndex(format!(
                "expected {} payload bytes for {} x {}, found {}",
                expected,
                count,
                dimension,
                payload.len()
            )));
        }

        let data: Vec<f32> = payload
            .chunks_exact(4)
            .map(|chunk| f32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]))
            .collect();

        let vectors = Array2::from_shape_vec((count, dimension), data)
            .map_err(|e| VectorIndexError::CorruptIndex(e.to_string()))?;

        tracing::debug!(
            "Loaded vector index {} ({} rows, {}D)",
            path.display(),
            count,
            dimension
        );

        Ok(Self {
            vectors,
            graph: None,
        })
    }

    /// Write the index in the FQIX binary format
    pub fn save(&self, path: &Path) -> Result<(), VectorIndexError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let mut writer = BufWriter::new(File::create(path)?);
        writer.write_all(MAGIC)?;
        writer.write_all(&FORMAT_VERSION.to_le_bytes())?;
        writer.write_all(&(self.dimension() as u32).to_le_bytes())?;
        writer.write_all(&(self.len() as u64).to_le_bytes())?;
        for value in self.vectors.iter() {
            writer.write_all(&value.to_le_bytes())?;
        }
        writer.flush()?;
        Ok(())
    }

    /// Build an approximate HNSW graph over the loaded rows
    ///
    /// # Arguments
    /// * `m` - HNSW M parameter (number of connections per layer)
    /// * `ef_construction` - construction beam width (higher = better recall, slower build)
    /// * `ef_search` - search beam width, raised to `k` per query when smaller
    pub fn with_hnsw(
        mut self,
        m: usize,
        ef_construction: usize,
        ef_search: usize,
    ) -> Result<Self, VectorIndexError> {
        let hnsw = Hnsw::<f32, DistCosine>::new(
            m,
            self.len().max(1),
            HNSW_MAX_LAYER,
            ef_construction,
            DistCosine,
        );

        for (row, vector) in self.vectors.outer_iter().enumerate() {
            let data = vector.to_slice().ok_or_else(|| {
                VectorIndexError::InitializationError(format!("row {} is not contiguous", row))
            })?;
            hnsw.insert_slice((data, row));
        }

        tracing::info!(
            "Built HNSW graph over {} vectors (M={}, ef_construction={})",
            self.len(),
            m,
            ef_construction
        );

        self.graph = Some(HnswGraph { hnsw, ef_search });
        Ok(self)
    }

    /// Search for the `k` rows with the highest inner product
    ///
    /// Returns `min(k, len)` results sorted by score descending; ties keep the
    /// lower row first.
    pub fn search(&self, query: &[f32], k: usize) -> Result<Vec<SearchResult>, VectorIndexError> {
        if query.len() != self.dimension() {
            return Err(VectorIndexError::InvalidDimension {
                expected: self.dimension(),
                actual: query.len(),
            });
        }

        if k == 0 || self.is_empty() {
            return Ok(Vec::new());
        }

        let query = ArrayView1::from(query);
        let mut results = match &self.graph {
            Some(graph) => self.search_graph(graph, &query, k),
            None => self.search_flat(&query),
        };

        results.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(Ordering::Equal)
                .then(a.row.cmp(&b.row))
        });
        results.truncate(k);
        Ok(results)
    }

    fn search_flat(&self, query: &ArrayView1<f32>) -> Vec<SearchResult> {
        let scores = self.vectors.dot(query);
        scores
            .iter()
            .enumerate()
            .map(|(row, &score)| SearchResult { row, score })
            .collect()
    }

    fn search_graph(
        &self,
        graph: &HnswGraph,
        query: &ArrayView1<f32>,
        k: usize,
    ) -> Vec<SearchResult> {
        let Some(slice) = query.as_slice() else {
            return self.search_flat(query);
        };

        let neighbours = graph.hnsw.search(slice, k, graph.ef_search.max(k));
        if neighbours.len() < k.min(self.len()) {
            // Sparse graphs can come back short; the flat scan keeps top_k exact in size
            tracing::debug!(
                "HNSW returned {} of {} neighbours, using flat scan",
                neighbours.len(),
                k
            );
            return self.search_flat(query);
        }

        // Ids past the last row are passed through for the caller to reject
        neighbours
            .into_iter()
            .map(|n| SearchResult {
                row: n.d_id,
                score: if n.d_id < self.len() {
                    self.vectors.row(n.d_id).dot(query)
                } else {
                    1.0 - n.distance
                },
            })
            .collect()
    }

    #[cfg(test)]
    pub(crate) fn insert_graph_point(&self, vector: &[f32], id: usize) {
        if let Some(graph) = &self.graph {
            graph.hnsw.insert_slice((vector, id));
        }
    }

    /// Get the number of vectors in the index
    pub fn len(&self) -> usize {
        self.vectors.nrows()
    }

    /// Check if index is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get vector dimension
    pub fn dimension(&self) -> usize {
        self.vectors.ncols()
    }

    /// Whether searches go through the HNSW graph
    pub fn is_approximate(&self) -> bool {
        self.graph.is_some()
    }
}

fn read_u32(bytes: &[u8]) -> u32 {
    let mut buf = [0u8; 4];
    buf.copy_from_slice(bytes);
    u32::from_le_bytes(buf)
}

fn read_u64(bytes: &[u8]) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(bytes);
    u64::from_le_bytes(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn unit(dim: usize, hot: &[(usize, f32)]) -> Vec<f32> {
        let mut v = vec![0.0; dim];
        for (i, x) in hot {
            v[*i] = *x;
        }
        crate::embedding::normalize(&mut v);
        v
    }

    fn sample_rows() -> Vec<Vec<f32>> {
        vec![
            unit(8, &[(0, 1.0)]),
            unit(8, &[(1, 1.0)]),
            unit(8, &[(0, 0.9), (1, 0.1)]),
            unit(8, &[(2, 1.0)]),
            unit(8, &[(0, 0.5), (2, 0.5)]),
        ]
    }

    #[test]
    fn test_flat_search_orders_by_score() {
        let index = VectorIndex::from_rows(8, &sample_rows()).unwrap();
        let results = index.search(&unit(8, &[(0, 1.0)]), 3).unwrap();

        assert_eq!(results.len(), 3);
        assert_eq!(results[0].row, 0);
        assert_eq!(results[1].row, 2);
        assert_eq!(results[2].row, 4);
        assert!(results.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_returns_exactly_k_even_for_orthogonal_rows() {
        let index = VectorIndex::from_rows(8, &sample_rows()).unwrap();
        let results = index.search(&unit(8, &[(7, 1.0)]), 4).unwrap();

        assert_eq!(results.len(), 4);
        assert!(results.iter().all(|r| r.score.abs() < 1e-6));
        // all-zero scores fall back to row order
        assert_eq!(
            results.iter().map(|r| r.row).collect::<Vec<_>>(),
            vec![0, 1, 2, 3]
        );
    }

    #[test]
    fn test_k_larger_than_index() {
        let index = VectorIndex::from_rows(8, &sample_rows()).unwrap();
        let results = index.search(&unit(8, &[(1, 1.0)]), 50).unwrap();
        assert_eq!(results.len(), 5);
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested/index.bin");

        let index = VectorIndex::from_rows(8, &sample_rows()).unwrap();
        index.save(&path).unwrap();

        let loaded = VectorIndex::load(&path).unwrap();
        assert_eq!(loaded.len(), 5);
        assert_eq!(loaded.dimension(), 8);

        let query = unit(8, &[(2, 1.0)]);
        assert_eq!(
            index.search(&query, 2).unwrap(),
            loaded.search(&query, 2).unwrap()
        );
    }

    #[test]
    fn test_load_rejects_truncated_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("index.bin");

        VectorIndex::from_rows(8, &sample_rows())
            .unwrap()
            .save(&path)
            .unwrap();
        let bytes = std::fs::read(&path).unwrap();
        std::fs::write(&path, &bytes[..bytes.len() - 3]).unwrap();

        assert!(matches!(
            VectorIndex::load(&path),
            Err(VectorIndexError::CorruptIndex(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let result = VectorIndex::load(Path::new("/no/such/index.bin"));
        assert!(matches!(result, Err(VectorIndexError::IndexNotFound(_))));
    }

    #[test]
    fn test_dimension_validation() {
        let index = VectorIndex::from_rows(8, &sample_rows()).unwrap();
        assert!(index.search(&[1.0; 4], 2).is_err());
        assert!(VectorIndex::from_rows(8, &[vec![1.0; 3]]).is_err());
    }

    #[test]
    fn test_hnsw_matches_flat_on_small_index() {
        let flat = VectorIndex::from_rows(8, &sample_rows()).unwrap();
        let graph = VectorIndex::from_rows(8, &sample_rows())
            .unwrap()
            .with_hnsw(16, 200, 32)
            .unwrap();
        assert!(graph.is_approximate());

        let query = unit(8, &[(0, 1.0), (2, 0.2)]);
        let expected: Vec<usize> = flat.search(&query, 3).unwrap().iter().map(|r| r.row).collect();
        let actual: Vec<usize> = graph.search(&query, 3).unwrap().iter().map(|r| r.row).collect();
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_graph_ids_past_last_row_are_reported() {
        let index = VectorIndex::from_rows(8, &sample_rows())
            .unwrap()
            .with_hnsw(16, 200, 32)
            .unwrap();
        let stray = unit(8, &[(5, 1.0)]);
        index.insert_graph_point(&stray, 99);

        let results = index.search(&stray, 1).unwrap();
        assert_eq!(results[0].row, 99);
        assert!(results[0].score > 0.99);
    }

    #[test]
    fn test_empty_index() {
        let index = VectorIndex::from_rows(8, &[]).unwrap();
        assert!(index.is_empty());
        assert!(index.search(&[0.0; 8], 3).unwrap().is_empty());
    }
}
