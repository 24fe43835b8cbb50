//! Read-only vector indices.
//!
//! Indices are produced offline (FAISS `IndexFlatL2`, written with `faiss.write_index`) and
//! loaded once. Search is an exhaustive scan returning squared L2 distances, the same numbers
//! FAISS reports, so scores stay comparable with whatever built the index.

use std::path::{Path, PathBuf};

/// One neighbor returned by an index search.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Internal id assigned when the index was built (0-based, insertion order).
    pub id: usize,
    /// Raw distance; lower is more similar.
    pub distance: f32,
}

/// Common interface for the indices the retriever can query.
pub trait VectorIndex {
    fn dimension(&self) -> usize;

    /// Number of vectors in the index.
    fn total_count(&self) -> usize;

    /// Up to `k` nearest neighbors of `query`, ordered by ascending distance.
    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, IndexError>;
}

/// Flat (exhaustive) L2 index, vectors stored row-major.
#[derive(Debug, Clone)]
pub struct FlatIndex {
    dimension: usize,
    vectors: Vec<f32>,
}

const FOURCC_FLAT_L2: [u8; 4] = *b"IxF2";
const FOURCC_FLAT: [u8; 4] = *b"IxFl";
const FOURCC_FLAT_IP: [u8; 4] = *b"IxFI";
const METRIC_L2: i32 = 1;

impl FlatIndex {
    /// Build an index from vectors already in memory (ids follow slice order).
    pub fn from_vectors(dimension: usize, rows: &[Vec<f32>]) -> Result<Self, IndexError> {
        if dimension == 0 {
            return Err(IndexError::Corrupt("dimension must be positive".into()));
        }
        let mut vectors = Vec::with_capacity(rows.len() * dimension);
        for row in rows {
            if row.len() != dimension {
                return Err(IndexError::DimensionMismatch {
                    expected: dimension,
                    actual: row.len(),
                });
            }
            vectors.extend_from_slice(row);
        }
        Ok(Self { dimension, vectors })
    }

    /// Load a FAISS flat-L2 index file.
    pub fn load(path: &Path) -> Result<Self, IndexError> {
        let bytes = std::fs::read(path).map_err(|e| IndexError::Read(path.to_path_buf(), e))?;
        Self::from_faiss_bytes(&bytes)
    }

    /// Parse the FAISS serialization of `IndexFlatL2`:
    ///
    /// ```text
    /// [fourcc 4B][d i32][ntotal i64][reserved i64][reserved i64][is_trained u8]
    /// [metric_type i32][metric_arg f32 if metric_type > 1][n_floats u64][floats f32 * n_floats]
    /// ```
    pub fn from_faiss_bytes(bytes: &[u8]) -> Result<Self, IndexError> {
        let mut r = ByteReader::new(bytes);
        let fourcc = r.array::<4>()?;
        match fourcc {
            FOURCC_FLAT_L2 | FOURCC_FLAT => {}
            FOURCC_FLAT_IP => return Err(IndexError::UnsupportedMetric(0)),
            other => {
                return Err(IndexError::UnsupportedFormat(
                    String::from_utf8_lossy(&other).into_owned(),
                ))
            }
        }

        let d = r.i32()?;
        let ntotal = r.i64()?;
        r.i64()?;
        r.i64()?;
        let _is_trained = r.u8()?;
        let metric_type = r.i32()?;
        if metric_type > 1 {
            r.f32()?;
        }
        if metric_type != METRIC_L2 {
            return Err(IndexError::UnsupportedMetric(metric_type));
        }
        if d <= 0 {
            return Err(IndexError::Corrupt(format!("dimension {}", d)));
        }
        let ntotal = usize::try_from(ntotal)
            .map_err(|_| IndexError::Corrupt(format!("vector count {}", ntotal)))?;
        let dimension = d as usize;

        let n_floats = r.u64()?;
        let expected = ntotal
            .checked_mul(dimension)
            .ok_or_else(|| IndexError::Corrupt("vector count overflows".into()))?;
        if n_floats != expected as u64 {
            return Err(IndexError::Corrupt(format!(
                "expected {} floats for {} x {}, header says {}",
                expected, ntotal, dimension, n_floats
            )));
        }
        let vectors = r.f32_vec(expected)?;
        Ok(Self { dimension, vectors })
    }

    fn row(&self, id: usize) -> &[f32] {
        &self.vectors[id * self.dimension..(id + 1) * self.dimension]
    }
}

impl VectorIndex for FlatIndex {
    fn dimension(&self) -> usize {
        self.dimension
    }

    fn total_count(&self) -> usize {
        self.vectors.len() / self.dimension
    }

    fn search(&self, query: &[f32], k: usize) -> Result<Vec<Neighbor>, IndexError> {
        if query.len() != self.dimension {
            return Err(IndexError::DimensionMismatch {
                expected: self.dimension,
                actual: query.len(),
            });
        }
        let mut neighbors: Vec<Neighbor> = (0..self.total_count())
            .map(|id| Neighbor {
                id,
                distance: squared_l2(query, self.row(id)),
            })
            .collect();
        neighbors.sort_by(|a, b| a.distance.total_cmp(&b.distance).then(a.id.cmp(&b.id)));
        neighbors.truncate(k);
        Ok(neighbors)
    }
}

fn squared_l2(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum()
}

/// Little-endian cursor over an index file.
struct ByteReader<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], IndexError> {
        let end = self.pos.checked_add(n).filter(|end| *end <= self.bytes.len());
        let Some(end) = end else {
            return Err(IndexError::Truncated { offset: self.pos });
        };
        let slice = &self.bytes[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], IndexError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    fn u8(&mut self) -> Result<u8, IndexError> {
        Ok(self.array::<1>()?[0])
    }

    fn i32(&mut self) -> Result<i32, IndexError> {
        Ok(i32::from_le_bytes(self.array()?))
    }

    fn i64(&mut self) -> Result<i64, IndexError> {
        Ok(i64::from_le_bytes(self.array()?))
    }

    fn u64(&mut self) -> Result<u64, IndexError> {
        Ok(u64::from_le_bytes(self.array()?))
    }

    fn f32(&mut self) -> Result<f32, IndexError> {
        Ok(f32::from_le_bytes(self.array()?))
    }

    fn f32_vec(&mut self, n: usize) -> Result<Vec<f32>, IndexError> {
        let len = n
            .checked_mul(4)
            .ok_or(IndexError::Truncated { offset: self.pos })?;
        let raw = self.take(len)?;
        Ok(raw
            .chunks_exact(4)
            .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
            .collect())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("failed to read index {0}: {1}")]
    Read(PathBuf, std::io::Error),
    #[error("unsupported index type {0:?} (expected a flat L2 index)")]
    UnsupportedFormat(String),
    #[error("unsupported metric type {0} (only L2 distances are ordered ascending)")]
    UnsupportedMetric(i32),
    #[error("index file truncated at byte {offset}")]
    Truncated { offset: usize },
    #[error("corrupt index: {0}")]
    Corrupt(String),
    #[error("invalid vector dimension: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// Serialize vectors the way `faiss.write_index(IndexFlatL2)` does. Test fixtures only.
#[cfg(test)]
pub(crate) fn faiss_flat_l2_bytes(dimension: usize, rows: &[Vec<f32>]) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&FOURCC_FLAT_L2);
    out.extend_from_slice(&(dimension as i32).to_le_bytes());
    out.extend_from_slice(&(rows.len() as i64).to_le_bytes());
    out.extend_from_slice(&(1i64 << 20).to_le_bytes());
    out.extend_from_slice(&(1i64 << 20).to_le_bytes());
    out.push(1);
    out.extend_from_slice(&METRIC_L2.to_le_bytes());
    out.extend_from_slice(&((rows.len() * dimension) as u64).to_le_bytes());
    for v in rows.iter().flatten() {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows() -> Vec<Vec<f32>> {
        vec![vec![0.0, 0.0], vec![1.0, 0.0], vec![0.0, 3.0]]
    }

    #[test]
    fn search_orders_by_ascending_distance() {
        let index = FlatIndex::from_vectors(2, &rows()).unwrap();
        let hits = index.search(&[0.9, 0.0], 3).unwrap();
        let ids: Vec<usize> = hits.iter().map(|n| n.id).collect();
        assert_eq!(ids, vec![1, 0, 2]);
        assert!((hits[0].distance - 0.01).abs() < 1e-6);
        assert!((hits[1].distance - 0.81).abs() < 1e-6);
        assert!(hits.windows(2).all(|w| w[0].distance <= w[1].distance));
    }

    #[test]
    fn k_larger_than_index_returns_everything() {
        let index = FlatIndex::from_vectors(2, &rows()).unwrap();
        assert_eq!(index.search(&[0.0, 0.0], 10).unwrap().len(), 3);
        assert_eq!(index.total_count(), 3);
    }

    #[test]
    fn ties_break_on_lower_id() {
        let index = FlatIndex::from_vectors(1, &[vec![1.0], vec![-1.0]]).unwrap();
        let hits = index.search(&[0.0], 2).unwrap();
        assert_eq!(hits[0].id, 0);
        assert_eq!(hits[1].id, 1);
    }

    #[test]
    fn dimension_mismatch() {
        let index = FlatIndex::from_vectors(2, &rows()).unwrap();
        assert!(matches!(
            index.search(&[1.0, 0.0, 0.0], 1),
            Err(IndexError::DimensionMismatch { expected: 2, actual: 3 })
        ));
        assert!(FlatIndex::from_vectors(2, &[vec![1.0]]).is_err());
    }

    #[test]
    fn parses_faiss_flat_l2() {
        let bytes = faiss_flat_l2_bytes(2, &rows());
        let index = FlatIndex::from_faiss_bytes(&bytes).unwrap();
        assert_eq!(index.dimension(), 2);
        assert_eq!(index.total_count(), 3);
        assert_eq!(index.row(2), &[0.0f32, 3.0][..]);
    }

    #[test]
    fn parses_empty_index() {
        let bytes = faiss_flat_l2_bytes(4, &[]);
        let index = FlatIndex::from_faiss_bytes(&bytes).unwrap();
        assert_eq!(index.total_count(), 0);
        assert!(index.search(&[0.0; 4], 5).unwrap().is_empty());
    }

    #[test]
    fn rejects_inner_product_index() {
        let mut bytes = faiss_flat_l2_bytes(2, &rows());
        bytes[..4].copy_from_slice(b"IxFI");
        assert!(matches!(
            FlatIndex::from_faiss_bytes(&bytes),
            Err(IndexError::UnsupportedMetric(0))
        ));
    }

    #[test]
    fn rejects_other_index_types() {
        let mut bytes = faiss_flat_l2_bytes(2, &rows());
        bytes[..4].copy_from_slice(b"IHNf");
        assert!(matches!(
            FlatIndex::from_faiss_bytes(&bytes),
            Err(IndexError::UnsupportedFormat(s)) if s == "IHNf"
        ));
    }

    #[test]
    fn rejects_truncated_file() {
        let bytes = faiss_flat_l2_bytes(2, &rows());
        let cut = &bytes[..bytes.len() - 3];
        assert!(matches!(
            FlatIndex::from_faiss_bytes(cut),
            Err(IndexError::Truncated { .. })
        ));
    }

    #[test]
    fn rejects_count_mismatch() {
        let mut bytes = faiss_flat_l2_bytes(2, &rows());
        // ntotal sits right after fourcc + d
        bytes[8..16].copy_from_slice(&5i64.to_le_bytes());
        assert!(matches!(
            FlatIndex::from_faiss_bytes(&bytes),
            Err(IndexError::Corrupt(_))
        ));
    }

    #[test]
    fn load_missing_file_is_read_error() {
        let err = FlatIndex::load(Path::new("/nonexistent/faq.index")).unwrap_err();
        assert!(matches!(err, IndexError::Read(..)));
    }
}
