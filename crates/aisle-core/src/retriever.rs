//! Similarity search with metadata post-filtering.
//!
//! Filters are applied after the index scan so the index stays metric-only. A filtered search
//! over-fetches `k * widen_factor` neighbors once, keeps matches in distance order and stops at
//! `k`. It is best-effort: when the widened pool holds fewer than `k` matches the caller gets
//! a shorter list, and the index is never queried a second time.

use crate::filters::FilterSet;
use crate::index::{IndexError, VectorIndex};
use crate::metadata::{MetadataTable, Record};

/// Over-fetch multiplier for filtered searches.
pub const WIDEN_FACTOR: usize = 10;

/// Ranked results: `distances[i]` belongs to `records[i]`, ascending distance.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Hits<'a> {
    pub distances: Vec<f32>,
    pub records: Vec<&'a Record>,
}

impl<'a> Hits<'a> {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (f32, &'a Record)> + '_ {
        self.distances.iter().copied().zip(self.records.iter().copied())
    }

    fn push(&mut self, distance: f32, record: &'a Record) {
        self.distances.push(distance);
        self.records.push(record);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Retriever {
    widen_factor: usize,
}

impl Default for Retriever {
    fn default() -> Self {
        Self {
            widen_factor: WIDEN_FACTOR,
        }
    }
}

impl Retriever {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different over-fetch multiplier (minimum 1).
    pub fn with_widen_factor(mut self, widen_factor: usize) -> Self {
        self.widen_factor = widen_factor.max(1);
        self
    }

    pub fn widen_factor(&self) -> usize {
        self.widen_factor
    }

    /// Number of neighbors a search for `k` results pulls from `index`.
    pub fn fetch_size<I: VectorIndex + ?Sized>(
        &self,
        index: &I,
        k: usize,
        filtered: bool,
    ) -> usize {
        if filtered {
            k.saturating_mul(self.widen_factor).min(index.total_count())
        } else {
            k
        }
    }

    /// Search `index` for `query`, resolving ids through `metadata`.
    ///
    /// Ids the metadata can't resolve are dropped together with their distances. With a
    /// non-empty `filters`, only matching records are kept, up to `k`. An empty filter set is
    /// the same as none.
    pub fn search<'a, I: VectorIndex + ?Sized>(
        &self,
        index: &I,
        metadata: &'a MetadataTable,
        query: &[f32],
        k: usize,
        filters: Option<&FilterSet>,
    ) -> Result<Hits<'a>, RetrieveError> {
        if k == 0 {
            return Err(RetrieveError::ZeroK);
        }
        if query.len() != index.dimension() {
            return Err(RetrieveError::DimensionMismatch {
                expected: index.dimension(),
                actual: query.len(),
            });
        }
        let filters = filters.filter(|f| !f.is_empty());
        let fetch = self.fetch_size(index, k, filters.is_some());
        if fetch == 0 {
            return Ok(Hits::default());
        }

        let neighbors = index.search(query, fetch)?;
        let mut hits = Hits::default();
        let mut unresolved = 0usize;
        for neighbor in &neighbors {
            let Some(record) = metadata.lookup(neighbor.id) else {
                log::trace!("no metadata for id {}, skipping", neighbor.id);
                unresolved += 1;
                continue;
            };
            if let Some(filters) = filters {
                if !filters.matches(record) {
                    continue;
                }
            }
            hits.push(neighbor.distance, record);
            if hits.len() >= k {
                break;
            }
        }

        match filters {
            Some(filters) => log::debug!(
                "filtered search [{}]: {} of {} candidates kept (k={}, unresolved={})",
                filters,
                hits.len(),
                neighbors.len(),
                k,
                unresolved
            ),
            None => log::debug!(
                "search: {} results (k={}, unresolved={})",
                hits.len(),
                k,
                unresolved
            ),
        }
        Ok(hits)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RetrieveError {
    #[error("k must be at least 1")]
    ZeroK,
    #[error("query has {actual} dimensions but the index expects {expected}")]
    DimensionMismatch { expected: usize, actual: usize },
    #[error(transparent)]
    Index(#[from] IndexError),
}
