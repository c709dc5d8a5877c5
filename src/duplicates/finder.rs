//! Duplicate detection over a built corpus index.
//!
//! # Pipeline
//!
//! 1. **Candidates** - For each segment, every segment with a higher
//!    identifier that shares a shingle with it. Scoring each pair only from
//!    its lower identifier deduplicates pairs without a shared set.
//! 2. **Scoring** - Jaccard coefficient of the two sorted shingle sets
//! 3. **Threshold** - Pairs below `min_similarity` are dropped
//! 4. **Clustering** - Union-find over the surviving edges
//! 5. **Group filter** - Components smaller than the effective
//!    `min_duplicates` are dropped
//!
//! Steps 1 to 3 run in parallel over the read-only index. Steps 4 and 5
//! depend only on the set of edges, so the result does not depend on
//! scheduling.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;

use super::groups::{sort_groups, DuplicateGroup, DuplicateMember};
use super::union_find::UnionFind;
use crate::index::indexer::WorkerPool;
use crate::index::{CorpusIndex, Segment, SegmentId};
use crate::options::DuplicateFinderOptions;
use crate::progress::ProgressCallback;

/// Jaccard similarity of two sorted, deduplicated fingerprint sets.
///
/// Two empty sets have similarity `0.0`; a segment without shingles is
/// never similar to anything.
///
/// # Example
///
/// ```
/// use fragdupe::duplicates::jaccard;
///
/// assert_eq!(jaccard(&[1, 2, 3], &[1, 2, 3]), 1.0);
/// assert_eq!(jaccard(&[1, 2, 3], &[2, 3, 4]), 0.5);
/// assert_eq!(jaccard(&[1, 2, 3], &[2, 3, 4]), jaccard(&[2, 3, 4], &[1, 2, 3]));
/// ```
#[must_use]
pub fn jaccard(a: &[u64], b: &[u64]) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 0.0;
    }
    let (mut i, mut j, mut shared) = (0, 0, 0usize);
    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                shared += 1;
                i += 1;
                j += 1;
            }
        }
    }
    let union = a.len() + b.len() - shared;
    shared as f64 / union as f64
}

/// An accepted similarity edge, `a < b`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Edge {
    a: SegmentId,
    b: SegmentId,
    score: f64,
}

/// Statistics from the detection phase.
#[derive(Debug, Clone, Default)]
pub struct DetectionStats {
    /// Segments examined
    pub segments: usize,
    /// Distinct candidate pairs scored
    pub candidate_pairs: usize,
    /// Pairs at or above the similarity threshold
    pub edges: usize,
    /// Connected components with two or more members
    pub components: usize,
    /// Groups reported
    pub groups: usize,
    /// Components dropped for having fewer members than required
    pub discarded_groups: usize,
    /// Segments in reported groups
    pub duplicated_segments: usize,
    /// Elapsed time
    pub duration: Duration,
}

/// Errors that can occur during duplicate detection.
///
/// Detection is a pure computation over the index; apart from
/// interruption these indicate a corrupted index.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum FinderError {
    /// Detection was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Analysis interrupted by user")]
    Interrupted,

    /// A posting references a segment the table does not hold, or a
    /// segment is missing from the posting of one of its own shingles.
    #[error("inconsistent index: shingle {fingerprint:016x} and segment {segment} disagree")]
    InconsistentIndex {
        /// Segment identifier
        segment: SegmentId,
        /// Shingle fingerprint
        fingerprint: u64,
    },
}

/// Finds duplicate groups in a [`CorpusIndex`].
///
/// # Example
///
/// ```no_run
/// use fragdupe::duplicates::DuplicateDetector;
/// use fragdupe::index::CorpusIndexer;
/// use fragdupe::options::DuplicateFinderOptions;
///
/// let options = DuplicateFinderOptions::new("docs");
/// let (index, _) = CorpusIndexer::new(&options).index_directory().unwrap();
/// let (groups, stats) = DuplicateDetector::new(&index).find_all(&options).unwrap();
/// println!("{} groups from {} candidate pairs", groups.len(), stats.candidate_pairs);
/// ```
pub struct DuplicateDetector<'a> {
    index: &'a CorpusIndex,
    shutdown_flag: Option<Arc<AtomicBool>>,
    progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for DuplicateDetector<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DuplicateDetector")
            .field("segments", &self.index.segments.len())
            .field("shingles", &self.index.shingles.len())
            .field("shutdown_flag", &self.shutdown_flag)
            .field("progress_callback", &self.progress_callback.is_some())
            .finish()
    }
}

impl<'a> DuplicateDetector<'a> {
    /// Create a detector over a built index.
    #[must_use]
    pub fn new(index: &'a CorpusIndex) -> Self {
        Self {
            index,
            shutdown_flag: None,
            progress_callback: None,
        }
    }

    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set a progress callback.
    #[must_use]
    pub fn with_progress_callback(mut self, callback: Arc<dyn ProgressCallback>) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Similarity of two indexed segments.
    ///
    /// Returns `None` if either identifier is unknown.
    #[must_use]
    pub fn similarity(&self, a: SegmentId, b: SegmentId) -> Option<f64> {
        let table = &self.index.segments;
        Some(jaccard(&table.get(a)?.shingles, &table.get(b)?.shingles))
    }

    /// Find every duplicate group.
    ///
    /// Uses `min_similarity`, `min_duplicates` and `io_threads` from
    /// `options`. Groups come back in report order.
    ///
    /// # Errors
    ///
    /// Returns [`FinderError::InconsistentIndex`] when the index and the
    /// segment table disagree, and [`FinderError::Interrupted`] when the
    /// shutdown flag was raised. No partial group is ever returned.
    pub fn find_all(
        &self,
        options: &DuplicateFinderOptions,
    ) -> Result<(Vec<DuplicateGroup>, DetectionStats), FinderError> {
        let start_time = Instant::now();
        let segments = self.index.segments.as_slice();
        let mut stats = DetectionStats {
            segments: segments.len(),
            ..Default::default()
        };

        if let Some(ref callback) = self.progress_callback {
            callback.on_phase_start("analysis", segments.len());
        }
        log::info!(
            "Analyzing {} segments ({} distinct shingles, {} shared)",
            segments.len(),
            self.index.shingles.len(),
            self.index.shingles.shared_shingles()
        );

        let processed = AtomicUsize::new(0);
        let pool = WorkerPool::new(options.worker_threads());
        let per_segment: Vec<(Vec<Edge>, usize)> = pool.install(|| {
            segments
                .par_iter()
                .map(|segment| {
                    let scored = self.score_candidates(segment, options.min_similarity);
                    let current = processed.fetch_add(1, Ordering::Relaxed) + 1;
                    if let Some(ref callback) = self.progress_callback {
                        if let Some(path) = self.index.segments.file_path(segment.file) {
                            callback.on_progress(current, path.to_string_lossy().as_ref());
                        }
                    }
                    scored
                })
                .collect::<Result<Vec<_>, FinderError>>()
        })?;

        // the parallel phase has drained; nothing from it is reported
        if self.is_shutdown_requested() {
            log::info!("Analysis: Interrupted by shutdown signal");
            return Err(FinderError::Interrupted);
        }

        let mut edges = Vec::new();
        for (segment_edges, candidates) in per_segment {
            stats.candidate_pairs += candidates;
            edges.extend(segment_edges);
        }
        stats.edges = edges.len();

        let groups = self.cluster(&edges, options.effective_min_duplicates(), &mut stats);

        if let Some(ref callback) = self.progress_callback {
            callback.on_phase_end("analysis");
        }

        stats.duration = start_time.elapsed();
        log::info!(
            "Analysis complete: {} candidate pairs, {} edges, {} groups ({} discarded) ({:?})",
            stats.candidate_pairs,
            stats.edges,
            stats.groups,
            stats.discarded_groups,
            stats.duration
        );

        Ok((groups, stats))
    }

    /// Score every higher-numbered segment sharing a shingle with
    /// `segment`. Returns the accepted edges and the number of candidates.
    fn score_candidates(
        &self,
        segment: &Segment,
        min_similarity: f64,
    ) -> Result<(Vec<Edge>, usize), FinderError> {
        if self.is_shutdown_requested() {
            return Ok((Vec::new(), 0));
        }

        let mut candidates: Vec<SegmentId> = Vec::new();
        for &fingerprint in segment.shingles.iter() {
            let posting = self.index.shingles.postings(fingerprint);
            let split = posting.partition_point(|&id| id <= segment.id);
            if split == 0 || posting[split - 1] != segment.id {
                return Err(FinderError::InconsistentIndex {
                    segment: segment.id,
                    fingerprint,
                });
            }
            candidates.extend_from_slice(&posting[split..]);
        }
        candidates.sort_unstable();
        candidates.dedup();

        let mut edges = Vec::new();
        for &other in &candidates {
            let Some(other_segment) = self.index.segments.get(other) else {
                return Err(FinderError::InconsistentIndex {
                    segment: other,
                    fingerprint: first_shared(&segment.shingles, &self.index.shingles, other),
                });
            };
            let score = jaccard(&segment.shingles, &other_segment.shingles);
            if score >= min_similarity {
                log::trace!("Edge {} - {}: {:.4}", segment.id, other, score);
                edges.push(Edge {
                    a: segment.id,
                    b: other,
                    score,
                });
            }
        }
        Ok((edges, candidates.len()))
    }

    /// Connected components of the edge set, as groups.
    fn cluster(
        &self,
        edges: &[Edge],
        min_members: usize,
        stats: &mut DetectionStats,
    ) -> Vec<DuplicateGroup> {
        let table = &self.index.segments;
        let mut sets = UnionFind::new(table.len());
        for edge in edges {
            sets.union(edge.a.index(), edge.b.index());
        }

        // root -> (weakest edge, members); BTreeMap keeps iteration stable
        let mut components: BTreeMap<usize, (f64, Vec<SegmentId>)> = BTreeMap::new();
        for edge in edges {
            let root = sets.find(edge.a.index());
            let entry = components.entry(root).or_insert((f64::INFINITY, Vec::new()));
            entry.0 = entry.0.min(edge.score);
            entry.1.push(edge.a);
            entry.1.push(edge.b);
        }
        stats.components = components.len();

        let mut groups = Vec::new();
        for (_, (similarity, mut ids)) in components {
            ids.sort_unstable();
            ids.dedup();
            if ids.len() < min_members {
                log::debug!(
                    "Discarding group of {} segments (fewer than {})",
                    ids.len(),
                    min_members
                );
                stats.discarded_groups += 1;
                continue;
            }
            let members = ids
                .into_iter()
                .filter_map(|id| {
                    let segment = table.get(id)?;
                    Some(DuplicateMember {
                        segment: id,
                        path: table.file_path(segment.file)?.to_path_buf(),
                        range: segment.range.clone(),
                        depth: segment.depth,
                        length: segment.length,
                    })
                })
                .collect();
            groups.push(DuplicateGroup::new(similarity, members));
        }

        sort_groups(&mut groups);
        stats.groups = groups.len();
        stats.duplicated_segments = groups.iter().map(DuplicateGroup::len).sum();
        groups
    }
}

/// A shingle of `shingles` whose posting lists `other`, for diagnostics.
fn first_shared(shingles: &[u64], index: &crate::index::ShingleIndex, other: SegmentId) -> u64 {
    shingles
        .iter()
        .copied()
        .find(|&fp| index.postings(fp).binary_search(&other).is_ok())
        .unwrap_or_default()
}
