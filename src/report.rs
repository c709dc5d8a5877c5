//! Report assembly: run both phases and package the result.
//!
//! [`index_and_find`] is the entry point for drivers. It indexes the root,
//! checks for cancellation, runs detection and returns a
//! [`DuplicateFinderReport`] holding the groups in report order together
//! with the timings and statistics of both phases.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::duplicates::{DetectionStats, DuplicateDetector, DuplicateGroup, DuplicateMember, FinderError};
use crate::index::{CorpusIndexer, IndexError, IndexStats, SegmentTable};
use crate::options::DuplicateFinderOptions;
use crate::progress::ProgressCallback;

/// Cancellation and progress hooks for a run.
#[derive(Clone, Default)]
pub struct RunControl {
    shutdown_flag: Option<Arc<AtomicBool>>,
    progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for RunControl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunControl")
            .field("shutdown_flag", &self.shutdown_flag)
            .field("progress_callback", &self.progress_callback.is_some())
            .finish()
    }
}

impl RunControl {
    /// Set the shutdown flag for graceful termination.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// Set a progress callback for both phases.
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
}

/// Errors that abort a run.
#[derive(thiserror::Error, Debug)]
pub enum RunError {
    /// Indexing failed.
    #[error(transparent)]
    Index(#[from] IndexError),

    /// Detection failed.
    #[error(transparent)]
    Detection(#[from] FinderError),

    /// The run was cancelled between the two phases.
    #[error("Run interrupted by user")]
    Interrupted,
}

impl RunError {
    /// True when the run stopped because of the shutdown flag.
    #[must_use]
    pub fn is_interrupted(&self) -> bool {
        matches!(
            self,
            Self::Interrupted
                | Self::Index(IndexError::Interrupted)
                | Self::Detection(FinderError::Interrupted)
        )
    }
}

/// Final result of a run.
#[derive(Debug)]
pub struct DuplicateFinderReport {
    /// Duplicate groups, highest similarity first
    pub groups: Vec<DuplicateGroup>,
    /// Time spent indexing
    pub index_duration: Duration,
    /// Time spent on detection
    pub analysis_duration: Duration,
    /// Indexing statistics, including per-file errors
    pub index_stats: IndexStats,
    /// Detection statistics
    pub detection_stats: DetectionStats,
    /// Segment table, for text lookups
    pub segments: SegmentTable,
}

impl DuplicateFinderReport {
    /// True when no group was found.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Indexing plus analysis time.
    #[must_use]
    pub fn total_duration(&self) -> Duration {
        self.index_duration + self.analysis_duration
    }

    /// True when some files could not be indexed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.index_stats.failed_files > 0
    }

    /// Number of segments across all groups.
    #[must_use]
    pub fn duplicated_segments(&self) -> usize {
        self.groups.iter().map(DuplicateGroup::len).sum()
    }

    /// Characters removable by keeping one copy per group.
    #[must_use]
    pub fn redundant_length(&self) -> usize {
        self.groups.iter().map(DuplicateGroup::redundant_length).sum()
    }

    /// Normalized text of a member, re-read from disk in low-memory mode.
    ///
    /// Returns `None` and logs when the text cannot be recovered.
    #[must_use]
    pub fn member_text(&self, member: &DuplicateMember) -> Option<Arc<str>> {
        match self.segments.segment_text(member.segment) {
            Ok(text) => Some(text),
            Err(e) => {
                log::warn!("No text for {}: {}", member.path.display(), e);
                None
            }
        }
    }
}

/// Index the root and find all duplicate groups.
///
/// Cancellation is checked between the phases; an interrupted run
/// produces no report.
///
/// # Errors
///
/// Returns [`RunError::Index`] for configuration problems or an
/// interrupted indexing phase, [`RunError::Interrupted`] when cancelled
/// between phases, and [`RunError::Detection`] for an inconsistent index or
/// an interrupted analysis.
///
/// # Example
///
/// ```no_run
/// use fragdupe::options::DuplicateFinderOptions;
/// use fragdupe::report::{index_and_find, RunControl};
///
/// let options = DuplicateFinderOptions::new("docs").with_min_length(40);
/// let report = index_and_find(&options, &RunControl::default()).unwrap();
/// for group in &report.groups {
///     println!("{:.2}: {} members", group.similarity, group.len());
/// }
/// ```
pub fn index_and_find(
    options: &DuplicateFinderOptions,
    control: &RunControl,
) -> Result<DuplicateFinderReport, RunError> {
    let mut indexer = CorpusIndexer::new(options);
    if let Some(ref flag) = control.shutdown_flag {
        indexer = indexer.with_shutdown_flag(Arc::clone(flag));
    }
    if let Some(ref callback) = control.progress_callback {
        indexer = indexer.with_progress_callback(Arc::clone(callback));
    }
    let (index, index_stats) = indexer.index_directory()?;

    if control.is_shutdown_requested() {
        log::info!("Interrupted before analysis");
        return Err(RunError::Interrupted);
    }

    let mut detector = DuplicateDetector::new(&index);
    if let Some(ref flag) = control.shutdown_flag {
        detector = detector.with_shutdown_flag(Arc::clone(flag));
    }
    if let Some(ref callback) = control.progress_callback {
        detector = detector.with_progress_callback(Arc::clone(callback));
    }
    let (groups, detection_stats) = detector.find_all(options)?;

    Ok(DuplicateFinderReport {
        groups,
        index_duration: index_stats.duration,
        analysis_duration: detection_stats.duration,
        index_stats,
        detection_stats,
        segments: index.segments,
    })
}
