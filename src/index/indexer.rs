//! Corpus indexer: walk, parse and shingle every in-scope file.
//!
//! # Pipeline
//!
//! 1. **Walk** - Collect in-scope files from the root in sorted order
//! 2. **Parse** - Parse and shingle files in parallel on a bounded pool;
//!    every worker returns a private result for its file
//! 3. **Merge** - Append results to the segment table and shingle index
//!    in walk order, which makes identifiers deterministic
//!
//! In low-memory mode files go through steps 2 and 3 in batches sized from
//! the available memory and segment text is dropped once shingled.

use std::ops::Range;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;

use super::{
    shingle_fingerprints, CorpusIndex, FileError, IndexError, IndexStats, ReparseSettings,
    SegmentTable, ShingleIndex,
};
use crate::options::DuplicateFinderOptions;
use crate::parsing::{ContentParser, NormalizedText};
use crate::progress::ProgressCallback;
use crate::scanner::{FileEntry, Walker, WalkerConfig};

/// Smallest low-memory batch, in files.
pub const MIN_BATCH_SIZE: usize = 16;
/// Largest low-memory batch, in files.
pub const MAX_BATCH_SIZE: usize = 1024;

/// Memory budgeted per in-flight file when sizing low-memory batches.
const BYTES_PER_BATCHED_FILE: u64 = 4 * 1024 * 1024;

/// Segment produced by a worker, before it gets an identifier.
struct PendingSegment {
    range: Range<usize>,
    depth: usize,
    length: usize,
    text: Option<Arc<str>>,
    shingles: Box<[u64]>,
}

/// Everything one worker learned about one file.
struct IndexedFile {
    entry: FileEntry,
    segments: Vec<PendingSegment>,
    seen: usize,
    too_short: usize,
}

/// Builds a [`CorpusIndex`] from the files under the configured root.
///
/// # Example
///
/// ```no_run
/// use fragdupe::index::CorpusIndexer;
/// use fragdupe::options::DuplicateFinderOptions;
///
/// let options = DuplicateFinderOptions::new("docs").with_file_mask(["md"]);
/// let (index, stats) = CorpusIndexer::new(&options).index_directory().unwrap();
/// println!(
///     "{} segments from {} files in {:?}",
///     index.segments.len(),
///     stats.files_indexed,
///     stats.duration
/// );
/// ```
pub struct CorpusIndexer<'a> {
    options: &'a DuplicateFinderOptions,
    shutdown_flag: Option<Arc<AtomicBool>>,
    progress_callback: Option<Arc<dyn ProgressCallback>>,
}

impl std::fmt::Debug for CorpusIndexer<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CorpusIndexer")
            .field("options", &self.options)
            .field("shutdown_flag", &self.shutdown_flag)
            .field("progress_callback", &self.progress_callback.is_some())
            .finish()
    }
}

impl<'a> CorpusIndexer<'a> {
    /// Create an indexer over `options`.
    #[must_use]
    pub fn new(options: &'a DuplicateFinderOptions) -> Self {
        Self {
            options,
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

    /// Index every in-scope file under the root.
    ///
    /// Files that cannot be read or parsed are skipped and recorded in
    /// [`IndexStats::errors`]. Segments shorter than
    /// [`DuplicateFinderOptions::effective_min_length`] or without a single
    /// shingle are dropped.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::Configuration`] for invalid options or an
    /// unusable root, and [`IndexError::Interrupted`] when the shutdown
    /// flag is raised. An interrupted run yields no partial index.
    pub fn index_directory(&self) -> Result<(CorpusIndex, IndexStats), IndexError> {
        let start_time = Instant::now();
        self.options.validate()?;

        let parser = ContentParser::resolve(self.options);
        let mut stats = IndexStats {
            parser: Some(parser),
            low_memory: self.options.low_memory,
            ..Default::default()
        };

        let files = self.collect_files(&mut stats);
        if self.is_shutdown_requested() {
            log::info!("Indexing: Interrupted by shutdown signal during walk");
            return Err(IndexError::Interrupted);
        }
        stats.files_seen = files.len();

        let batch_size = if self.options.low_memory {
            low_memory_batch_size()
        } else {
            files.len().max(1)
        };
        stats.batch_size = batch_size;

        log::info!(
            "Indexing {} files with the {} parser{}",
            files.len(),
            parser,
            if self.options.low_memory {
                format!(" (low-memory mode, batches of {batch_size})")
            } else {
                String::new()
            }
        );

        if let Some(ref callback) = self.progress_callback {
            callback.on_phase_start("indexing", files.len());
        }

        let mut segments = SegmentTable::new(ReparseSettings {
            parser,
            inline_nested: self.options.inline_nested,
            keep_whitespace: self.options.keep_whitespace,
        });
        let mut shingles = ShingleIndex::new();
        let processed = AtomicUsize::new(0);
        let retain_text = !self.options.low_memory;
        let pool = WorkerPool::new(self.options.worker_threads());

        for batch in files.chunks(batch_size) {
            let results: Vec<Option<Result<IndexedFile, FileError>>> = pool.install(|| {
                batch
                    .par_iter()
                    .map(|entry| {
                        if self.is_shutdown_requested() {
                            return None;
                        }
                        let result = self.index_file(entry, parser, retain_text);
                        let current = processed.fetch_add(1, Ordering::Relaxed) + 1;
                        if let Some(ref callback) = self.progress_callback {
                            callback.on_progress(current, entry.path.to_string_lossy().as_ref());
                            callback.on_item_completed(entry.size);
                        }
                        Some(result)
                    })
                    .collect()
            });

            // the batch has drained; nothing from it is kept on interruption
            if self.is_shutdown_requested() {
                log::info!("Indexing: Interrupted by shutdown signal");
                return Err(IndexError::Interrupted);
            }

            for result in results.into_iter().flatten() {
                match result {
                    Ok(indexed) => merge_file(indexed, &mut segments, &mut shingles, &mut stats),
                    Err(e) => {
                        log::warn!("Skipping {}", e);
                        stats.failed_files += 1;
                        stats.errors.push(e);
                    }
                }
            }
        }

        if let Some(ref callback) = self.progress_callback {
            callback.on_phase_end("indexing");
        }

        stats.distinct_shingles = shingles.len();
        stats.duration = start_time.elapsed();

        log::info!(
            "Indexing complete: {} segments from {} files, {} distinct shingles, {} failed ({:?})",
            stats.segments_indexed,
            stats.files_indexed,
            stats.distinct_shingles,
            stats.failed_files,
            stats.duration
        );

        Ok((CorpusIndex { segments, shingles }, stats))
    }

    /// Walk the root, recording walk errors as failed files.
    fn collect_files(&self, stats: &mut IndexStats) -> Vec<FileEntry> {
        let mut walker = Walker::new(&self.options.root, WalkerConfig::from(self.options));
        if let Some(ref flag) = self.shutdown_flag {
            walker = walker.with_shutdown_flag(Arc::clone(flag));
        }

        let mut files = Vec::new();
        for entry in walker.walk() {
            match entry {
                Ok(file) => {
                    log::trace!("Found file: {}", file.path.display());
                    files.push(file);
                }
                Err(e) => {
                    stats.failed_files += 1;
                    stats.errors.push(FileError::Scan(e));
                }
            }
        }
        files
    }

    /// Read, parse, filter and shingle one file.
    fn index_file(
        &self,
        entry: &FileEntry,
        parser: ContentParser,
        retain_text: bool,
    ) -> Result<IndexedFile, FileError> {
        let bytes = std::fs::read(&entry.path).map_err(|source| FileError::Read {
            path: entry.path.clone(),
            source,
        })?;
        let parsed = parser
            .parse_bytes(&bytes, self.options.inline_nested)
            .map_err(|source| FileError::Parse {
                path: entry.path.clone(),
                source,
            })?;

        let min_length = self.options.effective_min_length();
        let mut indexed = IndexedFile {
            entry: FileEntry::new(entry.path.clone(), bytes.len() as u64),
            segments: Vec::new(),
            seen: parsed.len(),
            too_short: 0,
        };

        for segment in parsed {
            let normalized = NormalizedText::new(&segment.text, self.options.keep_whitespace);
            let length = normalized.char_len();
            if length < min_length {
                indexed.too_short += 1;
                continue;
            }
            let fingerprints = shingle_fingerprints(&normalized, self.options.ngram_length);
            if fingerprints.is_empty() {
                indexed.too_short += 1;
                continue;
            }
            indexed.segments.push(PendingSegment {
                range: segment.range,
                depth: segment.depth,
                length,
                text: retain_text.then(|| Arc::from(normalized.into_string())),
                shingles: fingerprints,
            });
        }

        log::trace!(
            "Parsed {}: {} segments, {} kept",
            entry.path.display(),
            indexed.seen,
            indexed.segments.len()
        );
        Ok(indexed)
    }
}

/// Append one file's segments, assigning identifiers in order.
fn merge_file(
    indexed: IndexedFile,
    segments: &mut SegmentTable,
    shingles: &mut ShingleIndex,
    stats: &mut IndexStats,
) {
    stats.files_indexed += 1;
    stats.bytes_read += indexed.entry.size;
    stats.segments_seen += indexed.seen;
    stats.segments_too_short += indexed.too_short;

    if indexed.segments.is_empty() {
        return;
    }

    let file = segments.add_file(indexed.entry.path);
    for pending in indexed.segments {
        let id = segments.push(
            file,
            pending.range,
            pending.depth,
            pending.length,
            pending.text,
            pending.shingles,
        );
        if let Some(segment) = segments.get(id) {
            shingles.insert_segment(id, &segment.shingles);
        }
        stats.segments_indexed += 1;
    }
}

/// Batch size for low-memory mode, derived from available memory.
#[must_use]
pub fn low_memory_batch_size() -> usize {
    let mut system = sysinfo::System::new();
    system.refresh_memory();
    let available = system.available_memory();

    // a quarter of what is free, split across in-flight files
    let batch = usize::try_from(available / 4 / BYTES_PER_BATCHED_FILE).unwrap_or(MAX_BATCH_SIZE);
    let batch = batch.clamp(MIN_BATCH_SIZE, MAX_BATCH_SIZE);
    log::debug!(
        "Low-memory batch size: {} files ({} bytes available)",
        batch,
        available
    );
    batch
}

/// Dedicated rayon pool with a fixed number of workers, built once per
/// phase and reused for every batch of that phase.
///
/// Falls back to the global pool when the dedicated one cannot be built.
pub(crate) struct WorkerPool {
    pool: Option<rayon::ThreadPool>,
}

impl WorkerPool {
    pub(crate) fn new(threads: usize) -> Self {
        let pool = match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => Some(pool),
            Err(e) => {
                log::warn!(
                    "Failed to create custom thread pool ({}), using global pool with {} threads",
                    e,
                    rayon::current_num_threads()
                );
                None
            }
        };
        Self { pool }
    }

    /// Run `op` with its parallel iterators on this pool.
    pub(crate) fn install<R, F>(&self, op: F) -> R
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        match self.pool {
            Some(ref pool) => pool.install(op),
            None => op(),
        }
    }
}

impl std::fmt::Debug for WorkerPool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WorkerPool")
            .field("threads", &self.pool.as_ref().map(rayon::ThreadPool::current_num_threads))
            .finish()
    }
}
