//! Corpus index: the segment table and the inverted shingle index.
//!
//! This module provides:
//! - [`SegmentTable`], an arena of immutable [`Segment`]s addressed by
//!   dense [`SegmentId`]s, plus the table of indexed files
//! - [`ShingleIndex`], the inverted mapping from shingle fingerprint to
//!   the segments containing it
//! - [`CorpusIndexer`], which walks the root and builds both
//!
//! The index stores identifiers, never references, so segments and their
//! postings have no ownership relation. Once built it is read-only.

pub mod indexer;

use std::collections::HashMap;
use std::fmt;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

pub use indexer::CorpusIndexer;

use crate::options::ConfigurationError;
use crate::parsing::{ContentParser, NormalizedText, ParseError};
use crate::scanner::ScanError;

/// Token separator fed to the hasher between the tokens of a window.
const TOKEN_SEPARATOR: &[u8] = "\u{1f}".as_bytes();

/// Dense identifier of a segment; its position in the [`SegmentTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SegmentId(pub u32);

impl SegmentId {
    /// Arena position.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Dense identifier of an indexed file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FileId(pub u32);

impl FileId {
    /// Position in the file table.
    #[must_use]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// One comparable content unit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Stable identifier
    pub id: SegmentId,
    /// Owning file
    pub file: FileId,
    /// Byte range in the owning file
    pub range: Range<usize>,
    /// Nesting depth
    pub depth: usize,
    /// Character count of the normalized text
    pub length: usize,
    /// Normalized text; `None` when indexed in low-memory mode
    pub text: Option<Arc<str>>,
    /// Sorted, deduplicated shingle fingerprints
    pub shingles: Box<[u64]>,
}

/// Compute the shingle set of normalized text.
///
/// Each window of `ngram_length` consecutive tokens is hashed with BLAKE3
/// and the first eight bytes are kept. The result is sorted and free of
/// duplicates, and empty when the text has fewer than `ngram_length`
/// tokens.
///
/// # Example
///
/// ```
/// use fragdupe::index::shingle_fingerprints;
/// use fragdupe::parsing::NormalizedText;
///
/// let text = NormalizedText::new("to be or not to be", false);
/// // "to be or", "be or not", "or not to", "not to be"
/// assert_eq!(shingle_fingerprints(&text, 3).len(), 4);
/// assert!(shingle_fingerprints(&text, 7).is_empty());
/// ```
#[must_use]
pub fn shingle_fingerprints(text: &NormalizedText, ngram_length: usize) -> Box<[u64]> {
    let mut fingerprints: Vec<u64> = text
        .windows(ngram_length)
        .map(|window| {
            let mut hasher = blake3::Hasher::new();
            for (i, token) in window.iter().enumerate() {
                if i > 0 {
                    hasher.update(TOKEN_SEPARATOR);
                }
                hasher.update(token.as_bytes());
            }
            let hash = hasher.finalize();
            let mut prefix = [0u8; 8];
            prefix.copy_from_slice(&hash.as_bytes()[..8]);
            u64::from_le_bytes(prefix)
        })
        .collect();
    fingerprints.sort_unstable();
    fingerprints.dedup();
    fingerprints.into_boxed_slice()
}

/// How segment text is recovered when it was not retained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReparseSettings {
    /// Parser the corpus was indexed with
    pub parser: ContentParser,
    /// Nested-element folding used at index time
    pub inline_nested: bool,
    /// Whitespace handling used at index time
    pub keep_whitespace: bool,
}

/// Arena of segments and the files they belong to.
#[derive(Debug, Clone)]
pub struct SegmentTable {
    files: Vec<PathBuf>,
    segments: Vec<Segment>,
    reparse: ReparseSettings,
}

impl SegmentTable {
    /// Create an empty table.
    #[must_use]
    pub fn new(reparse: ReparseSettings) -> Self {
        Self {
            files: Vec::new(),
            segments: Vec::new(),
            reparse,
        }
    }

    /// Register a file and return its identifier.
    pub(crate) fn add_file(&mut self, path: PathBuf) -> FileId {
        let id = FileId(to_u32(self.files.len()));
        self.files.push(path);
        id
    }

    /// Append a segment, assigning the next identifier.
    pub(crate) fn push(
        &mut self,
        file: FileId,
        range: Range<usize>,
        depth: usize,
        length: usize,
        text: Option<Arc<str>>,
        shingles: Box<[u64]>,
    ) -> SegmentId {
        let id = SegmentId(to_u32(self.segments.len()));
        self.segments.push(Segment {
            id,
            file,
            range,
            depth,
            length,
            text,
            shingles,
        });
        id
    }

    /// Look up a segment.
    #[must_use]
    pub fn get(&self, id: SegmentId) -> Option<&Segment> {
        self.segments.get(id.index())
    }

    /// Number of segments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// True when no segment was retained.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// All segments in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = &Segment> + '_ {
        self.segments.iter()
    }

    /// Segments as a slice, for parallel iteration.
    #[must_use]
    pub fn as_slice(&self) -> &[Segment] {
        &self.segments
    }

    /// Number of files that contributed segments.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    /// Path of a file.
    #[must_use]
    pub fn file_path(&self, file: FileId) -> Option<&Path> {
        self.files.get(file.index()).map(PathBuf::as_path)
    }

    /// Path of the file owning a segment.
    #[must_use]
    pub fn path_of(&self, id: SegmentId) -> Option<&Path> {
        self.get(id).and_then(|segment| self.file_path(segment.file))
    }

    /// Normalized text of a segment.
    ///
    /// Returns the retained text when there is one. Otherwise the owning
    /// file is read again and re-parsed with the settings it was indexed
    /// with, and the segment with the same range and depth is looked up.
    ///
    /// # Errors
    ///
    /// Returns [`IndexError::UnknownSegment`] for an identifier outside the
    /// table, [`IndexError::File`] when the file can no longer be read or
    /// parsed, and [`IndexError::StaleSegment`] when the file changed so
    /// that the segment no longer exists.
    pub fn segment_text(&self, id: SegmentId) -> Result<Arc<str>, IndexError> {
        let segment = self.get(id).ok_or(IndexError::UnknownSegment(id))?;
        if let Some(text) = &segment.text {
            return Ok(Arc::clone(text));
        }

        let path = self
            .file_path(segment.file)
            .ok_or(IndexError::UnknownSegment(id))?;
        log::trace!("Re-reading {} for segment {}", path.display(), id);

        let bytes = std::fs::read(path).map_err(|source| FileError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let parsed = self
            .reparse
            .parser
            .parse_bytes(&bytes, self.reparse.inline_nested)
            .map_err(|source| FileError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        parsed
            .into_iter()
            .find(|p| p.range == segment.range && p.depth == segment.depth)
            .map(|p| Arc::from(NormalizedText::new(&p.text, self.reparse.keep_whitespace).into_string()))
            .ok_or_else(|| IndexError::StaleSegment {
                id,
                path: path.to_path_buf(),
            })
    }
}

/// Inverted index from shingle fingerprint to segment identifiers.
///
/// Postings are sorted and hold each identifier at most once.
#[derive(Debug, Clone, Default)]
pub struct ShingleIndex {
    postings: HashMap<u64, Vec<SegmentId>>,
}

impl ShingleIndex {
    /// Create an empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record every shingle of a segment.
    ///
    /// Segments must be inserted in increasing identifier order, which is
    /// what keeps postings sorted.
    pub(crate) fn insert_segment(&mut self, id: SegmentId, shingles: &[u64]) {
        for &fingerprint in shingles {
            let posting = self.postings.entry(fingerprint).or_default();
            debug_assert!(posting.last().is_none_or(|&last| last < id));
            posting.push(id);
        }
    }

    /// Segments containing a shingle.
    #[must_use]
    pub fn postings(&self, fingerprint: u64) -> &[SegmentId] {
        self.postings.get(&fingerprint).map_or(&[], Vec::as_slice)
    }

    /// Number of distinct shingles.
    #[must_use]
    pub fn len(&self) -> usize {
        self.postings.len()
    }

    /// True when nothing was indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.postings.is_empty()
    }

    /// Iterate over `(fingerprint, postings)` entries in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &[SegmentId])> + '_ {
        self.postings.iter().map(|(&fp, ids)| (fp, ids.as_slice()))
    }

    /// Number of shingles shared by two or more segments.
    #[must_use]
    pub fn shared_shingles(&self) -> usize {
        self.postings.values().filter(|ids| ids.len() >= 2).count()
    }
}

/// Output of the indexing phase, handed read-only to detection.
#[derive(Debug, Clone)]
pub struct CorpusIndex {
    /// Segment arena and file table
    pub segments: SegmentTable,
    /// Inverted shingle index
    pub shingles: ShingleIndex,
}

/// A single file could not be indexed.
#[derive(thiserror::Error, Debug)]
pub enum FileError {
    /// The walker could not access an entry.
    #[error(transparent)]
    Scan(#[from] ScanError),

    /// The file could not be read.
    #[error("failed to read {path}: {source}")]
    Read {
        /// File path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The file could not be parsed under the selected format.
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// File path
        path: PathBuf,
        /// Parser diagnostic
        #[source]
        source: ParseError,
    },
}

impl FileError {
    /// Path of the failing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::Scan(e) => e.path(),
            Self::Read { path, .. } | Self::Parse { path, .. } => path,
        }
    }

    /// True for parse failures, as opposed to I/O problems.
    #[must_use]
    pub fn is_parse_failure(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}

/// Errors from the indexing phase and from segment lookups.
#[derive(thiserror::Error, Debug)]
pub enum IndexError {
    /// The options are invalid or the root cannot be read.
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    /// Indexing was interrupted by user (Ctrl+C or shutdown signal).
    #[error("Indexing interrupted by user")]
    Interrupted,

    /// No segment has this identifier.
    #[error("unknown segment {0}")]
    UnknownSegment(SegmentId),

    /// A file could not be read or parsed again.
    #[error(transparent)]
    File(#[from] FileError),

    /// The file changed since indexing and no longer holds the segment.
    #[error("segment {id} no longer found in {path}")]
    StaleSegment {
        /// Segment identifier
        id: SegmentId,
        /// File path
        path: PathBuf,
    },
}

/// Statistics from the indexing phase.
#[derive(Debug, Default)]
pub struct IndexStats {
    /// Parser used for every file
    pub parser: Option<ContentParser>,
    /// Files yielded by the walker
    pub files_seen: usize,
    /// Files parsed successfully
    pub files_indexed: usize,
    /// Files skipped because of an error
    pub failed_files: usize,
    /// Per-file errors, in walk order
    pub errors: Vec<FileError>,
    /// Bytes read from disk
    pub bytes_read: u64,
    /// Segments produced by parsers
    pub segments_seen: usize,
    /// Segments kept after the length filter
    pub segments_indexed: usize,
    /// Segments dropped by the length filter or for lack of shingles
    pub segments_too_short: usize,
    /// Distinct shingle fingerprints
    pub distinct_shingles: usize,
    /// Whether low-memory mode was used
    pub low_memory: bool,
    /// Files per batch (equal to the file count outside low-memory mode)
    pub batch_size: usize,
    /// Elapsed time
    pub duration: Duration,
}

impl IndexStats {
    /// Files that failed to parse, as opposed to failing to be read.
    #[must_use]
    pub fn parse_failures(&self) -> usize {
        self.errors.iter().filter(|e| e.is_parse_failure()).count()
    }
}

fn to_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
