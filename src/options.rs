//! Run options shared by every stage of the pipeline.
//!
//! [`DuplicateFinderOptions`] is an immutable snapshot built once by the
//! driver and passed by reference to the indexer and the detector. The
//! builder methods follow the `with_*` convention; call
//! [`DuplicateFinderOptions::validate`] before starting a run.
//!
//! # Example
//!
//! ```
//! use fragdupe::options::{DuplicateFinderOptions, ParserType};
//!
//! let options = DuplicateFinderOptions::new(".")
//!     .with_min_length(2)
//!     .with_ngram_length(5)
//!     .with_parser(ParserType::Line);
//!
//! // The internal length threshold never drops below the shingle size.
//! assert_eq!(options.effective_min_length(), 5);
//! ```

use std::collections::BTreeSet;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Default pairwise acceptance threshold.
pub const DEFAULT_MIN_SIMILARITY: f64 = 0.9;
/// Default minimum segment length in characters.
pub const DEFAULT_MIN_LENGTH: usize = 100;
/// Default minimum group size.
pub const DEFAULT_MIN_DUPLICATES: usize = 1;
/// Default shingle size in tokens.
pub const DEFAULT_NGRAM_LENGTH: usize = 3;

/// Content parser selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParserType {
    /// One segment per line
    Line,
    /// Whole file as one segment
    File,
    /// XML elements
    Xml,
    /// Markdown sections and blocks
    #[serde(rename = "md", alias = "markdown")]
    Markdown,
    /// AsciiDoc sections and blocks
    #[serde(rename = "adoc", alias = "asciidoc")]
    AsciiDoc,
    /// Key/value property entries
    Properties,
    /// Pick a parser from the file mask
    #[default]
    Auto,
}

impl ParserType {
    /// Canonical names accepted on the command line and in config files.
    pub const NAMES: [&'static str; 7] = ["line", "file", "xml", "md", "adoc", "properties", "auto"];

    /// Canonical name of this parser.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Line => "line",
            Self::File => "file",
            Self::Xml => "xml",
            Self::Markdown => "md",
            Self::AsciiDoc => "adoc",
            Self::Properties => "properties",
            Self::Auto => "auto",
        }
    }
}

impl fmt::Display for ParserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ParserType {
    type Err = ConfigurationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_lowercase();
        match name.as_str() {
            "line" => Ok(Self::Line),
            "file" => Ok(Self::File),
            "xml" => Ok(Self::Xml),
            "md" | "markdown" => Ok(Self::Markdown),
            "adoc" | "asciidoc" => Ok(Self::AsciiDoc),
            "properties" => Ok(Self::Properties),
            "auto" => Ok(Self::Auto),
            _ => Err(ConfigurationError::UnknownParser {
                name: s.to_string(),
                suggestion: suggest_parser_name(&name),
            }),
        }
    }
}

/// Closest valid parser name, if any is reasonably close.
fn suggest_parser_name(name: &str) -> Option<&'static str> {
    ParserType::NAMES
        .iter()
        .map(|candidate| (strsim::jaro_winkler(name, candidate), *candidate))
        .filter(|(score, _)| *score > 0.7)
        .max_by(|a, b| a.0.total_cmp(&b.0))
        .map(|(_, candidate)| candidate)
}

/// Invalid configuration; fatal before indexing starts.
#[derive(thiserror::Error, Debug)]
pub enum ConfigurationError {
    /// Similarity threshold outside `[0, 1]`.
    #[error("minimum similarity must be within [0, 1], got {0}")]
    InvalidSimilarity(f64),

    /// Shingle size of zero.
    #[error("ngram length must be at least 1")]
    InvalidNgramLength,

    /// Group size threshold of zero.
    #[error("minimum duplicates must be at least 1")]
    InvalidMinDuplicates,

    /// Unrecognized parser name.
    #[error("invalid parser '{name}', allowed values are: {}{}", ParserType::NAMES.join(", "), suggestion_hint(.suggestion))]
    UnknownParser {
        /// The rejected name
        name: String,
        /// Closest valid name
        suggestion: Option<&'static str>,
    },

    /// The root path does not exist.
    #[error("root path not found: {0}")]
    RootNotFound(PathBuf),

    /// The root path is not a directory.
    #[error("root path is not a directory: {0}")]
    RootNotADirectory(PathBuf),

    /// The root directory cannot be listed.
    #[error("root path is not readable: {path}: {source}")]
    RootUnreadable {
        /// The root path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Immutable configuration for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateFinderOptions {
    /// Content root to scan
    pub root: PathBuf,
    /// Pairwise acceptance threshold (Jaccard)
    pub min_similarity: f64,
    /// Minimum segment length in characters, as configured
    pub min_length: usize,
    /// Minimum number of members for a reported group
    pub min_duplicates: usize,
    /// Lowercase extensions to include; empty means all files
    pub file_mask: BTreeSet<String>,
    /// Parser selection
    pub parser: ParserType,
    /// Print timing and failure summaries
    pub verbose: bool,
    /// Discard segment text after shingling and index in batches
    pub low_memory: bool,
    /// Shingle size in tokens
    pub ngram_length: usize,
    /// Treat whitespace runs as significant tokens
    pub keep_whitespace: bool,
    /// Fold nested structure into top-level segments
    pub inline_nested: bool,
    /// Follow symbolic links while walking
    pub follow_symlinks: bool,
    /// Skip hidden files and directories
    pub skip_hidden: bool,
    /// Extra gitignore-style patterns
    pub ignore_patterns: Vec<String>,
    /// Worker threads for parsing; 0 means one per core
    pub io_threads: usize,
}

impl DuplicateFinderOptions {
    /// Options with defaults for the given root.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            min_similarity: DEFAULT_MIN_SIMILARITY,
            min_length: DEFAULT_MIN_LENGTH,
            min_duplicates: DEFAULT_MIN_DUPLICATES,
            file_mask: BTreeSet::new(),
            parser: ParserType::Auto,
            verbose: false,
            low_memory: false,
            ngram_length: DEFAULT_NGRAM_LENGTH,
            keep_whitespace: false,
            inline_nested: false,
            follow_symlinks: false,
            skip_hidden: false,
            ignore_patterns: Vec::new(),
            io_threads: 0,
        }
    }

    /// Set the pairwise similarity threshold.
    #[must_use]
    pub fn with_min_similarity(mut self, value: f64) -> Self {
        self.min_similarity = value;
        self
    }

    /// Set the minimum segment length.
    #[must_use]
    pub fn with_min_length(mut self, value: usize) -> Self {
        self.min_length = value;
        self
    }

    /// Set the minimum group size.
    #[must_use]
    pub fn with_min_duplicates(mut self, value: usize) -> Self {
        self.min_duplicates = value;
        self
    }

    /// Set the file mask from extension names.
    ///
    /// Entries are lowercased; a leading `*.` or `.` is stripped and empty
    /// entries are dropped.
    #[must_use]
    pub fn with_file_mask<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.file_mask = extensions
            .into_iter()
            .map(|ext| normalize_extension(ext.as_ref()))
            .filter(|ext| !ext.is_empty())
            .collect();
        self
    }

    /// Set the parser.
    #[must_use]
    pub fn with_parser(mut self, parser: ParserType) -> Self {
        self.parser = parser;
        self
    }

    /// Enable verbose summaries.
    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Enable low-memory mode.
    #[must_use]
    pub fn with_low_memory(mut self, enabled: bool) -> Self {
        self.low_memory = enabled;
        self
    }

    /// Set the shingle size in tokens.
    #[must_use]
    pub fn with_ngram_length(mut self, value: usize) -> Self {
        self.ngram_length = value;
        self
    }

    /// Keep whitespace runs as tokens.
    #[must_use]
    pub fn with_keep_whitespace(mut self, enabled: bool) -> Self {
        self.keep_whitespace = enabled;
        self
    }

    /// Fold nested structure into enclosing segments.
    #[must_use]
    pub fn with_inline_nested(mut self, enabled: bool) -> Self {
        self.inline_nested = enabled;
        self
    }

    /// Follow symbolic links.
    #[must_use]
    pub fn with_follow_symlinks(mut self, enabled: bool) -> Self {
        self.follow_symlinks = enabled;
        self
    }

    /// Skip hidden entries.
    #[must_use]
    pub fn with_skip_hidden(mut self, enabled: bool) -> Self {
        self.skip_hidden = enabled;
        self
    }

    /// Set extra ignore patterns.
    #[must_use]
    pub fn with_ignore_patterns(mut self, patterns: Vec<String>) -> Self {
        self.ignore_patterns = patterns;
        self
    }

    /// Set the worker thread count (0 = one per core).
    #[must_use]
    pub fn with_io_threads(mut self, threads: usize) -> Self {
        self.io_threads = threads;
        self
    }

    /// Length threshold applied during indexing.
    ///
    /// Always at least the shingle size, whatever `min_length` says.
    #[must_use]
    pub fn effective_min_length(&self) -> usize {
        self.min_length.max(self.ngram_length)
    }

    /// Group size threshold applied during detection.
    ///
    /// A group always has two or more members.
    #[must_use]
    pub fn effective_min_duplicates(&self) -> usize {
        self.min_duplicates.max(2)
    }

    /// Worker thread count with `0` resolved to the core count.
    #[must_use]
    pub fn worker_threads(&self) -> usize {
        if self.io_threads == 0 {
            std::thread::available_parallelism().map_or(1, std::num::NonZeroUsize::get)
        } else {
            self.io_threads
        }
    }

    /// True when the mask names exactly one extension, `ext`.
    #[must_use]
    pub fn mask_includes_only(&self, ext: &str) -> bool {
        self.file_mask.len() == 1 && self.file_mask.contains(ext)
    }

    /// True when the mask is non-empty and every entry is in `extensions`.
    #[must_use]
    pub fn mask_is_subset_of(&self, extensions: &[&str]) -> bool {
        !self.file_mask.is_empty()
            && self
                .file_mask
                .iter()
                .all(|ext| extensions.contains(&ext.as_str()))
    }

    /// Validate thresholds and the root path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError`] for out-of-range thresholds or a root
    /// that is missing, not a directory, or cannot be listed.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if !(0.0..=1.0).contains(&self.min_similarity) {
            return Err(ConfigurationError::InvalidSimilarity(self.min_similarity));
        }
        if self.ngram_length == 0 {
            return Err(ConfigurationError::InvalidNgramLength);
        }
        if self.min_duplicates == 0 {
            return Err(ConfigurationError::InvalidMinDuplicates);
        }
        if !self.root.exists() {
            return Err(ConfigurationError::RootNotFound(self.root.clone()));
        }
        if !self.root.is_dir() {
            return Err(ConfigurationError::RootNotADirectory(self.root.clone()));
        }
        std::fs::read_dir(&self.root).map_err(|source| ConfigurationError::RootUnreadable {
            path: self.root.clone(),
            source,
        })?;
        Ok(())
    }
}

fn suggestion_hint(suggestion: &Option<&'static str>) -> String {
    suggestion
        .map(|s| format!(" (did you mean '{s}'?)"))
        .unwrap_or_default()
}

fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim();
    let ext = ext.strip_prefix("*.").unwrap_or(ext);
    let ext = ext.strip_prefix('.').unwrap_or(ext);
    ext.to_lowercase()
}
