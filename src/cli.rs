//! Command-line interface definitions for fragdupe.
//!
//! Every detection flag is optional. A flag that is given overrides the
//! value from the configuration file and environment (see [`crate::config`]).
//!
//! # Example
//!
//! ```bash
//! # Scan a documentation tree with the defaults
//! fragdupe --root docs
//!
//! # Markdown only, looser threshold, JSON report
//! fragdupe --root docs --parser md --file-mask md --min-similarity 0.8 --format json
//!
//! # Large corpus: keep memory bounded
//! fragdupe --root docs --memory
//! ```

use std::path::PathBuf;
use std::str::FromStr;

use clap::Parser;

use crate::config::Config;
use crate::options::{DuplicateFinderOptions, ParserType};
use crate::output::OutputFormat;

/// Near-duplicate content fragment detector.
///
/// fragdupe splits documentation files into fragments (paragraphs, XML
/// elements, Markdown blocks, property values, lines) and reports groups
/// of fragments whose word shingles overlap above a Jaccard threshold.
#[derive(Debug, Parser)]
#[command(name = "fragdupe")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all output except errors and the report
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, env = "NO_COLOR")]
    pub no_color: bool,

    /// Content root to scan
    #[arg(long, value_name = "PATH")]
    pub root: PathBuf,

    /// Parser: line, file, xml, md, adoc, properties or auto
    #[arg(long, value_name = "NAME", value_parser = parse_parser_type)]
    pub parser: Option<ParserType>,

    /// Minimum Jaccard similarity for two fragments to be linked (0..=1)
    #[arg(long, value_name = "RATIO")]
    pub min_similarity: Option<f64>,

    /// Minimum fragment length in characters
    #[arg(long, value_name = "CHARS")]
    pub min_length: Option<usize>,

    /// Minimum number of fragments in a reported group (at least 2 is enforced)
    #[arg(long, value_name = "N")]
    pub min_duplicates: Option<usize>,

    /// Comma-separated file extensions to scan (e.g. md,adoc)
    #[arg(long, value_name = "EXTS", value_delimiter = ',')]
    pub file_mask: Option<Vec<String>>,

    /// Shingle size in words
    #[arg(long = "gram", value_name = "N")]
    pub ngram_length: Option<usize>,

    /// Low-memory mode: index in batches and drop fragment text
    #[arg(long = "memory")]
    pub low_memory: bool,

    /// Treat whitespace runs as tokens
    #[arg(long)]
    pub keep_whitespace: bool,

    /// Fold nested elements into their top-level fragment
    #[arg(long = "inline")]
    pub inline_nested: bool,

    /// Report format
    #[arg(long, value_enum, value_name = "FORMAT")]
    pub format: Option<OutputFormat>,

    /// Extra TOML configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Worker threads for parsing and scoring (0 = one per core)
    #[arg(long, value_name = "N")]
    pub io_threads: Option<usize>,

    /// Glob patterns to ignore (can be specified multiple times)
    ///
    /// These patterns are added to any .gitignore patterns found.
    #[arg(short, long = "ignore", value_name = "PATTERN")]
    pub ignore_patterns: Vec<String>,

    /// Skip hidden files and directories (starting with .)
    #[arg(long)]
    pub skip_hidden: bool,

    /// Follow symbolic links during the walk
    ///
    /// Warning: May cause infinite loops if symlinks form cycles.
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Do not draw progress bars
    #[arg(long)]
    pub no_progress: bool,

    /// Print errors as JSON on stderr
    #[arg(long)]
    pub json_errors: bool,
}

impl Cli {
    /// Report format after applying the configuration.
    #[must_use]
    pub fn format(&self, config: &Config) -> OutputFormat {
        self.format.unwrap_or(config.format)
    }

    /// Run options: `config` with the given flags applied on top.
    #[must_use]
    pub fn options(&self, config: Config) -> DuplicateFinderOptions {
        let mut config = config;
        if let Some(value) = self.min_similarity {
            config.min_similarity = value;
        }
        if let Some(value) = self.min_length {
            config.min_length = value;
        }
        if let Some(value) = self.min_duplicates {
            config.min_duplicates = value;
        }
        if let Some(ref mask) = self.file_mask {
            config.file_mask = mask.clone();
        }
        if let Some(parser) = self.parser {
            config.parser = parser;
        }
        if let Some(value) = self.ngram_length {
            config.ngram_length = value;
        }
        if let Some(value) = self.io_threads {
            config.io_threads = value;
        }
        config.low_memory |= self.low_memory;
        config.keep_whitespace |= self.keep_whitespace;
        config.inline_nested |= self.inline_nested;
        config.skip_hidden |= self.skip_hidden;
        config.follow_symlinks |= self.follow_symlinks;
        config.ignore_patterns.extend(self.ignore_patterns.iter().cloned());

        config
            .into_options(self.root.clone())
            .with_verbose(self.verbose > 0)
    }
}

/// Parse a `--parser` value, with a suggestion for near misses.
///
/// ```
/// use fragdupe::cli::parse_parser_type;
/// use fragdupe::options::ParserType;
///
/// assert_eq!(parse_parser_type("markdown").unwrap(), ParserType::Markdown);
/// assert!(parse_parser_type("yaml").is_err());
/// ```
///
/// # Errors
///
/// Returns the message of the configuration error for unknown names.
pub fn parse_parser_type(s: &str) -> Result<ParserType, String> {
    ParserType::from_str(s).map_err(|e| e.to_string())
}
