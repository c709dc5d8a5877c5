//! Layered configuration.
//!
//! Settings are merged with figment, later layers winning:
//!
//! 1. Built-in defaults
//! 2. `config.toml` in the platform config directory
//!    (`~/.config/fragdupe/config.toml` on Linux)
//! 3. A TOML file given with `--config`
//! 4. Environment variables prefixed `FRAGDUPE_` (e.g. `FRAGDUPE_MIN_LENGTH=50`)
//! 5. Command-line flags, applied by the caller
//!
//! A file that fails to load is logged and the defaults are used.

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::options::{
    DuplicateFinderOptions, ParserType, DEFAULT_MIN_DUPLICATES, DEFAULT_MIN_LENGTH,
    DEFAULT_MIN_SIMILARITY, DEFAULT_NGRAM_LENGTH,
};
use crate::output::OutputFormat;

/// Environment variable prefix.
pub const ENV_PREFIX: &str = "FRAGDUPE_";

/// Persistent run settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Pairwise acceptance threshold
    pub min_similarity: f64,
    /// Minimum segment length in characters
    pub min_length: usize,
    /// Minimum group size
    pub min_duplicates: usize,
    /// Extensions in scope; empty means all files
    pub file_mask: Vec<String>,
    /// Parser selection
    pub parser: ParserType,
    /// Shingle size in tokens
    pub ngram_length: usize,
    /// Low-memory mode
    pub low_memory: bool,
    /// Keep whitespace runs as tokens
    pub keep_whitespace: bool,
    /// Fold nested elements into their top-level segment
    pub inline_nested: bool,
    /// Follow symbolic links
    pub follow_symlinks: bool,
    /// Skip hidden files and directories
    pub skip_hidden: bool,
    /// Gitignore-style patterns to skip
    pub ignore_patterns: Vec<String>,
    /// Worker threads (0 = one per core)
    pub io_threads: usize,
    /// Report format
    pub format: OutputFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            min_similarity: DEFAULT_MIN_SIMILARITY,
            min_length: DEFAULT_MIN_LENGTH,
            min_duplicates: DEFAULT_MIN_DUPLICATES,
            file_mask: Vec::new(),
            parser: ParserType::Auto,
            ngram_length: DEFAULT_NGRAM_LENGTH,
            low_memory: false,
            keep_whitespace: false,
            inline_nested: false,
            follow_symlinks: false,
            skip_hidden: false,
            ignore_patterns: Vec::new(),
            io_threads: 0,
            format: OutputFormat::Text,
        }
    }
}

impl Config {
    /// Load the merged configuration.
    ///
    /// # Arguments
    ///
    /// * `explicit` - Extra TOML file layered over the default one
    #[must_use]
    pub fn load(explicit: Option<&Path>) -> Self {
        match Self::figment(Self::default_path().as_deref(), explicit).extract() {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to load configuration, using defaults: {}", e);
                Self::default()
            }
        }
    }

    /// Build the figment for the given files, without extracting it.
    #[must_use]
    pub fn figment(default_file: Option<&Path>, explicit: Option<&Path>) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if let Some(path) = default_file {
            figment = figment.merge(Toml::file(path));
        }
        if let Some(path) = explicit {
            log::debug!("Loading configuration from {}", path.display());
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX))
    }

    /// Default platform-specific configuration path.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("com", "fragdupe", "fragdupe").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Convert into run options for `root`.
    #[must_use]
    pub fn into_options(self, root: PathBuf) -> DuplicateFinderOptions {
        DuplicateFinderOptions::new(root)
            .with_min_similarity(self.min_similarity)
            .with_min_length(self.min_length)
            .with_min_duplicates(self.min_duplicates)
            .with_file_mask(self.file_mask)
            .with_parser(self.parser)
            .with_ngram_length(self.ngram_length)
            .with_low_memory(self.low_memory)
            .with_keep_whitespace(self.keep_whitespace)
            .with_inline_nested(self.inline_nested)
            .with_follow_symlinks(self.follow_symlinks)
            .with_skip_hidden(self.skip_hidden)
            .with_ignore_patterns(self.ignore_patterns)
            .with_io_threads(self.io_threads)
    }
}
