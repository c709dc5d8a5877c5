//! Output formatters for duplicate reports.
//!
//! This module provides different output formats for reports:
//! - Text for reading in a terminal
//! - JSON for automation and scripting
//!
//! # Example
//!
//! ```no_run
//! use fragdupe::error::ExitCode;
//! use fragdupe::options::DuplicateFinderOptions;
//! use fragdupe::output::json::JsonOutput;
//! use fragdupe::report::{index_and_find, RunControl};
//!
//! let options = DuplicateFinderOptions::new("docs");
//! let report = index_and_find(&options, &RunControl::default()).unwrap();
//!
//! let output = JsonOutput::new(&report, ExitCode::from_report(&report));
//! println!("{}", output.to_json_pretty().unwrap());
//! ```

pub mod json;
pub mod text;

pub use json::JsonOutput;
pub use text::TextOutput;

/// Characters of segment text shown in previews.
pub const PREVIEW_CHARS: usize = 80;

/// Report output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable listing
    #[default]
    Text,
    /// JSON document
    Json,
}

/// First [`PREVIEW_CHARS`] characters of `text`, with an ellipsis when cut.
#[must_use]
pub fn preview(text: &str) -> String {
    let mut chars = text.chars();
    let head: String = chars.by_ref().take(PREVIEW_CHARS).collect();
    if chars.next().is_some() {
        format!("{head}…")
    } else {
        head
    }
}
