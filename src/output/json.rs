//! JSON output formatter for duplicate reports.
//!
//! Provides machine-readable JSON output for scripting and automation.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "groups": [
//!     {
//!       "similarity": 1.0,
//!       "members": [
//!         {
//!           "path": "/docs/a.md",
//!           "start": 120,
//!           "end": 480,
//!           "depth": 2,
//!           "length": 352,
//!           "preview": "Install the tool with..."
//!         }
//!       ]
//!     }
//!   ],
//!   "summary": {
//!     "parser": "markdown",
//!     "files_indexed": 42,
//!     "failed_files": 0,
//!     "segments_indexed": 910,
//!     "duplicate_groups": 3,
//!     "index_duration_ms": 85,
//!     "analysis_duration_ms": 12,
//!     "exit_code": 0,
//!     "exit_code_name": "FD000"
//!   }
//! }
//! ```

use std::io::Write;

use serde::Serialize;

use super::preview;
use crate::duplicates::{DuplicateGroup, DuplicateMember};
use crate::error::ExitCode;
use crate::report::DuplicateFinderReport;

/// A group member in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonMember {
    /// Path to the file holding the segment
    pub path: String,
    /// Start byte offset
    pub start: usize,
    /// End byte offset (exclusive)
    pub end: usize,
    /// Nesting depth
    pub depth: usize,
    /// Character count of the normalized text
    pub length: usize,
    /// Leading part of the normalized text
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
}

impl JsonMember {
    fn from_member(member: &DuplicateMember, report: &DuplicateFinderReport) -> Self {
        Self {
            path: member.path.to_string_lossy().into_owned(),
            start: member.range.start,
            end: member.range.end,
            depth: member.depth,
            length: member.length,
            preview: report.member_text(member).map(|text| preview(&text)),
        }
    }
}

/// A duplicate group in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonDuplicateGroup {
    /// Weakest pairwise similarity in the group
    pub similarity: f64,
    /// Members, representative first
    pub members: Vec<JsonMember>,
}

impl JsonDuplicateGroup {
    fn from_group(group: &DuplicateGroup, report: &DuplicateFinderReport) -> Self {
        Self {
            similarity: group.similarity,
            members: group
                .members
                .iter()
                .map(|m| JsonMember::from_member(m, report))
                .collect(),
        }
    }
}

/// Summary statistics in JSON format.
#[derive(Debug, Clone, Serialize)]
pub struct JsonSummary {
    /// Parser used for every file
    pub parser: String,
    /// Files yielded by the walker
    pub files_seen: usize,
    /// Files indexed successfully
    pub files_indexed: usize,
    /// Files skipped because of an error
    pub failed_files: usize,
    /// Bytes read while indexing
    pub bytes_read: u64,
    /// Segments produced by parsers
    pub segments_seen: usize,
    /// Segments kept after the length filter
    pub segments_indexed: usize,
    /// Distinct shingle fingerprints
    pub distinct_shingles: usize,
    /// Candidate pairs scored
    pub candidate_pairs: usize,
    /// Number of groups reported
    pub duplicate_groups: usize,
    /// Segments across all groups
    pub duplicated_segments: usize,
    /// Characters removable by keeping one copy per group
    pub redundant_length: usize,
    /// Indexing time in milliseconds
    pub index_duration_ms: u64,
    /// Detection time in milliseconds
    pub analysis_duration_ms: u64,
    /// Whether low-memory mode was used
    pub low_memory: bool,
    /// Per-file error messages
    pub errors: Vec<String>,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "FD000")
    pub exit_code_name: String,
}

impl JsonSummary {
    /// Create a JSON summary from a report and an exit code.
    #[must_use]
    pub fn from_report(report: &DuplicateFinderReport, exit_code: ExitCode) -> Self {
        let index = &report.index_stats;
        Self {
            parser: index.parser.map(|p| p.to_string()).unwrap_or_default(),
            files_seen: index.files_seen,
            files_indexed: index.files_indexed,
            failed_files: index.failed_files,
            bytes_read: index.bytes_read,
            segments_seen: index.segments_seen,
            segments_indexed: index.segments_indexed,
            distinct_shingles: index.distinct_shingles,
            candidate_pairs: report.detection_stats.candidate_pairs,
            duplicate_groups: report.groups.len(),
            duplicated_segments: report.duplicated_segments(),
            redundant_length: report.redundant_length(),
            index_duration_ms: duration_ms(report.index_duration),
            analysis_duration_ms: duration_ms(report.analysis_duration),
            low_memory: index.low_memory,
            errors: index.errors.iter().map(ToString::to_string).collect(),
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix().to_string(),
        }
    }
}

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput {
    /// Duplicate groups in report order
    pub groups: Vec<JsonDuplicateGroup>,
    /// Run summary
    pub summary: JsonSummary,
}

impl JsonOutput {
    /// Build the JSON view of a report.
    ///
    /// Member previews are looked up through the report, which re-reads
    /// files when the run used low-memory mode.
    #[must_use]
    pub fn new(report: &DuplicateFinderReport, exit_code: ExitCode) -> Self {
        Self {
            groups: report
                .groups
                .iter()
                .map(|g| JsonDuplicateGroup::from_group(g, report))
                .collect(),
            summary: JsonSummary::from_report(report, exit_code),
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails (unlikely for valid data).
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON to a writer, followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

fn duration_ms(duration: std::time::Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
