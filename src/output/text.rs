//! Human-readable text output.
//!
//! Lists each group with its members and a preview of the representative,
//! then a summary. Colors come from `yansi` and are turned off globally by
//! the driver when stdout is not a terminal.

use std::io::{self, Write};

use bytesize::ByteSize;
use yansi::Paint;

use super::preview;
use crate::report::DuplicateFinderReport;

/// Text renderer for a report.
#[derive(Debug)]
pub struct TextOutput<'a> {
    report: &'a DuplicateFinderReport,
    verbose: bool,
}

impl<'a> TextOutput<'a> {
    /// Create a renderer. Verbose output adds timings and per-file errors.
    #[must_use]
    pub fn new(report: &'a DuplicateFinderReport, verbose: bool) -> Self {
        Self { report, verbose }
    }

    /// Write the listing and the summary.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        for (number, group) in self.report.groups.iter().enumerate() {
            writeln!(
                writer,
                "{} {} {}",
                format!("Group {}", number + 1).bold(),
                format!("similarity {:.3}", group.similarity).green(),
                format!("({} segments in {} files)", group.len(), group.file_count()).dim()
            )?;
            for member in &group.members {
                writeln!(
                    writer,
                    "  {} [{}..{}] depth {}, {} chars",
                    member.path.display(),
                    member.range.start,
                    member.range.end,
                    member.depth,
                    member.length
                )?;
            }
            if let Some(text) = group
                .representative()
                .and_then(|member| self.report.member_text(member))
            {
                writeln!(writer, "    {}", preview(&text).dim())?;
            }
            writeln!(writer)?;
        }

        self.write_summary(writer)
    }

    fn write_summary<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let report = self.report;
        let stats = &report.index_stats;

        if report.is_empty() {
            writeln!(writer, "{}", "No duplicates found.".yellow())?;
        } else {
            writeln!(
                writer,
                "{} duplicate groups, {} duplicated segments, {} redundant chars",
                report.groups.len().bold(),
                report.duplicated_segments(),
                report.redundant_length()
            )?;
        }

        writeln!(
            writer,
            "Indexed {} of {} files ({}), {} segments, {} distinct shingles",
            stats.files_indexed,
            stats.files_seen,
            ByteSize::b(stats.bytes_read),
            stats.segments_indexed,
            stats.distinct_shingles
        )?;

        if self.verbose {
            writeln!(writer, "Indexing took {:?}", report.index_duration)?;
            writeln!(writer, "Analysis took {:?}", report.analysis_duration)?;
            writeln!(
                writer,
                "Scored {} candidate pairs, accepted {} edges",
                report.detection_stats.candidate_pairs, report.detection_stats.edges
            )?;
            writeln!(writer, "Failed files: {}", stats.failed_files)?;
            for error in &stats.errors {
                writeln!(writer, "  {}", error.to_string().red())?;
            }
        } else if stats.failed_files > 0 {
            writeln!(
                writer,
                "{}",
                format!("{} files could not be indexed (use -v for details)", stats.failed_files)
                    .yellow()
            )?;
        }
        Ok(())
    }
}
