//! Content parsers turning one file into ordered segments.
//!
//! This module provides:
//! - [`ContentParser`], a closed set of formats (line, file, XML, Markdown,
//!   AsciiDoc, properties)
//! - Auto-detection of the format from the configured file mask
//! - [`NormalizedText`], the whitespace/Unicode normalization applied to
//!   segment text before shingling
//!
//! # Architecture
//!
//! - `plain`: line-oriented and whole-file parsing
//! - `properties`: key/value property files
//! - `xml`, `markdown`, `asciidoc`: structured formats built on a shared
//!   structure tree that decides how nested elements are emitted
//! - [`tokens`]: normalization and tokenization
//!
//! # Example
//!
//! ```
//! use fragdupe::options::{DuplicateFinderOptions, ParserType};
//! use fragdupe::parsing::ContentParser;
//!
//! let options = DuplicateFinderOptions::new(".").with_file_mask(["md"]);
//! assert_eq!(ContentParser::select(&options).unwrap(), ContentParser::Markdown);
//!
//! let segments = ContentParser::Line.parse("first\n\nsecond\n", false).unwrap();
//! assert_eq!(segments.len(), 2);
//! ```

mod asciidoc;
mod markdown;
mod plain;
mod properties;
pub mod tokens;
mod tree;
mod xml;

use std::fmt;
use std::ops::Range;

pub use tokens::NormalizedText;

use crate::options::{DuplicateFinderOptions, ParserType};

/// File extensions routed to the Markdown parser by auto-detection.
pub const MARKDOWN_EXTENSIONS: [&str; 2] = ["md", "mdx"];
/// File extensions routed to the AsciiDoc parser by auto-detection.
pub const ASCIIDOC_EXTENSIONS: [&str; 2] = ["adoc", "asciidoc"];

/// A segment as produced by a parser, before normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedSegment {
    /// Byte range in the source file
    pub range: Range<usize>,
    /// Nesting depth (0 for flat formats and the document level)
    pub depth: usize,
    /// Extracted text
    pub text: String,
}

/// A file could not be parsed under the selected format.
///
/// Non-fatal: the indexer logs it, skips the file and counts it.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// The file is not UTF-8 text.
    #[error("content is not valid UTF-8 (at byte {0})")]
    InvalidUtf8(usize),

    /// A structured document is not well-formed.
    #[error("malformed {format} document: {message}")]
    Malformed {
        /// Format name
        format: &'static str,
        /// Parser diagnostic
        message: String,
    },
}

/// Auto-detection could not pick a structured parser from the file mask.
///
/// Non-fatal: the file parser is used instead.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error(
    "couldn't match a parser to the file mask [{}], defaulting to the 'file' parser; \
     use the --parser option to choose one explicitly",
    .mask.join(", ")
)]
pub struct AutoDetectionAmbiguous {
    /// The file mask that was examined
    pub mask: Vec<String>,
}

/// Supported content formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentParser {
    /// One segment per line
    Line,
    /// Whole file as one segment
    File,
    /// XML elements
    Xml,
    /// Markdown sections and blocks
    Markdown,
    /// AsciiDoc sections and blocks
    AsciiDoc,
    /// Key/value entries
    Properties,
}

impl ContentParser {
    /// Choose the parser for a run.
    ///
    /// An explicit parser is used as is. For [`ParserType::Auto`] the file
    /// mask decides: only `xml` selects XML, a subset of
    /// [`MARKDOWN_EXTENSIONS`] selects Markdown and a subset of
    /// [`ASCIIDOC_EXTENSIONS`] selects AsciiDoc.
    ///
    /// # Errors
    ///
    /// Returns [`AutoDetectionAmbiguous`] when auto-detection cannot decide.
    pub fn select(options: &DuplicateFinderOptions) -> Result<Self, AutoDetectionAmbiguous> {
        match options.parser {
            ParserType::Line => Ok(Self::Line),
            ParserType::File => Ok(Self::File),
            ParserType::Xml => Ok(Self::Xml),
            ParserType::Markdown => Ok(Self::Markdown),
            ParserType::AsciiDoc => Ok(Self::AsciiDoc),
            ParserType::Properties => Ok(Self::Properties),
            ParserType::Auto => {
                if options.mask_includes_only("xml") {
                    Ok(Self::Xml)
                } else if options.mask_is_subset_of(&MARKDOWN_EXTENSIONS) {
                    Ok(Self::Markdown)
                } else if options.mask_is_subset_of(&ASCIIDOC_EXTENSIONS) {
                    Ok(Self::AsciiDoc)
                } else {
                    Err(AutoDetectionAmbiguous {
                        mask: options.file_mask.iter().cloned().collect(),
                    })
                }
            }
        }
    }

    /// Choose the parser, falling back to [`ContentParser::File`] with a
    /// warning when auto-detection is ambiguous.
    #[must_use]
    pub fn resolve(options: &DuplicateFinderOptions) -> Self {
        Self::select(options).unwrap_or_else(|diagnostic| {
            log::warn!("{}", diagnostic);
            Self::File
        })
    }

    /// Display name of the format.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Line => "line",
            Self::File => "file",
            Self::Xml => "xml",
            Self::Markdown => "markdown",
            Self::AsciiDoc => "asciidoc",
            Self::Properties => "properties",
        }
    }

    /// Parse raw file bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::InvalidUtf8`] for non-UTF-8 input, or any error
    /// from [`parse`](Self::parse).
    pub fn parse_bytes(self, bytes: &[u8], inline_nested: bool) -> Result<Vec<ParsedSegment>, ParseError> {
        let content =
            std::str::from_utf8(bytes).map_err(|e| ParseError::InvalidUtf8(e.valid_up_to()))?;
        self.parse(content, inline_nested)
    }

    /// Parse file content into segments in source order.
    ///
    /// Calling this again on the same content yields the same sequence.
    ///
    /// # Arguments
    ///
    /// * `content` - The file content
    /// * `inline_nested` - Fold nested elements into their top-level
    ///   enclosing segment (structured formats only)
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Malformed`] for XML that is not well-formed.
    pub fn parse(self, content: &str, inline_nested: bool) -> Result<Vec<ParsedSegment>, ParseError> {
        // offsets stay relative to the file even when a byte order mark is skipped
        let (content, bom) = match content.strip_prefix('\u{feff}') {
            Some(rest) => (rest, '\u{feff}'.len_utf8()),
            None => (content, 0),
        };
        let mut segments = match self {
            Self::Line => plain::parse_lines(content),
            Self::File => plain::parse_file(content),
            Self::Xml => xml::parse_xml(content, inline_nested)?,
            Self::Markdown => markdown::parse_markdown(content, inline_nested),
            Self::AsciiDoc => asciidoc::parse_asciidoc(content, inline_nested),
            Self::Properties => properties::parse_properties(content),
        };
        if bom > 0 {
            for segment in &mut segments {
                segment.range = segment.range.start + bom..segment.range.end + bom;
            }
        }
        Ok(segments)
    }
}

impl fmt::Display for ContentParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
