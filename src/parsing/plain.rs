//! Line-oriented and whole-file parsers.

use super::ParsedSegment;

/// Iterate over lines with their byte ranges, line terminators excluded.
pub(crate) fn lines_with_offsets(content: &str) -> impl Iterator<Item = (std::ops::Range<usize>, &str)> {
    let mut offset = 0;
    content.split_inclusive('\n').map(move |raw| {
        let start = offset;
        offset += raw.len();
        let line = raw.strip_suffix('\n').unwrap_or(raw);
        let line = line.strip_suffix('\r').unwrap_or(line);
        (start..start + line.len(), line)
    })
}

/// One segment per non-blank line.
pub(crate) fn parse_lines(content: &str) -> Vec<ParsedSegment> {
    lines_with_offsets(content)
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(range, line)| ParsedSegment {
            range,
            depth: 0,
            text: line.to_string(),
        })
        .collect()
}

/// The whole file as one segment, unless it is blank.
pub(crate) fn parse_file(content: &str) -> Vec<ParsedSegment> {
    if content.trim().is_empty() {
        return Vec::new();
    }
    vec![ParsedSegment {
        range: 0..content.len(),
        depth: 0,
        text: content.to_string(),
    }]
}
