//! Key/value property file parser.
//!
//! Follows the `.properties` conventions: `#` and `!` start comments, the
//! key ends at the first unescaped `=`, `:` or whitespace, and a line ending
//! in an odd number of backslashes continues on the next line. Each entry's
//! value is one segment; keys are identifiers and would only dilute matches.

use std::ops::Range;

use super::plain::lines_with_offsets;
use super::ParsedSegment;

pub(crate) fn parse_properties(content: &str) -> Vec<ParsedSegment> {
    let mut segments = Vec::new();
    let mut logical: Option<(Range<usize>, String)> = None;

    for (range, line) in lines_with_offsets(content) {
        let (start, mut text) = match logical.take() {
            Some((prev, mut text)) => {
                text.push_str(line.trim_start());
                (prev.start, text)
            }
            None => {
                let trimmed = line.trim_start();
                if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!') {
                    continue;
                }
                (range.start, trimmed.to_string())
            }
        };

        if ends_with_continuation(&text) {
            text.pop();
            logical = Some((start..range.end, text));
            continue;
        }

        push_entry(&mut segments, start..range.end, &text);
    }

    if let Some((range, text)) = logical {
        push_entry(&mut segments, range, &text);
    }

    segments
}

fn push_entry(segments: &mut Vec<ParsedSegment>, range: Range<usize>, line: &str) {
    let value = unescape(split_value(line));
    if value.trim().is_empty() {
        return;
    }
    segments.push(ParsedSegment {
        range,
        depth: 0,
        text: value,
    });
}

fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|&c| c == '\\').count() % 2 == 1
}

/// Return the raw value part of a logical line.
fn split_value(line: &str) -> &str {
    let mut escaped = false;
    let mut key_end = line.len();
    for (idx, ch) in line.char_indices() {
        if escaped {
            escaped = false;
            continue;
        }
        match ch {
            '\\' => escaped = true,
            '=' | ':' => {
                return line[idx + ch.len_utf8()..].trim_start();
            }
            c if c.is_whitespace() => {
                key_end = idx;
                break;
            }
            _ => {}
        }
    }

    let rest = line[key_end..].trim_start();
    rest.strip_prefix(['=', ':']).map_or(rest, str::trim_start)
}

fn unescape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                match u32::from_str_radix(&hex, 16).ok().and_then(char::from_u32) {
                    Some(decoded) => out.push(decoded),
                    None => {
                        out.push_str("\\u");
                        out.push_str(&hex);
                    }
                }
            }
            Some(other) => out.push(other),
            None => {}
        }
    }
    out
}
