//! AsciiDoc parser.
//!
//! AsciiDoc has no widely used Rust parser, so this is a line classifier
//! covering the structural subset that matters for duplicate detection:
//! section titles (`=` to `======`), paragraphs, list items and delimited
//! blocks. Comments, attribute entries, block attribute lines and block
//! titles are skipped.

use std::sync::LazyLock;

use regex::Regex;

use super::plain::lines_with_offsets;
use super::tree::{NodeId, StructureTree, DOCUMENT};
use super::ParsedSegment;

static SECTION_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(={1,6})\s+(\S.*)$").expect("valid regex"));
static DELIMITER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(-{4,}|\.{4,}|={4,}|\*{4,}|_{4,}|\+{4,}|/{4,})\s*$").expect("valid regex")
});
static LIST_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*(\*{1,5}|-|\.{1,5}|\d+\.)\s+(\S.*)$").expect("valid regex"));
static ATTRIBUTE_ENTRY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^:!?[\w-]+!?:").expect("valid regex"));
static BLOCK_ATTRIBUTES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[.*\]\s*$").expect("valid regex"));
static BLOCK_TITLE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\.[^\s.]").expect("valid regex"));

/// Open paragraph or list item that following lines continue.
struct OpenBlock {
    node: NodeId,
    list_item: bool,
}

/// Open delimited block.
struct Delimited {
    delimiter: String,
    node: Option<NodeId>,
}

pub(crate) fn parse_asciidoc(content: &str, inline_nested: bool) -> Vec<ParsedSegment> {
    let mut tree = StructureTree::new(0..content.len());
    let mut sections: Vec<(usize, NodeId)> = Vec::new();
    let mut open: Option<OpenBlock> = None;
    let mut delimited: Option<Delimited> = None;

    let container = |sections: &[(usize, NodeId)]| sections.last().map_or(DOCUMENT, |&(_, node)| node);

    for (range, line) in lines_with_offsets(content) {
        if let Some(block) = delimited.as_ref() {
            if line.trim_end() == block.delimiter {
                if let Some(node) = block.node {
                    tree.close(node, range.end);
                }
                delimited = None;
            } else if let Some(node) = block.node {
                tree.push_text(node, range.clone(), line);
                tree.push_text(node, range.end..range.end, "\n");
            }
            continue;
        }

        let trimmed = line.trim_end();

        if trimmed.trim_start().is_empty() {
            open = None;
            continue;
        }

        if DELIMITER.is_match(trimmed) {
            open = None;
            // comment blocks carry no content
            let node = if trimmed.starts_with('/') {
                None
            } else {
                let parent = container(&sections);
                Some(tree.open(parent, range.start))
            };
            delimited = Some(Delimited {
                delimiter: trimmed.to_string(),
                node,
            });
            continue;
        }

        if trimmed.starts_with("//") || ATTRIBUTE_ENTRY.is_match(trimmed) || BLOCK_ATTRIBUTES.is_match(trimmed) {
            open = None;
            continue;
        }

        if let Some(caps) = SECTION_TITLE.captures(trimmed) {
            open = None;
            let level = caps[1].len();
            while sections.last().is_some_and(|&(open_level, _)| open_level >= level) {
                if let Some((_, node)) = sections.pop() {
                    tree.close(node, range.start);
                }
            }
            let parent = container(&sections);
            let node = tree.open(parent, range.start);
            if let Some(title) = caps.get(2) {
                let start = range.start + title.start();
                tree.push_text(node, start..start + title.len(), title.as_str());
            }
            sections.push((level, node));
            continue;
        }

        let list_item = LIST_ITEM.captures(trimmed).filter(|caps| {
            // a line opening with dots inside a paragraph is prose, not `. item`
            !caps[1].starts_with('.') || open.as_ref().is_none_or(|block| block.list_item)
        });
        if let Some(caps) = list_item {
            let parent = container(&sections);
            let node = tree.open(parent, range.start);
            if let Some(text) = caps.get(2) {
                let start = range.start + text.start();
                tree.push_text(node, start..start + text.len(), text.as_str());
            }
            tree.close(node, range.end);
            open = Some(OpenBlock { node, list_item: true });
            continue;
        }

        if open.is_none() && BLOCK_TITLE.is_match(trimmed) {
            continue;
        }

        let node = match open.as_ref() {
            Some(block) => block.node,
            None => {
                let parent = container(&sections);
                let node = tree.open(parent, range.start);
                open = Some(OpenBlock { node, list_item: false });
                node
            }
        };
        tree.push_text(node, range.start..range.start + trimmed.len(), trimmed);
        tree.close(node, range.end);
    }

    if let Some(Delimited { node: Some(node), .. }) = delimited {
        tree.close(node, content.len());
    }
    for (_, node) in sections {
        tree.close(node, content.len());
    }

    tree.emit(inline_nested)
}
