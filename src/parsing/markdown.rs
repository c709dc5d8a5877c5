//! Markdown parser built on pulldown-cmark.
//!
//! Headings open sections that nest by level; a section's direct text is
//! its heading. Paragraphs, list items, block quotes, code blocks, HTML
//! blocks, footnote definitions and table cells are blocks inside the
//! innermost open block or section. Inline markup never forms a node of
//! its own, its text belongs to the enclosing block.

use pulldown_cmark::{Event, Options, Parser, Tag};

use super::tree::{NodeId, StructureTree, DOCUMENT};
use super::ParsedSegment;

/// What a `Start` event pushed, so the matching `End` knows what to undo.
#[derive(Debug, Clone, Copy)]
enum Frame {
    Block(NodeId),
    Heading,
    Transparent,
}

pub(crate) fn parse_markdown(content: &str, inline_nested: bool) -> Vec<ParsedSegment> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut tree = StructureTree::new(0..content.len());
    // (level, node) for every open section, outermost first
    let mut sections: Vec<(usize, NodeId)> = Vec::new();
    let mut frames: Vec<Frame> = Vec::new();
    let mut blocks: Vec<NodeId> = Vec::new();

    for (event, range) in Parser::new_ext(content, options).into_offset_iter() {
        match event {
            Event::Start(tag) => {
                let frame = match tag {
                    Tag::Heading { level, .. } if blocks.is_empty() => {
                        let level = level as usize;
                        while sections.last().is_some_and(|&(open, _)| open >= level) {
                            if let Some((_, node)) = sections.pop() {
                                tree.close(node, range.start);
                            }
                        }
                        let parent = sections.last().map_or(DOCUMENT, |&(_, node)| node);
                        let node = tree.open(parent, range.start);
                        sections.push((level, node));
                        Frame::Heading
                    }
                    Tag::Heading { .. }
                    | Tag::Paragraph
                    | Tag::CodeBlock(_)
                    | Tag::BlockQuote(_)
                    | Tag::HtmlBlock
                    | Tag::Item
                    | Tag::FootnoteDefinition(_)
                    | Tag::TableCell => {
                        let parent = current_container(&blocks, &sections);
                        let node = tree.open(parent, range.start);
                        blocks.push(node);
                        Frame::Block(node)
                    }
                    _ => Frame::Transparent,
                };
                frames.push(frame);
            }
            Event::End(_) => {
                if let Some(Frame::Block(node)) = frames.pop() {
                    tree.close(node, range.end);
                    blocks.pop();
                }
            }
            Event::Text(text) | Event::Code(text) | Event::Html(text) | Event::InlineHtml(text) => {
                let target = if matches!(frames.last(), Some(Frame::Heading)) {
                    sections.last().map_or(DOCUMENT, |&(_, node)| node)
                } else {
                    current_container(&blocks, &sections)
                };
                tree.push_text(target, range, text.into_string());
            }
            Event::SoftBreak | Event::HardBreak => {
                let target = current_container(&blocks, &sections);
                tree.push_text(target, range, " ");
            }
            _ => {}
        }
    }

    for (_, node) in sections {
        tree.close(node, content.len());
    }

    tree.emit(inline_nested)
}

fn current_container(blocks: &[NodeId], sections: &[(usize, NodeId)]) -> NodeId {
    blocks
        .last()
        .copied()
        .or_else(|| sections.last().map(|&(_, node)| node))
        .unwrap_or(DOCUMENT)
}
