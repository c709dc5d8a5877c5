//! Structure tree shared by the XML, Markdown and AsciiDoc parsers.
//!
//! Parsers open and close nodes while reading their input and attach text
//! pieces to the innermost open node. Node 0 is the document node. When the
//! tree is complete, [`StructureTree::emit`] turns it into segments:
//!
//! - without inlining, every node that has direct text becomes a segment at
//!   its own depth;
//! - with inlining, every child of the document becomes one segment holding
//!   the text of its whole subtree, and nothing below it is emitted.
//!
//! The document node's own direct text is emitted at depth 0 in both modes.

use std::ops::Range;

use super::ParsedSegment;

/// Index of a node in the tree arena.
pub(crate) type NodeId = usize;

/// The document node.
pub(crate) const DOCUMENT: NodeId = 0;

#[derive(Debug, Clone)]
struct TextPiece {
    range: Range<usize>,
    text: String,
}

#[derive(Debug, Clone)]
struct Node {
    range: Range<usize>,
    depth: usize,
    pieces: Vec<TextPiece>,
    children: Vec<NodeId>,
}

/// Arena-backed tree of structural nodes.
#[derive(Debug, Clone)]
pub(crate) struct StructureTree {
    nodes: Vec<Node>,
}

impl StructureTree {
    /// Tree with a document node spanning `range`.
    pub(crate) fn new(range: Range<usize>) -> Self {
        Self {
            nodes: vec![Node {
                range,
                depth: 0,
                pieces: Vec::new(),
                children: Vec::new(),
            }],
        }
    }

    /// Open a child of `parent` starting at `start`. The end is provisional
    /// until [`close`](Self::close) is called.
    pub(crate) fn open(&mut self, parent: NodeId, start: usize) -> NodeId {
        let id = self.nodes.len();
        let depth = self.nodes[parent].depth + 1;
        self.nodes.push(Node {
            range: start..start,
            depth,
            pieces: Vec::new(),
            children: Vec::new(),
        });
        self.nodes[parent].children.push(id);
        id
    }

    /// Set the end offset of `node`.
    pub(crate) fn close(&mut self, node: NodeId, end: usize) {
        let range = &mut self.nodes[node].range;
        range.end = end.max(range.start);
    }

    /// Set the start offset of `node`.
    pub(crate) fn set_start(&mut self, node: NodeId, start: usize) {
        self.nodes[node].range.start = start;
    }

    /// Attach text found at `range` to `node`.
    pub(crate) fn push_text(&mut self, node: NodeId, range: Range<usize>, text: impl Into<String>) {
        let text = text.into();
        if text.is_empty() {
            return;
        }
        self.nodes[node].pieces.push(TextPiece { range, text });
    }

    /// Emit segments in source order.
    pub(crate) fn emit(&self, inline_nested: bool) -> Vec<ParsedSegment> {
        let mut out = Vec::new();
        let document = &self.nodes[DOCUMENT];
        self.push_segment(&mut out, document.range.clone(), 0, join(document.pieces.iter()));

        if inline_nested {
            for &child in &document.children {
                let node = &self.nodes[child];
                let mut pieces = Vec::new();
                self.collect_subtree(child, &mut pieces);
                pieces.sort_by_key(|p| p.range.start);
                self.push_segment(&mut out, node.range.clone(), node.depth, join(pieces.into_iter()));
            }
        } else {
            for &child in &document.children {
                self.emit_flat(child, &mut out);
            }
        }

        out
    }

    fn emit_flat(&self, id: NodeId, out: &mut Vec<ParsedSegment>) {
        let node = &self.nodes[id];
        self.push_segment(out, node.range.clone(), node.depth, join(node.pieces.iter()));
        for &child in &node.children {
            self.emit_flat(child, out);
        }
    }

    fn collect_subtree<'a>(&'a self, id: NodeId, pieces: &mut Vec<&'a TextPiece>) {
        let node = &self.nodes[id];
        pieces.extend(node.pieces.iter());
        for &child in &node.children {
            self.collect_subtree(child, pieces);
        }
    }

    fn push_segment(&self, out: &mut Vec<ParsedSegment>, range: Range<usize>, depth: usize, text: String) {
        if text.trim().is_empty() {
            return;
        }
        out.push(ParsedSegment { range, depth, text });
    }
}

/// Join text pieces; pieces adjacent in the source are concatenated, others
/// are separated by a space.
fn join<'a>(pieces: impl Iterator<Item = &'a TextPiece>) -> String {
    let mut text = String::new();
    let mut last_end: Option<usize> = None;
    for piece in pieces {
        if let Some(end) = last_end {
            if end != piece.range.start {
                text.push(' ');
            }
        }
        text.push_str(&piece.text);
        last_end = Some(piece.range.end);
    }
    text
}
