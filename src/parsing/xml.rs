//! XML parser built on quick-xml.
//!
//! Every element is a node of the structure tree; the root element plays
//! the role of the document. Text and CDATA are attached to the innermost
//! open element after entity unescaping. General entities declared in the
//! internal DTD subset are expanded along with the predefined ones.
//! Comments, processing instructions and the prolog carry no content.

use std::collections::HashMap;
use std::sync::LazyLock;

use quick_xml::escape::resolve_predefined_entity;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;

use super::tree::{NodeId, StructureTree, DOCUMENT};
use super::{ParseError, ParsedSegment};

const FORMAT: &str = "XML";

fn malformed(message: impl Into<String>) -> ParseError {
    ParseError::Malformed {
        format: FORMAT,
        message: message.into(),
    }
}

// Parameter entities (`<!ENTITY % name ...>`) never match.
static ENTITY_DECL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<!ENTITY\s+([A-Za-z_:][\w.:-]*)\s+(?:"([^"]*)"|'([^']*)')\s*>"#)
        .expect("valid regex")
});

/// Internal general entities declared in a DOCTYPE body. The first
/// declaration of a name is binding.
fn declared_entities(doctype: &str) -> HashMap<String, String> {
    let mut entities = HashMap::new();
    for caps in ENTITY_DECL.captures_iter(doctype) {
        if let Some(value) = caps.get(2).or_else(|| caps.get(3)) {
            entities
                .entry(caps[1].to_string())
                .or_insert_with(|| value.as_str().to_string());
        }
    }
    entities
}

fn position(reader: &Reader<&[u8]>) -> usize {
    usize::try_from(reader.buffer_position()).unwrap_or(usize::MAX)
}

pub(crate) fn parse_xml(content: &str, inline_nested: bool) -> Result<Vec<ParsedSegment>, ParseError> {
    let mut reader = Reader::from_str(content);
    let mut tree = StructureTree::new(0..content.len());
    let mut stack: Vec<NodeId> = Vec::new();
    let mut seen_root = false;
    let mut entities: HashMap<String, String> = HashMap::new();

    loop {
        let start = position(&reader);
        let event = reader
            .read_event()
            .map_err(|e| malformed(format!("{e} (at byte {})", position(&reader))))?;
        let end = position(&reader);

        match event {
            Event::Start(_) | Event::Empty(_) => {
                let node = match stack.last() {
                    Some(&parent) => tree.open(parent, start),
                    None if seen_root => {
                        return Err(malformed(format!("multiple root elements (at byte {start})")));
                    }
                    None => {
                        seen_root = true;
                        tree.set_start(DOCUMENT, start);
                        DOCUMENT
                    }
                };
                if matches!(event, Event::Start(_)) {
                    stack.push(node);
                } else {
                    tree.close(node, end);
                }
            }
            Event::End(_) => {
                let node = stack
                    .pop()
                    .ok_or_else(|| malformed(format!("unexpected closing tag (at byte {start})")))?;
                tree.close(node, end);
            }
            Event::Text(text) => {
                let text = text
                    .unescape_with(|name| {
                        entities
                            .get(name)
                            .map(String::as_str)
                            .or_else(|| resolve_predefined_entity(name))
                    })
                    .map_err(|e| malformed(format!("{e} (at byte {start})")))?;
                match stack.last() {
                    Some(&node) => tree.push_text(node, start..end, text.into_owned()),
                    None if text.trim().is_empty() => {}
                    None => {
                        return Err(malformed(format!("text outside the root element (at byte {start})")));
                    }
                }
            }
            Event::CData(data) => {
                let node = *stack
                    .last()
                    .ok_or_else(|| malformed(format!("CDATA outside the root element (at byte {start})")))?;
                let text = String::from_utf8_lossy(&data.into_inner()).into_owned();
                tree.push_text(node, start..end, text);
            }
            Event::DocType(doctype) => {
                entities = declared_entities(&String::from_utf8_lossy(&doctype));
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        return Err(malformed(format!("{} unclosed element(s) at end of input", stack.len())));
    }
    if !seen_root {
        return Err(malformed("no root element"));
    }

    Ok(tree.emit(inline_nested))
}
