//! Builds node records from XML text with `roxmltree`.

use crate::document::{DOCUMENT_ID, Document, NodeKind, XML_NAMESPACE};
use crate::error::DomError;
use fluentdom_xpath::QName;

pub(crate) fn load(document: &Document, xml: &str) -> Result<(), DomError> {
    let parsed = roxmltree::Document::parse(xml)?;
    load_children(document, parsed.root(), DOCUMENT_ID);
    log::debug!("loaded {} nodes from {} bytes of XML", document.node_count(), xml.len());
    Ok(())
}

fn load_children(document: &Document, source: roxmltree::Node<'_, '_>, parent: usize) {
    for child in source.children() {
        match child.node_type() {
            roxmltree::NodeType::Element => {
                let tag = child.tag_name();
                let name = QName {
                    prefix: tag.namespace().and_then(|uri| prefix_for(child, uri)),
                    local_part: tag.name().to_string(),
                    namespace_uri: tag.namespace().map(str::to_string),
                };
                let id = document.alloc_child(parent, NodeKind::Element, Some(name), String::new());
                for attr in child.attributes() {
                    let name = QName {
                        prefix: attr.namespace().and_then(|uri| prefix_for(child, uri)),
                        local_part: attr.name().to_string(),
                        namespace_uri: attr.namespace().map(str::to_string),
                    };
                    document.alloc_child(id, NodeKind::Attribute, Some(name), attr.value().to_string());
                }
                load_children(document, child, id);
            }
            roxmltree::NodeType::Text => {
                let text = child.text().unwrap_or_default().to_string();
                document.alloc_child(parent, NodeKind::Text, None, text);
            }
            roxmltree::NodeType::Comment => {
                let text = child.text().unwrap_or_default().to_string();
                document.alloc_child(parent, NodeKind::Comment, None, text);
            }
            roxmltree::NodeType::PI => {
                if let Some(pi) = child.pi() {
                    document.alloc_child(
                        parent,
                        NodeKind::ProcessingInstruction,
                        Some(QName::local(pi.target)),
                        pi.value.unwrap_or_default().to_string(),
                    );
                }
            }
            roxmltree::NodeType::Root => {}
        }
    }
}

/// The prefix bound to `uri` in scope of `node`; `None` for the default
/// namespace.
fn prefix_for(node: roxmltree::Node<'_, '_>, uri: &str) -> Option<String> {
    if uri == XML_NAMESPACE {
        return Some("xml".to_string());
    }
    node.lookup_prefix(uri)
        .filter(|prefix| !prefix.is_empty())
        .map(str::to_string)
}
