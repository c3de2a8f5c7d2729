use crate::error::DomError;
use crate::loader;
use crate::node::Node;
use fluentdom_xpath::QName;
use std::cell::{Ref, RefCell, RefMut};

pub(crate) const DOCUMENT_ID: usize = 0;
pub(crate) const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// The kind of a node record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Document,
    Element,
    Attribute,
    Text,
    CData,
    Comment,
    ProcessingInstruction,
    Fragment,
}

#[derive(Debug)]
pub(crate) struct NodeData {
    pub(crate) kind: NodeKind,
    pub(crate) name: Option<QName>,
    pub(crate) value: String,
    /// The parent node; for attributes the owner element.
    pub(crate) parent: Option<usize>,
    pub(crate) children: Vec<usize>,
    pub(crate) attributes: Vec<usize>,
}

/// Owns every node ever created for it. Records are never freed; detaching a
/// node only unlinks it.
#[derive(Debug)]
pub struct Document {
    nodes: RefCell<Vec<NodeData>>,
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

impl Document {
    /// An empty document that only contains the document node.
    pub fn new() -> Self {
        Self {
            nodes: RefCell::new(vec![NodeData {
                kind: NodeKind::Document,
                name: None,
                value: String::new(),
                parent: None,
                children: Vec::new(),
                attributes: Vec::new(),
            }]),
        }
    }

    pub fn parse(xml: &str) -> Result<Self, DomError> {
        let document = Self::new();
        loader::load(&document, xml)?;
        Ok(document)
    }

    /// The document node.
    pub fn root(&self) -> Node<'_> {
        Node::new(self, DOCUMENT_ID)
    }

    pub fn document_element(&self) -> Option<Node<'_>> {
        self.root()
            .children()
            .into_iter()
            .find(|n| n.kind() == NodeKind::Element)
    }

    /// Number of node records, attached or not.
    pub fn node_count(&self) -> usize {
        self.nodes.borrow().len()
    }

    pub fn create_element(&self, name: &str) -> Node<'_> {
        self.alloc(NodeKind::Element, Some(qualify(None, name)), String::new())
    }

    pub fn create_element_ns(&self, namespace_uri: &str, qualified_name: &str) -> Node<'_> {
        let name = qualify(Some(namespace_uri), qualified_name);
        self.alloc(NodeKind::Element, Some(name), String::new())
    }

    pub fn create_text(&self, text: &str) -> Node<'_> {
        self.alloc(NodeKind::Text, None, text.to_string())
    }

    pub fn create_cdata(&self, text: &str) -> Node<'_> {
        self.alloc(NodeKind::CData, None, text.to_string())
    }

    pub fn create_comment(&self, text: &str) -> Node<'_> {
        self.alloc(NodeKind::Comment, None, text.to_string())
    }

    pub fn create_processing_instruction(&self, target: &str, data: &str) -> Node<'_> {
        self.alloc(
            NodeKind::ProcessingInstruction,
            Some(QName::local(target)),
            data.to_string(),
        )
    }

    pub fn create_fragment(&self) -> Node<'_> {
        self.alloc(NodeKind::Fragment, None, String::new())
    }

    fn alloc(&self, kind: NodeKind, name: Option<QName>, value: String) -> Node<'_> {
        let mut nodes = self.nodes.borrow_mut();
        let id = nodes.len();
        nodes.push(NodeData {
            kind,
            name,
            value,
            parent: None,
            children: Vec::new(),
            attributes: Vec::new(),
        });
        Node::new(self, id)
    }

    /// Appends a new record below `parent`: attributes go to the attribute
    /// list, everything else to the child list.
    pub(crate) fn alloc_child(
        &self,
        parent: usize,
        kind: NodeKind,
        name: Option<QName>,
        value: String,
    ) -> usize {
        let mut nodes = self.nodes.borrow_mut();
        let id = nodes.len();
        nodes.push(NodeData {
            kind,
            name,
            value,
            parent: Some(parent),
            children: Vec::new(),
            attributes: Vec::new(),
        });
        if kind == NodeKind::Attribute {
            nodes[parent].attributes.push(id);
        } else {
            nodes[parent].children.push(id);
        }
        id
    }

    pub(crate) fn data(&self) -> Ref<'_, Vec<NodeData>> {
        self.nodes.borrow()
    }

    pub(crate) fn data_mut(&self) -> RefMut<'_, Vec<NodeData>> {
        self.nodes.borrow_mut()
    }
}

/// Splits `prefix:local`. The `xml` prefix is always bound.
pub(crate) fn qualify(namespace_uri: Option<&str>, qualified_name: &str) -> QName {
    let (prefix, local_part) = match qualified_name.split_once(':') {
        Some((prefix, local)) => (Some(prefix.to_string()), local.to_string()),
        None => (None, qualified_name.to_string()),
    };
    let namespace_uri = match (namespace_uri, prefix.as_deref()) {
        (Some(uri), _) => Some(uri.to_string()),
        (None, Some("xml")) => Some(XML_NAMESPACE.to_string()),
        (None, _) => None,
    };
    QName {
        prefix,
        local_part,
        namespace_uri,
    }
}
