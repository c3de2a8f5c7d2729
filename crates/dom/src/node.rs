use crate::document::{DOCUMENT_ID, Document, NodeKind, qualify};
use crate::error::DomError;
use fluentdom_xpath::{NodeType, QName, XPathNode};
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ptr;

/// A handle to one node record of a [`Document`].
///
/// Equality is identity: two handles are equal when they point at the same
/// record of the same document.
#[derive(Clone, Copy)]
pub struct Node<'d> {
    document: &'d Document,
    id: usize,
}

impl<'d> Node<'d> {
    pub(crate) fn new(document: &'d Document, id: usize) -> Self {
        Self { document, id }
    }

    /// Creation index inside the owning document.
    pub fn id(&self) -> usize {
        self.id
    }

    pub fn owner_document(&self) -> &'d Document {
        self.document
    }

    pub fn kind(&self) -> NodeKind {
        self.document.data()[self.id].kind
    }

    pub fn is_element(&self) -> bool {
        self.kind() == NodeKind::Element
    }

    fn qname(&self) -> Option<QName> {
        self.document.data()[self.id].name.clone()
    }

    pub fn local_name(&self) -> Option<String> {
        self.qname().map(|q| q.local_part)
    }

    pub fn prefix(&self) -> Option<String> {
        self.qname().and_then(|q| q.prefix)
    }

    pub fn namespace_uri(&self) -> Option<String> {
        self.qname().and_then(|q| q.namespace_uri)
    }

    pub fn qualified_name(&self) -> Option<String> {
        self.qname().map(|q| q.qualified())
    }

    /// The raw value of attribute, text, cdata, comment and processing
    /// instruction nodes. Empty for containers.
    pub fn value(&self) -> String {
        self.document.data()[self.id].value.clone()
    }

    /// Concatenated text of all descendant text and cdata nodes for
    /// containers, the value for everything else.
    pub fn text_content(&self) -> String {
        let nodes = self.document.data();
        match nodes[self.id].kind {
            NodeKind::Document | NodeKind::Element | NodeKind::Fragment => {
                let mut out = String::new();
                let mut stack: Vec<usize> = nodes[self.id].children.iter().rev().copied().collect();
                while let Some(id) = stack.pop() {
                    let data = &nodes[id];
                    match data.kind {
                        NodeKind::Text | NodeKind::CData => out.push_str(&data.value),
                        NodeKind::Element => stack.extend(data.children.iter().rev()),
                        _ => {}
                    }
                }
                out
            }
            _ => nodes[self.id].value.clone(),
        }
    }

    /// The value of the attribute with the given qualified name.
    pub fn attribute(&self, name: &str) -> Option<String> {
        let nodes = self.document.data();
        nodes[self.id]
            .attributes
            .iter()
            .map(|&id| &nodes[id])
            .find(|data| data.name.as_ref().is_some_and(|q| q.qualified() == name))
            .map(|data| data.value.clone())
    }

    pub fn attribute_nodes(&self) -> Vec<Node<'d>> {
        self.document.data()[self.id]
            .attributes
            .iter()
            .map(|&id| Node::new(self.document, id))
            .collect()
    }

    /// The parent node; attributes report their owner element.
    pub fn parent(&self) -> Option<Node<'d>> {
        self.document.data()[self.id]
            .parent
            .map(|id| Node::new(self.document, id))
    }

    pub fn children(&self) -> Vec<Node<'d>> {
        self.document.data()[self.id]
            .children
            .iter()
            .map(|&id| Node::new(self.document, id))
            .collect()
    }

    pub fn first_child(&self) -> Option<Node<'d>> {
        let first = self.document.data()[self.id].children.first().copied();
        first.map(|id| Node::new(self.document, id))
    }

    pub fn last_child(&self) -> Option<Node<'d>> {
        let last = self.document.data()[self.id].children.last().copied();
        last.map(|id| Node::new(self.document, id))
    }

    pub fn next_sibling(&self) -> Option<Node<'d>> {
        self.sibling(1)
    }

    pub fn previous_sibling(&self) -> Option<Node<'d>> {
        self.sibling(-1)
    }

    fn sibling(&self, offset: isize) -> Option<Node<'d>> {
        let nodes = self.document.data();
        let data = &nodes[self.id];
        if data.kind == NodeKind::Attribute {
            return None;
        }
        let siblings = &nodes[data.parent?].children;
        let index = siblings.iter().position(|&id| id == self.id)?;
        let target = index.checked_add_signed(offset)?;
        siblings.get(target).map(|&id| Node::new(self.document, id))
    }

    /// Whether the node is reachable from the document node.
    pub fn is_attached(&self) -> bool {
        let nodes = self.document.data();
        let mut current = self.id;
        loop {
            if current == DOCUMENT_ID {
                return true;
            }
            match nodes[current].parent {
                Some(parent) => current = parent,
                None => return false,
            }
        }
    }

    fn has_ancestor_or_self(&self, candidate: usize) -> bool {
        let nodes = self.document.data();
        let mut current = Some(self.id);
        while let Some(id) = current {
            if id == candidate {
                return true;
            }
            current = nodes[id].parent;
        }
        false
    }

    fn check_same_document(&self, other: &Node<'d>) -> Result<(), DomError> {
        if ptr::eq(self.document, other.document) {
            Ok(())
        } else {
            Err(DomError::ForeignNode(other.id))
        }
    }

    /// Sets or replaces an attribute of an element.
    pub fn set_attribute(&self, name: &str, value: &str) -> Result<(), DomError> {
        if !self.is_element() {
            return Err(DomError::HierarchyRequest(format!(
                "a {:?} node cannot carry attributes",
                self.kind()
            )));
        }
        let existing = self
            .attribute_nodes()
            .into_iter()
            .find(|attr| attr.qualified_name().as_deref() == Some(name));
        match existing {
            Some(attr) => self.document.data_mut()[attr.id].value = value.to_string(),
            None => {
                self.document.alloc_child(
                    self.id,
                    NodeKind::Attribute,
                    Some(qualify(None, name)),
                    value.to_string(),
                );
            }
        }
        Ok(())
    }

    pub fn append_child(&self, child: Node<'d>) -> Result<Node<'d>, DomError> {
        self.insert_before(child, None)
    }

    /// Inserts `child` before `reference`, or at the end without one. The
    /// child is detached from its current parent first; a fragment is
    /// replaced by its children.
    pub fn insert_before(
        &self,
        child: Node<'d>,
        reference: Option<Node<'d>>,
    ) -> Result<Node<'d>, DomError> {
        self.check_same_document(&child)?;
        if let Some(reference) = &reference {
            self.check_same_document(reference)?;
        }
        let parent_kind = self.kind();
        if !matches!(
            parent_kind,
            NodeKind::Document | NodeKind::Element | NodeKind::Fragment
        ) {
            return Err(DomError::HierarchyRequest(format!(
                "a {:?} node cannot have children",
                parent_kind
            )));
        }
        let child_kind = child.kind();
        if matches!(child_kind, NodeKind::Attribute | NodeKind::Document) {
            return Err(DomError::HierarchyRequest(format!(
                "a {:?} node cannot be inserted as a child",
                child_kind
            )));
        }
        if self.has_ancestor_or_self(child.id) {
            return Err(DomError::HierarchyRequest(
                "the new child contains its parent".to_string(),
            ));
        }
        if let Some(reference) = reference {
            if reference == child {
                return Ok(child);
            }
            if reference.kind() == NodeKind::Attribute || reference.parent() != Some(*self) {
                return Err(DomError::HierarchyRequest(
                    "the reference node is not a child of this node".to_string(),
                ));
            }
        }

        let moved: Vec<Node<'d>> = if child_kind == NodeKind::Fragment {
            child.children()
        } else {
            vec![child]
        };
        for node in &moved {
            node.detach();
        }

        let mut nodes = self.document.data_mut();
        let position = {
            let children = &nodes[self.id].children;
            reference
                .and_then(|r| children.iter().position(|&id| id == r.id))
                .unwrap_or(children.len())
        };
        for (offset, node) in moved.iter().enumerate() {
            nodes[node.id].parent = Some(self.id);
            nodes[self.id].children.insert(position + offset, node.id);
        }
        log::trace!("inserted {} node(s) below #{}", moved.len(), self.id);
        Ok(child)
    }

    /// Unlinks the node from its parent. The node stays usable and can be
    /// inserted again.
    pub fn detach(&self) {
        let mut nodes = self.document.data_mut();
        let Some(parent) = nodes[self.id].parent.take() else {
            return;
        };
        let id = self.id;
        if nodes[id].kind == NodeKind::Attribute {
            nodes[parent].attributes.retain(|&a| a != id);
        } else {
            nodes[parent].children.retain(|&c| c != id);
        }
    }
}

impl fmt::Debug for Node<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.qualified_name() {
            Some(name) => write!(f, "Node(#{} {:?} {})", self.id, self.kind(), name),
            None => write!(f, "Node(#{} {:?})", self.id, self.kind()),
        }
    }
}

impl PartialEq for Node<'_> {
    fn eq(&self, other: &Self) -> bool {
        ptr::eq(self.document, other.document) && self.id == other.id
    }
}

impl Eq for Node<'_> {}

impl Hash for Node<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        ptr::hash(self.document, state);
        self.id.hash(state);
    }
}

impl PartialOrd for Node<'_> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Creation order, grouped by document.
impl Ord for Node<'_> {
    fn cmp(&self, other: &Self) -> Ordering {
        let a = self.document as *const Document as usize;
        let b = other.document as *const Document as usize;
        a.cmp(&b).then(self.id.cmp(&other.id))
    }
}

impl<'d> XPathNode<'d> for Node<'d> {
    fn node_type(&self) -> NodeType {
        match self.kind() {
            NodeKind::Document | NodeKind::Fragment => NodeType::Root,
            NodeKind::Element => NodeType::Element,
            NodeKind::Attribute => NodeType::Attribute,
            NodeKind::Text | NodeKind::CData => NodeType::Text,
            NodeKind::Comment => NodeType::Comment,
            NodeKind::ProcessingInstruction => NodeType::ProcessingInstruction,
        }
    }

    fn name(&self) -> Option<QName> {
        self.qname()
    }

    fn string_value(&self) -> String {
        self.text_content()
    }

    fn attributes(&self) -> Box<dyn Iterator<Item = Self> + 'd> {
        Box::new(self.attribute_nodes().into_iter())
    }

    fn children(&self) -> Box<dyn Iterator<Item = Self> + 'd> {
        Box::new(Node::children(self).into_iter())
    }

    fn parent(&self) -> Option<Self> {
        Node::parent(self)
    }

    fn document(&self) -> Self {
        self.document.root()
    }
}
