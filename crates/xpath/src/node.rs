//! Defines the core abstraction for a navigable node tree.
use std::hash::Hash;

/// A qualified name: optional prefix, local part and the namespace URI the
/// prefix was bound to when the node was created.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct QName {
    pub prefix: Option<String>,
    pub local_part: String,
    pub namespace_uri: Option<String>,
}

impl QName {
    pub fn local(local_part: &str) -> Self {
        Self {
            prefix: None,
            local_part: local_part.to_string(),
            namespace_uri: None,
        }
    }

    /// `prefix:local` or just `local`.
    pub fn qualified(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("{}:{}", prefix, self.local_part),
            None => self.local_part.clone(),
        }
    }
}

/// The type of a node in the tree, aligned with the XPath 1.0 data model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeType {
    Root,
    Element,
    Attribute,
    Text,
    Comment,
    ProcessingInstruction,
}

/// The contract a tree has to fulfil so expressions can be evaluated over it.
///
/// The engine is written exclusively against this trait. `'a` is the lifetime
/// of the underlying tree storage.
///
/// Equality and hashing must be identity based. `Ord` only has to be a stable
/// total order (e.g. creation order); it is used to order nodes that have no
/// common root.
pub trait XPathNode<'a>:
    std::fmt::Debug + Clone + Copy + PartialEq + Eq + Hash + PartialOrd + Ord
{
    fn node_type(&self) -> NodeType;

    /// The qualified name. `None` for text, comment and root nodes. For a
    /// processing instruction this is its target.
    fn name(&self) -> Option<QName>;

    /// The string value as defined by the XPath 1.0 `string()` function.
    fn string_value(&self) -> String;

    /// Attribute nodes of an element, empty for every other node type.
    fn attributes(&self) -> Box<dyn Iterator<Item = Self> + 'a>;

    fn children(&self) -> Box<dyn Iterator<Item = Self> + 'a>;

    /// The parent. Attributes report their owner element. `None` for the
    /// document node and for nodes that are not attached to anything.
    fn parent(&self) -> Option<Self>;

    /// The document node of the owning document, even for detached nodes.
    fn document(&self) -> Self;
}
