use crate::nodes::Nodes;
use fluentdom_xpath::XPathNode;
use std::rc::Rc;

/// Something that can be pushed into a node set.
pub enum Content<'a, N: XPathNode<'a>> {
    Node(N),
    Nodes(Vec<N>),
    Set(Nodes<'a, N>),
}

impl<'a, N: XPathNode<'a> + 'a> Content<'a, N> {
    pub(crate) fn into_nodes(self) -> Vec<N> {
        match self {
            Content::Node(node) => vec![node],
            Content::Nodes(nodes) => nodes,
            Content::Set(set) => set.to_vec(),
        }
    }
}

impl<'a, N: XPathNode<'a>> From<Vec<N>> for Content<'a, N> {
    fn from(nodes: Vec<N>) -> Self {
        Content::Nodes(nodes)
    }
}

impl<'a, N: XPathNode<'a>> From<&Nodes<'a, N>> for Content<'a, N> {
    fn from(set: &Nodes<'a, N>) -> Self {
        Content::Set(Rc::clone(set))
    }
}

impl<'a, N: XPathNode<'a>> From<Nodes<'a, N>> for Content<'a, N> {
    fn from(set: Nodes<'a, N>) -> Self {
        Content::Set(set)
    }
}
