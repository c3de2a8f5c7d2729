//! Document order for node-sets produced by the engine.
use crate::node::{NodeType, XPathNode};
use std::cmp::Ordering;
use std::collections::HashSet;

fn path_to_root<'a, N: XPathNode<'a>>(node: N) -> Vec<N> {
    let mut path = vec![node];
    let mut current = node;
    while let Some(parent) = current.parent() {
        path.push(parent);
        current = parent;
    }
    path.reverse();
    path
}

/// Compares two nodes by ancestry and sibling position.
///
/// - An ancestor precedes its descendants.
/// - Below a common parent, attributes precede children; each group keeps the
///   order the tree reports.
/// - Nodes without a common root fall back to their `Ord` key.
pub fn compare_document_order<'a, N: XPathNode<'a>>(a: &N, b: &N) -> Ordering {
    if a == b {
        return Ordering::Equal;
    }
    let pa = path_to_root(*a);
    let pb = path_to_root(*b);
    let len = pa.len().min(pb.len());
    let mut i = 0;
    while i < len && pa[i] == pb[i] {
        i += 1;
    }
    if i == len {
        return pa.len().cmp(&pb.len());
    }
    if i == 0 {
        return a.cmp(b);
    }
    let parent = pa[i - 1];
    let (na, nb) = (pa[i], pb[i]);
    let a_is_attr = na.node_type() == NodeType::Attribute;
    let b_is_attr = nb.node_type() == NodeType::Attribute;
    match (a_is_attr, b_is_attr) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        (true, true) => position_in(parent.attributes(), na, nb),
        (false, false) => position_in(parent.children(), na, nb),
    }
}

fn position_in<'a, N: XPathNode<'a>>(
    siblings: Box<dyn Iterator<Item = N> + 'a>,
    a: N,
    b: N,
) -> Ordering {
    for sibling in siblings {
        if sibling == a {
            return Ordering::Less;
        }
        if sibling == b {
            return Ordering::Greater;
        }
    }
    a.cmp(&b)
}

/// Sorts into document order and drops duplicate identities.
pub fn sort_document_order<'a, N: XPathNode<'a>>(nodes: &mut Vec<N>) {
    let mut seen = HashSet::with_capacity(nodes.len());
    nodes.retain(|n| seen.insert(*n));
    nodes.sort_by(|a, b| compare_document_order(a, b));
}
