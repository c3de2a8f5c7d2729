//! Pure functions collecting the nodes of each XPath axis.
//!
//! Every collector appends in axis order: forward axes in document order,
//! reverse axes nearest-first. Positional predicates rely on this.

use crate::ast::Axis;
use crate::node::{NodeType, XPathNode};

pub fn collect<'a, N: XPathNode<'a>>(axis: Axis, node: N, results: &mut Vec<N>) {
    match axis {
        Axis::Child => collect_child_nodes(node, results),
        Axis::Attribute => collect_attribute_nodes(node, results),
        Axis::Descendant => collect_descendant_nodes(node, results),
        Axis::DescendantOrSelf => collect_descendant_or_self_nodes(node, results),
        Axis::Parent => collect_parent_nodes(node, results),
        Axis::Ancestor => collect_ancestor_nodes(node, results),
        Axis::AncestorOrSelf => {
            results.push(node);
            collect_ancestor_nodes(node, results);
        }
        Axis::SelfAxis => results.push(node),
        Axis::FollowingSibling => collect_following_sibling_nodes(node, results),
        Axis::PrecedingSibling => collect_preceding_sibling_nodes(node, results),
        Axis::Following => collect_following_nodes(node, results),
        Axis::Preceding => collect_preceding_nodes(node, results),
    }
}

pub fn collect_child_nodes<'a, N: XPathNode<'a>>(node: N, results: &mut Vec<N>) {
    results.extend(node.children());
}

pub fn collect_attribute_nodes<'a, N: XPathNode<'a>>(node: N, results: &mut Vec<N>) {
    results.extend(node.attributes());
}

/// Pre-order walk of the subtree below `node`.
pub fn collect_descendant_nodes<'a, N: XPathNode<'a>>(node: N, results: &mut Vec<N>) {
    let mut pending: Vec<N> = node.children().collect::<Vec<_>>().into_iter().rev().collect();
    while let Some(next) = pending.pop() {
        results.push(next);
        let first_child_last = pending.len();
        pending.extend(next.children());
        pending[first_child_last..].reverse();
    }
}

pub fn collect_descendant_or_self_nodes<'a, N: XPathNode<'a>>(node: N, results: &mut Vec<N>) {
    results.push(node);
    collect_descendant_nodes(node, results);
}

pub fn collect_parent_nodes<'a, N: XPathNode<'a>>(node: N, results: &mut Vec<N>) {
    if let Some(parent) = node.parent() {
        results.push(parent);
    }
}

pub fn collect_ancestor_nodes<'a, N: XPathNode<'a>>(node: N, results: &mut Vec<N>) {
    results.extend(std::iter::successors(node.parent(), |ancestor| ancestor.parent()));
}

/// Siblings of `node` inside its parent's child list, split at `node`.
/// Attributes and parentless nodes have no siblings.
fn split_siblings<'a, N: XPathNode<'a>>(node: N) -> Option<(Vec<N>, Vec<N>)> {
    if node.node_type() == NodeType::Attribute {
        return None;
    }
    let parent = node.parent()?;
    let siblings: Vec<N> = parent.children().collect();
    let position = siblings.iter().position(|s| *s == node)?;
    let following = siblings[position + 1..].to_vec();
    let mut preceding = siblings;
    preceding.truncate(position);
    Some((preceding, following))
}

pub fn collect_following_sibling_nodes<'a, N: XPathNode<'a>>(node: N, results: &mut Vec<N>) {
    if let Some((_, following)) = split_siblings(node) {
        results.extend(following);
    }
}

pub fn collect_preceding_sibling_nodes<'a, N: XPathNode<'a>>(node: N, results: &mut Vec<N>) {
    if let Some((preceding, _)) = split_siblings(node) {
        results.extend(preceding.into_iter().rev());
    }
}

pub fn collect_following_nodes<'a, N: XPathNode<'a>>(node: N, results: &mut Vec<N>) {
    let mut current = node;
    if node.node_type() == NodeType::Attribute {
        // Everything inside the owner element follows its attributes.
        match node.parent() {
            Some(owner) => {
                collect_descendant_nodes(owner, results);
                current = owner;
            }
            None => return,
        }
    }
    loop {
        if let Some((_, following)) = split_siblings(current) {
            for sibling in following {
                collect_descendant_or_self_nodes(sibling, results);
            }
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => break,
        }
    }
}

pub fn collect_preceding_nodes<'a, N: XPathNode<'a>>(node: N, results: &mut Vec<N>) {
    let mut current = node;
    if node.node_type() == NodeType::Attribute {
        match node.parent() {
            Some(owner) => current = owner,
            None => return,
        }
    }
    loop {
        if let Some((preceding, _)) = split_siblings(current) {
            for sibling in preceding.into_iter().rev() {
                let mut subtree = Vec::new();
                collect_descendant_or_self_nodes(sibling, &mut subtree);
                results.extend(subtree.into_iter().rev());
            }
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => break,
        }
    }
}
