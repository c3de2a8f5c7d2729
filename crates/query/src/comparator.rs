//! Document order for query results.

use crate::error::QueryError;
use crate::xpath::XPath;
use fluentdom_xpath::XPathNode;
use log::debug;
use std::cell::RefCell;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Every node of the document in document order, attributes included.
const DOCUMENT_ORDER: &str = "descendant-or-self::node() | descendant::*/@*";

/// Orders nodes by their position in the document.
///
/// The first comparison indexes the whole document in one pass; the index
/// lives as long as the comparator. Nodes that are not attached to the
/// document have no position and sort after attached ones by their
/// identity key.
pub struct TreeComparator<'x, 'a, N: XPathNode<'a>> {
    xpath: &'x XPath<'a, N>,
    positions: RefCell<Option<HashMap<N, usize>>>,
}

impl<'x, 'a, N: XPathNode<'a> + 'a> TreeComparator<'x, 'a, N> {
    pub fn new(xpath: &'x XPath<'a, N>) -> Self {
        Self {
            xpath,
            positions: RefCell::new(None),
        }
    }

    /// Whether the topmost ancestor of `node` is the document node.
    pub fn is_attached(&self, node: N) -> bool {
        let mut current = node;
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current == self.xpath.root()
    }

    fn position(&self, node: N) -> Result<Option<usize>, QueryError> {
        if self.positions.borrow().is_none() {
            let ordered = self.xpath.query(DOCUMENT_ORDER, None)?;
            debug!("indexed {} node(s) in document order", ordered.len());
            let index = ordered.into_iter().enumerate().map(|(at, n)| (n, at)).collect();
            *self.positions.borrow_mut() = Some(index);
        }
        Ok(self
            .positions
            .borrow()
            .as_ref()
            .and_then(|positions| positions.get(&node).copied()))
    }

    /// Sort key: position, then identity.
    fn key(&self, node: N) -> Result<(Option<usize>, N), QueryError> {
        Ok((self.position(node)?, node))
    }

    pub fn compare(&self, a: &N, b: &N) -> Result<Ordering, QueryError> {
        if a == b {
            return Ok(Ordering::Equal);
        }
        let (ka, kb) = (self.key(*a)?, self.key(*b)?);
        Ok(attached_first(&ka, &kb))
    }

    /// Sorts attached nodes into document order.
    pub fn sort(&self, nodes: &mut [N]) -> Result<(), QueryError> {
        let mut keyed = Vec::with_capacity(nodes.len());
        for node in nodes.iter() {
            keyed.push(self.key(*node)?);
        }
        keyed.sort_by(attached_first);
        for (slot, (_, node)) in nodes.iter_mut().zip(keyed) {
            *slot = node;
        }
        Ok(())
    }

    /// Drops duplicates (first occurrence wins), sorts the attached nodes
    /// and appends the detached ones in the order they were first seen.
    pub fn unique(&self, nodes: Vec<N>) -> Result<Vec<N>, QueryError> {
        let document = self.xpath.root();
        let mut seen = HashSet::with_capacity(nodes.len());
        let mut attached = Vec::with_capacity(nodes.len());
        let mut detached = Vec::new();
        for (index, node) in nodes.into_iter().enumerate() {
            if node.document() != document {
                return Err(QueryError::OutOfBounds(format!(
                    "Node #{} is not a part of this document",
                    index
                )));
            }
            if !seen.insert(node) {
                continue;
            }
            if self.is_attached(node) {
                attached.push(node);
            } else {
                detached.push(node);
            }
        }
        debug!(
            "sorting {} attached and {} detached node(s)",
            attached.len(),
            detached.len()
        );
        self.sort(&mut attached)?;
        attached.extend(detached);
        Ok(attached)
    }
}

fn attached_first<N: Ord>(a: &(Option<usize>, N), b: &(Option<usize>, N)) -> Ordering {
    match (a.0, b.0) {
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        _ => a.cmp(b),
    }
}
