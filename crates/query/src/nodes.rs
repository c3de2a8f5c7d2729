//! The node set and its fluent traversal surface.

use crate::comparator::TreeComparator;
use crate::config::QueryConfig;
use crate::content::Content;
use crate::context;
use crate::error::QueryError;
use crate::fetch::fetch;
use crate::options::{FetchOptions, FindOptions};
use crate::selector::{IntoSelector, Predicate, Selector};
use crate::traversal::Traversal;
use crate::xpath::XPath;
use fluentdom_xpath::{NodeType, XPathNode};
use log::{debug, trace};
use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

const PRECEDING_MEANINGFUL_SIBLINGS: &str =
    "preceding-sibling::*|preceding-sibling::text()[normalize-space(.) != '']";

/// A shared handle to a [`NodeSet`]. Every chained call returns a new one.
pub type Nodes<'a, N> = Rc<NodeSet<'a, N>>;

/// An ordered list of nodes of one document.
///
/// A set is created for a document (or a node of it) with [`NodeSet::new`]
/// and every traversal spawns a new, closed set that remembers where it came
/// from, so [`end`](NodeSet::end) can step back along the chain. All sets of
/// a chain share one [`XPath`] helper and with it the configuration and the
/// expression cache.
pub struct NodeSet<'a, N: XPathNode<'a>> {
    document: N,
    xpath: Rc<XPath<'a, N>>,
    nodes: RefCell<Vec<N>>,
    use_document_context: Cell<bool>,
    closed: Cell<bool>,
    parent: Option<Weak<NodeSet<'a, N>>>,
}

impl<'a, N: XPathNode<'a> + 'a> NodeSet<'a, N> {
    /// A set for the document of `node`. Unless `node` is the document node
    /// itself it becomes the only member of the set.
    pub fn new(node: N) -> Nodes<'a, N> {
        Self::with_config(node, QueryConfig::default())
    }

    pub fn with_config(node: N, config: QueryConfig) -> Nodes<'a, N> {
        let document = node.document();
        let set = NodeSet {
            document,
            xpath: Rc::new(XPath::new(document, Rc::new(config))),
            nodes: RefCell::new(Vec::new()),
            use_document_context: Cell::new(true),
            closed: Cell::new(false),
            parent: None,
        };
        if node != document {
            set.nodes.borrow_mut().push(node);
            set.use_document_context.set(false);
        }
        Rc::new(set)
    }

    /// An empty, open set of the same document whose [`end`](Self::end) is
    /// this set. This set becomes read-only.
    pub fn spawn(self: &Rc<Self>) -> Nodes<'a, N> {
        self.close();
        Rc::new(NodeSet {
            document: self.document,
            xpath: Rc::clone(&self.xpath),
            nodes: RefCell::new(Vec::new()),
            use_document_context: Cell::new(false),
            closed: Cell::new(false),
            parent: Some(Rc::downgrade(self)),
        })
    }

    /// [`spawn`](Self::spawn) and [`push`](Self::push) in one step.
    pub fn spawn_with(self: &Rc<Self>, content: impl Into<Content<'a, N>>) -> Result<Nodes<'a, N>, QueryError> {
        let set = self.spawn();
        set.push(content)?;
        Ok(set)
    }

    fn derive(self: &Rc<Self>, nodes: Vec<N>) -> Nodes<'a, N> {
        let set = self.spawn();
        *set.nodes.borrow_mut() = nodes;
        set.close();
        set
    }

    /// The set this one was spawned from, or this set if there is none
    /// (anymore).
    pub fn end(self: &Rc<Self>) -> Nodes<'a, N> {
        self.parent
            .as_ref()
            .and_then(Weak::upgrade)
            .unwrap_or_else(|| Rc::clone(self))
    }

    /// Appends nodes. Fails without appending anything if the set is closed
    /// or one of the nodes belongs to another document.
    pub fn push(&self, content: impl Into<Content<'a, N>>) -> Result<&Self, QueryError> {
        self.extend(content.into().into_nodes())
    }

    /// Like [`push`](Self::push) but silently skips everything that is not
    /// an element.
    pub fn push_elements(&self, content: impl Into<Content<'a, N>>) -> Result<&Self, QueryError> {
        let elements = content
            .into()
            .into_nodes()
            .into_iter()
            .filter(|node| node.node_type() == NodeType::Element)
            .collect();
        self.extend(elements)
    }

    fn extend(&self, nodes: Vec<N>) -> Result<&Self, QueryError> {
        if self.closed.get() {
            return Err(QueryError::BadMethodCall("node set is read-only".to_string()));
        }
        if let Some(index) = nodes.iter().position(|node| node.document() != self.document) {
            return Err(QueryError::OutOfBounds(format!(
                "Node #{} is not a part of this document",
                index
            )));
        }
        trace!("pushing {} node(s)", nodes.len());
        self.nodes.borrow_mut().extend(nodes);
        self.use_document_context.set(false);
        Ok(self)
    }

    /// Evaluates `expression` for every context node and collects the
    /// candidates accepted by `filter` until `stop` matches.
    pub fn fetch(
        self: &Rc<Self>,
        expression: &str,
        filter: Option<Selector<'a, N>>,
        stop: Option<Selector<'a, N>>,
        options: FetchOptions,
    ) -> Result<Nodes<'a, N>, QueryError> {
        if expression.trim().is_empty() {
            return Err(QueryError::InvalidArgument("invalid selector".to_string()));
        }
        let contexts = self.to_vec();
        let result = fetch(&self.xpath, &contexts, expression, filter, stop, options)?;
        Ok(self.derive(result))
    }

    /// Selects nodes below the set, or in the whole document for a fresh
    /// document set.
    ///
    /// An expression selector is evaluated as it is. With
    /// [`FindOptions::MODE_FILTER`] it instead filters all descendant
    /// elements, and `/`-rooted paths test whether the candidate is part of
    /// the path's result.
    pub fn find(
        self: &Rc<Self>,
        selector: impl Into<Selector<'a, N>>,
        options: FindOptions,
    ) -> Result<Nodes<'a, N>, QueryError> {
        let resolution = context::resolve(selector.into(), self.use_document_context.get(), options)?;
        debug!(
            "find '{}' in {:?} context",
            resolution.expression, resolution.mode
        );
        self.fetch(&resolution.expression, resolution.filter, None, resolution.options)
    }

    fn traverse(
        self: &Rc<Self>,
        traversal: Traversal,
        filter: Option<Selector<'a, N>>,
        stop: Option<Selector<'a, N>>,
    ) -> Result<Nodes<'a, N>, QueryError> {
        self.fetch(&traversal.expression(), filter, stop, traversal.options())
    }

    /// Element children, narrowed by `filter`. A callback filter receives
    /// the child's position below its parent.
    pub fn children(self: &Rc<Self>, filter: impl IntoSelector<'a, N>) -> Result<Nodes<'a, N>, QueryError> {
        self.traverse(Traversal::Children, filter.into_selector(), None)
    }

    /// Element and non-blank text children.
    pub fn contents(self: &Rc<Self>, filter: impl IntoSelector<'a, N>) -> Result<Nodes<'a, N>, QueryError> {
        self.traverse(Traversal::Contents, filter.into_selector(), None)
    }

    pub fn parent(self: &Rc<Self>, filter: impl IntoSelector<'a, N>) -> Result<Nodes<'a, N>, QueryError> {
        self.traverse(Traversal::Parent, filter.into_selector(), None)
    }

    /// Ancestor elements, nearest first for a single node.
    pub fn parents(self: &Rc<Self>, filter: impl IntoSelector<'a, N>) -> Result<Nodes<'a, N>, QueryError> {
        self.traverse(Traversal::Parents, filter.into_selector(), None)
    }

    /// Ancestor elements up to, not including, the first one matching `stop`.
    pub fn parents_until(
        self: &Rc<Self>,
        stop: impl IntoSelector<'a, N>,
        filter: impl IntoSelector<'a, N>,
    ) -> Result<Nodes<'a, N>, QueryError> {
        self.traverse(Traversal::Parents, filter.into_selector(), stop.into_selector())
    }

    /// The next element or non-blank text sibling.
    pub fn next(self: &Rc<Self>, filter: impl IntoSelector<'a, N>) -> Result<Nodes<'a, N>, QueryError> {
        self.traverse(Traversal::Next, filter.into_selector(), None)
    }

    pub fn next_all(self: &Rc<Self>, filter: impl IntoSelector<'a, N>) -> Result<Nodes<'a, N>, QueryError> {
        self.traverse(Traversal::NextAll, filter.into_selector(), None)
    }

    pub fn next_until(
        self: &Rc<Self>,
        stop: impl IntoSelector<'a, N>,
        filter: impl IntoSelector<'a, N>,
    ) -> Result<Nodes<'a, N>, QueryError> {
        self.traverse(Traversal::NextAll, filter.into_selector(), stop.into_selector())
    }

    pub fn prev(self: &Rc<Self>, filter: impl IntoSelector<'a, N>) -> Result<Nodes<'a, N>, QueryError> {
        self.traverse(Traversal::Prev, filter.into_selector(), None)
    }

    /// Preceding siblings, nearest first for a single node.
    pub fn prev_all(self: &Rc<Self>, filter: impl IntoSelector<'a, N>) -> Result<Nodes<'a, N>, QueryError> {
        self.traverse(Traversal::PrevAll, filter.into_selector(), None)
    }

    pub fn prev_until(
        self: &Rc<Self>,
        stop: impl IntoSelector<'a, N>,
        filter: impl IntoSelector<'a, N>,
    ) -> Result<Nodes<'a, N>, QueryError> {
        self.traverse(Traversal::PrevAll, filter.into_selector(), stop.into_selector())
    }

    pub fn siblings(self: &Rc<Self>, filter: impl IntoSelector<'a, N>) -> Result<Nodes<'a, N>, QueryError> {
        self.traverse(Traversal::Siblings, filter.into_selector(), None)
    }

    /// For every node the first of itself and its ancestors that matches
    /// `selector`.
    pub fn closest(self: &Rc<Self>, selector: impl Into<Selector<'a, N>>) -> Result<Nodes<'a, N>, QueryError> {
        let selector = selector.into();
        self.fetch(
            &Traversal::Closest.expression(),
            Some(selector.clone()),
            Some(selector),
            Traversal::Closest.options(),
        )
    }

    fn select(&self, selector: Selector<'a, N>, keep: bool) -> Result<Vec<N>, QueryError> {
        let predicate = Predicate::compile(selector)?;
        let mut selected = Vec::new();
        for (index, node) in self.to_vec().into_iter().enumerate() {
            if predicate.test(&node, index, &self.xpath)? == keep {
                selected.push(node);
            }
        }
        Ok(selected)
    }

    /// The nodes of this set that match `selector`.
    pub fn filter(self: &Rc<Self>, selector: impl Into<Selector<'a, N>>) -> Result<Nodes<'a, N>, QueryError> {
        let selected = self.select(selector.into(), true)?;
        Ok(self.derive(selected))
    }

    /// The nodes of this set that do not match `selector`.
    pub fn not(self: &Rc<Self>, selector: impl Into<Selector<'a, N>>) -> Result<Nodes<'a, N>, QueryError> {
        let selected = self.select(selector.into(), false)?;
        Ok(self.derive(selected))
    }

    /// Whether any node of this set matches `selector`. Stops at the first
    /// match.
    pub fn is(&self, selector: impl Into<Selector<'a, N>>) -> Result<bool, QueryError> {
        let predicate = Predicate::compile(selector.into())?;
        for (index, node) in self.to_vec().into_iter().enumerate() {
            if predicate.test(&node, index, &self.xpath)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// The nodes of this set with at least one descendant matching
    /// `selector`.
    pub fn has(self: &Rc<Self>, selector: impl Into<Selector<'a, N>>) -> Result<Nodes<'a, N>, QueryError> {
        let predicate = Predicate::compile(selector.into())?;
        let mut selected = Vec::new();
        for node in self.to_vec() {
            let descendants = self.xpath.query("descendant::node()", Some(node))?;
            for (index, descendant) in descendants.iter().enumerate() {
                if predicate.test(descendant, index, &self.xpath)? {
                    selected.push(node);
                    break;
                }
            }
        }
        Ok(self.derive(selected))
    }

    /// This set merged with the nodes `selector` selects in the whole
    /// document, in document order.
    pub fn add(self: &Rc<Self>, selector: impl Into<Selector<'a, N>>) -> Result<Nodes<'a, N>, QueryError> {
        let added = match selector.into() {
            Selector::Node(node) => vec![node],
            Selector::Nodes(nodes) => nodes,
            selector => {
                let resolution = context::resolve(selector, true, FindOptions::empty())?;
                fetch(
                    &self.xpath,
                    &[],
                    &resolution.expression,
                    resolution.filter,
                    None,
                    resolution.options,
                )?
            }
        };
        let mut merged = self.to_vec();
        merged.extend(added);
        let merged = self.unique(merged)?;
        Ok(self.derive(merged))
    }

    /// This set merged with the set it was spawned from, optionally
    /// filtered by `selector`.
    pub fn add_back(self: &Rc<Self>, selector: impl IntoSelector<'a, N>) -> Result<Nodes<'a, N>, QueryError> {
        let previous = self.end();
        let mut merged = match selector.into_selector() {
            Some(selector) => previous.select(selector, true)?,
            None => previous.to_vec(),
        };
        merged.extend(self.to_vec());
        let merged = self.unique(merged)?;
        Ok(self.derive(merged))
    }

    /// The node at `index`, counted from the end if negative.
    pub fn eq(self: &Rc<Self>, index: isize) -> Nodes<'a, N> {
        let node = self.resolve_index(index).and_then(|index| self.get(index));
        self.derive(node.into_iter().collect())
    }

    pub fn first(self: &Rc<Self>) -> Nodes<'a, N> {
        self.eq(0)
    }

    pub fn last(self: &Rc<Self>) -> Nodes<'a, N> {
        self.eq(-1)
    }

    /// The nodes from `start` up to, not including, `end`. Negative bounds
    /// count from the end.
    pub fn slice(self: &Rc<Self>, start: isize, end: Option<isize>) -> Nodes<'a, N> {
        let len = self.len();
        let clamp = |index: isize| self.resolve_index(index).unwrap_or(if index < 0 { 0 } else { len });
        let start = clamp(start);
        let end = end.map_or(len, clamp);
        let nodes = if start < end {
            self.nodes.borrow()[start..end].to_vec()
        } else {
            Vec::new()
        };
        self.derive(nodes)
    }

    fn resolve_index(&self, index: isize) -> Option<usize> {
        let len = self.len();
        let resolved = if index < 0 {
            len.checked_sub(index.unsigned_abs())?
        } else {
            index.unsigned_abs()
        };
        (resolved < len).then_some(resolved)
    }

    /// Without a selector, the number of element and non-blank text siblings
    /// before the first node. With one, the position of the first node of the
    /// set that matches it.
    pub fn index(&self, selector: impl IntoSelector<'a, N>) -> Result<Option<usize>, QueryError> {
        match selector.into_selector() {
            None => match self.get(0) {
                Some(first) => Ok(Some(
                    self.xpath.query(PRECEDING_MEANINGFUL_SIBLINGS, Some(first))?.len(),
                )),
                None => Ok(None),
            },
            Some(selector) => {
                let predicate = Predicate::compile(selector)?;
                for (index, node) in self.to_vec().into_iter().enumerate() {
                    if predicate.test(&node, index, &self.xpath)? {
                        return Ok(Some(index));
                    }
                }
                Ok(None)
            }
        }
    }

    /// The position of the first node of `content` in this set.
    pub fn index_of(&self, content: impl Into<Content<'a, N>>) -> Result<Option<usize>, QueryError> {
        let nodes = content.into().into_nodes();
        let first = nodes
            .first()
            .ok_or_else(|| QueryError::UnexpectedValue("no element found".to_string()))?;
        Ok(self.nodes.borrow().iter().position(|node| node == first))
    }

    /// `nodes` without duplicates, in document order. Nodes that are not
    /// attached to the document follow in the order they were given.
    pub fn unique(&self, nodes: Vec<N>) -> Result<Vec<N>, QueryError> {
        TreeComparator::new(&self.xpath).unique(nodes)
    }

    pub fn len(&self) -> usize {
        self.nodes.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.borrow().is_empty()
    }

    pub fn get(&self, index: usize) -> Option<N> {
        self.nodes.borrow().get(index).copied()
    }

    pub fn to_vec(&self) -> Vec<N> {
        self.nodes.borrow().clone()
    }

    /// Iterates over a snapshot of the nodes.
    pub fn iter(&self) -> std::vec::IntoIter<N> {
        self.to_vec().into_iter()
    }

    /// The document node.
    pub fn document(&self) -> N {
        self.document
    }

    pub fn xpath(&self) -> &XPath<'a, N> {
        &self.xpath
    }

    pub fn config(&self) -> &QueryConfig {
        self.xpath.config()
    }

    /// Makes the set read-only.
    pub fn close(&self) {
        self.closed.set(true);
    }

    pub fn is_closed(&self) -> bool {
        self.closed.get()
    }
}

impl<'a, N: XPathNode<'a>> fmt::Debug for NodeSet<'a, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeSet")
            .field("nodes", &*self.nodes.borrow())
            .field("closed", &self.closed.get())
            .finish()
    }
}

impl<'a, N: XPathNode<'a> + 'a> From<&Nodes<'a, N>> for Selector<'a, N> {
    fn from(set: &Nodes<'a, N>) -> Self {
        Selector::Nodes(set.to_vec())
    }
}

impl<'a, N: XPathNode<'a> + 'a> IntoSelector<'a, N> for &Nodes<'a, N> {
    fn into_selector(self) -> Option<Selector<'a, N>> {
        Some(Selector::from(self))
    }
}
