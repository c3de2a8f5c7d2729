//! Selector values and their compiled predicate form.

use crate::error::QueryError;
use crate::xpath::XPath;
use fluentdom_xpath::XPathNode;
use std::collections::HashSet;
use std::fmt;
use std::rc::Rc;

pub type Callback<'a, N> = Rc<dyn Fn(&N, usize) -> bool + 'a>;

/// What a query method accepts to select or test nodes.
pub enum Selector<'a, N> {
    /// An XPath expression.
    Expression(String),
    Node(N),
    Nodes(Vec<N>),
    /// Called with the candidate and its index.
    Predicate(Callback<'a, N>),
}

impl<'a, N> Selector<'a, N> {
    pub fn expr(expression: impl Into<String>) -> Self {
        Selector::Expression(expression.into())
    }

    pub fn node(node: N) -> Self {
        Selector::Node(node)
    }

    pub fn nodes(nodes: impl IntoIterator<Item = N>) -> Self {
        Selector::Nodes(nodes.into_iter().collect())
    }

    pub fn predicate(callback: impl Fn(&N, usize) -> bool + 'a) -> Self {
        Selector::Predicate(Rc::new(callback))
    }
}

impl<N: Clone> Clone for Selector<'_, N> {
    fn clone(&self) -> Self {
        match self {
            Selector::Expression(e) => Selector::Expression(e.clone()),
            Selector::Node(n) => Selector::Node(n.clone()),
            Selector::Nodes(n) => Selector::Nodes(n.clone()),
            Selector::Predicate(f) => Selector::Predicate(Rc::clone(f)),
        }
    }
}

impl<N: fmt::Debug> fmt::Debug for Selector<'_, N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Selector::Expression(e) => f.debug_tuple("Expression").field(e).finish(),
            Selector::Node(n) => f.debug_tuple("Node").field(n).finish(),
            Selector::Nodes(n) => f.debug_tuple("Nodes").field(n).finish(),
            Selector::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

impl<N> From<&str> for Selector<'_, N> {
    fn from(expression: &str) -> Self {
        Selector::Expression(expression.to_string())
    }
}

impl<N> From<String> for Selector<'_, N> {
    fn from(expression: String) -> Self {
        Selector::Expression(expression)
    }
}

impl<N> From<Vec<N>> for Selector<'_, N> {
    fn from(nodes: Vec<N>) -> Self {
        Selector::Nodes(nodes)
    }
}

/// Arguments of query methods whose selector is optional. `None` means "no
/// selector".
pub trait IntoSelector<'a, N> {
    fn into_selector(self) -> Option<Selector<'a, N>>;
}

impl<'a, N> IntoSelector<'a, N> for Selector<'a, N> {
    fn into_selector(self) -> Option<Selector<'a, N>> {
        Some(self)
    }
}

impl<'a, N> IntoSelector<'a, N> for Option<Selector<'a, N>> {
    fn into_selector(self) -> Option<Selector<'a, N>> {
        self
    }
}

impl<'a, N> IntoSelector<'a, N> for &str {
    fn into_selector(self) -> Option<Selector<'a, N>> {
        Some(Selector::from(self))
    }
}

impl<'a, N> IntoSelector<'a, N> for String {
    fn into_selector(self) -> Option<Selector<'a, N>> {
        Some(Selector::Expression(self))
    }
}

impl<'a, N> IntoSelector<'a, N> for Vec<N> {
    fn into_selector(self) -> Option<Selector<'a, N>> {
        Some(Selector::Nodes(self))
    }
}

/// Rewrites an absolute path so that it tests the candidate itself: the
/// candidate passes when it is a member of the path's result. Relative
/// expressions and explicit axes are evaluated as they are.
pub(crate) fn filter_expression(expression: &str) -> String {
    let trimmed = expression.trim();
    if trimmed.starts_with('/') {
        format!("self::node()[count(. | {0}) = count({0})]", trimmed)
    } else {
        trimmed.to_string()
    }
}

/// A selector compiled into a test over one candidate.
pub(crate) enum Predicate<'a, N> {
    Identity(N),
    Members(HashSet<N>),
    Expression(String),
    Callback(Callback<'a, N>),
}

impl<'a, N: XPathNode<'a> + 'a> Predicate<'a, N> {
    pub(crate) fn compile(selector: Selector<'a, N>) -> Result<Self, QueryError> {
        Ok(match selector {
            Selector::Expression(expression) => {
                if expression.trim().is_empty() {
                    return Err(QueryError::InvalidArgument("invalid selector".to_string()));
                }
                Predicate::Expression(filter_expression(&expression))
            }
            Selector::Node(node) => Predicate::Identity(node),
            Selector::Nodes(nodes) => Predicate::Members(nodes.into_iter().collect()),
            Selector::Predicate(callback) => Predicate::Callback(callback),
        })
    }

    /// Whether `node`, found at `index`, is selected.
    pub(crate) fn test(&self, node: &N, index: usize, xpath: &XPath<'a, N>) -> Result<bool, QueryError> {
        match self {
            Predicate::Identity(expected) => Ok(expected == node),
            Predicate::Members(members) => Ok(members.contains(node)),
            Predicate::Expression(expression) => xpath.test(expression, Some(*node)),
            Predicate::Callback(callback) => Ok(callback(node, index)),
        }
    }
}
