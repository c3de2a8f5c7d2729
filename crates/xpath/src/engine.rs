//! Tree-walking evaluation of a parsed [`Expression`] over any [`XPathNode`] implementation.

use super::ast::{
    Axis, BinaryOperator, Expression, LocationPath, NodeTest, NodeTypeTest, Step, UnaryOperator,
};
use super::{axes, functions, operators, order};
use crate::error::XPathError;
use crate::node::{NodeType, XPathNode};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::marker::PhantomData;

const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// One of the four XPath 1.0 value types.
///
/// A `NodeSet` coming out of [`evaluate`] holds no duplicates and is sorted in
/// document order.
#[derive(Debug, Clone, PartialEq)]
pub enum XPathValue<N> {
    NodeSet(Vec<N>),
    String(String),
    Number(f64),
    Boolean(bool),
}

impl<'a, N: XPathNode<'a>> XPathValue<N> {
    /// `boolean()` conversion.
    pub fn to_bool(&self) -> bool {
        match self {
            Self::Boolean(flag) => *flag,
            Self::Number(n) => !(n.is_nan() || *n == 0.0),
            Self::String(text) => !text.is_empty(),
            Self::NodeSet(nodes) => !nodes.is_empty(),
        }
    }

    /// `number()` conversion. A node-set converts through the string value of its first node.
    pub fn to_number(&self) -> f64 {
        match self {
            Self::Boolean(flag) => f64::from(u8::from(*flag)),
            Self::Number(n) => *n,
            Self::String(text) => parse_number(text),
            Self::NodeSet(nodes) => match nodes.first() {
                Some(first) => parse_number(&first.string_value()),
                None => f64::NAN,
            },
        }
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Boolean(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::NodeSet(_) => "node-set",
        }
    }
}

/// `string()` conversion.
impl<'a, N: XPathNode<'a>> fmt::Display for XPathValue<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(flag) => f.write_str(if *flag { "true" } else { "false" }),
            Self::Number(n) => f.write_str(&format_number(*n)),
            Self::String(text) => f.write_str(text),
            Self::NodeSet(nodes) => match nodes.first() {
                Some(first) => f.write_str(&first.string_value()),
                None => Ok(()),
            },
        }
    }
}

/// The XPath `number()` conversion of a string: optional whitespace, an
/// optional minus sign and a decimal literal. Anything else is NaN.
pub(crate) fn parse_number(s: &str) -> f64 {
    let trimmed = s.trim_matches(|c| matches!(c, ' ' | '\t' | '\n' | '\r'));
    let digits = trimmed.strip_prefix('-').unwrap_or(trimmed);
    let valid = !digits.is_empty()
        && digits != "."
        && digits.chars().all(|c| c.is_ascii_digit() || c == '.')
        && digits.chars().filter(|&c| c == '.').count() <= 1;
    if valid {
        trimmed.parse().unwrap_or(f64::NAN)
    } else {
        f64::NAN
    }
}

fn format_number(n: f64) -> String {
    match n {
        n if n.is_nan() => "NaN".to_string(),
        n if n.is_infinite() => String::from(if n > 0.0 { "Infinity" } else { "-Infinity" }),
        n if n.fract() == 0.0 && n.abs() < 1e15 => format!("{}", n as i64),
        n => n.to_string(),
    }
}

/// The focus and static bindings an expression is evaluated with.
///
/// `'a` borrows the tree, `'d` borrows the prefix table.
pub struct EvaluationContext<'a, 'd, N: XPathNode<'a>> {
    pub context_node: N,
    pub root_node: N,
    /// 1-based.
    pub context_position: usize,
    pub context_size: usize,
    /// Prefix to namespace URI bindings used by name tests.
    pub namespaces: &'d HashMap<String, String>,
    _marker: PhantomData<&'a ()>,
}

impl<'a, 'd, N: XPathNode<'a>> EvaluationContext<'a, 'd, N> {
    pub fn new(context_node: N, root_node: N, namespaces: &'d HashMap<String, String>) -> Self {
        Self {
            context_node,
            root_node,
            context_position: 1,
            context_size: 1,
            namespaces,
            _marker: PhantomData,
        }
    }

    /// A context for evaluating a predicate against one node of a sequence.
    pub fn with_focus(&self, node: N, position: usize, size: usize) -> Self {
        Self {
            context_node: node,
            context_position: position,
            context_size: size,
            ..Self::new(node, self.root_node, self.namespaces)
        }
    }

    fn resolve_prefix(&self, prefix: &str) -> Result<String, XPathError> {
        if let Some(uri) = self.namespaces.get(prefix) {
            return Ok(uri.clone());
        }
        if prefix == "xml" {
            Ok(XML_NAMESPACE.to_string())
        } else {
            Err(XPathError::UnknownPrefix(prefix.to_string()))
        }
    }
}

/// Evaluates `expr` with the focus in `e_ctx`.
pub fn evaluate<'a, N>(
    expr: &Expression,
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<XPathValue<N>, XPathError>
where
    N: XPathNode<'a> + 'a,
{
    let value = match expr {
        Expression::Literal(text) => XPathValue::String(text.clone()),
        Expression::Number(n) => XPathValue::Number(*n),
        Expression::Variable(name) => return Err(XPathError::UnknownVariable(name.clone())),
        Expression::LocationPath(path) => XPathValue::NodeSet(select_path(path, e_ctx)?),
        Expression::Filter {
            primary,
            predicates,
        } => {
            let nodes = node_set(evaluate(primary, e_ctx)?, "predicates can only filter")?;
            XPathValue::NodeSet(apply_predicates(nodes, predicates, e_ctx)?)
        }
        Expression::FunctionCall { name, args } => {
            let values = args
                .iter()
                .map(|arg| evaluate(arg, e_ctx))
                .collect::<Result<Vec<_>, _>>()?;
            return functions::evaluate_function(name, values, e_ctx);
        }
        Expression::UnaryOp {
            op: UnaryOperator::Minus,
            expr,
        } => XPathValue::Number(-evaluate(expr, e_ctx)?.to_number()),
        Expression::BinaryOp { left, op, right } => match op {
            BinaryOperator::And | BinaryOperator::Or => {
                let short_circuit = *op == BinaryOperator::Or;
                let decided = evaluate(left, e_ctx)?.to_bool() == short_circuit;
                XPathValue::Boolean(if decided {
                    short_circuit
                } else {
                    evaluate(right, e_ctx)?.to_bool()
                })
            }
            _ => return operators::evaluate(*op, evaluate(left, e_ctx)?, evaluate(right, e_ctx)?),
        },
    };
    Ok(value)
}

fn node_set<N>(value: XPathValue<N>, what: &str) -> Result<Vec<N>, XPathError> {
    match value {
        XPathValue::NodeSet(nodes) => Ok(nodes),
        XPathValue::String(_) => Err(XPathError::TypeError(format!("{what} a node-set, got a string"))),
        XPathValue::Number(_) => Err(XPathError::TypeError(format!("{what} a node-set, got a number"))),
        XPathValue::Boolean(_) => Err(XPathError::TypeError(format!("{what} a node-set, got a boolean"))),
    }
}

fn select_path<'a, N>(path: &LocationPath, e_ctx: &EvaluationContext<'a, '_, N>) -> Result<Vec<N>, XPathError>
where
    N: XPathNode<'a> + 'a,
{
    let origin = match &path.start_point {
        Some(start) => node_set(evaluate(start, e_ctx)?, "a location step needs")?,
        None if path.is_absolute => vec![e_ctx.root_node],
        None => vec![e_ctx.context_node],
    };
    path.steps
        .iter()
        .try_fold(origin, |nodes, step| select_step(step, &nodes, e_ctx))
}

/// Runs one step from every context node. Proximity positions in the
/// predicates follow the axis direction; the merged result is in document order.
fn select_step<'a, N>(step: &Step, from: &[N], e_ctx: &EvaluationContext<'a, '_, N>) -> Result<Vec<N>, XPathError>
where
    N: XPathNode<'a> + 'a,
{
    let test = NameMatcher::new(&step.node_test, step.axis, e_ctx)?;
    let mut seen = HashSet::new();
    let mut merged = Vec::new();
    let mut buffer = Vec::new();

    for &origin in from {
        buffer.clear();
        axes::collect(step.axis, origin, &mut buffer);
        buffer.retain(|&candidate| test.matches(candidate));
        let kept = apply_predicates(std::mem::take(&mut buffer), &step.predicates, e_ctx)?;
        merged.extend(kept.into_iter().filter(|node| seen.insert(*node)));
    }

    if from.len() > 1 || step.axis.is_reverse() {
        order::sort_document_order(&mut merged);
    }
    Ok(merged)
}

/// A node test with its prefix already resolved.
struct NameMatcher<'t> {
    test: &'t NodeTest,
    principal: NodeType,
    namespace: Option<String>,
}

impl<'t> NameMatcher<'t> {
    fn new<'a, N: XPathNode<'a>>(
        test: &'t NodeTest,
        axis: Axis,
        e_ctx: &EvaluationContext<'a, '_, N>,
    ) -> Result<Self, XPathError> {
        let namespace = match test {
            NodeTest::NamespaceWildcard(prefix) => Some(e_ctx.resolve_prefix(prefix)?),
            NodeTest::Name(name) => match &name.prefix {
                Some(prefix) => Some(e_ctx.resolve_prefix(prefix)?),
                None => None,
            },
            _ => None,
        };
        let principal = match axis {
            Axis::Attribute => NodeType::Attribute,
            _ => NodeType::Element,
        };
        Ok(Self {
            test,
            principal,
            namespace,
        })
    }

    fn matches<'a, N: XPathNode<'a>>(&self, node: N) -> bool {
        let kind = node.node_type();
        let same_namespace = |uri: Option<&str>| uri == self.namespace.as_deref();
        match self.test {
            NodeTest::NodeType(NodeTypeTest::Node) => true,
            NodeTest::NodeType(NodeTypeTest::Text) => kind == NodeType::Text,
            NodeTest::NodeType(NodeTypeTest::Comment) => kind == NodeType::Comment,
            NodeTest::NodeType(NodeTypeTest::ProcessingInstruction(target)) => {
                kind == NodeType::ProcessingInstruction
                    && match target {
                        Some(target) => node.name().is_some_and(|q| q.local_part == *target),
                        None => true,
                    }
            }
            NodeTest::Wildcard => kind == self.principal,
            NodeTest::NamespaceWildcard(_) => {
                kind == self.principal
                    && node.name().is_some_and(|q| same_namespace(q.namespace_uri.as_deref()))
            }
            NodeTest::Name(wanted) => {
                kind == self.principal
                    && node.name().is_some_and(|q| {
                        q.local_part == wanted.local_part && same_namespace(q.namespace_uri.as_deref())
                    })
            }
        }
    }
}

/// Narrows `nodes` by each predicate in turn. A number keeps the node at that
/// proximity position; any other value is taken as a boolean.
fn apply_predicates<'a, N>(
    nodes: Vec<N>,
    predicates: &[Expression],
    e_ctx: &EvaluationContext<'a, '_, N>,
) -> Result<Vec<N>, XPathError>
where
    N: XPathNode<'a> + 'a,
{
    predicates.iter().try_fold(nodes, |candidates, predicate| {
        let size = candidates.len();
        let mut survivors = Vec::with_capacity(size);
        for (position, node) in (1..).zip(candidates) {
            let keep = match evaluate(predicate, &e_ctx.with_focus(node, position, size))? {
                XPathValue::Number(n) => n == position as f64,
                other => other.to_bool(),
            };
            if keep {
                survivors.push(node);
            }
        }
        Ok(survivors)
    })
}
