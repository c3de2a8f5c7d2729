//! Binary operators with the XPath 1.0 conversion rules for comparisons.

use crate::ast::BinaryOperator;
use crate::engine::XPathValue;
use crate::error::XPathError;
use crate::node::XPathNode;
use crate::order::sort_document_order;

/// Applies `op` to two already evaluated operands. `and`/`or` are handled by
/// the engine so they can short-circuit, but are accepted here as well.
pub fn evaluate<'a, N: XPathNode<'a>>(
    op: BinaryOperator,
    left: XPathValue<N>,
    right: XPathValue<N>,
) -> Result<XPathValue<N>, XPathError> {
    use BinaryOperator::*;
    let arithmetic: fn(f64, f64) -> f64 = match op {
        Or => return Ok(XPathValue::Boolean(left.to_bool() || right.to_bool())),
        And => return Ok(XPathValue::Boolean(left.to_bool() && right.to_bool())),
        Equals | NotEquals | LessThan | LessThanOrEqual | GreaterThan | GreaterThanOrEqual => {
            return Ok(XPathValue::Boolean(compare_values(op, &left, &right)));
        }
        Union => return union(left, right),
        Plus => |a, b| a + b,
        Minus => |a, b| a - b,
        Multiply => |a, b| a * b,
        Divide => |a, b| a / b,
        // f64 `%` truncates like XPath `mod`.
        Modulo => |a, b| a % b,
    };
    Ok(XPathValue::Number(arithmetic(left.to_number(), right.to_number())))
}

fn union<'a, N: XPathNode<'a>>(left: XPathValue<N>, right: XPathValue<N>) -> Result<XPathValue<N>, XPathError> {
    match (left, right) {
        (XPathValue::NodeSet(mut nodes), XPathValue::NodeSet(other)) => {
            nodes.extend(other);
            sort_document_order(&mut nodes);
            Ok(XPathValue::NodeSet(nodes))
        }
        (l, r) => Err(XPathError::TypeError(format!(
            "'|' needs two node-sets, got a {} and a {}",
            l.type_name(),
            r.type_name()
        ))),
    }
}

/// Comparison with node-set expansion: a node-set compares true if any of
/// its members does, except against a boolean where the set is converted.
fn compare_values<'a, N: XPathNode<'a>>(
    op: BinaryOperator,
    left: &XPathValue<N>,
    right: &XPathValue<N>,
) -> bool {
    match (left, right) {
        (XPathValue::NodeSet(a), XPathValue::NodeSet(b)) => {
            let right_strings: Vec<XPathValue<N>> = b
                .iter()
                .map(|n| XPathValue::String(n.string_value()))
                .collect();
            a.iter().any(|x| {
                let left_string = XPathValue::String(x.string_value());
                right_strings
                    .iter()
                    .any(|y| compare_scalars(op, &left_string, y))
            })
        }
        (XPathValue::NodeSet(a), XPathValue::Boolean(_)) => {
            compare_scalars(op, &XPathValue::Boolean(!a.is_empty()), right)
        }
        (XPathValue::Boolean(_), XPathValue::NodeSet(b)) => {
            compare_scalars(op, left, &XPathValue::Boolean(!b.is_empty()))
        }
        (XPathValue::NodeSet(a), _) => a
            .iter()
            .any(|x| compare_scalars(op, &XPathValue::String(x.string_value()), right)),
        (_, XPathValue::NodeSet(b)) => b
            .iter()
            .any(|y| compare_scalars(op, left, &XPathValue::String(y.string_value()))),
        _ => compare_scalars(op, left, right),
    }
}

fn compare_scalars<'a, N: XPathNode<'a>>(
    op: BinaryOperator,
    left: &XPathValue<N>,
    right: &XPathValue<N>,
) -> bool {
    use BinaryOperator::*;
    match op {
        Equals | NotEquals => {
            let is_bool = |v: &XPathValue<N>| matches!(v, XPathValue::Boolean(_));
            let is_number = |v: &XPathValue<N>| matches!(v, XPathValue::Number(_));
            let equal = if is_bool(left) || is_bool(right) {
                left.to_bool() == right.to_bool()
            } else if is_number(left) || is_number(right) {
                left.to_number() == right.to_number()
            } else {
                left.to_string() == right.to_string()
            };
            if op == Equals { equal } else { !equal }
        }
        _ => {
            let (a, b) = (left.to_number(), right.to_number());
            match op {
                LessThan => a < b,
                LessThanOrEqual => a <= b,
                GreaterThan => a > b,
                GreaterThanOrEqual => a >= b,
                _ => false,
            }
        }
    }
}
