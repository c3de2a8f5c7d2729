//! XPath 1.0 core function library.

use super::engine::{EvaluationContext, XPathValue, parse_number};
use crate::error::XPathError;
use crate::node::{NodeType, XPathNode};

/// The arguments of one call together with the context it was made in.
struct Call<'c, 'a, 'd, N: XPathNode<'a>> {
    name: &'c str,
    args: Vec<XPathValue<N>>,
    e_ctx: &'c EvaluationContext<'a, 'd, N>,
}

impl<'a, N: XPathNode<'a>> Call<'_, 'a, '_, N> {
    fn arity(&self, min: usize, max: Option<usize>) -> Result<(), XPathError> {
        let count = self.args.len();
        if count >= min && max.is_none_or(|max| count <= max) {
            return Ok(());
        }
        let message = match max {
            Some(max) if max == min => format!("takes {} argument(s), got {}", min, count),
            Some(max) => format!("takes {} to {} arguments, got {}", min, max, count),
            None => format!("takes at least {} arguments, got {}", min, count),
        };
        Err(XPathError::FunctionError {
            function: format!("{}()", self.name),
            message,
        })
    }

    fn exactly(&self, count: usize) -> Result<(), XPathError> {
        self.arity(count, Some(count))
    }

    fn string(&self, index: usize) -> String {
        self.args[index].to_string()
    }

    fn number(&self, index: usize) -> f64 {
        self.args[index].to_number()
    }

    fn nodes(&self, index: usize) -> Result<&[N], XPathError> {
        match &self.args[index] {
            XPathValue::NodeSet(nodes) => Ok(nodes),
            other => Err(XPathError::TypeError(format!(
                "{}() expects a node-set, got a {}",
                self.name,
                other.type_name()
            ))),
        }
    }

    /// The first node of the optional node-set argument, the context node
    /// without one.
    fn node_or_context(&self) -> Result<Option<N>, XPathError> {
        self.arity(0, Some(1))?;
        if self.args.is_empty() {
            return Ok(Some(self.e_ctx.context_node));
        }
        Ok(self.nodes(0)?.first().copied())
    }

    /// The optional string argument, the context node's string value
    /// without one.
    fn string_or_context(&self) -> Result<String, XPathError> {
        self.arity(0, Some(1))?;
        Ok(match self.args.first() {
            Some(arg) => arg.to_string(),
            None => self.e_ctx.context_node.string_value(),
        })
    }

    fn two_strings(&self) -> Result<(String, String), XPathError> {
        self.exactly(2)?;
        Ok((self.string(0), self.string(1)))
    }
}

/// Calls the core function `name`.
pub fn evaluate_function<'a, 'd, N: XPathNode<'a>>(
    name: &str,
    args: Vec<XPathValue<N>>,
    e_ctx: &EvaluationContext<'a, 'd, N>,
) -> Result<XPathValue<N>, XPathError> {
    let call = Call { name, args, e_ctx };
    let number = |n: f64| Ok(XPathValue::Number(n));
    let boolean = |b: bool| Ok(XPathValue::Boolean(b));
    let string = |s: String| Ok(XPathValue::String(s));

    match name {
        "last" => call.exactly(0).and_then(|_| number(e_ctx.context_size as f64)),
        "position" => call.exactly(0).and_then(|_| number(e_ctx.context_position as f64)),
        "count" => {
            call.exactly(1)?;
            number(call.nodes(0)?.len() as f64)
        }
        "local-name" | "name" | "namespace-uri" => {
            let qname = call.node_or_context()?.and_then(|node| node.name());
            string(match (name, qname) {
                (_, None) => String::new(),
                ("local-name", Some(q)) => q.local_part,
                ("name", Some(q)) => q.qualified(),
                (_, Some(q)) => q.namespace_uri.unwrap_or_default(),
            })
        }

        "string" => string(call.string_or_context()?),
        "concat" => {
            call.arity(2, None)?;
            string(call.args.iter().map(XPathValue::to_string).collect())
        }
        "starts-with" => {
            let (haystack, prefix) = call.two_strings()?;
            boolean(haystack.starts_with(&prefix))
        }
        "contains" => {
            let (haystack, needle) = call.two_strings()?;
            boolean(haystack.contains(&needle))
        }
        "substring-before" => {
            let (haystack, needle) = call.two_strings()?;
            let before = haystack.split_once(needle.as_str()).map(|(head, _)| head);
            string(before.unwrap_or_default().to_string())
        }
        "substring-after" => {
            let (haystack, needle) = call.two_strings()?;
            let after = haystack.split_once(needle.as_str()).map(|(_, tail)| tail);
            string(after.unwrap_or_default().to_string())
        }
        "substring" => {
            call.arity(2, Some(3))?;
            string(substring(&call.string(0), call.number(1), call.args.get(2).map(XPathValue::to_number)))
        }
        "string-length" => number(call.string_or_context()?.chars().count() as f64),
        "normalize-space" => {
            let source = call.string_or_context()?;
            let words: Vec<&str> = source
                .split(|c| matches!(c, ' ' | '\t' | '\n' | '\r'))
                .filter(|word| !word.is_empty())
                .collect();
            string(words.join(" "))
        }
        "translate" => {
            call.exactly(3)?;
            string(translate(&call.string(0), &call.string(1), &call.string(2)))
        }

        "boolean" => call.exactly(1).and_then(|_| boolean(call.args[0].to_bool())),
        "not" => call.exactly(1).and_then(|_| boolean(!call.args[0].to_bool())),
        "true" => call.exactly(0).and_then(|_| boolean(true)),
        "false" => call.exactly(0).and_then(|_| boolean(false)),
        "lang" => {
            call.exactly(1)?;
            boolean(lang_matches(e_ctx.context_node, &call.string(0)))
        }

        "number" => {
            call.arity(0, Some(1))?;
            number(match call.args.first() {
                Some(arg) => arg.to_number(),
                None => parse_number(&e_ctx.context_node.string_value()),
            })
        }
        "sum" => {
            call.exactly(1)?;
            number(call.nodes(0)?.iter().map(|n| parse_number(&n.string_value())).sum())
        }
        "floor" => call.exactly(1).and_then(|_| number(call.number(0).floor())),
        "ceiling" => call.exactly(1).and_then(|_| number(call.number(0).ceil())),
        "round" => call.exactly(1).and_then(|_| number(xpath_round(call.number(0)))),

        _ => Err(XPathError::FunctionError {
            function: name.to_string(),
            message: "no such function".to_string(),
        }),
    }
}

/// Characters at rounded positions `[start, start + length)`, counted from 1.
/// NaN bounds select nothing.
fn substring(source: &str, start: f64, length: Option<f64>) -> String {
    let first = xpath_round(start);
    let end = length.map_or(f64::INFINITY, |length| first + xpath_round(length));
    source
        .chars()
        .zip(1u32..)
        .filter(|&(_, position)| {
            let position = f64::from(position);
            position >= first && position < end
        })
        .map(|(c, _)| c)
        .collect()
}

/// Replaces characters of `from` with the character at the same index of
/// `to`, dropping those without a counterpart.
fn translate(source: &str, from: &str, to: &str) -> String {
    let replacements: Vec<char> = to.chars().collect();
    source
        .chars()
        .filter_map(|c| match from.chars().position(|f| f == c) {
            Some(index) => replacements.get(index).copied(),
            None => Some(c),
        })
        .collect()
}

/// The nearest `xml:lang` in scope equals `wanted` or has it as its
/// primary subtag, ignoring case.
fn lang_matches<'a, N: XPathNode<'a>>(context: N, wanted: &str) -> bool {
    let wanted = wanted.to_lowercase();
    let mut current = if context.node_type() == NodeType::Element {
        Some(context)
    } else {
        context.parent()
    };
    while let Some(node) = current {
        let declared = node.attributes().find(|attr| {
            attr.name()
                .is_some_and(|q| q.prefix.as_deref() == Some("xml") && q.local_part == "lang")
        });
        if let Some(attr) = declared {
            let lang = attr.string_value().to_lowercase();
            return lang == wanted || lang.strip_prefix(&wanted).is_some_and(|rest| rest.starts_with('-'));
        }
        current = node.parent();
    }
    false
}

/// XPath `round()`: halves go towards positive infinity; NaN, infinities and
/// zeros are returned unchanged.
fn xpath_round(n: f64) -> f64 {
    if !n.is_finite() || n == 0.0 {
        return n;
    }
    (n + 0.5).floor()
}
