//! XPath 1.0 expression parser built on `nom`.
//!
//! Binary operators are parsed by precedence climbing over [`LEVELS`]; paths,
//! steps and primaries are ordinary `nom` combinators.

use super::ast::*;
use crate::error::XPathError;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit0, digit1, multispace0},
    combinator::{map, map_res, opt, peek, recognize, value},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded},
};

/// Parses a complete expression. Trailing input is an error.
pub fn parse_expression(input: &str) -> Result<Expression, XPathError> {
    let source = input.trim();
    match operand(0, source) {
        Ok(("", parsed)) => Ok(parsed),
        Ok((rest, _)) => Err(XPathError::XPathParse(
            input.to_string(),
            format!("unexpected trailing input '{}'", rest),
        )),
        Err(e) => Err(XPathError::XPathParse(input.to_string(), e.to_string())),
    }
}

fn ws<'a, F, O, E>(inner: F) -> impl Parser<&'a str, Output = O, Error = E>
where
    F: Parser<&'a str, Output = O, Error = E>,
    E: nom::error::ParseError<&'a str>,
{
    delimited(multispace0, inner, multispace0)
}

type Level = &'static [(&'static str, BinaryOperator)];

/// Operator tables, loosest binding first. Longer symbols precede their
/// prefixes.
const LEVELS: [Level; 6] = [
    &[("or", BinaryOperator::Or)],
    &[("and", BinaryOperator::And)],
    &[("!=", BinaryOperator::NotEquals), ("=", BinaryOperator::Equals)],
    &[
        ("<=", BinaryOperator::LessThanOrEqual),
        ("&lt;=", BinaryOperator::LessThanOrEqual),
        (">=", BinaryOperator::GreaterThanOrEqual),
        ("&gt;=", BinaryOperator::GreaterThanOrEqual),
        ("<", BinaryOperator::LessThan),
        ("&lt;", BinaryOperator::LessThan),
        (">", BinaryOperator::GreaterThan),
        ("&gt;", BinaryOperator::GreaterThan),
    ],
    &[("+", BinaryOperator::Plus), ("-", BinaryOperator::Minus)],
    &[
        ("*", BinaryOperator::Multiply),
        ("div", BinaryOperator::Divide),
        ("mod", BinaryOperator::Modulo),
    ],
];

const UNION: Level = &[("|", BinaryOperator::Union)];

fn is_name_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.')
}

/// Matches one operator of `table`, surrounding whitespace included. Word
/// operators must not run into a following name character.
fn operator(table: Level, input: &str) -> Option<(&str, BinaryOperator)> {
    let trimmed = input.trim_start();
    table.iter().find_map(|(symbol, op)| {
        let rest = trimmed.strip_prefix(symbol)?;
        let is_word = symbol.starts_with(|c: char| c.is_alphabetic());
        if is_word && rest.starts_with(is_name_char) {
            return None;
        }
        Some((rest.trim_start(), *op))
    })
}

/// Left-associative chain of `next` operands joined by operators of
/// `table`. An operator without a right operand is left unconsumed.
fn chain<'a>(
    table: Level,
    input: &'a str,
    next: impl Fn(&'a str) -> IResult<&'a str, Expression>,
) -> IResult<&'a str, Expression> {
    let (mut rest, mut left) = next(input)?;
    while let Some((after_op, op)) = operator(table, rest) {
        match next(after_op) {
            Ok((after_right, right)) => {
                left = Expression::BinaryOp {
                    left: Box::new(left),
                    op,
                    right: Box::new(right),
                };
                rest = after_right;
            }
            Err(nom::Err::Error(_)) => break,
            Err(e) => return Err(e),
        }
    }
    Ok((rest, left))
}

fn operand(level: usize, input: &str) -> IResult<&str, Expression> {
    match LEVELS.get(level) {
        Some(table) => chain(table, input, |i| operand(level + 1, i)),
        None => unary_expr(input),
    }
}

fn expression(input: &str) -> IResult<&str, Expression> {
    operand(0, input)
}

fn unary_expr(input: &str) -> IResult<&str, Expression> {
    if let Ok((rest, _)) = ws(char::<&str, nom::error::Error<&str>>('-')).parse(input) {
        let (rest, negated) = unary_expr(rest)?;
        return Ok((
            rest,
            Expression::UnaryOp {
                op: UnaryOperator::Minus,
                expr: Box::new(negated),
            },
        ));
    }
    chain(UNION, input, path_expr)
}

/// A primary expression with optional predicates and trailing steps, or a
/// plain location path. Primaries go first so `position()` is not read as a
/// step named `position`.
fn path_expr(input: &str) -> IResult<&str, Expression> {
    let (input, _) = multispace0(input)?;
    let Ok((rest, primary)) = primary_expr(input) else {
        return map(location_path, Expression::LocationPath).parse(input);
    };

    let (rest, predicates) = many0(predicate).parse(rest)?;
    let start = if predicates.is_empty() {
        primary
    } else {
        Expression::Filter {
            primary: Box::new(primary),
            predicates,
        }
    };
    let (rest, steps) = relative_steps(rest)?;
    if steps.is_empty() {
        return Ok((rest, start));
    }
    let path = LocationPath {
        start_point: Some(Box::new(start)),
        is_absolute: false,
        steps,
    };
    Ok((rest, Expression::LocationPath(path)))
}

fn primary_expr(input: &str) -> IResult<&str, Expression> {
    ws(alt((
        map(preceded(char('$'), q_name), Expression::Variable),
        map(number, Expression::Number),
        map(string_literal, Expression::Literal),
        function_call,
        delimited(ws(char('(')), expression, ws(char(')'))),
    )))
    .parse(input)
}

fn string_literal(input: &str) -> IResult<&str, String> {
    let quoted = |quote: char| delimited(char(quote), take_while(move |c: char| c != quote), char(quote));
    map(alt((quoted('"'), quoted('\''))), str::to_string).parse(input)
}

/// `Digits ('.' Digits?)? | '.' Digits`
fn number(input: &str) -> IResult<&str, f64> {
    let integral = recognize(pair(digit1, opt(pair(char('.'), digit0))));
    let fractional = recognize(pair(char('.'), digit1));
    map_res(alt((integral, fractional)), str::parse::<f64>).parse(input)
}

fn nc_name(input: &str) -> IResult<&str, &str> {
    let start = take_while1(|c: char| c.is_alphabetic() || c == '_');
    recognize(pair(start, take_while(is_name_char))).parse(input)
}

fn q_name(input: &str) -> IResult<&str, String> {
    let qualified = recognize(pair(nc_name, opt(pair(char(':'), nc_name))));
    map(qualified, str::to_string).parse(input)
}

const NODE_TYPES: [(&str, NodeTypeTest); 3] = [
    ("text", NodeTypeTest::Text),
    ("node", NodeTypeTest::Node),
    ("comment", NodeTypeTest::Comment),
];

fn node_type_test(input: &str) -> IResult<&str, NodeTest> {
    for (keyword, kind) in NODE_TYPES {
        if let Some(rest) = input.strip_prefix(keyword) {
            if let Ok((rest, _)) = pair(ws(char::<&str, nom::error::Error<&str>>('(')), char(')')).parse(rest) {
                return Ok((rest, NodeTest::NodeType(kind)));
            }
        }
    }
    let target = delimited(ws(char('(')), opt(ws(string_literal)), char(')'));
    map(preceded(tag("processing-instruction"), target), |target| {
        NodeTest::NodeType(NodeTypeTest::ProcessingInstruction(target))
    })
    .parse(input)
}

pub fn node_test(input: &str) -> IResult<&str, NodeTest> {
    alt((
        value(NodeTest::Wildcard, char('*')),
        node_type_test,
        map(pair(nc_name, tag(":*")), |(prefix, _)| {
            NodeTest::NamespaceWildcard(prefix.to_string())
        }),
        map(q_name, |qualified| NodeTest::Name(NameTest::parse(&qualified))),
    ))
    .parse(input)
}

/// Axis names; a name that prefixes another comes after it.
const AXES: [(&str, Axis); 12] = [
    ("ancestor-or-self", Axis::AncestorOrSelf),
    ("ancestor", Axis::Ancestor),
    ("attribute", Axis::Attribute),
    ("child", Axis::Child),
    ("descendant-or-self", Axis::DescendantOrSelf),
    ("descendant", Axis::Descendant),
    ("following-sibling", Axis::FollowingSibling),
    ("following", Axis::Following),
    ("parent", Axis::Parent),
    ("preceding-sibling", Axis::PrecedingSibling),
    ("preceding", Axis::Preceding),
    ("self", Axis::SelfAxis),
];

fn axis(input: &str) -> IResult<&str, Axis> {
    for (name, axis) in AXES {
        if let Some(rest) = input.strip_prefix(name) {
            if let Ok((rest, _)) = ws(tag::<&str, &str, nom::error::Error<&str>>("::")).parse(rest) {
                return Ok((rest, axis));
            }
        }
    }
    Err(nom::Err::Error(nom::error::Error::new(input, nom::error::ErrorKind::Tag)))
}

fn predicate(input: &str) -> IResult<&str, Expression> {
    delimited(ws(char('[')), expression, ws(char(']'))).parse(input)
}

fn step(input: &str) -> IResult<&str, Step> {
    let any_node = || NodeTest::NodeType(NodeTypeTest::Node);
    let (rest, (axis, test)) = alt((
        map(tag(".."), |_| (Axis::Parent, any_node())),
        map(char('.'), |_| (Axis::SelfAxis, any_node())),
        map(preceded(char('@'), node_test), |test| (Axis::Attribute, test)),
        map(pair(opt(axis), node_test), |(axis, test)| {
            (axis.unwrap_or(Axis::Child), test)
        }),
    ))
    .parse(input)?;
    let (rest, predicates) = many0(predicate).parse(rest)?;
    let mut parsed = Step::new(axis, test);
    parsed.predicates = predicates;
    Ok((rest, parsed))
}

/// Zero or more `/step` or `//step` continuations.
fn relative_steps(input: &str) -> IResult<&str, Vec<Step>> {
    let separator = ws(alt((tag("//"), tag("/"))));
    let (rest, pieces) = many0(pair(separator, step)).parse(input)?;
    let mut steps = Vec::with_capacity(pieces.len() * 2);
    for (separator, next) in pieces {
        if separator == "//" {
            steps.push(Step::descendant_or_self());
        }
        steps.push(next);
    }
    Ok((rest, steps))
}

fn location_path(input: &str) -> IResult<&str, LocationPath> {
    let (rest, is_absolute, mut steps) = if let Some(after) = input.strip_prefix("//") {
        let (after, first) = step(after)?;
        (after, true, vec![Step::descendant_or_self(), first])
    } else if let Some(after) = input.strip_prefix('/') {
        match step(after) {
            Ok((after, first)) => (after, true, vec![first]),
            // A lone `/` selects the document node.
            Err(_) => (after, true, Vec::new()),
        }
    } else {
        let (after, first) = step(input)?;
        (after, false, vec![first])
    };

    let (rest, more) = relative_steps(rest)?;
    steps.extend(more);
    let path = LocationPath {
        start_point: None,
        is_absolute,
        steps,
    };
    Ok((rest, path))
}

fn function_call(input: &str) -> IResult<&str, Expression> {
    let (rest, name) = q_name(input)?;
    let (rest, _) = peek(ws(char('('))).parse(rest)?;
    if matches!(
        name.as_str(),
        "text" | "node" | "comment" | "processing-instruction"
    ) {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Verify,
        )));
    }

    let arguments = separated_list0(ws(char(',')), ws(expression));
    let (rest, args) = preceded(multispace0, delimited(char('('), arguments, char(')'))).parse(rest)?;
    Ok((rest, Expression::FunctionCall { name, args }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn named(local: &str) -> NodeTest {
        NodeTest::Name(NameTest::parse(local))
    }

    fn path(is_absolute: bool, steps: Vec<Step>) -> Expression {
        Expression::LocationPath(LocationPath {
            start_point: None,
            is_absolute,
            steps,
        })
    }

    fn steps_of(source: &str) -> Vec<Step> {
        match parse_expression(source) {
            Ok(Expression::LocationPath(lp)) => lp.steps,
            other => panic!("{source}: not a location path: {other:?}"),
        }
    }

    fn binary(left: Expression, op: BinaryOperator, right: Expression) -> Expression {
        Expression::BinaryOp {
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    #[test]
    fn test_relative_and_absolute_paths() {
        let child = |name: &str| Step::new(Axis::Child, named(name));
        assert_eq!(
            parse_expression("chapter/section").unwrap(),
            path(false, vec![child("chapter"), child("section")])
        );
        assert_eq!(
            parse_expression("/book/chapter").unwrap(),
            path(true, vec![child("book"), child("chapter")])
        );
        assert_eq!(parse_expression(" / ").unwrap(), path(true, Vec::new()));
        assert_eq!(
            parse_expression("//para").unwrap(),
            path(true, vec![Step::descendant_or_self(), child("para")])
        );
    }

    #[test]
    fn test_every_axis_name() {
        for (name, expected) in AXES {
            let source = format!("{name} :: x");
            assert_eq!(steps_of(&source)[0].axis, expected, "{source}");
        }
    }

    #[test]
    fn test_abbreviations() {
        let any = NodeTest::NodeType(NodeTypeTest::Node);
        assert_eq!(steps_of(".")[0], Step::new(Axis::SelfAxis, any.clone()));
        let steps = steps_of("..//@lang");
        assert_eq!(steps[0], Step::new(Axis::Parent, any));
        assert_eq!(steps[1], Step::descendant_or_self());
        assert_eq!(steps[2], Step::new(Axis::Attribute, named("lang")));
    }

    #[test]
    fn test_node_tests() {
        let steps = steps_of("x:entry/x:*/comment()/processing-instruction('pi')/node()");
        assert_eq!(
            steps[0].node_test,
            NodeTest::Name(NameTest {
                prefix: Some("x".into()),
                local_part: "entry".into()
            })
        );
        assert_eq!(steps[1].node_test, NodeTest::NamespaceWildcard("x".into()));
        assert_eq!(steps[2].node_test, NodeTest::NodeType(NodeTypeTest::Comment));
        assert_eq!(
            steps[3].node_test,
            NodeTest::NodeType(NodeTypeTest::ProcessingInstruction(Some("pi".into())))
        );
        assert_eq!(steps[4].node_test, NodeTest::NodeType(NodeTypeTest::Node));
    }

    #[test]
    fn test_predicates() {
        let steps = steps_of("item[@id = \"a\"][2]");
        assert_eq!(
            steps[0].predicates,
            vec![
                binary(
                    path(false, vec![Step::new(Axis::Attribute, named("id"))]),
                    BinaryOperator::Equals,
                    Expression::Literal("a".into()),
                ),
                Expression::Number(2.0),
            ]
        );
    }

    #[test]
    fn test_keyword_like_names_stay_names() {
        let child = |name: &str| path(false, vec![Step::new(Axis::Child, named(name))]);
        assert_eq!(parse_expression("nan").unwrap(), child("nan"));
        assert_eq!(parse_expression("div").unwrap(), child("div"));
        assert_eq!(parse_expression("order").unwrap(), child("order"));
        assert_eq!(
            parse_expression("a or order").unwrap(),
            binary(child("a"), BinaryOperator::Or, child("order"))
        );
        assert_eq!(parse_expression(".25").unwrap(), Expression::Number(0.25));
    }

    #[test]
    fn test_filter_with_trailing_steps() {
        match parse_expression("(//a | //b)[last()]/c").unwrap() {
            Expression::LocationPath(lp) => {
                assert!(matches!(lp.start_point.as_deref(), Some(Expression::Filter { .. })));
                assert_eq!(lp.steps, vec![Step::new(Axis::Child, named("c"))]);
            }
            other => panic!("not a location path: {other:?}"),
        }
    }

    #[test]
    fn test_precedence_and_associativity() {
        let n = Expression::Number;
        assert_eq!(
            parse_expression("1 + 2 * 3").unwrap(),
            binary(n(1.0), BinaryOperator::Plus, binary(n(2.0), BinaryOperator::Multiply, n(3.0)))
        );
        assert_eq!(
            parse_expression("8 - 4 - 2").unwrap(),
            binary(binary(n(8.0), BinaryOperator::Minus, n(4.0)), BinaryOperator::Minus, n(2.0))
        );
        assert_eq!(
            parse_expression("3 - -1").unwrap(),
            binary(
                n(3.0),
                BinaryOperator::Minus,
                Expression::UnaryOp {
                    op: UnaryOperator::Minus,
                    expr: Box::new(n(1.0))
                }
            )
        );
        assert_eq!(
            parse_expression("1 &lt;= 2").unwrap(),
            binary(n(1.0), BinaryOperator::LessThanOrEqual, n(2.0))
        );
    }

    #[test]
    fn test_function_calls() {
        match parse_expression("count(ancestor-or-self::node()) + count(preceding::node())").unwrap() {
            Expression::BinaryOp { left, op, right } => {
                assert_eq!(op, BinaryOperator::Plus);
                assert!(matches!(*left, Expression::FunctionCall { ref name, ref args } if name == "count" && args.len() == 1));
                assert!(matches!(*right, Expression::FunctionCall { ref name, .. } if name == "count"));
            }
            other => panic!("not a binary operation: {other:?}"),
        }
        assert!(matches!(
            parse_expression("concat('a', $b, 1)").unwrap(),
            Expression::FunctionCall { ref args, .. } if args.len() == 3
        ));
    }

    #[test]
    fn test_malformed_input() {
        for source in ["item[", "", "1 +", "a/"] {
            assert!(
                matches!(parse_expression(source), Err(XPathError::XPathParse(..))),
                "{source}"
            );
        }
    }
}
