//! An XPath 1.0 engine that is generic over the tree it runs on.
//!
//! Parse once with [`parse_expression`], then [`evaluate`] the AST with an
//! [`EvaluationContext`] over any type implementing [`XPathNode`].

pub mod ast;
pub mod axes;
pub mod engine;
pub mod error;
pub mod functions;
pub mod node;
pub mod operators;
pub mod order;
pub mod parser;

pub use ast::{Axis, BinaryOperator, Expression, LocationPath, NameTest, NodeTest, Step};
pub use engine::{EvaluationContext, XPathValue, evaluate};
pub use error::XPathError;
pub use node::{NodeType, QName, XPathNode};
pub use order::{compare_document_order, sort_document_order};
pub use parser::parse_expression;
