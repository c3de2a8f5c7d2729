//! The structural-query helper shared by all sets of one chain.

use crate::config::QueryConfig;
use crate::error::QueryError;
use fluentdom_xpath::{EvaluationContext, Expression, XPathNode, XPathValue, evaluate, parse_expression};
use log::debug;
use std::cell::RefCell;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::rc::Rc;

/// Evaluates expressions against one document, caching parsed expressions
/// by their source text.
pub struct XPath<'a, N: XPathNode<'a>> {
    root: N,
    config: Rc<QueryConfig>,
    namespaces: HashMap<String, String>,
    cache: RefCell<HashMap<String, Rc<Expression>>>,
    _marker: PhantomData<&'a ()>,
}

impl<'a, N: XPathNode<'a> + 'a> XPath<'a, N> {
    pub fn new(root: N, config: Rc<QueryConfig>) -> Self {
        let namespaces = config.namespace_map();
        Self {
            root,
            config,
            namespaces,
            cache: RefCell::new(HashMap::new()),
            _marker: PhantomData,
        }
    }

    /// The document node expressions are evaluated against by default.
    pub fn root(&self) -> N {
        self.root
    }

    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    fn compile(&self, expression: &str) -> Result<Rc<Expression>, QueryError> {
        if let Some(compiled) = self.cache.borrow().get(expression) {
            return Ok(Rc::clone(compiled));
        }
        debug!("compiling expression '{}'", expression);
        let compiled = Rc::new(parse_expression(expression)?);
        self.cache
            .borrow_mut()
            .insert(expression.to_string(), Rc::clone(&compiled));
        Ok(compiled)
    }

    /// Evaluates `expression` with `context` (the document node if `None`)
    /// as context node.
    pub fn evaluate(&self, expression: &str, context: Option<N>) -> Result<XPathValue<N>, QueryError> {
        let compiled = self.compile(expression)?;
        let e_ctx = EvaluationContext::new(context.unwrap_or(self.root), self.root, &self.namespaces);
        Ok(evaluate(&compiled, &e_ctx)?)
    }

    /// Like [`evaluate`](Self::evaluate) but requires a node sequence.
    pub fn query(&self, expression: &str, context: Option<N>) -> Result<Vec<N>, QueryError> {
        match self.evaluate(expression, context)? {
            XPathValue::NodeSet(nodes) => Ok(nodes),
            other => Err(QueryError::UnexpectedValue(format!(
                "expression '{}' returned a {} instead of a node sequence",
                expression,
                other.type_name()
            ))),
        }
    }

    /// The boolean value of `expression`.
    pub fn test(&self, expression: &str, context: Option<N>) -> Result<bool, QueryError> {
        Ok(self.evaluate(expression, context)?.to_bool())
    }
}
