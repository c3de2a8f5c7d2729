//! Decides where `find` looks and which expression it starts from.

use crate::error::QueryError;
use crate::options::{FetchOptions, FindOptions};
use crate::selector::Selector;

const DOCUMENT_NODES: &str = "//*|//text()[normalize-space(.) != '']";
const DOCUMENT_ELEMENTS: &str = "//*";
const DESCENDANT_NODES: &str = ".//*|.//text()[normalize-space(.) != '']";
const DESCENDANT_ELEMENTS: &str = ".//*";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ContextMode {
    /// Evaluated once against the document node.
    Document,
    /// The caller's expression, evaluated against every node of the set.
    SelfNode,
    /// Every descendant of every node of the set, narrowed by a filter.
    Children,
}

impl ContextMode {
    /// How the fetch treats the contexts of this mode.
    fn fetch_options(self) -> FetchOptions {
        match self {
            ContextMode::Document => FetchOptions::IGNORE_CONTEXT,
            ContextMode::SelfNode | ContextMode::Children => FetchOptions::UNIQUE,
        }
    }
}

#[derive(Debug)]
pub(crate) struct Resolution<'a, N> {
    pub expression: String,
    pub filter: Option<Selector<'a, N>>,
    pub mode: ContextMode,
    pub options: FetchOptions,
}

pub(crate) fn resolve<'a, N>(
    selector: Selector<'a, N>,
    use_document_context: bool,
    options: FindOptions,
) -> Result<Resolution<'a, N>, QueryError> {
    let document = use_document_context || options.contains(FindOptions::USE_DOCUMENT_CONTEXT);
    let filter_mode = options.contains(FindOptions::MODE_FILTER);

    let (expression, filter, mode) = match selector {
        Selector::Expression(expression) if !filter_mode => {
            if expression.trim().is_empty() {
                return Err(QueryError::InvalidArgument("invalid selector".to_string()));
            }
            let mode = if document { ContextMode::Document } else { ContextMode::SelfNode };
            (expression, None, mode)
        }
        selector => {
            let base = match (document, filter_mode) {
                (true, true) => DOCUMENT_ELEMENTS,
                (true, false) => DOCUMENT_NODES,
                (false, true) => DESCENDANT_ELEMENTS,
                (false, false) => DESCENDANT_NODES,
            };
            let mode = if document { ContextMode::Document } else { ContextMode::Children };
            (base.to_string(), Some(selector), mode)
        }
    };

    let mut fetch_options = mode.fetch_options();
    if options.contains(FindOptions::FORCE_SORT) {
        fetch_options |= FetchOptions::FORCE_SORT;
    }

    Ok(Resolution {
        expression,
        filter,
        mode,
        options: fetch_options,
    })
}
