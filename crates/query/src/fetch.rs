//! Evaluates one expression over the context nodes of a set and collects the
//! accepted candidates.

use crate::comparator::TreeComparator;
use crate::error::QueryError;
use crate::options::FetchOptions;
use crate::selector::{Predicate, Selector};
use crate::xpath::XPath;
use fluentdom_xpath::{XPathNode, XPathValue};
use log::{debug, trace, warn};

pub(crate) fn fetch<'a, N: XPathNode<'a> + 'a>(
    xpath: &XPath<'a, N>,
    nodes: &[N],
    expression: &str,
    filter: Option<Selector<'a, N>>,
    stop: Option<Selector<'a, N>>,
    options: FetchOptions,
) -> Result<Vec<N>, QueryError> {
    let filter = filter.map(Predicate::compile).transpose()?;
    let stop = stop.map(Predicate::compile).transpose()?;
    let contexts = if options.contains(FetchOptions::IGNORE_CONTEXT) {
        vec![xpath.root()]
    } else {
        nodes.to_vec()
    };
    debug!(
        "fetching '{}' from {} context node(s) with {:?}",
        expression,
        contexts.len(),
        options
    );

    let mut result = Vec::new();
    for context in &contexts {
        trace!("evaluating '{}' at {:?}", expression, context);
        let mut candidates = match xpath.evaluate(expression, Some(*context))? {
            XPathValue::NodeSet(candidates) => candidates,
            _ => {
                return Err(QueryError::InvalidArgument(
                    "selector did not return a node sequence".to_string(),
                ));
            }
        };
        if options.contains(FetchOptions::REVERSE) {
            candidates.reverse();
        }
        for (index, candidate) in candidates.into_iter().enumerate() {
            if let Some(stop) = &stop {
                if stop.test(&candidate, index, xpath)? {
                    if options.contains(FetchOptions::INCLUDE_STOP) {
                        result.push(candidate);
                    }
                    break;
                }
            }
            let accepted = match &filter {
                Some(filter) => filter.test(&candidate, index, xpath)?,
                None => true,
            };
            if accepted {
                result.push(candidate);
            }
        }
    }

    if options.intersects(FetchOptions::UNIQUE | FetchOptions::FORCE_SORT) || contexts.len() > 1 {
        result = TreeComparator::new(xpath).unique(result)?;
    }
    if let Some(max) = xpath.config().max_results {
        if result.len() > max {
            warn!(
                "fetch of '{}' rejected: {} node(s) exceed the bound of {}",
                expression,
                result.len(),
                max
            );
            return Err(QueryError::UnexpectedValue(format!(
                "result of {} node(s) exceeds max_results {}",
                result.len(),
                max
            )));
        }
    }
    debug!("fetch of '{}' returned {} node(s)", expression, result.len());
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::QueryConfig;
    use fluentdom_dom::{Document, Node};
    use std::rc::Rc;

    const NESTED: &str = "<p3><p2><p1><x/></p1></p2></p3>";

    fn names(nodes: &[Node<'_>]) -> Vec<String> {
        nodes.iter().filter_map(|n| n.qualified_name()).collect()
    }

    fn setup(document: &Document, config: QueryConfig) -> XPath<'_, Node<'_>> {
        let _ = env_logger::builder().is_test(true).try_init();
        XPath::new(document.root(), Rc::new(config))
    }

    #[test]
    fn test_stop_excludes_or_includes_the_stop_node() {
        let document = Document::parse(NESTED).unwrap();
        let xpath = setup(&document, QueryConfig::default());
        let x = xpath.query("//x", None).unwrap();

        let without = fetch(
            &xpath,
            &x,
            "ancestor::*",
            None,
            Some(Selector::expr("self::p2")),
            FetchOptions::REVERSE,
        )
        .unwrap();
        assert_eq!(names(&without), vec!["p1"]);

        let with = fetch(
            &xpath,
            &x,
            "ancestor::*",
            None,
            Some(Selector::expr("self::p2")),
            FetchOptions::REVERSE | FetchOptions::INCLUDE_STOP,
        )
        .unwrap();
        assert_eq!(names(&with), vec!["p1", "p2"]);
    }

    #[test]
    fn test_stop_is_checked_before_filter() {
        let document = Document::parse(NESTED).unwrap();
        let xpath = setup(&document, QueryConfig::default());
        let x = xpath.query("//x", None).unwrap();
        let result = fetch(
            &xpath,
            &x,
            "ancestor::*",
            Some(Selector::expr("self::p2")),
            Some(Selector::expr("self::p2")),
            FetchOptions::REVERSE,
        )
        .unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_reverse_without_unique_keeps_nearest_first() {
        let document = Document::parse(NESTED).unwrap();
        let xpath = setup(&document, QueryConfig::default());
        let x = xpath.query("//x", None).unwrap();
        let result = fetch(&xpath, &x, "ancestor::*", None, None, FetchOptions::REVERSE).unwrap();
        assert_eq!(names(&result), vec!["p1", "p2", "p3"]);
    }

    #[test]
    fn test_several_contexts_are_merged_in_document_order() {
        let document = Document::parse("<r><a><i/></a><b><i/></b></r>").unwrap();
        let xpath = setup(&document, QueryConfig::default());
        let mut contexts = xpath.query("/r/*", None).unwrap();
        contexts.reverse();
        contexts.push(contexts[0]);
        let result = fetch(&xpath, &contexts, "ancestor-or-self::*", None, None, FetchOptions::REVERSE).unwrap();
        assert_eq!(names(&result), vec!["r", "a", "b"]);
    }

    #[test]
    fn test_ignore_context_uses_the_document() {
        let document = Document::parse("<r><a/><a/></r>").unwrap();
        let xpath = setup(&document, QueryConfig::default());
        let result = fetch(&xpath, &[], "//a", None, None, FetchOptions::IGNORE_CONTEXT).unwrap();
        assert_eq!(result.len(), 2);
    }

    #[test]
    fn test_empty_context_gives_empty_result() {
        let document = Document::parse("<r/>").unwrap();
        let xpath = setup(&document, QueryConfig::default());
        assert!(fetch(&xpath, &[], "*", None, None, FetchOptions::UNIQUE).unwrap().is_empty());
    }

    #[test]
    fn test_scalar_expression_is_invalid() {
        let document = Document::parse("<r/>").unwrap();
        let xpath = setup(&document, QueryConfig::default());
        let result = fetch(&xpath, &[], "count(*)", None, None, FetchOptions::IGNORE_CONTEXT);
        assert!(matches!(
            result,
            Err(QueryError::InvalidArgument(m)) if m == "selector did not return a node sequence"
        ));
    }

    #[test]
    fn test_callback_filter_receives_candidate_index() {
        let document = Document::parse("<r><a/><b/><c/><d/></r>").unwrap();
        let xpath = setup(&document, QueryConfig::default());
        let root = xpath.query("/r", None).unwrap();
        let even = Selector::predicate(|_: &Node<'_>, index| index % 2 == 0);
        let result = fetch(&xpath, &root, "*", Some(even), None, FetchOptions::UNIQUE).unwrap();
        assert_eq!(names(&result), vec!["a", "c"]);
    }

    #[test]
    fn test_max_results_rejects_larger_results() {
        let document = Document::parse("<r><a/><a/><a/></r>").unwrap();
        let xpath = setup(&document, QueryConfig::new().with_max_results(2));
        let result = fetch(&xpath, &[], "//a", None, None, FetchOptions::IGNORE_CONTEXT);
        assert!(matches!(
            result,
            Err(QueryError::UnexpectedValue(m)) if m == "result of 3 node(s) exceeds max_results 2"
        ));
        let within = fetch(&xpath, &[], "/r/a[position() < 3]", None, None, FetchOptions::IGNORE_CONTEXT).unwrap();
        assert_eq!(within.len(), 2);
    }

    #[test]
    fn test_force_sort_orders_a_single_reverse_walk() {
        let document = Document::parse(NESTED).unwrap();
        let xpath = setup(&document, QueryConfig::default());
        let x = xpath.query("//x", None).unwrap();
        let result = fetch(
            &xpath,
            &x,
            "ancestor::*",
            None,
            None,
            FetchOptions::REVERSE | FetchOptions::FORCE_SORT,
        )
        .unwrap();
        assert_eq!(names(&result), vec!["p3", "p2", "p1"]);
    }

    #[test]
    fn test_filter_and_stop_apply_together() {
        let document = Document::parse("<p4><p3><p2><p1><x/></p1></p2></p3></p4>").unwrap();
        let xpath = setup(&document, QueryConfig::default());
        let x = xpath.query("//x", None).unwrap();
        let result = fetch(
            &xpath,
            &x,
            "ancestor::*",
            Some(Selector::expr("not(self::p2)")),
            Some(Selector::expr("self::p4")),
            FetchOptions::REVERSE,
        )
        .unwrap();
        assert_eq!(names(&result), vec!["p1", "p3"]);
    }
}
