use fluentdom_dom::{Document, Node};
use fluentdom_query::{FetchOptions, FindOptions, NodeSet, Nodes, QueryConfig, QueryError, Selector};
use std::cell::Cell;
use std::rc::Rc;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn names<'d>(set: &Nodes<'d, Node<'d>>) -> Vec<String> {
    set.iter()
        .map(|n| n.qualified_name().unwrap_or_else(|| format!("#{}", n.value().trim())))
        .collect()
}

#[test]
fn test_empty_document_and_empty_set_fetch_nothing() {
    init_logger();
    let document = Document::new();
    let set = NodeSet::new(document.root());
    assert!(set.find("//*", FindOptions::empty()).unwrap().is_empty());

    let document = Document::parse("<a><b/></a>").unwrap();
    let empty = NodeSet::new(document.root()).spawn();
    assert!(empty.children(None).unwrap().is_empty());
    assert!(empty.fetch("*", None, None, FetchOptions::UNIQUE).unwrap().is_empty());
}

#[test]
fn test_unique_results_are_in_document_order() {
    init_logger();
    let document = Document::parse("<r><a><b/></a><c><b/></c><b/></r>").unwrap();
    let set = NodeSet::new(document.root());
    let all = set.find("//b | //a | //c", FindOptions::empty()).unwrap();
    let mut reversed = all.to_vec();
    reversed.reverse();
    reversed.extend(all.to_vec());

    let sorted = all.spawn_with(reversed).unwrap().fetch("self::*", None, None, FetchOptions::UNIQUE).unwrap();
    assert_eq!(sorted.to_vec(), all.to_vec());
    assert_eq!(names(&sorted), vec!["a", "b", "c", "b", "b"]);
}

#[test]
fn test_unique_drops_duplicates() {
    let document = Document::parse("<r><a/><b/></r>").unwrap();
    let set = NodeSet::new(document.root());
    let a = document.document_element().unwrap().first_child().unwrap();
    let b = a.next_sibling().unwrap();
    assert_eq!(set.unique(vec![a, a, b]).unwrap(), vec![a, b]);
    assert_eq!(set.unique(vec![b, a, b]).unwrap(), vec![a, b]);
}

#[test]
fn test_parents_until_with_and_without_the_stop_node() {
    init_logger();
    let document = Document::parse("<p3><p2><p1><x/></p1></p2></p3>").unwrap();
    let x = NodeSet::new(document.root()).find("//x", FindOptions::empty()).unwrap();

    assert_eq!(names(&x.parents_until("self::p2", None).unwrap()), vec!["p1"]);
    let including = x
        .fetch(
            "ancestor::*",
            None,
            Some(Selector::expr("self::p2")),
            FetchOptions::REVERSE | FetchOptions::INCLUDE_STOP,
        )
        .unwrap();
    assert_eq!(names(&including), vec!["p1", "p2"]);
    assert_eq!(names(&x.parents(None).unwrap()), vec!["p1", "p2", "p3"]);
}

#[test]
fn test_absolute_filter_tests_membership() {
    init_logger();
    let document = Document::parse("<root><item/><other><item/></other></root>").unwrap();
    let set = NodeSet::new(document.root());
    let found = set.find("/root/item", FindOptions::MODE_FILTER).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found.get(0), document.document_element().unwrap().first_child());

    let elements = NodeSet::new(document.root()).find("//*", FindOptions::empty()).unwrap();
    assert_eq!(names(&elements.filter("/root/item").unwrap()), vec!["item"]);
    assert_eq!(names(&elements.not("/root/item").unwrap()), vec!["root", "other", "item"]);
    assert!(!elements.filter("/root/other").unwrap().is("/root/item").unwrap());
}

#[test]
fn test_foreign_nodes_are_rejected() {
    let document = Document::parse("<a/>").unwrap();
    let other = Document::parse("<a/>").unwrap();
    let set = NodeSet::new(document.root()).spawn();
    let result = set.push(vec![other.document_element().unwrap()]);
    assert!(matches!(result, Err(QueryError::OutOfBounds(_))));

    let set = NodeSet::new(document.root());
    assert!(matches!(
        set.add(Selector::node(other.document_element().unwrap())),
        Err(QueryError::OutOfBounds(_))
    ));
}

#[test]
fn test_spawn_then_end_returns_the_same_set() {
    let document = Document::parse("<a/>").unwrap();
    let set = NodeSet::new(document.root());
    assert!(Rc::ptr_eq(&set.spawn().end(), &set));

    let found = set.find("/a", FindOptions::empty()).unwrap();
    assert!(Rc::ptr_eq(&found.end(), &set));
    assert!(Rc::ptr_eq(&found.children(None).unwrap().end(), &found));
}

#[test]
fn test_children_skip_text() {
    init_logger();
    let document = Document::parse("<a><b/><c/>TEXT<d/></a>").unwrap();
    let set = NodeSet::new(document.root());
    let a = set.find("/a", FindOptions::empty()).unwrap();
    assert_eq!(names(&a.children(None).unwrap()), vec!["b", "c", "d"]);
    assert_eq!(names(&a.contents(None).unwrap()), vec!["b", "c", "#TEXT", "d"]);
}

#[test]
fn test_parents_of_a_node_pushed_twice_are_unique() {
    init_logger();
    let document = Document::parse("<root><x><y/></x></root>").unwrap();
    let set = NodeSet::new(document.root()).spawn();
    let y = document
        .document_element()
        .and_then(|root| root.first_child())
        .and_then(|x| x.first_child())
        .unwrap();
    set.push(vec![y, y]).unwrap();
    assert_eq!(names(&set.parents(None).unwrap()), vec!["root", "x"]);
}

#[test]
fn test_sibling_traversal() {
    init_logger();
    let document = Document::parse("<r><a/> <b/>text<c/><d/></r>").unwrap();
    let set = NodeSet::new(document.root());
    let c = set.find("//c", FindOptions::empty()).unwrap();

    assert_eq!(names(&c.next(None).unwrap()), vec!["d"]);
    assert_eq!(names(&c.prev(None).unwrap()), vec!["#text"]);
    assert_eq!(names(&c.prev_all(None).unwrap()), vec!["#text", "b", "a"]);
    assert_eq!(names(&c.next_all(None).unwrap()), vec!["d"]);
    assert_eq!(names(&c.siblings(None).unwrap()), vec!["a", "b", "#text", "d"]);
    assert_eq!(names(&c.prev_until("self::a", None).unwrap()), vec!["#text", "b"]);

    let a = c.end().find("//a", FindOptions::empty()).unwrap();
    assert_eq!(names(&a.next_until("self::c", None).unwrap()), vec!["b", "#text"]);
}

#[test]
fn test_prev_all_over_several_nodes_is_in_document_order() {
    let document = Document::parse("<r><a/><b/><c/></r>").unwrap();
    let set = NodeSet::new(document.root());
    let later = set.find("/r/b | /r/c", FindOptions::empty()).unwrap();
    assert_eq!(names(&later.prev_all(None).unwrap()), vec!["a", "b"]);
}

#[test]
fn test_closest_and_parent() {
    init_logger();
    let document = Document::parse(r#"<r><s id="1"><s id="2"><t/></s></s></r>"#).unwrap();
    let set = NodeSet::new(document.root());
    let t = set.find("//t", FindOptions::empty()).unwrap();
    let closest = t.closest("self::s").unwrap();
    assert_eq!(closest.len(), 1);
    assert_eq!(closest.get(0).and_then(|s| s.attribute("id")).as_deref(), Some("2"));
    assert_eq!(names(&t.closest("self::t").unwrap()), vec!["t"]);
    assert!(t.closest("self::missing").unwrap().is_empty());
    assert_eq!(names(&t.parent(None).unwrap()), vec!["s"]);
}

#[test]
fn test_has_add_and_add_back() {
    init_logger();
    let document = Document::parse("<r><a><i/></a><b/><c><i/></c></r>").unwrap();
    let set = NodeSet::new(document.root());
    let children = set.find("/r/*", FindOptions::empty()).unwrap();
    assert_eq!(names(&children.has("self::i").unwrap()), vec!["a", "c"]);

    let b = children.filter("self::b").unwrap();
    assert_eq!(names(&b.add("/r/a").unwrap()), vec!["a", "b"]);
    assert_eq!(names(&b.add_back("self::c").unwrap()), vec!["b", "c"]);
    assert_eq!(names(&b.add_back(None).unwrap()), vec!["a", "b", "c"]);
}

#[test]
fn test_callback_and_node_selectors() {
    let document = Document::parse("<r><a/><b/><c/></r>").unwrap();
    let set = NodeSet::new(document.root());
    let children = set.find("/r/*", FindOptions::empty()).unwrap();

    let odd = children
        .filter(Selector::predicate(|_: &Node<'_>, index| index % 2 == 1))
        .unwrap();
    assert_eq!(names(&odd), vec!["b"]);

    let b = odd.get(0).unwrap();
    assert_eq!(names(&children.not(Selector::node(b)).unwrap()), vec!["a", "c"]);
    assert!(children.is(&odd).unwrap());

    let found = set.find(Selector::node(b), FindOptions::USE_DOCUMENT_CONTEXT).unwrap();
    assert_eq!(found.to_vec(), vec![b]);
}

#[test]
fn test_find_relative_to_set_nodes() {
    let document = Document::parse("<r><a><i n='1'/></a><b><i n='2'/></b></r>").unwrap();
    let set = NodeSet::new(document.root());
    let b = set.find("/r/b", FindOptions::empty()).unwrap();
    let found = b.find("i", FindOptions::empty()).unwrap();
    assert_eq!(found.get(0).and_then(|i| i.attribute("n")).as_deref(), Some("2"));

    let filtered = set.find("/r", FindOptions::empty()).unwrap().find("self::i", FindOptions::MODE_FILTER).unwrap();
    assert_eq!(filtered.len(), 2);
}

#[test]
fn test_invalid_selectors() {
    let document = Document::parse("<r/>").unwrap();
    let set = NodeSet::new(document.root());
    assert!(matches!(
        set.find("", FindOptions::empty()),
        Err(QueryError::InvalidArgument(_))
    ));
    let set = NodeSet::new(document.root());
    assert!(matches!(
        set.find("count(//r)", FindOptions::empty()),
        Err(QueryError::InvalidArgument(m)) if m == "selector did not return a node sequence"
    ));
    let set = NodeSet::new(document.root());
    assert!(matches!(
        set.find("//r[", FindOptions::empty()),
        Err(QueryError::XPath(_))
    ));
}

#[test]
fn test_namespaces_and_result_bound_come_from_config() {
    init_logger();
    let document = Document::parse(r#"<f xmlns="urn:f"><e/><e/><e/></f>"#).unwrap();
    let config = QueryConfig::from_json(r#"{"namespaces": {"f": "urn:f"}, "maxResults": 2}"#).unwrap();
    let set = NodeSet::with_config(document.root(), config);

    let too_many = set.find("//f:e", FindOptions::empty());
    assert!(matches!(too_many, Err(QueryError::UnexpectedValue(m)) if m.contains("max_results 2")));

    let root = set.find("/f:f", FindOptions::empty()).unwrap();
    assert_eq!(root.config().max_results, Some(2));
    assert!(matches!(root.children(None), Err(QueryError::UnexpectedValue(_))));
    let after_first = Selector::predicate(|_: &Node<'_>, index| index > 0);
    assert_eq!(root.children(after_first).unwrap().len(), 2);
}

#[test]
fn test_directional_methods_take_a_filter() {
    init_logger();
    let document = Document::parse("<r><a/><b/><c/><d/></r>").unwrap();
    let set = NodeSet::new(document.root());
    let r = set.find("/r", FindOptions::empty()).unwrap();
    assert_eq!(names(&r.children("self::c").unwrap()), vec!["c"]);
    assert_eq!(names(&r.contents("self::a or self::d").unwrap()), vec!["a", "d"]);

    let d = r.children("self::d").unwrap();
    assert_eq!(names(&d.prev_until("self::a", "self::b").unwrap()), vec!["b"]);
    assert_eq!(names(&d.prev_all("self::a").unwrap()), vec!["a"]);
    assert_eq!(names(&d.siblings("not(self::b)").unwrap()), vec!["a", "c"]);
    assert!(d.next(None).unwrap().is_empty());
    assert_eq!(names(&d.parent("self::r").unwrap()), vec!["r"]);
    assert!(d.parent("self::x").unwrap().is_empty());

    let a = r.children("self::a").unwrap();
    assert_eq!(names(&a.next_all("self::c").unwrap()), vec!["c"]);
    assert_eq!(names(&a.next_until("self::d", "not(self::c)").unwrap()), vec!["b"]);
    assert_eq!(names(&a.next("self::b").unwrap()), vec!["b"]);
    assert!(a.prev(None).unwrap().is_empty());
}

#[test]
fn test_directional_callback_sees_axis_position() {
    let document = Document::parse("<p3><p2><p1><x/></p1></p2></p3>").unwrap();
    let set = NodeSet::new(document.root());
    let x = set.find("//x", FindOptions::empty()).unwrap();
    let second = Selector::predicate(|_: &Node<'_>, index| index == 1);
    assert_eq!(names(&x.parents(second.clone()).unwrap()), vec!["p2"]);
    assert_eq!(names(&x.parents_until("self::p3", "self::p1").unwrap()), vec!["p1"]);

    let r = Document::parse("<r><a/><b/><c/></r>").unwrap();
    let r_set = NodeSet::new(r.root()).find("/r", FindOptions::empty()).unwrap();
    let second_child = Selector::predicate(|_: &Node<'_>, index| index == 1);
    assert_eq!(names(&r_set.children(second_child).unwrap()), vec!["b"]);
}

#[test]
fn test_is_stops_at_first_match() {
    let document = Document::parse("<r><a/><b/><c/></r>").unwrap();
    let set = NodeSet::new(document.root());
    let children = set.find("/r/*", FindOptions::empty()).unwrap();
    let calls = Rc::new(Cell::new(0));
    let counter = Rc::clone(&calls);
    let matched = children
        .is(Selector::predicate(move |_: &Node<'_>, _| {
            counter.set(counter.get() + 1);
            true
        }))
        .unwrap();
    assert!(matched);
    assert_eq!(calls.get(), 1);
    assert!(!children.is("self::x").unwrap());
}
