use fluentdom::{Node, Nodes};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

pub const CATALOG: &str = r#"<catalog xmlns:m="urn:meta">
  <book id="b1" m:lang="en">
    <title>Rust in Depth</title>
    <price>39.5</price>
  </book>
  <book id="b2">
    <title>Trees</title>
    <price>12</price>
    <note>second hand</note>
  </book>
  <magazine id="m1">
    <title>Monthly</title>
  </magazine>
</catalog>"#;

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Qualified names of the elements, `#text` for text nodes.
pub fn names<'d>(set: &Nodes<'d, Node<'d>>) -> Vec<String> {
    set.iter()
        .map(|node| node.qualified_name().unwrap_or_else(|| "#text".to_string()))
        .collect()
}

/// The `id` attribute of every node, empty where missing.
pub fn ids<'d>(set: &Nodes<'d, Node<'d>>) -> Vec<String> {
    set.iter()
        .map(|node| node.attribute("id").unwrap_or_default())
        .collect()
}
