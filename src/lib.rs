//! Fluent, XPath-driven node-set selection and traversal.
//!
//! ```
//! use fluentdom::{Document, FindOptions};
//!
//! let document = Document::parse("<a><b/><c/>TEXT<d/></a>")?;
//! let children = fluentdom::query(&document)
//!     .find("/a", FindOptions::empty())?
//!     .children(None)?;
//! assert_eq!(children.len(), 3);
//! # Ok::<(), fluentdom::Error>(())
//! ```

mod error;

pub use error::Error;
pub use fluentdom_dom::{Document, DomError, Node, NodeKind};
pub use fluentdom_query::{
    Content, FetchOptions, FindOptions, IntoSelector, NodeSet, Nodes, QueryConfig, QueryError,
    Selector, TreeComparator, XPath,
};
pub use fluentdom_xpath as xpath;

/// A node set over the whole of `document`.
pub fn query(document: &Document) -> Nodes<'_, Node<'_>> {
    NodeSet::new(document.root())
}

/// Like [`query`] with namespaces and a result bound taken from `config`.
pub fn query_with(document: &Document, config: QueryConfig) -> Nodes<'_, Node<'_>> {
    log::debug!("query with {} namespace binding(s)", config.namespaces.len());
    NodeSet::with_config(document.root(), config)
}
