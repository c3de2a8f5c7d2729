//! Fluent node-set selection and traversal for any tree implementing
//! [`XPathNode`](fluentdom_xpath::XPathNode).
//!
//! Start with [`NodeSet::new`] for a document or a node of it, then chain
//! [`find`](NodeSet::find), the directional methods and the filters. Every
//! call returns a new, read-only [`Nodes`] handle; [`end`](NodeSet::end)
//! steps back to the set a result was derived from.

mod comparator;
mod config;
mod content;
mod context;
mod error;
mod fetch;
mod nodes;
mod options;
mod selector;
mod traversal;
mod xpath;

pub use comparator::TreeComparator;
pub use config::QueryConfig;
pub use content::Content;
pub use error::QueryError;
pub use nodes::{NodeSet, Nodes};
pub use options::{FetchOptions, FindOptions};
pub use selector::{Callback, IntoSelector, Selector};
pub use xpath::XPath;
