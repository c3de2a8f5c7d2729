//! A small arena DOM: one [`Document`] owns every node record, [`Node`] is a
//! copyable handle into it. Nodes implement [`fluentdom_xpath::XPathNode`] so
//! the XPath engine can run over them directly.

mod document;
mod error;
mod loader;
mod node;

pub use document::{Document, NodeKind};
pub use error::DomError;
pub use node::Node;
