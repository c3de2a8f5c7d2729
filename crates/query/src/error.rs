use fluentdom_xpath::XPathError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum QueryError {
    /// Malformed or unsupported selector, or a fetch expression that did not
    /// produce nodes.
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// A node that belongs to another document.
    #[error("Out of bounds: {0}")]
    OutOfBounds(String),

    #[error("Unexpected value: {0}")]
    UnexpectedValue(String),

    /// Mutation of a closed node set.
    #[error("Bad method call: {0}")]
    BadMethodCall(String),

    #[error(transparent)]
    XPath(#[from] XPathError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}
