use fluentdom_dom::DomError;
use fluentdom_query::QueryError;
use thiserror::Error;

/// Everything that can go wrong between loading a document and querying it.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Document error: {0}")]
    Dom(#[from] DomError),

    #[error("Query failed: {0}")]
    Query(#[from] QueryError),
}

impl From<fluentdom_xpath::XPathError> for Error {
    fn from(e: fluentdom_xpath::XPathError) -> Self {
        Error::Query(QueryError::XPath(e))
    }
}
