use thiserror::Error;

#[derive(Error, Debug)]
pub enum DomError {
    #[error("Node #{0} belongs to a different document")]
    ForeignNode(usize),

    #[error("Hierarchy request error: {0}")]
    HierarchyRequest(String),

    #[error("XML parse error: {0}")]
    Parse(#[from] roxmltree::Error),
}
