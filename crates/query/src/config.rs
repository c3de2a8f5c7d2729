use crate::error::QueryError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Settings shared by every set of one query chain.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct QueryConfig {
    /// Prefix to namespace URI bindings for every expression.
    pub namespaces: BTreeMap<String, String>,
    /// Upper bound for the size of a fetch result. A fetch selecting more
    /// nodes fails with `UnexpectedValue`.
    pub max_results: Option<usize>,
}

impl QueryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_namespace(mut self, prefix: &str, uri: &str) -> Self {
        self.namespaces.insert(prefix.to_string(), uri.to_string());
        self
    }

    pub fn with_max_results(mut self, limit: usize) -> Self {
        self.max_results = Some(limit);
        self
    }

    pub fn from_json(json: &str) -> Result<Self, QueryError> {
        Ok(serde_json::from_str(json)?)
    }

    pub(crate) fn namespace_map(&self) -> HashMap<String, String> {
        self.namespaces
            .iter()
            .map(|(prefix, uri)| (prefix.clone(), uri.clone()))
            .collect()
    }
}
