//! Scripted search - canned results keyed by query, for tests and offline runs

use super::{SearchProvider, SearchResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Answers queries from a fixed table; unknown queries get `fallback`
pub struct ScriptedSearch {
    by_query: HashMap<String, Vec<SearchResult>>,
    fallback: Vec<SearchResult>,
    queries: Mutex<Vec<String>>,
}

impl Default for ScriptedSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedSearch {
    /// Every query returns the "No results found" sentinel
    pub fn new() -> Self {
        Self {
            by_query: HashMap::new(),
            fallback: vec![SearchResult::error("No results found")],
            queries: Mutex::new(Vec::new()),
        }
    }

    /// Every query returns `results`
    pub fn always(results: Vec<SearchResult>) -> Self {
        Self {
            fallback: results,
            ..Self::new()
        }
    }

    /// Every query fails with a transport-style sentinel
    pub fn failing(message: impl Into<String>) -> Self {
        Self::always(vec![SearchResult::error(format!(
            "Search failed: {}",
            message.into()
        ))])
    }

    pub fn with_query(mut self, query: impl Into<String>, results: Vec<SearchResult>) -> Self {
        self.by_query.insert(query.into(), results);
        self
    }

    /// Queries received so far, in call order
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().map(|q| q.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl SearchProvider for ScriptedSearch {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn search(&self, query: &str) -> Vec<SearchResult> {
        if let Ok(mut log) = self.queries.lock() {
            log.push(query.to_string());
        }
        self.by_query
            .get(query)
            .cloned()
            .unwrap_or_else(|| self.fallback.clone())
    }
}
