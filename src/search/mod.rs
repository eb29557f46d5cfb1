//! Web search boundary
//!
//! [`SearchProvider::search`] never fails: transport and parse problems come
//! back as a single sentinel [`SearchResult`] carrying only an error message,
//! so callers check the first element before using the results.

mod duckduckgo;
mod scripted;

pub use duckduckgo::DuckDuckGoSearch;
pub use scripted::ScriptedSearch;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default cap on results per query
pub const DEFAULT_MAX_RESULTS: usize = 5;

/// One ranked search hit, or the error sentinel
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub link: String,
    pub snippet: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SearchResult {
    pub fn new(
        title: impl Into<String>,
        link: impl Into<String>,
        snippet: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
            snippet: snippet.into(),
            error: None,
        }
    }

    /// Sentinel entry standing in for a failed or empty search
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            error: Some(message.into()),
            ..Self::default()
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// True when the result list holds usable hits (non-empty, first entry not a sentinel)
pub fn has_usable_results(results: &[SearchResult]) -> bool {
    results.first().is_some_and(|r| !r.is_error())
}

/// Failures inside a search adapter; converted to the sentinel before returning
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("{0}")]
    Network(String),

    #[error("HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("invalid response: {0}")]
    Parse(String),
}

/// Trait for web search providers
#[async_trait]
pub trait SearchProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Search for `query`; at most the provider's configured max results,
    /// in provider relevance order
    async fn search(&self, query: &str) -> Vec<SearchResult>;
}
