//! DuckDuckGo instant-answer search (no API key)
//!
//! Instant answers cover encyclopedia-style topics, not ranked web pages, so
//! long or news-like queries often come back empty.

use super::{SearchError, SearchProvider, SearchResult, DEFAULT_MAX_RESULTS};
use crate::config::SearchConfig;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const DDG_API_URL: &str = "https://api.duckduckgo.com/";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct InstantAnswer {
    #[serde(rename = "Heading")]
    heading: String,
    #[serde(rename = "AbstractText")]
    abstract_text: String,
    #[serde(rename = "AbstractURL")]
    abstract_url: String,
    #[serde(rename = "AbstractSource")]
    abstract_source: String,
    #[serde(rename = "Results")]
    results: Vec<Topic>,
    #[serde(rename = "RelatedTopics")]
    related_topics: Vec<Topic>,
}

/// A result or related topic; groups nest further topics under `Topics`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Topic {
    #[serde(rename = "Text")]
    text: Option<String>,
    #[serde(rename = "FirstURL")]
    first_url: Option<String>,
    #[serde(rename = "Topics")]
    topics: Vec<Topic>,
}

pub struct DuckDuckGoSearch {
    client: reqwest::Client,
    base_url: String,
    max_results: usize,
    region: String,
}

impl DuckDuckGoSearch {
    pub fn new() -> Result<Self, SearchError> {
        Self::from_config(&SearchConfig::default())
    }

    pub fn from_config(config: &SearchConfig) -> Result<Self, SearchError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("studio/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| SearchError::Network(e.to_string()))?;

        Ok(Self {
            client,
            base_url: DDG_API_URL.to_string(),
            max_results: if config.max_results == 0 {
                DEFAULT_MAX_RESULTS
            } else {
                config.max_results
            },
            region: config.region.clone(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn request_url(&self, query: &str) -> Result<url::Url, SearchError> {
        url::Url::parse_with_params(
            &self.base_url,
            &[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
                ("kl", self.region.as_str()),
            ],
        )
        .map_err(|e| SearchError::Parse(format!("bad search URL: {e}")))
    }

    async fn fetch(&self, query: &str) -> Result<Vec<SearchResult>, SearchError> {
        let url = self.request_url(query)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SearchError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(SearchError::Status(response.status()));
        }

        // DDG answers with `application/x-javascript`, so decode the text ourselves
        let body = response
            .text()
            .await
            .map_err(|e| SearchError::Network(e.to_string()))?;
        let answer: InstantAnswer =
            serde_json::from_str(&body).map_err(|e| SearchError::Parse(e.to_string()))?;

        Ok(collect_results(&answer, self.max_results))
    }
}

/// Flatten an instant answer into ranked results: abstract first, then
/// direct results, then related topics (groups expanded in place)
fn collect_results(answer: &InstantAnswer, max_results: usize) -> Vec<SearchResult> {
    let mut results = Vec::new();

    if !answer.abstract_text.is_empty() {
        let title = if answer.heading.is_empty() {
            answer.abstract_source.clone()
        } else {
            answer.heading.clone()
        };
        results.push(SearchResult::new(
            title,
            answer.abstract_url.clone(),
            answer.abstract_text.clone(),
        ));
    }

    let mut stack: Vec<&Topic> = answer
        .results
        .iter()
        .chain(answer.related_topics.iter())
        .rev()
        .collect();

    while let Some(topic) = stack.pop() {
        if results.len() >= max_results {
            break;
        }
        if !topic.topics.is_empty() {
            stack.extend(topic.topics.iter().rev());
            continue;
        }
        if let Some(result) = topic_to_result(topic) {
            results.push(result);
        }
    }

    results.truncate(max_results);
    results
}

fn topic_to_result(topic: &Topic) -> Option<SearchResult> {
    let text = topic.text.as_deref().filter(|t| !t.trim().is_empty())?;
    let link = topic.first_url.clone().unwrap_or_default();

    if let Some((title, snippet)) = text.split_once(" - ") {
        return Some(SearchResult::new(title.trim(), link, snippet.trim()));
    }

    let title = title_from_link(&link).unwrap_or_else(|| text.to_string());
    Some(SearchResult::new(title, link, text))
}

/// `https://duckduckgo.com/Remote_work` -> `Remote work`
fn title_from_link(link: &str) -> Option<String> {
    let parsed = url::Url::parse(link).ok()?;
    let segment = parsed.path_segments()?.rev().find(|s| !s.is_empty())?;
    let decoded = urlencoding::decode(segment).ok()?;
    let title = decoded.replace('_', " ");
    (!title.trim().is_empty()).then_some(title)
}

#[async_trait]
impl SearchProvider for DuckDuckGoSearch {
    fn name(&self) -> &str {
        "duckduckgo"
    }

    async fn search(&self, query: &str) -> Vec<SearchResult> {
        match self.fetch(query).await {
            Ok(results) if results.is_empty() => {
                tracing::debug!(query, "Search returned no results");
                vec![SearchResult::error("No results found")]
            }
            Ok(results) => {
                tracing::debug!(query, count = results.len(), "Search completed");
                results
            }
            Err(e) => {
                tracing::warn!(query, error = %e, "Search failed");
                vec![SearchResult::error(format!("Search failed: {e}"))]
            }
        }
    }
}
