//! Research stage - web search plus LLM synthesis of SEO findings

use super::{complete_prompt, StageStatus, RESEARCH_PARAMS};
use crate::llm::LlmProvider;
use crate::orchestration::{EventSink, Phase, PipelineEvent};
use crate::prompts::{PromptSet, TemplateName};
use crate::search::{has_usable_results, SearchProvider};
use serde::Serialize;

/// Raw search block used when no query produced usable results
pub const NO_SEARCH_RESULTS: &str = "No search results found.";

/// Results kept from each query
const RESULTS_PER_QUERY: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResearchFindings {
    /// Synthesized report, or the error description
    pub structured_text: String,
    /// Compiled search block; absent on error
    pub raw_search_data: Option<String>,
    pub status: StageStatus,
}

pub struct ResearchStage<'a> {
    llm: &'a dyn LlmProvider,
    search: &'a dyn SearchProvider,
    prompts: &'a PromptSet,
    sink: &'a dyn EventSink,
    model: &'a str,
}

impl<'a> ResearchStage<'a> {
    pub fn new(
        llm: &'a dyn LlmProvider,
        search: &'a dyn SearchProvider,
        prompts: &'a PromptSet,
        sink: &'a dyn EventSink,
        model: &'a str,
    ) -> Self {
        Self {
            llm,
            search,
            prompts,
            sink,
            model,
        }
    }

    /// The query variants searched for a topic, in order
    pub fn queries(topic: &str) -> [String; 3] {
        [
            topic.to_string(),
            format!("{topic} latest trends 2024 2025"),
            format!("{topic} statistics facts benefits"),
        ]
    }

    pub async fn research(&self, topic: &str) -> ResearchFindings {
        self.sink.emit(&PipelineEvent::StageStarted {
            phase: Phase::Research,
            task: format!("Researching: {topic}"),
        });

        let search_data = self.compile_search_data(topic).await;

        let result = complete_prompt(
            self.llm,
            self.prompts,
            (TemplateName::ResearchSystem, TemplateName::ResearchUser),
            &[("topic", topic), ("search_data", search_data.as_str())],
            self.model,
            RESEARCH_PARAMS,
        )
        .await;

        match result {
            Ok(findings) => {
                self.sink
                    .emit(&PipelineEvent::completed(Phase::Research, &findings));
                ResearchFindings {
                    structured_text: findings,
                    raw_search_data: Some(search_data),
                    status: StageStatus::Success,
                }
            }
            Err(e) => {
                let message = format!("Research error: {e}");
                self.sink.emit(&PipelineEvent::StageFailed {
                    phase: Phase::Research,
                    error: e.to_string(),
                });
                ResearchFindings {
                    structured_text: message,
                    raw_search_data: None,
                    status: StageStatus::Error,
                }
            }
        }
    }

    /// Search every query variant one after another and build the raw block
    async fn compile_search_data(&self, topic: &str) -> String {
        let mut lines = Vec::new();

        for query in Self::queries(topic) {
            self.sink.emit(&PipelineEvent::ToolUsed {
                tool: self.search.name().to_string(),
                query: query.clone(),
            });

            let results = self.search.search(&query).await;
            if !has_usable_results(&results) {
                tracing::debug!(query = %query, "Skipping query without usable results");
                continue;
            }

            lines.push(format!("\n=== Search: '{query}' ==="));
            for (i, r) in results.iter().take(RESULTS_PER_QUERY).enumerate() {
                lines.push(format!(
                    "{}. {}\n   {}\n   Source: {}",
                    i + 1,
                    r.title,
                    r.snippet,
                    r.link
                ));
            }
        }

        if lines.is_empty() {
            NO_SEARCH_RESULTS.to_string()
        } else {
            lines.join("\n")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ScriptedProvider, ScriptedReply};
    use crate::orchestration::ActivityLog;
    use crate::search::{ScriptedSearch, SearchResult};

    fn hits(prefix: &str, n: usize) -> Vec<SearchResult> {
        (1..=n)
            .map(|i| {
                SearchResult::new(
                    format!("{prefix} {i}"),
                    format!("https://example.com/{prefix}/{i}"),
                    format!("snippet {i}"),
                )
            })
            .collect()
    }

    #[tokio::test]
    async fn test_compiles_top_three_per_query() {
        let llm = ScriptedProvider::with_replies([ScriptedReply::Text("findings".into())]);
        let search = ScriptedSearch::new()
            .with_query("Rust", hits("a", 5))
            .with_query("Rust statistics facts benefits", hits("b", 1));
        let prompts = PromptSet::builtin();
        let log = ActivityLog::new();

        let stage = ResearchStage::new(&llm, &search, &prompts, &log, "m");
        let findings = stage.research("Rust").await;

        assert_eq!(findings.status, StageStatus::Success);
        assert_eq!(findings.structured_text, "findings");

        let raw = findings.raw_search_data.unwrap();
        let expected = "\n=== Search: 'Rust' ===\n\
            1. a 1\n   snippet 1\n   Source: https://example.com/a/1\n\
            2. a 2\n   snippet 2\n   Source: https://example.com/a/2\n\
            3. a 3\n   snippet 3\n   Source: https://example.com/a/3\n\
            \n=== Search: 'Rust statistics facts benefits' ===\n\
            1. b 1\n   snippet 1\n   Source: https://example.com/b/1";
        assert_eq!(raw, expected);

        assert_eq!(
            search.queries(),
            vec![
                "Rust",
                "Rust latest trends 2024 2025",
                "Rust statistics facts benefits"
            ]
        );
    }

    #[tokio::test]
    async fn test_request_embeds_search_block_and_params() {
        let llm = ScriptedProvider::new();
        let search = ScriptedSearch::new();
        let prompts = PromptSet::builtin();
        let log = ActivityLog::new();

        ResearchStage::new(&llm, &search, &prompts, &log, "gemma2-9b-it")
            .research("Solar power")
            .await;

        let requests = llm.requests();
        assert_eq!(requests.len(), 1);
        let req = &requests[0];
        assert_eq!(req.model, "gemma2-9b-it");
        assert_eq!(req.max_tokens, 2000);
        assert!((req.temperature - 0.3).abs() < f32::EPSILON);
        assert!(req.user_prompt.contains("Solar power"));
        assert!(req.user_prompt.contains(NO_SEARCH_RESULTS));
    }

    #[tokio::test]
    async fn test_provider_error_becomes_error_record() {
        let llm = ScriptedProvider::with_replies([ScriptedReply::Unauthorized(
            "invalid api key".into(),
        )]);
        let search = ScriptedSearch::failing("timeout");
        let prompts = PromptSet::builtin();
        let log = ActivityLog::new();

        let findings = ResearchStage::new(&llm, &search, &prompts, &log, "m")
            .research("Rust")
            .await;

        assert_eq!(findings.status, StageStatus::Error);
        assert!(findings.structured_text.starts_with("Research error:"));
        assert!(findings.structured_text.contains("invalid api key"));
        assert_eq!(findings.raw_search_data, None);

        let events = log.events();
        let tool_uses = events
            .iter()
            .filter(|e| matches!(e, PipelineEvent::ToolUsed { .. }))
            .count();
        assert_eq!(tool_uses, 3);
        assert!(matches!(
            events.last(),
            Some(PipelineEvent::StageFailed {
                phase: Phase::Research,
                ..
            })
        ));
    }
}
