//! Review stage - QA pass that returns a report and the polished article

use super::{complete_prompt, StageStatus, REVIEW_PARAMS};
use crate::llm::LlmProvider;
use crate::orchestration::{EventSink, Phase, PipelineEvent};
use crate::prompts::{PromptSet, TemplateName};
use serde::Serialize;

pub const REPORT_MARKER: &str = "### REVIEW REPORT";
pub const FINAL_MARKER: &str = "### FINAL CONTENT";

/// Report used when the response cannot be split
pub const DEFAULT_REVIEW_REPORT: &str = "Review completed.";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewOutcome {
    pub review_report: String,
    /// Never empty: falls back to the raw response or the draft
    pub final_content: String,
    pub status: StageStatus,
}

/// Split a review response into `(report, final_content)`.
///
/// Exactly one [`FINAL_MARKER`] splits the text: the head, with
/// [`REPORT_MARKER`] removed, is the report and the tail is the content, both
/// trimmed. The tail may be empty. With no marker or a repeated marker, the
/// report is [`DEFAULT_REVIEW_REPORT`] and the content is `raw` verbatim.
pub fn split_review(raw: &str) -> (String, String) {
    let mut parts = raw.split(FINAL_MARKER);

    if let (Some(head), Some(tail), None) = (parts.next(), parts.next(), parts.next()) {
        let report = head.replace(REPORT_MARKER, "");
        return (report.trim().to_string(), tail.trim().to_string());
    }

    (DEFAULT_REVIEW_REPORT.to_string(), raw.to_string())
}

pub struct ReviewStage<'a> {
    llm: &'a dyn LlmProvider,
    prompts: &'a PromptSet,
    sink: &'a dyn EventSink,
    model: &'a str,
}

impl<'a> ReviewStage<'a> {
    pub fn new(
        llm: &'a dyn LlmProvider,
        prompts: &'a PromptSet,
        sink: &'a dyn EventSink,
        model: &'a str,
    ) -> Self {
        Self {
            llm,
            prompts,
            sink,
            model,
        }
    }

    pub async fn review(&self, topic: &str, draft: &str) -> ReviewOutcome {
        self.sink.emit(&PipelineEvent::StageStarted {
            phase: Phase::Review,
            task: format!("Reviewing content for: {topic}"),
        });

        let result = complete_prompt(
            self.llm,
            self.prompts,
            (TemplateName::ReviewSystem, TemplateName::ReviewUser),
            &[("topic", topic), ("draft", draft)],
            self.model,
            REVIEW_PARAMS,
        )
        .await;

        match result {
            Ok(raw) => {
                let (review_report, mut final_content) = split_review(&raw);
                if review_report == DEFAULT_REVIEW_REPORT {
                    tracing::warn!("Review response missing section markers, using it whole");
                }
                if final_content.is_empty() {
                    tracing::warn!("Review returned no final content, keeping the draft");
                    final_content = draft.to_string();
                }
                self.sink
                    .emit(&PipelineEvent::completed(Phase::Review, &final_content));
                ReviewOutcome {
                    review_report,
                    final_content,
                    status: StageStatus::Success,
                }
            }
            Err(e) => {
                self.sink.emit(&PipelineEvent::StageFailed {
                    phase: Phase::Review,
                    error: e.to_string(),
                });
                ReviewOutcome {
                    review_report: format!("Review error: {e}"),
                    final_content: draft.to_string(),
                    status: StageStatus::Error,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{ScriptedProvider, ScriptedReply};
    use crate::orchestration::NullSink;

    #[test]
    fn test_split_with_both_markers() {
        let raw = "### REVIEW REPORT\n- fixed typos\n\n### FINAL CONTENT\n# Title\n\nBody\n";
        let (report, content) = split_review(raw);
        assert_eq!(report, "- fixed typos");
        assert_eq!(content, "# Title\n\nBody");
    }

    #[test]
    fn test_split_without_report_marker() {
        let (report, content) = split_review("Looks fine.\n### FINAL CONTENT\nText");
        assert_eq!(report, "Looks fine.");
        assert_eq!(content, "Text");
    }

    #[test]
    fn test_split_fallbacks() {
        let missing = "Just an article";
        assert_eq!(
            split_review(missing),
            (DEFAULT_REVIEW_REPORT.to_string(), missing.to_string())
        );

        let twice = "### FINAL CONTENT\na\n### FINAL CONTENT\nb";
        assert_eq!(
            split_review(twice),
            (DEFAULT_REVIEW_REPORT.to_string(), twice.to_string())
        );

    }

    #[test]
    fn test_split_keeps_report_when_tail_is_blank() {
        let (report, content) =
            split_review("### REVIEW REPORT\n- fixed heading levels\n### FINAL CONTENT\n");
        assert_eq!(report, "- fixed heading levels");
        assert_eq!(content, "");
    }

    #[tokio::test]
    async fn test_review_params_and_split() {
        let llm = ScriptedProvider::with_replies([ScriptedReply::Text(
            "### REVIEW REPORT\nTightened intro\n### FINAL CONTENT\n# Polished".into(),
        )]);
        let prompts = PromptSet::builtin();

        let outcome = ReviewStage::new(&llm, &prompts, &NullSink, "m")
            .review("Rust", "# Draft")
            .await;

        assert_eq!(outcome.status, StageStatus::Success);
        assert_eq!(outcome.review_report, "Tightened intro");
        assert_eq!(outcome.final_content, "# Polished");

        let req = &llm.requests()[0];
        assert_eq!(req.max_tokens, 3500);
        assert!((req.temperature - 0.3).abs() < f32::EPSILON);
        assert!(req.user_prompt.contains("# Draft"));
    }

    #[tokio::test]
    async fn test_empty_final_section_falls_back_to_draft() {
        let llm = ScriptedProvider::with_replies([ScriptedReply::Text(
            "### REVIEW REPORT\n- fixed heading levels\n### FINAL CONTENT\n  \n".into(),
        )]);
        let prompts = PromptSet::builtin();

        let outcome = ReviewStage::new(&llm, &prompts, &NullSink, "m")
            .review("Rust", "# Draft")
            .await;

        assert_eq!(outcome.status, StageStatus::Success);
        assert_eq!(outcome.review_report, "- fixed heading levels");
        assert_eq!(outcome.final_content, "# Draft");
    }

    #[tokio::test]
    async fn test_review_error_keeps_draft() {
        let llm = ScriptedProvider::with_replies([ScriptedReply::NetworkError("timeout".into())]);
        let prompts = PromptSet::builtin();

        let outcome = ReviewStage::new(&llm, &prompts, &NullSink, "m")
            .review("Rust", "# Draft")
            .await;

        assert_eq!(outcome.status, StageStatus::Error);
        assert_eq!(outcome.final_content, "# Draft");
        assert!(outcome.review_report.starts_with("Review error:"));
    }
}
