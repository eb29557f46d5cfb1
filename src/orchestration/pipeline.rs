//! Content pipeline - research, writing and review run in strict sequence

use super::events::{EventSink, Phase, PipelineEvent};
use crate::agent::{
    Draft, ResearchFindings, ResearchStage, ReviewOutcome, ReviewStage, WritingStage,
};
use crate::llm::LlmProvider;
use crate::prompts::PromptSet;
use crate::search::SearchProvider;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::Instrument;
use uuid::Uuid;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PipelineError {
    #[error("Please enter a topic first")]
    EmptyTopic,
}

/// Non-blank subject of a run
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Topic(String);

impl Topic {
    pub fn new(text: impl Into<String>) -> Result<Self, PipelineError> {
        let text: String = text.into();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(PipelineError::EmptyTopic);
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Topic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "state", content = "phase")]
pub enum PipelineState {
    Idle,
    Researching,
    Writing,
    Reviewing,
    Done,
    /// Stopped after the given phase failed
    Aborted(Phase),
}

impl std::fmt::Display for PipelineState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PipelineState::Idle => f.write_str("idle"),
            PipelineState::Researching => f.write_str("researching"),
            PipelineState::Writing => f.write_str("writing"),
            PipelineState::Reviewing => f.write_str("reviewing"),
            PipelineState::Done => f.write_str("done"),
            PipelineState::Aborted(phase) => write!(f, "aborted ({})", phase.label()),
        }
    }
}

/// The phase that stopped a run and its error text
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageFailure {
    pub phase: Phase,
    pub message: String,
}

/// Everything one run produced
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    pub run_id: Uuid,
    pub topic: Topic,
    pub model: String,
    pub research: Option<ResearchFindings>,
    pub draft: Option<Draft>,
    pub review: Option<ReviewOutcome>,
    pub state: PipelineState,
    pub failure: Option<StageFailure>,
}

impl PipelineResult {
    pub fn is_done(&self) -> bool {
        self.state == PipelineState::Done
    }

    /// Polished article; only present once the run reached Done
    pub fn final_content(&self) -> Option<&str> {
        if !self.is_done() {
            return None;
        }
        self.review.as_ref().map(|r| r.final_content.as_str())
    }
}

pub struct Pipeline {
    llm: Arc<dyn LlmProvider>,
    search: Arc<dyn SearchProvider>,
    prompts: PromptSet,
    sink: Arc<dyn EventSink>,
}

impl Pipeline {
    pub fn new(
        llm: Arc<dyn LlmProvider>,
        search: Arc<dyn SearchProvider>,
        prompts: PromptSet,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            llm,
            search,
            prompts,
            sink,
        }
    }

    /// Run all three stages for `topic`. An empty `model` selects the
    /// provider's default. Never fails: stage errors end up in the result.
    pub async fn run(&self, topic: &Topic, model: &str) -> PipelineResult {
        let run_id = Uuid::new_v4();
        let model = if model.trim().is_empty() {
            self.llm.default_model().to_string()
        } else {
            model.trim().to_string()
        };

        let span = tracing::info_span!("pipeline", %run_id, topic = %topic);
        self.execute(run_id, topic, model).instrument(span).await
    }

    async fn execute(&self, run_id: Uuid, topic: &Topic, model: String) -> PipelineResult {
        let mut result = PipelineResult {
            run_id,
            topic: topic.clone(),
            model,
            research: None,
            draft: None,
            review: None,
            state: PipelineState::Idle,
            failure: None,
        };
        tracing::info!(model = %result.model, "Pipeline started");

        let llm = self.llm.as_ref();
        let sink = self.sink.as_ref();
        let model = result.model.clone();
        let topic = topic.as_str();

        self.transition(&mut result, PipelineState::Researching);
        let findings = ResearchStage::new(llm, self.search.as_ref(), &self.prompts, sink, &model)
            .research(topic)
            .await;
        if !findings.status.is_success() {
            self.abort(&mut result, Phase::Research, findings.structured_text);
            return result;
        }

        self.transition(&mut result, PipelineState::Writing);
        let draft = WritingStage::new(llm, &self.prompts, sink, &model)
            .write(topic, &findings.structured_text)
            .await;
        result.research = Some(findings);
        if !draft.status.is_success() {
            self.abort(&mut result, Phase::Writing, draft.text);
            return result;
        }

        self.transition(&mut result, PipelineState::Reviewing);
        let review = ReviewStage::new(llm, &self.prompts, sink, &model)
            .review(topic, &draft.text)
            .await;
        if !review.status.is_success() {
            tracing::warn!("Review failed, keeping the draft as final content");
        }
        result.draft = Some(draft);
        result.review = Some(review);

        self.transition(&mut result, PipelineState::Done);
        tracing::info!("Pipeline completed");
        result
    }

    fn transition(&self, result: &mut PipelineResult, to: PipelineState) {
        let from = result.state;
        result.state = to;
        tracing::debug!(%from, %to, "Pipeline transition");
        self.sink.emit(&PipelineEvent::StateChanged { from, to });
    }

    /// Stop the run; the failing stage's record is dropped, its message kept
    fn abort(&self, result: &mut PipelineResult, phase: Phase, message: String) {
        tracing::error!(phase = %phase, "Pipeline aborted: {}", message);
        result.failure = Some(StageFailure { phase, message });
        self.transition(result, PipelineState::Aborted(phase));
    }
}
