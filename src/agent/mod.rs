//! Content stages: research, writing and review
//!
//! Every stage is a failure boundary. Provider errors are caught inside the
//! stage and come back as a record with [`StageStatus::Error`] and a readable
//! message in place of the content; no stage returns `Result`.

mod research;
mod reviewer;
mod writer;

pub use research::{ResearchFindings, ResearchStage, NO_SEARCH_RESULTS};
pub use reviewer::{
    split_review, ReviewOutcome, ReviewStage, DEFAULT_REVIEW_REPORT, FINAL_MARKER, REPORT_MARKER,
};
pub use writer::{Draft, WritingStage};

use crate::llm::{CompletionRequest, LlmError, LlmProvider};
use crate::prompts::{PromptSet, TemplateName};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StageStatus {
    Success,
    Error,
}

impl StageStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, StageStatus::Success)
    }
}

/// Sampling settings for one stage's completion call
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

pub const RESEARCH_PARAMS: GenerationParams = GenerationParams {
    temperature: 0.3,
    max_tokens: 2000,
};

pub const WRITING_PARAMS: GenerationParams = GenerationParams {
    temperature: 0.7,
    max_tokens: 3000,
};

pub const REVIEW_PARAMS: GenerationParams = GenerationParams {
    temperature: 0.3,
    max_tokens: 3500,
};

/// Render a system/user template pair and run one completion
async fn complete_prompt(
    llm: &dyn LlmProvider,
    prompts: &PromptSet,
    templates: (TemplateName, TemplateName),
    vars: &[(&str, &str)],
    model: &str,
    params: GenerationParams,
) -> Result<String, LlmError> {
    let (system, user) = templates;
    let request = CompletionRequest::new(
        prompts.get(system).render(vars),
        prompts.get(user).render(vars),
    )
    .with_model(model)
    .with_max_tokens(params.max_tokens)
    .with_temperature(params.temperature);

    tracing::debug!(
        provider = llm.name(),
        template = user.as_str(),
        "Running stage completion"
    );

    let response = llm.complete(&request).await?;
    Ok(response.text)
}
