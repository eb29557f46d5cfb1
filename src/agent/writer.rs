//! Writing stage - turns research findings into a draft article

use super::{complete_prompt, StageStatus, WRITING_PARAMS};
use crate::llm::LlmProvider;
use crate::orchestration::{EventSink, Phase, PipelineEvent};
use crate::prompts::{PromptSet, TemplateName};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Draft {
    /// Article text, or the error description
    pub text: String,
    pub status: StageStatus,
}

pub struct WritingStage<'a> {
    llm: &'a dyn LlmProvider,
    prompts: &'a PromptSet,
    sink: &'a dyn EventSink,
    model: &'a str,
}

impl<'a> WritingStage<'a> {
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

    pub async fn write(&self, topic: &str, findings: &str) -> Draft {
        self.sink.emit(&PipelineEvent::StageStarted {
            phase: Phase::Writing,
            task: format!("Writing content for: {topic}"),
        });

        let result = complete_prompt(
            self.llm,
            self.prompts,
            (TemplateName::WritingSystem, TemplateName::WritingUser),
            &[("topic", topic), ("findings", findings)],
            self.model,
            WRITING_PARAMS,
        )
        .await;

        match result {
            Ok(text) => {
                self.sink.emit(&PipelineEvent::completed(Phase::Writing, &text));
                Draft {
                    text,
                    status: StageStatus::Success,
                }
            }
            Err(e) => {
                self.sink.emit(&PipelineEvent::StageFailed {
                    phase: Phase::Writing,
                    error: e.to_string(),
                });
                Draft {
                    text: format!("Writing error: {e}"),
                    status: StageStatus::Error,
                }
            }
        }
    }
}
