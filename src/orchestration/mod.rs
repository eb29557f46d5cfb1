//! Pipeline orchestration - stage sequencing, run state and progress events

mod events;
mod pipeline;

pub use events::{
    truncate_chars, ActivityEntry, ActivityKind, ActivityLog, EventSink, FanoutSink, NullSink,
    Phase, PipelineEvent, TracingSink, PREVIEW_CHARS,
};
pub use pipeline::{
    Pipeline, PipelineError, PipelineResult, PipelineState, StageFailure, Topic,
};
