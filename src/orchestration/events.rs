//! Pipeline events and sinks
//!
//! Stages and the orchestrator report progress through an injected
//! [`EventSink`]. The CLI plugs in a console sink, tests use [`ActivityLog`],
//! and [`TracingSink`] forwards everything to `tracing`.

use super::pipeline::PipelineState;
use chrono::{DateTime, Local};
use serde::Serialize;
use std::sync::{Arc, Mutex};

/// Characters of stage output carried by a completion event
pub const PREVIEW_CHARS: usize = 100;

/// Characters of that preview kept in an activity entry
const ACTIVITY_PREVIEW_CHARS: usize = 50;

/// The three pipeline phases, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Research,
    Writing,
    Review,
}

impl Phase {
    pub const ALL: [Phase; 3] = [Phase::Research, Phase::Writing, Phase::Review];

    /// 1-based position, for "Phase n/3" progress lines
    pub fn number(&self) -> usize {
        match self {
            Phase::Research => 1,
            Phase::Writing => 2,
            Phase::Review => 3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Phase::Research => "Research",
            Phase::Writing => "Writing",
            Phase::Review => "Review",
        }
    }

    /// Display name of the stage that runs this phase
    pub fn stage_name(&self) -> &'static str {
        match self {
            Phase::Research => "SEO Researcher",
            Phase::Writing => "Content Writer",
            Phase::Review => "Content Reviewer",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PipelineEvent {
    /// Orchestrator moved between states
    StateChanged {
        from: PipelineState,
        to: PipelineState,
    },
    /// A stage began work
    StageStarted { phase: Phase, task: String },
    /// A stage finished; `preview` is the head of its output
    StageCompleted { phase: Phase, preview: String },
    /// A stage caught a provider error and returned an error record
    StageFailed { phase: Phase, error: String },
    /// A stage called an external tool (web search)
    ToolUsed { tool: String, query: String },
}

impl PipelineEvent {
    pub fn completed(phase: Phase, output: &str) -> Self {
        PipelineEvent::StageCompleted {
            phase,
            preview: truncate_chars(output, PREVIEW_CHARS),
        }
    }
}

/// Receiver for pipeline progress
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &PipelineEvent);
}

/// Discards everything
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &PipelineEvent) {}
}

/// Forwards events to `tracing`
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &PipelineEvent) {
        match event {
            PipelineEvent::StateChanged { from, to } => {
                tracing::debug!(from = %from, to = %to, "Pipeline state changed");
            }
            PipelineEvent::StageStarted { phase, task } => {
                tracing::info!("{} started: {}", phase.stage_name(), task);
            }
            PipelineEvent::StageCompleted { phase, .. } => {
                tracing::info!("{} completed", phase.stage_name());
            }
            PipelineEvent::StageFailed { phase, error } => {
                tracing::error!("{} error: {}", phase.stage_name(), error);
            }
            PipelineEvent::ToolUsed { tool, query } => {
                tracing::debug!(tool = %tool, query = %query, "Tool used");
            }
        }
    }
}

/// Sends each event to every inner sink, in order
#[derive(Default)]
pub struct FanoutSink {
    sinks: Vec<Arc<dyn EventSink>>,
}

impl FanoutSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, sink: Arc<dyn EventSink>) -> Self {
        self.sinks.push(sink);
        self
    }
}

impl EventSink for FanoutSink {
    fn emit(&self, event: &PipelineEvent) {
        for sink in &self.sinks {
            sink.emit(event);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityKind {
    Start,
    Complete,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct ActivityEntry {
    pub time: DateTime<Local>,
    pub stage: String,
    pub message: String,
    pub kind: ActivityKind,
}

impl std::fmt::Display for ActivityEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let icon = match self.kind {
            ActivityKind::Start => "+",
            ActivityKind::Complete => "✓",
            ActivityKind::Error => "✗",
        };
        write!(
            f,
            "{} [{}] {}: {}",
            icon,
            self.time.format("%H:%M:%S"),
            self.stage,
            self.message
        )
    }
}

/// Per-run record of stage activity
#[derive(Default)]
pub struct ActivityLog {
    entries: Mutex<Vec<ActivityEntry>>,
    events: Mutex<Vec<PipelineEvent>>,
}

impl ActivityLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start / complete / error entries in arrival order
    pub fn entries(&self) -> Vec<ActivityEntry> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Every event received, including state changes and tool use
    pub fn events(&self) -> Vec<PipelineEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    fn push(&self, phase: Phase, message: String, kind: ActivityKind) {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(ActivityEntry {
                time: Local::now(),
                stage: phase.stage_name().to_string(),
                message,
                kind,
            });
        }
    }
}

impl EventSink for ActivityLog {
    fn emit(&self, event: &PipelineEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }

        match event {
            PipelineEvent::StageStarted { phase, task } => {
                self.push(*phase, format!("Started: {task}"), ActivityKind::Start);
            }
            PipelineEvent::StageCompleted { phase, preview } => {
                let short = truncate_chars(preview, ACTIVITY_PREVIEW_CHARS);
                self.push(
                    *phase,
                    format!("Completed: {short}..."),
                    ActivityKind::Complete,
                );
            }
            PipelineEvent::StageFailed { phase, error } => {
                self.push(*phase, format!("Error: {error}"), ActivityKind::Error);
            }
            PipelineEvent::StateChanged { .. } | PipelineEvent::ToolUsed { .. } => {}
        }
    }
}

/// First `max` characters of `text`, never splitting a code point
pub fn truncate_chars(text: &str, max: usize) -> String {
    match text.char_indices().nth(max) {
        Some((idx, _)) => text[..idx].to_string(),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_is_char_safe() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("short", 50), "short");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn test_completed_event_carries_preview() {
        let long = "x".repeat(250);
        match PipelineEvent::completed(Phase::Writing, &long) {
            PipelineEvent::StageCompleted { preview, .. } => {
                assert_eq!(preview.chars().count(), PREVIEW_CHARS)
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[test]
    fn test_activity_log_entries() {
        let log = ActivityLog::new();
        log.emit(&PipelineEvent::StageStarted {
            phase: Phase::Research,
            task: "Researching: Rust".into(),
        });
        log.emit(&PipelineEvent::ToolUsed {
            tool: "duckduckgo".into(),
            query: "Rust".into(),
        });
        log.emit(&PipelineEvent::completed(Phase::Research, &"y".repeat(80)));
        log.emit(&PipelineEvent::StageFailed {
            phase: Phase::Writing,
            error: "Writing error: boom".into(),
        });

        let entries = log.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].stage, "SEO Researcher");
        assert_eq!(entries[0].message, "Started: Researching: Rust");
        assert_eq!(entries[1].kind, ActivityKind::Complete);
        assert_eq!(entries[1].message, format!("Completed: {}...", "y".repeat(50)));
        assert_eq!(entries[2].kind, ActivityKind::Error);
        assert!(entries[2].to_string().contains("Content Writer: Error: Writing error: boom"));
        assert_eq!(log.events().len(), 4);
    }

    #[test]
    fn test_fanout_reaches_every_sink() {
        let a = Arc::new(ActivityLog::new());
        let b = Arc::new(ActivityLog::new());
        let fanout = FanoutSink::new().with(a.clone()).with(b.clone());

        fanout.emit(&PipelineEvent::StageStarted {
            phase: Phase::Review,
            task: "Reviewing content for: Rust".into(),
        });

        assert_eq!(a.entries().len(), 1);
        assert_eq!(b.entries().len(), 1);
    }
}
