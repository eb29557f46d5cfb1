//! End-to-end pipeline behaviour with scripted providers

use std::sync::Arc;
use studio_cli::agent::{ResearchStage, StageStatus, NO_SEARCH_RESULTS};
use studio_cli::llm::{ScriptedProvider, ScriptedReply};
use studio_cli::orchestration::{
    ActivityKind, ActivityLog, NullSink, Phase, Pipeline, PipelineEvent, PipelineState, Topic,
};
use studio_cli::prompts::PromptSet;
use studio_cli::search::{ScriptedSearch, SearchResult};

fn three_hits(tag: &str) -> Vec<SearchResult> {
    (1..=3)
        .map(|i| {
            SearchResult::new(
                format!("{tag} result {i}"),
                format!("https://example.com/{tag}/{i}"),
                format!("{tag} snippet {i}"),
            )
        })
        .collect()
}

fn pipeline(
    llm: Arc<ScriptedProvider>,
    search: ScriptedSearch,
    log: Arc<ActivityLog>,
) -> Pipeline {
    Pipeline::new(llm, Arc::new(search), PromptSet::builtin(), log)
}

#[tokio::test]
async fn test_research_status_and_error_text() {
    let prompts = PromptSet::builtin();
    let search = ScriptedSearch::new();

    let ok = ScriptedProvider::with_replies([ScriptedReply::Text("findings".into())]);
    let findings = ResearchStage::new(&ok, &search, &prompts, &NullSink, "m")
        .research("Quantum computing")
        .await;
    assert_eq!(findings.status, StageStatus::Success);

    let failing = ScriptedProvider::with_replies([ScriptedReply::NetworkError(String::new())]);
    let findings = ResearchStage::new(&failing, &search, &prompts, &NullSink, "m")
        .research("Quantum computing")
        .await;
    assert_eq!(findings.status, StageStatus::Error);
    assert!(!findings.structured_text.is_empty());
}

#[tokio::test]
async fn test_all_sentinels_give_no_search_results_block() {
    let prompts = PromptSet::builtin();
    let llm = ScriptedProvider::with_replies([ScriptedReply::Text("findings".into())]);
    let search = ScriptedSearch::failing("connection refused");

    let findings = ResearchStage::new(&llm, &search, &prompts, &NullSink, "m")
        .research("Rust")
        .await;

    assert_eq!(findings.raw_search_data.as_deref(), Some(NO_SEARCH_RESULTS));
    assert_eq!(search.queries().len(), 3);
}

#[tokio::test]
async fn test_writing_failure_short_circuits_review() {
    let llm = Arc::new(ScriptedProvider::with_replies([
        ScriptedReply::Text("findings".into()),
        ScriptedReply::NetworkError("connection reset by peer".into()),
    ]));
    let log = Arc::new(ActivityLog::new());

    let result = pipeline(llm.clone(), ScriptedSearch::new(), log.clone())
        .run(&Topic::new("Rust").unwrap(), "m")
        .await;

    assert_eq!(result.state, PipelineState::Aborted(Phase::Writing));
    let failure = result.failure.as_ref().unwrap();
    assert_eq!(failure.phase, Phase::Writing);
    assert!(failure.message.contains("connection reset by peer"));
    assert!(result.draft.is_none());
    assert!(result.review.is_none());
    assert!(result.final_content().is_none());
    assert_eq!(llm.call_count(), 2);

    let review_started = log.events().iter().any(|e| {
        matches!(
            e,
            PipelineEvent::StageStarted {
                phase: Phase::Review,
                ..
            }
        )
    });
    assert!(!review_started);
}

#[tokio::test]
async fn test_remote_work_end_to_end() {
    let topic = "Remote Work Productivity";
    let search = ScriptedSearch::new()
        .with_query(topic, three_hits("base"))
        .with_query(
            format!("{topic} latest trends 2024 2025"),
            three_hits("trends"),
        )
        .with_query(
            format!("{topic} statistics facts benefits"),
            three_hits("stats"),
        );

    let draft = "# Remote Work Productivity\n\nWorking from home works.";
    let llm = Arc::new(ScriptedProvider::with_replies([
        ScriptedReply::Text("## Top Keywords\n- remote work".into()),
        ScriptedReply::Text(draft.into()),
        ScriptedReply::Text(
            "### REVIEW REPORT\n- tightened the intro\n\n### FINAL CONTENT\n\
             # Remote Work Productivity\n\nWorking from home works well."
                .into(),
        ),
    ]));
    let log = Arc::new(ActivityLog::new());

    let result = pipeline(llm.clone(), search, log.clone())
        .run(&Topic::new(topic).unwrap(), "llama-3.3-70b-versatile")
        .await;

    assert_eq!(result.state, PipelineState::Done);
    assert!(result.failure.is_none());

    let final_content = result.final_content().unwrap();
    assert!(!final_content.is_empty());
    assert_ne!(final_content, draft);
    assert_eq!(
        result.review.as_ref().unwrap().review_report,
        "- tightened the intro"
    );

    let raw = result.research.as_ref().unwrap().raw_search_data.as_deref().unwrap();
    assert_eq!(raw.matches("=== Search:").count(), 3);
    assert!(raw.contains("Source: https://example.com/stats/3"));

    let requests = llm.requests();
    assert_eq!(requests.len(), 3);
    assert!(requests.iter().all(|r| r.model == "llama-3.3-70b-versatile"));
    assert!(requests[1].user_prompt.contains("- remote work"));
    assert!(requests[2].user_prompt.contains(draft));

    let kinds: Vec<ActivityKind> = log.entries().iter().map(|e| e.kind).collect();
    assert_eq!(
        kinds,
        vec![
            ActivityKind::Start,
            ActivityKind::Complete,
            ActivityKind::Start,
            ActivityKind::Complete,
            ActivityKind::Start,
            ActivityKind::Complete
        ]
    );
}

#[tokio::test]
async fn test_writing_transport_error_keeps_research() {
    let llm = Arc::new(ScriptedProvider::with_replies([
        ScriptedReply::Text("## Findings".into()),
        ScriptedReply::Unauthorized("invalid api key".into()),
    ]));

    let result = pipeline(llm.clone(), ScriptedSearch::new(), Arc::new(ActivityLog::new()))
        .run(&Topic::new("Climate Change Solutions").unwrap(), "m")
        .await;

    assert_eq!(result.state, PipelineState::Aborted(Phase::Writing));
    let research = result.research.as_ref().unwrap();
    assert_eq!(research.status, StageStatus::Success);
    assert_eq!(research.structured_text, "## Findings");
    assert!(result.review.is_none());
    assert_eq!(llm.call_count(), 2);
}

#[tokio::test]
async fn test_runs_do_not_share_state() {
    let llm = Arc::new(ScriptedProvider::new());
    let p = pipeline(llm, ScriptedSearch::new(), Arc::new(ActivityLog::new()));

    let first = p.run(&Topic::new("AI in Healthcare").unwrap(), "").await;
    let second = p.run(&Topic::new("SEO Best Practices 2025").unwrap(), "").await;

    assert!(first.is_done() && second.is_done());
    assert_ne!(first.run_id, second.run_id);
    assert_eq!(second.topic.as_str(), "SEO Best Practices 2025");
    assert!(!second
        .research
        .as_ref()
        .unwrap()
        .structured_text
        .contains("AI in Healthcare"));
}
