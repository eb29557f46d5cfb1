//! CLI front end for the content pipeline

use crate::config::Config;
use crate::export::{self, ExportFormat};
use crate::llm::{self, ProviderPreset, DEFAULT_MODEL, KNOWN_MODELS};
use crate::orchestration::{
    ActivityLog, EventSink, FanoutSink, Phase, Pipeline, PipelineEvent, PipelineResult,
    PipelineState, Topic, TracingSink,
};
use crate::prompts::PromptSet;
use crate::search::{DuckDuckGoSearch, ScriptedSearch, SearchProvider};
use anyhow::{Context, Result};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tabled::{settings::Style, Table, Tabled};

/// Topics offered by `studio examples`
pub const EXAMPLE_TOPICS: [&str; 4] = [
    "AI in Healthcare",
    "SEO Best Practices 2025",
    "Remote Work Productivity",
    "Climate Change Solutions",
];

/// Options for `studio generate`
#[derive(Debug, Clone, Default)]
pub struct GenerateOptions {
    pub topic: String,
    pub model: Option<String>,
    pub provider: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub format: Option<String>,
    pub no_save: bool,
    pub show_log: bool,
    pub json: bool,
}

/// Parse `--format`: `md`, `txt` or `both`
pub fn parse_formats(value: &str) -> Result<Vec<ExportFormat>> {
    match value.trim().to_lowercase().as_str() {
        "md" | "markdown" => Ok(vec![ExportFormat::Markdown]),
        "txt" | "text" => Ok(vec![ExportFormat::PlainText]),
        "both" | "all" => Ok(vec![ExportFormat::Markdown, ExportFormat::PlainText]),
        other => anyhow::bail!("Unknown format '{}'. Use md, txt or both", other),
    }
}

fn progress_line(phase: Phase) -> String {
    let action = match phase {
        Phase::Research => "Researching topic...",
        Phase::Writing => "Writing content...",
        Phase::Review => "Reviewing and polishing...",
    };
    format!("Phase {}/{}: {action}", phase.number(), Phase::ALL.len())
}

/// Prints phase progress to stdout as the pipeline advances
struct ConsoleProgress;

impl EventSink for ConsoleProgress {
    fn emit(&self, event: &PipelineEvent) {
        let PipelineEvent::StateChanged { to, .. } = event else {
            return;
        };
        match to {
            PipelineState::Researching => println!("{}", progress_line(Phase::Research).cyan()),
            PipelineState::Writing => println!("{}", progress_line(Phase::Writing).cyan()),
            PipelineState::Reviewing => println!("{}", progress_line(Phase::Review).cyan()),
            PipelineState::Done => println!("{}", "All phases completed successfully!".green()),
            PipelineState::Idle | PipelineState::Aborted(_) => {}
        }
    }
}

/// Research, write and review an article for one topic
pub async fn run_generate(mut config: Config, opts: GenerateOptions) -> Result<()> {
    let topic = Topic::new(opts.topic.as_str())?;

    if let Some(provider) = opts.provider {
        config.llm.provider = provider;
    }
    if let Some(model) = opts.model {
        config.llm.model = model;
    }
    if let Some(dir) = opts.output_dir {
        config.output.dir = dir;
    }
    if let Some(format) = opts.format.as_deref() {
        config.output.formats = parse_formats(format)?;
    }

    let llm = llm::create_provider(&config)?;
    let search: Arc<dyn SearchProvider> =
        if ProviderPreset::from_name(&config.llm.provider) == Some(ProviderPreset::Scripted) {
            // offline runs stay offline
            Arc::new(ScriptedSearch::new())
        } else {
            Arc::new(DuckDuckGoSearch::from_config(&config.search)?)
        };
    let prompts = PromptSet::load(config.prompts.dir.as_deref())?;

    let activity = Arc::new(ActivityLog::new());
    let mut sink = FanoutSink::new()
        .with(Arc::new(TracingSink))
        .with(activity.clone());
    if !opts.json {
        sink = sink.with(Arc::new(ConsoleProgress));
        println!(
            "{} {} ({})",
            "Generating:".bold(),
            topic,
            config.llm.model.dimmed()
        );
    }

    let pipeline = Pipeline::new(llm, search, prompts, Arc::new(sink));
    let result = pipeline.run(&topic, &config.llm.model).await;

    if opts.json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        render_result(&result);
    }

    if opts.show_log {
        print_activity(&activity);
    }

    if let Some(failure) = &result.failure {
        anyhow::bail!("{} failed: {}", failure.phase.label(), failure.message);
    }

    let review_ok = result.review.as_ref().is_some_and(|r| r.status.is_success());
    if !review_ok {
        eprintln!("{}", "Review phase failed. Please try again.".red());
        return Ok(());
    }

    if !opts.no_save {
        if let Some(content) = result.final_content() {
            let paths = export::write_artifacts(
                &config.output.dir,
                topic.as_str(),
                content,
                &config.output.formats,
            )?;
            for path in paths {
                println!("{} {}", "Saved".green(), path.display());
            }
        }
    }

    Ok(())
}

fn section(title: &str, body: &str) {
    println!("\n{}", format!("=== {title} ===").bold().cyan());
    println!("{}", body.trim_end());
}

fn render_result(result: &PipelineResult) {
    if let Some(research) = &result.research {
        section("Research Findings", &research.structured_text);
    }
    if let Some(draft) = &result.draft {
        section("Content Draft", &draft.text);
    }
    if let Some(review) = &result.review {
        if review.status.is_success() {
            section("Review Report", &review.review_report);
        }
    }
    if let Some(content) = result.final_content() {
        section("Final Content", content);
    }
    println!();
}

fn print_activity(log: &ActivityLog) {
    println!("{}", "=== Activity Log ===".bold().cyan());
    for entry in log.entries() {
        println!("{entry}");
    }
}

/// List the known models, marking the default and the configured one
pub fn run_models(config: &Config) -> Result<()> {
    #[derive(Tabled)]
    struct ModelRow {
        #[tabled(rename = "Model")]
        model: String,
        #[tabled(rename = "Description")]
        description: String,
        #[tabled(rename = "Notes")]
        marker: String,
    }

    let rows: Vec<ModelRow> = KNOWN_MODELS
        .iter()
        .map(|(model, description)| {
            let mut marks = Vec::new();
            if *model == DEFAULT_MODEL {
                marks.push("default");
            }
            if *model == config.llm.model {
                marks.push("configured");
            }
            ModelRow {
                model: model.to_string(),
                description: description.to_string(),
                marker: marks.join(", "),
            }
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");
    println!("Provider: {}  Model: {}", config.llm.provider, config.llm.model);
    Ok(())
}

/// Print the example topics
pub fn run_examples() -> Result<()> {
    println!("{}", "Example topics:".bold());
    for topic in EXAMPLE_TOPICS {
        println!("  {topic}");
    }
    println!("\nTry: studio generate \"{}\"", EXAMPLE_TOPICS[0]);
    Ok(())
}

/// Outcome of one environment check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub name: &'static str,
    pub passed: bool,
    /// Failure blocks `generate`
    pub critical: bool,
    pub detail: String,
}

impl CheckResult {
    fn pass(name: &'static str, detail: impl Into<String>) -> Self {
        Self {
            name,
            passed: true,
            critical: false,
            detail: detail.into(),
        }
    }

    fn status_label(&self) -> &'static str {
        match (self.passed, self.critical) {
            (true, _) => "ok",
            (false, true) => "FAIL",
            (false, false) => "warn",
        }
    }

    fn fail(name: &'static str, critical: bool, detail: impl Into<String>) -> Self {
        Self {
            name,
            passed: false,
            critical,
            detail: detail.into(),
        }
    }
}

/// Run every check against `config_path`, reading variables through `env`
pub fn collect_checks<F>(config_path: &Path, env: F) -> Vec<CheckResult>
where
    F: Fn(&str) -> Option<String>,
{
    let mut checks = Vec::new();

    let config = if !config_path.exists() {
        checks.push(CheckResult::pass(
            "Config file",
            format!("{} not found, using defaults", config_path.display()),
        ));
        Some(Config::default())
    } else {
        match std::fs::read_to_string(config_path)
            .map_err(anyhow::Error::from)
            .and_then(|c| toml::from_str::<Config>(&c).map_err(anyhow::Error::from))
        {
            Ok(config) => {
                checks.push(CheckResult::pass(
                    "Config file",
                    config_path.display().to_string(),
                ));
                Some(config)
            }
            Err(e) => {
                checks.push(CheckResult::fail("Config file", true, format!("{e}")));
                None
            }
        }
    };
    let Some(mut config) = config else {
        return checks;
    };
    config.apply_env_overrides(&env);

    let Some(preset) = ProviderPreset::from_name(&config.llm.provider) else {
        checks.push(CheckResult::fail(
            "Provider",
            true,
            format!("unknown provider '{}'", config.llm.provider),
        ));
        return checks;
    };
    checks.push(CheckResult::pass(
        "Provider",
        format!("{} ({})", preset.name(), config.llm.model),
    ));

    let key_var = config
        .llm
        .api_key_env
        .clone()
        .or_else(|| preset.api_key_env().map(str::to_string));
    checks.push(match key_var {
        None => CheckResult::pass("API key", "not required"),
        Some(var) => match env(&var) {
            Some(value) if !llm::is_placeholder_key(&value) => {
                CheckResult::pass("API key", format!("{var} is set"))
            }
            Some(_) => CheckResult::fail(
                "API key",
                true,
                format!("{var} still holds the placeholder value"),
            ),
            None => CheckResult::fail("API key", true, format!("{var} is not set")),
        },
    });

    if let Some(dir) = &config.prompts.dir {
        checks.push(if dir.is_dir() {
            CheckResult::pass("Prompt overrides", dir.display().to_string())
        } else {
            CheckResult::fail(
                "Prompt overrides",
                false,
                format!("{} is not a directory", dir.display()),
            )
        });
    }

    checks.push(match probe_writable(&config.output.dir) {
        Ok(()) => CheckResult::pass("Output directory", config.output.dir.display().to_string()),
        Err(e) => CheckResult::fail("Output directory", true, format!("{e:#}")),
    });

    checks
}

fn probe_writable(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("cannot create {}", dir.display()))?;
    let probe = dir.join(format!(".studio-probe-{}", uuid::Uuid::new_v4()));
    std::fs::write(&probe, b"")
        .with_context(|| format!("cannot write to {}", dir.display()))?;
    std::fs::remove_file(&probe).ok();
    Ok(())
}

/// Check configuration, credentials and output location
pub fn run_check(config_path: &Path, init: bool) -> Result<()> {
    if init && !config_path.exists() {
        Config::default().save_to(config_path)?;
        println!("{} {}", "Wrote default config to".green(), config_path.display());
    }

    let checks = collect_checks(config_path, |name| std::env::var(name).ok());

    #[derive(Tabled)]
    struct CheckRow {
        #[tabled(rename = "Check")]
        name: String,
        #[tabled(rename = "Status")]
        status: String,
        #[tabled(rename = "Detail")]
        detail: String,
    }

    let rows: Vec<CheckRow> = checks
        .iter()
        .map(|c| CheckRow {
            name: c.name.to_string(),
            status: c.status_label().to_string(),
            detail: c.detail.clone(),
        })
        .collect();

    let mut table = Table::new(rows);
    table.with(Style::rounded());
    println!("{table}");

    let blocking = checks.iter().filter(|c| !c.passed && c.critical).count();
    if blocking == 0 {
        println!("{}", "PASS: ready to generate content".green().bold());
        Ok(())
    } else {
        println!(
            "{}",
            format!("ATTENTION: {blocking} check(s) need fixing").yellow().bold()
        );
        anyhow::bail!("Environment check failed")
    }
}
