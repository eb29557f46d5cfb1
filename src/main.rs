use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use studio_cli::transport::cli::{self, GenerateOptions};
use studio_cli::Config;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "studio")]
#[command(
    author,
    version,
    long_version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("STUDIO_GIT_HASH"), ")"),
    about = "Studio - research, write and review SEO articles with LLMs",
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Config file (default: platform config dir, studio/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Research, write and review an article for a topic
    Generate {
        /// Topic to write about
        topic: String,

        /// Model to use (e.g., llama-3.3-70b-versatile, gemma2-9b-it)
        #[arg(short, long)]
        model: Option<String>,

        /// LLM provider (groq, openai, openrouter, ollama, scripted)
        #[arg(short, long)]
        provider: Option<String>,

        /// Directory for the exported article
        #[arg(short, long)]
        output_dir: Option<PathBuf>,

        /// Export format (md, txt, both)
        #[arg(short, long)]
        format: Option<String>,

        /// Do not write article files
        #[arg(long)]
        no_save: bool,

        /// Print the stage activity log after the run
        #[arg(long)]
        show_log: bool,

        /// Print the full result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List known models
    Models,

    /// Check configuration, API key and output directory
    Check {
        /// Write a default config file if none exists
        #[arg(long)]
        init: bool,
    },

    /// Show example topics
    Examples,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Credentials and DEFAULT_MODEL may live in .env
    let dotenv = dotenvy::dotenv();

    // Initialize logging
    let filter = if cli.verbose {
        "studio_cli=debug"
    } else {
        "studio_cli=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if let Ok(path) = dotenv {
        tracing::debug!("Loaded environment from {}", path.display());
    }

    let config_path = match cli.config {
        Some(path) => path,
        None => Config::config_path()?,
    };

    match cli.command {
        Commands::Generate {
            topic,
            model,
            provider,
            output_dir,
            format,
            no_save,
            show_log,
            json,
        } => {
            let config = Config::load_from(&config_path)?;
            let opts = GenerateOptions {
                topic,
                model,
                provider,
                output_dir,
                format,
                no_save,
                show_log,
                json,
            };
            cli::run_generate(config, opts).await?;
        }
        Commands::Models => {
            let config = Config::load_from(&config_path)?;
            cli::run_models(&config)?;
        }
        Commands::Check { init } => {
            cli::run_check(&config_path, init)?;
        }
        Commands::Examples => {
            cli::run_examples()?;
        }
    }

    Ok(())
}
