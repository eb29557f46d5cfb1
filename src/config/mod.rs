//! Configuration management for studio

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::export::ExportFormat;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub llm: LlmConfig,
    pub search: SearchConfig,
    pub prompts: PromptsConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// groq, openai, openrouter, ollama or scripted
    pub provider: String,
    pub model: String,
    /// Read the credential from this variable instead of the preset's
    pub api_key_env: Option<String>,
    /// Override the preset's chat-completions URL
    pub base_url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "groq".to_string(),
            model: crate::llm::DEFAULT_MODEL.to_string(),
            api_key_env: None,
            base_url: None,
            timeout_secs: 120,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub max_results: usize,
    pub timeout_secs: u64,
    /// DuckDuckGo region code (kl parameter)
    pub region: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_results: 5,
            timeout_secs: 15,
            region: "wt-wt".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PromptsConfig {
    /// Directory with `<template>.md` overrides
    pub dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub formats: Vec<ExportFormat>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            formats: vec![ExportFormat::Markdown, ExportFormat::PlainText],
        }
    }
}

impl Config {
    /// Load configuration from default location or create default
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit file; a missing file yields defaults
    pub fn load_from(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            let config: Config = toml::from_str(&content)
                .with_context(|| format!("Failed to parse config {}", path.display()))?;
            tracing::debug!("Loaded config from {}", path.display());
            config
        } else {
            Config::default()
        };

        config.apply_env_overrides(|name| std::env::var(name).ok());
        Ok(config)
    }

    /// Apply `DEFAULT_MODEL`, `MAX_SEARCH_RESULTS` and `STUDIO_PROVIDER`
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(model) = lookup("DEFAULT_MODEL").filter(|m| !m.trim().is_empty()) {
            self.llm.model = model.trim().to_string();
        }

        if let Some(provider) = lookup("STUDIO_PROVIDER").filter(|p| !p.trim().is_empty()) {
            self.llm.provider = provider.trim().to_string();
        }

        if let Some(raw) = lookup("MAX_SEARCH_RESULTS") {
            match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => self.search.max_results = n,
                _ => tracing::warn!(
                    "Ignoring MAX_SEARCH_RESULTS={:?}: expected a positive integer",
                    raw
                ),
            }
        }
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        if let Some(proj_dirs) = directories::ProjectDirs::from("", "", "studio") {
            Ok(proj_dirs.config_dir().join("config.toml"))
        } else {
            Ok(PathBuf::from("config.toml"))
        }
    }

    /// Save configuration to the given path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}
