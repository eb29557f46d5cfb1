//! Completion provider boundary
//!
//! The stages only see [`LlmProvider`]: one system + user prompt in, generated
//! text out. Concrete providers are OpenAI-compatible HTTP endpoints chosen by
//! [`ProviderPreset`], plus [`ScriptedProvider`] for offline runs and tests.

use crate::config::Config;

mod error;
mod openai_compat;
mod scripted;
mod types;

pub use error::LlmError;
pub use openai_compat::{AuthMethod, OpenAiCompatConfig, OpenAiCompatProvider};
pub use scripted::{ScriptedProvider, ScriptedReply};
pub use types::*;

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Model used when neither config nor CLI picks one
pub const DEFAULT_MODEL: &str = "llama-3.3-70b-versatile";

/// Models offered by the default (Groq) provider
pub const KNOWN_MODELS: &[(&str, &str)] = &[
    ("llama-3.3-70b-versatile", "Llama 3.3 70B, best quality"),
    ("llama-3.1-8b-instant", "Llama 3.1 8B, fastest"),
    ("mixtral-8x7b-32768", "Mixtral 8x7B, 32k context"),
    ("gemma2-9b-it", "Gemma 2 9B instruct"),
];

/// Trait for completion providers
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Get the provider name
    fn name(&self) -> &str;

    /// Model used when a request leaves `model` empty
    fn default_model(&self) -> &str;

    /// Run one blocking (awaited) completion
    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError>;
}

/// Built-in endpoint presets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderPreset {
    Groq,
    OpenAi,
    OpenRouter,
    Ollama,
    Scripted,
}

impl ProviderPreset {
    pub const ALL: [ProviderPreset; 5] = [
        ProviderPreset::Groq,
        ProviderPreset::OpenAi,
        ProviderPreset::OpenRouter,
        ProviderPreset::Ollama,
        ProviderPreset::Scripted,
    ];

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "groq" => Some(Self::Groq),
            "openai" | "gpt" => Some(Self::OpenAi),
            "openrouter" => Some(Self::OpenRouter),
            "ollama" | "local" => Some(Self::Ollama),
            "scripted" | "sim" | "test" => Some(Self::Scripted),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Groq => "groq",
            Self::OpenAi => "openai",
            Self::OpenRouter => "openrouter",
            Self::Ollama => "ollama",
            Self::Scripted => "scripted",
        }
    }

    pub fn endpoint(&self) -> &'static str {
        match self {
            Self::Groq => "https://api.groq.com/openai/v1/chat/completions",
            Self::OpenAi => "https://api.openai.com/v1/chat/completions",
            Self::OpenRouter => "https://openrouter.ai/api/v1/chat/completions",
            Self::Ollama => "http://localhost:11434/v1/chat/completions",
            Self::Scripted => "",
        }
    }

    /// Environment variable holding the credential, if one is needed
    pub fn api_key_env(&self) -> Option<&'static str> {
        match self {
            Self::Groq => Some("GROQ_API_KEY"),
            Self::OpenAi => Some("OPENAI_API_KEY"),
            Self::OpenRouter => Some("OPENROUTER_API_KEY"),
            Self::Ollama | Self::Scripted => None,
        }
    }

    fn supported_names() -> String {
        Self::ALL
            .iter()
            .map(|p| p.name())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// Placeholder values shipped in sample `.env` files count as unset
pub fn is_placeholder_key(value: &str) -> bool {
    let value = value.trim();
    value.is_empty() || value.starts_with("your_") || value == "your_groq_api_key_here"
}

/// Look up a credential from the environment, ignoring placeholders
pub fn read_api_key(var: &str) -> Option<String> {
    std::env::var(var).ok().filter(|v| !is_placeholder_key(v))
}

/// Create the completion provider named in the config
pub fn create_provider(config: &Config) -> anyhow::Result<Arc<dyn LlmProvider>> {
    let llm = &config.llm;
    let preset = ProviderPreset::from_name(&llm.provider).ok_or_else(|| {
        anyhow::anyhow!(
            "Unknown LLM provider: {}. Supported: {}",
            llm.provider,
            ProviderPreset::supported_names()
        )
    })?;

    if preset == ProviderPreset::Scripted {
        tracing::info!("Using scripted provider (no network)");
        return Ok(Arc::new(ScriptedProvider::new()));
    }

    let key_var = llm
        .api_key_env
        .clone()
        .or_else(|| preset.api_key_env().map(str::to_string));

    let auth = match key_var {
        Some(var) => match read_api_key(&var) {
            Some(key) => AuthMethod::BearerToken(key),
            None => return Err(LlmError::MissingCredential(var).into()),
        },
        None => AuthMethod::None,
    };

    let endpoint = llm
        .base_url
        .clone()
        .unwrap_or_else(|| preset.endpoint().to_string());

    let mut compat = OpenAiCompatConfig::new(preset.name(), endpoint, auth)
        .with_model(llm.model.clone())
        .with_timeout(Duration::from_secs(llm.timeout_secs));
    if preset == ProviderPreset::OpenRouter {
        compat = compat.with_header("X-Title", "Content Studio");
    }

    tracing::info!(provider = preset.name(), model = %llm.model, "Using completion provider");
    Ok(Arc::new(OpenAiCompatProvider::new(compat)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preset_lookup() {
        assert_eq!(ProviderPreset::from_name("GROQ"), Some(ProviderPreset::Groq));
        assert_eq!(ProviderPreset::from_name("local"), Some(ProviderPreset::Ollama));
        assert_eq!(ProviderPreset::from_name("claude"), None);
        assert_eq!(ProviderPreset::Groq.api_key_env(), Some("GROQ_API_KEY"));
        assert_eq!(ProviderPreset::Ollama.api_key_env(), None);
    }

    #[test]
    fn test_placeholder_keys() {
        assert!(is_placeholder_key("your_groq_api_key_here"));
        assert!(is_placeholder_key("your_key"));
        assert!(is_placeholder_key("   "));
        assert!(!is_placeholder_key("gsk_live_123"));
    }

    #[test]
    fn test_unknown_provider_lists_supported() {
        let mut config = Config::default();
        config.llm.provider = "anthropic".to_string();

        let err = create_provider(&config).err().unwrap();
        let msg = err.to_string();
        assert!(msg.contains("Unknown LLM provider: anthropic"));
        assert!(msg.contains("groq"));
    }

    #[test]
    fn test_scripted_needs_no_key() {
        let mut config = Config::default();
        config.llm.provider = "scripted".to_string();

        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.name(), "scripted");
    }

    #[test]
    fn test_missing_credential() {
        let mut config = Config::default();
        config.llm.api_key_env = Some("STUDIO_TEST_KEY_THAT_IS_NEVER_SET".to_string());

        let err = create_provider(&config).err().unwrap();
        assert!(err.to_string().contains("STUDIO_TEST_KEY_THAT_IS_NEVER_SET"));
    }

    #[test]
    fn test_ollama_needs_no_key() {
        let mut config = Config::default();
        config.llm.provider = "ollama".to_string();
        config.llm.model = "llama3".to_string();

        let provider = create_provider(&config).unwrap();
        assert_eq!(provider.name(), "ollama");
        assert_eq!(provider.default_model(), "llama3");
    }
}
