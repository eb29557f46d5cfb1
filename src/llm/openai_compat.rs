//! Generic OpenAI-compatible completion provider
//!
//! Any API that accepts the OpenAI chat-completions body works here:
//! - Groq (default)
//! - OpenAI
//! - OpenRouter
//! - Ollama (`/v1` compatibility endpoint)
//!
//! SECURITY: Credentials are only sent to the configured endpoint.

use super::{CompletionRequest, CompletionResponse, LlmError, LlmProvider, TokenUsage};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ============================================================================
// Configuration Types
// ============================================================================

/// Authentication method for the API
#[derive(Debug, Clone)]
pub enum AuthMethod {
    /// Bearer token in Authorization header
    BearerToken(String),
    /// Local endpoints (Ollama) take no credential
    None,
}

/// Configuration for an OpenAI-compatible provider
#[derive(Debug, Clone)]
pub struct OpenAiCompatConfig {
    /// Provider name (e.g., "groq", "openrouter")
    pub name: String,
    /// Full chat-completions URL
    pub base_url: String,
    pub auth: AuthMethod,
    /// Model used when a request leaves `model` empty
    pub default_model: String,
    /// Extra headers sent with every request
    pub custom_headers: Vec<(String, String)>,
    pub timeout: Duration,
}

impl OpenAiCompatConfig {
    pub fn new(name: impl Into<String>, base_url: impl Into<String>, auth: AuthMethod) -> Self {
        Self {
            name: name.into(),
            base_url: base_url.into(),
            auth,
            default_model: String::new(),
            custom_headers: Vec::new(),
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.default_model = model.into();
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.custom_headers.push((name.into(), value.into()));
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

// ============================================================================
// Wire Types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(default)]
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    choices: Vec<ChatChoice>,
    #[serde(default)]
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    #[serde(default)]
    prompt_tokens: u32,
    #[serde(default)]
    completion_tokens: u32,
    #[serde(default)]
    total_tokens: u32,
}

// ============================================================================
// Provider
// ============================================================================

/// Generic OpenAI-compatible provider
pub struct OpenAiCompatProvider {
    client: reqwest::Client,
    config: OpenAiCompatConfig,
}

impl OpenAiCompatProvider {
    pub fn new(config: OpenAiCompatConfig) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Other(e.into()))?;
        Ok(Self { client, config })
    }

    fn build_body(&self, request: &CompletionRequest) -> ChatRequest {
        let model = if request.model.is_empty() {
            self.config.default_model.clone()
        } else {
            request.model.clone()
        };

        ChatRequest {
            model,
            messages: request
                .messages()
                .into_iter()
                .map(|m| ChatMessage {
                    role: m.role.as_str().to_string(),
                    content: Some(m.content),
                })
                .collect(),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        }
    }

    fn parse_response(
        body: ChatResponse,
        requested_model: &str,
    ) -> Result<CompletionResponse, LlmError> {
        let usage = body.usage.map(|u| TokenUsage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
            total_tokens: u.total_tokens,
        });

        let choice = body
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LlmError::InvalidResponse("No choices in response".to_string()))?;

        Ok(CompletionResponse {
            text: choice.message.content.unwrap_or_default(),
            model: body.model.unwrap_or_else(|| requested_model.to_string()),
            usage,
            finish_reason: choice.finish_reason,
        })
    }
}

#[async_trait]
impl LlmProvider for OpenAiCompatProvider {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn default_model(&self) -> &str {
        &self.config.default_model
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let body = self.build_body(request);

        tracing::debug!(
            provider = %self.config.name,
            model = %body.model,
            max_tokens = body.max_tokens,
            temperature = body.temperature,
            "Sending completion request"
        );

        let mut http = self.client.post(&self.config.base_url).json(&body);
        match &self.config.auth {
            AuthMethod::BearerToken(token) => http = http.bearer_auth(token),
            AuthMethod::None => {}
        }
        for (name, value) in &self.config.custom_headers {
            http = http.header(name, value);
        }

        let response = http.send().await.map_err(LlmError::from_network_error)?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!(provider = %self.config.name, %status, "Completion request rejected");
            return Err(LlmError::from_http_status(status, error_text));
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        let completion = Self::parse_response(parsed, &body.model)?;
        if let Some(usage) = &completion.usage {
            tracing::debug!(
                input_tokens = usage.input_tokens,
                output_tokens = usage.output_tokens,
                "Completion usage"
            );
        }
        Ok(completion)
    }
}
