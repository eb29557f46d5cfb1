//! Scripted provider - deterministic completions without a network
//!
//! Registered as provider "scripted". Replies are consumed from a queue in
//! call order; once the queue runs dry every call echoes the user prompt.
//! Every request is recorded so tests can assert what each stage sent.

use super::{CompletionRequest, CompletionResponse, LlmError, LlmProvider};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;

const SCRIPTED_MODEL: &str = "scripted-echo";

/// One queued reply
#[derive(Debug, Clone)]
pub enum ScriptedReply {
    Text(String),
    /// Fail the call as if the network dropped
    NetworkError(String),
    /// Fail the call as if the provider rejected the credential
    Unauthorized(String),
}

pub struct ScriptedProvider {
    replies: Mutex<VecDeque<ScriptedReply>>,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl Default for ScriptedProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_replies(replies: impl IntoIterator<Item = ScriptedReply>) -> Self {
        let provider = Self::new();
        for reply in replies {
            provider.push(reply);
        }
        provider
    }

    pub fn push(&self, reply: ScriptedReply) {
        if let Ok(mut queue) = self.replies.lock() {
            queue.push_back(reply);
        }
    }

    /// Requests received so far, in call order
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests
            .lock()
            .map(|r| r.clone())
            .unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or(0)
    }

    fn next_reply(&self) -> Option<ScriptedReply> {
        self.replies.lock().ok().and_then(|mut q| q.pop_front())
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    fn default_model(&self) -> &str {
        SCRIPTED_MODEL
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        if let Ok(mut log) = self.requests.lock() {
            log.push(request.clone());
        }

        let model = if request.model.is_empty() {
            SCRIPTED_MODEL
        } else {
            request.model.as_str()
        };

        match self.next_reply() {
            Some(ScriptedReply::Text(text)) => Ok(CompletionResponse::from_text(text, model)),
            Some(ScriptedReply::NetworkError(msg)) => Err(LlmError::Network(msg)),
            Some(ScriptedReply::Unauthorized(msg)) => Err(LlmError::Unauthorized(msg)),
            None => Ok(CompletionResponse::from_text(
                format!("Echo: {}", request.user_prompt),
                model,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_replies_in_order_then_echo() {
        let provider = ScriptedProvider::with_replies([
            ScriptedReply::Text("first".to_string()),
            ScriptedReply::NetworkError("connection reset".to_string()),
        ]);
        let req = CompletionRequest::new("sys", "hello");

        let first = provider.complete(&req).await.unwrap();
        assert_eq!(first.text, "first");

        let second = provider.complete(&req).await.unwrap_err();
        assert!(matches!(second, LlmError::Network(_)));

        let third = provider.complete(&req).await.unwrap();
        assert_eq!(third.text, "Echo: hello");
        assert_eq!(third.model, SCRIPTED_MODEL);

        assert_eq!(provider.call_count(), 3);
    }

    #[tokio::test]
    async fn test_records_requested_model() {
        let provider = ScriptedProvider::new();
        let req = CompletionRequest::new("sys", "u").with_model("gemma2-9b-it");

        let resp = provider.complete(&req).await.unwrap();
        assert_eq!(resp.model, "gemma2-9b-it");
        assert_eq!(provider.requests()[0].model, "gemma2-9b-it");
    }
}
