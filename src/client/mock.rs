//! Scripted generator for tests and offline runs.
//!
//! Replies are queued per prompt so concurrent triggers stay deterministic
//! regardless of which task reaches the generator first. A reply may carry a
//! gate; the call then parks until the gate is notified.

use super::ImageGenerator;
use crate::{
    error::{GenerationError, Result},
    models::{GenerationRequest, GenerationResult, ImageEnvelope},
};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

#[derive(Debug, Clone)]
pub enum MockOutcome {
    /// Behaves like a 2xx envelope `{"message": url}`.
    Url(String),
    Status(u16),
    /// Raw 2xx body run through the envelope parser.
    Body(String),
    TransportError(String),
}

#[derive(Debug, Clone)]
struct MockReply {
    outcome: MockOutcome,
    gate: Option<Arc<Notify>>,
}

#[derive(Debug, Default)]
struct Script {
    replies: HashMap<String, VecDeque<MockReply>>,
    fallback: Option<MockOutcome>,
    calls: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct MockImageClient {
    script: Arc<Mutex<Script>>,
}

impl MockImageClient {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every unscripted prompt yields `{prompt-slug}.png` under `base_url`.
    pub fn echo(base_url: impl Into<String>) -> Self {
        let client = Self::new();
        client.lock().fallback = Some(MockOutcome::Url(base_url.into()));
        client
    }

    pub fn on_prompt(self, prompt: impl Into<String>, outcome: MockOutcome) -> Self {
        self.push(prompt.into(), outcome, None);
        self
    }

    pub fn on_prompt_gated(
        self,
        prompt: impl Into<String>,
        outcome: MockOutcome,
        gate: Arc<Notify>,
    ) -> Self {
        self.push(prompt.into(), outcome, Some(gate));
        self
    }

    /// Prompts received so far, in call order.
    pub fn calls(&self) -> Vec<String> {
        self.lock().calls.clone()
    }

    pub fn call_count(&self) -> usize {
        self.lock().calls.len()
    }

    fn push(&self, prompt: String, outcome: MockOutcome, gate: Option<Arc<Notify>>) {
        self.lock()
            .replies
            .entry(prompt)
            .or_default()
            .push_back(MockReply { outcome, gate });
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Script> {
        self.script.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn next_reply(&self, prompt: &str) -> Option<MockReply> {
        let mut script = self.lock();
        script.calls.push(prompt.to_string());

        if let Some(reply) = script.replies.get_mut(prompt).and_then(VecDeque::pop_front) {
            return Some(reply);
        }

        script.fallback.clone().map(|base| {
            let outcome = match base {
                MockOutcome::Url(base_url) => {
                    MockOutcome::Url(format!("{}/{}.png", base_url.trim_end_matches('/'), slug(prompt)))
                }
                other => other,
            };
            MockReply {
                outcome,
                gate: None,
            }
        })
    }
}

#[async_trait]
impl ImageGenerator for MockImageClient {
    async fn generate(&self, request: &GenerationRequest) -> Result<GenerationResult> {
        let reply = self.next_reply(&request.prompt).ok_or_else(|| {
            GenerationError::TransportError(format!("no scripted reply for `{}`", request.prompt))
        })?;

        if let Some(gate) = reply.gate {
            gate.notified().await;
        }

        let image_url = match reply.outcome {
            MockOutcome::Url(url) => ImageEnvelope { message: Some(url) }.into_image_url()?,
            MockOutcome::Body(body) => ImageEnvelope::from_body(&body)?.into_image_url()?,
            MockOutcome::Status(status) => {
                return Err(GenerationError::ResponseStatusError {
                    status,
                    body: String::new(),
                })
            }
            MockOutcome::TransportError(reason) => {
                return Err(GenerationError::TransportError(reason))
            }
        };

        Ok(GenerationResult::new(image_url, request.prompt.clone()))
    }
}

fn slug(prompt: &str) -> String {
    let slug: String = prompt
        .trim()
        .chars()
        .map(|c| if c.is_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect();
    slug.trim_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FailureKind;

    #[tokio::test]
    async fn test_scripted_replies_are_consumed_in_order() {
        let client = MockImageClient::new()
            .on_prompt("cat", MockOutcome::Url("https://x/1.png".into()))
            .on_prompt("cat", MockOutcome::Status(500));

        let first = client.generate(&GenerationRequest::new("cat")).await.unwrap();
        assert_eq!(first.image_url(), "https://x/1.png");

        let second = client.generate(&GenerationRequest::new("cat")).await.unwrap_err();
        assert_eq!(second.kind(), FailureKind::ResponseStatus);

        let third = client.generate(&GenerationRequest::new("cat")).await.unwrap_err();
        assert_eq!(third.kind(), FailureKind::Transport);
        assert_eq!(client.call_count(), 3);
    }

    #[tokio::test]
    async fn test_echo_fallback_builds_urls_from_prompt() {
        let client = MockImageClient::echo("https://cdn/");
        let result = client
            .generate(&GenerationRequest::new("A red bicycle!"))
            .await
            .unwrap();
        assert_eq!(result.image_url(), "https://cdn/a-red-bicycle.png");
        assert_eq!(client.calls(), vec!["A red bicycle!".to_string()]);
    }

    #[tokio::test]
    async fn test_body_outcome_goes_through_envelope_parser() {
        let client = MockImageClient::new().on_prompt("cat", MockOutcome::Body("{}".into()));
        let err = client.generate(&GenerationRequest::new("cat")).await.unwrap_err();
        assert_eq!(err.kind(), FailureKind::MalformedResponse);
    }
}
