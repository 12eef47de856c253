use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::models::journal_entry::EntryAnalysis;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum PromptType {
    #[serde(rename = "greeting")]
    Greeting,
    #[default]
    #[serde(rename = "check-in")]
    CheckIn,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PromptRequest {
    /// Free-form mood label, e.g. "Anxious" or "neutral".
    pub mood: String,
    pub recent_thoughts: Option<String>,
    pub prompt_type: PromptType,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct GeneratedPrompt {
    pub prompt: String,
}

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("text generation is not configured")]
    NotConfigured,

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model API error {status}: {body}")]
    Api { status: u16, body: String },

    #[error("malformed model output: {0}")]
    Malformed(String),
}

/// Generative-text collaborator. Every failure is recoverable; callers
/// fall back to a local default.
#[async_trait]
pub trait ReflectionModel: Send + Sync {
    async fn generate_prompt(&self, request: &PromptRequest) -> Result<GeneratedPrompt, AiError>;

    async fn analyze_entry(&self, entry_text: &str) -> Result<EntryAnalysis, AiError>;
}

const MESSAGES_URL: &str = "https://api.anthropic.com/v1/messages";

pub struct ClaudeClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl ClaudeClient {
    pub fn new(api_key: String, model: String, timeout: Duration) -> Result<Self, AiError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            api_key,
            model,
        })
    }

    /// Sends one user message and returns the first text block of the reply.
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String, AiError> {
        if self.api_key.is_empty() {
            return Err(AiError::NotConfigured);
        }

        let response = self
            .http
            .post(MESSAGES_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("content-type", "application/json")
            .json(&serde_json::json!({
                "model": self.model,
                "max_tokens": max_tokens,
                "messages": [{
                    "role": "user",
                    "content": prompt
                }]
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(AiError::Api { status, body });
        }

        let reply: serde_json::Value = response.json().await?;
        reply["content"][0]["text"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| AiError::Malformed("reply has no text content".into()))
    }
}

#[async_trait]
impl ReflectionModel for ClaudeClient {
    async fn generate_prompt(&self, request: &PromptRequest) -> Result<GeneratedPrompt, AiError> {
        let text = self.complete(&prompt_instructions(request), 256).await?;
        let generated: GeneratedPrompt = parse_json_reply(&text)?;
        if generated.prompt.trim().is_empty() {
            return Err(AiError::Malformed("empty prompt".into()));
        }
        Ok(generated)
    }

    async fn analyze_entry(&self, entry_text: &str) -> Result<EntryAnalysis, AiError> {
        let text = self.complete(&analysis_instructions(entry_text), 1024).await?;
        parse_json_reply(&text)
    }
}

fn prompt_instructions(request: &PromptRequest) -> String {
    let occasion = match request.prompt_type {
        PromptType::Greeting => "greet the user and invite them to start writing",
        PromptType::CheckIn => "support the user's daily check-in",
    };
    format!(
        r#"You write journaling prompts for a personal reflection app. Write a single, specific, thought-provoking prompt to {occasion}.

Mood: {mood}
Recent thoughts: {thoughts}

Respond with only a JSON object of this exact shape:
{{"prompt": "the journaling prompt"}}"#,
        mood = request.mood,
        thoughts = request.recent_thoughts.as_deref().unwrap_or("(none shared)"),
    )
}

fn analysis_instructions(entry_text: &str) -> String {
    format!(
        r#"Read this journal entry and identify the themes and emotions it expresses.

Journal entry:
{entry_text}

Respond with only a JSON object of this exact shape:
{{"themes": ["theme"], "emotions": ["emotion"], "summary": "one or two sentence summary"}}"#
    )
}

/// Models sometimes wrap JSON in prose or code fences; parse the outermost
/// object.
fn parse_json_reply<T: serde::de::DeserializeOwned>(text: &str) -> Result<T, AiError> {
    let start = text.find('{');
    let end = text.rfind('}');
    let body = match (start, end) {
        (Some(s), Some(e)) if s < e => &text[s..=e],
        _ => return Err(AiError::Malformed("no JSON object in reply".into())),
    };
    serde_json::from_str(body).map_err(|e| AiError::Malformed(e.to_string()))
}
