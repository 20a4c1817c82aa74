use crate::core::config::LlmConfig;
use crate::core::error::{ComicError, ComicResult, UpstreamStage};
use crate::services::prompt::OutlinePrompt;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::time::Duration;

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletionOptions {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl From<&LlmConfig> for CompletionOptions {
    fn from(cfg: &LlmConfig) -> Self {
        Self {
            model: cfg.model.clone(),
            temperature: cfg.temperature,
            max_tokens: cfg.max_tokens,
        }
    }
}

#[async_trait]
pub trait LlmClient: Send + Sync + Debug {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<String>;
}

// --- OpenAI ---

#[derive(Debug)]
pub struct OpenAIClient {
    api_key: String,
    base_url: String,
    client: reqwest::Client,
}

impl OpenAIClient {
    pub fn new(api_key: &str, cfg: &LlmConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(cfg.timeout_seconds))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            api_key: api_key.to_string(),
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            client,
        })
    }
}

#[derive(Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessageResponse,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct OpenAIMessageResponse {
    content: Option<String>,
}

#[async_trait]
impl LlmClient for OpenAIClient {
    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<String> {
        let url = format!("{}/chat/completions", self.base_url);
        debug!("POST {} model={} messages={}", url, options.model, messages.len());

        let request_body = OpenAIRequest {
            model: &options.model,
            messages,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        };

        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(&request_body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().await?;
            return Err(anyhow!("OpenAI API error ({}): {}", status, error_text));
        }

        let result: OpenAIResponse = resp.json().await?;
        extract_content(result)
    }
}

fn extract_content(result: OpenAIResponse) -> Result<String> {
    if let Some(choice) = result.choices.into_iter().next() {
        if let Some(content) = choice.message.content.filter(|c| !c.trim().is_empty()) {
            return Ok(content);
        }
        let reason = choice.finish_reason.as_deref().unwrap_or("unknown");
        return Err(anyhow!("OpenAI response empty. Finish reason: {}", reason));
    }

    Err(anyhow!("No response from AI"))
}

/// Requests the story outline: one system and one user message, a single attempt.
#[derive(Debug)]
pub struct OutlineClient {
    llm: Box<dyn LlmClient>,
    options: CompletionOptions,
}

impl OutlineClient {
    pub fn new(llm: Box<dyn LlmClient>, options: CompletionOptions) -> Self {
        Self { llm, options }
    }

    pub async fn request_outline(&self, prompt: &OutlinePrompt) -> ComicResult<String> {
        let messages = [
            ChatMessage::system(prompt.system.as_str()),
            ChatMessage::user(prompt.user.as_str()),
        ];

        let text = self
            .llm
            .complete(&messages, &self.options)
            .await
            .map_err(|e| ComicError::upstream(UpstreamStage::Outline, e))?;

        if text.trim().is_empty() {
            return Err(ComicError::upstream(
                UpstreamStage::Outline,
                anyhow!("No response from AI"),
            ));
        }
        Ok(text)
    }
}
