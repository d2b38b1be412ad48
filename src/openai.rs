use std::time::Duration;

use anyhow::Context as _;
use async_trait::async_trait;

#[async_trait]
pub trait CompletionClient: Send + Sync {
    async fn complete(&self, prompt: &str) -> anyhow::Result<String>;
}

#[derive(Debug, Clone)]
pub struct ChatCompletionConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub max_tokens: u32,
    pub timeout: Duration,
}

/// OpenAI-compatible `/chat/completions` client (Hugging Face router, vLLM, ...).
#[derive(Debug, Clone)]
pub struct ChatCompletionClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    max_tokens: u32,
}

impl ChatCompletionClient {
    pub fn new(config: ChatCompletionConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("build completion http client")?;
        Ok(Self {
            client,
            endpoint: chat_completions_endpoint(&config.base_url),
            api_key: config.api_key,
            model: config.model,
            max_tokens: config.max_tokens,
        })
    }
}

#[async_trait]
impl CompletionClient for ChatCompletionClient {
    async fn complete(&self, prompt: &str) -> anyhow::Result<String> {
        chat_completion_text(
            &self.client,
            &self.endpoint,
            &self.api_key,
            &self.model,
            prompt,
            self.max_tokens,
        )
        .await
    }
}

pub fn chat_completions_endpoint(base_url: &str) -> String {
    let base_url = base_url.trim_end_matches('/');
    format!("{base_url}/chat/completions")
}

pub async fn chat_completion_text(
    client: &reqwest::Client,
    endpoint: &str,
    api_key: &str,
    model: &str,
    prompt: &str,
    max_tokens: u32,
) -> anyhow::Result<String> {
    let body = serde_json::json!({
        "model": model,
        "messages": [
            { "role": "user", "content": prompt }
        ],
        "max_tokens": max_tokens,
    });

    let response = client
        .post(endpoint)
        .bearer_auth(api_key)
        .json(&body)
        .send()
        .await
        .with_context(|| format!("POST {endpoint}"))?;

    let status = response.status();
    let raw = response
        .text()
        .await
        .context("read chat completion response body")?;
    if !status.is_success() {
        let message = parse_error_message(&raw).unwrap_or_else(|| raw.clone());
        anyhow::bail!("chat completion API error ({status}): {message}");
    }

    let value: serde_json::Value =
        serde_json::from_str(&raw).context("parse chat completion response")?;
    extract_message_content(&value).context("extract message content")
}

fn parse_error_message(raw_json: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(raw_json).ok()?;
    let error = value.get("error")?;
    // Some providers return `{"error": "..."}` instead of an object.
    if let Some(message) = error.as_str() {
        return Some(message.to_owned());
    }
    Some(error.get("message")?.as_str()?.to_owned())
}

fn extract_message_content(value: &serde_json::Value) -> anyhow::Result<String> {
    let content = value
        .pointer("/choices/0/message/content")
        .ok_or_else(|| anyhow::anyhow!("missing `choices[0].message.content` in response"))?;
    let Some(text) = content.as_str() else {
        anyhow::bail!("`choices[0].message.content` is not a string");
    };

    if text.trim().is_empty() {
        anyhow::bail!("chat completion content is empty");
    }
    Ok(text.to_owned())
}
