//! Chat-completions client for live mode
//!
//! Uses a long-lived reqwest::Client for connection pooling.

use super::{ClientMode, InvokeOptions, LlmClient};
use crate::config::Config;
use crate::error::AssistantError;
use crate::models::{Message, Role};
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub struct OpenAiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OpenAiClient {
    pub fn new(api_key: String, config: &Config) -> Result<Self> {
        let client = Client::builder()
            .pool_idle_timeout(Duration::from_secs(90))
            .pool_max_idle_per_host(8)
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            client,
            api_key,
            base_url: config.openai_base_url.trim_end_matches('/').to_string(),
            model: config.openai_model.clone(),
            temperature: config.agent_temperature,
            max_tokens: config.agent_max_tokens,
        })
    }

    fn build_request(&self, prompt: &str, options: &InvokeOptions) -> ChatCompletionRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = options.system.as_deref().filter(|s| !s.is_empty()) {
            messages.push(Message::system(system));
        }
        messages.push(Message::user(prompt));

        ChatCompletionRequest {
            model: options.model.clone().unwrap_or_else(|| self.model.clone()),
            messages,
            temperature: options.temperature.unwrap_or(self.temperature),
            max_tokens: options.max_tokens.unwrap_or(self.max_tokens),
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    fn mode(&self) -> ClientMode {
        ClientMode::Live
    }

    async fn invoke(&self, prompt: &str, options: &InvokeOptions) -> Result<String> {
        let request = self.build_request(prompt, options);
        let url = format!("{}/chat/completions", self.base_url);

        info!(model = %request.model, max_tokens = request.max_tokens, "Calling chat completions API");

        let response = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                error!("Chat completions request failed: {}", e);
                e
            })?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            error!(%status, "Chat completions API error response: {}", body);
            return Err(AssistantError::Llm(format!(
                "chat completions API returned {}: {}",
                status, body
            )));
        }

        let parsed: Value = match serde_json::from_str(&body) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Chat completions response is not JSON: {}", e);
                return Ok(String::new());
            }
        };

        let text = extract_text(&parsed);
        debug!(chars = text.len(), "Chat completions response received");

        Ok(text)
    }
}

//
// ================= Response extraction =================
//

type Extractor = fn(&Value) -> Option<String>;

/// Tried in order; the first non-empty result wins.
const EXTRACTORS: &[Extractor] = &[typed_completion, message_content, completion_text];

/// Plain text from a completion body, or "" when no strategy matches.
pub fn extract_text(body: &Value) -> String {
    EXTRACTORS
        .iter()
        .filter_map(|extract| extract(body))
        .find(|text| !text.is_empty())
        .unwrap_or_default()
}

fn typed_completion(body: &Value) -> Option<String> {
    let response = ChatCompletionResponse::deserialize(body).ok()?;
    let choice = response.choices.into_iter().next()?;
    choice
        .message
        .and_then(|m| m.content)
        .or(choice.text)
}

fn message_content(body: &Value) -> Option<String> {
    body.pointer("/choices/0/message/content")?
        .as_str()
        .map(str::to_string)
}

fn completion_text(body: &Value) -> Option<String> {
    body.pointer("/choices/0/text")?.as_str().map(str::to_string)
}

//
// ================= Wire types =================
//

#[derive(Debug, Serialize)]
struct ChatCompletionRequest {
    model: String,
    messages: Vec<Message>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ResponseMessage>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResponseMessage {
    #[allow(dead_code)]
    role: Option<Role>,
    content: Option<String>,
}
