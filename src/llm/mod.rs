//! Language-model client abstraction
//!
//! A uniform `invoke(prompt, options) -> text` contract with two variants:
//! a remote chat-completions client and a deterministic offline stub. The
//! variant is picked once, from the configuration, in `create_client`.

use crate::config::Config;
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

pub mod openai;
pub mod stub;

pub use openai::OpenAiClient;
pub use stub::{StubClient, STUB_MARKER};

/// Per-call overrides. Unset fields fall back to the client's configured
/// defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvokeOptions {
    pub system: Option<String>,
    pub model: Option<String>,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl InvokeOptions {
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClientMode {
    Live,
    Stub,
}

#[async_trait]
pub trait LlmClient: Send + Sync {
    fn mode(&self) -> ClientMode;

    /// Generate text for `prompt`.
    ///
    /// Remote failures are returned as-is: no retry, no swallowing.
    async fn invoke(&self, prompt: &str, options: &InvokeOptions) -> Result<String>;
}

/// Live client when a credential is configured, stub otherwise.
pub fn create_client(config: &Config) -> Result<Arc<dyn LlmClient>> {
    match config.openai_api_key.as_deref() {
        Some(api_key) => {
            info!(model = %config.openai_model, "LLM client: live");
            Ok(Arc::new(OpenAiClient::new(api_key.to_string(), config)?))
        }
        None => {
            warn!("OPENAI_API_KEY not configured, LLM client running in stub mode");
            Ok(Arc::new(StubClient))
        }
    }
}
