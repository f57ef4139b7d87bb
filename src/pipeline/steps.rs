//! The three pipeline steps

use super::Step;
use crate::llm::{InvokeOptions, LlmClient};
use crate::models::TurnState;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

pub const ERROR_PREFIX: &str = "I encountered an error while processing your request";
pub const FALLBACK_OUTPUT: &str = "I couldn't generate a response. Please try again.";

/// Calls the language model with the turn's prompt.
///
/// Client errors are turned into a user-facing message in `output`.
pub struct GenerateStep {
    client: Arc<dyn LlmClient>,
    options: InvokeOptions,
}

impl GenerateStep {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self {
            client,
            options: InvokeOptions::default(),
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.options.temperature = Some(temperature);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.options.max_tokens = Some(max_tokens);
        self
    }

    pub fn with_system_prompt(mut self, system: impl Into<String>) -> Self {
        self.options.system = Some(system.into());
        self
    }
}

#[async_trait]
impl Step for GenerateStep {
    fn name(&self) -> &'static str {
        "generate"
    }

    async fn run(&self, mut state: TurnState) -> TurnState {
        let prompt = state.prompt_text();

        match self.client.invoke(&prompt, &self.options).await {
            Ok(text) => {
                debug!(turn_id = %state.turn_id, chars = text.len(), "Model response received");
                state.set_output(text.clone());
                state.record_step("llm_response", text);
            }
            Err(e) => {
                warn!(turn_id = %state.turn_id, "Generation failed: {}", e);
                state.set_output(format!("{}: {}", ERROR_PREFIX, e));
            }
        }

        state
    }
}

/// Guarantees a non-empty `output`.
pub struct FinalizeStep;

#[async_trait]
impl Step for FinalizeStep {
    fn name(&self) -> &'static str {
        "finalize"
    }

    async fn run(&self, mut state: TurnState) -> TurnState {
        if state.output_is_empty() {
            debug!(turn_id = %state.turn_id, "No output produced, using fallback");
            state.set_output(FALLBACK_OUTPUT);
        }
        state
    }
}

/// Terminal marker; returns the state unchanged.
pub struct DoneStep;

#[async_trait]
impl Step for DoneStep {
    fn name(&self) -> &'static str {
        "done"
    }

    async fn run(&self, state: TurnState) -> TurnState {
        state
    }
}
