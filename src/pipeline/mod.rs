//! Turn pipeline
//!
//! GENERATE → FINALIZE → DONE
//!
//! A fixed, linear sequence of named steps over a `TurnState`. Every step runs
//! exactly once per turn, in order, whatever happened in the previous one.

use crate::config::Config;
use crate::llm::LlmClient;
use crate::models::TurnState;
use crate::tools::ToolRegistry;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

pub mod steps;

pub use steps::{DoneStep, FinalizeStep, GenerateStep, ERROR_PREFIX, FALLBACK_OUTPUT};

/// A named state transformation. Steps never fail; problems are written into
/// the state instead.
#[async_trait]
pub trait Step: Send + Sync {
    fn name(&self) -> &'static str;
    async fn run(&self, state: TurnState) -> TurnState;
}

pub struct Pipeline {
    steps: Vec<Box<dyn Step>>,
}

impl Pipeline {
    pub fn new(steps: Vec<Box<dyn Step>>) -> Self {
        Self { steps }
    }

    /// Step names in execution order.
    pub fn step_names(&self) -> Vec<&'static str> {
        self.steps.iter().map(|s| s.name()).collect()
    }

    /// Run every step in order and return the finalized state.
    pub async fn run(&self, mut state: TurnState) -> TurnState {
        info!(turn_id = %state.turn_id, "Pipeline: starting turn");

        for step in &self.steps {
            debug!(turn_id = %state.turn_id, step = step.name(), "Running step");
            state = step.run(state).await;
        }

        info!(
            turn_id = %state.turn_id,
            steps_recorded = state.intermediate_steps.len(),
            "Pipeline: turn complete"
        );

        state
    }
}

/// Build the system prompt, listing the available analysis tools.
pub fn build_system_prompt(tools: &ToolRegistry) -> String {
    let base_prompt = r#"You are an expert investment advisor AI assistant. Your role is to:

1. Analyze investment portfolios and provide insights
2. Assess risk profiles and recommend allocations
3. Evaluate diversification strategies
4. Provide educational information about investments
5. Generate personalized investment recommendations

Always:
- Provide balanced, educational perspectives
- Acknowledge that you're not a substitute for professional financial advice
- Ask clarifying questions when needed
- Consider the user's risk tolerance and time horizon"#;

    let tool_lines = tools.describe();
    if tool_lines.is_empty() {
        base_prompt.to_string()
    } else {
        format!(
            "{}\n\nAvailable tools:\n- {}",
            base_prompt,
            tool_lines.join("\n- ")
        )
    }
}

/// Wire the GENERATE → FINALIZE → DONE pipeline.
pub fn create_investment_pipeline(
    config: &Config,
    client: Arc<dyn LlmClient>,
    tools: &ToolRegistry,
) -> Pipeline {
    let generate = GenerateStep::new(client)
        .with_temperature(config.agent_temperature)
        .with_max_tokens(config.agent_max_tokens)
        .with_system_prompt(build_system_prompt(tools));

    Pipeline::new(vec![
        Box::new(generate),
        Box::new(FinalizeStep),
        Box::new(DoneStep),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AssistantError;
    use crate::llm::{ClientMode, InvokeOptions, StubClient};
    use crate::tools::create_default_registry;
    use crate::Result;

    struct FailingClient;

    #[async_trait]
    impl LlmClient for FailingClient {
        fn mode(&self) -> ClientMode {
            ClientMode::Live
        }

        async fn invoke(&self, _prompt: &str, _options: &InvokeOptions) -> Result<String> {
            Err(AssistantError::Llm("quota exceeded".to_string()))
        }
    }

    struct EmptyClient;

    #[async_trait]
    impl LlmClient for EmptyClient {
        fn mode(&self) -> ClientMode {
            ClientMode::Live
        }

        async fn invoke(&self, _prompt: &str, _options: &InvokeOptions) -> Result<String> {
            Ok(String::new())
        }
    }

    fn pipeline_with(client: Arc<dyn LlmClient>) -> Pipeline {
        create_investment_pipeline(&Config::default(), client, &create_default_registry())
    }

    #[test]
    fn test_step_order() {
        let pipeline = pipeline_with(Arc::new(StubClient));
        assert_eq!(pipeline.step_names(), vec!["generate", "finalize", "done"]);
    }

    #[test]
    fn test_system_prompt_lists_tools() {
        let prompt = build_system_prompt(&create_default_registry());
        assert!(prompt.contains("Available tools:"));
        assert!(prompt.contains("- analyze_risk:"));
        assert!(prompt.contains("- get_diversification_score:"));

        let bare = build_system_prompt(&ToolRegistry::new());
        assert!(!bare.contains("Available tools:"));
    }

    #[tokio::test]
    async fn test_stub_turn() {
        let pipeline = pipeline_with(Arc::new(StubClient));
        let result = pipeline.run(TurnState::from_user_message("hello")).await;

        assert_eq!(result.output(), Some("[llm_stub] hello"));
        assert_eq!(result.intermediate_steps.len(), 1);
        assert_eq!(result.intermediate_steps[0].label, "llm_response");
        assert_eq!(result.intermediate_steps[0].value, "[llm_stub] hello");
    }

    #[tokio::test]
    async fn test_client_failure_becomes_message() {
        let pipeline = pipeline_with(Arc::new(FailingClient));
        let result = pipeline.run(TurnState::from_user_message("hello")).await;

        let output = result.output().unwrap();
        assert!(output.contains("I encountered an error"));
        assert!(output.contains("quota exceeded"));
        assert!(result.intermediate_steps.is_empty());
    }

    #[tokio::test]
    async fn test_empty_response_gets_fallback() {
        let pipeline = pipeline_with(Arc::new(EmptyClient));
        let result = pipeline.run(TurnState::from_user_message("hello")).await;
        assert_eq!(result.output(), Some(FALLBACK_OUTPUT));
    }

    #[tokio::test]
    async fn test_output_never_empty() {
        let clients: Vec<Arc<dyn LlmClient>> =
            vec![Arc::new(StubClient), Arc::new(FailingClient), Arc::new(EmptyClient)];
        let inputs = ["", "   ", "What about bonds?"];

        for client in clients {
            let pipeline = pipeline_with(client);
            for input in inputs {
                let result = pipeline.run(TurnState::from_user_message(input)).await;
                assert!(!result.output_is_empty(), "input {:?}", input);
            }
        }
    }
}
