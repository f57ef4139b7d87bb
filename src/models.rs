//! Core data models for the investment assistant

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use uuid::Uuid;

//
// ================= Messages =================
//

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }
}

//
// ================= Turn State =================
//

/// One `(label, value)` record of what a pipeline step did.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IntermediateStep {
    pub label: String,
    pub value: String,
}

/// State threaded through a single pipeline run.
///
/// Created per user message, consumed by the pipeline, discarded once
/// `output` has been read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TurnState {
    pub turn_id: Uuid,
    pub messages: Vec<Message>,
    user_input: String,
    pub intermediate_steps: Vec<IntermediateStep>,
    output: Option<String>,
    pub analysis_data: Option<Map<String, Value>>,
}

impl TurnState {
    pub fn new(messages: Vec<Message>, user_input: impl Into<String>) -> Self {
        Self {
            turn_id: Uuid::new_v4(),
            messages,
            user_input: user_input.into(),
            intermediate_steps: Vec::new(),
            output: None,
            analysis_data: None,
        }
    }

    /// Entry-contract state: a single user message mirrored into `user_input`.
    pub fn from_user_message(text: impl Into<String>) -> Self {
        let text = text.into();
        Self::new(vec![Message::user(text.clone())], text)
    }

    pub fn user_input(&self) -> &str {
        &self.user_input
    }

    pub fn output(&self) -> Option<&str> {
        self.output.as_deref()
    }

    /// True when no step has produced non-empty output.
    pub fn output_is_empty(&self) -> bool {
        self.output.as_deref().map_or(true, |o| o.trim().is_empty())
    }

    /// Set the response text. Empty text never replaces existing output.
    pub fn set_output(&mut self, text: impl Into<String>) {
        let text = text.into();
        if text.trim().is_empty() && !self.output_is_empty() {
            return;
        }
        self.output = Some(text);
    }

    pub fn record_step(&mut self, label: impl Into<String>, value: impl Into<String>) {
        self.intermediate_steps.push(IntermediateStep {
            label: label.into(),
            value: value.into(),
        });
    }

    /// Prompt text for the model: `user_input`, or every message's content
    /// joined when the input is empty.
    pub fn prompt_text(&self) -> String {
        if !self.user_input.trim().is_empty() {
            return self.user_input.clone();
        }

        self.messages
            .iter()
            .map(|m| m.content.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Consume the state, yielding the final answer text.
    pub fn into_output(self) -> String {
        self.output.unwrap_or_default()
    }
}

//
// ================= Tool I/O =================
//

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInput {
    pub tool_name: String,
    pub parameters: Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolOutput {
    pub success: bool,
    pub data: Value,
    pub error: Option<String>,
}

impl ToolOutput {
    pub fn ok(data: Value) -> Self {
        Self {
            success: true,
            data,
            error: None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::System => "system",
        };
        write!(f, "{}", s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_user_message() {
        let state = TurnState::from_user_message("Should I buy bonds?");
        assert_eq!(state.user_input(), "Should I buy bonds?");
        assert_eq!(state.messages, vec![Message::user("Should I buy bonds?")]);
        assert!(state.intermediate_steps.is_empty());
        assert!(state.output().is_none());
        assert!(state.analysis_data.is_none());
    }

    #[test]
    fn test_prompt_falls_back_to_messages() {
        let state = TurnState::new(
            vec![Message::system("be brief"), Message::user("what is an ETF?")],
            "",
        );
        assert_eq!(state.prompt_text(), "be brief\nwhat is an ETF?");
    }

    #[test]
    fn test_empty_output_does_not_overwrite() {
        let mut state = TurnState::from_user_message("hi");
        state.set_output("Hello!");
        state.set_output("   ");
        assert_eq!(state.output(), Some("Hello!"));

        state.set_output("Updated");
        assert_eq!(state.output(), Some("Updated"));
    }

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&Message::assistant("ok")).unwrap();
        assert_eq!(json, r#"{"role":"assistant","content":"ok"}"#);
    }
}
