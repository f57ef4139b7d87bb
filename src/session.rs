//! Chat session
//!
//! Holds the visible conversation for the lifetime of the process and runs
//! one pipeline turn per user message. Nothing is persisted.

use crate::models::{Role, TurnState};
use crate::pipeline::Pipeline;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

pub const DISCLAIMER: &str = "Disclaimer: This AI assistant provides general information only and is not financial advice. Always consult with a qualified financial advisor.";

/// A single message in the visible history
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub timestamp: DateTime<Utc>,
    pub role: Role,
    pub content: String,
}

impl ConversationMessage {
    pub fn new(role: Role, content: String) -> Self {
        Self {
            timestamp: Utc::now(),
            role,
            content,
        }
    }
}

/// Append-only conversation history
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConversationHistory {
    messages: Vec<ConversationMessage>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_message(&mut self, role: Role, content: impl Into<String>) {
        self.messages.push(ConversationMessage::new(role, content.into()));
    }

    pub fn messages(&self) -> impl Iterator<Item = &ConversationMessage> {
        self.messages.iter()
    }

    pub fn message_count(&self) -> usize {
        self.messages.len()
    }

    /// Format the history for display
    pub fn get_formatted_context(&self) -> String {
        let mut context = String::new();

        for msg in &self.messages {
            let role_str = match msg.role {
                Role::User => "You",
                Role::Assistant => "Assistant",
                Role::System => "System",
            };

            context.push_str(&format!(
                "[{}] {}: {}\n",
                msg.timestamp.format("%H:%M:%S"),
                role_str,
                msg.content
            ));
        }

        context
    }
}

/// One conversation, processed one turn at a time.
pub struct ChatSession {
    pipeline: Arc<Pipeline>,
    history: ConversationHistory,
}

impl ChatSession {
    pub fn new(pipeline: Arc<Pipeline>) -> Self {
        Self {
            pipeline,
            history: ConversationHistory::new(),
        }
    }

    pub fn history(&self) -> &ConversationHistory {
        &self.history
    }

    /// Record the user's message, run a turn, record and return the answer.
    ///
    /// Only the current message goes into the turn state; earlier history
    /// stays with the session.
    pub async fn submit(&mut self, text: &str) -> String {
        self.history.add_message(Role::User, text);

        let state = TurnState::from_user_message(text);
        let turn_id = state.turn_id;
        let answer = self.pipeline.run(state).await.into_output();

        info!(%turn_id, history_len = self.history.message_count() + 1, "Turn answered");

        self.history.add_message(Role::Assistant, answer.clone());
        answer
    }
}
