//! Conversation types: dialogue states, turns and the per-conversation context

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::schema::FunctionSchema;

/// Gathered parameter values keyed by parameter name
pub type Parameters = BTreeMap<String, serde_json::Value>;

/// Dialogue states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConversationState {
    /// No function chosen yet
    #[default]
    DetectingIntent,
    /// Function chosen, required parameters still missing
    GatheringParams,
    /// Every required parameter is present
    ReadyToExecute,
    /// Intent was unclear, waiting for the user to clarify
    ClarificationNeeded,
}

impl ConversationState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationState::DetectingIntent => "detecting_intent",
            ConversationState::GatheringParams => "gathering_params",
            ConversationState::ReadyToExecute => "ready_to_execute",
            ConversationState::ClarificationNeeded => "clarification_needed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ConversationState::ReadyToExecute)
    }
}

impl std::fmt::Display for ConversationState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Role in a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnRole {
    User,
    Assistant,
}

impl TurnRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TurnRole::User => "user",
            TurnRole::Assistant => "assistant",
        }
    }
}

/// A single turn in the conversation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn new(role: TurnRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(TurnRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(TurnRole::Assistant, content)
    }
}

/// Mutable state of one conversation
///
/// `missing_parameters` is derived data: it is recomputed from the detected
/// function's schema whenever gathered parameters change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationContext {
    pub id: Uuid,
    pub state: ConversationState,
    pub detected_intent: Option<String>,
    pub gathered_parameters: Parameters,
    pub missing_parameters: Vec<String>,
    pub history: Vec<Turn>,
    pub confidence: f32,
}

impl Default for ConversationContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationContext {
    /// Fresh context in the detecting-intent state
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: ConversationState::DetectingIntent,
            detected_intent: None,
            gathered_parameters: Parameters::new(),
            missing_parameters: Vec::new(),
            history: Vec::new(),
            confidence: 0.0,
        }
    }

    /// Context already gathering parameters for `intent`
    pub fn gathering(intent: impl Into<String>, schema: &FunctionSchema) -> Self {
        let mut context = Self::new();
        context.state = ConversationState::GatheringParams;
        context.detected_intent = Some(intent.into());
        context.recompute_missing(schema);
        context
    }

    /// Merge updates into the gathered parameters, last write wins
    pub fn merge_parameters(&mut self, updates: Parameters) {
        self.gathered_parameters.extend(updates);
    }

    pub fn recompute_missing(&mut self, schema: &FunctionSchema) {
        self.missing_parameters = schema.missing_from(&self.gathered_parameters);
    }

    pub fn push_user(&mut self, content: impl Into<String>) {
        self.history.push(Turn::user(content));
    }

    pub fn push_assistant(&mut self, content: impl Into<String>) {
        self.history.push(Turn::assistant(content));
    }

    /// Last `n` history entries, oldest first
    pub fn recent_history(&self, n: usize) -> &[Turn] {
        let start = self.history.len().saturating_sub(n);
        &self.history[start..]
    }

    pub fn is_ready(&self) -> bool {
        self.state == ConversationState::ReadyToExecute
    }
}
