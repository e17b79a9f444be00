//! Single-conversation session
//!
//! Owns the current context, advances it with each message and starts a
//! fresh one as soon as a function call is complete.

use serde::Serialize;

use slot_agent_config::{FunctionsConfig, Settings};
use slot_agent_core::{ConversationContext, ConversationState, Parameters};

use crate::engine::DialogueEngine;
use crate::AgentError;

/// What one message produced
#[derive(Debug, Clone, Serialize)]
pub struct TurnOutcome {
    pub response: String,
    pub state: ConversationState,
    pub intent: Option<String>,
    pub parameters: Parameters,
    pub ready_to_execute: bool,
}

pub struct AgentSession {
    engine: DialogueEngine,
    context: ConversationContext,
}

impl AgentSession {
    pub fn new(engine: DialogueEngine) -> Self {
        Self {
            engine,
            context: ConversationContext::new(),
        }
    }

    /// Session over the rule-based engine
    pub fn from_settings(functions: &FunctionsConfig, settings: &Settings) -> Result<Self, AgentError> {
        Ok(Self::new(DialogueEngine::from_settings(functions, settings)?))
    }

    pub async fn process_message(&mut self, input: &str) -> TurnOutcome {
        let context = std::mem::take(&mut self.context);
        self.context = self.engine.advance(context, input).await;

        let response = self.engine.respond(&self.context).await;
        self.context.push_assistant(response.clone());

        let ready_to_execute = self.context.is_ready();
        let outcome = TurnOutcome {
            response,
            state: self.context.state,
            intent: self.context.detected_intent.clone(),
            parameters: self.context.gathered_parameters.clone(),
            ready_to_execute,
        };

        if ready_to_execute {
            tracing::info!(
                conversation = %self.context.id,
                intent = ?outcome.intent,
                "Function call complete, starting new conversation"
            );
            self.reset();
        }

        outcome
    }

    pub fn context(&self) -> &ConversationContext {
        &self.context
    }

    pub fn engine(&self) -> &DialogueEngine {
        &self.engine
    }

    pub fn reset(&mut self) {
        self.context = ConversationContext::new();
    }
}
