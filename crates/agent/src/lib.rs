//! Slot-filling dialogue agent
//!
//! Features:
//! - Dialogue state machine (detect intent, gather parameters, clarify, ready)
//! - Rule-based suggester over the keyword classifier and slot extractors
//! - Model-backed suggester for any text generator, with graceful degradation
//! - Response generation and a single-conversation session facade

pub mod engine;
pub mod model;
pub mod response;
pub mod rule_based;
pub mod session;

pub use engine::DialogueEngine;
pub use model::{parse_json_reply, ModelSuggester, TextGenerator};
pub use rule_based::{classifier_config, ExtractionPlan, RuleBasedSuggester};
pub use session::{AgentSession, TurnOutcome};

use slot_agent_config::ConfigError;
use thiserror::Error;

/// Agent errors
#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Core(#[from] slot_agent_core::Error),
}
