//! Core traits and types for the slot-filling agent
//!
//! This crate provides foundational types used across all other crates:
//! - Dialogue states, turns and the conversation context
//! - Function schemas and parameter categories
//! - The `Suggester` contract for intent and parameter backends
//! - Error types

pub mod conversation;
pub mod error;
pub mod schema;
pub mod traits;

pub use conversation::{ConversationContext, ConversationState, Parameters, Turn, TurnRole};
pub use error::{Error, Result};
pub use schema::{FunctionSchema, ParameterSpec, SchemaSet, SlotCategory};
pub use traits::{
    ClarificationSuggestion, IntentSuggestion, ParameterUpdate, Suggester, SuggesterRequest,
    SuggesterResponse, TaskKind, ASK_FOR_CLARIFICATION, UNKNOWN_CONFIDENCE, UNKNOWN_INTENT,
};
