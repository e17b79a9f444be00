//! Core traits for the slot-filling agent
//!
//! The dialogue engine depends only on these traits, so suggestion backends
//! can be swapped (rule based, model backed, test mocks) without touching the
//! state machine.

mod suggester;

pub use suggester::{
    ClarificationSuggestion, IntentSuggestion, ParameterUpdate, Suggester, SuggesterRequest,
    SuggesterResponse, TaskKind, ASK_FOR_CLARIFICATION, UNKNOWN_CONFIDENCE, UNKNOWN_INTENT,
};
