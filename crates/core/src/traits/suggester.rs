//! Suggester contract: the pluggable source of intent and parameter suggestions
//!
//! Every request is a tagged task and every task has exactly one response
//! shape. A backend returning the wrong shape is reported as
//! [`Error::InvalidResponse`] so the dialogue engine can degrade instead of
//! guessing.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::conversation::{Parameters, Turn};
use crate::error::{Error, Result};
use crate::schema::{FunctionSchema, SchemaSet};

/// Intent name meaning "no function matched"
pub const UNKNOWN_INTENT: &str = "unknown";

/// Intent name a clarification suggestion uses to ask again
pub const ASK_FOR_CLARIFICATION: &str = "ask_for_clarification";

/// Confidence reported when nothing matched
pub const UNKNOWN_CONFIDENCE: f32 = 0.3;

/// Task kind of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskKind {
    DetectIntent,
    ExtractParameters,
    Clarify,
    GenerateQuestion,
}

impl TaskKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskKind::DetectIntent => "detect_intent",
            TaskKind::ExtractParameters => "extract_parameters",
            TaskKind::Clarify => "clarify",
            TaskKind::GenerateQuestion => "generate_question",
        }
    }
}

/// A request to the suggester, one variant per task
#[derive(Debug, Clone, Copy)]
pub enum SuggesterRequest<'a> {
    DetectIntent {
        schemas: &'a SchemaSet,
        user_input: &'a str,
    },
    ExtractParameters {
        schema: &'a FunctionSchema,
        gathered: &'a Parameters,
        missing: &'a [String],
        user_input: &'a str,
    },
    Clarify {
        schemas: &'a SchemaSet,
        user_input: &'a str,
        recent_history: &'a [Turn],
    },
    GenerateQuestion {
        schema: &'a FunctionSchema,
        missing: &'a [String],
    },
}

impl SuggesterRequest<'_> {
    pub fn kind(&self) -> TaskKind {
        match self {
            SuggesterRequest::DetectIntent { .. } => TaskKind::DetectIntent,
            SuggesterRequest::ExtractParameters { .. } => TaskKind::ExtractParameters,
            SuggesterRequest::Clarify { .. } => TaskKind::Clarify,
            SuggesterRequest::GenerateQuestion { .. } => TaskKind::GenerateQuestion,
        }
    }
}

/// Suggested intent with any parameters spotted in the same utterance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentSuggestion {
    pub intent: String,
    #[serde(default)]
    pub extracted_parameters: Parameters,
    pub confidence: f32,
    #[serde(default)]
    pub reasoning: String,
}

impl IntentSuggestion {
    /// The "nothing matched" suggestion
    pub fn unknown() -> Self {
        Self {
            intent: UNKNOWN_INTENT.to_string(),
            extracted_parameters: Parameters::new(),
            confidence: UNKNOWN_CONFIDENCE,
            reasoning: String::new(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.intent == UNKNOWN_INTENT
    }
}

/// Parameter values extracted from one utterance
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParameterUpdate {
    #[serde(default)]
    pub updated_parameters: Parameters,
    #[serde(default)]
    pub still_missing: Vec<String>,
    #[serde(default)]
    pub ready_to_execute: bool,
}

impl ParameterUpdate {
    /// An update that changes nothing
    pub fn none(missing: &[String]) -> Self {
        Self {
            updated_parameters: Parameters::new(),
            still_missing: missing.to_vec(),
            ready_to_execute: false,
        }
    }
}

/// Outcome of a clarification attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClarificationSuggestion {
    pub intent: String,
    #[serde(default)]
    pub clarification_question: Option<String>,
    #[serde(default)]
    pub confidence: f32,
}

impl ClarificationSuggestion {
    pub fn ask_again() -> Self {
        Self {
            intent: ASK_FOR_CLARIFICATION.to_string(),
            clarification_question: None,
            confidence: 0.0,
        }
    }

    /// True when the suggestion names a concrete function
    pub fn is_concrete(&self) -> bool {
        self.intent != ASK_FOR_CLARIFICATION && self.intent != UNKNOWN_INTENT
    }
}

/// A suggester response, one variant per task
#[derive(Debug, Clone, PartialEq)]
pub enum SuggesterResponse {
    Intent(IntentSuggestion),
    Parameters(ParameterUpdate),
    Clarification(ClarificationSuggestion),
    Question(String),
}

impl SuggesterResponse {
    pub fn kind(&self) -> TaskKind {
        match self {
            SuggesterResponse::Intent(_) => TaskKind::DetectIntent,
            SuggesterResponse::Parameters(_) => TaskKind::ExtractParameters,
            SuggesterResponse::Clarification(_) => TaskKind::Clarify,
            SuggesterResponse::Question(_) => TaskKind::GenerateQuestion,
        }
    }

    pub fn into_intent(self) -> Result<IntentSuggestion> {
        match self {
            SuggesterResponse::Intent(suggestion) => Ok(suggestion),
            other => Err(mismatch(TaskKind::DetectIntent, other.kind())),
        }
    }

    pub fn into_parameters(self) -> Result<ParameterUpdate> {
        match self {
            SuggesterResponse::Parameters(update) => Ok(update),
            other => Err(mismatch(TaskKind::ExtractParameters, other.kind())),
        }
    }

    pub fn into_clarification(self) -> Result<ClarificationSuggestion> {
        match self {
            SuggesterResponse::Clarification(suggestion) => Ok(suggestion),
            other => Err(mismatch(TaskKind::Clarify, other.kind())),
        }
    }

    pub fn into_question(self) -> Result<String> {
        match self {
            SuggesterResponse::Question(question) => Ok(question),
            other => Err(mismatch(TaskKind::GenerateQuestion, other.kind())),
        }
    }
}

fn mismatch(expected: TaskKind, got: TaskKind) -> Error {
    Error::InvalidResponse(format!(
        "expected {} response, got {}",
        expected.as_str(),
        got.as_str()
    ))
}

/// Source of intent, parameter, clarification and question suggestions
///
/// Implementations may be rule based or model backed. Errors are allowed;
/// the dialogue engine treats any error as a degraded suggestion.
#[async_trait]
pub trait Suggester: Send + Sync {
    async fn suggest(&self, request: SuggesterRequest<'_>) -> Result<SuggesterResponse>;

    /// Backend name for logs
    fn name(&self) -> &str {
        "suggester"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_unknown_suggestion() {
        let suggestion = IntentSuggestion::unknown();
        assert!(suggestion.is_unknown());
        assert_eq!(suggestion.confidence, UNKNOWN_CONFIDENCE);
        assert!(suggestion.extracted_parameters.is_empty());
    }

    #[test]
    fn test_mismatched_response_is_invalid() {
        let response = SuggesterResponse::Question("What is your name?".into());
        let err = response.into_intent().unwrap_err();
        assert!(matches!(err, Error::InvalidResponse(_)));
    }

    #[test]
    fn test_parameter_update_deserializes_with_defaults() {
        let update: ParameterUpdate =
            serde_json::from_value(json!({"updated_parameters": {"address": "1 Main St"}}))
                .unwrap();
        assert_eq!(update.updated_parameters["address"], json!("1 Main St"));
        assert!(update.still_missing.is_empty());
        assert!(!update.ready_to_execute);
    }

    #[test]
    fn test_clarification_concreteness() {
        assert!(!ClarificationSuggestion::ask_again().is_concrete());
        let unknown = ClarificationSuggestion {
            intent: UNKNOWN_INTENT.into(),
            clarification_question: None,
            confidence: 0.3,
        };
        assert!(!unknown.is_concrete());
        let concrete = ClarificationSuggestion {
            intent: "check_weather".into(),
            clarification_question: None,
            confidence: 0.8,
        };
        assert!(concrete.is_concrete());
    }

    struct EchoQuestion;

    #[async_trait]
    impl Suggester for EchoQuestion {
        async fn suggest(&self, request: SuggesterRequest<'_>) -> Result<SuggesterResponse> {
            match request {
                SuggesterRequest::GenerateQuestion { missing, .. } => {
                    Ok(SuggesterResponse::Question(format!("Need {}", missing.join(", "))))
                }
                other => Err(Error::Suggester(format!("unsupported {}", other.kind().as_str()))),
            }
        }
    }

    #[tokio::test]
    async fn test_suggester_trait_object() {
        let suggester: Box<dyn Suggester> = Box::new(EchoQuestion);
        let schema = FunctionSchema::new("check_weather", "");
        let missing = vec!["location".to_string()];
        let question = suggester
            .suggest(SuggesterRequest::GenerateQuestion { schema: &schema, missing: &missing })
            .await
            .and_then(SuggesterResponse::into_question)
            .unwrap();
        assert_eq!(question, "Need location");
        assert_eq!(suggester.name(), "suggester");
    }
}
