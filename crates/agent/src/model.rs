//! Model-backed suggester
//!
//! Renders each suggester task as a text prompt, hands it to a
//! [`TextGenerator`] and reads a JSON object back out of the reply. Any
//! generator error or unreadable reply is degraded here: either to an
//! optional fallback suggester, or to the neutral answer for the task.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::fmt::Write as _;
use std::sync::Arc;

use slot_agent_core::{
    ClarificationSuggestion, Error, FunctionSchema, IntentSuggestion, ParameterUpdate, Parameters,
    Result, SchemaSet, Suggester, SuggesterRequest, SuggesterResponse, TaskKind, Turn,
};

use crate::response;

/// Anything that turns a prompt into text
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;

    fn model_name(&self) -> &str;
}

// =============================================================================
// Prompts
// =============================================================================

/// Function listing shared by the detection and clarification prompts
pub fn schema_text(schemas: &SchemaSet) -> String {
    let mut text = String::new();
    for schema in schemas.iter() {
        let _ = writeln!(text, "Function: {}", schema.name);
        let _ = writeln!(text, "Description: {}", schema.description);
        let _ = writeln!(text, "Parameters: {}", to_pretty(&schema.parameters));
        let _ = writeln!(text, "Required: {:?}", schema.required);
        text.push('\n');
    }
    text
}

pub fn intent_prompt(schemas: &SchemaSet, user_input: &str) -> String {
    format!(
        "Available functions:\n{}\nUser input: \"{}\"\n\n\
         Decide which function the user wants (or \"unknown\" if unclear), which parameter \
         values the input already contains, and how confident you are (0-1).\n\n\
         Respond with JSON only:\n\
         {{\"intent\": \"function_name_or_unknown\", \"extracted_parameters\": {{}}, \
         \"confidence\": 0.8, \"reasoning\": \"explanation\"}}",
        schema_text(schemas),
        user_input
    )
}

pub fn extraction_prompt(
    schema: &FunctionSchema,
    gathered: &Parameters,
    missing: &[String],
    user_input: &str,
) -> String {
    format!(
        "Function: {}\nParameters needed: {}\nRequired parameters: {:?}\n\
         Currently gathered: {}\nMissing parameters: {:?}\n\n\
         User response: \"{}\"\n\n\
         Extract any parameter values from the user response.\n\n\
         Respond with JSON only:\n\
         {{\"updated_parameters\": {{}}, \"still_missing\": [], \"ready_to_execute\": false}}",
        schema.name,
        to_pretty(&schema.parameters),
        schema.required,
        to_pretty(gathered),
        missing,
        user_input
    )
}

pub fn clarification_prompt(schemas: &SchemaSet, user_input: &str, recent_history: &[Turn]) -> String {
    let history: Vec<String> = recent_history
        .iter()
        .map(|turn| format!("{}: {}", turn.role.as_str(), turn.content))
        .collect();

    format!(
        "Available functions:\n{}\nUser input: \"{}\"\nPrevious conversation: {:?}\n\n\
         The user's intent was unclear. Try again to determine what they want to do.\n\n\
         Respond with JSON only:\n\
         {{\"intent\": \"function_name_or_ask_for_clarification\", \
         \"clarification_question\": \"What would you like me to help you with?\", \
         \"confidence\": 0.5}}",
        schema_text(schemas),
        user_input,
        history
    )
}

pub fn question_prompt(schema: &FunctionSchema, missing: &[String]) -> String {
    let definitions: Parameters = missing
        .iter()
        .map(|name| {
            let spec = schema
                .parameter(name)
                .and_then(|spec| serde_json::to_value(spec).ok())
                .unwrap_or_else(|| serde_json::json!({}));
            (name.clone(), spec)
        })
        .collect();

    format!(
        "Function: {} - {}\nMissing parameters: {:?}\nParameter definitions: {}\n\n\
         Write one friendly, specific question asking the user for these parameters.\n\
         Return only the question text.",
        schema.name,
        schema.description,
        missing,
        to_pretty(&definitions)
    )
}

fn to_pretty<T: serde::Serialize>(value: &T) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "{}".to_string())
}

/// Parse the outermost `{...}` in a model reply
///
/// Models like to wrap JSON in prose or code fences, so everything outside
/// the first `{` and the last `}` is ignored.
pub fn parse_json_reply<T: DeserializeOwned>(reply: &str) -> Result<T> {
    let start = reply
        .find('{')
        .ok_or_else(|| Error::InvalidResponse("no JSON object in reply".to_string()))?;
    let end = reply
        .rfind('}')
        .filter(|&end| end > start)
        .ok_or_else(|| Error::InvalidResponse("unterminated JSON object in reply".to_string()))?;

    serde_json::from_str(&reply[start..=end]).map_err(|e| Error::InvalidResponse(e.to_string()))
}

// =============================================================================
// Suggester
// =============================================================================

/// [`Suggester`] that asks a text generator
pub struct ModelSuggester<G> {
    generator: G,
    fallback: Option<Arc<dyn Suggester>>,
}

impl<G: TextGenerator> ModelSuggester<G> {
    pub fn new(generator: G) -> Self {
        Self {
            generator,
            fallback: None,
        }
    }

    /// Answer with `fallback` whenever the model fails
    pub fn with_fallback(mut self, fallback: Arc<dyn Suggester>) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn generator(&self) -> &G {
        &self.generator
    }

    async fn ask(&self, request: &SuggesterRequest<'_>) -> Result<SuggesterResponse> {
        let prompt = match *request {
            SuggesterRequest::DetectIntent { schemas, user_input } => intent_prompt(schemas, user_input),
            SuggesterRequest::ExtractParameters { schema, gathered, missing, user_input } => {
                extraction_prompt(schema, gathered, missing, user_input)
            },
            SuggesterRequest::Clarify { schemas, user_input, recent_history } => {
                clarification_prompt(schemas, user_input, recent_history)
            },
            SuggesterRequest::GenerateQuestion { schema, missing } => question_prompt(schema, missing),
        };

        let reply = self.generator.generate(&prompt).await?;

        match request.kind() {
            TaskKind::DetectIntent => parse_json_reply::<IntentSuggestion>(&reply).map(SuggesterResponse::Intent),
            TaskKind::ExtractParameters => {
                parse_json_reply::<ParameterUpdate>(&reply).map(SuggesterResponse::Parameters)
            },
            TaskKind::Clarify => {
                parse_json_reply::<ClarificationSuggestion>(&reply).map(SuggesterResponse::Clarification)
            },
            TaskKind::GenerateQuestion => {
                let question = reply.trim();
                if question.is_empty() {
                    Err(Error::InvalidResponse("empty question".to_string()))
                } else {
                    Ok(SuggesterResponse::Question(question.to_string()))
                }
            },
        }
    }
}

/// Neutral answer for a task whose backend failed
fn degraded(request: &SuggesterRequest<'_>) -> SuggesterResponse {
    match *request {
        SuggesterRequest::DetectIntent { .. } => SuggesterResponse::Intent(IntentSuggestion::unknown()),
        SuggesterRequest::ExtractParameters { missing, .. } => {
            SuggesterResponse::Parameters(ParameterUpdate::none(missing))
        },
        SuggesterRequest::Clarify { .. } => SuggesterResponse::Clarification(ClarificationSuggestion::ask_again()),
        SuggesterRequest::GenerateQuestion { missing, .. } => {
            SuggesterResponse::Question(response::batch_question(missing, missing.len().min(2)))
        },
    }
}

#[async_trait]
impl<G: TextGenerator> Suggester for ModelSuggester<G> {
    async fn suggest(&self, request: SuggesterRequest<'_>) -> Result<SuggesterResponse> {
        match self.ask(&request).await {
            Ok(response) => Ok(response),
            Err(e) => {
                tracing::warn!(
                    model = self.generator.model_name(),
                    task = request.kind().as_str(),
                    error = %e,
                    "Model suggestion failed, degrading"
                );
                match &self.fallback {
                    Some(fallback) => fallback.suggest(request).await,
                    None => Ok(degraded(&request)),
                }
            },
        }
    }

    fn name(&self) -> &str {
        self.generator.model_name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use slot_agent_config::FunctionsConfig;
    use std::sync::Mutex;

    /// Returns a fixed reply and keeps the last prompt
    struct Canned {
        reply: Result<String>,
        last_prompt: Mutex<String>,
    }

    impl Canned {
        fn ok(reply: &str) -> Self {
            Self {
                reply: Ok(reply.to_string()),
                last_prompt: Mutex::new(String::new()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: Err(Error::Suggester("connection refused".to_string())),
                last_prompt: Mutex::new(String::new()),
            }
        }
    }

    #[async_trait]
    impl TextGenerator for Canned {
        async fn generate(&self, prompt: &str) -> Result<String> {
            *self.last_prompt.lock().unwrap() = prompt.to_string();
            match &self.reply {
                Ok(reply) => Ok(reply.clone()),
                Err(e) => Err(Error::Suggester(e.to_string())),
            }
        }

        fn model_name(&self) -> &str {
            "canned"
        }
    }

    struct AlwaysWeather;

    #[async_trait]
    impl Suggester for AlwaysWeather {
        async fn suggest(&self, _request: SuggesterRequest<'_>) -> Result<SuggesterResponse> {
            Ok(SuggesterResponse::Intent(IntentSuggestion {
                intent: "check_weather".to_string(),
                extracted_parameters: Parameters::new(),
                confidence: 0.9,
                reasoning: "fallback".to_string(),
            }))
        }
    }

    fn schemas() -> SchemaSet {
        FunctionsConfig::builtin().schemas()
    }

    #[test]
    fn test_parse_json_inside_prose() {
        let reply = "Sure! ```json\n{\"intent\": \"send_email\", \"confidence\": 0.85}\n``` Hope that helps.";
        let suggestion: IntentSuggestion = parse_json_reply(reply).unwrap();
        assert_eq!(suggestion.intent, "send_email");
        assert!(suggestion.extracted_parameters.is_empty());

        assert!(parse_json_reply::<IntentSuggestion>("no json here").is_err());
        assert!(parse_json_reply::<IntentSuggestion>("} backwards {").is_err());
    }

    #[test]
    fn test_prompts_carry_context() {
        let schemas = schemas();
        let prompt = intent_prompt(&schemas, "book a table");
        assert!(prompt.contains("Function: book_restaurant"));
        assert!(prompt.contains("User input: \"book a table\""));

        let schema = schemas.get("create_client").unwrap();
        let gathered: Parameters = serde_json::from_value(json!({"client_name": "Ana Lopez"})).unwrap();
        let missing = vec!["phone_number".to_string(), "address".to_string()];
        let prompt = extraction_prompt(schema, &gathered, &missing, "555 123 4567");
        assert!(prompt.contains("\"client_name\": \"Ana Lopez\""));
        assert!(prompt.contains("Missing parameters: [\"phone_number\", \"address\"]"));

        let history = vec![Turn::user("hmm"), Turn::assistant("Could you clarify?")];
        let prompt = clarification_prompt(&schemas, "the weather", &history);
        assert!(prompt.contains("user: hmm"));
        assert!(prompt.contains("assistant: Could you clarify?"));
    }

    #[tokio::test]
    async fn test_well_formed_reply() {
        let schemas = schemas();
        let suggester = ModelSuggester::new(Canned::ok(
            r#"{"intent": "check_weather", "extracted_parameters": {"location": "Paris"}, "confidence": 0.92}"#,
        ));
        let suggestion = suggester
            .suggest(SuggesterRequest::DetectIntent { schemas: &schemas, user_input: "weather in Paris" })
            .await
            .and_then(SuggesterResponse::into_intent)
            .unwrap();
        assert_eq!(suggestion.intent, "check_weather");
        assert_eq!(suggestion.extracted_parameters["location"], json!("Paris"));
        assert_eq!(suggester.name(), "canned");
    }

    #[tokio::test]
    async fn test_malformed_reply_degrades_to_unknown() {
        let schemas = schemas();
        let suggester = ModelSuggester::new(Canned::ok("I think they want the weather"));
        let suggestion = suggester
            .suggest(SuggesterRequest::DetectIntent { schemas: &schemas, user_input: "weather?" })
            .await
            .and_then(SuggesterResponse::into_intent)
            .unwrap();
        assert!(suggestion.is_unknown());
        assert_eq!(suggestion.confidence, 0.3);
    }

    #[tokio::test]
    async fn test_generator_failure_updates_nothing() {
        let schemas = schemas();
        let schema = schemas.get("create_client").unwrap();
        let missing = vec!["address".to_string()];
        let suggester = ModelSuggester::new(Canned::failing());
        let update = suggester
            .suggest(SuggesterRequest::ExtractParameters {
                schema,
                gathered: &Parameters::new(),
                missing: &missing,
                user_input: "1 Main St",
            })
            .await
            .and_then(SuggesterResponse::into_parameters)
            .unwrap();
        assert!(update.updated_parameters.is_empty());
        assert_eq!(update.still_missing, missing);
    }

    #[tokio::test]
    async fn test_question_degrades_to_table() {
        let schemas = schemas();
        let schema = schemas.get("create_client").unwrap();
        let missing = vec!["phone_number".to_string()];
        let suggester = ModelSuggester::new(Canned::ok("   "));
        let question = suggester
            .suggest(SuggesterRequest::GenerateQuestion { schema, missing: &missing })
            .await
            .and_then(SuggesterResponse::into_question)
            .unwrap();
        assert_eq!(question, "What is the client's phone number?");
        assert!(suggester.generator().last_prompt.lock().unwrap().contains("phone_number"));
    }

    #[tokio::test]
    async fn test_fallback_answers_on_failure() {
        let schemas = schemas();
        let suggester = ModelSuggester::new(Canned::failing()).with_fallback(Arc::new(AlwaysWeather));
        let suggestion = suggester
            .suggest(SuggesterRequest::DetectIntent { schemas: &schemas, user_input: "rain?" })
            .await
            .and_then(SuggesterResponse::into_intent)
            .unwrap();
        assert_eq!(suggestion.intent, "check_weather");
        assert_eq!(suggestion.reasoning, "fallback");
    }
}
