//! Rule-based suggester
//!
//! Answers every suggester task without a language model: keyword/fuzzy
//! classification for intents, the per-category slot extractors for
//! parameters and a fixed question table for prompts.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

use slot_agent_config::{FunctionsConfig, Settings};
use slot_agent_core::{
    ClarificationSuggestion, FunctionSchema, IntentSuggestion, ParameterUpdate, Parameters,
    Result, SchemaSet, Suggester, SuggesterRequest, SuggesterResponse, Turn, TurnRole,
};
use slot_agent_text_processing::{
    extract_inline, ClassifierConfig, InlineRule, IntentClassifier, SlotExtractor, SlotExtractors,
};

use crate::response;

/// Ordered `(parameter, extractor)` pairs for one gathering turn
///
/// Built from the missing list in schema order; parameters whose category has
/// no extractor are left out and simply stay missing.
pub struct ExtractionPlan<'a> {
    steps: Vec<(&'a str, &'a dyn SlotExtractor)>,
}

impl<'a> ExtractionPlan<'a> {
    pub fn build(schema: &FunctionSchema, missing: &'a [String], extractors: &'a SlotExtractors) -> Self {
        let steps = missing
            .iter()
            .filter_map(|parameter| {
                extractors
                    .get(schema.category_of(parameter))
                    .map(|extractor| (parameter.as_str(), extractor))
            })
            .collect();
        Self { steps }
    }

    /// Parameter the next reply will be read as
    pub fn target(&self) -> Option<&'a str> {
        self.steps.first().map(|(parameter, _)| *parameter)
    }

    /// Run the first step only; one extraction per turn
    pub fn run(&self, text: &str) -> Option<(String, String)> {
        let (parameter, extractor) = self.steps.first()?;
        tracing::debug!(parameter = *parameter, category = %extractor.category(), "Extracting parameter");
        extractor
            .extract(text)
            .map(|value| (parameter.to_string(), value))
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Classifier + extractor backed [`Suggester`]
pub struct RuleBasedSuggester {
    classifier: IntentClassifier,
    extractors: SlotExtractors,
    inline_rules: HashMap<String, Vec<(String, InlineRule)>>,
    question_batch: usize,
}

impl RuleBasedSuggester {
    pub fn new(classifier: IntentClassifier, extractors: SlotExtractors, schemas: &SchemaSet) -> Self {
        let inline_rules = schemas
            .iter()
            .map(|schema| {
                let rules = schema
                    .parameters
                    .keys()
                    .filter_map(|name| {
                        InlineRule::for_parameter(name, schema.category_of(name))
                            .map(|rule| (name.clone(), rule))
                    })
                    .collect();
                (schema.name.clone(), rules)
            })
            .collect();

        Self {
            classifier,
            extractors,
            inline_rules,
            question_batch: 1,
        }
    }

    /// Classifier from the function keywords, standard extractors for the configured region
    pub fn from_settings(functions: &FunctionsConfig, settings: &Settings) -> Self {
        let classifier = IntentClassifier::new(functions.keyword_table(), classifier_config(settings));
        let extractors = SlotExtractors::standard(&settings.dialogue.phone_region);
        Self::new(classifier, extractors, &functions.schemas())
            .with_question_batch(settings.dialogue.question_batch)
    }

    pub fn with_question_batch(mut self, batch: usize) -> Self {
        self.question_batch = batch.clamp(1, 2);
        self
    }

    pub fn classifier(&self) -> &IntentClassifier {
        &self.classifier
    }

    pub fn extractors(&self) -> &SlotExtractors {
        &self.extractors
    }

    fn detect_intent(&self, user_input: &str) -> IntentSuggestion {
        let classification = self.classifier.classify(user_input);
        if classification.is_unknown() {
            return IntentSuggestion {
                confidence: classification.confidence,
                ..IntentSuggestion::unknown()
            };
        }

        let rules = self
            .inline_rules
            .get(&classification.intent)
            .map(Vec::as_slice)
            .unwrap_or_default();
        let extracted_parameters: Parameters = extract_inline(user_input, rules)
            .into_iter()
            .map(|(name, value)| (name, Value::String(value)))
            .collect();

        IntentSuggestion {
            reasoning: format!("Detected '{}' based on keywords", classification.intent),
            intent: classification.intent,
            extracted_parameters,
            confidence: classification.confidence,
        }
    }

    fn extract_parameters(&self, schema: &FunctionSchema, missing: &[String], user_input: &str) -> ParameterUpdate {
        let plan = ExtractionPlan::build(schema, missing, &self.extractors);

        let mut updated_parameters = Parameters::new();
        if let Some((parameter, value)) = plan.run(user_input) {
            updated_parameters.insert(parameter, Value::String(value));
        } else if let Some(parameter) = plan.target() {
            tracing::debug!(parameter, "No value found in reply");
        }

        let still_missing: Vec<String> = missing
            .iter()
            .filter(|parameter| !updated_parameters.contains_key(parameter.as_str()))
            .cloned()
            .collect();

        ParameterUpdate {
            ready_to_execute: still_missing.is_empty(),
            updated_parameters,
            still_missing,
        }
    }

    /// The reply first, then earlier user turns, newest first
    fn clarify(&self, user_input: &str, recent_history: &[Turn]) -> ClarificationSuggestion {
        let earlier = recent_history
            .iter()
            .rev()
            .filter(|turn| turn.role == TurnRole::User)
            .map(|turn| turn.content.as_str());

        std::iter::once(user_input)
            .chain(earlier)
            .map(|text| self.classifier.classify(text))
            .find(|classification| !classification.is_unknown())
            .map(|classification| ClarificationSuggestion {
                intent: classification.intent,
                clarification_question: None,
                confidence: classification.confidence,
            })
            .unwrap_or_else(|| ClarificationSuggestion {
                clarification_question: Some(response::CLARIFICATION_PROMPT.to_string()),
                ..ClarificationSuggestion::ask_again()
            })
    }
}

#[async_trait]
impl Suggester for RuleBasedSuggester {
    async fn suggest(&self, request: SuggesterRequest<'_>) -> Result<SuggesterResponse> {
        let response = match request {
            SuggesterRequest::DetectIntent { user_input, .. } => {
                SuggesterResponse::Intent(self.detect_intent(user_input))
            },
            SuggesterRequest::ExtractParameters { schema, missing, user_input, .. } => {
                SuggesterResponse::Parameters(self.extract_parameters(schema, missing, user_input))
            },
            SuggesterRequest::Clarify { user_input, recent_history, .. } => {
                SuggesterResponse::Clarification(self.clarify(user_input, recent_history))
            },
            SuggesterRequest::GenerateQuestion { missing, .. } => {
                SuggesterResponse::Question(response::batch_question(missing, self.question_batch))
            },
        };
        Ok(response)
    }

    fn name(&self) -> &str {
        "rule_based"
    }
}

/// Classifier thresholds from the settings file
pub fn classifier_config(settings: &Settings) -> ClassifierConfig {
    let c = &settings.classifier;
    ClassifierConfig {
        exact_whole_confidence: c.exact_whole_confidence,
        exact_partial_confidence: c.exact_partial_confidence,
        phrase_threshold: c.phrase_threshold,
        phrase_weight: c.phrase_weight,
        word_threshold: c.word_threshold,
        word_weight: c.word_weight,
        unknown_confidence: c.unknown_confidence,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slot_agent_core::{SlotCategory, UNKNOWN_INTENT};

    fn suggester() -> RuleBasedSuggester {
        RuleBasedSuggester::from_settings(&FunctionsConfig::builtin(), &Settings::default())
    }

    fn create_client() -> FunctionSchema {
        FunctionsConfig::builtin().schemas().get("create_client").unwrap().clone()
    }

    #[tokio::test]
    async fn test_detect_with_inline_parameters() {
        let schemas = FunctionsConfig::builtin().schemas();
        let response = suggester()
            .suggest(SuggesterRequest::DetectIntent {
                schemas: &schemas,
                user_input: "create a new client, email ana@example.com",
            })
            .await
            .unwrap()
            .into_intent()
            .unwrap();

        assert_eq!(response.intent, "create_client");
        assert_eq!(response.confidence, 0.8);
        assert_eq!(
            response.extracted_parameters.get("email"),
            Some(&Value::String("ana@example.com".to_string()))
        );
        assert!(!response.extracted_parameters.contains_key("client_name"));
    }

    #[tokio::test]
    async fn test_unknown_intent() {
        let schemas = FunctionsConfig::builtin().schemas();
        let response = suggester()
            .suggest(SuggesterRequest::DetectIntent { schemas: &schemas, user_input: "hello there" })
            .await
            .unwrap()
            .into_intent()
            .unwrap();
        assert_eq!(response.intent, UNKNOWN_INTENT);
        assert_eq!(response.confidence, 0.3);
        assert!(response.extracted_parameters.is_empty());
    }

    #[test]
    fn test_plan_skips_unsupported_categories() {
        let schema = FunctionSchema::new("book", "Book a table")
            .with_required("party_size")
            .with_required("client_name");
        let missing = vec!["party_size".to_string(), "client_name".to_string()];
        let extractors = SlotExtractors::standard("US");

        let plan = ExtractionPlan::build(&schema, &missing, &extractors);
        assert_eq!(plan.len(), 1);
        assert_eq!(plan.target(), Some("client_name"));
        assert_eq!(schema.category_of("client_name"), SlotCategory::Name);
    }

    #[test]
    fn test_only_first_missing_parameter_is_extracted() {
        let missing = vec!["client_name".to_string(), "phone_number".to_string(), "address".to_string()];
        // The reply carries a phone number, but the name comes first
        let update = suggester().extract_parameters(&create_client(), &missing, "212-555-0123");
        assert!(update.updated_parameters.is_empty());
        assert_eq!(update.still_missing, missing);
        assert!(!update.ready_to_execute);

        let update = suggester().extract_parameters(&create_client(), &missing[1..], "212-555-0123");
        assert_eq!(
            update.updated_parameters.get("phone_number"),
            Some(&Value::String("(212) 555-0123".to_string()))
        );
        assert_eq!(update.still_missing, vec!["address".to_string()]);
    }

    #[test]
    fn test_clarify_falls_back_to_history() {
        let history = vec![Turn::user("I want to check the forecast"), Turn::assistant("Sorry?")];
        let suggestion = suggester().clarify("yes please", &history);
        assert_eq!(suggestion.intent, "check_weather");
        assert!(suggestion.is_concrete());

        let suggestion = suggester().clarify("yes please", &[]);
        assert!(!suggestion.is_concrete());
        assert!(suggestion.clarification_question.is_some());
    }

    #[tokio::test]
    async fn test_question_batches() {
        let schema = create_client();
        let missing = vec!["phone_number".to_string(), "address".to_string()];
        let single = suggester()
            .suggest(SuggesterRequest::GenerateQuestion { schema: &schema, missing: &missing })
            .await
            .unwrap()
            .into_question()
            .unwrap();
        assert_eq!(single, "What is the client's phone number?");

        let batched = suggester()
            .with_question_batch(2)
            .suggest(SuggesterRequest::GenerateQuestion { schema: &schema, missing: &missing })
            .await
            .unwrap()
            .into_question()
            .unwrap();
        assert_eq!(batched, "What is the client's phone number? What is the client's address?");
    }
}
