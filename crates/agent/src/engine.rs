//! Dialogue state machine
//!
//! `advance` moves a conversation one user turn forward:
//!
//! | state                  | action                                              |
//! |------------------------|-----------------------------------------------------|
//! | `DetectingIntent`      | detect intent, keep inline parameters               |
//! | `GatheringParams`      | fill the first missing parameter from the reply     |
//! | `ClarificationNeeded`  | retry intent detection with recent history          |
//! | `ReadyToExecute`       | terminal, the caller executes and resets            |
//!
//! Missing parameters are always recomputed from the schema, so whatever a
//! backend claims about completeness the context stays consistent. Backend
//! failures never surface to the user; they degrade to "unknown" or "nothing
//! extracted" and the conversation stays where it is.

use std::sync::Arc;

use slot_agent_config::{DialogueConfig, FunctionsConfig, Settings};
use slot_agent_core::{
    ClarificationSuggestion, ConversationContext, ConversationState, Error, FunctionSchema,
    IntentSuggestion, ParameterUpdate, Parameters, SchemaSet, Suggester, SuggesterRequest,
};

use crate::response;
use crate::rule_based::RuleBasedSuggester;
use crate::AgentError;

/// Drives conversations against a fixed schema set
pub struct DialogueEngine {
    schemas: SchemaSet,
    suggester: Arc<dyn Suggester>,
    config: DialogueConfig,
}

impl DialogueEngine {
    pub fn new(schemas: SchemaSet, suggester: Arc<dyn Suggester>, config: DialogueConfig) -> Self {
        Self {
            schemas,
            suggester,
            config,
        }
    }

    /// Engine backed by the rule-based suggester
    pub fn from_settings(functions: &FunctionsConfig, settings: &Settings) -> Result<Self, AgentError> {
        functions.validate()?;
        settings.validate()?;

        let suggester = RuleBasedSuggester::from_settings(functions, settings);
        tracing::info!(
            functions = functions.functions.len(),
            region = %settings.dialogue.phone_region,
            "Dialogue engine initialized"
        );

        Ok(Self::new(
            functions.schemas(),
            Arc::new(suggester),
            settings.dialogue.clone(),
        ))
    }

    pub fn schemas(&self) -> &SchemaSet {
        &self.schemas
    }

    pub fn config(&self) -> &DialogueConfig {
        &self.config
    }

    pub fn suggester_name(&self) -> &str {
        self.suggester.name()
    }

    /// Process one user utterance
    #[tracing::instrument(
        name = "advance",
        skip(self, context, user_text),
        fields(conversation = %context.id, state = %context.state)
    )]
    pub async fn advance(&self, context: ConversationContext, user_text: &str) -> ConversationContext {
        let entry_state = context.state;

        let mut context = match entry_state {
            ConversationState::DetectingIntent => self.detect_intent(context, user_text).await,
            ConversationState::GatheringParams => self.gather_parameters(context, user_text).await,
            ConversationState::ClarificationNeeded => self.clarify(context, user_text).await,
            ConversationState::ReadyToExecute => {
                tracing::debug!("Context is ready to execute, input ignored");
                context
            },
        };
        context.push_user(user_text);

        if context.state != entry_state {
            tracing::info!(
                from = %entry_state,
                to = %context.state,
                intent = ?context.detected_intent,
                missing = ?context.missing_parameters,
                "State transition"
            );
        }

        context
    }

    /// Text to show the user for the context's current state
    pub async fn respond(&self, context: &ConversationContext) -> String {
        match context.state {
            ConversationState::ReadyToExecute => response::confirmation(context),
            ConversationState::GatheringParams => self.parameter_question(context).await,
            ConversationState::ClarificationNeeded => response::CLARIFICATION_PROMPT.to_string(),
            ConversationState::DetectingIntent => response::PROCESSING_MESSAGE.to_string(),
        }
    }

    async fn detect_intent(&self, mut context: ConversationContext, user_text: &str) -> ConversationContext {
        let request = SuggesterRequest::DetectIntent {
            schemas: &self.schemas,
            user_input: user_text,
        };
        let suggestion = match self.suggester.suggest(request).await.and_then(|r| r.into_intent()) {
            Ok(suggestion) => suggestion,
            Err(e) => {
                tracing::warn!(error = %e, "Intent detection failed, treating input as unknown");
                IntentSuggestion::unknown()
            },
        };
        context.confidence = suggestion.confidence;

        if suggestion.is_unknown() || suggestion.confidence <= self.config.acceptance_threshold {
            tracing::debug!(
                intent = %suggestion.intent,
                confidence = suggestion.confidence,
                "Intent not accepted"
            );
            context.state = ConversationState::ClarificationNeeded;
            return context;
        }

        let Some(schema) = self.schemas.get(&suggestion.intent) else {
            tracing::warn!(error = %Error::UnknownFunction(suggestion.intent.clone()), "Suggested intent rejected");
            context.state = ConversationState::ClarificationNeeded;
            return context;
        };

        context.detected_intent = Some(schema.name.clone());
        let (inline, ignored) = split_update(suggestion.extracted_parameters, |name| {
            schema.parameter(name).is_some()
        });
        if !ignored.is_empty() {
            tracing::debug!(ignored = ?ignored, "Dropped undeclared inline parameters");
        }
        context.gathered_parameters = inline;
        context.recompute_missing(schema);
        context.state = next_gathering_state(&context);
        context
    }

    async fn gather_parameters(&self, mut context: ConversationContext, user_text: &str) -> ConversationContext {
        let Some(schema) = self.detected_schema(&context) else {
            tracing::warn!(intent = ?context.detected_intent, "Gathering without a known function");
            context.state = ConversationState::ClarificationNeeded;
            return context;
        };

        context.recompute_missing(schema);
        if context.missing_parameters.is_empty() {
            context.state = ConversationState::ReadyToExecute;
            return context;
        }

        let request = SuggesterRequest::ExtractParameters {
            schema,
            gathered: &context.gathered_parameters,
            missing: &context.missing_parameters,
            user_input: user_text,
        };
        let update = match self.suggester.suggest(request).await.and_then(|r| r.into_parameters()) {
            Ok(update) => update,
            Err(e) => {
                tracing::warn!(error = %e, "Parameter extraction failed, nothing updated");
                ParameterUpdate::none(&context.missing_parameters)
            },
        };

        // One extraction per turn: only the first missing parameter is filled
        let next_missing = context.missing_parameters.first().map(String::as_str);
        let (updates, ignored) = split_update(update.updated_parameters, |name| Some(name) == next_missing);
        if !ignored.is_empty() {
            tracing::debug!(ignored = ?ignored, expected = ?next_missing, "Dropped values outside this turn's parameter");
        }
        if !updates.is_empty() {
            tracing::debug!(parameters = ?updates.keys().collect::<Vec<_>>(), "Parameters gathered");
        }
        context.merge_parameters(updates);
        context.recompute_missing(schema);
        context.state = next_gathering_state(&context);
        context
    }

    async fn clarify(&self, mut context: ConversationContext, user_text: &str) -> ConversationContext {
        let request = SuggesterRequest::Clarify {
            schemas: &self.schemas,
            user_input: user_text,
            recent_history: context.recent_history(self.config.history_window),
        };
        let suggestion = match self.suggester.suggest(request).await.and_then(|r| r.into_clarification()) {
            Ok(suggestion) => suggestion,
            Err(e) => {
                tracing::warn!(error = %e, "Clarification failed, asking again");
                ClarificationSuggestion::ask_again()
            },
        };

        if !suggestion.is_concrete() {
            return context;
        }

        let Some(schema) = self.schemas.get(&suggestion.intent) else {
            tracing::warn!(error = %Error::UnknownFunction(suggestion.intent.clone()), "Clarified intent rejected");
            return context;
        };

        context.detected_intent = Some(schema.name.clone());
        context.confidence = suggestion.confidence;
        context.recompute_missing(schema);
        context.state = ConversationState::GatheringParams;
        context
    }

    async fn parameter_question(&self, context: &ConversationContext) -> String {
        let Some(schema) = self.detected_schema(context) else {
            return response::GENERIC_QUESTION.to_string();
        };

        let batch = self.config.question_batch.clamp(1, 2).min(context.missing_parameters.len());
        let missing = &context.missing_parameters[..batch];
        let request = SuggesterRequest::GenerateQuestion { schema, missing };

        match self.suggester.suggest(request).await.and_then(|r| r.into_question()) {
            Ok(question) if !question.trim().is_empty() => question.trim().to_string(),
            Ok(_) => response::batch_question(missing, batch),
            Err(e) => {
                tracing::warn!(error = %e, "Question generation failed, using default question");
                response::batch_question(missing, batch)
            },
        }
    }

    fn detected_schema(&self, context: &ConversationContext) -> Option<&FunctionSchema> {
        context
            .detected_intent
            .as_deref()
            .and_then(|intent| self.schemas.get(intent))
    }
}

fn next_gathering_state(context: &ConversationContext) -> ConversationState {
    if context.missing_parameters.is_empty() {
        ConversationState::ReadyToExecute
    } else {
        ConversationState::GatheringParams
    }
}

/// A null from a backend means "not found"; it never overwrites a value
/// Split non-null values into those `keep` accepts and the names of the rest
fn split_update(parameters: Parameters, keep: impl Fn(&str) -> bool) -> (Parameters, Vec<String>) {
    let mut kept = Parameters::new();
    let mut ignored = Vec::new();
    for (name, value) in parameters {
        if value.is_null() {
            continue;
        }
        if keep(&name) {
            kept.insert(name, value);
        } else {
            ignored.push(name);
        }
    }
    (kept, ignored)
}
