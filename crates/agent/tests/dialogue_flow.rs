//! Integration tests for full dialogues (detect -> gather -> ready)
//!
//! These drive the public session and engine APIs the way a caller would,
//! using transcribed, disfluent replies.

use std::io::Write;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;

use slot_agent_agent::{
    response, AgentSession, DialogueEngine, ModelSuggester, RuleBasedSuggester, TextGenerator,
};
use slot_agent_config::{FunctionsConfig, Settings};
use slot_agent_core::{ConversationContext, ConversationState, Error, Result};

fn rule_based_session() -> AgentSession {
    AgentSession::from_settings(&FunctionsConfig::builtin(), &Settings::default()).unwrap()
}

/// Test a complete client creation from spoken-style replies
#[tokio::test]
async fn test_create_client_end_to_end() {
    let mut session = rule_based_session();

    let outcome = session.process_message("I'd like to add a new client").await;
    assert_eq!(outcome.state, ConversationState::GatheringParams);
    assert_eq!(outcome.intent.as_deref(), Some("create_client"));
    assert_eq!(outcome.response, "What is the client's full name?");

    let outcome = session.process_message("ehh, it's david, david rozovsky").await;
    assert_eq!(outcome.state, ConversationState::GatheringParams);
    assert_eq!(outcome.parameters["client_name"], json!("david rozovsky"));
    assert_eq!(outcome.response, "What is the client's phone number?");

    let outcome = session.process_message("seven one 8 92 four 71 88").await;
    assert_eq!(outcome.parameters["phone_number"], json!("(718) 924-7188"));
    assert_eq!(outcome.response, "What is the client's address?");

    let outcome = session
        .process_message(
            "address is eight eight eight... no sorry... eight zero eight state street... santa barbara... ca... nine three one zero one",
        )
        .await;
    assert!(outcome.ready_to_execute, "address should complete the call");
    assert_eq!(outcome.state, ConversationState::ReadyToExecute);
    assert_eq!(
        outcome.parameters["address"],
        json!("808 state street, santa barbara, CA 93101")
    );
    assert!(outcome.response.starts_with("Ready to execute: create_client"));

    // The session starts over once the call is complete
    assert_eq!(session.context().state, ConversationState::DetectingIntent);
    assert!(session.context().gathered_parameters.is_empty());
}

/// Test that a reply with nothing usable keeps asking for the same parameter
#[tokio::test]
async fn test_unusable_reply_repeats_question() {
    let mut session = rule_based_session();
    session.process_message("create a new client").await;

    let outcome = session.process_message("hmm 42").await;
    assert_eq!(outcome.state, ConversationState::GatheringParams);
    assert!(outcome.parameters.is_empty());
    assert_eq!(outcome.response, "What is the client's full name?");
}

/// Test that an inline email completes send_email on the first turn
#[tokio::test]
async fn test_inline_parameters_complete_immediately() {
    let mut session = rule_based_session();
    let outcome = session.process_message("send email to ana.lee@example.com").await;

    assert!(outcome.ready_to_execute);
    assert_eq!(outcome.intent.as_deref(), Some("send_email"));
    assert_eq!(outcome.parameters["email"], json!("ana.lee@example.com"));
}

/// Test the clarification loop and recovery
#[tokio::test]
async fn test_clarification_then_recovery() {
    let mut session = rule_based_session();

    let outcome = session.process_message("hello there").await;
    assert_eq!(outcome.state, ConversationState::ClarificationNeeded);
    assert_eq!(outcome.response, response::CLARIFICATION_PROMPT);

    let outcome = session.process_message("not sure").await;
    assert_eq!(outcome.state, ConversationState::ClarificationNeeded);

    let outcome = session.process_message("I want the weather forecast").await;
    assert_eq!(outcome.state, ConversationState::GatheringParams);
    assert_eq!(outcome.intent.as_deref(), Some("check_weather"));
    assert_eq!(outcome.response, "Which city would you like to check the weather for?");
}

/// Test that functions loaded from YAML drive the dialogue, including explicit categories
#[tokio::test]
async fn test_functions_from_yaml_file() {
    let yaml = r#"
functions:
  - name: schedule_callback
    description: Schedule a call back to the customer
    parameters:
      callback_number:
        type: string
        description: Number to call back
        category: phone
    required: [callback_number]
    keywords: [call me back, callback]
"#;
    let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();

    let functions = FunctionsConfig::load(file.path()).unwrap();
    let mut session = AgentSession::from_settings(&functions, &Settings::default()).unwrap();

    let outcome = session.process_message("could you call me back later").await;
    assert_eq!(outcome.state, ConversationState::GatheringParams);
    assert_eq!(outcome.intent.as_deref(), Some("schedule_callback"));

    let outcome = session.process_message("sure, it's 212-555-0123").await;
    assert!(outcome.ready_to_execute);
    assert_eq!(outcome.parameters["callback_number"], json!("(212) 555-0123"));
}

/// Test that invalid function files fail fast
#[test]
fn test_invalid_functions_are_rejected() {
    let json = r#"{"functions": [{"name": "ping", "parameters": {}, "required": ["host"]}]}"#;
    let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
    file.write_all(json.as_bytes()).unwrap();

    assert!(FunctionsConfig::load(file.path()).is_err());
}

// =============================================================================
// Model-backed dialogues
// =============================================================================

/// Replays replies in order and records every prompt
struct ScriptedGenerator {
    replies: Mutex<Vec<Result<String>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedGenerator {
    fn new(replies: Vec<Result<String>>) -> Self {
        let mut replies = replies;
        replies.reverse();
        Self {
            replies: Mutex::new(replies),
            prompts: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop()
            .unwrap_or_else(|| Err(Error::Suggester("no more replies".to_string())))
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

fn model_engine(generator: ScriptedGenerator) -> DialogueEngine {
    let settings = Settings::default();
    DialogueEngine::new(
        FunctionsConfig::builtin().schemas(),
        Arc::new(ModelSuggester::new(generator)),
        settings.dialogue,
    )
}

/// Test that garbage model output never reaches the user
#[tokio::test]
async fn test_malformed_model_output_degrades() {
    let engine = model_engine(ScriptedGenerator::new(vec![
        Ok("Sure, I can help with that!".to_string()),
        Err(Error::Suggester("timeout".to_string())),
    ]));

    let context = engine.advance(ConversationContext::new(), "create a client").await;
    assert_eq!(context.state, ConversationState::ClarificationNeeded);
    assert_eq!(context.confidence, 0.3);
    assert_eq!(engine.respond(&context).await, response::CLARIFICATION_PROMPT);

    let context = engine.advance(context, "a client please").await;
    assert_eq!(context.state, ConversationState::ClarificationNeeded);
    assert_eq!(context.history.len(), 2);
}

/// Test that the engine, not the model, decides when a call is complete
#[tokio::test]
async fn test_model_claims_are_checked_against_schema() {
    let engine = model_engine(ScriptedGenerator::new(vec![
        Ok(r#"{"intent": "create_client", "extracted_parameters": {"client_name": "Ana Lopez"}, "confidence": 0.9, "reasoning": "asked for a client"}"#.to_string()),
        Ok(r#"{"updated_parameters": {"phone_number": "(212) 555-0123"}, "still_missing": [], "ready_to_execute": true}"#.to_string()),
        Ok(r#"{"updated_parameters": {"address": "1 Main St, Springfield, IL 62701"}, "still_missing": [], "ready_to_execute": false}"#.to_string()),
    ]));

    let context = engine
        .advance(ConversationContext::new(), "new client called Ana Lopez")
        .await;
    assert_eq!(context.state, ConversationState::GatheringParams);
    assert_eq!(context.missing_parameters, vec!["phone_number", "address"]);

    let context = engine.advance(context, "212 555 0123").await;
    assert_eq!(context.state, ConversationState::GatheringParams, "address is still missing");
    assert_eq!(context.missing_parameters, vec!["address"]);

    let context = engine.advance(context, "1 Main St, Springfield").await;
    assert_eq!(context.state, ConversationState::ReadyToExecute);
    assert_eq!(context.gathered_parameters.len(), 3);
}

/// Test that a model cannot overwrite gathered slots or invent new ones
#[tokio::test]
async fn test_model_extra_keys_are_ignored() {
    let engine = model_engine(ScriptedGenerator::new(vec![
        Ok(r#"{"intent": "create_client", "extracted_parameters": {"client_name": "Ana Lopez", "vip": true}, "confidence": 0.9, "reasoning": "new client"}"#.to_string()),
        Ok(r#"{"updated_parameters": {"client_name": "Someone Else", "phone_number": "(212) 555-0123", "bogus": 1}, "still_missing": [], "ready_to_execute": true}"#.to_string()),
    ]));

    let context = engine
        .advance(ConversationContext::new(), "new client called Ana Lopez")
        .await;
    assert!(!context.gathered_parameters.contains_key("vip"));
    assert_eq!(context.missing_parameters, vec!["phone_number", "address"]);

    let context = engine.advance(context, "212 555 0123").await;
    assert_eq!(context.state, ConversationState::GatheringParams);
    assert_eq!(context.gathered_parameters.len(), 2);
    assert_eq!(context.gathered_parameters["client_name"], json!("Ana Lopez"));
    assert_eq!(context.gathered_parameters["phone_number"], json!("(212) 555-0123"));
    assert_eq!(context.missing_parameters, vec!["address"]);
}

/// Test the model path falling back to the rule-based suggester
#[tokio::test]
async fn test_model_with_rule_based_fallback() {
    let functions = FunctionsConfig::builtin();
    let settings = Settings::default();
    let fallback = Arc::new(RuleBasedSuggester::from_settings(&functions, &settings));
    let suggester = ModelSuggester::new(ScriptedGenerator::new(vec![])).with_fallback(fallback);
    let engine = DialogueEngine::new(functions.schemas(), Arc::new(suggester), settings.dialogue);

    let context = engine
        .advance(ConversationContext::new(), "what's the weather in Paris")
        .await;
    assert_eq!(context.state, ConversationState::ReadyToExecute);
    assert_eq!(context.gathered_parameters["location"], json!("Paris"));
}
