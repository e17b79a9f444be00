//! User-facing text for each dialogue state

use slot_agent_core::{ConversationContext, Parameters};

pub const CLARIFICATION_PROMPT: &str =
    "I'm not sure what you'd like me to help you with. Could you please clarify what function you want to use?";

pub const PROCESSING_MESSAGE: &str = "I'm processing your request...";

pub const GENERIC_QUESTION: &str = "Could you provide more details?";

/// Question asking for a single parameter
pub fn parameter_question(parameter: &str) -> &'static str {
    match parameter {
        "client_name" => "What is the client's full name?",
        "phone_number" => "What is the client's phone number?",
        "address" => "What is the client's address?",
        "email" => "What is the client's email address? (optional)",
        "location" => "Which city would you like to check the weather for?",
        "restaurant_name" => "Which restaurant would you like to book?",
        "date" => "What date would you like?",
        "time" => "What time would you like?",
        "party_size" => "How many people will be dining?",
        _ => GENERIC_QUESTION,
    }
}

/// Questions for the first `batch` missing parameters, joined into one prompt
pub fn batch_question(missing: &[String], batch: usize) -> String {
    let mut questions: Vec<&str> = Vec::new();
    for parameter in missing.iter().take(batch.max(1)) {
        let question = parameter_question(parameter);
        if !questions.contains(&question) {
            questions.push(question);
        }
    }

    if questions.is_empty() {
        GENERIC_QUESTION.to_string()
    } else {
        questions.join(" ")
    }
}

/// Confirmation shown once every required parameter is present
pub fn confirmation(context: &ConversationContext) -> String {
    format!(
        "Ready to execute: {}\nParameters: {}\nConfidence: {}",
        context.detected_intent.as_deref().unwrap_or_default(),
        pretty_parameters(&context.gathered_parameters),
        context.confidence
    )
}

pub fn pretty_parameters(parameters: &Parameters) -> String {
    serde_json::to_string_pretty(parameters).unwrap_or_else(|_| "{}".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use slot_agent_core::ConversationState;

    #[test]
    fn test_known_parameters_have_questions() {
        assert_eq!(parameter_question("client_name"), "What is the client's full name?");
        assert_eq!(parameter_question("party_size"), "How many people will be dining?");
        assert_eq!(parameter_question("favourite_colour"), GENERIC_QUESTION);
    }

    #[test]
    fn test_batch_question() {
        let missing = vec!["phone_number".to_string(), "address".to_string()];
        assert_eq!(batch_question(&missing, 1), "What is the client's phone number?");
        assert_eq!(
            batch_question(&missing, 2),
            "What is the client's phone number? What is the client's address?"
        );
        assert_eq!(batch_question(&[], 2), GENERIC_QUESTION);
    }

    #[test]
    fn test_generic_questions_are_not_repeated() {
        let missing = vec!["color".to_string(), "size".to_string()];
        assert_eq!(batch_question(&missing, 2), GENERIC_QUESTION);
    }

    #[test]
    fn test_confirmation_lists_parameters() {
        let mut context = ConversationContext::new();
        context.state = ConversationState::ReadyToExecute;
        context.detected_intent = Some("check_weather".to_string());
        context.confidence = 0.8;
        context
            .gathered_parameters
            .insert("location".to_string(), serde_json::json!("Paris"));

        let text = confirmation(&context);
        assert!(text.starts_with("Ready to execute: check_weather\nParameters: {"));
        assert!(text.contains("\"location\": \"Paris\""));
        assert!(text.ends_with("Confidence: 0.8"));
    }
}
