//! Agent profile: the user-facing text of the interactive session

use serde::{Deserialize, Serialize};

/// Display name, banner text and session controls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentProfile {
    #[serde(default = "default_agent_name")]
    pub name: String,

    #[serde(default = "default_description")]
    pub description: String,

    /// Shown once before the first prompt
    #[serde(default = "default_instructions")]
    pub instructions: String,

    #[serde(default = "default_goodbye")]
    pub goodbye_message: String,

    /// Inputs (compared lowercased) that end the session
    #[serde(default = "default_exit_commands")]
    pub exit_commands: Vec<String>,

    /// Print detected intent and parameters after each reply
    #[serde(default)]
    pub debug: bool,
}

fn default_agent_name() -> String {
    "Assistant".to_string()
}

fn default_description() -> String {
    "I can help you run a few common tasks by asking for the details they need.".to_string()
}

fn default_instructions() -> String {
    "Tell me what you would like to do. Type 'quit' to exit.".to_string()
}

fn default_goodbye() -> String {
    "Goodbye!".to_string()
}

fn default_exit_commands() -> Vec<String> {
    ["quit", "exit", "bye"].iter().map(|s| s.to_string()).collect()
}

impl Default for AgentProfile {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            description: default_description(),
            instructions: default_instructions(),
            goodbye_message: default_goodbye(),
            exit_commands: default_exit_commands(),
            debug: false,
        }
    }
}

impl AgentProfile {
    /// True if `input` is one of the exit commands
    pub fn is_exit_command(&self, input: &str) -> bool {
        let input = input.trim().to_lowercase();
        self.exit_commands.iter().any(|cmd| cmd.to_lowercase() == input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_commands_are_case_insensitive() {
        let profile = AgentProfile::default();
        assert!(profile.is_exit_command("QUIT"));
        assert!(profile.is_exit_command("  bye "));
        assert!(!profile.is_exit_command("create a client"));
    }
}
