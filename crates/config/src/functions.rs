//! Function schema configuration
//!
//! Functions are declared in a JSON or YAML file:
//!
//! ```yaml
//! functions:
//!   - name: check_weather
//!     description: Look up the forecast for a city
//!     parameters:
//!       location: { type: string, description: City name }
//!     required: [location]
//!     keywords: [weather, forecast]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use slot_agent_core::{FunctionSchema, ParameterSpec, SchemaSet};

use crate::ConfigError;

/// One callable function plus the phrases that trigger it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterSpec>,
    #[serde(default)]
    pub required: Vec<String>,
    /// Classifier trigger phrases; the name with spaces is used when empty
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl FunctionConfig {
    pub fn to_schema(&self) -> FunctionSchema {
        FunctionSchema {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self.parameters.clone(),
            required: self.required.clone(),
        }
    }

    /// Lowercased trigger phrases
    pub fn trigger_phrases(&self) -> Vec<String> {
        if self.keywords.is_empty() {
            return vec![self.name.replace('_', " ").to_lowercase()];
        }
        self.keywords
            .iter()
            .map(|k| k.trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect()
    }
}

/// The full set of functions an agent can fill
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionsConfig {
    pub functions: Vec<FunctionConfig>,
}

impl Default for FunctionsConfig {
    fn default() -> Self {
        Self::builtin()
    }
}

impl FunctionsConfig {
    /// Load from a JSON or YAML file, chosen by extension
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::FileNotFound(format!("{}: {}", path.display(), e))
        })?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase());

        let config: Self = match extension.as_deref() {
            Some("json") => {
                serde_json::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?
            },
            Some("yaml") | Some("yml") => {
                serde_yaml::from_str(&content).map_err(|e| ConfigError::ParseError(e.to_string()))?
            },
            _ => {
                return Err(ConfigError::ParseError(format!(
                    "Unsupported schema file extension: {}",
                    path.display()
                )))
            },
        };

        config.validate()?;
        tracing::debug!(path = %path.display(), count = config.functions.len(), "Function schemas loaded");
        Ok(config)
    }

    /// Load from `path` when given, otherwise use the built-in set
    pub fn load_or_builtin(path: Option<&str>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::builtin()),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.functions.is_empty() {
            return Err(ConfigError::MissingField("functions".to_string()));
        }

        let mut seen = HashSet::new();
        for function in &self.functions {
            if function.name.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "functions.name".to_string(),
                    message: "Function name must not be empty".to_string(),
                });
            }
            if !seen.insert(function.name.as_str()) {
                return Err(ConfigError::DuplicateFunction(function.name.clone()));
            }
            for required in &function.required {
                if !function.parameters.contains_key(required) {
                    return Err(ConfigError::InvalidValue {
                        field: format!("functions.{}.required", function.name),
                        message: format!("Required parameter '{}' is not declared", required),
                    });
                }
            }
        }

        Ok(())
    }

    pub fn schemas(&self) -> SchemaSet {
        SchemaSet::new(self.functions.iter().map(FunctionConfig::to_schema).collect())
    }

    /// (intent, trigger phrases) pairs in declaration order
    pub fn keyword_table(&self) -> Vec<(String, Vec<String>)> {
        self.functions
            .iter()
            .map(|f| (f.name.clone(), f.trigger_phrases()))
            .collect()
    }

    /// The demo function set
    pub fn builtin() -> Self {
        fn param(kind: &str, description: &str) -> ParameterSpec {
            ParameterSpec::new(kind, description)
        }
        fn strings(items: &[&str]) -> Vec<String> {
            items.iter().map(|s| s.to_string()).collect()
        }

        let create_client = FunctionConfig {
            name: "create_client".to_string(),
            description: "Create a new client record".to_string(),
            parameters: BTreeMap::from([
                ("client_name".to_string(), param("string", "Client's full name")),
                ("phone_number".to_string(), param("string", "Client's phone number")),
                ("address".to_string(), param("string", "Client's mailing address")),
                ("email".to_string(), param("string", "Client's email address")),
            ]),
            required: strings(&["client_name", "phone_number", "address"]),
            keywords: strings(&[
                "create client",
                "new client",
                "add client",
                "register client",
                "create a client",
                "add a new client",
                "add a client",
                "create new client",
                "i'd like to add a client",
                "want to add a client",
                "need to add a client",
                "register a new client",
                "client to the database",
                "client profile",
                "client account",
                "client",
                "customer",
                "add customer",
                "new customer",
                "create customer",
                "register customer",
                "creat client",
                "crete client",
                "make client",
                "setup client",
            ]),
        };

        let book_restaurant = FunctionConfig {
            name: "book_restaurant".to_string(),
            description: "Book a table at a restaurant".to_string(),
            parameters: BTreeMap::from([
                ("restaurant_name".to_string(), param("string", "Restaurant to book")),
                ("date".to_string(), param("string", "Reservation date")),
                ("time".to_string(), param("string", "Reservation time")),
                ("party_size".to_string(), param("integer", "Number of guests")),
            ]),
            required: strings(&["restaurant_name", "date", "time", "party_size"]),
            keywords: strings(&["book", "reservation", "table", "restaurant", "dining", "reserve"]),
        };

        let check_weather = FunctionConfig {
            name: "check_weather".to_string(),
            description: "Check the weather forecast for a city".to_string(),
            parameters: BTreeMap::from([(
                "location".to_string(),
                param("string", "City to check"),
            )]),
            required: strings(&["location"]),
            keywords: strings(&["weather", "temperature", "forecast", "rain", "sunny", "climate"]),
        };

        let send_email = FunctionConfig {
            name: "send_email".to_string(),
            description: "Send an email message".to_string(),
            parameters: BTreeMap::from([
                ("email".to_string(), param("string", "Recipient email address")),
                ("subject".to_string(), param("string", "Subject line")),
                ("body".to_string(), param("string", "Message body")),
            ]),
            required: strings(&["email"]),
            keywords: strings(&["email", "send message", "mail", "send email", "message", "send mail"]),
        };

        Self {
            functions: vec![create_client, book_restaurant, check_weather, send_email],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(suffix: &str, content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(suffix).tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_builtin_set_is_valid() {
        let config = FunctionsConfig::builtin();
        assert!(config.validate().is_ok());
        let schemas = config.schemas();
        assert_eq!(
            schemas.names().collect::<Vec<_>>(),
            vec!["create_client", "book_restaurant", "check_weather", "send_email"]
        );
        let client = schemas.get("create_client").unwrap();
        assert_eq!(client.required, vec!["client_name", "phone_number", "address"]);
    }

    #[test]
    fn test_load_yaml() {
        let file = write_temp(
            ".yaml",
            r#"
functions:
  - name: check_weather
    description: Forecast lookup
    parameters:
      location:
        type: string
        description: City
    required: [location]
    keywords: [Weather, forecast]
"#,
        );
        let config = FunctionsConfig::load(file.path()).unwrap();
        assert_eq!(config.functions.len(), 1);
        assert_eq!(
            config.keyword_table(),
            vec![("check_weather".to_string(), vec!["weather".to_string(), "forecast".to_string()])]
        );
    }

    #[test]
    fn test_load_json_with_default_keywords() {
        let file = write_temp(
            ".json",
            r#"{"functions": [{"name": "send_fax", "parameters": {"number": {"type": "string"}}, "required": ["number"]}]}"#,
        );
        let config = FunctionsConfig::load(file.path()).unwrap();
        assert_eq!(config.keyword_table()[0].1, vec!["send fax".to_string()]);
        assert_eq!(config.functions[0].parameters["number"].param_type, "string");
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let file = write_temp(
            ".json",
            r#"{"functions": [{"name": "a"}, {"name": "a"}]}"#,
        );
        assert!(matches!(
            FunctionsConfig::load(file.path()),
            Err(ConfigError::DuplicateFunction(name)) if name == "a"
        ));
    }

    #[test]
    fn test_undeclared_required_parameter_rejected() {
        let config = FunctionsConfig {
            functions: vec![FunctionConfig {
                name: "create_client".to_string(),
                description: String::new(),
                parameters: BTreeMap::new(),
                required: vec!["client_name".to_string()],
                keywords: Vec::new(),
            }],
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidValue { .. })));
    }

    #[test]
    fn test_empty_list_and_unknown_extension_rejected() {
        let empty = FunctionsConfig { functions: Vec::new() };
        assert!(matches!(empty.validate(), Err(ConfigError::MissingField(_))));

        let file = write_temp(".txt", "functions: []");
        assert!(matches!(FunctionsConfig::load(file.path()), Err(ConfigError::ParseError(_))));
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            FunctionsConfig::load("/nonexistent/functions.yaml"),
            Err(ConfigError::FileNotFound(_))
        ));
    }

    #[test]
    fn test_shipped_file_matches_builtin() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("../../config/functions.yaml");
        let shipped = FunctionsConfig::load(path).unwrap();
        let builtin = FunctionsConfig::builtin();

        assert_eq!(shipped.keyword_table(), builtin.keyword_table());
        assert_eq!(shipped.schemas(), builtin.schemas());
    }
}
