//! Function schemas: the callable targets the dialogue fills parameters for

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::conversation::Parameters;

/// Value category a parameter belongs to, used to pick an extractor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SlotCategory {
    Name,
    Phone,
    Address,
    Email,
    #[default]
    Other,
}

impl SlotCategory {
    /// Infer the category from a parameter name
    pub fn infer(parameter: &str) -> Self {
        match parameter.to_ascii_lowercase().as_str() {
            "client_name" | "name" | "full_name" | "customer_name" | "contact_name" => Self::Name,
            "phone_number" | "phone" | "phone_no" | "mobile" | "telephone" => Self::Phone,
            "address" | "street_address" | "mailing_address" => Self::Address,
            "email" | "email_address" => Self::Email,
            _ => Self::Other,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Phone => "phone",
            Self::Address => "address",
            Self::Email => "email",
            Self::Other => "other",
        }
    }
}

impl std::fmt::Display for SlotCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Declared type and description of a single parameter
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSpec {
    #[serde(rename = "type", default = "default_param_type")]
    pub param_type: String,
    #[serde(default)]
    pub description: String,
    /// Explicit category; inferred from the parameter name when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<SlotCategory>,
}

fn default_param_type() -> String {
    "string".to_string()
}

impl ParameterSpec {
    pub fn new(param_type: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            param_type: param_type.into(),
            description: description.into(),
            category: None,
        }
    }
}

/// A callable target: its parameters and which of them are required
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionSchema {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: BTreeMap<String, ParameterSpec>,
    /// Required parameter names in the order they are asked for
    #[serde(default)]
    pub required: Vec<String>,
}

impl FunctionSchema {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: BTreeMap::new(),
            required: Vec::new(),
        }
    }

    /// Builder: declare a parameter
    pub fn with_parameter(mut self, name: impl Into<String>, spec: ParameterSpec) -> Self {
        self.parameters.insert(name.into(), spec);
        self
    }

    /// Builder: append a required parameter name
    pub fn with_required(mut self, name: impl Into<String>) -> Self {
        self.required.push(name.into());
        self
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterSpec> {
        self.parameters.get(name)
    }

    /// Category of a parameter, explicit when declared, otherwise inferred
    pub fn category_of(&self, name: &str) -> SlotCategory {
        self.parameters
            .get(name)
            .and_then(|spec| spec.category)
            .unwrap_or_else(|| SlotCategory::infer(name))
    }

    /// Required parameters that are absent or null in `gathered`, in required order
    pub fn missing_from(&self, gathered: &Parameters) -> Vec<String> {
        self.required
            .iter()
            .filter(|name| gathered.get(*name).map_or(true, |value| value.is_null()))
            .cloned()
            .collect()
    }
}

/// Ordered collection of the schemas an agent can fill
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaSet {
    schemas: Vec<FunctionSchema>,
}

impl SchemaSet {
    pub fn new(schemas: Vec<FunctionSchema>) -> Self {
        Self { schemas }
    }

    pub fn get(&self, name: &str) -> Option<&FunctionSchema> {
        self.schemas.iter().find(|schema| schema.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.schemas.iter().map(|schema| schema.name.as_str())
    }

    pub fn as_slice(&self) -> &[FunctionSchema] {
        &self.schemas
    }

    pub fn iter(&self) -> std::slice::Iter<'_, FunctionSchema> {
        self.schemas.iter()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

impl From<Vec<FunctionSchema>> for SchemaSet {
    fn from(schemas: Vec<FunctionSchema>) -> Self {
        Self::new(schemas)
    }
}
