//! Tool trait — the abstraction over agent capabilities.
//!
//! A tool is a named capability the model can invoke by emitting a function
//! call. Its parameter list is declared explicitly as a [`ToolSchema`] and
//! validated once, when the schema is built — never inferred at call time.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{Error, ToolError};

/// The JSON type of a single tool parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParamType {
    String,
    Integer,
    Float,
    Boolean,
}

impl ParamType {
    /// The JSON-Schema type name used in function-calling payloads.
    pub fn json_type(&self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Integer => "integer",
            ParamType::Float => "number",
            ParamType::Boolean => "boolean",
        }
    }
}

/// One declared tool parameter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ParamSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub r#type: ParamType,
    pub required: bool,
}

impl ParamSpec {
    /// A required parameter.
    pub fn required(name: impl Into<String>, r#type: ParamType) -> Self {
        Self {
            name: name.into(),
            r#type,
            required: true,
        }
    }

    /// An optional parameter (has a default on the tool side).
    pub fn optional(name: impl Into<String>, r#type: ParamType) -> Self {
        Self {
            name: name.into(),
            r#type,
            required: false,
        }
    }
}

/// The model-facing description of a tool: name, description, and an
/// ordered parameter list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    pub arguments: Vec<ParamSpec>,
}

impl ToolSchema {
    /// Build and validate a schema.
    ///
    /// Fails with a configuration error if the name contains characters
    /// unsafe for function-calling identifiers, or the description is
    /// empty.
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        arguments: Vec<ParamSpec>,
    ) -> Result<Self, Error> {
        let name = name.into();
        let description = description.into();

        if !Self::is_valid_name(&name) {
            return Err(Error::Config {
                message: format!(
                    "Tool name '{name}' is invalid: only alphanumerics, '_' and '-' are allowed"
                ),
            });
        }
        if description.trim().is_empty() {
            return Err(Error::Config {
                message: format!("Tool '{name}' must have a description"),
            });
        }

        Ok(Self {
            name,
            description,
            arguments,
        })
    }

    /// Whether `name` matches `^[A-Za-z0-9_-]+$`.
    pub fn is_valid_name(name: &str) -> bool {
        !name.is_empty()
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
    }

    /// Render the parameter list as a JSON-Schema object, the format
    /// function-calling backends expect.
    pub fn parameters_json(&self) -> serde_json::Value {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();

        for arg in &self.arguments {
            properties.insert(
                arg.name.clone(),
                serde_json::json!({ "type": arg.r#type.json_type() }),
            );
            if arg.required {
                required.push(serde_json::Value::String(arg.name.clone()));
            }
        }

        serde_json::json!({
            "type": "object",
            "properties": properties,
            "required": required,
        })
    }

    /// Check decoded call arguments against this schema: must be a JSON
    /// object with every required parameter present.
    pub fn validate_args(&self, args: &serde_json::Value) -> Result<(), ToolError> {
        let Some(map) = args.as_object() else {
            return Err(ToolError::InvalidArguments(format!(
                "Arguments for '{}' must be a JSON object",
                self.name
            )));
        };

        for arg in self.arguments.iter().filter(|a| a.required) {
            if !map.contains_key(&arg.name) {
                return Err(ToolError::InvalidArguments(format!(
                    "Missing required argument '{}' for tool '{}'",
                    arg.name, self.name
                )));
            }
        }

        Ok(())
    }
}

/// The core Tool trait.
///
/// Implementations declare their schema up front and surface their own
/// errors from `invoke`; the agent decides whether a failure is fatal.
#[async_trait]
pub trait Tool: Send + Sync {
    /// The declared schema (name, description, parameters).
    fn schema(&self) -> &ToolSchema;

    /// The unique name of this tool.
    fn name(&self) -> &str {
        &self.schema().name
    }

    /// Invoke the capability. The result is stringified by the caller
    /// before entering a tool-role message.
    async fn invoke(&self, args: serde_json::Value) -> Result<String, ToolError>;
}

impl std::fmt::Debug for dyn Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Tool").field("name", &self.name()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn echo_schema() -> ToolSchema {
        ToolSchema::new(
            "echo",
            "Echoes back the input",
            vec![
                ParamSpec::required("text", ParamType::String),
                ParamSpec::optional("repeat", ParamType::Integer),
            ],
        )
        .unwrap()
    }

    #[test]
    fn valid_names() {
        assert!(ToolSchema::is_valid_name("google_search"));
        assert!(ToolSchema::is_valid_name("agent-finish"));
        assert!(ToolSchema::is_valid_name("t00l"));
        assert!(!ToolSchema::is_valid_name(""));
        assert!(!ToolSchema::is_valid_name("bad name"));
        assert!(!ToolSchema::is_valid_name("dotted.name"));
    }

    #[test]
    fn schema_rejects_bad_name() {
        let err = ToolSchema::new("has spaces", "desc", vec![]).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn schema_rejects_empty_description() {
        let err = ToolSchema::new("fine_name", "  ", vec![]).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn parameters_json_shape() {
        let schema = echo_schema();
        let params = schema.parameters_json();
        assert_eq!(params["type"], "object");
        assert_eq!(params["properties"]["text"]["type"], "string");
        assert_eq!(params["properties"]["repeat"]["type"], "integer");
        let required = params["required"].as_array().unwrap();
        assert_eq!(required.len(), 1);
        assert_eq!(required[0], "text");
    }

    #[test]
    fn float_renders_as_number() {
        assert_eq!(ParamType::Float.json_type(), "number");
    }

    #[test]
    fn validate_args_accepts_required_present() {
        let schema = echo_schema();
        let args = serde_json::json!({"text": "hi"});
        assert!(schema.validate_args(&args).is_ok());
    }

    #[test]
    fn validate_args_rejects_missing_required() {
        let schema = echo_schema();
        let args = serde_json::json!({"repeat": 2});
        let err = schema.validate_args(&args).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
        assert!(err.to_string().contains("text"));
    }

    #[test]
    fn validate_args_rejects_non_object() {
        let schema = echo_schema();
        let err = schema.validate_args(&serde_json::json!("hi")).unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }
}
