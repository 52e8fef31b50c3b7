//! The reserved finish tool — the agent's termination signal.
//!
//! Termination is modeled as an ordinary tool call rather than a special
//! driver response field, so the finish signal goes through the same
//! catalog validation and dispatch as every other tool.

use std::sync::Arc;

use async_trait::async_trait;
use stride_core::error::{Error, ToolError};
use stride_core::tool::{ParamSpec, ParamType, Tool, ToolSchema};

/// Name of the reserved finish tool.
pub const FINISH_TOOL_NAME: &str = "agent_finish";

/// The sentinel tool the model calls to end the task, carrying the final
/// answer in its `result` argument. Invocation is the identity function.
pub struct FinishTool {
    schema: ToolSchema,
}

impl FinishTool {
    pub fn new() -> Self {
        Self {
            schema: ToolSchema {
                name: FINISH_TOOL_NAME.into(),
                description:
                    "Return the final result once you believe you have completed the task at hand"
                        .into(),
                arguments: vec![ParamSpec::required("result", ParamType::String)],
            },
        }
    }
}

impl Default for FinishTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for FinishTool {
    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    async fn invoke(&self, args: serde_json::Value) -> Result<String, ToolError> {
        args["result"]
            .as_str()
            .map(String::from)
            .ok_or_else(|| ToolError::InvalidArguments("'result' must be a string".into()))
    }
}

/// Build the effective tool set: the caller's tools plus the finish tool,
/// appended exactly once, in a fresh collection.
///
/// The whole catalog is validated here, eagerly: malformed names, empty
/// descriptions, and duplicate names (including a caller-supplied
/// `agent_finish`) are configuration errors — the catalog the model sees
/// must be unambiguous.
pub fn with_finish_tool(tools: Vec<Arc<dyn Tool>>) -> Result<Vec<Arc<dyn Tool>>, Error> {
    let mut effective: Vec<Arc<dyn Tool>> = Vec::with_capacity(tools.len() + 1);
    effective.extend(tools);
    effective.push(Arc::new(FinishTool::new()));

    for (i, tool) in effective.iter().enumerate() {
        let schema = tool.schema();
        if !ToolSchema::is_valid_name(&schema.name) {
            return Err(Error::Config {
                message: format!(
                    "Tool name '{}' is invalid: only alphanumerics, '_' and '-' are allowed",
                    schema.name
                ),
            });
        }
        if schema.description.trim().is_empty() {
            return Err(Error::Config {
                message: format!("Tool '{}' must have a description", schema.name),
            });
        }
        if effective[..i].iter().any(|t| t.name() == tool.name()) {
            return Err(Error::Config {
                message: format!("Duplicate tool name '{}' in agent tool set", tool.name()),
            });
        }
    }

    Ok(effective)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn invoke_is_identity_on_result() {
        let tool = FinishTool::new();
        let out = tool
            .invoke(serde_json::json!({"result": "the answer"}))
            .await
            .unwrap();
        assert_eq!(out, "the answer");
    }

    #[tokio::test]
    async fn invoke_rejects_missing_result() {
        let tool = FinishTool::new();
        let err = tool.invoke(serde_json::json!({})).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn schema_requires_result_string() {
        let tool = FinishTool::new();
        let schema = tool.schema();
        assert_eq!(schema.name, FINISH_TOOL_NAME);
        assert_eq!(schema.arguments.len(), 1);
        assert!(schema.arguments[0].required);
        assert_eq!(schema.arguments[0].r#type, ParamType::String);
    }

    #[test]
    fn empty_tool_set_gets_only_finish() {
        let effective = with_finish_tool(vec![]).unwrap();
        assert_eq!(effective.len(), 1);
        assert_eq!(effective[0].name(), FINISH_TOOL_NAME);
    }

    #[test]
    fn finish_appended_after_caller_tools() {
        let echo: Arc<dyn Tool> = Arc::new(NamedTool::new("echo"));
        let effective = with_finish_tool(vec![echo]).unwrap();
        let names: Vec<&str> = effective.iter().map(|t| t.name()).collect();
        assert_eq!(names, vec!["echo", FINISH_TOOL_NAME]);
    }

    #[test]
    fn caller_supplied_finish_is_rejected() {
        let fake: Arc<dyn Tool> = Arc::new(FinishTool::new());
        let err = with_finish_tool(vec![fake]).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn malformed_tool_name_is_rejected() {
        let bad: Arc<dyn Tool> = Arc::new(NamedTool::new("has spaces"));
        let err = with_finish_tool(vec![bad]).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    /// Minimal stand-in tool with a custom name.
    struct NamedTool {
        schema: ToolSchema,
    }

    impl NamedTool {
        fn new(name: &str) -> Self {
            Self {
                schema: ToolSchema {
                    name: name.into(),
                    description: "test tool".into(),
                    arguments: vec![],
                },
            }
        }
    }

    #[async_trait]
    impl Tool for NamedTool {
        fn schema(&self) -> &ToolSchema {
            &self.schema
        }

        async fn invoke(&self, _args: serde_json::Value) -> Result<String, ToolError> {
            Ok(String::new())
        }
    }
}
