//! Google search tool backed by the Serper API.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stride_core::error::{Error, ToolError};
use stride_core::tool::{ParamSpec, ParamType, Tool, ToolSchema};
use tracing::debug;

const SERPER_URL: &str = "https://google.serper.dev/search";

/// One organic search hit, as serper.dev returns it.
#[derive(Debug, Serialize, Deserialize)]
struct OrganicResult {
    title: String,
    link: String,
    #[serde(default)]
    snippet: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    organic: Vec<OrganicResult>,
}

/// Searches Google via serper.dev and returns the organic results as JSON.
pub struct GoogleSearchTool {
    schema: ToolSchema,
    api_key: String,
    client: reqwest::Client,
}

impl GoogleSearchTool {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            schema: ToolSchema {
                name: "google_search".into(),
                description: "Return Google search results based on a query".into(),
                arguments: vec![ParamSpec::required("query", ParamType::String)],
            },
            api_key: api_key.into(),
            client: shared_client(),
        }
    }

    /// Create the tool with the API key taken from `SERP_API_KEY`.
    pub fn from_env() -> Result<Self, Error> {
        let api_key = std::env::var("SERP_API_KEY").map_err(|_| Error::Config {
            message: "SERP_API_KEY is not set".into(),
        })?;
        Ok(Self::new(api_key))
    }
}

#[async_trait]
impl Tool for GoogleSearchTool {
    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    async fn invoke(&self, args: serde_json::Value) -> Result<String, ToolError> {
        let query = args["query"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("'query' must be a string".into()))?;

        debug!(query, "Searching");

        let response = self
            .client
            .post(SERPER_URL)
            .header("X-API-KEY", &self.api_key)
            .json(&serde_json::json!({ "q": query }))
            .send()
            .await
            .map_err(|e| ToolError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ToolError::ExecutionFailed {
                tool_name: self.schema.name.clone(),
                reason: format!("Search API returned status {}", response.status()),
            });
        }

        let body: SearchResponse = response
            .json()
            .await
            .map_err(|e| ToolError::Http(e.to_string()))?;

        serde_json::to_string(&body.organic).map_err(|e| ToolError::ExecutionFailed {
            tool_name: self.schema.name.clone(),
            reason: format!("Unexpected search payload: {e}"),
        })
    }
}

/// HTTP client shared by the web tools.
pub(crate) fn shared_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .user_agent("Mozilla/5.0 (compatible; Stride/0.1)")
        .build()
        .expect("Failed to create HTTP client")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_shape() {
        let tool = GoogleSearchTool::new("key");
        let schema = tool.schema();
        assert_eq!(schema.name, "google_search");
        assert_eq!(schema.arguments.len(), 1);
        assert_eq!(schema.arguments[0].name, "query");
        assert!(schema.arguments[0].required);
    }

    #[tokio::test]
    async fn non_string_query_is_rejected() {
        let tool = GoogleSearchTool::new("key");
        let err = tool
            .invoke(serde_json::json!({"query": 42}))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments(_)));
    }

    #[test]
    fn parse_search_response() {
        let data = r#"{
            "organic": [
                {"title": "The Rust Book", "link": "https://doc.rust-lang.org/book/", "snippet": "Learn Rust"},
                {"title": "crates.io", "link": "https://crates.io/"}
            ],
            "searchParameters": {"q": "rust"}
        }"#;
        let parsed: SearchResponse = serde_json::from_str(data).unwrap();
        assert_eq!(parsed.organic.len(), 2);
        assert_eq!(parsed.organic[0].title, "The Rust Book");
        assert!(parsed.organic[1].snippet.is_empty());
    }

    #[test]
    fn parse_search_response_without_organic() {
        let parsed: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.organic.is_empty());
    }
}
