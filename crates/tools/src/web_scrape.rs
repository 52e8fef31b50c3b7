//! Web scrape tool — fetch a URL and extract its readable text.

use async_trait::async_trait;
use scraper::Html;
use stride_core::error::ToolError;
use stride_core::tool::{ParamSpec, ParamType, Tool, ToolSchema};
use tracing::debug;

use crate::web_search::shared_client;

/// Pages longer than this (extracted text) are refused rather than
/// truncated: a partial page is worse than no page for the model.
const MAX_CONTENT_LEN: usize = 16_000;

const OVERLONG_MESSAGE: &str = "Requested content exceeds maximum length.";
const FAILED_MESSAGE: &str = "Website scrape failed.";

/// Retrieves the text content of a website given a URL.
pub struct ScrapeWebsiteTool {
    schema: ToolSchema,
    client: reqwest::Client,
}

impl ScrapeWebsiteTool {
    pub fn new() -> Self {
        Self {
            schema: ToolSchema {
                name: "scrape_website".into(),
                description: "Scrape the content of a website given the URL as a string".into(),
                arguments: vec![ParamSpec::required("url", ParamType::String)],
            },
            client: shared_client(),
        }
    }
}

impl Default for ScrapeWebsiteTool {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for ScrapeWebsiteTool {
    fn schema(&self) -> &ToolSchema {
        &self.schema
    }

    async fn invoke(&self, args: serde_json::Value) -> Result<String, ToolError> {
        let url = args["url"]
            .as_str()
            .ok_or_else(|| ToolError::InvalidArguments("'url' must be a string".into()))?;

        debug!(url, "Scraping");

        let response = match self.client.get(url).send().await {
            Ok(r) => r,
            Err(_) => return Ok(FAILED_MESSAGE.into()),
        };

        if !response.status().is_success() {
            return Ok(FAILED_MESSAGE.into());
        }

        let html = match response.text().await {
            Ok(t) => t,
            Err(_) => return Ok(FAILED_MESSAGE.into()),
        };

        let text = extract_text(&html);
        if text.len() > MAX_CONTENT_LEN {
            return Ok(OVERLONG_MESSAGE.into());
        }

        Ok(text)
    }
}

/// Collapse an HTML document into whitespace-normalized visible text.
fn extract_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let text: Vec<&str> = document
        .root_element()
        .text()
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .collect();
    text.join(" ")
}
