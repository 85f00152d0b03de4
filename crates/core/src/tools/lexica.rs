//! # Lexica Image Search
//!
//! Returns the first two images lexica.art finds for a prompt. The result
//! is the worker's final answer, so the runtime returns it unchanged.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::ToolError;

const LEXICA_ENDPOINT: &str = "https://lexica.art/api/v1/search";

#[derive(Debug, Deserialize, JsonSchema)]
pub struct LexicaSearchArgs {
    /// The search query for Lexica
    pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LexicaSearchOutput {
    pub image_url1: String,
    pub image_url2: String,
}

pub struct LexicaImageSearch {
    client: reqwest::Client,
    endpoint: String,
}

impl LexicaImageSearch {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            endpoint: LEXICA_ENDPOINT.to_string(),
        }
    }

    pub async fn search(&self, args: LexicaSearchArgs) -> Result<serde_json::Value, ToolError> {
        let url = format!("{}?q={}", self.endpoint, urlencoding::encode(&args.query));

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::Upstream {
                status: status.as_u16(),
                body: format!("Failed to retrieve data. Status code: {}", status.as_u16()),
            });
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| ToolError::Failed(format!("JSON parsing error: {}", e)))?;

        serde_json::to_value(first_two_images(&body)).map_err(|e| ToolError::Failed(e.to_string()))
    }
}

/// Both URLs are empty unless at least two images came back
fn first_two_images(body: &serde_json::Value) -> LexicaSearchOutput {
    let sources: Vec<&str> = body
        .get("images")
        .and_then(|i| i.as_array())
        .map(|images| {
            images
                .iter()
                .filter_map(|img| img.get("src").and_then(|s| s.as_str()))
                .take(2)
                .collect()
        })
        .unwrap_or_default();

    match sources.as_slice() {
        [first, second] => LexicaSearchOutput {
            image_url1: first.to_string(),
            image_url2: second.to_string(),
        },
        _ => LexicaSearchOutput {
            image_url1: String::new(),
            image_url2: String::new(),
        },
    }
}
