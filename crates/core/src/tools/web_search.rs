//! # Web Search
//!
//! Google results through the Serper.dev API.

use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::json;

use super::ToolError;

const SERPER_ENDPOINT: &str = "https://google.serper.dev/search";

/// Arguments for web search
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchWebArgs {
    /// Search query
    pub query: String,
    /// Maximum number of results (default: 5)
    pub max_results: Option<u32>,
}

/// Search the web for information
pub struct SerperSearch {
    client: reqwest::Client,
    api_key: Option<String>,
    endpoint: String,
}

impl SerperSearch {
    pub fn new(client: reqwest::Client, api_key: Option<String>) -> Self {
        Self {
            client,
            api_key,
            endpoint: SERPER_ENDPOINT.to_string(),
        }
    }

    /// Reads `SERPER_API_KEY`; a missing key surfaces on first use
    pub fn from_env(client: reqwest::Client) -> Self {
        Self::new(client, std::env::var("SERPER_API_KEY").ok())
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub async fn search(&self, args: SearchWebArgs) -> Result<serde_json::Value, ToolError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ToolError::MissingCredential("SERPER_API_KEY"))?;
        let max_results = args.max_results.unwrap_or(5);

        let response = self
            .client
            .post(&self.endpoint)
            .header("X-API-KEY", api_key)
            .json(&json!({ "q": args.query, "num": max_results }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::Upstream {
                status: status.as_u16(),
                body: response.text().await.unwrap_or_default(),
            });
        }

        let body: serde_json::Value = response.json().await?;
        Ok(json!({
            "query": args.query,
            "source": "serper",
            "results": shape_results(&body, max_results as usize)
        }))
    }
}

/// Reduce a Serper response to title/url/snippet triples
fn shape_results(body: &serde_json::Value, max_results: usize) -> Vec<serde_json::Value> {
    body.get("organic")
        .and_then(|r| r.as_array())
        .map(|results| {
            results
                .iter()
                .take(max_results)
                .map(|r| {
                    json!({
                        "title": r.get("title").and_then(|t| t.as_str()).unwrap_or(""),
                        "url": r.get("link").and_then(|u| u.as_str()).unwrap_or(""),
                        "snippet": r.get("snippet").and_then(|c| c.as_str()).unwrap_or("")
                    })
                })
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_results_limits_and_renames() {
        let body = json!({
            "organic": [
                {"title": "A", "link": "https://a.example", "snippet": "first"},
                {"title": "B", "link": "https://b.example"},
                {"title": "C", "link": "https://c.example", "snippet": "third"}
            ]
        });
        let results = shape_results(&body, 2);
        assert_eq!(results.len(), 2);
        assert_eq!(results[0]["url"], "https://a.example");
        assert_eq!(results[1]["snippet"], "");
    }

    #[test]
    fn test_shape_results_without_organic() {
        assert!(shape_results(&json!({"searchParameters": {}}), 5).is_empty());
    }

    #[tokio::test]
    async fn test_missing_key_is_reported() {
        let search = SerperSearch::new(reqwest::Client::new(), None);
        let err = search
            .search(SearchWebArgs {
                query: "solar".into(),
                max_results: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::MissingCredential("SERPER_API_KEY")));
    }
}
