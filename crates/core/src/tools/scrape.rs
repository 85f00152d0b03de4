//! # Website Scraper
//!
//! Fetches a page and reduces it to readable text for the model.

use std::collections::HashSet;
use std::sync::OnceLock;

use schemars::JsonSchema;
use scraper::{Html, Selector};
use serde::Deserialize;
use serde_json::json;

use super::ToolError;

/// Upper bound on returned characters, keeps tool results inside context limits
const MAX_CHARS: usize = 12_000;

#[derive(Debug, Deserialize, JsonSchema)]
pub struct ScrapeArgs {
    /// Absolute URL of the page to read
    pub website_url: String,
}

pub struct ScrapeWebsite {
    client: reqwest::Client,
}

impl ScrapeWebsite {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    pub async fn scrape(&self, args: ScrapeArgs) -> Result<serde_json::Value, ToolError> {
        if !(args.website_url.starts_with("http://") || args.website_url.starts_with("https://")) {
            return Err(ToolError::InvalidArguments {
                tool: "scrape_website".to_string(),
                reason: format!("not an http(s) URL: {}", args.website_url),
            });
        }

        let response = self.client.get(&args.website_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ToolError::Upstream {
                status: status.as_u16(),
                body: String::new(),
            });
        }

        let html = response.text().await?;
        let text = html_to_text(&html);
        let truncated = text.chars().count() > MAX_CHARS;
        Ok(json!({
            "url": args.website_url,
            "text": text.chars().take(MAX_CHARS).collect::<String>(),
            "truncated": truncated
        }))
    }
}

/// Elements whose text never reaches the reader
fn removed_selector() -> &'static Selector {
    static SELECTOR: OnceLock<Selector> = OnceLock::new();
    SELECTOR.get_or_init(|| {
        Selector::parse("head, script, style, noscript, template, iframe, svg").unwrap()
    })
}

/// Visible text of an HTML document with whitespace collapsed
pub fn html_to_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let removed: HashSet<_> = document
        .select(removed_selector())
        .map(|element| element.id())
        .collect();

    let words: Vec<&str> = document
        .root_element()
        .descendants()
        .filter_map(|node| node.value().as_text().map(|text| (node, text)))
        .filter(|(node, _)| !node.ancestors().any(|a| removed.contains(&a.id())))
        .flat_map(|(_, text)| text.split_whitespace())
        .collect();
    words.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_to_text_keeps_only_visible_text() {
        let html = r#"<html><head><title>x</title><style>p { color: red }</style></head><body>
            <script>var a = "<p>no</p>";</script><noscript>enable js</noscript>
            <!-- <p>hidden</p> -->
            <h1>Solar&nbsp;power</h1><p title="a > b">Grew &amp; grew in caf&eacute;s.</p>
            </body></html>"#;
        assert_eq!(html_to_text(html), "Solar power Grew & grew in cafés.");
    }

    #[test]
    fn test_html_to_text_on_fragment() {
        assert_eq!(html_to_text("<div>one<br>two</div>"), "one two");
        assert_eq!(html_to_text(""), "");
    }

    #[tokio::test]
    async fn test_rejects_non_http_urls() {
        let err = ScrapeWebsite::new(reqwest::Client::new())
            .scrape(ScrapeArgs {
                website_url: "file:///etc/passwd".into(),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidArguments { .. }));
    }
}
