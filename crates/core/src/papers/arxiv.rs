//! # arXiv Client
//!
//! Queries the arXiv Atom API and downloads PDFs.

use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::PaperError;

const ARXIV_ENDPOINT: &str = "http://export.arxiv.org/api/query";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArxivPaper {
    /// Id with version, e.g. `2401.01234v2`
    pub short_id: String,
    pub title: String,
    pub pdf_url: String,
}

impl ArxivPaper {
    pub fn filename(&self) -> String {
        sanitize_filename(&format!("{}.pdf", self.short_id))
    }
}

/// Replace path separators and characters invalid in file names with `_`
pub fn sanitize_filename(filename: &str) -> String {
    filename
        .chars()
        .map(|c| match c {
            '/' | '\\' | '<' | '>' | ':' | '"' | '|' | '?' | '*' => '_',
            other => other,
        })
        .collect()
}

pub struct ArxivClient {
    http: reqwest::Client,
    endpoint: String,
}

impl ArxivClient {
    pub fn new() -> Result<Self, PaperError> {
        let http = reqwest::Client::builder()
            .user_agent("llm-toolbox/1.0")
            .timeout(std::time::Duration::from_secs(60))
            .build()?;
        Ok(Self {
            http,
            endpoint: ARXIV_ENDPOINT.to_string(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub async fn search(&self, query: &str, max_results: usize) -> Result<Vec<ArxivPaper>, PaperError> {
        let url = format!(
            "{}?search_query=all:{}&start=0&max_results={}",
            self.endpoint,
            urlencoding::encode(query),
            max_results
        );
        let response = self.http.get(&url).send().await?.error_for_status()?;
        let feed = response.text().await?;
        let papers = parse_feed(&feed);
        tracing::info!(query = %query, found = papers.len(), "arXiv search finished");
        Ok(papers)
    }

    /// Download into `dir` unless the file is already there
    pub async fn download_pdf(&self, paper: &ArxivPaper, dir: &Path) -> Result<PathBuf, PaperError> {
        let path = dir.join(paper.filename());
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            tracing::debug!(path = %path.display(), "Paper already downloaded");
            return Ok(path);
        }

        let bytes = self
            .http
            .get(&paper.pdf_url)
            .send()
            .await?
            .error_for_status()?
            .bytes()
            .await?;
        tokio::fs::write(&path, &bytes).await?;
        tracing::info!(path = %path.display(), bytes = bytes.len(), "Downloaded paper");
        Ok(path)
    }
}

struct FeedPatterns {
    entry: Regex,
    id: Regex,
    title: Regex,
    link: Regex,
    href: Regex,
    whitespace: Regex,
}

fn patterns() -> &'static FeedPatterns {
    static PATTERNS: OnceLock<FeedPatterns> = OnceLock::new();
    PATTERNS.get_or_init(|| FeedPatterns {
        entry: Regex::new(r"(?s)<entry>(.*?)</entry>").unwrap(),
        id: Regex::new(r"(?s)<id>\s*(.*?)\s*</id>").unwrap(),
        title: Regex::new(r"(?s)<title[^>]*>(.*?)</title>").unwrap(),
        link: Regex::new(r"<link\s[^>]*>").unwrap(),
        href: Regex::new(r#"href="([^"]+)""#).unwrap(),
        whitespace: Regex::new(r"\s+").unwrap(),
    })
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

/// Extract papers from an Atom feed
fn parse_feed(feed: &str) -> Vec<ArxivPaper> {
    let p = patterns();
    p.entry
        .captures_iter(feed)
        .filter_map(|entry| {
            let body = entry.get(1)?.as_str();
            let id = p.id.captures(body)?.get(1)?.as_str();
            let short_id = id.split("/abs/").nth(1).unwrap_or(id).to_string();
            let raw_title = p.title.captures(body)?.get(1)?.as_str();
            let title = decode_entities(p.whitespace.replace_all(raw_title.trim(), " ").as_ref());
            let pdf_url = p
                .link
                .find_iter(body)
                .map(|m| m.as_str())
                .find(|link| link.contains(r#"title="pdf""#))
                .and_then(|link| p.href.captures(link))
                .and_then(|c| c.get(1))
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| format!("https://arxiv.org/pdf/{}", short_id));
            Some(ArxivPaper {
                short_id,
                title,
                pdf_url,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title type="html">ArXiv Query: search_query=all:transformers</title>
  <entry>
    <id>http://arxiv.org/abs/1706.03762v7</id>
    <title>Attention Is All
      You Need</title>
    <link href="http://arxiv.org/abs/1706.03762v7" rel="alternate" type="text/html"/>
    <link title="pdf" href="http://arxiv.org/pdf/1706.03762v7" rel="related" type="application/pdf"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/hep-th/9901001v1</id>
    <title>Strings &amp; Things</title>
  </entry>
</feed>"#;

    #[test]
    fn test_parse_feed() {
        let papers = parse_feed(FEED);
        assert_eq!(papers.len(), 2);
        assert_eq!(papers[0].short_id, "1706.03762v7");
        assert_eq!(papers[0].title, "Attention Is All You Need");
        assert_eq!(papers[0].pdf_url, "http://arxiv.org/pdf/1706.03762v7");
        assert_eq!(papers[1].title, "Strings & Things");
        assert_eq!(papers[1].pdf_url, "https://arxiv.org/pdf/hep-th/9901001v1");
    }

    #[test]
    fn test_old_style_ids_become_flat_filenames() {
        let papers = parse_feed(FEED);
        assert_eq!(papers[1].filename(), "hep-th_9901001v1.pdf");
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename(r#"a/b\c<d>e:f"g|h?i*j.pdf"#), "a_b_c_d_e_f_g_h_i_j.pdf");
        assert_eq!(sanitize_filename("2401.01234v1.pdf"), "2401.01234v1.pdf");
    }

    #[tokio::test]
    async fn test_download_skips_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let paper = ArxivPaper {
            short_id: "1706.03762v7".into(),
            title: "t".into(),
            // unreachable on purpose: must not be fetched
            pdf_url: "http://127.0.0.1:9/never".into(),
        };
        std::fs::write(dir.path().join("1706.03762v7.pdf"), b"%PDF").unwrap();
        let path = ArxivClient::new().unwrap().download_pdf(&paper, dir.path()).await.unwrap();
        assert_eq!(std::fs::read(path).unwrap(), b"%PDF");
    }
}
