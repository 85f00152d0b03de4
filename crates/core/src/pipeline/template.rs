//! # Task Templates
//!
//! Stage descriptions carry `{name}` placeholders. Validation and
//! rendering are separate steps: [`Template::missing`] reports absent
//! keys before anything runs, [`Template::render`] substitutes in a
//! single pass so substituted text is never re-expanded.

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

fn placeholder_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{([A-Za-z_][A-Za-z0-9_]*)\}").unwrap())
}

/// A parsed description template
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    raw: String,
    /// Distinct placeholder names in order of first appearance
    placeholders: Vec<String>,
}

impl Template {
    pub fn parse(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        let mut placeholders: Vec<String> = Vec::new();
        for cap in placeholder_pattern().captures_iter(&raw) {
            let name = &cap[1];
            if !placeholders.iter().any(|p| p == name) {
                placeholders.push(name.to_string());
            }
        }
        Self { raw, placeholders }
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn placeholders(&self) -> &[String] {
        &self.placeholders
    }

    pub fn references(&self, name: &str) -> bool {
        self.placeholders.iter().any(|p| p == name)
    }

    /// Placeholders `has` reports as absent
    pub fn missing(&self, has: impl Fn(&str) -> bool) -> Vec<String> {
        self.placeholders
            .iter()
            .filter(|p| !has(p))
            .cloned()
            .collect()
    }

    /// Substitute every placeholder; the first one without a value is returned as the error
    pub fn render<'a>(&self, lookup: impl Fn(&str) -> Option<&'a str>) -> Result<String, String> {
        let mut unresolved: Option<String> = None;
        let rendered = placeholder_pattern().replace_all(&self.raw, |caps: &regex::Captures| {
            let name = &caps[1];
            match lookup(name) {
                Some(value) => value.to_string(),
                None => {
                    if unresolved.is_none() {
                        unresolved = Some(name.to_string());
                    }
                    caps[0].to_string()
                }
            }
        });
        match unresolved {
            Some(name) => Err(name),
            None => Ok(rendered.into_owned()),
        }
    }
}

/// Named input values for one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Payload(BTreeMap<String, String>);

impl Payload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Value for `key`; blank values count as absent
    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .map(String::as_str)
            .filter(|v| !v.trim().is_empty())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Payload {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_collects_distinct_placeholders() {
        let t = Template::parse("Research {ticker}. Then compare {ticker} with {peer}.");
        assert_eq!(t.placeholders(), &["ticker".to_string(), "peer".to_string()]);
        assert!(t.references("peer"));
    }

    #[test]
    fn test_json_braces_are_not_placeholders() {
        let t = Template::parse(r#"Return {"image_url1": "..."} for {context}"#);
        assert_eq!(t.placeholders(), &["context".to_string()]);
    }

    #[test]
    fn test_render_single_pass() {
        let t = Template::parse("Write about {subject}");
        let payload = Payload::new().with("subject", "{subject} twice");
        let out = t.render(|k| payload.get(k)).unwrap();
        assert_eq!(out, "Write about {subject} twice");
    }

    #[test]
    fn test_render_reports_unresolved() {
        let t = Template::parse("{a} and {b}");
        let payload = Payload::new().with("a", "x");
        assert_eq!(t.render(|k| payload.get(k)).unwrap_err(), "b");
        assert_eq!(t.missing(|k| payload.contains(k)), vec!["b".to_string()]);
    }

    #[test]
    fn test_blank_payload_value_is_absent() {
        let payload: Payload = [("ticker", "   ")].into_iter().collect();
        assert!(!payload.contains("ticker"));
        assert_eq!(payload.keys().collect::<Vec<_>>(), vec!["ticker"]);
    }
}
