mod command;

pub use command::CommandLookup;

use crate::config::{Config, LookupProvider};
use crate::error::LookupError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One web search result
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct SearchHit {
    #[serde(default)]
    pub title: String,

    #[serde(default, alias = "abstract", alias = "body", alias = "description")]
    pub snippet: String,

    #[serde(default, alias = "href", alias = "link")]
    pub url: String,
}

#[async_trait]
pub trait Lookup: Send + Sync {
    #[allow(dead_code)]
    fn name(&self) -> &'static str;

    /// Ordered results for `query`; an empty list is a valid answer
    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, LookupError>;
}

/// Lookup that never finds anything. Used when search is disabled.
pub struct NoopLookup;

#[async_trait]
impl Lookup for NoopLookup {
    fn name(&self) -> &'static str {
        "none"
    }

    async fn search(&self, _query: &str) -> Result<Vec<SearchHit>, LookupError> {
        Ok(Vec::new())
    }
}

/// Create the lookup backend from configuration
pub fn create_lookup(config: &Config) -> Arc<dyn Lookup> {
    match config.lookup.provider {
        LookupProvider::None => Arc::new(NoopLookup),
        LookupProvider::Command => Arc::new(CommandLookup::from_config(&config.lookup)),
    }
}

/// Parse search output: a JSON array of hits, or an object wrapping one under `results`
pub fn parse_hits(raw: &str) -> Result<Vec<SearchHit>, LookupError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }

    let value: serde_json::Value =
        serde_json::from_str(trimmed).map_err(|e| LookupError::Parse(e.to_string()))?;

    let array = match value {
        serde_json::Value::Array(items) => items,
        serde_json::Value::Object(mut obj) => match obj.remove("results") {
            Some(serde_json::Value::Array(items)) => items,
            _ => return Err(LookupError::Parse("expected a `results` array".to_string())),
        },
        _ => return Err(LookupError::Parse("expected a JSON array".to_string())),
    };

    Ok(array
        .into_iter()
        .filter_map(|item| serde_json::from_value::<SearchHit>(item).ok())
        .filter(|hit| !hit.title.is_empty() || !hit.snippet.is_empty())
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ddgr_output() {
        let raw = r#"[
            {"title": "Lisbon Travel Guide", "abstract": "Trams, viewpoints and pastel de nata.", "url": "https://example.com/lisbon"},
            {"title": "Belem Tower", "abstract": "16th century fortification.", "url": "https://example.com/belem"}
        ]"#;
        let hits = parse_hits(raw).unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].snippet, "Trams, viewpoints and pastel de nata.");
        assert_eq!(hits[1].url, "https://example.com/belem");
    }

    #[test]
    fn test_parse_wrapped_results_with_aliases() {
        let raw = r#"{"results": [{"title": "Weather", "body": "Sunny, 26°C", "href": "https://w.example"}, {"url": "https://empty.example"}]}"#;
        let hits = parse_hits(raw).unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].snippet, "Sunny, 26°C");
        assert_eq!(hits[0].url, "https://w.example");
    }

    #[test]
    fn test_parse_empty_and_garbage() {
        assert!(parse_hits("").unwrap().is_empty());
        assert!(parse_hits("[]").unwrap().is_empty());
        assert!(matches!(parse_hits("not json"), Err(LookupError::Parse(_))));
    }

    #[tokio::test]
    async fn test_noop_lookup_is_empty() {
        let hits = NoopLookup.search("anything").await.unwrap();
        assert!(hits.is_empty());
    }
}
