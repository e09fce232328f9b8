//! Parsing of free-form model replies into something a specialist can use.
//!
//! Replies arrive as bare JSON, a CLI `{"result": ...}` envelope, a fenced ```json block, or prose.
//! JSON is preferred; prose falls back to "whole text is the summary, bullets are the items".

mod json;

pub use json::{extract_json, unwrap_envelope};

use serde_json::{Map, Value};

/// Upper bound on items taken from a single reply
const MAX_ITEMS: usize = 12;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedReply {
    pub summary: String,
    pub items: Vec<String>,
    /// The full JSON object when the reply carried one
    pub fields: Map<String, Value>,
    /// Query from a `NEED_SEARCH:` directive
    pub lookup_request: Option<String>,
}

impl ParsedReply {
    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .and_then(|v| v.as_str())
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
    }

    pub fn field_f64(&self, key: &str) -> Option<f64> {
        match self.fields.get(key)? {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    /// A list field whose entries are strings or objects with a `name`
    pub fn field_names(&self, key: &str) -> Vec<String> {
        match self.fields.get(key) {
            Some(Value::Array(values)) => names_of(values),
            _ => Vec::new(),
        }
    }
}

pub fn parse_reply(raw: &str) -> ParsedReply {
    let (text, _) = unwrap_envelope(raw);
    let lookup_request = lookup_directive(&text);

    if let Some(json_str) = extract_json(&text) {
        if let Ok(Value::Object(fields)) = serde_json::from_str::<Value>(&json_str) {
            let summary = fields
                .get("summary")
                .and_then(|v| v.as_str())
                .unwrap_or_default()
                .trim()
                .to_string();
            let items = match fields.get("items") {
                Some(Value::Array(values)) => names_of(values),
                _ => Vec::new(),
            };
            let lookup_request = lookup_request.or_else(|| {
                fields
                    .get("need_search")
                    .and_then(|v| v.as_str())
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
            });
            return ParsedReply {
                summary,
                items,
                fields,
                lookup_request,
            };
        }
    }

    let prose: Vec<&str> = text
        .lines()
        .filter(|line| !line.contains("NEED_SEARCH:"))
        .collect();

    ParsedReply {
        summary: prose.join("\n").trim().to_string(),
        items: bullet_items(&prose),
        fields: Map::new(),
        lookup_request,
    }
}

/// Query from a `NEED_SEARCH: <query>` line, brackets stripped
pub fn lookup_directive(text: &str) -> Option<String> {
    let re = regex::Regex::new(r"NEED_SEARCH:\s*\[?([^\]\n]+)\]?").ok()?;
    let query = re.captures(text)?.get(1)?.as_str().trim();
    if query.is_empty() {
        None
    } else {
        Some(query.to_string())
    }
}

fn bullet_items(lines: &[&str]) -> Vec<String> {
    let re = match regex::Regex::new(r"^\s*(?:[-*•]|\d+[.)])\s+(.+)$") {
        Ok(re) => re,
        Err(_) => return Vec::new(),
    };
    lines
        .iter()
        .filter_map(|line| re.captures(line))
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str().trim().trim_matches('*').trim().to_string())
        .filter(|s| !s.is_empty())
        .take(MAX_ITEMS)
        .collect()
}

fn names_of(values: &[Value]) -> Vec<String> {
    values
        .iter()
        .filter_map(|v| match v {
            Value::String(s) => Some(s.trim().to_string()),
            Value::Object(obj) => obj
                .get("name")
                .and_then(|n| n.as_str())
                .map(|s| s.trim().to_string()),
            _ => None,
        })
        .filter(|s| !s.is_empty())
        .take(MAX_ITEMS)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_reply_with_fields() {
        let raw = r#"{"summary": "Mild and sunny", "items": ["light jacket", {"name": "sunscreen"}], "avg_temperature_c": 24.5, "forecast": "Sunny, 22-27°C"}"#;
        let reply = parse_reply(raw);
        assert_eq!(reply.summary, "Mild and sunny");
        assert_eq!(reply.items, vec!["light jacket", "sunscreen"]);
        assert_eq!(reply.field_f64("avg_temperature_c"), Some(24.5));
        assert_eq!(reply.field_str("forecast"), Some("Sunny, 22-27°C"));
        assert!(reply.lookup_request.is_none());
    }

    #[test]
    fn test_cli_envelope_with_fenced_json() {
        let raw = r#"{"result": "Here you go:\n```json\n{\"summary\": \"Eat late\", \"items\": [\"Tasca do Chico\"]}\n```", "is_error": false}"#;
        let reply = parse_reply(raw);
        assert_eq!(reply.summary, "Eat late");
        assert_eq!(reply.items, vec!["Tasca do Chico"]);
    }

    #[test]
    fn test_search_directive() {
        let reply = parse_reply("I need fresher data.\nNEED_SEARCH: [lisbon hotel prices june]");
        assert_eq!(
            reply.lookup_request.as_deref(),
            Some("lisbon hotel prices june")
        );
        assert_eq!(reply.summary, "I need fresher data.");
        assert_eq!(lookup_directive("NEED_SEARCH:   "), None);
    }

    #[test]
    fn test_prose_bullets() {
        let reply = parse_reply(
            "Top picks:\n- Belem Tower\n* Alfama walk\n1. LX Factory\nEnjoy!",
        );
        assert_eq!(reply.items, vec!["Belem Tower", "Alfama walk", "LX Factory"]);
        assert!(reply.summary.starts_with("Top picks:"));
        assert!(reply.fields.is_empty());
    }
}
