use serde::Deserialize;

/// Output envelope written by `claude --output-format json`
#[derive(Debug, Deserialize)]
pub struct CliEnvelope {
    pub result: String,
    #[serde(default)]
    pub is_error: bool,
}

/// Unwrap the CLI envelope if present, otherwise return the text unchanged
pub fn unwrap_envelope(raw: &str) -> (String, bool) {
    match serde_json::from_str::<CliEnvelope>(raw.trim()) {
        Ok(envelope) => (envelope.result, envelope.is_error),
        Err(_) => (raw.to_string(), false),
    }
}

/// Extract a JSON object from a string that might contain markdown code blocks or prose
pub fn extract_json(s: &str) -> Option<String> {
    // First try: the whole string is valid JSON
    if s.trim().starts_with('{') && serde_json::from_str::<serde_json::Value>(s.trim()).is_ok() {
        return Some(s.trim().to_string());
    }

    // Second try: extract from markdown code block
    let re = regex::Regex::new(r"```(?:json)?\s*\n?([\s\S]*?)\n?```").ok()?;
    for cap in re.captures_iter(s) {
        let potential_json = cap.get(1)?.as_str().trim();
        if serde_json::from_str::<serde_json::Value>(potential_json).is_ok() {
            return Some(potential_json.to_string());
        }
    }

    // Third try: first balanced object in the text
    let brace_start = s.find('{')?;
    let mut depth = 0;
    let mut end = brace_start;

    for (i, c) in s[brace_start..].char_indices() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    end = brace_start + i + 1;
                    break;
                }
            }
            _ => {}
        }
    }

    if depth == 0 && end > brace_start {
        let potential_json = &s[brace_start..end];
        if serde_json::from_str::<serde_json::Value>(potential_json).is_ok() {
            return Some(potential_json.to_string());
        }
    }

    None
}
