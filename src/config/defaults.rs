use crate::specialist::SpecialistKind;
use std::path::PathBuf;

pub fn default_version() -> u32 {
    1
}

pub fn default_model() -> String {
    "sonnet".to_string()
}

pub fn default_claude_binary() -> PathBuf {
    // Check common install location first
    if let Some(home) = std::env::var_os("HOME") {
        let local_path = PathBuf::from(home).join(".claude/local/claude");
        if local_path.exists() {
            return local_path;
        }
    }
    // Fall back to PATH lookup
    PathBuf::from("claude")
}

pub fn default_temperature() -> f32 {
    0.7
}

pub fn default_max_tokens() -> u32 {
    4000
}

pub fn default_top_p() -> f32 {
    0.9
}

pub fn default_model_timeout_sec() -> u64 {
    120
}

pub fn default_history_window() -> usize {
    3
}

pub fn default_search_program() -> PathBuf {
    PathBuf::from("ddgr")
}

pub fn default_search_args() -> Vec<String> {
    ["--json", "--num", "{max_results}", "--reg", "{region}", "{query}"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

pub fn default_max_results() -> usize {
    10
}

pub fn default_region() -> String {
    "us-en".to_string()
}

pub fn default_safesearch() -> String {
    "moderate".to_string()
}

pub fn default_lookup_timeout_sec() -> u64 {
    20
}

pub fn default_max_lookups_per_specialist() -> u32 {
    2
}

pub fn default_max_iterations() -> u32 {
    50
}

pub fn default_specialists() -> Vec<SpecialistKind> {
    SpecialistKind::ALL.to_vec()
}

pub fn default_max_attempts() -> u32 {
    3
}

pub fn default_backoff_base_ms() -> u64 {
    1000
}

pub fn default_bind() -> String {
    "127.0.0.1:5000".to_string()
}

pub fn default_retain_completed() -> usize {
    100
}
