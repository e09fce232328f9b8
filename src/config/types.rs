use crate::specialist::SpecialistKind;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::defaults::*;

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct Config {
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub model: ModelConfig,

    #[serde(default)]
    pub lookup: LookupConfig,

    #[serde(default)]
    pub workflow: WorkflowConfig,

    #[serde(default)]
    pub retry: RetryConfig,

    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ModelProvider {
    #[default]
    ClaudeCli,
    Offline,
}

impl std::fmt::Display for ModelProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelProvider::ClaudeCli => write!(f, "claude_cli"),
            ModelProvider::Offline => write!(f, "offline"),
        }
    }
}

/// Reasoning collaborator settings
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct ModelConfig {
    #[serde(default)]
    pub provider: ModelProvider,

    #[serde(default = "default_model")]
    pub model: String,

    #[serde(default = "default_claude_binary")]
    pub binary: PathBuf,

    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_top_p")]
    pub top_p: f32,

    #[serde(default = "default_model_timeout_sec")]
    pub timeout_sec: u64,

    /// How many trailing history messages accompany each prompt
    #[serde(default = "default_history_window")]
    pub history_window: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            provider: ModelProvider::default(),
            model: default_model(),
            binary: default_claude_binary(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            top_p: default_top_p(),
            timeout_sec: default_model_timeout_sec(),
            history_window: default_history_window(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LookupProvider {
    #[default]
    None,
    Command,
}

/// Web search settings. `args` may reference `{query}`, `{max_results}`, `{region}` and `{safesearch}`.
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct LookupConfig {
    #[serde(default)]
    pub provider: LookupProvider,

    #[serde(default = "default_search_program")]
    pub program: PathBuf,

    #[serde(default = "default_search_args")]
    pub args: Vec<String>,

    #[serde(default = "default_max_results")]
    pub max_results: usize,

    #[serde(default = "default_region")]
    pub region: String,

    #[serde(default = "default_safesearch")]
    pub safesearch: String,

    #[serde(default = "default_lookup_timeout_sec")]
    pub timeout_sec: u64,

    #[serde(default = "default_max_lookups_per_specialist")]
    pub max_per_specialist: u32,
}

impl Default for LookupConfig {
    fn default() -> Self {
        Self {
            provider: LookupProvider::default(),
            program: default_search_program(),
            args: default_search_args(),
            max_results: default_max_results(),
            region: default_region(),
            safesearch: default_safesearch(),
            timeout_sec: default_lookup_timeout_sec(),
            max_per_specialist: default_max_lookups_per_specialist(),
        }
    }
}

impl LookupConfig {
    pub fn enabled(&self) -> bool {
        self.provider != LookupProvider::None
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct WorkflowConfig {
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Required specialists, in the order the coordinator visits them
    #[serde(default = "default_specialists")]
    pub specialists: Vec<SpecialistKind>,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            specialists: default_specialists(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct RetryConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Finished runs kept for polling and download before the oldest are evicted
    #[serde(default = "default_retain_completed")]
    pub retain_completed: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            retain_completed: default_retain_completed(),
        }
    }
}
