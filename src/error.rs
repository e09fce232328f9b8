use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("No specialists enabled")]
    NoSpecialists,

    #[error("Specialist '{0}' listed more than once")]
    DuplicateSpecialist(String),
}

/// Rejections of an inbound planning request. Surfaced verbatim to the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RequestError {
    #[error("Destination is required")]
    MissingDestination,

    #[error("Invalid {field} '{value}': expected YYYY-MM-DD")]
    InvalidDate { field: &'static str, value: String },

    #[error("End date {end} must be after start date {start}")]
    EndNotAfterStart { start: String, end: String },

    #[error("Trip of {days} days exceeds the {max}-day limit")]
    TripTooLong { days: i64, max: i64 },

    #[error("Group size must be at least 1")]
    InvalidGroupSize,

    #[error("Unknown budget '{0}' (expected budget, mid-range or luxury)")]
    UnknownBudget(String),

    #[error("Unsupported currency '{0}'")]
    UnknownCurrency(String),

    #[error("Unknown activity level '{0}' (expected relaxed, moderate or active)")]
    UnknownActivityLevel(String),
}

#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Execution timed out after {0:?}")]
    Timeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Process failed with exit code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Model returned an empty response")]
    EmptyResponse,
}

impl ProviderError {
    /// Rate-limit and quota failures are worth another attempt; everything else is final.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderError::RateLimited(_))
    }
}

#[derive(Error, Debug)]
pub enum LookupError {
    #[error("Lookup timed out after {0:?}")]
    Timeout(Duration),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Search command failed with exit code {code}: {stderr}")]
    NonZeroExit { code: i32, stderr: String },

    #[error("Failed to parse search output: {0}")]
    Parse(String),
}

/// Failures that abort a planning run and move it to the error state.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WorkflowError {
    #[error("No routable step: {0}")]
    NoRoutableStep(String),

    #[error("Illegal phase transition from {from} on {event}")]
    IllegalTransition { from: String, event: String },

    #[error("Synthesis produced an inconsistent plan: {0}")]
    InconsistentPlan(String),

    #[error("Every specialist was rejected by the model provider (quota or rate limit)")]
    QuotaExhausted,
}

#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        source: std::io::Error,
    },

    #[error("Server error: {0}")]
    Serve(#[from] std::io::Error),
}
