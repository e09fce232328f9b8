mod claude;
mod offline;

pub use claude::ClaudeReasoner;
pub use offline::OfflineReasoner;

use crate::config::{Config, ModelProvider};
use crate::error::ProviderError;
use crate::workflow::state::Message;
use async_trait::async_trait;
use std::sync::Arc;

/// Sampling parameters passed with every reasoning call.
///
/// Each reasoner applies what its backend understands. The `claude` CLI takes
/// `model` and `max_tokens` but exposes no sampling controls, so `temperature`
/// and `top_p` only appear in its debug log.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationParams {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: f32,
}

impl GenerationParams {
    pub fn from_config(config: &Config) -> Self {
        Self {
            model: config.model.model.clone(),
            temperature: config.model.temperature,
            max_tokens: config.model.max_tokens,
            top_p: config.model.top_p,
        }
    }
}

#[async_trait]
pub trait Reasoner: Send + Sync {
    #[allow(dead_code)]
    fn name(&self) -> &'static str;

    async fn generate(
        &self,
        prompt: &str,
        history: &[Message],
        params: &GenerationParams,
    ) -> Result<String, ProviderError>;
}

/// Create the reasoning collaborator from configuration
pub fn create_reasoner(config: &Config) -> Arc<dyn Reasoner> {
    match config.model.provider {
        ModelProvider::ClaudeCli => Arc::new(ClaudeReasoner {
            binary: config.model.binary.clone(),
        }),
        ModelProvider::Offline => Arc::new(OfflineReasoner),
    }
}
