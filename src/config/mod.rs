mod defaults;
mod types;

pub use types::*;

use crate::error::ConfigError;
use defaults::*;
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

impl Default for Config {
    fn default() -> Self {
        Self {
            version: default_version(),
            model: ModelConfig::default(),
            lookup: LookupConfig::default(),
            workflow: WorkflowConfig::default(),
            retry: RetryConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

impl Config {
    /// Load config from a YAML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
            path: path.to_path_buf(),
            source: e,
        })?;

        let config: Config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Validate the config
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=2.0).contains(&self.model.temperature) {
            return Err(ConfigError::InvalidValue {
                field: "model.temperature",
                reason: format!("{} is outside 0.0..=2.0", self.model.temperature),
            });
        }

        if self.model.top_p <= 0.0 || self.model.top_p > 1.0 {
            return Err(ConfigError::InvalidValue {
                field: "model.top_p",
                reason: format!("{} is outside (0.0, 1.0]", self.model.top_p),
            });
        }

        if self.workflow.max_iterations == 0 {
            return Err(ConfigError::InvalidValue {
                field: "workflow.max_iterations",
                reason: "must be at least 1".to_string(),
            });
        }

        if self.workflow.specialists.is_empty() {
            return Err(ConfigError::NoSpecialists);
        }

        let mut seen = HashSet::new();
        for kind in &self.workflow.specialists {
            if !seen.insert(*kind) {
                return Err(ConfigError::DuplicateSpecialist(kind.to_string()));
            }
        }

        if self.server.retain_completed == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.retain_completed",
                reason: "must keep at least one finished run".to_string(),
            });
        }

        if self.lookup.enabled() && self.lookup.program.as_os_str().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "lookup.program",
                reason: "command lookup needs a program".to_string(),
            });
        }

        Ok(())
    }

    pub fn model_timeout(&self) -> Duration {
        Duration::from_secs(self.model.timeout_sec)
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup.timeout_sec)
    }
}
