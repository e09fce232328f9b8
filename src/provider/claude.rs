use super::{GenerationParams, Reasoner};
use crate::error::ProviderError;
use crate::parser::unwrap_envelope;
use crate::workflow::state::Message;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::debug;

/// Reasoning through the `claude` CLI in print mode
pub struct ClaudeReasoner {
    pub binary: PathBuf,
}

impl ClaudeReasoner {
    fn render_prompt(prompt: &str, history: &[Message]) -> String {
        if history.is_empty() {
            return prompt.to_string();
        }
        let transcript = history
            .iter()
            .map(|m| match &m.name {
                Some(name) => format!("[{} {}] {}", m.role, name, m.content),
                None => format!("[{}] {}", m.role, m.content),
            })
            .collect::<Vec<_>>()
            .join("\n");
        format!("## Conversation so far\n{}\n\n{}", transcript, prompt)
    }

    /// Print-mode invocation. The CLI takes the model as a flag and the output budget
    /// through `CLAUDE_CODE_MAX_OUTPUT_TOKENS`; it has no sampling controls.
    fn build_command(&self, prompt: &str, params: &GenerationParams) -> Command {
        // Build command - use string for PATH lookup if not an absolute/relative path
        let binary_str = self.binary.to_string_lossy();
        let mut cmd = if binary_str.contains('/') || binary_str.contains('\\') {
            Command::new(&self.binary)
        } else {
            Command::new(binary_str.as_ref())
        };

        // Ensure subscription auth is used (not API key)
        cmd.env_remove("ANTHROPIC_API_KEY");
        cmd.env(MAX_OUTPUT_TOKENS_ENV, params.max_tokens.to_string());
        cmd.kill_on_drop(true);

        cmd.arg("-p")
            .arg(prompt)
            .arg("--model")
            .arg(&params.model)
            .arg("--output-format")
            .arg("json");
        cmd
    }
}

const MAX_OUTPUT_TOKENS_ENV: &str = "CLAUDE_CODE_MAX_OUTPUT_TOKENS";

/// Provider messages that mean "try again later"
fn is_rate_limit(text: &str) -> bool {
    let lower = text.to_lowercase();
    ["rate limit", "rate_limit", "429", "quota", "overloaded", "usage limit"]
        .iter()
        .any(|needle| lower.contains(needle))
}

#[async_trait]
impl Reasoner for ClaudeReasoner {
    fn name(&self) -> &'static str {
        "claude_cli"
    }

    async fn generate(
        &self,
        prompt: &str,
        history: &[Message],
        params: &GenerationParams,
    ) -> Result<String, ProviderError> {
        let full_prompt = Self::render_prompt(prompt, history);
        let mut cmd = self.build_command(&full_prompt, params);

        debug!(
            "claude call: model={} max_tokens={} (temperature={} top_p={} not supported by the CLI)",
            params.model, params.max_tokens, params.temperature, params.top_p
        );

        let output = cmd.output().await?;
        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();

        if !output.status.success() {
            if is_rate_limit(&stderr) || is_rate_limit(&stdout) {
                return Err(ProviderError::RateLimited(stderr.trim().to_string()));
            }
            return Err(ProviderError::NonZeroExit {
                code: output.status.code().unwrap_or(-1),
                stderr,
            });
        }

        let (text, is_error) = unwrap_envelope(&stdout);
        if is_error {
            if is_rate_limit(&text) {
                return Err(ProviderError::RateLimited(text));
            }
            return Err(ProviderError::NonZeroExit {
                code: output.status.code().unwrap_or(0),
                stderr: text,
            });
        }

        if text.trim().is_empty() {
            return Err(ProviderError::EmptyResponse);
        }

        Ok(stdout)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::workflow::state::Role;

    #[test]
    fn test_rate_limit_detection() {
        assert!(is_rate_limit("Error: 429 Too Many Requests"));
        assert!(is_rate_limit("Claude usage limit reached"));
        assert!(is_rate_limit("API overloaded"));
        assert!(!is_rate_limit("file not found"));
    }

    #[test]
    fn test_history_rendered_before_prompt() {
        let history = vec![
            Message::new(Role::User, None, "Plan a trip"),
            Message::new(Role::Coordinator, None, "Routing to weather_analyst"),
        ];
        let rendered = ClaudeReasoner::render_prompt("Task: weather", &history);
        assert!(rendered.starts_with("## Conversation so far\n[user] Plan a trip"));
        assert!(rendered.ends_with("Task: weather"));
        assert_eq!(ClaudeReasoner::render_prompt("solo", &[]), "solo");
    }

    #[test]
    fn test_command_forwards_model_and_output_budget() {
        let reasoner = ClaudeReasoner {
            binary: PathBuf::from("claude"),
        };
        let params = GenerationParams {
            model: "opus".to_string(),
            temperature: 0.2,
            max_tokens: 1500,
            top_p: 0.5,
        };
        let cmd = reasoner.build_command("Task: weather", &params);
        let std_cmd = cmd.as_std();

        let args: Vec<_> = std_cmd
            .get_args()
            .map(|a| a.to_string_lossy().to_string())
            .collect();
        assert_eq!(
            args,
            vec!["-p", "Task: weather", "--model", "opus", "--output-format", "json"]
        );

        let envs: Vec<_> = std_cmd
            .get_envs()
            .map(|(k, v)| {
                (
                    k.to_string_lossy().to_string(),
                    v.map(|v| v.to_string_lossy().to_string()),
                )
            })
            .collect();
        assert!(envs.contains(&(
            MAX_OUTPUT_TOKENS_ENV.to_string(),
            Some("1500".to_string())
        )));
        assert!(envs.contains(&("ANTHROPIC_API_KEY".to_string(), None)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_missing_binary_is_io_error() {
        let reasoner = ClaudeReasoner {
            binary: PathBuf::from("/nonexistent/claude"),
        };
        let params = GenerationParams {
            model: "sonnet".to_string(),
            temperature: 0.7,
            max_tokens: 100,
            top_p: 0.9,
        };
        let err = reasoner.generate("hi", &[], &params).await.unwrap_err();
        assert!(matches!(err, ProviderError::Io(_)));
        assert!(!err.is_retryable());
    }
}
