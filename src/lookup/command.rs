use super::{parse_hits, Lookup, SearchHit};
use crate::config::LookupConfig;
use crate::error::LookupError;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::process::Command;
use tracing::debug;

/// Runs an external search CLI (ddgr by default) and parses its JSON output
pub struct CommandLookup {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub max_results: usize,
    pub region: String,
    pub safesearch: String,
}

impl CommandLookup {
    pub fn from_config(config: &LookupConfig) -> Self {
        Self {
            program: config.program.clone(),
            args: config.args.clone(),
            max_results: config.max_results,
            region: config.region.clone(),
            safesearch: config.safesearch.clone(),
        }
    }

    fn render_args(&self, query: &str) -> Vec<String> {
        let max_results = self.max_results.to_string();
        self.args
            .iter()
            .map(|arg| {
                arg.replace("{query}", query)
                    .replace("{max_results}", &max_results)
                    .replace("{region}", &self.region)
                    .replace("{safesearch}", &self.safesearch)
            })
            .collect()
    }
}

#[async_trait]
impl Lookup for CommandLookup {
    fn name(&self) -> &'static str {
        "command"
    }

    async fn search(&self, query: &str) -> Result<Vec<SearchHit>, LookupError> {
        // Use string for PATH lookup if not an absolute/relative path
        let program_str = self.program.to_string_lossy();
        let mut cmd = if program_str.contains('/') || program_str.contains('\\') {
            Command::new(&self.program)
        } else {
            Command::new(program_str.as_ref())
        };

        cmd.args(self.render_args(query));
        cmd.kill_on_drop(true);

        debug!("Running search command for '{}'", query);
        let output = cmd.output().await?;

        if !output.status.success() {
            return Err(LookupError::NonZeroExit {
                code: output.status.code().unwrap_or(-1),
                stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            });
        }

        let mut hits = parse_hits(&String::from_utf8_lossy(&output.stdout))?;
        hits.truncate(self.max_results);
        Ok(hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(program: &str, args: &[&str]) -> CommandLookup {
        CommandLookup {
            program: PathBuf::from(program),
            args: args.iter().map(|s| s.to_string()).collect(),
            max_results: 1,
            region: "us-en".to_string(),
            safesearch: "moderate".to_string(),
        }
    }

    #[test]
    fn test_render_args() {
        let l = CommandLookup {
            max_results: 7,
            ..lookup("ddgr", &["--json", "-n", "{max_results}", "--reg", "{region}", "{query}"])
        };
        assert_eq!(
            l.render_args("porto food"),
            vec!["--json", "-n", "7", "--reg", "us-en", "porto food"]
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_search_via_shell_command() {
        let l = lookup(
            "sh",
            &[
                "-c",
                r#"echo '[{"title":"A","abstract":"a"},{"title":"B","abstract":"b"}]'"#,
            ],
        );
        let hits = l.search("ignored").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "A");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_failing_command() {
        let l = lookup("sh", &["-c", "echo boom >&2; exit 3"]);
        match l.search("x").await {
            Err(LookupError::NonZeroExit { code, stderr }) => {
                assert_eq!(code, 3);
                assert!(stderr.contains("boom"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }
}
