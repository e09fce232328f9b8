use super::{GenerationParams, Reasoner};
use crate::error::ProviderError;
use crate::workflow::state::Message;
use async_trait::async_trait;

/// Upper bound on reference notes echoed back as items
const MAX_ITEMS: usize = 5;

/// Deterministic reasoner that drafts replies from the prompt itself.
///
/// Echoes the `Task:` line as the summary and turns reference-note bullets into items,
/// so a plan can be produced with no model available.
pub struct OfflineReasoner;

#[async_trait]
impl Reasoner for OfflineReasoner {
    fn name(&self) -> &'static str {
        "offline"
    }

    async fn generate(
        &self,
        prompt: &str,
        _history: &[Message],
        _params: &GenerationParams,
    ) -> Result<String, ProviderError> {
        let task = prompt
            .lines()
            .find_map(|line| line.strip_prefix("Task:"))
            .map(|t| t.trim())
            .unwrap_or("travel notes");

        let items: Vec<String> = prompt
            .lines()
            .skip_while(|line| !line.starts_with("Reference notes:"))
            .skip(1)
            .take_while(|line| line.starts_with("- "))
            .filter_map(|line| line.strip_prefix("- "))
            .map(|note| note.split(": ").next().unwrap_or(note).trim().to_string())
            .filter(|note| !note.is_empty())
            .take(MAX_ITEMS)
            .collect();

        let reply = serde_json::json!({
            "summary": format!("Offline draft: {}", task),
            "items": items,
        });
        Ok(reply.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params() -> GenerationParams {
        GenerationParams {
            model: "offline".to_string(),
            temperature: 0.0,
            max_tokens: 0,
            top_p: 1.0,
        }
    }

    #[tokio::test]
    async fn test_offline_reply_is_deterministic_json() {
        let prompt = "Brief\n\nReference notes:\n- Belem Tower: fortress\n- Alfama: old town\n\nTask: Recommend attractions in Lisbon.";
        let first = OfflineReasoner.generate(prompt, &[], &params()).await.unwrap();
        let second = OfflineReasoner.generate(prompt, &[], &params()).await.unwrap();
        assert_eq!(first, second);

        let reply = crate::parser::parse_reply(&first);
        assert_eq!(reply.summary, "Offline draft: Recommend attractions in Lisbon.");
        assert_eq!(reply.items, vec!["Belem Tower", "Alfama"]);
    }
}
