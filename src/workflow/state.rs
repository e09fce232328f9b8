//! The planning record threaded through every workflow step.
//!
//! Specialists never touch this directly: they return a [`SpecialistOutcome`] and the
//! coordinator folds it in through the `apply_*` methods, so every mutation happens in one place.

use crate::lookup::SearchHit;
use crate::plan::FinalPlan;
use crate::request::TripRequest;
use crate::specialist::{SpecialistKind, SpecialistResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Coordinator,
    Specialist,
    Tool,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Coordinator => write!(f, "coordinator"),
            Role::Specialist => write!(f, "specialist"),
            Role::Tool => write!(f, "tool"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub content: String,
}

impl Message {
    pub fn new(role: Role, name: Option<&str>, content: impl Into<String>) -> Self {
        Self {
            role,
            name: name.map(|n| n.to_string()),
            content: content.into(),
        }
    }
}

/// A lookup a specialist asked for and has not received yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupRequest {
    pub specialist: SpecialistKind,
    pub query: String,
}

/// Every lookup issued on behalf of one specialist
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LookupRecord {
    pub queries: Vec<String>,
    pub hits: Vec<SearchHit>,
    pub failures: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningState {
    pub messages: Vec<Message>,
    pub trip: TripRequest,
    /// Specialists that must contribute, in visiting order
    pub required: Vec<SpecialistKind>,
    pub max_iterations: u32,
    pub agent_outputs: BTreeMap<SpecialistKind, SpecialistResult>,
    pub current_agent: Option<SpecialistKind>,
    pub pending_lookup: Option<LookupRequest>,
    pub lookups: BTreeMap<SpecialistKind, LookupRecord>,
    pub iteration: u32,
    pub final_plan: Option<FinalPlan>,
}

impl PlanningState {
    pub fn new(trip: TripRequest, required: Vec<SpecialistKind>, max_iterations: u32) -> Self {
        let request_json = serde_json::to_string(&trip).unwrap_or_default();
        Self {
            messages: vec![Message::new(
                Role::User,
                None,
                format!("Plan a trip with these requirements: {}", request_json),
            )],
            trip,
            required,
            max_iterations,
            agent_outputs: BTreeMap::new(),
            current_agent: None,
            pending_lookup: None,
            lookups: BTreeMap::new(),
            iteration: 0,
            final_plan: None,
        }
    }

    pub fn has_result(&self, kind: SpecialistKind) -> bool {
        self.agent_outputs.contains_key(&kind)
    }

    /// Required specialists that have produced a result, degraded or not
    pub fn completed_count(&self) -> usize {
        self.required
            .iter()
            .filter(|k| self.agent_outputs.contains_key(k))
            .count()
    }

    pub fn lookup_record(&self, kind: SpecialistKind) -> Option<&LookupRecord> {
        self.lookups.get(&kind)
    }

    /// The trailing `window` messages of the conversation
    pub fn recent_messages(&self, window: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(window);
        &self.messages[start..]
    }

    pub fn push_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    pub fn apply_result(&mut self, result: SpecialistResult) {
        let kind = result.specialist;
        self.push_message(Message::new(
            Role::Specialist,
            Some(kind.name()),
            result.summary.clone(),
        ));
        self.agent_outputs.insert(kind, result);
    }

    pub fn apply_lookup_request(&mut self, specialist: SpecialistKind, query: String) {
        self.push_message(Message::new(
            Role::Specialist,
            Some(specialist.name()),
            format!("NEED_SEARCH: {}", query),
        ));
        self.pending_lookup = Some(LookupRequest { specialist, query });
    }

    /// Record a finished lookup and hand control back to the requesting specialist
    pub fn apply_lookup(
        &mut self,
        request: &LookupRequest,
        outcome: Result<Vec<SearchHit>, String>,
    ) {
        let record = self.lookups.entry(request.specialist).or_default();
        record.queries.push(request.query.clone());

        let content = match outcome {
            Ok(hits) => {
                let content = format!(
                    "Search results for '{}': {} hits",
                    request.query,
                    hits.len()
                );
                record.hits.extend(hits);
                content
            }
            Err(error) => {
                let content = format!("Search for '{}' failed: {}", request.query, error);
                record.failures.push(error);
                content
            }
        };

        self.push_message(Message::new(Role::Tool, Some("lookup"), content));
        self.pending_lookup = None;
        self.current_agent = Some(request.specialist);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::TripForm;

    fn trip() -> TripRequest {
        TripRequest::from_form(&TripForm {
            destination: "Lisbon".to_string(),
            start_date: "2025-06-10".to_string(),
            end_date: "2025-06-15".to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_new_state_seeds_history() {
        let state = PlanningState::new(trip(), SpecialistKind::ALL.to_vec(), 50);
        assert_eq!(state.messages.len(), 1);
        assert_eq!(state.messages[0].role, Role::User);
        assert!(state.messages[0].content.contains("Lisbon"));
        assert_eq!(state.iteration, 0);
        assert_eq!(state.completed_count(), 0);
    }

    #[test]
    fn test_lookup_round_trip_returns_to_specialist() {
        let mut state = PlanningState::new(trip(), SpecialistKind::ALL.to_vec(), 50);
        state.apply_lookup_request(SpecialistKind::Weather, "lisbon june weather".to_string());
        let request = state.pending_lookup.clone().unwrap();

        state.apply_lookup(&request, Err("timed out".to_string()));

        assert!(state.pending_lookup.is_none());
        assert_eq!(state.current_agent, Some(SpecialistKind::Weather));
        let record = state.lookup_record(SpecialistKind::Weather).unwrap();
        assert_eq!(record.queries, vec!["lisbon june weather"]);
        assert_eq!(record.failures, vec!["timed out"]);
        assert_eq!(state.recent_messages(1)[0].role, Role::Tool);
    }
}
