//! Caller-facing planning status.
//!
//! The workflow publishes snapshots through a `watch` channel; pollers read the latest
//! snapshot by cloning it. Readers never hold a lock the workflow needs.

use crate::plan::FinalPlan;
use crate::workflow::state::PlanningState;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::RwLock;
use tokio::sync::watch;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    Pending,
    Running,
    Completed,
    Error,
}

impl RunState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Completed | RunState::Error)
    }
}

impl std::fmt::Display for RunState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RunState::Pending => write!(f, "pending"),
            RunState::Running => write!(f, "running"),
            RunState::Completed => write!(f, "completed"),
            RunState::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanningStatus {
    pub planning_id: String,
    pub status: RunState,
    pub progress: u8,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<FinalPlan>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_agent: Option<String>,
    pub iteration: u32,
}

impl PlanningStatus {
    pub fn pending(planning_id: &str) -> Self {
        Self {
            planning_id: planning_id.to_string(),
            status: RunState::Pending,
            progress: 0,
            message: "Planning request received".to_string(),
            result: None,
            error: None,
            current_agent: None,
            iteration: 0,
        }
    }
}

/// Progress for a running workflow, from specialist coverage and iteration count
pub fn running_progress(state: &PlanningState) -> u8 {
    let required = state.required.len().max(1) as f64;
    let coverage = 10.0 + 80.0 * state.completed_count() as f64 / required;
    let iterations = 100.0 * state.iteration as f64 / state.max_iterations.max(1) as f64;
    coverage.max(iterations).clamp(10.0, 90.0) as u8
}

/// Write side of one planning run's status
pub struct StatusTracker {
    tx: watch::Sender<PlanningStatus>,
}

impl StatusTracker {
    pub fn new(planning_id: &str) -> Self {
        let (tx, _rx) = watch::channel(PlanningStatus::pending(planning_id));
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<PlanningStatus> {
        self.tx.subscribe()
    }

    pub fn snapshot(&self) -> PlanningStatus {
        self.tx.borrow().clone()
    }

    /// Apply an update; progress never moves backwards and terminal states are final
    fn update(&self, apply: impl FnOnce(&mut PlanningStatus)) {
        self.tx.send_modify(|status| {
            if status.status.is_terminal() {
                return;
            }
            let floor = status.progress;
            apply(status);
            status.progress = status.progress.max(floor);
            debug!(
                "Status {}: {} {}% {}",
                status.planning_id, status.status, status.progress, status.message
            );
        });
    }

    pub fn running(&self, state: &PlanningState, message: impl Into<String>) {
        let progress = running_progress(state);
        let message = message.into();
        self.update(|status| {
            status.status = RunState::Running;
            status.progress = progress;
            status.message = message;
            status.current_agent = state.current_agent.map(|k| k.name().to_string());
            status.iteration = state.iteration;
        });
    }

    pub fn synthesizing(&self, state: &PlanningState) {
        self.update(|status| {
            status.status = RunState::Running;
            status.progress = 95;
            status.message = "Synthesizing the final plan".to_string();
            status.current_agent = None;
            status.iteration = state.iteration;
        });
    }

    pub fn completed(&self, plan: FinalPlan) {
        self.update(|status| {
            status.status = RunState::Completed;
            status.progress = 100;
            status.message = format!("Trip plan for {} is ready", plan.destination);
            status.result = Some(plan);
            status.current_agent = None;
        });
    }

    pub fn failed(&self, error: &str) {
        let error = error.to_string();
        self.update(|status| {
            status.status = RunState::Error;
            status.message = format!("Planning failed: {}", error);
            status.error = Some(error);
            status.current_agent = None;
        });
    }
}

/// Process-wide index of planning runs, read by the status poll.
///
/// Finished runs are kept for download until more than `retain_completed` of them pile up;
/// the oldest are evicted first. Runs still in flight are never evicted.
pub struct PlanningRegistry {
    runs: RwLock<Runs>,
    retain_completed: usize,
}

#[derive(Default)]
struct Runs {
    entries: HashMap<String, Entry>,
    next_seq: u64,
}

struct Entry {
    seq: u64,
    rx: watch::Receiver<PlanningStatus>,
}

impl Entry {
    /// Latest snapshot; a run whose writer is gone without a terminal state failed
    fn snapshot(&self) -> PlanningStatus {
        let mut status = self.rx.borrow().clone();
        if !status.status.is_terminal() && self.rx.has_changed().is_err() {
            status.status = RunState::Error;
            status.error = Some("planning stopped without a result".to_string());
            status.message = "Planning failed: planning stopped without a result".to_string();
            status.current_agent = None;
        }
        status
    }
}

impl PlanningRegistry {
    pub fn new(retain_completed: usize) -> Self {
        Self {
            runs: RwLock::new(Runs::default()),
            retain_completed,
        }
    }

    /// Start tracking a new run, evicting surplus finished runs first
    pub fn register(&self, planning_id: &str) -> StatusTracker {
        let tracker = StatusTracker::new(planning_id);
        let mut runs = match self.runs.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Self::evict(&mut runs, self.retain_completed);

        let seq = runs.next_seq;
        runs.next_seq += 1;
        runs.entries.insert(
            planning_id.to_string(),
            Entry {
                seq,
                rx: tracker.subscribe(),
            },
        );
        tracker
    }

    fn evict(runs: &mut Runs, retain: usize) {
        let mut finished: Vec<(u64, String)> = runs
            .entries
            .iter()
            .filter(|(_, entry)| entry.snapshot().status.is_terminal())
            .map(|(id, entry)| (entry.seq, id.clone()))
            .collect();
        if finished.len() <= retain {
            return;
        }
        finished.sort();
        let surplus = finished.len() - retain;
        for (_, id) in finished.into_iter().take(surplus) {
            debug!("Evicting finished planning run {}", id);
            runs.entries.remove(&id);
        }
    }

    /// Latest snapshot for a run, if it is known
    pub fn status(&self, planning_id: &str) -> Option<PlanningStatus> {
        let runs = match self.runs.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        runs.entries.get(planning_id).map(Entry::snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{TripForm, TripRequest};
    use crate::specialist::SpecialistKind;

    fn state() -> PlanningState {
        let trip = TripRequest::from_form(&TripForm {
            destination: "Lisbon".to_string(),
            start_date: "2025-06-10".to_string(),
            end_date: "2025-06-15".to_string(),
            ..Default::default()
        })
        .unwrap();
        PlanningState::new(trip, SpecialistKind::ALL.to_vec(), 50)
    }

    #[test]
    fn test_running_progress_formula() {
        let mut s = state();
        assert_eq!(running_progress(&s), 10);
        s.iteration = 45;
        assert_eq!(running_progress(&s), 90);
        s.iteration = 30;
        assert_eq!(running_progress(&s), 60);
    }

    #[test]
    fn test_progress_never_decreases() {
        let registry = PlanningRegistry::new(8);
        let tracker = registry.register("abc");
        let mut s = state();

        let mut seen = vec![registry.status("abc").unwrap().progress];
        s.iteration = 20;
        tracker.running(&s, "step");
        seen.push(registry.status("abc").unwrap().progress);
        // A later step with lower raw progress must not move the needle back
        s.iteration = 2;
        tracker.running(&s, "step");
        seen.push(registry.status("abc").unwrap().progress);
        tracker.synthesizing(&s);
        seen.push(registry.status("abc").unwrap().progress);
        tracker.failed("boom");
        seen.push(registry.status("abc").unwrap().progress);

        assert!(seen.windows(2).all(|w| w[0] <= w[1]), "{:?}", seen);
        assert_eq!(seen, vec![0, 40, 40, 95, 95]);

        let status = registry.status("abc").unwrap();
        assert_eq!(status.status, RunState::Error);
        assert_eq!(status.error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_terminal_state_is_final() {
        let tracker = StatusTracker::new("t");
        tracker.failed("first");
        tracker.running(&state(), "late update");
        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.status, RunState::Error);
        assert_eq!(snapshot.error.as_deref(), Some("first"));
    }

    #[test]
    fn test_finished_runs_are_evicted_oldest_first() {
        let registry = PlanningRegistry::new(2);
        for id in ["a", "b", "c", "d"] {
            registry.register(id).failed("done");
        }
        let in_flight = registry.register("e");
        assert!(registry.status("a").is_none());
        assert!(registry.status("b").is_none());
        assert!(registry.status("c").is_some());
        assert!(registry.status("d").is_some());

        // Running entries survive any amount of churn
        for id in ["f", "g", "h"] {
            registry.register(id).failed("done");
        }
        registry.register("i");
        assert_eq!(registry.status("e").unwrap().status, RunState::Pending);
        drop(in_flight);
    }

    #[test]
    fn test_dropped_tracker_reads_as_error() {
        let registry = PlanningRegistry::new(8);
        let tracker = registry.register("lost");
        tracker.running(&state(), "working");
        drop(tracker);

        let status = registry.status("lost").unwrap();
        assert_eq!(status.status, RunState::Error);
        assert_eq!(status.progress, 10);
        assert_eq!(
            status.error.as_deref(),
            Some("planning stopped without a result")
        );

        let finished = registry.register("done");
        finished.failed("boom");
        drop(finished);
        assert_eq!(registry.status("done").unwrap().error.as_deref(), Some("boom"));
    }

    #[test]
    fn test_unknown_planning_id() {
        let registry = PlanningRegistry::new(8);
        assert!(registry.status("missing").is_none());
        let pending = PlanningStatus::pending("x");
        let json = serde_json::to_value(&pending).unwrap();
        assert_eq!(json["status"], "pending");
        assert!(json.get("result").is_none());
    }
}
