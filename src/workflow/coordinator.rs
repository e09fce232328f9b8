use super::router::{route, NextStep};
use super::state::{LookupRequest, Message, PlanningState, Role};
use super::synthesizer::synthesize;
use crate::config::Config;
use crate::error::{LookupError, WorkflowError};
use crate::lookup::{create_lookup, Lookup, SearchHit};
use crate::plan::FinalPlan;
use crate::provider::{create_reasoner, Reasoner};
use crate::request::TripRequest;
use crate::specialist::{run_specialist, DegradeCause, SpecialistOutcome};
use crate::status::StatusTracker;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// Lifecycle of one planning run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Pending,
    Running,
    Synthesizing,
    Completed,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseEvent {
    Start,
    Route,
    BeginSynthesis,
    Finish,
    Fail,
}

impl Phase {
    /// Transition table. Anything not listed is a bug in the coordinator.
    pub fn on(self, event: PhaseEvent) -> Result<Phase, WorkflowError> {
        match (self, event) {
            (Phase::Pending, PhaseEvent::Start) => Ok(Phase::Running),
            (Phase::Running, PhaseEvent::Route) => Ok(Phase::Running),
            (Phase::Running, PhaseEvent::BeginSynthesis) => Ok(Phase::Synthesizing),
            (Phase::Synthesizing, PhaseEvent::Finish) => Ok(Phase::Completed),
            (Phase::Pending | Phase::Running | Phase::Synthesizing, PhaseEvent::Fail) => {
                Ok(Phase::Error)
            }
            (from, event) => Err(WorkflowError::IllegalTransition {
                from: format!("{:?}", from),
                event: format!("{:?}", event),
            }),
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Pending => write!(f, "pending"),
            Phase::Running => write!(f, "running"),
            Phase::Synthesizing => write!(f, "synthesizing"),
            Phase::Completed => write!(f, "completed"),
            Phase::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug)]
pub struct CompletedRun {
    pub plan: FinalPlan,
    pub state: PlanningState,
    pub duration: Duration,
}

pub struct Coordinator {
    config: Arc<Config>,
    reasoner: Arc<dyn Reasoner>,
    lookup: Arc<dyn Lookup>,
}

impl Coordinator {
    pub fn new(config: Arc<Config>, reasoner: Arc<dyn Reasoner>, lookup: Arc<dyn Lookup>) -> Self {
        Self {
            config,
            reasoner,
            lookup,
        }
    }

    pub fn from_config(config: Arc<Config>) -> Self {
        let reasoner = create_reasoner(&config);
        let lookup = create_lookup(&config);
        Self::new(config, reasoner, lookup)
    }

    /// Plan one trip to completion, publishing progress through `tracker`
    pub async fn run(
        &self,
        request: TripRequest,
        tracker: &StatusTracker,
    ) -> Result<CompletedRun, WorkflowError> {
        let start = Instant::now();
        let mut state = PlanningState::new(
            request,
            self.config.workflow.specialists.clone(),
            self.config.workflow.max_iterations,
        );
        let mut phase = Phase::Pending;

        match self.drive(&mut state, &mut phase, tracker).await {
            Ok(plan) => {
                info!(
                    "Planned {} in {} iterations ({:?}), quality {:.3}, digest {}",
                    plan.destination,
                    state.iteration,
                    start.elapsed(),
                    plan.quality_score,
                    plan.digest()
                );
                tracker.completed(plan.clone());
                Ok(CompletedRun {
                    plan,
                    state,
                    duration: start.elapsed(),
                })
            }
            Err(e) => {
                phase = phase.on(PhaseEvent::Fail).unwrap_or(Phase::Error);
                error!("Planning ended in {} phase: {}", phase, e);
                tracker.failed(&e.to_string());
                Err(e)
            }
        }
    }

    async fn drive(
        &self,
        state: &mut PlanningState,
        phase: &mut Phase,
        tracker: &StatusTracker,
    ) -> Result<FinalPlan, WorkflowError> {
        *phase = phase.on(PhaseEvent::Start)?;
        tracker.running(state, "Planning started");

        loop {
            // The terminating pass is not counted
            if state.final_plan.is_none() {
                state.iteration += 1;
            }

            let step = route(state);
            debug!("Iteration {}: {}", state.iteration, step);

            match step {
                NextStep::Specialist(kind) => {
                    *phase = phase.on(PhaseEvent::Route)?;
                    state.current_agent = Some(kind);
                    state.push_message(Message::new(
                        Role::Coordinator,
                        None,
                        format!("Routing to {} (iteration {})", kind, state.iteration),
                    ));
                    tracker.running(state, format!("Working on {}", kind.label()));

                    match run_specialist(kind, state, &self.config, self.reasoner.as_ref()).await
                    {
                        SpecialistOutcome::NeedsLookup { query } => {
                            state.apply_lookup_request(kind, query);
                        }
                        SpecialistOutcome::Finished(result) => {
                            if let Some(cause) = result.status.cause() {
                                warn!("{} returned a degraded result ({})", kind, cause);
                            }
                            state.apply_result(result);
                            tracker.running(state, format!("Finished {}", kind.label()));
                        }
                    }
                }
                NextStep::Lookup(request) => {
                    *phase = phase.on(PhaseEvent::Route)?;
                    state.push_message(Message::new(
                        Role::Coordinator,
                        None,
                        format!(
                            "Routing to lookup for {} (iteration {})",
                            request.specialist, state.iteration
                        ),
                    ));
                    tracker.running(state, format!("Searching: {}", request.query));

                    let outcome = self.run_lookup(&request).await;
                    state.apply_lookup(&request, outcome);
                }
                NextStep::Synthesize => {
                    if quota_exhausted(state) {
                        return Err(WorkflowError::QuotaExhausted);
                    }
                    if state.completed_count() < state.required.len() {
                        warn!(
                            "Iteration ceiling reached with {}/{} specialists done",
                            state.completed_count(),
                            state.required.len()
                        );
                    }

                    *phase = phase.on(PhaseEvent::BeginSynthesis)?;
                    state.current_agent = None;
                    state.push_message(Message::new(
                        Role::Coordinator,
                        None,
                        format!("Routing to synthesis (iteration {})", state.iteration),
                    ));
                    tracker.synthesizing(state);

                    let plan = synthesize(state)?;
                    state.final_plan = Some(plan);
                    *phase = phase.on(PhaseEvent::Finish)?;
                }
                NextStep::Terminate => {
                    return state.final_plan.clone().ok_or_else(|| {
                        WorkflowError::NoRoutableStep("terminated without a plan".to_string())
                    });
                }
            }
        }
    }

    async fn run_lookup(&self, request: &LookupRequest) -> Result<Vec<SearchHit>, String> {
        let limit = self.config.lookup_timeout();
        debug!("Lookup for {}: '{}'", request.specialist, request.query);

        let result = match timeout(limit, self.lookup.search(&request.query)).await {
            Ok(result) => result,
            Err(_) => Err(LookupError::Timeout(limit)),
        };

        match result {
            Ok(mut hits) => {
                hits.truncate(self.config.lookup.max_results);
                Ok(hits)
            }
            Err(e) => {
                warn!("Lookup '{}' failed: {}", request.query, e);
                Err(e.to_string())
            }
        }
    }
}

/// Every required specialist answered, and every answer was a rate-limit fallback
fn quota_exhausted(state: &PlanningState) -> bool {
    !state.required.is_empty()
        && state.required.iter().all(|k| {
            state.agent_outputs.get(k).and_then(|r| r.status.cause())
                == Some(DegradeCause::RateLimited)
        })
}
