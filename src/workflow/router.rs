use super::state::{LookupRequest, PlanningState};
use crate::specialist::SpecialistKind;

/// The coordinator's next move
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextStep {
    Specialist(SpecialistKind),
    Lookup(LookupRequest),
    Synthesize,
    Terminate,
}

impl std::fmt::Display for NextStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NextStep::Specialist(kind) => write!(f, "{}", kind),
            NextStep::Lookup(request) => write!(f, "lookup for {}", request.specialist),
            NextStep::Synthesize => write!(f, "synthesis"),
            NextStep::Terminate => write!(f, "terminate"),
        }
    }
}

/// Decide the next step from a state snapshot.
///
/// Pure: the same snapshot always yields the same step. The iteration ceiling wins over
/// everything except termination, so a run can always be closed out.
pub fn route(state: &PlanningState) -> NextStep {
    if state.final_plan.is_some() {
        return NextStep::Terminate;
    }

    if state.iteration >= state.max_iterations {
        return NextStep::Synthesize;
    }

    if let Some(request) = &state.pending_lookup {
        return NextStep::Lookup(request.clone());
    }

    if let Some(current) = state.current_agent {
        if state.required.contains(&current) && !state.has_result(current) {
            return NextStep::Specialist(current);
        }
    }

    match state.required.iter().find(|k| !state.has_result(**k)) {
        Some(kind) => NextStep::Specialist(*kind),
        None => NextStep::Synthesize,
    }
}
