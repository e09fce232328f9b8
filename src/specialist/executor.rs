use super::{
    DegradeCause, FindingsInput, ResultStatus, Specialist, SpecialistKind, SpecialistOutcome,
    SpecialistResult,
};
use crate::config::Config;
use crate::error::ProviderError;
use crate::lookup::SearchHit;
use crate::parser::parse_reply;
use crate::provider::{GenerationParams, Reasoner};
use crate::request::TripRequest;
use crate::workflow::retry::retry_with_backoff;
use crate::workflow::state::PlanningState;
use std::collections::BTreeMap;
use tokio::time::timeout;
use tracing::{debug, info, warn};

/// Reference notes included in a prompt
const MAX_NOTES: usize = 8;

fn trip_section(trip: &TripRequest) -> String {
    let mut lines = vec![
        format!("- Destination: {}", trip.destination),
        format!(
            "- Dates: {} ({} days)",
            trip.travel_dates(),
            trip.duration_days()
        ),
        format!("- Group size: {}", trip.group_size),
        format!("- Budget: {} ({})", trip.budget, trip.currency),
        format!("- Activity level: {}", trip.activity_level),
    ];
    if !trip.interests.is_empty() {
        lines.push(format!("- Interests: {}", trip.interests.join(", ")));
    }
    if let Some(dietary) = &trip.dietary {
        lines.push(format!("- Dietary needs: {}", dietary));
    }
    if let Some(mobility) = &trip.mobility {
        lines.push(format!("- Mobility: {}", mobility));
    }
    lines.join("\n")
}

fn prior_section(
    prior: &BTreeMap<SpecialistKind, SpecialistResult>,
    own: SpecialistKind,
) -> Option<String> {
    let lines: Vec<String> = prior
        .values()
        .filter(|r| r.specialist != own)
        .map(|r| {
            if r.items.is_empty() {
                format!("- {}: {}", r.specialist, r.summary)
            } else {
                format!("- {}: {} ({})", r.specialist, r.summary, r.items.join("; "))
            }
        })
        .collect();
    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}

/// Assemble the prompt for one reasoning call
pub fn build_prompt(
    specialist: &dyn Specialist,
    state: &PlanningState,
    hits: &[SearchHit],
    may_search: bool,
) -> String {
    let trip = &state.trip;
    let mut prompt = format!("{}\n\nTrip:\n{}", specialist.brief(), trip_section(trip));

    if specialist.uses_prior_findings() {
        if let Some(prior) = prior_section(&state.agent_outputs, specialist.kind()) {
            prompt.push_str(&format!("\n\nFindings so far:\n{}", prior));
        }
    }

    if !hits.is_empty() {
        let notes = hits
            .iter()
            .take(MAX_NOTES)
            .map(|hit| format!("- {}: {}", hit.title, hit.snippet))
            .collect::<Vec<_>>()
            .join("\n");
        prompt.push_str(&format!("\n\nReference notes:\n{}", notes));
    }

    prompt.push_str(&format!(
        "\n\nTask: {}\n\nRespond with a JSON object: {{\"summary\": \"...\", \"items\": [\"...\"], {}}}",
        specialist.task(trip),
        specialist.response_fields()
    ));

    if may_search {
        prompt.push_str(
            "\nIf you need current information first, reply with a single line: NEED_SEARCH: <query>",
        );
    }

    prompt
}

fn degrade_cause(error: &ProviderError) -> DegradeCause {
    match error {
        ProviderError::Timeout(_) => DegradeCause::Timeout,
        ProviderError::RateLimited(_) => DegradeCause::RateLimited,
        _ => DegradeCause::ReasonerFailed,
    }
}

/// Run one step of a specialist against a read-only view of the state.
///
/// Never fails: collaborator errors turn into a degraded result built from the fallback.
pub async fn run_specialist(
    kind: SpecialistKind,
    state: &PlanningState,
    config: &Config,
    reasoner: &dyn Reasoner,
) -> SpecialistOutcome {
    let specialist = kind.specialist();
    let trip = &state.trip;
    let record = state.lookup_record(kind);
    let queries_made = record.map(|r| r.queries.len()).unwrap_or(0);
    let lookup_budget = if config.lookup.enabled() {
        config.lookup.max_per_specialist as usize
    } else {
        0
    };

    if queries_made == 0 && lookup_budget > 0 {
        if let Some(query) = specialist.grounding_query(trip) {
            debug!("{} grounding with '{}'", kind, query);
            return SpecialistOutcome::NeedsLookup { query };
        }
    }

    let hits: &[SearchHit] = record.map(|r| r.hits.as_slice()).unwrap_or(&[]);
    let may_search = queries_made < lookup_budget;
    let prompt = build_prompt(specialist, state, hits, may_search);
    let history = state.recent_messages(config.model.history_window);
    let params = GenerationParams::from_config(config);
    let model_timeout = config.model_timeout();

    let reply = retry_with_backoff(&config.retry, ProviderError::is_retryable, || async {
        match timeout(model_timeout, reasoner.generate(&prompt, history, &params)).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(model_timeout)),
        }
    })
    .await;

    let raw = match reply {
        Ok(raw) => raw,
        Err(e) => {
            let cause = degrade_cause(&e);
            warn!("{} degraded ({}): {}", kind, cause, e);
            return SpecialistOutcome::Finished(SpecialistResult {
                specialist: kind,
                summary: format!(
                    "{} for {} unavailable ({})",
                    kind.label(),
                    trip.destination,
                    cause
                ),
                items: Vec::new(),
                findings: specialist.fallback(trip),
                status: ResultStatus::Degraded { cause },
                lookups: queries_made,
            });
        }
    };

    let parsed = parse_reply(&raw);
    if let Some(query) = &parsed.lookup_request {
        if may_search {
            debug!("{} asked for a search: '{}'", kind, query);
            return SpecialistOutcome::NeedsLookup {
                query: query.clone(),
            };
        }
        debug!("{} search budget spent, ignoring '{}'", kind, query);
    }

    let findings = specialist.findings(&FindingsInput {
        trip,
        reply: &parsed,
        hits,
        prior: &state.agent_outputs,
    });

    let status = match record {
        Some(r) if !r.failures.is_empty() => ResultStatus::Degraded {
            cause: DegradeCause::LookupFailed,
        },
        _ => ResultStatus::Complete,
    };

    let summary = if parsed.summary.is_empty() {
        format!("{} for {}", kind.label(), trip.destination)
    } else {
        parsed.summary.clone()
    };

    info!("{} finished with {} items", kind, parsed.items.len());
    SpecialistOutcome::Finished(SpecialistResult {
        specialist: kind,
        summary,
        items: parsed.items,
        findings,
        status,
        lookups: queries_made,
    })
}
