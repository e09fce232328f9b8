//! Merge specialist results into the final plan.
//!
//! Missing or degraded contributions are replaced by neutral placeholders, so every field of
//! [`FinalPlan`] is always populated. Output depends only on the state: no clocks, no randomness,
//! and ordered maps throughout.

use super::state::PlanningState;
use crate::error::WorkflowError;
use crate::plan::{
    ConsensusLevel, Contribution, DayPlan, ExpenseBreakdown, FinalPlan, Hotel, PlanItem,
};
use crate::request::round_cents;
use crate::specialist::{
    clothing_for, compare_tiers, estimate_expenses, nightly_rate, Findings, ResultStatus,
};
use std::collections::BTreeMap;
use tracing::debug;

pub const PLANNING_METHOD: &str = "Coordinated multi-specialist workflow";

/// Weight of specialist coverage in the quality score; consistency checks get the rest
const COVERAGE_WEIGHT: f64 = 0.7;

/// A quoted trip total further than this factor from the table estimate disagrees with it
const QUOTE_TOLERANCE: f64 = 2.0;

const INDOOR_KEYWORDS: [&str; 7] = [
    "museum", "gallery", "mall", "center", "indoor", "theater", "cinema",
];
const OUTDOOR_KEYWORDS: [&str; 8] = [
    "park", "garden", "tour", "walk", "outdoor", "beach", "view", "nature",
];

/// Everything the specialists found, with placeholders filled in
struct Merged {
    attractions: Vec<PlanItem>,
    forecast: String,
    avg_temperature_c: Option<f64>,
    clothing: String,
    breakdown: ExpenseBreakdown,
    hotels: Vec<Hotel>,
    restaurants: Vec<PlanItem>,
    local_tips: Vec<String>,
    day_themes: Vec<String>,
    /// Which fields came from research rather than placeholders
    provenance: Provenance,
}

#[derive(Default)]
struct Provenance {
    budget_reported: bool,
    quoted_total: Option<f64>,
    forecast_known: bool,
    attractions_researched: bool,
    restaurants_researched: bool,
}

fn merge(state: &PlanningState) -> Merged {
    let trip = &state.trip;
    let dest = &trip.destination;

    let mut merged = Merged {
        attractions: Vec::new(),
        forecast: String::new(),
        avg_temperature_c: None,
        clothing: clothing_for(None),
        breakdown: estimate_expenses(trip),
        hotels: Vec::new(),
        restaurants: Vec::new(),
        local_tips: Vec::new(),
        day_themes: Vec::new(),
        provenance: Provenance::default(),
    };
    let mut saving_tips = Vec::new();

    for result in state.agent_outputs.values() {
        match &result.findings {
            Findings::Destination { attractions } => merged.attractions = attractions.clone(),
            Findings::Weather {
                forecast,
                avg_temperature_c,
                packing,
            } => {
                merged.forecast = forecast.clone().unwrap_or_default();
                merged.avg_temperature_c = *avg_temperature_c;
                merged.clothing = clothing_for(*avg_temperature_c);
                if !packing.is_empty() {
                    merged.clothing =
                        format!("{}; also pack: {}", merged.clothing, packing.join(", "));
                }
            }
            Findings::Budget {
                breakdown,
                hotels,
                saving_tips: tips_from_budget,
                quoted_total,
            } => {
                merged.breakdown = *breakdown;
                merged.hotels = hotels.clone();
                merged.provenance.budget_reported = true;
                merged.provenance.quoted_total = *quoted_total;
                saving_tips = tips_from_budget.clone();
            }
            Findings::Local { restaurants, tips } => {
                merged.restaurants = restaurants.clone();
                merged.local_tips = tips.clone();
            }
            Findings::Itinerary { day_themes } => merged.day_themes = day_themes.clone(),
        }
    }

    merged.provenance.attractions_researched = !merged.attractions.is_empty();
    merged.provenance.forecast_known = !merged.forecast.trim().is_empty();
    merged.provenance.restaurants_researched = !merged.restaurants.is_empty();

    if merged.attractions.is_empty() {
        merged.attractions = vec![PlanItem::named(format!("Local highlights of {}", dest))];
    }
    if merged.forecast.trim().is_empty() {
        merged.forecast = format!(
            "Forecast unavailable for {}; check local conditions before departure",
            dest
        );
    }
    if merged.hotels.is_empty() {
        merged.hotels = vec![Hotel {
            name: "Accommodation to be confirmed".to_string(),
            rating: 0.0,
            price_per_night: nightly_rate(trip),
            address: "Address not available".to_string(),
            amenities: Vec::new(),
        }];
    }
    merged.local_tips.extend(saving_tips);
    if merged.restaurants.is_empty() {
        merged.restaurants = vec![PlanItem::named(format!("Local restaurant in {}", dest))];
    }

    merged
}

/// Broad weather category used to order each day's visits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conditions {
    Rainy,
    Cold,
    Hot,
    Sunny,
    Cloudy,
}

fn conditions(forecast: &str, avg_temperature_c: Option<f64>) -> Conditions {
    let forecast = forecast.to_lowercase();
    if ["rain", "storm", "shower"].iter().any(|w| forecast.contains(w)) {
        return Conditions::Rainy;
    }
    match avg_temperature_c {
        Some(t) if t < 10.0 => Conditions::Cold,
        Some(t) if t > 30.0 => Conditions::Hot,
        _ if forecast.contains("sun") || forecast.contains("clear") => Conditions::Sunny,
        _ => Conditions::Cloudy,
    }
}

fn mentions_any(item: &PlanItem, keywords: &[&str]) -> bool {
    let name = item.name.to_lowercase();
    let description = item.description.as_deref().unwrap_or("").to_lowercase();
    keywords
        .iter()
        .any(|k| name.contains(k) || description.contains(k))
}

/// Indoor visits first on rainy days, outdoor visits first on sunny ones; stable otherwise
fn order_for_weather(items: Vec<PlanItem>, conditions: Conditions) -> Vec<PlanItem> {
    let keywords: &[&str] = match conditions {
        Conditions::Rainy => &INDOOR_KEYWORDS,
        Conditions::Sunny => &OUTDOOR_KEYWORDS,
        _ => return items,
    };
    let (first, rest): (Vec<PlanItem>, Vec<PlanItem>) = items
        .into_iter()
        .partition(|item| mentions_any(item, keywords));
    first.into_iter().chain(rest).collect()
}

fn build_itinerary(state: &PlanningState, merged: &Merged, daily_cost: f64) -> Vec<DayPlan> {
    let trip = &state.trip;
    let days = trip.duration_days();
    let per_day = trip
        .activity_level
        .attractions_per_day()
        .min(merged.attractions.len());
    let pool = &merged.attractions;
    let weather = conditions(&merged.forecast, merged.avg_temperature_c);

    (0..days)
        .map(|i| {
            let start = i as usize * per_day;
            let attractions = (0..per_day)
                .map(|j| pool[(start + j) % pool.len()].clone())
                .collect();
            let restaurant = merged.restaurants[i as usize % merged.restaurants.len()].clone();
            let activity = match merged.day_themes.get(i as usize) {
                Some(theme) => PlanItem::named(theme.clone()),
                None => PlanItem::named(format!("Free time to explore {}", trip.destination)),
            };

            DayPlan {
                day: i + 1,
                date: trip.date_of_day(i),
                weather: merged.forecast.clone(),
                attractions: order_for_weather(attractions, weather),
                restaurants: vec![restaurant],
                activities: vec![activity],
                daily_cost,
            }
        })
        .collect()
}

fn contributions(state: &PlanningState) -> BTreeMap<String, Contribution> {
    state
        .required
        .iter()
        .map(|kind| {
            let contribution = match state.agent_outputs.get(kind) {
                None => Contribution {
                    status: "missing".to_string(),
                    summary: format!("No {} was produced", kind.label()),
                    cause: None,
                },
                Some(result) => Contribution {
                    status: match result.status {
                        ResultStatus::Complete => "completed".to_string(),
                        ResultStatus::Degraded { .. } => "degraded".to_string(),
                    },
                    summary: result.summary.clone(),
                    cause: result.status.cause().map(|c| c.to_string()),
                },
            };
            (kind.name().to_string(), contribution)
        })
        .collect()
}

/// Named consistency checks over a drafted plan and the research behind it
fn consistency_checks(
    state: &PlanningState,
    merged: &Merged,
    plan: &FinalPlan,
) -> Vec<(&'static str, bool)> {
    let trip = &state.trip;
    let provenance = &merged.provenance;

    // Budget findings exist and any total the model quoted agrees with the tables
    let table_total = plan.expense_breakdown.total();
    let budget_consistent = provenance.budget_reported
        && plan.expense_breakdown.is_well_formed()
        && match provenance.quoted_total {
            None => true,
            Some(quote) => {
                quote.is_finite()
                    && quote >= 0.0
                    && quote * QUOTE_TOLERANCE >= table_total
                    && quote <= table_total * QUOTE_TOLERANCE
            }
        };

    // Day count and dates recomputed from the request, not from the itinerary builder
    let expected_days = (trip.end_date - trip.start_date).num_days();
    let dates_match = plan.itinerary.len() as i64 == expected_days
        && plan
            .itinerary
            .iter()
            .zip(trip.start_date.iter_days())
            .all(|(day, date)| day.date == date && day.date < trip.end_date);

    vec![
        ("budget_consistent", budget_consistent),
        ("dates_match", dates_match),
        ("forecast_known", provenance.forecast_known),
        ("days_researched", provenance.attractions_researched),
        ("dining_researched", provenance.restaurants_researched),
    ]
}

/// Score in [0, 1]: coverage by non-degraded specialists plus passed consistency checks
fn quality_score(state: &PlanningState, checks: &[(&'static str, bool)]) -> f64 {
    let required = state.required.len().max(1) as f64;
    let healthy = state
        .required
        .iter()
        .filter_map(|k| state.agent_outputs.get(k))
        .filter(|r| !r.status.is_degraded())
        .count() as f64;
    let passed = checks.iter().filter(|(_, ok)| *ok).count() as f64;
    let total = checks.len().max(1) as f64;

    let score =
        COVERAGE_WEIGHT * (healthy / required) + (1.0 - COVERAGE_WEIGHT) * (passed / total);
    (score * 1000.0).round() / 1000.0
}

pub fn synthesize(state: &PlanningState) -> Result<FinalPlan, WorkflowError> {
    let trip = &state.trip;
    let days = trip.duration_days();
    if days == 0 {
        return Err(WorkflowError::InconsistentPlan(
            "trip has no days to plan".to_string(),
        ));
    }

    let merged = merge(state);
    let estimated_cost = round_cents(merged.breakdown.total());
    let daily_cost = round_cents(estimated_cost / days as f64);
    let itinerary = build_itinerary(state, &merged, daily_cost);

    let agents_used = state
        .required
        .iter()
        .filter(|k| state.has_result(**k))
        .map(|k| k.name().to_string())
        .collect();

    let mut plan = FinalPlan {
        destination: trip.destination.clone(),
        travel_dates: trip.travel_dates(),
        duration: if days == 1 {
            "1 day".to_string()
        } else {
            format!("{} days", days)
        },
        duration_days: days,
        group_size: trip.group_size,
        budget: trip.budget,
        currency: trip.currency,
        estimated_cost,
        planning_method: PLANNING_METHOD.to_string(),
        agents_used,
        clothing_suggestion: merged.clothing.clone(),
        weather_forecast: merged.forecast.clone(),
        attractions: merged.attractions.iter().map(|a| a.name.clone()).collect(),
        itinerary,
        hotels: merged.hotels.clone(),
        expense_breakdown: merged.breakdown,
        budget_comparison: compare_tiers(trip),
        local_tips: merged.local_tips.clone(),
        contributions: contributions(state),
        quality_score: 0.0,
        consensus_level: ConsensusLevel::Low,
    };

    if plan.itinerary.len() != days as usize {
        return Err(WorkflowError::InconsistentPlan(format!(
            "itinerary has {} days, trip has {}",
            plan.itinerary.len(),
            days
        )));
    }
    if !plan.estimated_cost.is_finite() {
        return Err(WorkflowError::InconsistentPlan(
            "estimated cost is not a finite number".to_string(),
        ));
    }

    let checks = consistency_checks(state, &merged, &plan);
    for (name, _) in checks.iter().filter(|(_, ok)| !*ok) {
        debug!("Consistency check '{}' failed for {}", name, plan.destination);
    }
    plan.quality_score = quality_score(state, &checks);
    plan.consensus_level = ConsensusLevel::from_score(plan.quality_score);
    Ok(plan)
}
