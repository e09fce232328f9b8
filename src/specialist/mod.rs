//! The specialist task set.
//!
//! Each specialist is a unit struct behind the [`Specialist`] trait, selected through
//! [`SpecialistKind`]. Specialists only read the planning state and hand back a
//! [`SpecialistOutcome`]; the coordinator merges it.

mod budget;
mod destination;
mod executor;
mod itinerary;
mod local;
mod weather;

pub use budget::{compare_tiers, estimate_expenses, nightly_rate};
pub use executor::run_specialist;
pub use weather::clothing_for;

use crate::lookup::SearchHit;
use crate::parser::ParsedReply;
use crate::plan::{ExpenseBreakdown, Hotel, PlanItem};
use crate::request::TripRequest;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize, JsonSchema,
)]
pub enum SpecialistKind {
    #[serde(rename = "travel_advisor", alias = "destination")]
    Destination,
    #[serde(rename = "weather_analyst", alias = "weather")]
    Weather,
    #[serde(rename = "budget_optimizer", alias = "budget")]
    Budget,
    #[serde(rename = "local_expert", alias = "local")]
    LocalInsight,
    #[serde(rename = "itinerary_planner", alias = "itinerary")]
    Itinerary,
}

impl SpecialistKind {
    /// Default visiting order. Itinerary assembly reads the others, so it goes last.
    pub const ALL: [SpecialistKind; 5] = [
        SpecialistKind::Destination,
        SpecialistKind::Weather,
        SpecialistKind::Budget,
        SpecialistKind::LocalInsight,
        SpecialistKind::Itinerary,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            SpecialistKind::Destination => "travel_advisor",
            SpecialistKind::Weather => "weather_analyst",
            SpecialistKind::Budget => "budget_optimizer",
            SpecialistKind::LocalInsight => "local_expert",
            SpecialistKind::Itinerary => "itinerary_planner",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SpecialistKind::Destination => "destination research",
            SpecialistKind::Weather => "weather analysis",
            SpecialistKind::Budget => "budget optimization",
            SpecialistKind::LocalInsight => "local insights",
            SpecialistKind::Itinerary => "itinerary assembly",
        }
    }

    pub fn specialist(&self) -> &'static dyn Specialist {
        match self {
            SpecialistKind::Destination => &destination::DestinationResearch,
            SpecialistKind::Weather => &weather::WeatherAnalysis,
            SpecialistKind::Budget => &budget::BudgetOptimization,
            SpecialistKind::LocalInsight => &local::LocalInsight,
            SpecialistKind::Itinerary => &itinerary::ItineraryAssembly,
        }
    }
}

impl std::fmt::Display for SpecialistKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Why a specialist fell back to a best-effort result
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradeCause {
    Timeout,
    RateLimited,
    LookupFailed,
    ReasonerFailed,
}

impl std::fmt::Display for DegradeCause {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DegradeCause::Timeout => write!(f, "timeout"),
            DegradeCause::RateLimited => write!(f, "rate_limited"),
            DegradeCause::LookupFailed => write!(f, "lookup_failed"),
            DegradeCause::ReasonerFailed => write!(f, "reasoner_failed"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ResultStatus {
    Complete,
    Degraded { cause: DegradeCause },
}

impl ResultStatus {
    pub fn is_degraded(&self) -> bool {
        matches!(self, ResultStatus::Degraded { .. })
    }

    pub fn cause(&self) -> Option<DegradeCause> {
        match self {
            ResultStatus::Complete => None,
            ResultStatus::Degraded { cause } => Some(*cause),
        }
    }
}

/// Structured payload specific to each specialist
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Findings {
    Destination {
        attractions: Vec<PlanItem>,
    },
    Weather {
        forecast: Option<String>,
        avg_temperature_c: Option<f64>,
        packing: Vec<String>,
    },
    Budget {
        breakdown: ExpenseBreakdown,
        hotels: Vec<Hotel>,
        saving_tips: Vec<String>,
        /// Whole-trip total the model quoted, checked against the tables at synthesis
        #[serde(default)]
        quoted_total: Option<f64>,
    },
    Local {
        restaurants: Vec<PlanItem>,
        tips: Vec<String>,
    },
    Itinerary {
        day_themes: Vec<String>,
    },
}

/// One specialist's contribution to the plan
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SpecialistResult {
    pub specialist: SpecialistKind,
    pub summary: String,
    pub items: Vec<String>,
    pub findings: Findings,
    pub status: ResultStatus,
    /// Lookups issued on the way to this result
    pub lookups: usize,
}

/// What a specialist hands back to the coordinator
#[derive(Debug, Clone, PartialEq)]
pub enum SpecialistOutcome {
    NeedsLookup { query: String },
    Finished(SpecialistResult),
}

/// Everything a specialist may draw on when turning a reply into findings
pub struct FindingsInput<'a> {
    pub trip: &'a TripRequest,
    pub reply: &'a ParsedReply,
    pub hits: &'a [SearchHit],
    pub prior: &'a BTreeMap<SpecialistKind, SpecialistResult>,
}

pub trait Specialist: Send + Sync {
    fn kind(&self) -> SpecialistKind;

    /// Static domain context that opens every prompt
    fn brief(&self) -> &'static str;

    fn task(&self, trip: &TripRequest) -> String;

    /// Extra JSON fields the reply may carry beside `summary` and `items`
    fn response_fields(&self) -> &'static str;

    /// Query issued before the first reasoning call when lookups are enabled
    fn grounding_query(&self, trip: &TripRequest) -> Option<String>;

    /// Whether the prompt includes the other specialists' findings
    fn uses_prior_findings(&self) -> bool {
        false
    }

    fn findings(&self, input: &FindingsInput<'_>) -> Findings;

    /// Best-effort findings when the reasoner could not be reached
    fn fallback(&self, trip: &TripRequest) -> Findings;
}

/// Items from a reply field holding strings or `{name, description}` objects
pub(crate) fn plan_items(reply: &ParsedReply, key: &str) -> Vec<PlanItem> {
    let Some(serde_json::Value::Array(values)) = reply.fields.get(key) else {
        return Vec::new();
    };
    values
        .iter()
        .filter_map(|v| match v {
            serde_json::Value::String(s) => Some(PlanItem::named(s.trim())),
            serde_json::Value::Object(obj) => {
                let name = obj.get("name")?.as_str()?.trim();
                let description = obj
                    .get("description")
                    .and_then(|d| d.as_str())
                    .map(|d| d.trim().to_string())
                    .filter(|d| !d.is_empty());
                Some(PlanItem {
                    name: name.to_string(),
                    description,
                })
            }
            _ => None,
        })
        .filter(|item| !item.name.is_empty())
        .collect()
}

/// `key` if the reply carries it, otherwise the generic `items` list
pub(crate) fn names_or_items(reply: &ParsedReply, key: &str) -> Vec<String> {
    let names = reply.field_names(key);
    if names.is_empty() {
        reply.items.clone()
    } else {
        names
    }
}
