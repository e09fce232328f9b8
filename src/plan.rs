//! The synthesized trip plan handed back to callers and renderers.

use crate::request::{BudgetTier, Currency};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinalPlan {
    pub destination: String,
    pub travel_dates: String,
    /// Human-readable length, e.g. "5 days"
    pub duration: String,
    pub duration_days: u32,
    pub group_size: u32,
    pub budget: BudgetTier,
    pub currency: Currency,
    pub estimated_cost: f64,
    pub planning_method: String,
    pub agents_used: Vec<String>,
    pub clothing_suggestion: String,
    pub weather_forecast: String,
    pub attractions: Vec<String>,
    pub itinerary: Vec<DayPlan>,
    pub hotels: Vec<Hotel>,
    pub expense_breakdown: ExpenseBreakdown,
    /// The same trip priced at every budget tier
    pub budget_comparison: Vec<TierComparison>,
    pub local_tips: Vec<String>,
    /// Per-specialist status and summary, keyed by specialist name
    pub contributions: BTreeMap<String, Contribution>,
    pub quality_score: f64,
    pub consensus_level: ConsensusLevel,
}

impl FinalPlan {
    /// Hex SHA-256 of the plan's JSON encoding
    pub fn digest(&self) -> String {
        let bytes = serde_json::to_vec(self).unwrap_or_default();
        let hash = Sha256::digest(&bytes);
        hash.iter().map(|b| format!("{:02x}", b)).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    pub day: u32,
    pub date: NaiveDate,
    pub weather: String,
    pub attractions: Vec<PlanItem>,
    pub restaurants: Vec<PlanItem>,
    pub activities: Vec<PlanItem>,
    pub daily_cost: f64,
}

/// An attraction, restaurant or activity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanItem {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl PlanItem {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotel {
    pub name: String,
    pub rating: f32,
    pub price_per_night: f64,
    pub address: String,
    pub amenities: Vec<String>,
}

/// Trip totals by category, in the plan currency
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ExpenseBreakdown {
    pub accommodation: f64,
    pub food: f64,
    pub activities: f64,
    pub transportation: f64,
}

impl ExpenseBreakdown {
    pub fn total(&self) -> f64 {
        self.accommodation + self.food + self.activities + self.transportation
    }

    fn values(&self) -> [f64; 4] {
        [
            self.accommodation,
            self.food,
            self.activities,
            self.transportation,
        ]
    }

    pub fn is_well_formed(&self) -> bool {
        self.values().iter().all(|v| v.is_finite() && *v >= 0.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierComparison {
    pub tier: BudgetTier,
    pub total_cost: f64,
    pub daily_budget: f64,
    /// Against the requested tier, in the plan currency
    pub difference: f64,
    pub percentage_change: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contribution {
    pub status: String,
    pub summary: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cause: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConsensusLevel {
    High,
    Medium,
    Low,
}

impl ConsensusLevel {
    pub fn from_score(score: f64) -> Self {
        if score >= 0.85 {
            ConsensusLevel::High
        } else if score >= 0.6 {
            ConsensusLevel::Medium
        } else {
            ConsensusLevel::Low
        }
    }
}

impl std::fmt::Display for ConsensusLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConsensusLevel::High => write!(f, "high"),
            ConsensusLevel::Medium => write!(f, "medium"),
            ConsensusLevel::Low => write!(f, "low"),
        }
    }
}
