use super::{names_or_items, Findings, FindingsInput, Specialist, SpecialistKind};
use crate::plan::{ExpenseBreakdown, Hotel, TierComparison};
use crate::request::{round_cents, BudgetTier, TripRequest};

/// Upper bound on hotels suggested per plan
const MAX_HOTELS: usize = 3;

/// Daily USD rates for one budget tier
struct TierRates {
    accommodation_per_day: f64,
    food_per_person: f64,
    activities_per_person: f64,
    transport_per_person: f64,
    hotel_per_night: f64,
    hotel_rating: f32,
}

fn rates(tier: BudgetTier) -> TierRates {
    match tier {
        BudgetTier::Budget => TierRates {
            accommodation_per_day: 40.0,
            food_per_person: 25.0,
            activities_per_person: 20.0,
            transport_per_person: 15.0,
            hotel_per_night: 50.0,
            hotel_rating: 3.5,
        },
        BudgetTier::MidRange => TierRates {
            accommodation_per_day: 100.0,
            food_per_person: 50.0,
            activities_per_person: 40.0,
            transport_per_person: 35.0,
            hotel_per_night: 130.0,
            hotel_rating: 4.0,
        },
        BudgetTier::Luxury => TierRates {
            accommodation_per_day: 250.0,
            food_per_person: 100.0,
            activities_per_person: 80.0,
            transport_per_person: 60.0,
            hotel_per_night: 300.0,
            hotel_rating: 4.6,
        },
    }
}

/// Accommodation price multiplier for expensive cities
fn city_multiplier(destination: &str) -> f64 {
    let destination = destination.to_lowercase();
    const CITIES: [(&str, f64); 7] = [
        ("new york", 1.8),
        ("london", 1.6),
        ("paris", 1.5),
        ("tokyo", 1.4),
        ("dubai", 1.4),
        ("sydney", 1.3),
        ("singapore", 1.3),
    ];
    CITIES
        .iter()
        .find(|(city, _)| destination.contains(city))
        .map(|(_, multiplier)| *multiplier)
        .unwrap_or(1.0)
}

/// Trip totals by category in the request currency
pub fn estimate_expenses(trip: &TripRequest) -> ExpenseBreakdown {
    let r = rates(trip.budget);
    let days = trip.duration_days() as f64;
    let people = trip.group_size as f64;
    let currency = trip.currency;

    ExpenseBreakdown {
        accommodation: currency
            .from_usd(r.accommodation_per_day * city_multiplier(&trip.destination) * days),
        food: currency.from_usd(r.food_per_person * people * days),
        activities: currency.from_usd(r.activities_per_person * people * days),
        transportation: currency.from_usd(r.transport_per_person * people * days),
    }
}

/// Estimated nightly hotel price in the request currency
pub fn nightly_rate(trip: &TripRequest) -> f64 {
    let r = rates(trip.budget);
    trip.currency
        .from_usd(r.hotel_per_night * city_multiplier(&trip.destination))
}

/// The trip priced at every tier, compared against the requested one
pub fn compare_tiers(trip: &TripRequest) -> Vec<TierComparison> {
    let base = round_cents(estimate_expenses(trip).total());
    let days = trip.duration_days().max(1) as f64;

    BudgetTier::ALL
        .iter()
        .map(|&tier| {
            let priced = TripRequest {
                budget: tier,
                ..trip.clone()
            };
            let total = round_cents(estimate_expenses(&priced).total());
            let percentage_change = if base > 0.0 {
                ((total - base) / base * 1000.0).round() / 10.0
            } else {
                0.0
            };
            TierComparison {
                tier,
                total_cost: total,
                daily_budget: round_cents(total / days),
                difference: round_cents(total - base),
                percentage_change,
            }
        })
        .collect()
}

/// Saving tips driven by each category's share of the total and by the tier
pub fn saving_tips(trip: &TripRequest, breakdown: &ExpenseBreakdown) -> Vec<String> {
    let total = breakdown.total();
    let share = |amount: f64| {
        if total > 0.0 {
            amount / total * 100.0
        } else {
            0.0
        }
    };

    let mut tips = Vec::new();
    if share(breakdown.accommodation) > 40.0 {
        tips.push("Consider staying in budget hotels or guesthouses to reduce accommodation costs");
        tips.push("Look for hotels slightly outside city center for better rates");
    }
    if share(breakdown.food) > 35.0 {
        tips.push("Try local street food and markets for authentic and budget-friendly meals");
        tips.push("Consider hotels with breakfast included");
    }
    if share(breakdown.activities) > 30.0 {
        tips.push("Look for free walking tours and public attractions");
        tips.push("Check for group discounts on activities and attractions");
    }
    if share(breakdown.transportation) > 20.0 {
        tips.push("Use public transportation instead of taxis when possible");
        tips.push("Consider getting a city transport pass for multiple days");
    }
    if trip.budget != BudgetTier::Budget {
        tips.push("Travel during off-peak seasons for better rates");
        tips.push("Book accommodations and activities in advance for early bird discounts");
    }
    tips.push("Set aside 10-15% of your budget for unexpected expenses");
    tips.push("Use travel apps to find deals and compare prices");

    tips.into_iter().map(|t| t.to_string()).collect()
}

fn amenities(tier: BudgetTier) -> Vec<String> {
    let mut amenities = vec!["Free WiFi", "Air Conditioning", "24/7 Reception"];
    if tier != BudgetTier::Budget {
        amenities.extend(["Restaurant", "Room Service", "Fitness Center", "Breakfast Included"]);
    }
    if tier == BudgetTier::Luxury {
        amenities.extend(["Spa", "Pool", "Concierge Service"]);
    }
    amenities.into_iter().map(|a| a.to_string()).collect()
}

/// Hotel suggestions at the tier's price point; a generic stay when no names are known
pub fn estimate_hotels(trip: &TripRequest, names: &[String]) -> Vec<Hotel> {
    let r = rates(trip.budget);
    let price = nightly_rate(trip);
    let address = format!("{} city centre", trip.destination);

    let names: Vec<String> = if names.is_empty() {
        vec![format!("{} {} stay", trip.destination, trip.budget)]
    } else {
        names.iter().take(MAX_HOTELS).cloned().collect()
    };

    names
        .into_iter()
        .map(|name| Hotel {
            name,
            rating: r.hotel_rating,
            price_per_night: price,
            address: address.clone(),
            amenities: amenities(trip.budget),
        })
        .collect()
}

pub struct BudgetOptimization;

impl Specialist for BudgetOptimization {
    fn kind(&self) -> SpecialistKind {
        SpecialistKind::Budget
    }

    fn brief(&self) -> &'static str {
        "You are a budget optimizer for travellers. You know typical prices for lodging, \
         meals, transport and sightseeing and you find ways to get more out of a budget."
    }

    fn task(&self, trip: &TripRequest) -> String {
        format!(
            "Suggest {} hotels in {} for {} traveller(s), estimate the total trip cost in {} \
             and list ways to save money.",
            trip.budget, trip.destination, trip.group_size, trip.currency
        )
    }

    fn response_fields(&self) -> &'static str {
        r#""hotels": ["..."], "estimated_total": 0.0, "saving_tips": ["..."]"#
    }

    fn grounding_query(&self, trip: &TripRequest) -> Option<String> {
        Some(format!("{} {} hotels", trip.destination, trip.budget))
    }

    fn findings(&self, input: &FindingsInput<'_>) -> Findings {
        let trip = input.trip;
        let mut names = input.reply.field_names("hotels");
        if names.is_empty() {
            names = input
                .hits
                .iter()
                .map(|hit| hit.title.trim())
                .filter(|title| title.to_lowercase().contains("hotel"))
                .map(|title| title.to_string())
                .collect();
        }

        let breakdown = estimate_expenses(trip);
        let mut tips = names_or_items(input.reply, "saving_tips");
        for tip in saving_tips(trip, &breakdown) {
            if !tips.contains(&tip) {
                tips.push(tip);
            }
        }

        Findings::Budget {
            breakdown,
            hotels: estimate_hotels(trip, &names),
            saving_tips: tips,
            quoted_total: input.reply.field_f64("estimated_total"),
        }
    }

    fn fallback(&self, trip: &TripRequest) -> Findings {
        // The cost tables need no collaborator; only hotel names are lost
        let breakdown = estimate_expenses(trip);
        Findings::Budget {
            breakdown,
            hotels: Vec::new(),
            saving_tips: saving_tips(trip, &breakdown),
            quoted_total: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{Currency, TripForm};

    fn trip(destination: &str, budget: &str, currency: &str, group: i64) -> TripRequest {
        TripRequest::from_form(&TripForm {
            destination: destination.to_string(),
            start_date: "2025-06-10".to_string(),
            end_date: "2025-06-15".to_string(),
            budget: Some(budget.to_string()),
            currency: Some(currency.to_string()),
            group_size: Some(crate::request::FormNumber::Number(group)),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_mid_range_expenses() {
        let breakdown = estimate_expenses(&trip("Lisbon", "mid-range", "USD", 2));
        assert_eq!(breakdown.accommodation, 500.0);
        assert_eq!(breakdown.food, 500.0);
        assert_eq!(breakdown.activities, 400.0);
        assert_eq!(breakdown.transportation, 350.0);
        assert_eq!(breakdown.total(), 1750.0);
    }

    #[test]
    fn test_city_multiplier_and_currency() {
        let t = trip("Paris, France", "budget", "EUR", 1);
        assert_eq!(t.currency, Currency::Eur);
        let breakdown = estimate_expenses(&t);
        // 40 * 1.5 * 5 = 300 USD
        assert_eq!(breakdown.accommodation, 255.0);
        assert_eq!(breakdown.food, 106.25);
    }

    #[test]
    fn test_hotels_generic_and_named() {
        let t = trip("Tokyo", "luxury", "USD", 2);
        let generic = estimate_hotels(&t, &[]);
        assert_eq!(generic.len(), 1);
        assert_eq!(generic[0].name, "Tokyo luxury stay");
        assert_eq!(generic[0].price_per_night, 420.0);
        assert!(generic[0].amenities.contains(&"Spa".to_string()));

        let names: Vec<String> = ["A", "B", "C", "D"].iter().map(|s| s.to_string()).collect();
        let named = estimate_hotels(&t, &names);
        assert_eq!(named.len(), 3);
        assert_eq!(named[2].name, "C");
    }

    #[test]
    fn test_saving_tips_follow_cost_shares() {
        // Paris luxury for one: accommodation is 1875 of 3075
        let t = trip("Paris", "luxury", "USD", 1);
        let tips = saving_tips(&t, &estimate_expenses(&t));
        assert!(tips[0].starts_with("Consider staying in budget hotels"));
        assert!(tips.iter().any(|tip| tip.contains("off-peak")));
        assert!(!tips.iter().any(|tip| tip.contains("street food")));

        // Balanced budget trip: only the general tips
        let t = trip("Lisbon", "budget", "USD", 1);
        let tips = saving_tips(&t, &estimate_expenses(&t));
        assert_eq!(tips.len(), 2);
        assert!(tips[0].starts_with("Set aside 10-15%"));
    }

    #[test]
    fn test_fallback_keeps_rule_based_tips() {
        let t = trip("Paris", "luxury", "USD", 1);
        let Findings::Budget {
            saving_tips: tips,
            quoted_total,
            ..
        } = BudgetOptimization.fallback(&t)
        else {
            panic!("expected budget findings");
        };
        assert!(!tips.is_empty());
        assert_eq!(quoted_total, None);
    }

    #[test]
    fn test_tier_comparison() {
        let comparison = compare_tiers(&trip("Lisbon", "mid-range", "USD", 2));
        assert_eq!(comparison.len(), 3);

        assert_eq!(comparison[0].tier, BudgetTier::Budget);
        assert_eq!(comparison[0].total_cost, 800.0);
        assert_eq!(comparison[0].difference, -950.0);
        assert_eq!(comparison[0].percentage_change, -54.3);

        assert_eq!(comparison[1].total_cost, 1750.0);
        assert_eq!(comparison[1].daily_budget, 350.0);
        assert_eq!(comparison[1].difference, 0.0);
        assert_eq!(comparison[1].percentage_change, 0.0);

        assert_eq!(comparison[2].total_cost, 3650.0);
        assert_eq!(comparison[2].percentage_change, 108.6);
    }

    #[test]
    fn test_budget_tier_amenities() {
        let basic = amenities(BudgetTier::Budget);
        assert_eq!(basic.len(), 3);
        assert!(!basic.contains(&"Restaurant".to_string()));
        assert_eq!(amenities(BudgetTier::MidRange).len(), 7);
    }
}
