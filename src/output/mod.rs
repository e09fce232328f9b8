//! Plain-text export of a finished plan.

use crate::plan::{FinalPlan, PlanItem};

fn money(plan: &FinalPlan, amount: f64) -> String {
    format!("{}{:.2}", plan.currency.symbol(), amount)
}

fn item_line(item: &PlanItem) -> String {
    match &item.description {
        Some(description) => format!("{} - {}", item.name, description),
        None => item.name.clone(),
    }
}

fn rule(out: &mut String, title: &str) {
    out.push_str(&format!("\n{}\n{}\n", title, "-".repeat(title.chars().count())));
}

/// Render a plan as the downloadable text itinerary
pub fn render_text(plan: &FinalPlan) -> String {
    let mut out = String::new();

    let title = format!("TRIP PLAN: {}", plan.destination.to_uppercase());
    out.push_str(&format!("{}\n{}\n", title, "=".repeat(title.chars().count())));
    out.push_str(&format!("Dates: {} ({})\n", plan.travel_dates, plan.duration));
    out.push_str(&format!(
        "Travellers: {} | Budget: {} | Currency: {}\n",
        plan.group_size, plan.budget, plan.currency
    ));
    out.push_str(&format!(
        "Estimated cost: {}\n",
        money(plan, plan.estimated_cost)
    ));
    out.push_str(&format!(
        "Planning method: {} ({})\n",
        plan.planning_method,
        plan.agents_used.join(", ")
    ));
    out.push_str(&format!(
        "Quality score: {:.3} (consensus {})\n",
        plan.quality_score, plan.consensus_level
    ));

    rule(&mut out, "Weather");
    out.push_str(&format!("{}\n", plan.weather_forecast));
    out.push_str(&format!("Clothing: {}\n", plan.clothing_suggestion));

    rule(&mut out, "Top attractions");
    for attraction in &plan.attractions {
        out.push_str(&format!("- {}\n", attraction));
    }

    rule(&mut out, "Hotels");
    for hotel in &plan.hotels {
        out.push_str(&format!(
            "- {} ({:.1}*) {}/night, {}\n",
            hotel.name,
            hotel.rating,
            money(plan, hotel.price_per_night),
            hotel.address
        ));
        if !hotel.amenities.is_empty() {
            out.push_str(&format!("  Amenities: {}\n", hotel.amenities.join(", ")));
        }
    }

    rule(&mut out, "Itinerary");
    for day in &plan.itinerary {
        out.push_str(&format!(
            "Day {} - {} ({})\n",
            day.day,
            day.date,
            money(plan, day.daily_cost)
        ));
        for attraction in &day.attractions {
            out.push_str(&format!("  Visit: {}\n", item_line(attraction)));
        }
        for restaurant in &day.restaurants {
            out.push_str(&format!("  Eat: {}\n", item_line(restaurant)));
        }
        for activity in &day.activities {
            out.push_str(&format!("  Do: {}\n", item_line(activity)));
        }
    }

    rule(&mut out, "Expense breakdown");
    let b = &plan.expense_breakdown;
    for (label, amount) in [
        ("Accommodation", b.accommodation),
        ("Food", b.food),
        ("Activities", b.activities),
        ("Transportation", b.transportation),
    ] {
        out.push_str(&format!("{:<16}{}\n", label, money(plan, amount)));
    }
    out.push_str(&format!("{:<16}{}\n", "Total", money(plan, b.total())));

    if !plan.budget_comparison.is_empty() {
        rule(&mut out, "Budget comparison");
        for tier in &plan.budget_comparison {
            out.push_str(&format!(
                "{:<16}{} ({}/day, {:+.1}%)\n",
                tier.tier.to_string(),
                money(plan, tier.total_cost),
                money(plan, tier.daily_budget),
                tier.percentage_change
            ));
        }
    }

    if !plan.local_tips.is_empty() {
        rule(&mut out, "Local tips");
        for tip in &plan.local_tips {
            out.push_str(&format!("- {}\n", tip));
        }
    }

    out.push_str(&format!("\nPlan digest: {}\n", plan.digest()));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{TripForm, TripRequest};
    use crate::specialist::SpecialistKind;
    use crate::workflow::state::PlanningState;
    use crate::workflow::synthesizer::synthesize;

    #[test]
    fn test_render_placeholder_plan() {
        let trip = TripRequest::from_form(&TripForm {
            destination: "Lisbon".to_string(),
            start_date: "2025-06-10".to_string(),
            end_date: "2025-06-12".to_string(),
            currency: Some("EUR".to_string()),
            ..Default::default()
        })
        .unwrap();
        let state = PlanningState::new(trip, SpecialistKind::ALL.to_vec(), 50);
        let plan = synthesize(&state).unwrap();

        let text = render_text(&plan);
        assert!(text.starts_with("TRIP PLAN: LISBON\n================="));
        assert!(text.contains("Dates: 2025-06-10 to 2025-06-12 (2 days)"));
        assert!(text.contains("Day 1 - 2025-06-10"));
        assert!(text.contains("Day 2 - 2025-06-11"));
        assert!(!text.contains("Day 3"));
        assert!(text.contains("Accommodation to be confirmed"));
        assert!(text.contains("Total           €"));
        assert!(text.contains("Budget comparison\n-----------------\nbudget          €"));
        assert!(text.contains("mid-range       €"));
        assert!(text.contains("+0.0%"));
        assert!(text.contains(&format!("Plan digest: {}", plan.digest())));
    }
}
