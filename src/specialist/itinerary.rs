use super::{names_or_items, Findings, FindingsInput, Specialist, SpecialistKind};
use crate::request::TripRequest;

pub struct ItineraryAssembly;

impl Specialist for ItineraryAssembly {
    fn kind(&self) -> SpecialistKind {
        SpecialistKind::Itinerary
    }

    fn brief(&self) -> &'static str {
        "You are an itinerary planner. You turn research about a destination into a \
         day-by-day plan with a clear theme for each day and a comfortable pace."
    }

    fn task(&self, trip: &TripRequest) -> String {
        format!(
            "Give one short theme for each of the {} days in {} at a {} pace.",
            trip.duration_days(),
            trip.destination,
            trip.activity_level
        )
    }

    fn response_fields(&self) -> &'static str {
        r#""days": ["theme for day 1", "..."]"#
    }

    fn grounding_query(&self, _trip: &TripRequest) -> Option<String> {
        None
    }

    fn uses_prior_findings(&self) -> bool {
        true
    }

    fn findings(&self, input: &FindingsInput<'_>) -> Findings {
        let mut day_themes = names_or_items(input.reply, "days");
        // Objects with a `theme` instead of a `name`
        if day_themes.is_empty() {
            if let Some(serde_json::Value::Array(days)) = input.reply.fields.get("days") {
                day_themes = days
                    .iter()
                    .filter_map(|d| d.get("theme").and_then(|t| t.as_str()))
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect();
            }
        }
        if day_themes.is_empty() {
            if let Some(Findings::Destination { attractions }) = input
                .prior
                .get(&SpecialistKind::Destination)
                .map(|r| &r.findings)
            {
                day_themes = attractions
                    .iter()
                    .map(|a| format!("Explore {}", a.name))
                    .collect();
            }
        }
        day_themes.truncate(input.trip.duration_days() as usize);
        Findings::Itinerary { day_themes }
    }

    fn fallback(&self, _trip: &TripRequest) -> Findings {
        Findings::Itinerary {
            day_themes: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_reply;
    use crate::request::TripForm;
    use std::collections::BTreeMap;

    #[test]
    fn test_themes_are_capped_at_trip_length() {
        let trip = TripRequest::from_form(&TripForm {
            destination: "Porto".to_string(),
            start_date: "2025-05-01".to_string(),
            end_date: "2025-05-03".to_string(),
            ..Default::default()
        })
        .unwrap();
        let reply = parse_reply(
            r#"{"summary": "two days", "days": [{"theme": "Ribeira"}, {"theme": "Douro valley"}, {"theme": "extra"}]}"#,
        );
        let prior = BTreeMap::new();
        let findings = ItineraryAssembly.findings(&FindingsInput {
            trip: &trip,
            reply: &reply,
            hits: &[],
            prior: &prior,
        });
        assert_eq!(
            findings,
            Findings::Itinerary {
                day_themes: vec!["Ribeira".to_string(), "Douro valley".to_string()]
            }
        );
    }
}
