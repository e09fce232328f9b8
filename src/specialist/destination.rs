use super::{plan_items, Findings, FindingsInput, Specialist, SpecialistKind};
use crate::plan::PlanItem;
use crate::request::TripRequest;

/// Upper bound on attractions kept from research
const MAX_ATTRACTIONS: usize = 10;

pub struct DestinationResearch;

impl Specialist for DestinationResearch {
    fn kind(&self) -> SpecialistKind {
        SpecialistKind::Destination
    }

    fn brief(&self) -> &'static str {
        "You are a travel advisor who researches destinations. You know the landmarks, \
         neighbourhoods, museums and day trips a visitor should not miss, and you match \
         them to the traveller's interests."
    }

    fn task(&self, trip: &TripRequest) -> String {
        let interests = if trip.interests.is_empty() {
            "general sightseeing".to_string()
        } else {
            trip.interests.join(", ")
        };
        format!(
            "Recommend the top attractions in {} for a {}-day trip focused on {}.",
            trip.destination,
            trip.duration_days(),
            interests
        )
    }

    fn response_fields(&self) -> &'static str {
        r#""attractions": [{"name": "...", "description": "..."}]"#
    }

    fn grounding_query(&self, trip: &TripRequest) -> Option<String> {
        Some(format!("top attractions in {}", trip.destination))
    }

    fn findings(&self, input: &FindingsInput<'_>) -> Findings {
        let mut attractions = plan_items(input.reply, "attractions");
        if attractions.is_empty() {
            attractions = input.reply.items.iter().map(PlanItem::named).collect();
        }
        if attractions.is_empty() {
            attractions = input
                .hits
                .iter()
                .filter(|hit| !hit.title.is_empty())
                .map(|hit| PlanItem {
                    name: hit.title.clone(),
                    description: Some(hit.snippet.clone()).filter(|s| !s.is_empty()),
                })
                .collect();
        }
        attractions.truncate(MAX_ATTRACTIONS);
        Findings::Destination { attractions }
    }

    fn fallback(&self, _trip: &TripRequest) -> Findings {
        Findings::Destination {
            attractions: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::SearchHit;
    use crate::parser::parse_reply;
    use crate::request::TripForm;
    use std::collections::BTreeMap;

    fn trip() -> TripRequest {
        TripRequest::from_form(&TripForm {
            destination: "Lisbon".to_string(),
            start_date: "2025-06-10".to_string(),
            end_date: "2025-06-13".to_string(),
            interests: "history, food".to_string(),
            ..Default::default()
        })
        .unwrap()
    }

    #[test]
    fn test_task_mentions_interests() {
        let task = DestinationResearch.task(&trip());
        assert!(task.contains("Lisbon"));
        assert!(task.contains("3-day"));
        assert!(task.contains("history, food"));
    }

    #[test]
    fn test_findings_fall_back_to_search_hits() {
        let trip = trip();
        let reply = parse_reply("Nothing specific to add.");
        let hits = vec![SearchHit {
            title: "Jeronimos Monastery".to_string(),
            snippet: "Manueline masterpiece".to_string(),
            url: String::new(),
        }];
        let prior = BTreeMap::new();
        let findings = DestinationResearch.findings(&FindingsInput {
            trip: &trip,
            reply: &reply,
            hits: &hits,
            prior: &prior,
        });
        match findings {
            Findings::Destination { attractions } => {
                assert_eq!(attractions.len(), 1);
                assert_eq!(attractions[0].name, "Jeronimos Monastery");
                assert_eq!(
                    attractions[0].description.as_deref(),
                    Some("Manueline masterpiece")
                );
            }
            other => panic!("unexpected findings: {:?}", other),
        }
    }
}
