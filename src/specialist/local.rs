use super::{plan_items, Findings, FindingsInput, Specialist, SpecialistKind};
use crate::plan::PlanItem;
use crate::request::TripRequest;

pub struct LocalInsight;

impl Specialist for LocalInsight {
    fn kind(&self) -> SpecialistKind {
        SpecialistKind::LocalInsight
    }

    fn brief(&self) -> &'static str {
        "You are a local expert. You know where residents eat, how to get around, \
         which customs visitors should respect and which tourist traps to skip."
    }

    fn task(&self, trip: &TripRequest) -> String {
        let mut task = format!(
            "Recommend restaurants and share insider tips for visiting {}.",
            trip.destination
        );
        if let Some(dietary) = &trip.dietary {
            task.push_str(&format!(" Restaurants must suit a {} diet.", dietary));
        }
        if let Some(mobility) = &trip.mobility {
            task.push_str(&format!(" Keep in mind: {}.", mobility));
        }
        task
    }

    fn response_fields(&self) -> &'static str {
        r#""restaurants": [{"name": "...", "description": "..."}], "tips": ["..."]"#
    }

    fn grounding_query(&self, trip: &TripRequest) -> Option<String> {
        let query = match &trip.dietary {
            Some(dietary) => format!("best {} restaurants in {}", dietary, trip.destination),
            None => format!("best local restaurants in {}", trip.destination),
        };
        Some(query)
    }

    fn findings(&self, input: &FindingsInput<'_>) -> Findings {
        let mut restaurants = plan_items(input.reply, "restaurants");
        if restaurants.is_empty() {
            restaurants = input.reply.items.iter().map(PlanItem::named).collect();
        }
        Findings::Local {
            restaurants,
            tips: input.reply.field_names("tips"),
        }
    }

    fn fallback(&self, _trip: &TripRequest) -> Findings {
        Findings::Local {
            restaurants: Vec::new(),
            tips: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::TripForm;

    #[test]
    fn test_dietary_and_mobility_shape_the_task() {
        let trip = TripRequest::from_form(&TripForm {
            destination: "Rome".to_string(),
            start_date: "2025-04-01".to_string(),
            end_date: "2025-04-04".to_string(),
            dietary: "vegan".to_string(),
            mobility: "wheelchair user".to_string(),
            ..Default::default()
        })
        .unwrap();

        let task = LocalInsight.task(&trip);
        assert!(task.contains("vegan diet"));
        assert!(task.contains("wheelchair user"));
        assert_eq!(
            LocalInsight.grounding_query(&trip).as_deref(),
            Some("best vegan restaurants in Rome")
        );
    }
}
