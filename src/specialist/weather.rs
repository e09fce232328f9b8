use super::{names_or_items, Findings, FindingsInput, Specialist, SpecialistKind};
use crate::request::TripRequest;

pub struct WeatherAnalysis;

impl Specialist for WeatherAnalysis {
    fn kind(&self) -> SpecialistKind {
        SpecialistKind::Weather
    }

    fn brief(&self) -> &'static str {
        "You are a weather analyst for travellers. You describe expected conditions for \
         specific dates and places and translate them into practical packing advice."
    }

    fn task(&self, trip: &TripRequest) -> String {
        format!(
            "Describe the expected weather in {} from {} to {} and what to pack.",
            trip.destination, trip.start_date, trip.end_date
        )
    }

    fn response_fields(&self) -> &'static str {
        r#""forecast": "...", "avg_temperature_c": 0.0, "packing": ["..."]"#
    }

    fn grounding_query(&self, trip: &TripRequest) -> Option<String> {
        Some(format!(
            "{} weather {}",
            trip.destination,
            trip.start_date.format("%B %Y")
        ))
    }

    fn findings(&self, input: &FindingsInput<'_>) -> Findings {
        let reply = input.reply;
        let forecast = reply
            .field_str("forecast")
            .map(|s| s.to_string())
            .or_else(|| Some(reply.summary.trim().to_string()).filter(|s| !s.is_empty()));

        let avg_temperature_c = reply
            .field_f64("avg_temperature_c")
            .or_else(|| forecast.as_deref().and_then(temperature_in))
            .or_else(|| {
                input
                    .hits
                    .iter()
                    .find_map(|hit| temperature_in(&hit.snippet))
            });

        Findings::Weather {
            forecast,
            avg_temperature_c,
            packing: names_or_items(reply, "packing"),
        }
    }

    fn fallback(&self, _trip: &TripRequest) -> Findings {
        Findings::Weather {
            forecast: None,
            avg_temperature_c: None,
            packing: Vec::new(),
        }
    }
}

/// Average Celsius temperature mentioned in free text: a range like "22-27°C" or a single "18 °C"
pub fn temperature_in(text: &str) -> Option<f64> {
    let range = regex::Regex::new(
        r"(-?\d+(?:\.\d+)?)\s*(?:°C?)?\s*(?:-|–|to)\s*(-?\d+(?:\.\d+)?)\s*°\s*C",
    )
    .ok()?;
    if let Some(cap) = range.captures(text) {
        let low: f64 = cap.get(1)?.as_str().parse().ok()?;
        let high: f64 = cap.get(2)?.as_str().parse().ok()?;
        return Some((low + high) / 2.0);
    }

    let single = regex::Regex::new(r"(-?\d+(?:\.\d+)?)\s*°\s*C").ok()?;
    single.captures(text)?.get(1)?.as_str().parse().ok()
}

/// Packing advice for an average temperature in Celsius
pub fn clothing_for(avg_temperature_c: Option<f64>) -> String {
    let advice = match avg_temperature_c {
        None => "Pack versatile layers and check the forecast before departure",
        Some(t) if t < 10.0 => "Pack warm clothes - heavy jacket, sweaters, thermal wear",
        Some(t) if t < 15.0 => "Pack layers - light jacket, long sleeves, comfortable pants",
        Some(t) if t < 20.0 => "Pack versatile clothing - light jacket, jeans, long sleeves",
        Some(t) if t < 25.0 => "Pack comfortable clothes - t-shirts, light pants, sandals",
        Some(t) if t < 30.0 => "Pack light clothing - shorts, t-shirts, sun hat",
        Some(_) => "Pack tropical clothing - light fabrics, swimwear, sun protection",
    };
    advice.to_string()
}
