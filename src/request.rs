//! Planning request intake: the raw form a caller submits and its validated form.

use crate::error::RequestError;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Longest trip the planner accepts, in days
pub const MAX_TRIP_DAYS: i64 = 90;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum BudgetTier {
    Budget,
    #[default]
    MidRange,
    Luxury,
}

impl BudgetTier {
    pub const ALL: [BudgetTier; 3] = [BudgetTier::Budget, BudgetTier::MidRange, BudgetTier::Luxury];
}

impl std::fmt::Display for BudgetTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BudgetTier::Budget => write!(f, "budget"),
            BudgetTier::MidRange => write!(f, "mid-range"),
            BudgetTier::Luxury => write!(f, "luxury"),
        }
    }
}

impl std::str::FromStr for BudgetTier {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "budget" | "low" => Ok(BudgetTier::Budget),
            "mid-range" | "midrange" | "mid_range" | "medium" => Ok(BudgetTier::MidRange),
            "luxury" | "high" => Ok(BudgetTier::Luxury),
            _ => Err(RequestError::UnknownBudget(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Usd,
    Eur,
    Gbp,
    Inr,
    Jpy,
    Cad,
    Aud,
    Chf,
    Cny,
    Sgd,
}

impl Currency {
    pub fn code(&self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Inr => "INR",
            Currency::Jpy => "JPY",
            Currency::Cad => "CAD",
            Currency::Aud => "AUD",
            Currency::Chf => "CHF",
            Currency::Cny => "CNY",
            Currency::Sgd => "SGD",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Currency::Usd => "$",
            Currency::Eur => "€",
            Currency::Gbp => "£",
            Currency::Inr => "₹",
            Currency::Jpy | Currency::Cny => "¥",
            Currency::Cad => "C$",
            Currency::Aud => "A$",
            Currency::Chf => "CHF ",
            Currency::Sgd => "S$",
        }
    }

    /// Fixed units of this currency per US dollar
    pub fn per_usd(&self) -> f64 {
        match self {
            Currency::Usd => 1.0,
            Currency::Eur => 0.85,
            Currency::Gbp => 0.73,
            Currency::Inr => 83.12,
            Currency::Jpy => 149.50,
            Currency::Cad => 1.36,
            Currency::Aud => 1.52,
            Currency::Chf => 0.88,
            Currency::Cny => 7.24,
            Currency::Sgd => 1.34,
        }
    }

    /// Convert a USD amount, rounded to cents
    pub fn from_usd(&self, amount: f64) -> f64 {
        round_cents(amount * self.per_usd())
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.code())
    }
}

impl std::str::FromStr for Currency {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            "GBP" => Ok(Currency::Gbp),
            "INR" => Ok(Currency::Inr),
            "JPY" => Ok(Currency::Jpy),
            "CAD" => Ok(Currency::Cad),
            "AUD" => Ok(Currency::Aud),
            "CHF" => Ok(Currency::Chf),
            "CNY" => Ok(Currency::Cny),
            "SGD" => Ok(Currency::Sgd),
            _ => Err(RequestError::UnknownCurrency(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ActivityLevel {
    Relaxed,
    #[default]
    Moderate,
    Active,
}

impl ActivityLevel {
    /// Attractions scheduled per itinerary day
    pub fn attractions_per_day(&self) -> usize {
        match self {
            ActivityLevel::Relaxed => 1,
            ActivityLevel::Moderate => 2,
            ActivityLevel::Active => 3,
        }
    }
}

impl std::fmt::Display for ActivityLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActivityLevel::Relaxed => write!(f, "relaxed"),
            ActivityLevel::Moderate => write!(f, "moderate"),
            ActivityLevel::Active => write!(f, "active"),
        }
    }
}

impl std::str::FromStr for ActivityLevel {
    type Err = RequestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "relaxed" | "1" => Ok(ActivityLevel::Relaxed),
            "moderate" | "2" => Ok(ActivityLevel::Moderate),
            "active" | "3" => Ok(ActivityLevel::Active),
            _ => Err(RequestError::UnknownActivityLevel(s.to_string())),
        }
    }
}

/// Web forms send numbers as strings; accept either.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(untagged)]
pub enum FormNumber {
    Number(i64),
    Text(String),
}

/// Trip parameters exactly as a caller submits them
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TripForm {
    #[serde(default)]
    pub destination: String,

    #[serde(default)]
    pub start_date: String,

    #[serde(default)]
    pub end_date: String,

    #[serde(default)]
    pub budget: Option<String>,

    #[serde(default)]
    pub currency: Option<String>,

    #[serde(default)]
    pub group_size: Option<FormNumber>,

    /// Comma-separated tags
    #[serde(default)]
    pub interests: String,

    #[serde(default)]
    pub dietary: String,

    #[serde(default)]
    pub mobility: String,

    #[serde(default)]
    pub activity_level: Option<String>,
}

/// A validated planning request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRequest {
    pub destination: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub budget: BudgetTier,
    pub currency: Currency,
    pub group_size: u32,
    pub interests: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dietary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobility: Option<String>,
    pub activity_level: ActivityLevel,
}

impl TripRequest {
    pub fn from_form(form: &TripForm) -> Result<Self, RequestError> {
        let destination = form.destination.trim();
        if destination.is_empty() {
            return Err(RequestError::MissingDestination);
        }

        let start_date = parse_date("start date", &form.start_date)?;
        let end_date = parse_date("end date", &form.end_date)?;

        if end_date <= start_date {
            return Err(RequestError::EndNotAfterStart {
                start: start_date.to_string(),
                end: end_date.to_string(),
            });
        }

        let days = (end_date - start_date).num_days();
        if days > MAX_TRIP_DAYS {
            return Err(RequestError::TripTooLong {
                days,
                max: MAX_TRIP_DAYS,
            });
        }

        let budget = match form.budget.as_deref() {
            Some(s) if !s.trim().is_empty() => s.parse()?,
            _ => BudgetTier::default(),
        };

        let currency = match form.currency.as_deref() {
            Some(s) if !s.trim().is_empty() => s.parse()?,
            _ => Currency::default(),
        };

        let activity_level = match form.activity_level.as_deref() {
            Some(s) if !s.trim().is_empty() => s.parse()?,
            _ => ActivityLevel::default(),
        };

        let group_size = match &form.group_size {
            None => 1,
            Some(FormNumber::Number(n)) => *n,
            Some(FormNumber::Text(s)) => s
                .trim()
                .parse::<i64>()
                .map_err(|_| RequestError::InvalidGroupSize)?,
        };
        if group_size < 1 || group_size > u32::MAX as i64 {
            return Err(RequestError::InvalidGroupSize);
        }

        Ok(Self {
            destination: destination.to_string(),
            start_date,
            end_date,
            budget,
            currency,
            group_size: group_size as u32,
            interests: split_tags(&form.interests),
            dietary: non_empty(&form.dietary),
            mobility: non_empty(&form.mobility),
            activity_level,
        })
    }

    /// Trip length in days (`end - start`)
    pub fn duration_days(&self) -> u32 {
        (self.end_date - self.start_date).num_days() as u32
    }

    pub fn travel_dates(&self) -> String {
        format!("{} to {}", self.start_date, self.end_date)
    }

    /// Calendar date of a zero-based itinerary day
    pub fn date_of_day(&self, index: u32) -> NaiveDate {
        self.start_date + chrono::Duration::days(index as i64)
    }
}

fn parse_date(field: &'static str, value: &str) -> Result<NaiveDate, RequestError> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").map_err(|_| RequestError::InvalidDate {
        field,
        value: value.to_string(),
    })
}

fn split_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
        .collect()
}

fn non_empty(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

pub fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(start: &str, end: &str) -> TripForm {
        TripForm {
            destination: "Lisbon".to_string(),
            start_date: start.to_string(),
            end_date: end.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_same_day_rejected() {
        let err = TripRequest::from_form(&form("2025-06-10", "2025-06-10")).unwrap_err();
        assert!(matches!(err, RequestError::EndNotAfterStart { .. }));
    }

    #[test]
    fn test_end_before_start_rejected() {
        let err = TripRequest::from_form(&form("2025-06-10", "2025-06-01")).unwrap_err();
        assert_eq!(
            err.to_string(),
            "End date 2025-06-01 must be after start date 2025-06-10"
        );
    }

    #[test]
    fn test_five_day_trip_accepted() {
        let request = TripRequest::from_form(&form("2025-06-10", "2025-06-15")).unwrap();
        assert_eq!(request.duration_days(), 5);
        assert_eq!(request.budget, BudgetTier::MidRange);
        assert_eq!(request.currency, Currency::Usd);
        assert_eq!(request.group_size, 1);
        assert_eq!(request.activity_level, ActivityLevel::Moderate);
        assert_eq!(
            request.date_of_day(4),
            NaiveDate::from_ymd_opt(2025, 6, 14).unwrap()
        );
    }

    #[test]
    fn test_form_json_from_web() {
        let json = r#"{
            "destination": "  Tokyo ",
            "startDate": "2025-09-01",
            "endDate": "2025-09-04",
            "budget": "luxury",
            "currency": "jpy",
            "groupSize": "3",
            "interests": "food, temples,, anime ",
            "dietary": "vegetarian",
            "mobility": "",
            "activityLevel": "active"
        }"#;
        let form: TripForm = serde_json::from_str(json).unwrap();
        let request = TripRequest::from_form(&form).unwrap();
        assert_eq!(request.destination, "Tokyo");
        assert_eq!(request.budget, BudgetTier::Luxury);
        assert_eq!(request.currency, Currency::Jpy);
        assert_eq!(request.group_size, 3);
        assert_eq!(request.interests, vec!["food", "temples", "anime"]);
        assert_eq!(request.dietary.as_deref(), Some("vegetarian"));
        assert_eq!(request.mobility, None);
        assert_eq!(request.activity_level, ActivityLevel::Active);
    }

    #[test]
    fn test_invalid_fields() {
        let mut f = form("2025-06-10", "2025-06-12");
        f.destination = "   ".to_string();
        assert_eq!(
            TripRequest::from_form(&f).unwrap_err(),
            RequestError::MissingDestination
        );

        let f = form("10/06/2025", "2025-06-12");
        assert!(matches!(
            TripRequest::from_form(&f).unwrap_err(),
            RequestError::InvalidDate { field: "start date", .. }
        ));

        let mut f = form("2025-06-10", "2025-06-12");
        f.group_size = Some(FormNumber::Number(0));
        assert_eq!(
            TripRequest::from_form(&f).unwrap_err(),
            RequestError::InvalidGroupSize
        );

        let mut f = form("2025-06-10", "2025-06-12");
        f.currency = Some("XYZ".to_string());
        assert!(matches!(
            TripRequest::from_form(&f).unwrap_err(),
            RequestError::UnknownCurrency(_)
        ));

        let mut f = form("2025-06-10", "2025-06-12");
        f.budget = Some("cheap".to_string());
        assert!(matches!(
            TripRequest::from_form(&f).unwrap_err(),
            RequestError::UnknownBudget(_)
        ));
    }

    #[test]
    fn test_trip_too_long() {
        let err = TripRequest::from_form(&form("2025-01-01", "2025-06-01")).unwrap_err();
        assert!(matches!(err, RequestError::TripTooLong { max: 90, .. }));
    }

    #[test]
    fn test_currency_conversion() {
        assert_eq!(Currency::Eur.from_usd(100.0), 85.0);
        assert_eq!(Currency::Jpy.from_usd(10.0), 1495.0);
        assert_eq!(Currency::Usd.from_usd(12.3456), 12.35);
    }
}
