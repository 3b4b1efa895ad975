//! Analysis request/response payloads exchanged with the risk-analysis backend.

use crate::date_range::{DateRange, Days};
use crate::error::{Result, WeatherError};
use crate::location::Location;
use crate::threshold::{Operator, WeatherParameter, WeatherThreshold};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Daily probability above which a day counts as high risk.
pub const HIGH_RISK_PROBABILITY: f64 = 0.5;
/// Daily probability above which a day counts as medium risk.
pub const MEDIUM_RISK_PROBABILITY: f64 = 0.3;

/// The outgoing analysis request. `threshold` is in the parameter's canonical unit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisRequest {
    pub latitude: f64,
    pub longitude: f64,
    pub location_name: String,
    pub parameter: WeatherParameter,
    pub operator: Operator,
    pub threshold: f64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl AnalysisRequest {
    /// Assemble a request, converting the threshold to the canonical unit.
    pub fn build(
        location: &Location,
        range: &DateRange,
        threshold: &WeatherThreshold,
    ) -> Result<Self> {
        let (start_date, end_date) = range.bounds().ok_or_else(|| {
            WeatherError::Validation("both a start and an end date are required".to_string())
        })?;
        if end_date < start_date {
            return Err(WeatherError::Validation(format!(
                "end date {end_date} is before start date {start_date}"
            )));
        }
        Ok(Self {
            latitude: location.latitude,
            longitude: location.longitude,
            location_name: location.display_name.clone(),
            parameter: threshold.parameter,
            operator: threshold.operator,
            threshold: threshold.canonical_value(),
            start_date,
            end_date,
        })
    }

    pub fn days(&self) -> Days {
        Days(self.start_date, self.end_date)
    }
}

/// Coarse summary of the overall exceedance probability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    /// Case-insensitive match of a server label; `None` when unrecognized.
    pub fn parse_label(label: &str) -> Option<RiskLevel> {
        match label.trim().to_lowercase().as_str() {
            "high" => Some(RiskLevel::High),
            "medium" => Some(RiskLevel::Medium),
            "low" => Some(RiskLevel::Low),
            _ => None,
        }
    }

    /// Local bucketing: > 0.5 high, > 0.3 medium, otherwise low.
    pub fn from_probability(probability: f64) -> RiskLevel {
        if probability > HIGH_RISK_PROBABILITY {
            RiskLevel::High
        } else if probability > MEDIUM_RISK_PROBABILITY {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationEcho {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateRangeEcho {
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default)]
    pub days: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriteriaEcho {
    pub parameter: String,
    pub operator: String,
    pub threshold: f64,
    pub date_range: DateRangeEcho,
}

/// One day of the probability series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyProbability {
    pub date: NaiveDate,
    pub probability: f64,
    #[serde(default)]
    pub predicted_value: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskSummary {
    pub overall_probability: f64,
    pub risk_level: String,
    #[serde(default)]
    pub summary: String,
    pub daily_probabilities: Vec<DailyProbability>,
}

/// Climatology of the parameter at the location.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct HistoricalContext {
    pub mean: f64,
    #[serde(rename = "std")]
    pub stddev: f64,
    pub min: f64,
    pub max: f64,
    pub historical_exceedance_rate: f64,
    pub total_days: u32,
    pub exceedance_days: u32,
}

/// The backend's answer. Immutable once received.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub analysis_id: String,
    pub location: LocationEcho,
    pub criteria: CriteriaEcho,
    pub results: RiskSummary,
    #[serde(default)]
    pub historical_context: HistoricalContext,
    #[serde(default)]
    pub generated_at: Option<String>,
    #[serde(default)]
    pub data_source: Option<String>,
}

impl AnalysisResult {
    pub fn daily_probabilities(&self) -> &[DailyProbability] {
        &self.results.daily_probabilities
    }

    pub fn overall_probability(&self) -> f64 {
        self.results.overall_probability
    }

    /// The server's risk label, parsed.
    pub fn server_risk_level(&self) -> Option<RiskLevel> {
        RiskLevel::parse_label(&self.results.risk_level)
    }

    /// Server label when recognized, otherwise bucketed from the overall probability.
    pub fn risk_level(&self) -> RiskLevel {
        self.server_risk_level()
            .unwrap_or_else(|| RiskLevel::from_probability(self.results.overall_probability))
    }

    /// Check probabilities are in [0, 1] and the series covers every
    /// requested day.
    pub fn validate(&self, request: &AnalysisRequest) -> Result<()> {
        let in_unit_range = |p: f64| (0.0..=1.0).contains(&p);
        if !in_unit_range(self.results.overall_probability) {
            return Err(WeatherError::Parse(format!(
                "overall probability {} is outside [0, 1]",
                self.results.overall_probability
            )));
        }
        if let Some(day) = self
            .results
            .daily_probabilities
            .iter()
            .find(|day| !in_unit_range(day.probability))
        {
            return Err(WeatherError::Parse(format!(
                "probability {} for {} is outside [0, 1]",
                day.probability, day.date
            )));
        }
        let covered = self
            .results
            .daily_probabilities
            .iter()
            .map(|day| day.date)
            .collect::<HashSet<NaiveDate>>();
        if let Some(missing) = request.days().find(|date| !covered.contains(date)) {
            return Err(WeatherError::Parse(format!(
                "daily probabilities are missing {missing} (requested {} to {})",
                request.start_date, request.end_date
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod fixtures {
    /// A two-day backend response for Phoenix.
    pub const PHOENIX_RESPONSE: &str = r#"{
        "analysis_id": "a-123",
        "location": {"name": "Phoenix, Arizona, USA", "latitude": 33.4484, "longitude": -112.074},
        "criteria": {
            "parameter": "temperature",
            "operator": ">",
            "threshold": 43.33,
            "date_range": {"start": "2025-06-01", "end": "2025-06-02", "days": 2}
        },
        "results": {
            "overall_probability": 0.72,
            "risk_level": "HIGH",
            "summary": "Extreme heat likely",
            "daily_probabilities": [
                {"date": "2025-06-01", "probability": 0.65, "predicted_value": 44.1},
                {"date": "2025-06-02", "probability": 0.79, "predicted_value": 45.0}
            ]
        },
        "historical_context": {
            "mean": 41.2, "std": 2.3, "min": 35.0, "max": 47.8,
            "historical_exceedance_rate": 0.31, "total_days": 620, "exceedance_days": 192
        },
        "generated_at": "2025-05-31T12:00:00Z",
        "data_source": "NASA POWER"
    }"#;
}

#[cfg(test)]
mod tests {
    use super::fixtures::PHOENIX_RESPONSE;
    use super::*;
    use crate::units::Unit;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn phoenix_request(end: NaiveDate) -> AnalysisRequest {
        AnalysisRequest::build(
            &Location::default(),
            &DateRange::complete(ymd(2025, 6, 1), end),
            &WeatherThreshold::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_build_converts_to_celsius() {
        let request = phoenix_request(ymd(2025, 6, 14));
        assert!((request.threshold - (110.0 - 32.0) * 5.0 / 9.0).abs() < 1e-9);
        assert_eq!(request.parameter, WeatherParameter::Temperature);
        assert_eq!(request.location_name, "Phoenix, Arizona, USA");
        assert_eq!(request.days().count(), 14);
    }

    #[test]
    fn test_build_keeps_celsius() {
        let threshold = WeatherThreshold::custom(
            WeatherParameter::Temperature,
            Operator::GreaterThan,
            40.0,
            Unit::Celsius,
        );
        let request = AnalysisRequest::build(
            &Location::default(),
            &DateRange::complete(ymd(2025, 6, 1), ymd(2025, 6, 2)),
            &threshold,
        )
        .unwrap();
        assert_eq!(request.threshold, 40.0);
    }

    #[test]
    fn test_build_requires_complete_range() {
        let result = AnalysisRequest::build(
            &Location::default(),
            &DateRange::pending(ymd(2025, 6, 1)),
            &WeatherThreshold::default(),
        );
        assert!(matches!(result, Err(WeatherError::Validation(_))));

        let inverted = AnalysisRequest::build(
            &Location::default(),
            &DateRange::complete(ymd(2025, 6, 14), ymd(2025, 6, 1)),
            &WeatherThreshold::default(),
        );
        assert!(matches!(inverted, Err(WeatherError::Validation(_))));
    }

    #[test]
    fn test_request_wire_format() {
        let json = serde_json::to_value(phoenix_request(ymd(2025, 6, 14))).unwrap();
        assert_eq!(json["parameter"], "temperature");
        assert_eq!(json["operator"], ">");
        assert_eq!(json["start_date"], "2025-06-01");
        assert_eq!(json["end_date"], "2025-06-14");
    }

    #[test]
    fn test_parse_response() {
        let result: AnalysisResult = serde_json::from_str(PHOENIX_RESPONSE).unwrap();
        assert_eq!(result.analysis_id, "a-123");
        assert_eq!(result.daily_probabilities().len(), 2);
        assert_eq!(result.historical_context.stddev, 2.3);
        assert_eq!(result.server_risk_level(), Some(RiskLevel::High));
        assert_eq!(result.risk_level(), RiskLevel::High);
        assert!(result.validate(&phoenix_request(ymd(2025, 6, 2))).is_ok());
    }

    #[test]
    fn test_validate_detects_gaps() {
        let result: AnalysisResult = serde_json::from_str(PHOENIX_RESPONSE).unwrap();
        let err = result.validate(&phoenix_request(ymd(2025, 6, 3))).unwrap_err();
        assert!(err.to_string().contains("2025-06-03"));
    }

    #[test]
    fn test_validate_rejects_out_of_range_probability() {
        let mut result: AnalysisResult = serde_json::from_str(PHOENIX_RESPONSE).unwrap();
        result.results.daily_probabilities[1].probability = 1.2;
        assert!(result.validate(&phoenix_request(ymd(2025, 6, 2))).is_err());
    }

    #[test]
    fn test_risk_level_fallback() {
        let mut result: AnalysisResult = serde_json::from_str(PHOENIX_RESPONSE).unwrap();
        result.results.risk_level = "elevated".to_string();
        result.results.overall_probability = 0.4;
        assert_eq!(result.server_risk_level(), None);
        assert_eq!(result.risk_level(), RiskLevel::Medium);
    }

    #[test]
    fn test_bucketing() {
        assert_eq!(RiskLevel::from_probability(0.51), RiskLevel::High);
        assert_eq!(RiskLevel::from_probability(0.5), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_probability(0.3), RiskLevel::Low);
        assert_eq!(RiskLevel::parse_label(" Medium "), Some(RiskLevel::Medium));
    }
}
