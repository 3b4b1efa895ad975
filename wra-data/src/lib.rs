//! Display-ready views of an analysis result.
//!
//! Everything here is a pure function of the backend response and the
//! threshold it was requested with; nothing performs I/O.

/// Summary statistics over the daily probability series.
pub mod statistics {
    use serde::Serialize;
    use wra_core::analysis::{DailyProbability, HIGH_RISK_PROBABILITY};

    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub struct DerivedStatistics {
        pub average_probability: f64,
        pub peak_probability: f64,
        /// Days with probability strictly above 0.5.
        pub high_risk_day_count: usize,
        pub total_days: usize,
    }

    /// `None` for an empty series.
    pub fn derive(days: &[DailyProbability]) -> Option<DerivedStatistics> {
        if days.is_empty() {
            return None;
        }
        let sum: f64 = days.iter().map(|d| d.probability).sum();
        let peak = days
            .iter()
            .map(|d| d.probability)
            .fold(f64::NEG_INFINITY, f64::max);
        let high_risk_day_count = days
            .iter()
            .filter(|d| d.probability > HIGH_RISK_PROBABILITY)
            .count();
        Some(DerivedStatistics {
            average_probability: sum / days.len() as f64,
            peak_probability: peak,
            high_risk_day_count,
            total_days: days.len(),
        })
    }

}

/// Risk styling, chart rows and recommendations.
pub mod presenter {
    use crate::statistics::{self, DerivedStatistics};
    use chrono::NaiveDate;
    use log::debug;
    use serde::Serialize;
    use wra_core::analysis::{AnalysisResult, DailyProbability, RiskLevel};
    use wra_core::threshold::WeatherThreshold;
    use wra_core::units::Unit;

    /// Badge style for a server risk label.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
    pub enum RiskStyle {
        High,
        Medium,
        Low,
        Neutral,
    }

    impl RiskStyle {
        pub fn color(&self) -> &'static str {
            match self {
                RiskStyle::High => "red",
                RiskStyle::Medium => "yellow",
                RiskStyle::Low => "green",
                RiskStyle::Neutral => "gray",
            }
        }
    }

    impl From<RiskLevel> for RiskStyle {
        fn from(level: RiskLevel) -> Self {
            match level {
                RiskLevel::High => RiskStyle::High,
                RiskLevel::Medium => RiskStyle::Medium,
                RiskLevel::Low => RiskStyle::Low,
            }
        }
    }

    /// Case-insensitive; anything unrecognized is neutral.
    pub fn risk_style(label: &str) -> RiskStyle {
        match RiskLevel::parse_label(label) {
            Some(level) => level.into(),
            None => {
                debug!("unrecognized risk label {label:?}, using neutral style");
                RiskStyle::Neutral
            }
        }
    }

    pub fn recommendations(level: RiskLevel) -> &'static [&'static str] {
        match level {
            RiskLevel::High => &[
                "High risk period - prepare contingency plans",
                "Monitor weather updates closely",
                "Consider adjusting activities during peak risk days",
            ],
            RiskLevel::Medium => &[
                "Moderate risk - maintain awareness",
                "Check forecasts regularly",
                "Have backup plans ready",
            ],
            RiskLevel::Low => &[
                "Low risk period - favorable conditions expected",
                "Good time for outdoor activities",
                "Consider this for planning purposes",
            ],
        }
    }

    /// One chart point.
    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub struct ChartRow {
        /// 1-based
        pub day: usize,
        pub date: NaiveDate,
        pub probability: f64,
        pub probability_percentage: f64,
        pub predicted_value: f64,
        pub threshold: f64,
        pub risk_zone: RiskLevel,
    }

    pub fn chart_rows(days: &[DailyProbability], threshold: f64) -> Vec<ChartRow> {
        days.iter()
            .enumerate()
            .map(|(i, d)| ChartRow {
                day: i + 1,
                date: d.date,
                probability: d.probability,
                probability_percentage: d.probability * 100.0,
                predicted_value: d.predicted_value,
                threshold,
                risk_zone: RiskLevel::from_probability(d.probability),
            })
            .collect()
    }

    #[derive(Debug, Clone, PartialEq, Serialize)]
    pub struct Presentation {
        /// The threshold as the user entered it, e.g. "Extreme Heat (>110°F)".
        pub criteria_label: String,
        pub overall_probability: f64,
        /// The server's label, verbatim.
        pub risk_label: String,
        pub risk_style: RiskStyle,
        /// Server label when recognized, otherwise bucketed locally.
        pub risk_level: RiskLevel,
        pub summary: String,
        pub statistics: Option<DerivedStatistics>,
        pub recommendations: Vec<String>,
        /// Unit of `threshold` and `predicted_value` in the chart rows.
        pub value_unit: Unit,
        pub rows: Vec<ChartRow>,
    }

    pub fn present(result: &AnalysisResult, threshold: &WeatherThreshold) -> Presentation {
        let days = result.daily_probabilities();
        let risk_level = result.risk_level();
        Presentation {
            criteria_label: threshold.label.clone(),
            overall_probability: result.overall_probability(),
            risk_label: result.results.risk_level.clone(),
            risk_style: risk_style(&result.results.risk_level),
            risk_level,
            summary: result.results.summary.clone(),
            statistics: statistics::derive(days),
            recommendations: recommendations(risk_level)
                .iter()
                .map(|s| s.to_string())
                .collect(),
            value_unit: threshold.parameter.canonical_unit(),
            rows: chart_rows(days, result.criteria.threshold),
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use wra_core::analysis::{
            CriteriaEcho, DateRangeEcho, HistoricalContext, LocationEcho, RiskSummary,
        };

        fn result(risk_level: &str, probabilities: &[f64]) -> AnalysisResult {
            let start = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
            let daily = probabilities
                .iter()
                .enumerate()
                .map(|(i, p)| DailyProbability {
                    date: start + chrono::Duration::days(i as i64),
                    probability: *p,
                    predicted_value: 42.0 + i as f64,
                })
                .collect::<Vec<_>>();
            let end = daily.last().map(|d| d.date).unwrap_or(start);
            AnalysisResult {
                analysis_id: "test".to_string(),
                location: LocationEcho {
                    name: "Phoenix, Arizona, USA".to_string(),
                    latitude: 33.4484,
                    longitude: -112.074,
                },
                criteria: CriteriaEcho {
                    parameter: "temperature".to_string(),
                    operator: ">".to_string(),
                    threshold: 43.33,
                    date_range: DateRangeEcho {
                        start,
                        end,
                        days: daily.len() as u32,
                    },
                },
                results: RiskSummary {
                    overall_probability: 0.4,
                    risk_level: risk_level.to_string(),
                    summary: "Moderate chance of extreme heat".to_string(),
                    daily_probabilities: daily,
                },
                historical_context: HistoricalContext::default(),
                generated_at: None,
                data_source: None,
            }
        }

        #[test]
        fn test_risk_style_is_case_insensitive() {
            assert_eq!(risk_style("HIGH"), RiskStyle::High);
            assert_eq!(risk_style("Medium"), RiskStyle::Medium);
            assert_eq!(risk_style("low"), RiskStyle::Low);
            assert_eq!(risk_style("catastrophic"), RiskStyle::Neutral);
            assert_eq!(risk_style(""), RiskStyle::Neutral);
            assert_eq!(RiskStyle::Neutral.color(), "gray");
        }

        #[test]
        fn test_chart_rows() {
            let low = result("low", &[0.2, 0.35, 0.8]);
            let rows = chart_rows(&low.results.daily_probabilities, 43.33);
            assert_eq!(rows.len(), 3);
            assert_eq!(rows[0].day, 1);
            assert_eq!(rows[0].risk_zone, RiskLevel::Low);
            assert_eq!(rows[1].risk_zone, RiskLevel::Medium);
            assert_eq!(rows[2].risk_zone, RiskLevel::High);
            assert!((rows[2].probability_percentage - 80.0).abs() < 1e-9);
            assert!(rows.iter().all(|r| r.threshold == 43.33));
        }

        #[test]
        fn test_present_uses_server_label() {
            let threshold = WeatherThreshold::default();
            let view = present(&result("High", &[0.1, 0.6, 0.9, 0.2, 0.55]), &threshold);
            assert_eq!(view.risk_level, RiskLevel::High);
            assert_eq!(view.risk_style, RiskStyle::High);
            assert_eq!(view.criteria_label, "Extreme Heat (>110°F)");
            assert_eq!(view.value_unit, Unit::Celsius);
            assert_eq!(view.statistics.as_ref().map(|s| s.high_risk_day_count), Some(3));
            assert_eq!(view.recommendations[0], "High risk period - prepare contingency plans");
            assert_eq!(view.rows.len(), 5);
        }

        #[test]
        fn test_present_falls_back_on_unknown_label() {
            let view = present(&result("elevated", &[0.4]), &WeatherThreshold::default());
            assert_eq!(view.risk_style, RiskStyle::Neutral);
            assert_eq!(view.risk_label, "elevated");
            // overall 0.4 buckets to medium
            assert_eq!(view.risk_level, RiskLevel::Medium);
            assert_eq!(view.recommendations.len(), 3);
        }
    }
}
