//! Tagged parsing of current-conditions and forecast payloads.
//!
//! The backend has shipped several field spellings over time (NASA POWER
//! short names such as `t2m`/`rh2m`/`ws10m`/`ps`, and long names such as
//! `temperature`). Each canonical field lists the upstream names it accepts
//! together with the scale into the canonical unit.

use crate::error::{Result, WeatherError};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// (upstream key, multiplier into the canonical unit)
type Alias = (&'static str, f64);

/// °C
const TEMPERATURE_ALIASES: &[Alias] = &[("temperature", 1.0), ("t2m", 1.0), ("ts", 1.0)];
/// %
const HUMIDITY_ALIASES: &[Alias] = &[("humidity", 1.0), ("rh2m", 1.0)];
/// m/s
const WIND_SPEED_ALIASES: &[Alias] = &[("wind_speed", 1.0), ("ws10m", 1.0), ("wspd", 1.0)];
/// hPa; NASA POWER `ps` is kPa
const PRESSURE_ALIASES: &[Alias] = &[("pressure", 1.0), ("ps", 10.0)];

/// Keys the parser knows about but does not map to a canonical field.
const PASSTHROUGH_KEYS: &[&str] = &[
    "description",
    "visibility",
    "cloud_cover",
    "date",
    "temp",
    "prectotcorr",
    "allsky_sfc_sw_dwn",
    "clrsky_sfc_sw_dwn",
    "t2m_max",
    "t2m_min",
    "u10m",
    "v10m",
];

/// Canonical current conditions. Absent fields stay `None`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temperature_c: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub wind_speed_ms: Option<f64>,
    pub pressure_hpa: Option<f64>,
    pub description: Option<String>,
    pub data_date: Option<String>,
    pub data_source: Option<String>,
}

/// One day of the backend forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub date: String,
    pub temperature_c: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub wind_speed_ms: Option<f64>,
    pub pressure_hpa: Option<f64>,
    pub description: Option<String>,
}

fn lookup(fields: &Map<String, Value>, aliases: &[Alias]) -> Option<f64> {
    aliases.iter().find_map(|(key, scale)| {
        fields
            .get(*key)
            .and_then(Value::as_f64)
            .map(|value| value * scale)
    })
}

fn lookup_str(fields: &Map<String, Value>, key: &str) -> Option<String> {
    fields.get(key).and_then(Value::as_str).map(str::to_string)
}

fn is_known_key(key: &str) -> bool {
    [TEMPERATURE_ALIASES, HUMIDITY_ALIASES, WIND_SPEED_ALIASES, PRESSURE_ALIASES]
        .iter()
        .any(|aliases| aliases.iter().any(|(alias, _)| *alias == key))
        || PASSTHROUGH_KEYS.contains(&key)
}

fn warn_unknown_keys(fields: &Map<String, Value>, context: &str) {
    let unknown = fields
        .keys()
        .filter(|key| !is_known_key(key))
        .map(String::as_str)
        .collect::<Vec<_>>();
    if !unknown.is_empty() {
        warn!("ignoring unrecognized {context} fields: {}", unknown.join(", "));
    }
}

fn as_object<'a>(value: &'a Value, context: &str) -> Result<&'a Map<String, Value>> {
    value
        .as_object()
        .ok_or_else(|| WeatherError::Parse(format!("{context} payload is not a JSON object")))
}

impl CurrentConditions {
    /// Parse `{"current": {...}, "data_date": ..., "data_source": ...}`.
    /// A payload with no `current` object is treated as the object itself.
    pub fn from_payload(payload: &Value) -> Result<Self> {
        let envelope = as_object(payload, "current weather")?;
        let fields = match envelope.get("current") {
            Some(current) => as_object(current, "current weather")?,
            None => envelope,
        };
        warn_unknown_keys(fields, "current weather");

        let conditions = Self {
            temperature_c: lookup(fields, TEMPERATURE_ALIASES),
            humidity_pct: lookup(fields, HUMIDITY_ALIASES),
            wind_speed_ms: lookup(fields, WIND_SPEED_ALIASES),
            pressure_hpa: lookup(fields, PRESSURE_ALIASES),
            description: lookup_str(fields, "description"),
            data_date: lookup_str(envelope, "data_date")
                .or_else(|| lookup_str(envelope, "timestamp")),
            data_source: lookup_str(envelope, "data_source"),
        };
        if conditions.temperature_c.is_none()
            && conditions.humidity_pct.is_none()
            && conditions.wind_speed_ms.is_none()
            && conditions.pressure_hpa.is_none()
        {
            warn!("current weather payload carried no recognized measurements");
        }
        debug!("parsed current conditions: {conditions:?}");
        Ok(conditions)
    }
}

impl ForecastDay {
    /// Parse `{"forecast": [{...}, ...]}` into daily entries.
    pub fn list_from_payload(payload: &Value) -> Result<Vec<ForecastDay>> {
        let days = payload
            .get("forecast")
            .and_then(Value::as_array)
            .ok_or_else(|| {
                WeatherError::Parse("forecast payload has no 'forecast' array".to_string())
            })?;
        days.iter()
            .map(|day| {
                let fields = as_object(day, "forecast day")?;
                warn_unknown_keys(fields, "forecast day");
                let date = lookup_str(fields, "date")
                    .ok_or_else(|| WeatherError::Parse("forecast day without a date".to_string()))?;
                Ok(ForecastDay {
                    date,
                    temperature_c: lookup(fields, TEMPERATURE_ALIASES)
                        .or_else(|| lookup(fields, &[("temp", 1.0)])),
                    humidity_pct: lookup(fields, HUMIDITY_ALIASES),
                    wind_speed_ms: lookup(fields, WIND_SPEED_ALIASES),
                    pressure_hpa: lookup(fields, PRESSURE_ALIASES),
                    description: lookup_str(fields, "description"),
                })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_nasa_short_names() {
        let payload = json!({
            "lat": 33.4, "lon": -112.0,
            "current": {"ts": 31.5, "rh2m": 12.0, "ws10m": 3.2, "ps": 96.8},
            "data_date": "2025-05-28"
        });
        let conditions = CurrentConditions::from_payload(&payload).unwrap();
        assert_eq!(conditions.temperature_c, Some(31.5));
        assert_eq!(conditions.humidity_pct, Some(12.0));
        assert_eq!(conditions.wind_speed_ms, Some(3.2));
        assert!((conditions.pressure_hpa.unwrap() - 968.0).abs() < 1e-9);
        assert_eq!(conditions.data_date.as_deref(), Some("2025-05-28"));
    }

    #[test]
    fn test_long_names_take_priority() {
        let payload = json!({
            "current": {"temperature": 20.0, "t2m": 99.0, "humidity": 55, "description": "Clear"},
            "data_source": "NASA POWER API"
        });
        let conditions = CurrentConditions::from_payload(&payload).unwrap();
        assert_eq!(conditions.temperature_c, Some(20.0));
        assert_eq!(conditions.humidity_pct, Some(55.0));
        assert_eq!(conditions.wind_speed_ms, None);
        assert_eq!(conditions.description.as_deref(), Some("Clear"));
        assert_eq!(conditions.data_source.as_deref(), Some("NASA POWER API"));
    }

    #[test]
    fn test_unknown_payload_defaults_to_none() {
        let conditions = CurrentConditions::from_payload(&json!({"mystery": 1})).unwrap();
        assert_eq!(conditions, CurrentConditions::default());
        assert!(CurrentConditions::from_payload(&json!([1, 2])).is_err());
    }

    #[test]
    fn test_forecast_list() {
        let payload = json!({
            "forecast": [
                {
                    "date": "2025-06-01",
                    "temperature": 38.2,
                    "humidity": 15,
                    "wind_speed": 4.0,
                    "pressure": 1008.0
                },
                {"date": "2025-06-02", "temp": 39.0}
            ]
        });
        let days = ForecastDay::list_from_payload(&payload).unwrap();
        assert_eq!(days.len(), 2);
        assert_eq!(days[0].pressure_hpa, Some(1008.0));
        assert_eq!(days[1].temperature_c, Some(39.0));
        assert!(ForecastDay::list_from_payload(&json!({})).is_err());
    }
}
