//! Unit conversion for threshold values.
//!
//! Each physical dimension converts through a pivot unit: temperature is a
//! direct formula, wind speed pivots through m/s, pressure through hPa and
//! precipitation through mm.
//!
//! [`convert`] is permissive: a pair of units from different dimensions comes
//! back unchanged (with a warning). [`try_convert`] reports the same case as
//! [`WeatherError::UnsupportedConversion`].

use crate::error::{Result, WeatherError};
use log::warn;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// m/s per mph
pub const MPH_TO_MS: f64 = 0.44704;
/// m/s per km/h
pub const KMH_TO_MS: f64 = 0.277778;
/// hPa per inHg
pub const INHG_TO_HPA: f64 = 33.8639;
/// hPa per mmHg
pub const MMHG_TO_HPA: f64 = 1.33322;
/// mm per inch
pub const INCH_TO_MM: f64 = 25.4;

/// Physical quantity a unit measures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    Temperature,
    Ratio,
    Speed,
    Pressure,
    Length,
}

/// A display or wire unit, serialized as its symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Unit {
    #[serde(rename = "°F")]
    Fahrenheit,
    #[serde(rename = "°C")]
    Celsius,
    #[serde(rename = "%")]
    Percent,
    #[serde(rename = "mph")]
    MilesPerHour,
    #[serde(rename = "m/s")]
    MetersPerSecond,
    #[serde(rename = "km/h")]
    KilometersPerHour,
    #[serde(rename = "hPa")]
    Hectopascals,
    #[serde(rename = "inHg")]
    InchesOfMercury,
    #[serde(rename = "mmHg")]
    MillimetersOfMercury,
    #[serde(rename = "mm")]
    Millimeters,
    #[serde(rename = "in")]
    Inches,
}

impl Unit {
    pub const ALL: [Unit; 11] = [
        Unit::Fahrenheit,
        Unit::Celsius,
        Unit::Percent,
        Unit::MilesPerHour,
        Unit::MetersPerSecond,
        Unit::KilometersPerHour,
        Unit::Hectopascals,
        Unit::InchesOfMercury,
        Unit::MillimetersOfMercury,
        Unit::Millimeters,
        Unit::Inches,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            Unit::Fahrenheit => "°F",
            Unit::Celsius => "°C",
            Unit::Percent => "%",
            Unit::MilesPerHour => "mph",
            Unit::MetersPerSecond => "m/s",
            Unit::KilometersPerHour => "km/h",
            Unit::Hectopascals => "hPa",
            Unit::InchesOfMercury => "inHg",
            Unit::MillimetersOfMercury => "mmHg",
            Unit::Millimeters => "mm",
            Unit::Inches => "in",
        }
    }

    /// Long human-readable name, as offered in unit pickers.
    pub fn name(&self) -> &'static str {
        match self {
            Unit::Fahrenheit => "Fahrenheit",
            Unit::Celsius => "Celsius",
            Unit::Percent => "Percent",
            Unit::MilesPerHour => "Miles per hour",
            Unit::MetersPerSecond => "Meters per second",
            Unit::KilometersPerHour => "Kilometers per hour",
            Unit::Hectopascals => "Hectopascals",
            Unit::InchesOfMercury => "Inches of Mercury",
            Unit::MillimetersOfMercury => "Millimeters of Mercury",
            Unit::Millimeters => "Millimeters",
            Unit::Inches => "Inches",
        }
    }

    pub fn dimension(&self) -> Dimension {
        match self {
            Unit::Fahrenheit | Unit::Celsius => Dimension::Temperature,
            Unit::Percent => Dimension::Ratio,
            Unit::MilesPerHour | Unit::MetersPerSecond | Unit::KilometersPerHour => {
                Dimension::Speed
            }
            Unit::Hectopascals | Unit::InchesOfMercury | Unit::MillimetersOfMercury => {
                Dimension::Pressure
            }
            Unit::Millimeters | Unit::Inches => Dimension::Length,
        }
    }

    /// Parse a unit symbol. Accepts the bare "F"/"C" spellings used on the command line.
    pub fn parse(s: &str) -> Option<Unit> {
        let trimmed = s.trim();
        Unit::ALL
            .iter()
            .copied()
            .find(|unit| unit.symbol().eq_ignore_ascii_case(trimmed))
            .or(match trimmed.to_ascii_uppercase().as_str() {
                "F" => Some(Unit::Fahrenheit),
                "C" => Some(Unit::Celsius),
                "KMH" | "KPH" => Some(Unit::KilometersPerHour),
                "MS" => Some(Unit::MetersPerSecond),
                _ => None,
            })
    }
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Unit {
    type Err = WeatherError;

    fn from_str(s: &str) -> Result<Self> {
        Unit::parse(s).ok_or_else(|| WeatherError::Validation(format!("unknown unit '{s}'")))
    }
}

/// °F <-> °C. Any other pair returns the input.
pub fn convert_temperature(value: f64, from: Unit, to: Unit) -> f64 {
    match (from, to) {
        (Unit::Fahrenheit, Unit::Celsius) => (value - 32.0) * 5.0 / 9.0,
        (Unit::Celsius, Unit::Fahrenheit) => value * 9.0 / 5.0 + 32.0,
        _ => value,
    }
}

/// mph / km/h / m/s through m/s.
pub fn convert_wind_speed(value: f64, from: Unit, to: Unit) -> f64 {
    let meters_per_second = match from {
        Unit::MilesPerHour => value * MPH_TO_MS,
        Unit::KilometersPerHour => value * KMH_TO_MS,
        _ => value,
    };
    match to {
        Unit::MilesPerHour => meters_per_second / MPH_TO_MS,
        Unit::KilometersPerHour => meters_per_second / KMH_TO_MS,
        _ => meters_per_second,
    }
}

/// inHg / mmHg / hPa through hPa.
pub fn convert_pressure(value: f64, from: Unit, to: Unit) -> f64 {
    let hectopascals = match from {
        Unit::InchesOfMercury => value * INHG_TO_HPA,
        Unit::MillimetersOfMercury => value * MMHG_TO_HPA,
        _ => value,
    };
    match to {
        Unit::InchesOfMercury => hectopascals / INHG_TO_HPA,
        Unit::MillimetersOfMercury => hectopascals / MMHG_TO_HPA,
        _ => hectopascals,
    }
}

/// in / mm through mm.
pub fn convert_precipitation(value: f64, from: Unit, to: Unit) -> f64 {
    let millimeters = match from {
        Unit::Inches => value * INCH_TO_MM,
        _ => value,
    };
    match to {
        Unit::Inches => millimeters / INCH_TO_MM,
        _ => millimeters,
    }
}

/// Convert between two units of the same dimension.
pub fn try_convert(value: f64, from: Unit, to: Unit) -> Result<f64> {
    if from == to {
        return Ok(value);
    }
    match (from.dimension(), to.dimension()) {
        (Dimension::Temperature, Dimension::Temperature) => {
            Ok(convert_temperature(value, from, to))
        }
        (Dimension::Speed, Dimension::Speed) => Ok(convert_wind_speed(value, from, to)),
        (Dimension::Pressure, Dimension::Pressure) => Ok(convert_pressure(value, from, to)),
        (Dimension::Length, Dimension::Length) => Ok(convert_precipitation(value, from, to)),
        _ => Err(WeatherError::UnsupportedConversion {
            from: from.symbol().to_string(),
            to: to.symbol().to_string(),
        }),
    }
}

/// Permissive conversion: unsupported pairs return `value` unchanged.
pub fn convert(value: f64, from: Unit, to: Unit) -> f64 {
    match try_convert(value, from, to) {
        Ok(converted) => converted,
        Err(e) => {
            warn!("{e}; keeping value {value} unconverted");
            value
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64, tolerance: f64) -> bool {
        (a - b).abs() < tolerance
    }

    #[test]
    fn test_fahrenheit_to_celsius() {
        let c = convert(110.0, Unit::Fahrenheit, Unit::Celsius);
        assert!(close(c, 43.3333, 0.001));
        assert_eq!(convert(32.0, Unit::Fahrenheit, Unit::Celsius), 0.0);
        assert_eq!(convert(100.0, Unit::Celsius, Unit::Fahrenheit), 212.0);
    }

    #[test]
    fn test_identity() {
        assert_eq!(convert(12.5, Unit::Hectopascals, Unit::Hectopascals), 12.5);
        assert_eq!(convert(-40.0, Unit::Celsius, Unit::Celsius), -40.0);
    }

    #[test]
    fn test_temperature_round_trip() {
        let mut f = -50.0;
        while f <= 150.0 {
            let c = convert(f, Unit::Fahrenheit, Unit::Celsius);
            let back = convert(c, Unit::Celsius, Unit::Fahrenheit);
            assert!(close(back, f, 0.01), "{f} -> {c} -> {back}");
            f += 0.5;
        }
    }

    #[test]
    fn test_wind_round_trip() {
        for mph in [0.0, 15.0, 39.0, 74.0, 120.5] {
            let ms = convert(mph, Unit::MilesPerHour, Unit::MetersPerSecond);
            let back = convert(ms, Unit::MetersPerSecond, Unit::MilesPerHour);
            assert!(close(back, mph, 0.01));
        }
        let kmh = convert(10.0, Unit::MetersPerSecond, Unit::KilometersPerHour);
        assert!(close(kmh, 36.0, 0.001));
    }

    #[test]
    fn test_pressure_round_trip() {
        for inhg in [28.0, 29.92, 30.5, 31.0] {
            let hpa = convert(inhg, Unit::InchesOfMercury, Unit::Hectopascals);
            let back = convert(hpa, Unit::Hectopascals, Unit::InchesOfMercury);
            assert!(close(back, inhg, 0.01));
        }
        let mmhg = convert(1013.25, Unit::Hectopascals, Unit::MillimetersOfMercury);
        assert!(close(mmhg, 760.0, 0.01));
    }

    #[test]
    fn test_precipitation() {
        assert!(close(convert(2.0, Unit::Inches, Unit::Millimeters), 50.8, 1e-9));
        assert!(close(convert(50.8, Unit::Millimeters, Unit::Inches), 2.0, 1e-9));
    }

    #[test]
    fn test_cross_dimension_is_permissive() {
        assert_eq!(convert(90.0, Unit::Fahrenheit, Unit::MilesPerHour), 90.0);
        let err = try_convert(90.0, Unit::Fahrenheit, Unit::MilesPerHour).unwrap_err();
        assert_eq!(
            err,
            WeatherError::UnsupportedConversion {
                from: "°F".into(),
                to: "mph".into()
            }
        );
    }

    #[test]
    fn test_parse_symbols() {
        assert_eq!(Unit::parse("°F"), Some(Unit::Fahrenheit));
        assert_eq!(Unit::parse("f"), Some(Unit::Fahrenheit));
        assert_eq!(Unit::parse("KM/H"), Some(Unit::KilometersPerHour));
        assert_eq!(Unit::parse("inhg"), Some(Unit::InchesOfMercury));
        assert_eq!(Unit::parse("furlongs"), None);
        assert!("furlongs".parse::<Unit>().is_err());
    }

    #[test]
    fn test_serde_uses_symbols() {
        let json = serde_json::to_string(&Unit::MetersPerSecond).unwrap();
        assert_eq!(json, "\"m/s\"");
        let unit: Unit = serde_json::from_str("\"°C\"").unwrap();
        assert_eq!(unit, Unit::Celsius);
    }
}
