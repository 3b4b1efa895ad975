//! Weather thresholds: the (parameter, operator, value, unit) tuple under test.
//!
//! Every operation returns a new [`WeatherThreshold`] whose `label` already
//! agrees with its other fields.

use crate::error::{Result, WeatherError};
use crate::units::{self, Unit};
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use wra_utils::numbers::round_to;

/// Weather quantity a threshold is tested against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WeatherParameter {
    Temperature,
    Humidity,
    WindSpeed,
    Pressure,
    Precipitation,
}

/// Comparison applied between the daily value and the threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    #[serde(rename = ">")]
    GreaterThan,
    #[serde(rename = ">=")]
    GreaterOrEqual,
    #[serde(rename = "<")]
    LessThan,
    #[serde(rename = "<=")]
    LessOrEqual,
    #[serde(rename = "=")]
    Equal,
}

/// A canned threshold with its own fixed label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdPreset {
    pub operator: Operator,
    pub value: f64,
    pub label: &'static str,
}

/// Catalog entry for one parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSpec {
    pub id: WeatherParameter,
    pub label: &'static str,
    pub default_unit: Unit,
    pub unit_options: &'static [Unit],
    pub presets: &'static [ThresholdPreset],
}

const fn preset(operator: Operator, value: f64, label: &'static str) -> ThresholdPreset {
    ThresholdPreset {
        operator,
        value,
        label,
    }
}

static CATALOG: [ParameterSpec; 5] = [
    ParameterSpec {
        id: WeatherParameter::Temperature,
        label: "Temperature",
        default_unit: Unit::Fahrenheit,
        unit_options: &[Unit::Fahrenheit, Unit::Celsius],
        presets: &[
            preset(Operator::GreaterThan, 110.0, "Extreme Heat (>110°F)"),
            preset(Operator::GreaterThan, 100.0, "Very Hot (>100°F)"),
            preset(Operator::GreaterThan, 90.0, "Hot (>90°F)"),
            preset(Operator::LessThan, 32.0, "Freezing (<32°F)"),
            preset(Operator::LessThan, 20.0, "Very Cold (<20°F)"),
        ],
    },
    ParameterSpec {
        id: WeatherParameter::Humidity,
        label: "Humidity",
        default_unit: Unit::Percent,
        unit_options: &[Unit::Percent],
        presets: &[
            preset(Operator::GreaterThan, 80.0, "Very Humid (>80%)"),
            preset(Operator::GreaterThan, 70.0, "Humid (>70%)"),
            preset(Operator::LessThan, 30.0, "Dry (<30%)"),
            preset(Operator::LessThan, 20.0, "Very Dry (<20%)"),
        ],
    },
    ParameterSpec {
        id: WeatherParameter::WindSpeed,
        label: "Wind Speed",
        default_unit: Unit::MilesPerHour,
        unit_options: &[
            Unit::MilesPerHour,
            Unit::MetersPerSecond,
            Unit::KilometersPerHour,
        ],
        presets: &[
            preset(Operator::GreaterThan, 74.0, "Hurricane Force (>74 mph)"),
            preset(Operator::GreaterThan, 39.0, "Gale Force (>39 mph)"),
            preset(Operator::GreaterThan, 25.0, "Strong Wind (>25 mph)"),
            preset(Operator::GreaterThan, 15.0, "Moderate Wind (>15 mph)"),
        ],
    },
    ParameterSpec {
        id: WeatherParameter::Pressure,
        label: "Pressure",
        default_unit: Unit::Hectopascals,
        unit_options: &[
            Unit::Hectopascals,
            Unit::InchesOfMercury,
            Unit::MillimetersOfMercury,
        ],
        presets: &[
            preset(Operator::LessThan, 980.0, "Low Pressure (<980 hPa)"),
            preset(Operator::LessThan, 1000.0, "Below Normal (<1000 hPa)"),
            preset(Operator::GreaterThan, 1030.0, "High Pressure (>1030 hPa)"),
            preset(Operator::GreaterThan, 1020.0, "Above Normal (>1020 hPa)"),
        ],
    },
    ParameterSpec {
        id: WeatherParameter::Precipitation,
        label: "Precipitation",
        default_unit: Unit::Millimeters,
        unit_options: &[Unit::Millimeters, Unit::Inches],
        presets: &[
            preset(Operator::GreaterThan, 50.0, "Heavy Rain (>50 mm)"),
            preset(Operator::GreaterThan, 25.0, "Moderate Rain (>25 mm)"),
            preset(Operator::GreaterThan, 10.0, "Light Rain (>10 mm)"),
            preset(Operator::LessThan, 1.0, "Dry Day (<1 mm)"),
        ],
    },
];

/// All parameters offered to the user, in display order.
pub fn parameter_catalog() -> &'static [ParameterSpec] {
    &CATALOG
}

/// Find a catalog entry by its wire id ("temperature", "windSpeed", ...).
pub fn find_parameter(id: &str) -> Option<&'static ParameterSpec> {
    let wanted = id.trim();
    CATALOG
        .iter()
        .find(|spec| spec.id.as_str().eq_ignore_ascii_case(wanted))
}

impl WeatherParameter {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeatherParameter::Temperature => "temperature",
            WeatherParameter::Humidity => "humidity",
            WeatherParameter::WindSpeed => "windSpeed",
            WeatherParameter::Pressure => "pressure",
            WeatherParameter::Precipitation => "precipitation",
        }
    }

    pub fn spec(&self) -> Option<&'static ParameterSpec> {
        CATALOG.iter().find(|spec| spec.id == *self)
    }

    pub fn label(&self) -> &'static str {
        self.spec().map(|spec| spec.label).unwrap_or_else(|| self.as_str())
    }

    /// Unit the analysis backend expects for this parameter.
    pub fn canonical_unit(&self) -> Unit {
        match self {
            WeatherParameter::Temperature => Unit::Celsius,
            WeatherParameter::Humidity => Unit::Percent,
            WeatherParameter::WindSpeed => Unit::MetersPerSecond,
            WeatherParameter::Pressure => Unit::Hectopascals,
            WeatherParameter::Precipitation => Unit::Millimeters,
        }
    }
}

impl fmt::Display for WeatherParameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WeatherParameter {
    type Err = WeatherError;

    fn from_str(s: &str) -> Result<Self> {
        find_parameter(s)
            .map(|spec| spec.id)
            .ok_or_else(|| WeatherError::Validation(format!("unknown weather parameter '{s}'")))
    }
}

impl Operator {
    pub const ALL: [Operator; 5] = [
        Operator::GreaterThan,
        Operator::GreaterOrEqual,
        Operator::LessThan,
        Operator::LessOrEqual,
        Operator::Equal,
    ];

    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::GreaterThan => ">",
            Operator::GreaterOrEqual => ">=",
            Operator::LessThan => "<",
            Operator::LessOrEqual => "<=",
            Operator::Equal => "=",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Operator::GreaterThan => "Greater than (>)",
            Operator::GreaterOrEqual => "Greater than or equal (≥)",
            Operator::LessThan => "Less than (<)",
            Operator::LessOrEqual => "Less than or equal (≤)",
            Operator::Equal => "Equal to (=)",
        }
    }

    /// Evaluate `observed <op> threshold`.
    pub fn matches(&self, observed: f64, threshold: f64) -> bool {
        match self {
            Operator::GreaterThan => observed > threshold,
            Operator::GreaterOrEqual => observed >= threshold,
            Operator::LessThan => observed < threshold,
            Operator::LessOrEqual => observed <= threshold,
            Operator::Equal => (observed - threshold).abs() < f64::EPSILON,
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl FromStr for Operator {
    type Err = WeatherError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        Operator::ALL
            .iter()
            .copied()
            .find(|op| op.symbol() == trimmed)
            .or(match trimmed.to_ascii_lowercase().as_str() {
                "gt" => Some(Operator::GreaterThan),
                "ge" | "gte" | "≥" => Some(Operator::GreaterOrEqual),
                "lt" => Some(Operator::LessThan),
                "le" | "lte" | "≤" => Some(Operator::LessOrEqual),
                "eq" | "==" => Some(Operator::Equal),
                _ => None,
            })
            .ok_or_else(|| WeatherError::Validation(format!("unknown operator '{s}'")))
    }
}

/// One editable field of a custom threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ThresholdField {
    Operator(Operator),
    Value(f64),
    Unit(Unit),
}

/// The condition being tested for exceedance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherThreshold {
    pub parameter: WeatherParameter,
    pub operator: Operator,
    pub value: f64,
    pub unit: Unit,
    pub label: String,
}

/// `"{parameterLabel} {operator} {value}{unit}"`
pub fn custom_label(
    parameter: WeatherParameter,
    operator: Operator,
    value: f64,
    unit: Unit,
) -> String {
    format!("{} {} {}{}", parameter.label(), operator, value, unit)
}

impl Default for WeatherThreshold {
    /// The first temperature preset, "Extreme Heat (>110°F)".
    fn default() -> Self {
        let spec = &CATALOG[0];
        let threshold = Self::for_parameter(spec);
        match spec.presets.first() {
            Some(first) => threshold.select_preset(first),
            None => threshold,
        }
    }
}

impl WeatherThreshold {
    /// A custom threshold with a generated label.
    pub fn custom(parameter: WeatherParameter, operator: Operator, value: f64, unit: Unit) -> Self {
        Self {
            parameter,
            operator,
            value,
            unit,
            label: custom_label(parameter, operator, value, unit),
        }
    }

    fn for_parameter(spec: &ParameterSpec) -> Self {
        let value = spec.presets.first().map(|first| first.value).unwrap_or(0.0);
        Self::custom(spec.id, Operator::GreaterThan, value, spec.default_unit)
    }

    pub fn is_known_parameter(&self) -> bool {
        self.parameter.spec().is_some()
    }

    /// Switch to another parameter: operator `>`, the first preset's value and
    /// the parameter's default unit. Unknown ids leave the threshold untouched.
    pub fn select_parameter(&self, id: &str) -> Self {
        match find_parameter(id) {
            Some(spec) => Self::for_parameter(spec),
            None => {
                debug!("ignoring unknown weather parameter '{id}'");
                self.clone()
            }
        }
    }

    /// Apply a preset's operator and value, taking its canonical label.
    pub fn select_preset(&self, preset: &ThresholdPreset) -> Self {
        Self {
            operator: preset.operator,
            value: preset.value,
            label: preset.label.to_string(),
            ..self.clone()
        }
    }

    /// Edit one field of a custom threshold. A unit change converts the value
    /// so the physical quantity stays the same.
    pub fn set_custom_field(&self, field: ThresholdField) -> Self {
        let (operator, value, unit) = match field {
            ThresholdField::Operator(operator) => (operator, self.value, self.unit),
            ThresholdField::Value(value) => (self.operator, value, self.unit),
            ThresholdField::Unit(unit) => {
                let converted = units::convert(self.value, self.unit, unit);
                (self.operator, round_to(converted, 2), unit)
            }
        };
        Self::custom(self.parameter, operator, value, unit)
    }

    /// The threshold value in the backend's unit for this parameter.
    pub fn canonical_value(&self) -> f64 {
        units::convert(self.value, self.unit, self.parameter.canonical_unit())
    }

    /// Whether an observed value in this threshold's unit satisfies it.
    pub fn is_met_by(&self, observed: f64) -> bool {
        self.operator.matches(observed, self.value)
    }
}

impl fmt::Display for WeatherThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}
