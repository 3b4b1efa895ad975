//! Domain model for weather risk analysis: units, thresholds, date ranges,
//! locations and the analysis request/response contract.
//!
//! Enable the `api` feature for the reqwest-backed backend and geocoding clients.

pub mod analysis;
pub mod current;
pub mod date_range;
pub mod error;
pub mod location;
pub mod service;
pub mod threshold;
pub mod units;

#[cfg(feature = "api")]
pub mod client;
#[cfg(feature = "api")]
pub mod geocoding;

pub use error::{Result, WeatherError};
