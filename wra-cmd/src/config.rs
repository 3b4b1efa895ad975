//! Environment-driven settings.

use anyhow::{anyhow, Result};
use std::env;
use std::str::FromStr;
use std::time::Duration;
use wra_core::client::WeatherApiClient;
use wra_core::geocoding::{CombinedGeocoder, NOMINATIM_URL, PHOTON_URL};

pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub api_url: String,
    pub nominatim_url: String,
    pub photon_url: String,
    pub http_timeout: Duration,
    pub search_debounce: Duration,
    pub max_range_days: i64,
}

impl Config {
    /// Load configuration from environment variables.
    /// Loads `.env` file if present; every variable has a default.
    pub fn from_env() -> Result<Self> {
        // Best-effort .env load; ignore if missing
        let _ = dotenvy::dotenv();

        Ok(Self {
            api_url: get_var_or("WRA_API_URL", DEFAULT_API_URL),
            nominatim_url: get_var_or("WRA_NOMINATIM_URL", NOMINATIM_URL),
            photon_url: get_var_or("WRA_PHOTON_URL", PHOTON_URL),
            http_timeout: Duration::from_secs(parse_var("WRA_HTTP_TIMEOUT_SECS", 10)?),
            search_debounce: Duration::from_millis(parse_var("WRA_SEARCH_DEBOUNCE_MS", 200)?),
            max_range_days: parse_var("WRA_MAX_RANGE_DAYS", 30)?,
        })
    }

    pub fn api_client(&self) -> Result<WeatherApiClient> {
        Ok(WeatherApiClient::new(&self.api_url, self.http_timeout)?)
    }

    pub fn geocoder(&self) -> Result<CombinedGeocoder> {
        Ok(CombinedGeocoder::from_urls(
            &self.nominatim_url,
            &self.photon_url,
            self.http_timeout,
        )?)
    }
}

fn get_var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_owned())
}

fn parse_var<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow!("invalid {key} {raw:?}: {e}")),
        Err(_) => Ok(default),
    }
}
