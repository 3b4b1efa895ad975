//! Command implementations for the weather risk analysis CLI.
//!
//! Provides subcommands for running a threshold exceedance analysis,
//! searching for places and checking the weather backend.

use clap::{Args, Subcommand};
use std::path::PathBuf;

pub mod analyze;
pub mod config;
pub mod geo;
pub mod weather;

#[derive(Args, Debug, Clone)]
pub struct AnalyzeArgs {
    /// Place name to search for (first result is used)
    #[arg(short, long, conflicts_with_all = ["lat", "lon"])]
    pub place: Option<String>,

    /// Latitude of the location
    #[arg(long, requires = "lon", allow_hyphen_values = true)]
    pub lat: Option<f64>,

    /// Longitude of the location
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    pub lon: Option<f64>,

    /// Display name for --lat/--lon (reverse geocoded when omitted)
    #[arg(long)]
    pub name: Option<String>,

    /// First day of the analysis (YYYY-MM-DD)
    #[arg(short, long, requires = "end")]
    pub start: Option<String>,

    /// Last day of the analysis (YYYY-MM-DD)
    #[arg(short, long, requires = "start")]
    pub end: Option<String>,

    /// Quick range starting tomorrow: 7, 14 or 30 days
    #[arg(long, conflicts_with = "start")]
    pub next_days: Option<u32>,

    /// temperature, humidity, windSpeed, pressure or precipitation
    #[arg(long, default_value = "temperature")]
    pub parameter: String,

    /// 1-based preset number for the parameter
    #[arg(long)]
    pub preset: Option<usize>,

    /// Comparison operator: >, >=, <, <=, = (or gt, ge, lt, le, eq)
    #[arg(long)]
    pub operator: Option<String>,

    /// Threshold value, in --unit
    #[arg(long, allow_hyphen_values = true)]
    pub value: Option<f64>,

    /// Unit for --value, e.g. °F, C, mph, inHg
    #[arg(long)]
    pub unit: Option<String>,

    /// Write the daily probability series to this CSV file
    #[arg(long)]
    pub csv: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a threshold exceedance analysis for a place and date range
    Analyze(AnalyzeArgs),

    /// Search for places by name
    Search {
        /// Place name, at least two characters
        query: String,
    },

    /// Name the place at a coordinate
    Reverse {
        #[arg(allow_hyphen_values = true)]
        lat: f64,
        #[arg(allow_hyphen_values = true)]
        lon: f64,
    },

    /// List the quick-access locations
    Popular,

    /// Check that the weather backend is reachable
    Health,

    /// Show current conditions at a coordinate
    Current {
        #[arg(allow_hyphen_values = true)]
        lat: f64,
        #[arg(allow_hyphen_values = true)]
        lon: f64,
    },

    /// Show the daily forecast at a coordinate
    Forecast {
        #[arg(allow_hyphen_values = true)]
        lat: f64,
        #[arg(allow_hyphen_values = true)]
        lon: f64,
        /// Number of days
        #[arg(short, long, default_value_t = 7)]
        days: u32,
    },
}

pub async fn run(command: Command) -> anyhow::Result<()> {
    let config = config::Config::from_env()?;
    match command {
        Command::Analyze(args) => analyze::run_analyze(&config, args).await,
        Command::Search { query } => geo::run_search(&config, &query).await,
        Command::Reverse { lat, lon } => geo::run_reverse(&config, lat, lon).await,
        Command::Popular => {
            geo::run_popular();
            Ok(())
        }
        Command::Health => weather::run_health(&config).await,
        Command::Current { lat, lon } => weather::run_current(&config, lat, lon).await,
        Command::Forecast { lat, lon, days } => {
            weather::run_forecast(&config, lat, lon, days).await
        }
    }
}
