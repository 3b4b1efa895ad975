//! Place search, reverse geocoding and the popular-locations list.

use crate::config::Config;
use log::info;
use std::sync::Arc;
use wra_core::location::{popular_locations, LocationResult};
use wra_workflow::LocationResolver;

pub(crate) fn format_result(index: usize, result: &LocationResult) -> String {
    let kind = result.kind.as_deref().unwrap_or("place");
    format!(
        "{:>2}. {} ({:.4}, {:.4}) [{}]",
        index + 1,
        result.display_name,
        result.lat,
        result.lon,
        kind
    )
}

/// Search through the debounced resolver, exactly as typed input would.
pub async fn run_search(config: &Config, query: &str) -> anyhow::Result<()> {
    let geocoder = Arc::new(config.geocoder()?);
    let mut resolver = LocationResolver::new(geocoder, config.search_debounce);
    resolver.on_input(query).await;
    resolver.settle().await;

    let snapshot = resolver.snapshot().await;
    if let Some(error) = snapshot.error() {
        anyhow::bail!("Search for {query:?} failed: {error}");
    }
    if snapshot.results().is_empty() {
        println!("No places found for {query:?}");
        return Ok(());
    }
    info!("{} places found for {query:?}", snapshot.results().len());
    for (i, result) in snapshot.results().iter().enumerate() {
        println!("{}", format_result(i, result));
    }
    Ok(())
}

pub async fn run_reverse(config: &Config, lat: f64, lon: f64) -> anyhow::Result<()> {
    let resolver = LocationResolver::new(Arc::new(config.geocoder()?), config.search_debounce);
    let location = resolver.select_map_point(lat, lon).await?;
    println!("{}", location.display_name);
    Ok(())
}

pub fn run_popular() {
    for (i, result) in popular_locations().iter().enumerate() {
        println!("{}", format_result(i, result));
    }
}
