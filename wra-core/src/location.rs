use crate::error::{Result, WeatherError};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Two results closer than this on both axes are the same place (~100 m).
pub const DUPLICATE_DEGREES: f64 = 0.001;

/// Most results kept after combining geocoding providers.
pub const MAX_SEARCH_RESULTS: usize = 15;

/// The location an analysis runs for. Replaced wholesale, never patched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
    pub display_name: String,
}

impl Location {
    /// Build a location, rejecting out-of-range coordinates.
    pub fn new(latitude: f64, longitude: f64, display_name: impl Into<String>) -> Result<Self> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(WeatherError::Validation(format!(
                "latitude {latitude} is outside [-90, 90]"
            )));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(WeatherError::Validation(format!(
                "longitude {longitude} is outside [-180, 180]"
            )));
        }
        Ok(Self {
            latitude,
            longitude,
            display_name: display_name.into(),
        })
    }

    /// Name present and both coordinates numeric.
    pub fn is_complete(&self) -> bool {
        !self.display_name.trim().is_empty()
            && self.latitude.is_finite()
            && self.longitude.is_finite()
    }
}

impl Default for Location {
    fn default() -> Self {
        Self {
            latitude: 33.4484,
            longitude: -112.074,
            display_name: "Phoenix, Arizona, USA".to_string(),
        }
    }
}

/// One geocoding hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationResult {
    pub name: String,
    pub display_name: String,
    pub lat: f64,
    pub lon: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default)]
    pub importance: f64,
}

impl LocationResult {
    pub fn to_location(&self) -> Location {
        Location {
            latitude: self.lat,
            longitude: self.lon,
            display_name: self.display_name.clone(),
        }
    }

    fn is_near(&self, other: &LocationResult) -> bool {
        (self.lat - other.lat).abs() < DUPLICATE_DEGREES
            && (self.lon - other.lon).abs() < DUPLICATE_DEGREES
    }
}

/// `"{lat:.4}, {lon:.4}"`, used when no place name is available.
pub fn coordinate_label(lat: f64, lon: f64) -> String {
    format!("{lat:.4}, {lon:.4}")
}

/// Keep the first of every group of results within [`DUPLICATE_DEGREES`].
pub fn dedupe_by_proximity(results: Vec<LocationResult>) -> Vec<LocationResult> {
    let mut unique: Vec<LocationResult> = Vec::with_capacity(results.len());
    for result in results {
        if !unique.iter().any(|kept| kept.is_near(&result)) {
            unique.push(result);
        }
    }
    unique
}

/// Exact (case-insensitive) name matches first, then by importance.
/// The sort is stable, so provider order breaks ties.
pub fn rank_results(mut results: Vec<LocationResult>, query: &str) -> Vec<LocationResult> {
    let wanted = query.trim().to_lowercase();
    results.sort_by(|a, b| {
        let a_exact = a.name.to_lowercase() == wanted;
        let b_exact = b.name.to_lowercase() == wanted;
        b_exact.cmp(&a_exact).then_with(|| {
            b.importance
                .partial_cmp(&a.importance)
                .unwrap_or(Ordering::Equal)
        })
    });
    results.truncate(MAX_SEARCH_RESULTS);
    results
}

/// Combine provider batches (in priority order) into one ranked list.
pub fn merge_results(batches: Vec<Vec<LocationResult>>, query: &str) -> Vec<LocationResult> {
    let combined = batches.into_iter().flatten().collect::<Vec<_>>();
    rank_results(dedupe_by_proximity(combined), query)
}

fn popular(name: &str, display_name: &str, lat: f64, lon: f64, kind: &str) -> LocationResult {
    LocationResult {
        name: name.to_string(),
        display_name: display_name.to_string(),
        lat,
        lon,
        country: None,
        state: None,
        kind: Some(kind.to_string()),
        importance: 0.0,
    }
}

/// Quick-access places offered before the user types anything.
pub fn popular_locations() -> Vec<LocationResult> {
    vec![
        popular("Phoenix, Arizona", "Phoenix, Arizona, USA", 33.4484, -112.0740, "city"),
        popular("New York City", "New York City, New York, USA", 40.7128, -74.0060, "city"),
        popular("Los Angeles", "Los Angeles, California, USA", 34.0522, -118.2437, "city"),
        popular("Barcelona", "Barcelona, Catalonia, Spain", 41.3851, 2.1734, "city"),
        popular("Kyoto", "Kyoto, Japan", 35.0116, 135.7681, "city"),
        popular("Cape Town", "Cape Town, South Africa", -33.9249, 18.4241, "city"),
        popular("Reykjavik", "Reykjavik, Iceland", 64.1466, -21.9426, "city"),
        popular("Aspen", "Aspen, Colorado, USA", 39.1911, -106.8175, "town"),
        popular("Banff", "Banff, Alberta, Canada", 51.1784, -115.5708, "town"),
        popular("Hallstatt", "Hallstatt, Austria", 47.5623, 13.6493, "village"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hit(name: &str, lat: f64, lon: f64, importance: f64) -> LocationResult {
        LocationResult {
            name: name.to_string(),
            display_name: format!("{name}, Somewhere"),
            lat,
            lon,
            country: None,
            state: None,
            kind: None,
            importance,
        }
    }

    #[test]
    fn test_location_validation() {
        assert!(Location::new(33.4484, -112.074, "Phoenix").is_ok());
        assert!(Location::new(91.0, 0.0, "North of north").is_err());
        assert!(Location::new(0.0, -180.5, "Dateline").is_err());
        assert!(Location::new(f64::NAN, 0.0, "Nowhere").is_err());
    }

    #[test]
    fn test_is_complete() {
        assert!(Location::default().is_complete());
        let unnamed = Location::new(10.0, 10.0, "  ").unwrap();
        assert!(!unnamed.is_complete());
    }

    #[test]
    fn test_dedupe_keeps_first_of_near_duplicates() {
        let results = vec![
            hit("London", 51.5074, -0.1278, 0.9),
            hit("London (Photon)", 51.5078, -0.1275, 0.5),
            hit("London, Ontario", 42.9849, -81.2453, 0.6),
        ];
        let unique = dedupe_by_proximity(results);
        assert_eq!(unique.len(), 2);
        assert_eq!(unique[0].name, "London");
        assert_eq!(unique[1].name, "London, Ontario");
    }

    #[test]
    fn test_rank_exact_match_first() {
        let results = vec![
            hit("Londonderry", 55.0, -7.3, 0.8),
            hit("london", 51.5, -0.12, 0.4),
            hit("New London", 41.3, -72.1, 0.9),
        ];
        let ranked = rank_results(results, "London");
        assert_eq!(ranked[0].name, "london");
        assert_eq!(ranked[1].name, "New London");
        assert_eq!(ranked[2].name, "Londonderry");
    }

    #[test]
    fn test_merge_truncates() {
        let batch = (0..20)
            .map(|i| hit(&format!("Place {i}"), i as f64, i as f64, 0.1))
            .collect::<Vec<_>>();
        let merged = merge_results(vec![batch, Vec::new()], "place");
        assert_eq!(merged.len(), MAX_SEARCH_RESULTS);
    }

    #[test]
    fn test_coordinate_label() {
        assert_eq!(coordinate_label(33.44841, -112.07399), "33.4484, -112.0740");
    }

    #[test]
    fn test_popular_locations() {
        let popular = popular_locations();
        assert_eq!(popular.len(), 10);
        assert_eq!(popular[0].to_location(), Location::default());
    }
}
