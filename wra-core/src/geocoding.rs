//! Place search against OpenStreetMap Nominatim and Komoot Photon.

use crate::error::{Result, WeatherError};
use crate::location::{coordinate_label, dedupe_by_proximity, merge_results, LocationResult};
use crate::service::GeocodingService;
use async_trait::async_trait;
use log::{debug, warn};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

pub const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";
pub const PHOTON_URL: &str = "https://photon.komoot.io";

/// Nominatim's usage policy requires an identifying agent.
const USER_AGENT: &str = concat!("weather-risk-analysis/", env!("CARGO_PKG_VERSION"));

/// The settlement search is widened when it returns fewer hits than this.
const MIN_SETTLEMENT_RESULTS: usize = 5;

const BROAD_TYPES: &[&str] = &[
    "city",
    "town",
    "village",
    "hamlet",
    "municipality",
    "administrative",
];
const BROAD_CLASSES: &[&str] = &["place", "boundary"];

const PHOTON_IMPORTANCE: f64 = 0.5;

#[derive(Debug, Default, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    state: Option<String>,
    region: Option<String>,
    country: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    display_name: String,
    lat: String,
    lon: String,
    #[serde(rename = "type")]
    kind: Option<String>,
    class: Option<String>,
    importance: Option<f64>,
    #[serde(default)]
    address: NominatimAddress,
}

impl NominatimPlace {
    fn is_populated_place(&self) -> bool {
        self.kind.as_deref().is_some_and(|kind| BROAD_TYPES.contains(&kind))
            || self.class.as_deref().is_some_and(|class| BROAD_CLASSES.contains(&class))
    }

    fn into_result(self) -> Option<LocationResult> {
        let (Ok(lat), Ok(lon)) = (self.lat.parse::<f64>(), self.lon.parse::<f64>()) else {
            debug!("skipping Nominatim place with bad coordinates: {}", self.display_name);
            return None;
        };
        let address = self.address;
        let name = address
            .city
            .or(address.town)
            .or(address.village)
            .or(address.municipality)
            .unwrap_or_else(|| {
                self.display_name
                    .split(',')
                    .next()
                    .unwrap_or_default()
                    .trim()
                    .to_string()
            });
        Some(LocationResult {
            name,
            display_name: self.display_name,
            lat,
            lon,
            country: address.country,
            state: address.state.or(address.region),
            kind: Some(self.kind.unwrap_or_else(|| "place".to_string())),
            importance: self.importance.unwrap_or(0.0),
        })
    }
}

#[derive(Debug, Deserialize)]
struct NominatimReverse {
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PhotonCollection {
    #[serde(default)]
    features: Vec<PhotonFeature>,
}

#[derive(Debug, Deserialize)]
struct PhotonFeature {
    geometry: PhotonGeometry,
    properties: PhotonProperties,
}

#[derive(Debug, Deserialize)]
struct PhotonGeometry {
    /// `[lon, lat]`
    coordinates: Vec<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct PhotonProperties {
    name: Option<String>,
    city: Option<String>,
    locality: Option<String>,
    district: Option<String>,
    state: Option<String>,
    country: Option<String>,
    osm_value: Option<String>,
}

impl PhotonFeature {
    fn into_result(self) -> Option<LocationResult> {
        let [lon, lat] = self.geometry.coordinates[..] else {
            return None;
        };
        let props = self.properties;
        let name = props.name.or(props.city).or(props.locality)?;
        let display_name = [
            Some(name.as_str()),
            props.district.as_deref(),
            props.state.as_deref(),
            props.country.as_deref(),
        ]
        .into_iter()
        .flatten()
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ");
        Some(LocationResult {
            name,
            display_name,
            lat,
            lon,
            country: props.country,
            state: props.state,
            kind: Some(props.osm_value.unwrap_or_else(|| "city".to_string())),
            importance: PHOTON_IMPORTANCE,
        })
    }
}

fn parse_nominatim(body: &str) -> Result<Vec<LocationResult>> {
    let places: Vec<NominatimPlace> = serde_json::from_str(body)?;
    Ok(places.into_iter().filter_map(NominatimPlace::into_result).collect())
}

fn parse_nominatim_broad(body: &str) -> Result<Vec<LocationResult>> {
    let places: Vec<NominatimPlace> = serde_json::from_str(body)?;
    Ok(places
        .into_iter()
        .filter(NominatimPlace::is_populated_place)
        .filter_map(NominatimPlace::into_result)
        .collect())
}

fn parse_photon(body: &str) -> Result<Vec<LocationResult>> {
    let collection: PhotonCollection = serde_json::from_str(body)?;
    Ok(collection
        .features
        .into_iter()
        .filter_map(PhotonFeature::into_result)
        .collect())
}

fn build_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()?)
}

async fn get_text(client: &Client, url: &str, query: &[(&str, String)]) -> Result<String> {
    let response = client.get(url).query(query).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(WeatherError::Api {
            status: status.as_u16(),
            message: format!("geocoding request to {url} failed"),
        });
    }
    Ok(response.text().await?)
}

/// OpenStreetMap Nominatim.
#[derive(Debug, Clone)]
pub struct NominatimClient {
    client: Client,
    base_url: String,
}

impl NominatimClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    /// Settlements first; widened to any populated place or boundary when sparse.
    pub async fn search(&self, query: &str) -> Result<Vec<LocationResult>> {
        let url = format!("{}/search", self.base_url);
        let body = get_text(
            &self.client,
            &url,
            &[
                ("format", "json".to_string()),
                ("limit", "15".to_string()),
                ("q", query.to_string()),
                ("addressdetails", "1".to_string()),
                ("featuretype", "settlement".to_string()),
                ("class", "place".to_string()),
            ],
        )
        .await?;
        let mut results = parse_nominatim(&body)?;
        if results.len() >= MIN_SETTLEMENT_RESULTS {
            return Ok(results);
        }

        debug!("only {} settlement hits for {query:?}, widening search", results.len());
        let broad = get_text(
            &self.client,
            &url,
            &[
                ("format", "json".to_string()),
                ("limit", "20".to_string()),
                ("q", query.to_string()),
                ("addressdetails", "1".to_string()),
            ],
        )
        .await;
        match broad.and_then(|body| parse_nominatim_broad(&body)) {
            Ok(more) => {
                results.extend(more);
                results = dedupe_by_proximity(results);
            }
            Err(e) => warn!("broad Nominatim search failed: {e}"),
        }
        Ok(results)
    }

    /// Display name for a point, or `None` when Nominatim has no name for it.
    pub async fn reverse(&self, lat: f64, lon: f64) -> Result<Option<String>> {
        let url = format!("{}/reverse", self.base_url);
        let body = get_text(
            &self.client,
            &url,
            &[
                ("format", "json".to_string()),
                ("lat", lat.to_string()),
                ("lon", lon.to_string()),
                ("addressdetails", "1".to_string()),
            ],
        )
        .await?;
        let reverse: NominatimReverse = serde_json::from_str(&body)?;
        Ok(reverse.display_name.filter(|name| !name.trim().is_empty()))
    }
}

/// Komoot Photon, for coverage Nominatim misses.
#[derive(Debug, Clone)]
pub struct PhotonClient {
    client: Client,
    base_url: String,
}

impl PhotonClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        Ok(Self {
            client: build_client(timeout)?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub async fn search(&self, query: &str) -> Result<Vec<LocationResult>> {
        let url = format!("{}/api", self.base_url);
        let body = get_text(
            &self.client,
            &url,
            &[
                ("q", query.to_string()),
                ("limit", "10".to_string()),
                ("layer", "city,locality,district,county".to_string()),
            ],
        )
        .await?;
        parse_photon(&body)
    }
}

/// Queries both providers concurrently and merges their results.
#[derive(Debug, Clone)]
pub struct CombinedGeocoder {
    nominatim: NominatimClient,
    photon: PhotonClient,
}

impl CombinedGeocoder {
    pub fn new(nominatim: NominatimClient, photon: PhotonClient) -> Self {
        Self { nominatim, photon }
    }

    pub fn from_urls(nominatim_url: &str, photon_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self::new(
            NominatimClient::new(nominatim_url, timeout)?,
            PhotonClient::new(photon_url, timeout)?,
        ))
    }
}

#[async_trait]
impl GeocodingService for CombinedGeocoder {
    /// One failing provider degrades to the other's results; both failing is an error.
    async fn search(&self, query: &str) -> Result<Vec<LocationResult>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let (nominatim, photon) =
            tokio::join!(self.nominatim.search(query), self.photon.search(query));
        let batches = match (nominatim, photon) {
            (Ok(n), Ok(p)) => vec![n, p],
            (Ok(n), Err(e)) => {
                warn!("Photon search for {query:?} failed: {e}");
                vec![n]
            }
            (Err(e), Ok(p)) => {
                warn!("Nominatim search for {query:?} failed: {e}");
                vec![p]
            }
            (Err(e), Err(photon_err)) => {
                warn!("Photon search for {query:?} failed: {photon_err}");
                return Err(e);
            }
        };
        Ok(merge_results(batches, query))
    }

    /// Never fails; falls back to the formatted coordinates.
    async fn reverse_geocode(&self, lat: f64, lon: f64) -> Result<String> {
        match self.nominatim.reverse(lat, lon).await {
            Ok(Some(name)) => Ok(name),
            Ok(None) => Ok(coordinate_label(lat, lon)),
            Err(e) => {
                warn!("reverse geocoding {lat}, {lon} failed: {e}");
                Ok(coordinate_label(lat, lon))
            }
        }
    }
}
