//! Debounced location search.
//!
//! Every keystroke gets a sequence number. A search result is applied only
//! when its number is still the latest issued, so a slow response for an
//! older query can never overwrite a newer one.

use log::{debug, warn};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use wra_core::error::Result;
use wra_core::location::{coordinate_label, Location, LocationResult};
use wra_core::service::GeocodingService;

/// Shorter queries clear the results instead of searching.
pub const MIN_QUERY_CHARS: usize = 2;

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(200);

/// Identifies one issued search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTicket {
    pub seq: u64,
    pub query: String,
}

/// Display state of the search box.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchBox {
    latest_seq: u64,
    query: String,
    results: Vec<LocationResult>,
    loading: bool,
    error: Option<String>,
}

impl SearchBox {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn results(&self) -> &[LocationResult] {
        &self.results
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_latest(&self, ticket: &SearchTicket) -> bool {
        ticket.seq == self.latest_seq
    }

    /// Record a keystroke. Returns a ticket when the query is long enough to search.
    pub fn on_query(&mut self, query: &str) -> Option<SearchTicket> {
        self.latest_seq += 1;
        self.query = query.to_string();
        self.error = None;
        let trimmed = query.trim();
        if trimmed.chars().count() < MIN_QUERY_CHARS {
            self.results.clear();
            self.loading = false;
            return None;
        }
        self.loading = true;
        Some(SearchTicket {
            seq: self.latest_seq,
            query: trimmed.to_string(),
        })
    }

    /// Apply results for `ticket`. Returns false, leaving state untouched, when stale.
    pub fn apply(&mut self, ticket: &SearchTicket, results: Vec<LocationResult>) -> bool {
        if !self.is_latest(ticket) {
            warn!(
                "dropping stale results for {:?} (#{}, latest #{})",
                ticket.query, ticket.seq, self.latest_seq
            );
            return false;
        }
        self.results = results;
        self.loading = false;
        true
    }

    /// Record a failed search. Stale failures are ignored like stale results.
    pub fn fail(&mut self, ticket: &SearchTicket, message: &str) -> bool {
        if !self.is_latest(ticket) {
            debug!("ignoring failure of stale search {:?}", ticket.query);
            return false;
        }
        self.results.clear();
        self.loading = false;
        self.error = Some(message.to_string());
        true
    }
}

/// Wraps a geocoder with debouncing and stale-response discard.
pub struct LocationResolver<G> {
    geocoder: Arc<G>,
    debounce: Duration,
    state: Arc<Mutex<SearchBox>>,
    tasks: Vec<JoinHandle<()>>,
}

impl<G> LocationResolver<G>
where
    G: GeocodingService + 'static,
{
    pub fn new(geocoder: Arc<G>, debounce: Duration) -> Self {
        Self {
            geocoder,
            debounce,
            state: Arc::new(Mutex::new(SearchBox::default())),
            tasks: Vec::new(),
        }
    }

    /// Handle a keystroke. The search runs after the debounce window unless a
    /// newer keystroke arrives first.
    pub async fn on_input(&mut self, query: &str) {
        self.tasks.retain(|task| !task.is_finished());
        let Some(ticket) = self.state.lock().await.on_query(query) else {
            return;
        };
        let geocoder = Arc::clone(&self.geocoder);
        let state = Arc::clone(&self.state);
        let debounce = self.debounce;
        self.tasks.push(tokio::spawn(async move {
            tokio::time::sleep(debounce).await;
            if !state.lock().await.is_latest(&ticket) {
                debug!("search for {:?} superseded before it ran", ticket.query);
                return;
            }
            let outcome = geocoder.search(&ticket.query).await;
            let mut search_box = state.lock().await;
            match outcome {
                Ok(results) => {
                    if search_box.apply(&ticket, results) {
                        debug!(
                            "{} results for {:?}",
                            search_box.results().len(),
                            ticket.query
                        );
                    }
                }
                Err(e) => {
                    warn!("location search for {:?} failed: {e}", ticket.query);
                    search_box.fail(&ticket, &e.to_string());
                }
            }
        }));
    }

    /// Wait for every pending and in-flight search.
    pub async fn settle(&mut self) {
        for task in self.tasks.drain(..) {
            if let Err(e) = task.await {
                warn!("search task ended abnormally: {e}");
            }
        }
    }

    pub async fn snapshot(&self) -> SearchBox {
        self.state.lock().await.clone()
    }

    pub async fn results(&self) -> Vec<LocationResult> {
        self.state.lock().await.results().to_vec()
    }

    /// A picked search result becomes the analysis location.
    pub fn select_result(&self, result: &LocationResult) -> Result<Location> {
        Location::new(result.lat, result.lon, result.display_name.clone())
    }

    /// A map click becomes the analysis location, named by reverse geocoding
    /// or by its coordinates when that fails.
    pub async fn select_map_point(&self, lat: f64, lon: f64) -> Result<Location> {
        let unnamed = Location::new(lat, lon, coordinate_label(lat, lon))?;
        match self.geocoder.reverse_geocode(lat, lon).await {
            Ok(name) if !name.trim().is_empty() => Ok(Location {
                display_name: name,
                ..unnamed
            }),
            Ok(_) => Ok(unnamed),
            Err(e) => {
                warn!("reverse geocoding failed, using coordinates: {e}");
                Ok(unnamed)
            }
        }
    }
}
