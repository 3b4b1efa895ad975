//! HTTP client for the weather-risk backend.

use crate::analysis::{AnalysisRequest, AnalysisResult};
use crate::current::{CurrentConditions, ForecastDay};
use crate::error::{Result, WeatherError};
use crate::service::{AnalysisService, HealthService, HealthStatus};
use async_trait::async_trait;
use log::{info, warn};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

const MAX_TRIES: u32 = 3;
const INITIAL_BACKOFF_MILLIS: u64 = 500;

/// FastAPI error body: `{"detail": "..."}`.
#[derive(Debug, Deserialize)]
struct ErrorDetail {
    detail: Value,
}

/// Client for `/weather/*`, `/health` and the analysis endpoint.
#[derive(Debug, Clone)]
pub struct WeatherApiClient {
    client: Client,
    base_url: String,
}

impl WeatherApiClient {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Reuse an existing reqwest client.
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Send a request, retrying transient failures with exponential backoff.
    async fn send_with_retry<F>(&self, what: &str, build: F) -> Result<Response>
    where
        F: Fn() -> RequestBuilder,
    {
        let mut sleep_millis = INITIAL_BACKOFF_MILLIS;
        let mut attempt = 1;
        loop {
            let outcome = match build().send().await {
                Ok(response) => check_status(response).await,
                Err(e) => Err(WeatherError::from(e)),
            };
            match outcome {
                Ok(response) => return Ok(response),
                Err(e) if e.is_transient() && attempt < MAX_TRIES => {
                    warn!("Attempt {attempt}/{MAX_TRIES}: {what} failed: {e}");
                    info!("Sleeping for {sleep_millis} milliseconds before retrying {what}");
                    tokio::time::sleep(Duration::from_millis(sleep_millis)).await;
                    sleep_millis *= 2;
                    attempt += 1;
                }
                Err(e) => {
                    warn!("{what} failed after {attempt} attempt(s): {e}");
                    return Err(e);
                }
            }
        }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        what: &str,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<T> {
        let url = self.url(path);
        let response = self
            .send_with_retry(what, || self.client.get(&url).query(query))
            .await?;
        parse_body(response).await
    }

    /// Current conditions at a point.
    pub async fn current(&self, lat: f64, lon: f64) -> Result<CurrentConditions> {
        let payload: Value = self
            .get_json(
                "current weather",
                "weather/current",
                &[("lat", lat.to_string()), ("lon", lon.to_string())],
            )
            .await?;
        CurrentConditions::from_payload(&payload)
    }

    /// Daily forecast for the next `days` days.
    pub async fn forecast(&self, lat: f64, lon: f64, days: u32) -> Result<Vec<ForecastDay>> {
        let payload: Value = self
            .get_json(
                "forecast",
                "weather/forecast",
                &[
                    ("lat", lat.to_string()),
                    ("lon", lon.to_string()),
                    ("days", days.to_string()),
                ],
            )
            .await?;
        ForecastDay::list_from_payload(&payload)
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(WeatherError::Api {
        status: status.as_u16(),
        message: error_message(&body, status.canonical_reason().unwrap_or("request failed")),
    })
}

/// Prefer the backend's `detail` message; fall back to the raw body or the reason phrase.
fn error_message(body: &str, reason: &str) -> String {
    match serde_json::from_str::<ErrorDetail>(body) {
        Ok(ErrorDetail {
            detail: Value::String(detail),
        }) => detail,
        Ok(ErrorDetail { detail }) => detail.to_string(),
        Err(_) if !body.trim().is_empty() => body.trim().to_string(),
        Err(_) => reason.to_string(),
    }
}

async fn parse_body<T: DeserializeOwned>(response: Response) -> Result<T> {
    let body = response.text().await?;
    Ok(serde_json::from_str(&body)?)
}

#[async_trait]
impl AnalysisService for WeatherApiClient {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult> {
        info!(
            "Requesting {} {} {} analysis for {} from {} to {}",
            request.parameter,
            request.operator,
            request.threshold,
            request.location_name,
            request.start_date,
            request.end_date
        );
        let url = self.url("weather/analyze");
        let response = self
            .send_with_retry("risk analysis", || self.client.post(&url).json(request))
            .await?;
        let result: AnalysisResult = parse_body(response).await?;
        result.validate(request)?;
        Ok(result)
    }
}

#[async_trait]
impl HealthService for WeatherApiClient {
    async fn health(&self) -> Result<HealthStatus> {
        self.get_json("health check", "health", &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let client = WeatherApiClient::with_client(Client::new(), "http://localhost:8000/api/");
        assert_eq!(client.base_url(), "http://localhost:8000/api");
        assert_eq!(client.url("/health"), "http://localhost:8000/api/health");
        assert_eq!(client.url("weather/analyze"), "http://localhost:8000/api/weather/analyze");
    }

    #[test]
    fn test_error_message_prefers_detail() {
        assert_eq!(
            error_message(r#"{"detail": "Date range exceeds 30 days"}"#, "Bad Request"),
            "Date range exceeds 30 days"
        );
        assert_eq!(
            error_message(
                r#"{"detail": [{"loc": ["lat"], "msg": "field required"}]}"#,
                "Unprocessable Entity"
            ),
            r#"[{"loc":["lat"],"msg":"field required"}]"#
        );
        assert_eq!(error_message("upstream exploded", "Bad Gateway"), "upstream exploded");
        assert_eq!(error_message("", "Bad Gateway"), "Bad Gateway");
    }

    #[tokio::test]
    async fn test_unreachable_backend_is_network_error() {
        let client =
            WeatherApiClient::new("http://127.0.0.1:9", Duration::from_millis(200)).unwrap();
        let err = client.health().await.unwrap_err();
        assert!(err.is_transient(), "unexpected error: {err:?}");
    }
}
