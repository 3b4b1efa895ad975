//! Collaborator contracts. The workflow only talks to these traits, so tests
//! swap in in-memory implementations.

use crate::analysis::{AnalysisRequest, AnalysisResult};
use crate::error::Result;
use crate::location::LocationResult;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Runs an exceedance analysis.
#[async_trait]
pub trait AnalysisService: Send + Sync {
    async fn analyze(&self, request: &AnalysisRequest) -> Result<AnalysisResult>;
}

/// Text search and reverse lookup of places.
#[async_trait]
pub trait GeocodingService: Send + Sync {
    /// Most relevant first.
    async fn search(&self, query: &str) -> Result<Vec<LocationResult>>;

    async fn reverse_geocode(&self, lat: f64, lon: f64) -> Result<String>;
}

/// Backend connectivity as reported by its health endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthStatus {
    pub status: String,
    #[serde(default)]
    pub service: Option<String>,
}

impl HealthStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self.status.to_lowercase().as_str(), "healthy" | "ok")
    }
}

#[async_trait]
pub trait HealthService: Send + Sync {
    async fn health(&self) -> Result<HealthStatus>;
}

#[cfg(test)]
mod tests {
    use super::HealthStatus;

    #[test]
    fn test_health_status() {
        let body = r#"{"status": "healthy", "service": "NASA Weather Intelligence API"}"#;
        let healthy: HealthStatus = serde_json::from_str(body).unwrap();
        assert!(healthy.is_ok());
        let degraded: HealthStatus = serde_json::from_str(r#"{"status": "degraded"}"#).unwrap();
        assert!(!degraded.is_ok());
    }
}
