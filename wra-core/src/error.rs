use thiserror::Error;

pub type Result<T> = std::result::Result<T, WeatherError>;

/// Errors surfaced by the model, the unit converter and the HTTP collaborators.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum WeatherError {
    #[error("{0}")]
    Validation(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Unsupported conversion from {from} to {to}")]
    UnsupportedConversion { from: String, to: String },
}

impl WeatherError {
    /// Whether a retry could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            WeatherError::Network(_) | WeatherError::Timeout(_) => true,
            WeatherError::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

#[cfg(feature = "api")]
impl From<reqwest::Error> for WeatherError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            WeatherError::Timeout(err.to_string())
        } else if err.is_decode() {
            WeatherError::Parse(err.to_string())
        } else {
            WeatherError::Network(err.to_string())
        }
    }
}

impl From<serde_json::Error> for WeatherError {
    fn from(err: serde_json::Error) -> Self {
        WeatherError::Parse(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::WeatherError;

    #[test]
    fn test_transient_classification() {
        assert!(WeatherError::Network("reset".into()).is_transient());
        assert!(WeatherError::Timeout("10s".into()).is_transient());
        assert!(WeatherError::Api { status: 503, message: "busy".into() }.is_transient());
        assert!(!WeatherError::Api { status: 422, message: "bad".into() }.is_transient());
        assert!(!WeatherError::Validation("x".into()).is_transient());
    }

    #[test]
    fn test_display_carries_detail() {
        let err = WeatherError::Api {
            status: 400,
            message: "Invalid date range".into(),
        };
        assert_eq!(err.to_string(), "API error (status 400): Invalid date range");
    }
}
