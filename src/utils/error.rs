use thiserror::Error;

#[derive(Error, Debug)]
pub enum WeatherError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid URL: {0}")]
    UrlError(#[from] url::ParseError),

    #[error("{service} responded with unexpected status {status}")]
    UpstreamStatusError { service: &'static str, status: u16 },

    #[error("Telemetry error: {message}")]
    TelemetryError { message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// A provider or the downstream service failed or answered garbage.
    Upstream,
    Configuration,
    Internal,
}

impl WeatherError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            WeatherError::HttpError(_)
            | WeatherError::SerializationError(_)
            | WeatherError::UpstreamStatusError { .. } => ErrorCategory::Upstream,
            WeatherError::ConfigError { .. }
            | WeatherError::MissingConfigError { .. }
            | WeatherError::InvalidConfigValueError { .. }
            | WeatherError::UrlError(_) => ErrorCategory::Configuration,
            WeatherError::IoError(_) | WeatherError::TelemetryError { .. } => {
                ErrorCategory::Internal
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, WeatherError>;
