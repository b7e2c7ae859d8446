//! Error types and handling for the launcher pipeline

use serde::Serialize;
use std::fmt;

/// Application error types surfaced by providers and the pipeline
#[derive(Debug, Serialize)]
pub enum AppError {
    InvalidInput(String),
    ProviderFailed(String),
    EnrichmentFailed(String),
    /// Cooperative cancellation of superseded work. Expected during normal
    /// operation and never logged as a failure.
    Cancelled,
    Timeout(String),
    ConfigError(String),
    Internal(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::InvalidInput(msg) => write!(f, "Invalid input: {}", msg),
            AppError::ProviderFailed(msg) => write!(f, "Provider query failed: {}", msg),
            AppError::EnrichmentFailed(msg) => write!(f, "Enrichment failed: {}", msg),
            AppError::Cancelled => write!(f, "Cancelled"),
            AppError::Timeout(msg) => write!(f, "Timeout: {}", msg),
            AppError::ConfigError(msg) => write!(f, "Config error: {}", msg),
            AppError::Internal(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl AppError {
    /// Get the machine-readable error code
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::InvalidInput(_) => "invalid_input",
            AppError::ProviderFailed(_) => "provider_failed",
            AppError::EnrichmentFailed(_) => "enrichment_failed",
            AppError::Cancelled => "cancelled",
            AppError::Timeout(_) => "timeout",
            AppError::ConfigError(_) => "config_error",
            AppError::Internal(_) => "internal_error",
        }
    }

    /// Get the error message
    #[allow(dead_code)]
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Whether this is expected cancellation rather than a real failure
    pub fn is_cancelled(&self) -> bool {
        matches!(self, AppError::Cancelled)
    }
}

/// Convert anyhow::Error to AppError
impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Convert reqwest::Error to AppError
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            AppError::Timeout(err.to_string())
        } else {
            AppError::EnrichmentFailed(err.to_string())
        }
    }
}

/// Convert serde_json::Error to AppError
impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::ProviderFailed(err.to_string())
    }
}

/// Convert std::io::Error to AppError
impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::ProviderFailed(err.to_string())
    }
}
