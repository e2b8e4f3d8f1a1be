//! Error types and handling for the `StarrySpot` recommendation flow

use std::fmt;

use thiserror::Error;

/// Message shown to end users for any failed recommendation.
pub const RECOMMENDATION_FAILED: &str = "Could not fetch a recommendation at this time.";

/// Which side of the flow a schema violation was detected on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaBoundary {
    /// The caller's request
    Input,
    /// The object produced by the inference engine
    Output,
}

impl fmt::Display for SchemaBoundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaBoundary::Input => f.write_str("input"),
            SchemaBoundary::Output => f.write_str("output"),
        }
    }
}

/// Main error type for the `StarrySpot` application
#[derive(Error, Debug)]
pub enum StarrySpotError {
    /// A request or a generated result does not conform to its declared shape
    #[error("Schema validation failed for {boundary}: {message}")]
    SchemaValidation {
        boundary: SchemaBoundary,
        message: String,
    },

    /// A data lookup failed or returned unusable data
    #[error("Service error ({service}): {message}")]
    Service {
        service: &'static str,
        message: String,
    },

    /// The inference engine could not produce a schema-conformant answer
    #[error("Inference error: {message}")]
    Inference { message: String },

    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },
}

impl StarrySpotError {
    /// Create a schema error for the caller's request
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::SchemaValidation {
            boundary: SchemaBoundary::Input,
            message: message.into(),
        }
    }

    /// Create a schema error for a generated result
    pub fn invalid_output<S: Into<String>>(message: S) -> Self {
        Self::SchemaValidation {
            boundary: SchemaBoundary::Output,
            message: message.into(),
        }
    }

    /// Create a new service error for the named lookup
    pub fn service<S: Into<String>>(service: &'static str, message: S) -> Self {
        Self::Service {
            service,
            message: message.into(),
        }
    }

    /// Create a new inference error
    pub fn inference<S: Into<String>>(message: S) -> Self {
        Self::Inference {
            message: message.into(),
        }
    }

    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Stable identifier of the error kind, used in logs and API responses
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            StarrySpotError::SchemaValidation { .. } => "schema_validation",
            StarrySpotError::Service { .. } => "service",
            StarrySpotError::Inference { .. } => "inference",
            StarrySpotError::Config { .. } => "config",
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            StarrySpotError::SchemaValidation {
                boundary: SchemaBoundary::Input,
                message,
            } => format!("Invalid location: {message}"),
            StarrySpotError::SchemaValidation { .. }
            | StarrySpotError::Service { .. }
            | StarrySpotError::Inference { .. } => RECOMMENDATION_FAILED.to_string(),
            StarrySpotError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let input_err = StarrySpotError::invalid_input("latitude out of range");
        assert!(matches!(
            input_err,
            StarrySpotError::SchemaValidation {
                boundary: SchemaBoundary::Input,
                ..
            }
        ));

        let service_err = StarrySpotError::service("weather", "connection refused");
        assert!(matches!(service_err, StarrySpotError::Service { service: "weather", .. }));

        let inference_err = StarrySpotError::inference("empty generation");
        assert!(matches!(inference_err, StarrySpotError::Inference { .. }));
    }

    #[test]
    fn test_kinds_are_distinguishable() {
        assert_eq!(StarrySpotError::invalid_output("x").kind(), "schema_validation");
        assert_eq!(StarrySpotError::service("weather", "x").kind(), "service");
        assert_eq!(StarrySpotError::inference("x").kind(), "inference");
        assert_eq!(StarrySpotError::config("x").kind(), "config");
    }

    #[test]
    fn test_user_messages() {
        let input_err = StarrySpotError::invalid_input("latitude 91 is outside [-90, 90]");
        assert!(input_err.user_message().contains("latitude 91"));

        for err in [
            StarrySpotError::invalid_output("empty reason"),
            StarrySpotError::service("light pollution", "timeout"),
            StarrySpotError::inference("provider outage"),
        ] {
            assert_eq!(err.user_message(), RECOMMENDATION_FAILED);
        }
    }

    #[test]
    fn test_display_includes_boundary_and_service() {
        let err = StarrySpotError::invalid_output("reason must not be empty");
        assert_eq!(
            err.to_string(),
            "Schema validation failed for output: reason must not be empty"
        );

        let err = StarrySpotError::service("weather", "HTTP 503");
        assert_eq!(err.to_string(), "Service error (weather): HTTP 503");
    }
}
