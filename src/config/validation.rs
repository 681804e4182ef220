//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, ports valid, buffer bounded)
//! - Check that the cache directory is absolute
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RelayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;
use std::path::Path;

use crate::config::schema::RelayConfig;

/// Upper bound on the backend read buffer.
pub const MAX_RESPONSE_BUFFER_BYTES: usize = 1024 * 1024;

/// A single semantic problem with a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("backend.host must not be empty")]
    EmptyBackendHost,

    #[error("backend.port must not be 0")]
    ZeroBackendPort,

    #[error("cache.directory_path must be absolute, got '{0}'")]
    RelativeCacheDirectory(String),

    #[error("cache.public_url_prefix must not be empty")]
    EmptyPublicPrefix,

    #[error("limits.response_buffer_bytes must be between 1 and {max}, got {got}")]
    ResponseBufferOutOfRange { got: usize, max: usize },

    #[error("timeouts.{0} must be greater than 0")]
    ZeroTimeout(&'static str),

    #[error("{field} is not a socket address: '{value}'")]
    BadAddress { field: &'static str, value: String },
}

/// Check a parsed configuration for semantic errors.
pub fn validate_config(config: &RelayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.backend.host.trim().is_empty() {
        errors.push(ValidationError::EmptyBackendHost);
    }
    if config.backend.port == 0 {
        errors.push(ValidationError::ZeroBackendPort);
    }

    if !Path::new(&config.cache.directory_path).is_absolute() {
        errors.push(ValidationError::RelativeCacheDirectory(
            config.cache.directory_path.clone(),
        ));
    }
    if config.cache.public_url_prefix.trim_matches('/').is_empty() {
        errors.push(ValidationError::EmptyPublicPrefix);
    }

    let buffer = config.limits.response_buffer_bytes;
    if buffer == 0 || buffer > MAX_RESPONSE_BUFFER_BYTES {
        errors.push(ValidationError::ResponseBufferOutOfRange {
            got: buffer,
            max: MAX_RESPONSE_BUFFER_BYTES,
        });
    }

    if config.timeouts.connect_ms == 0 {
        errors.push(ValidationError::ZeroTimeout("connect_ms"));
    }
    if config.timeouts.read_ms == 0 {
        errors.push(ValidationError::ZeroTimeout("read_ms"));
    }
    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroTimeout("request_secs"));
    }

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::BadAddress {
            field: "listener.bind_address",
            value: config.listener.bind_address.clone(),
        });
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::BadAddress {
            field: "observability.metrics_address",
            value: config.observability.metrics_address.clone(),
        });
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(validate_config(&RelayConfig::default()), Ok(()));
    }

    #[test]
    fn collects_every_error() {
        let mut config = RelayConfig::default();
        config.backend.host = " ".into();
        config.backend.port = 0;
        config.cache.directory_path = "cache".into();
        config.cache.public_url_prefix = "/".into();
        config.limits.response_buffer_bytes = 0;
        config.timeouts.read_ms = 0;

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(
            errors,
            vec![
                ValidationError::EmptyBackendHost,
                ValidationError::ZeroBackendPort,
                ValidationError::RelativeCacheDirectory("cache".into()),
                ValidationError::EmptyPublicPrefix,
                ValidationError::ResponseBufferOutOfRange {
                    got: 0,
                    max: MAX_RESPONSE_BUFFER_BYTES
                },
                ValidationError::ZeroTimeout("read_ms"),
            ]
        );
    }

    #[test]
    fn metrics_address_only_checked_when_enabled() {
        let mut config = RelayConfig::default();
        config.observability.metrics_address = "nope".into();
        assert!(validate_config(&config).is_ok());

        config.observability.metrics_enabled = true;
        let errors = validate_config(&config).unwrap_err();
        assert!(matches!(
            errors.as_slice(),
            [ValidationError::BadAddress { field: "observability.metrics_address", .. }]
        ));
    }
}
