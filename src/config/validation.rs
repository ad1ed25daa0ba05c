//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (buffer size > 0, status codes valid)
//! - Check addresses the process will bind
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServerConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system
//! - Responses files are checked separately when the rule set is compiled

use std::net::SocketAddr;

use crate::config::schema::ServerConfig;

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// A single semantic problem in the server configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.bind_address must not be empty")]
    EmptyBindAddress,

    #[error("listener.tls_names must not be empty when TLS is enabled")]
    NoTlsNames,

    #[error("capture.buffer_size must be at least 1")]
    ZeroBufferSize,

    #[error("capture.max_body_bytes must be at least 1 when set")]
    ZeroBodyLimit,

    #[error("response.status {0} is not a valid HTTP status")]
    InvalidStatus(u16),

    #[error("log.level '{0}' is not one of trace, debug, info, warn, error")]
    InvalidLogLevel(String),

    #[error("metrics.address '{0}' is not a socket address")]
    InvalidMetricsAddress(String),
}

/// Check `config` and report every problem found.
pub fn validate_config(config: &ServerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.trim().is_empty() {
        errors.push(ValidationError::EmptyBindAddress);
    }
    if config.listener.tls_self_signed && config.listener.tls_names.is_empty() {
        errors.push(ValidationError::NoTlsNames);
    }

    if config.capture.buffer_size == 0 {
        errors.push(ValidationError::ZeroBufferSize);
    }
    if config.capture.max_body_bytes == Some(0) {
        errors.push(ValidationError::ZeroBodyLimit);
    }

    let status = config.response.status;
    if status != 0 && !(100..=999).contains(&status) {
        errors.push(ValidationError::InvalidStatus(status));
    }

    if !LOG_LEVELS
        .iter()
        .any(|level| level.eq_ignore_ascii_case(&config.log.level))
    {
        errors.push(ValidationError::InvalidLogLevel(config.log.level.clone()));
    }

    if config.metrics.enabled && config.metrics.address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidMetricsAddress(config.metrics.address.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
