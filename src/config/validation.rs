//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that required values are present
//! - Validate value ranges (timeouts > 0, addresses parse)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: AppConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderName;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use crate::config::schema::AppConfig;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// A required value is absent or empty.
    #[error("{0} is required")]
    Missing(&'static str),

    /// A value is present but unusable.
    #[error("{field} is invalid: {reason}")]
    Invalid {
        field: &'static str,
        reason: String,
    },
}

impl ValidationError {
    fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            field,
            reason: reason.into(),
        }
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &AppConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.application.name.trim().is_empty() {
        errors.push(ValidationError::Missing("application.name"));
    }

    let server = &config.server;
    if server.bind_address.trim().is_empty() {
        errors.push(ValidationError::Missing("server.bind_address"));
    } else if let Err(e) = server.bind_address.parse::<SocketAddr>() {
        errors.push(ValidationError::invalid("server.bind_address", e.to_string()));
    }
    if server.max_body_size == 0 {
        errors.push(ValidationError::invalid("server.max_body_size", "must be greater than 0"));
    }
    if server.request_timeout_secs == 0 {
        errors.push(ValidationError::invalid(
            "server.request_timeout_secs",
            "must be greater than 0",
        ));
    }
    if server.shutdown_timeout_secs == 0 {
        errors.push(ValidationError::invalid(
            "server.shutdown_timeout_secs",
            "must be greater than 0",
        ));
    }
    if let Some(tls) = &server.tls {
        if tls.cert_path.trim().is_empty() {
            errors.push(ValidationError::Missing("server.tls.cert_path"));
        }
        if tls.key_path.trim().is_empty() {
            errors.push(ValidationError::Missing("server.tls.key_path"));
        }
    }

    let auditing = &config.auditing;
    if let Err(e) = auditing.actor_header.parse::<HeaderName>() {
        errors.push(ValidationError::invalid("auditing.actor_header", e.to_string()));
    }
    if matches!(&auditing.default_actor, Some(actor) if actor.trim().is_empty()) {
        errors.push(ValidationError::invalid(
            "auditing.default_actor",
            "must not be blank when set",
        ));
    }

    let observability = &config.observability;
    if let Err(e) = EnvFilter::try_new(&observability.log_level) {
        errors.push(ValidationError::invalid("observability.log_level", e.to_string()));
    }
    if observability.metrics_enabled {
        if let Err(e) = observability.metrics_address.parse::<SocketAddr>() {
            errors.push(ValidationError::invalid(
                "observability.metrics_address",
                e.to_string(),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
