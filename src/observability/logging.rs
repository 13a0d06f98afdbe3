//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the tracing subscriber once per process
//! - Pick pretty or JSON output from configuration
//! - Log level from `RUST_LOG`, falling back to configuration

use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::schema::{LogFormat, ObservabilityConfig};

/// Error type for logging initialization.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter: {0}")]
    Filter(#[from] tracing_subscriber::filter::ParseError),

    #[error("a global subscriber is already installed")]
    AlreadyInitialized(#[from] tracing_subscriber::util::TryInitError),
}

/// Build the filter: `RUST_LOG` wins, otherwise the configured level for this
/// crate plus `tower_http`.
pub fn build_filter(config: &ObservabilityConfig) -> Result<EnvFilter, LoggingError> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => {
            let directives = format!(
                "{level},ecommerce_api={level},tower_http={level}",
                level = config.log_level
            );
            Ok(EnvFilter::try_new(directives)?)
        }
    }
}

/// Install the global tracing subscriber.
pub fn init_logging(config: &ObservabilityConfig) -> Result<(), LoggingError> {
    let filter = build_filter(config)?;
    let registry = tracing_subscriber::registry().with(filter);

    match config.log_format {
        LogFormat::Pretty => registry.with(tracing_subscriber::fmt::layer()).try_init()?,
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_current_span(true))
            .try_init()?,
    }

    Ok(())
}
