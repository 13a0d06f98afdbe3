//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the host.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the application host.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Application identity.
    pub application: ApplicationConfig,

    /// HTTP listener settings.
    pub server: ServerConfig,

    /// Entity auditing settings.
    pub auditing: AuditingConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Application identity.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Name reported in logs and by `/info`. Required.
    pub name: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            name: "ecommerce-rest-api".to_string(),
        }
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum request body size in bytes.
    pub max_body_size: usize,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,

    /// Deadline for draining in-flight requests on shutdown, in seconds.
    pub shutdown_timeout_secs: u64,

    /// Optional TLS configuration.
    pub tls: Option<TlsConfig>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_body_size: 2 * 1024 * 1024, // 2MB
            request_timeout_secs: 30,
            shutdown_timeout_secs: 30,
            tls: None,
        }
    }
}

/// TLS configuration for the listener.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TlsConfig {
    /// Path to certificate file (PEM).
    pub cert_path: String,

    /// Path to private key file (PEM).
    pub key_path: String,
}

/// Auditing configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct AuditingConfig {
    /// Register the auditing hook. When false, entities are persisted untouched.
    pub enabled: bool,

    /// Stamp created/modified timestamps.
    pub set_dates: bool,

    /// Fill the last-modified fields on create as well.
    pub modify_on_create: bool,

    /// Actor recorded when no request-scoped actor is present.
    pub default_actor: Option<String>,

    /// Request header carrying the acting user.
    pub actor_header: String,
}

impl Default for AuditingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            set_dates: true,
            modify_on_create: true,
            default_actor: None,
            actor_header: "x-auditor".to_string(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output for development.
    #[default]
    Pretty,
    /// One JSON object per line for log aggregation.
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimal_toml_uses_defaults() {
        let config: AppConfig = toml::from_str("").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.server.bind_address, "0.0.0.0:8080");
        assert!(config.auditing.enabled);
        assert!(config.server.tls.is_none());
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [server]
            bind_address = "127.0.0.1:9000"

            [observability]
            log_format = "json"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.bind_address, "127.0.0.1:9000");
        assert_eq!(config.server.request_timeout_secs, 30);
        assert_eq!(config.observability.log_format, LogFormat::Json);
        assert_eq!(config.observability.log_level, "info");
    }

    #[test]
    fn unknown_log_format_is_rejected() {
        let result: Result<AppConfig, _> = toml::from_str(
            r#"
            [observability]
            log_format = "xml"
            "#,
        );
        assert!(result.is_err());
    }
}
