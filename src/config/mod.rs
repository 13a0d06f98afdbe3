//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults (schema.rs)
//!     → application.toml or --config file
//!     → ECOMMERCE__SECTION__KEY environment variables
//!     → --set key=value overrides
//!     → loader.rs (merge & deserialize)
//!     → validation.rs (semantic checks)
//!     → AppConfig (validated, immutable)
//!     → registered as the `config` component
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError, ConfigLoader};
pub use schema::{
    AppConfig, ApplicationConfig, AuditingConfig, LogFormat, ObservabilityConfig, ServerConfig,
    TlsConfig,
};
pub use validation::{validate_config, ValidationError};
