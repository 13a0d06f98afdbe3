//! Configuration loading from disk, environment and command line.
//!
//! Sources are layered, later ones winning:
//! built-in defaults → TOML file → `ECOMMERCE__*` environment → `--set` overrides.
//!
//! Every source feeds a [`::config::Config`] builder; values stay untyped until
//! they are deserialized into [`AppConfig`], so a string setting accepts `2024`.

use std::path::{Path, PathBuf};

use ::config::{Config, Environment, File, FileFormat, Map};
use thiserror::Error;

use crate::config::schema::AppConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Prefix of environment variables that override configuration keys.
///
/// `ECOMMERCE__SERVER__BIND_ADDRESS=127.0.0.1:9000` sets `server.bind_address`.
pub const ENV_PREFIX: &str = "ECOMMERCE";

/// Separator between the prefix and each nested key segment.
pub const ENV_SEPARATOR: &str = "__";

/// File picked up from the working directory when no path is given.
pub const DEFAULT_CONFIG_FILE: &str = "application.toml";

/// Error type for configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Source(#[from] ::config::ConfigError),

    #[error("invalid override `{0}`, expected key.path=value")]
    Override(String),

    #[error("validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<AppConfig, ConfigError> {
    ConfigLoader::new().file(path).load()
}

/// Layered configuration loader.
#[derive(Debug, Default, Clone)]
pub struct ConfigLoader {
    path: Option<PathBuf>,
    discover: bool,
    env: Option<Map<String, String>>,
    overrides: Vec<(String, String)>,
}

impl ConfigLoader {
    /// Create a loader that only yields defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read this file. A missing file is an error.
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Fall back to `application.toml` in the working directory when it exists
    /// and no explicit file was given.
    pub fn discover(mut self, discover: bool) -> Self {
        self.discover = discover;
        self
    }

    /// Read `ECOMMERCE__SECTION__KEY` variables from the given iterator,
    /// typically `std::env::vars()`.
    pub fn env_vars<I, K, V>(mut self, vars: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let env = self.env.get_or_insert_with(Map::new);
        env.extend(vars.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Apply `key.path=value` overrides, typically from the command line.
    pub fn overrides<I, S>(mut self, entries: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for entry in entries {
            let entry = entry.as_ref();
            let (key, value) = entry
                .split_once('=')
                .map(|(key, value)| (key.trim(), value))
                .filter(|(key, _)| !key.is_empty() && key.split('.').all(|s| !s.is_empty()))
                .ok_or_else(|| ConfigError::Override(entry.to_string()))?;
            self.overrides.push((key.to_string(), value.to_string()));
        }
        Ok(self)
    }

    /// Resolve all sources into a validated configuration.
    pub fn load(self) -> Result<AppConfig, ConfigError> {
        let mut builder = Config::builder();

        if let Some(path) = &self.path {
            tracing::debug!(path = %path.display(), "Reading configuration file");
            builder = builder.add_source(
                File::from(path.as_path())
                    .format(FileFormat::Toml)
                    .required(true),
            );
        } else if self.discover {
            builder = builder.add_source(
                File::from(Path::new(DEFAULT_CONFIG_FILE))
                    .format(FileFormat::Toml)
                    .required(false),
            );
        }

        if let Some(env) = self.env {
            builder = builder.add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator(ENV_SEPARATOR)
                    .separator(ENV_SEPARATOR)
                    .source(Some(env)),
            );
        }

        for (key, value) in self.overrides {
            builder = builder.set_override(key, value)?;
        }

        let config: AppConfig = builder.build()?.try_deserialize()?;
        validate_config(&config).map_err(ConfigError::Validation)?;

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_file() {
        let file = write_config(
            r#"
            [application]
            name = "shop"

            [server]
            bind_address = "127.0.0.1:9000"
            "#,
        );

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.application.name, "shop");
        assert_eq!(config.server.bind_address, "127.0.0.1:9000");
    }

    #[test]
    fn missing_explicit_file_is_an_error() {
        let result = load_config(Path::new("/definitely/not/here.toml"));
        assert!(matches!(result, Err(ConfigError::Source(_))));
    }

    #[test]
    fn malformed_file_is_an_error() {
        let file = write_config("[server\nbind_address = ");
        assert!(matches!(load_config(file.path()), Err(ConfigError::Source(_))));
    }

    #[test]
    fn no_sources_yields_defaults() {
        let config = ConfigLoader::new().load().unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn env_overrides_file_and_cli_overrides_env() {
        let file = write_config(
            r#"
            [server]
            bind_address = "127.0.0.1:9000"
            request_timeout_secs = 5
            "#,
        );

        let config = ConfigLoader::new()
            .file(file.path())
            .env_vars([
                ("ECOMMERCE__SERVER__BIND_ADDRESS", "127.0.0.1:9100"),
                ("ECOMMERCE__AUDITING__ENABLED", "false"),
                ("UNRELATED", "ignored"),
            ])
            .overrides(["server.bind_address=127.0.0.1:9200"])
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.server.bind_address, "127.0.0.1:9200");
        assert_eq!(config.server.request_timeout_secs, 5);
        assert!(!config.auditing.enabled);
    }

    #[test]
    fn numeric_and_boolean_text_stays_a_string() {
        let config = ConfigLoader::new()
            .env_vars([("ECOMMERCE__AUDITING__DEFAULT_ACTOR", "true")])
            .overrides(["application.name=2024"])
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.application.name, "2024");
        assert_eq!(config.auditing.default_actor.as_deref(), Some("true"));
    }

    #[test]
    fn text_overrides_reach_typed_fields() {
        let config = ConfigLoader::new()
            .overrides(["server.request_timeout_secs=7", "observability.metrics_enabled=false"])
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.server.request_timeout_secs, 7);
        assert!(!config.observability.metrics_enabled);
    }

    #[test]
    fn override_creates_missing_sections() {
        let config = ConfigLoader::new()
            .overrides([
                "auditing.default_actor=system",
                "server.tls.cert_path=c.pem",
                "server.tls.key_path=k.pem",
            ])
            .unwrap()
            .load()
            .unwrap();

        assert_eq!(config.auditing.default_actor.as_deref(), Some("system"));
        assert_eq!(config.server.tls.unwrap().key_path, "k.pem");
    }

    #[test]
    fn malformed_override_rejected() {
        for entry in ["server.bind_address", "=value", "server..bind_address=x"] {
            let result = ConfigLoader::new().overrides([entry]);
            assert!(matches!(result, Err(ConfigError::Override(_))), "{entry}");
        }
    }

    #[test]
    fn validation_failures_surface() {
        let result = ConfigLoader::new()
            .overrides(["server.bind_address=nowhere"])
            .unwrap()
            .load();

        match result {
            Err(ConfigError::Validation(errors)) => assert_eq!(errors.len(), 1),
            other => panic!("expected validation error, got {:?}", other),
        }
    }
}
