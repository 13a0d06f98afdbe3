//! E-commerce REST API host.
//!
//! # Architecture Overview
//!
//! ```text
//!     application.toml ─┐
//!     ECOMMERCE__* env ─┼─▶ config ──▶ context ──────────────────────┐
//!     --set key=value ──┘              │ config                      │
//!                                      │ clock                       │
//!                                      │ auditor ◀── x-auditor header│
//!                                      │ auditing_hook               │
//!                                      │ persistence                 │
//!                                      ▼                             │
//!     Client ──▶ net listener ──▶ http server ──▶ /health, /info     │
//!                                                                    │
//!     SIGINT/SIGTERM ──▶ shutdown ──▶ drain ──▶ close context ◀──────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use ecommerce_api::config::{AppConfig, ConfigLoader, ObservabilityConfig};
use ecommerce_api::lifecycle::signals::forward_signals;
use ecommerce_api::lifecycle::Host;
use ecommerce_api::observability::logging::init_logging;

#[derive(Parser, Debug)]
#[command(name = "ecommerce-api")]
#[command(about = "E-commerce REST API host", long_about = None)]
struct Cli {
    /// Configuration file (defaults to ./application.toml when present)
    #[arg(short, long, env = "ECOMMERCE_CONFIG")]
    config: Option<PathBuf>,

    /// Override a setting, e.g. `--set server.bind_address=0.0.0.0:9000`
    #[arg(long = "set", value_name = "KEY=VALUE")]
    overrides: Vec<String>,
}

fn load(cli: &Cli) -> Result<AppConfig, ecommerce_api::config::ConfigError> {
    let mut loader = ConfigLoader::new().discover(true).env_vars(std::env::vars());
    if let Some(path) = &cli.config {
        loader = loader.file(path);
    }
    loader.overrides(&cli.overrides)?.load()
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let config = match load(&cli) {
        Ok(config) => config,
        Err(e) => {
            let _ = init_logging(&ObservabilityConfig::default());
            tracing::error!(error = %e, "Failed to load configuration");
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&config.observability) {
        eprintln!("failed to initialize logging: {e}");
        return ExitCode::FAILURE;
    }

    tracing::info!(
        application = %config.application.name,
        version = env!("CARGO_PKG_VERSION"),
        bind_address = %config.server.bind_address,
        "Configuration loaded"
    );

    let mut host = Host::new(config);
    tokio::spawn(forward_signals(host.shutdown_handle()));

    let mut running = match host.start().await {
        Ok(running) => running,
        Err(e) => {
            tracing::error!(error = %e, "Application failed to start");
            return ExitCode::FAILURE;
        }
    };

    match running.wait().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Application stopped with an error");
            ExitCode::FAILURE
        }
    }
}
