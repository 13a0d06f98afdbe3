//! OS signal handling.
//!
//! # Responsibilities
//! - Register signal handlers (SIGTERM, SIGINT)
//! - Translate signals into a shutdown request
//!
//! # Design Decisions
//! - Uses Tokio's signal handling (async-safe)
//! - Repeated signals are no-ops; the drain deadline bounds shutdown instead

use std::fmt;

use crate::lifecycle::shutdown::Shutdown;

/// Signal that asked the process to stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    Interrupt,
    Terminate,
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Signal::Interrupt => f.write_str("SIGINT"),
            Signal::Terminate => f.write_str("SIGTERM"),
        }
    }
}

/// Wait for SIGINT (Ctrl+C) or, on unix, SIGTERM.
pub async fn wait_for_signal() -> std::io::Result<Signal> {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};

        let mut terminate = signal(SignalKind::terminate())?;
        tokio::select! {
            result = tokio::signal::ctrl_c() => result.map(|_| Signal::Interrupt),
            _ = terminate.recv() => Ok(Signal::Terminate),
        }
    }

    #[cfg(not(unix))]
    {
        tokio::signal::ctrl_c().await.map(|_| Signal::Interrupt)
    }
}

/// Forward every received signal to `shutdown` until the process exits.
///
/// The first signal starts graceful shutdown; later ones hit the idempotent
/// trigger and are only logged.
pub async fn forward_signals(shutdown: Shutdown) {
    loop {
        match wait_for_signal().await {
            Ok(signal) => {
                tracing::info!(%signal, "Signal received");
                shutdown.trigger();
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install signal handler");
                return;
            }
        }
    }
}
