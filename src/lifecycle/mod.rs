//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     NotStarted → Starting
//!     Validate → Metrics → Compose context → TLS → Bind → Serve
//!     → Running        (or Stopped on the first failure)
//!
//! Shutdown (shutdown.rs):
//!     Trigger → ShuttingDown → Stop accepting → Drain → Close context → Stopped
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: config first, then context, then listeners
//! - Ordered shutdown: stop accept, drain, close
//! - Shutdown has timeout: the server is aborted after the deadline
//! - State is observable through a watch channel (state.rs)

pub mod shutdown;
pub mod signals;
pub mod startup;
pub mod state;

pub use shutdown::Shutdown;
pub use startup::{Host, HostBuilder, HostError, RunningHost, StartupError};
pub use state::{HostState, InvalidTransition, Lifecycle};
