//! E-commerce REST API host library.
//!
//! Boots the application: loads configuration, wires the application
//! context (clock, auditor, auditing hook, persistence), and serves the
//! operational HTTP endpoints until shutdown.

pub mod audit;
pub mod config;
pub mod context;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;
pub mod persistence;

pub use config::AppConfig;
pub use context::{ApplicationContext, Registration};
pub use http::{AppState, HttpServer};
pub use lifecycle::{Host, HostState, RunningHost, Shutdown, StartupError};
