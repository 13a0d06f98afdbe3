//! HTTP surface.
//!
//! # Data Flow
//! ```text
//! TcpListener (net)
//!     → request ID → trace span → timeout → body limit
//!     → request metrics → actor scoping
//!     → /health, /info, fallback
//! ```
//!
//! # Design Decisions
//! - Only operational endpoints live here; business routers plug in elsewhere
//! - Request ID added as early as possible for tracing
//! - The acting user is bound to the request task for the auditing hook

pub mod handlers;
pub mod middleware;
pub mod server;

pub use server::{AppState, AppStateError, HttpServer};
