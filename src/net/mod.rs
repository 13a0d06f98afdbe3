//! Network layer.
//!
//! # Data Flow
//! ```text
//! server.bind_address
//!     → listener.rs (parse, bind TcpListener)
//!     → tls.rs (optional: load and check PEM material)
//!     → handed to http::server for serving
//! ```
//!
//! # Design Decisions
//! - Binding happens last during startup so traffic arrives only when wired
//! - Bad certificates fail startup instead of the first handshake

pub mod listener;
pub mod tls;
