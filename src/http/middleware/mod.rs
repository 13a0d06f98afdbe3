//! Request middleware.

pub mod auditor;
pub mod metrics;

pub use auditor::scope_request_actor;
pub use metrics::track_requests;
