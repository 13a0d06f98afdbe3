//! Entity auditing subsystem.
//!
//! # Data Flow
//! ```text
//! Persistence write path:
//!     repository.insert(entity)
//!     → AuditingHook::before_create(&mut entity.audit)
//!         → Clock::now()              (created_at / last_modified_at)
//!         → AuditorAware::current()   (created_by / last_modified_by)
//!
//!     repository.update(entity)
//!     → AuditingHook::before_update(&mut entity.audit)
//! ```
//!
//! # Design Decisions
//! - The hook is an explicit trait object registered once in the context
//! - Repositories call it at fixed extension points, never per write-path
//! - Actor resolution is pluggable (fixed, request-scoped)

pub mod auditor;
pub mod clock;
pub mod hook;
pub mod metadata;

pub use auditor::{AuditorAware, FixedAuditor, RequestScopedAuditor};
pub use clock::{Clock, FixedClock, SystemClock};
pub use hook::{AuditingHandler, AuditingHook, NoopAuditingHook};
pub use metadata::{Auditable, AuditMetadata};
