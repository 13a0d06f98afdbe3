//! Audit fields carried by persisted entities.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Creation and modification stamps.
///
/// Every field starts empty; the auditing hook fills them in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditMetadata {
    pub created_at: Option<DateTime<Utc>>,
    pub created_by: Option<String>,
    pub last_modified_at: Option<DateTime<Utc>>,
    pub last_modified_by: Option<String>,
}

impl AuditMetadata {
    /// Whether the creation stamp was applied.
    pub fn is_created(&self) -> bool {
        self.created_at.is_some() || self.created_by.is_some()
    }

    /// Copy the creation fields from `stored`, discarding whatever the caller sent.
    pub fn keep_creation_from(&mut self, stored: &AuditMetadata) {
        self.created_at = stored.created_at;
        self.created_by = stored.created_by.clone();
    }
}

/// An entity that carries [`AuditMetadata`].
pub trait Auditable {
    fn audit(&self) -> &AuditMetadata;
    fn audit_mut(&mut self) -> &mut AuditMetadata;
}

impl Auditable for AuditMetadata {
    fn audit(&self) -> &AuditMetadata {
        self
    }

    fn audit_mut(&mut self) -> &mut AuditMetadata {
        self
    }
}
