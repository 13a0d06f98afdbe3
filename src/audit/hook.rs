//! Auditing hook invoked by the persistence layer.

use std::fmt::Debug;
use std::sync::Arc;

use crate::audit::auditor::AuditorAware;
use crate::audit::clock::Clock;
use crate::audit::metadata::AuditMetadata;
use crate::config::schema::AuditingConfig;
use crate::observability::metrics;

/// Extension points the persistence layer calls before writing an entity.
pub trait AuditingHook: Debug + Send + Sync {
    /// Called once, before a new entity is stored.
    fn before_create(&self, audit: &mut AuditMetadata);

    /// Called before an existing entity is overwritten.
    fn before_update(&self, audit: &mut AuditMetadata);
}

/// Hook used when auditing is disabled.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopAuditingHook;

impl AuditingHook for NoopAuditingHook {
    fn before_create(&self, _audit: &mut AuditMetadata) {}

    fn before_update(&self, _audit: &mut AuditMetadata) {}
}

/// Stamps timestamps from a [`Clock`] and actors from an [`AuditorAware`].
#[derive(Debug, Clone)]
pub struct AuditingHandler {
    clock: Arc<dyn Clock>,
    auditor: Arc<dyn AuditorAware>,
    set_dates: bool,
    modify_on_create: bool,
}

impl AuditingHandler {
    pub fn new(clock: Arc<dyn Clock>, auditor: Arc<dyn AuditorAware>) -> Self {
        Self {
            clock,
            auditor,
            set_dates: true,
            modify_on_create: true,
        }
    }

    /// Build a handler honoring the `[auditing]` switches.
    pub fn from_config(
        config: &AuditingConfig,
        clock: Arc<dyn Clock>,
        auditor: Arc<dyn AuditorAware>,
    ) -> Self {
        Self::new(clock, auditor)
            .set_dates(config.set_dates)
            .modify_on_create(config.modify_on_create)
    }

    pub fn set_dates(mut self, enabled: bool) -> Self {
        self.set_dates = enabled;
        self
    }

    pub fn modify_on_create(mut self, enabled: bool) -> Self {
        self.modify_on_create = enabled;
        self
    }
}

impl AuditingHook for AuditingHandler {
    fn before_create(&self, audit: &mut AuditMetadata) {
        let now = self.set_dates.then(|| self.clock.now());
        let actor = self.auditor.current_auditor();

        if let Some(now) = now {
            audit.created_at = Some(now);
        }
        if let Some(actor) = &actor {
            audit.created_by = Some(actor.clone());
        }

        if self.modify_on_create {
            if let Some(now) = now {
                audit.last_modified_at = Some(now);
            }
            if let Some(actor) = actor {
                audit.last_modified_by = Some(actor);
            }
        }

        metrics::record_audit_stamp("create");
    }

    fn before_update(&self, audit: &mut AuditMetadata) {
        if self.set_dates {
            audit.last_modified_at = Some(self.clock.now());
        }
        if let Some(actor) = self.auditor.current_auditor() {
            audit.last_modified_by = Some(actor);
        }

        metrics::record_audit_stamp("update");
    }
}
