//! The composition root.
//!
//! Every component the host needs is declared here, by name, in wiring
//! order. Callers may append their own registrations after the built-ins.

use std::sync::Arc;

use crate::audit::{
    AuditingHandler, AuditingHook, AuditorAware, Clock, NoopAuditingHook, RequestScopedAuditor,
    SystemClock,
};
use crate::config::AppConfig;
use crate::context::names;
use crate::context::registry::{ContextBuilder, Registration, WiringError};
use crate::context::ApplicationContext;
use crate::persistence::Persistence;

/// Built-in registrations for `config`.
pub fn default_registrations(config: Arc<AppConfig>) -> ContextBuilder {
    ContextBuilder::new()
        .instance(names::CONFIG, config)
        .instance(names::CLOCK, Arc::new(SystemClock) as Arc<dyn Clock>)
        .register(names::AUDITOR, |r| {
            let config: Arc<AppConfig> = r.require(names::CONFIG)?;
            let auditor = RequestScopedAuditor::new(config.auditing.default_actor.clone());
            Ok(Arc::new(auditor) as Arc<dyn AuditorAware>)
        })
        .register(names::AUDITING_HOOK, |r| {
            let config: Arc<AppConfig> = r.require(names::CONFIG)?;
            if !config.auditing.enabled {
                tracing::warn!("Auditing disabled, entities will not be stamped");
                return Ok(Arc::new(NoopAuditingHook) as Arc<dyn AuditingHook>);
            }

            let clock: Arc<dyn Clock> = r.require(names::CLOCK)?;
            let auditor: Arc<dyn AuditorAware> = r.require(names::AUDITOR)?;
            let handler = AuditingHandler::from_config(&config.auditing, clock, auditor);

            tracing::info!(
                set_dates = config.auditing.set_dates,
                modify_on_create = config.auditing.modify_on_create,
                "Auditing enabled"
            );
            Ok(Arc::new(handler) as Arc<dyn AuditingHook>)
        })
        .register(names::PERSISTENCE, |r| {
            let hook: Arc<dyn AuditingHook> = r.require(names::AUDITING_HOOK)?;
            Ok(Arc::new(Persistence::new(hook)))
        })
}

/// Assemble the application context for `config`, followed by `extras`.
pub fn compose(
    config: Arc<AppConfig>,
    extras: impl IntoIterator<Item = Registration>,
) -> Result<ApplicationContext, WiringError> {
    extras
        .into_iter()
        .fold(default_registrations(config), ContextBuilder::add)
        .build()
}
