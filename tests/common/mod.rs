//! Shared utilities for host integration tests.

#![allow(dead_code)]

use ecommerce_api::audit::{AuditMetadata, Auditable};
use ecommerce_api::config::AppConfig;
use ecommerce_api::persistence::{Entity, EntityId};
use serde::{Deserialize, Serialize};
use tokio::sync::{Mutex, MutexGuard};

static HOST_LOCK: Mutex<()> = Mutex::const_new(());

/// Only one application context may be active per process, so tests that
/// start a host take turns.
pub async fn serial() -> MutexGuard<'static, ()> {
    HOST_LOCK.lock().await
}

/// Defaults, bound to an ephemeral loopback port.
pub fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.server.bind_address = "127.0.0.1:0".into();
    config.server.shutdown_timeout_secs = 5;
    config.observability.log_level = "warn".into();
    config
}

/// A catalog product, the simplest auditable entity.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Product {
    pub id: Option<EntityId>,
    pub name: String,
    #[serde(default)]
    pub audit: AuditMetadata,
}

impl Product {
    pub fn named(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }
}

impl Auditable for Product {
    fn audit(&self) -> &AuditMetadata {
        &self.audit
    }

    fn audit_mut(&mut self) -> &mut AuditMetadata {
        &mut self.audit
    }
}

impl Entity for Product {
    fn id(&self) -> Option<EntityId> {
        self.id
    }

    fn set_id(&mut self, id: EntityId) {
        self.id = Some(id);
    }
}
