//! Persistence collaborator.
//!
//! # Data Flow
//! ```text
//! context["persistence"] → Persistence
//!     → repository::<E>()      (one store per entity type, created lazily)
//!     → InMemoryRepository<E>  (DashMap keyed by EntityId)
//!         insert → AuditingHook::before_create
//!         update → AuditingHook::before_update
//! ```
//!
//! # Design Decisions
//! - Every repository handed out shares the single hook from the context
//! - Creation stamps are owned by the store; callers cannot overwrite them

pub mod entity;
pub mod repository;

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use thiserror::Error;

use crate::audit::AuditingHook;

pub use entity::{Entity, EntityId};
pub use repository::InMemoryRepository;

/// Errors surfaced by repositories.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PersistenceError {
    #[error("entity {0} not found")]
    NotFound(EntityId),

    #[error("entity {0} already exists")]
    Conflict(EntityId),

    #[error("entity has no id")]
    MissingId,

    #[error("store registered for {0} holds a different type")]
    StoreTypeMismatch(&'static str),
}

/// Entry point to entity storage, wired to the context's auditing hook.
pub struct Persistence {
    hook: Arc<dyn AuditingHook>,
    stores: DashMap<TypeId, Arc<dyn Any + Send + Sync>>,
}

impl Persistence {
    pub fn new(hook: Arc<dyn AuditingHook>) -> Self {
        Self {
            hook,
            stores: DashMap::new(),
        }
    }

    /// Repository for entity type `E`, created on first use.
    pub fn repository<E: Entity>(&self) -> Result<Arc<InMemoryRepository<E>>, PersistenceError> {
        let store = self
            .stores
            .entry(TypeId::of::<E>())
            .or_insert_with(|| {
                tracing::debug!(entity = std::any::type_name::<E>(), "Creating repository");
                Arc::new(InMemoryRepository::<E>::new(Arc::clone(&self.hook))) as Arc<dyn Any + Send + Sync>
            })
            .value()
            .clone();

        store
            .downcast::<InMemoryRepository<E>>()
            .map_err(|_| PersistenceError::StoreTypeMismatch(std::any::type_name::<E>()))
    }

    /// The hook every repository calls.
    pub fn hook(&self) -> &Arc<dyn AuditingHook> {
        &self.hook
    }

    /// Number of entity types with a repository.
    pub fn store_count(&self) -> usize {
        self.stores.len()
    }
}

impl fmt::Debug for Persistence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Persistence")
            .field("hook", &self.hook)
            .field("stores", &self.stores.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::{AuditMetadata, Auditable, NoopAuditingHook};

    #[derive(Debug, Clone, Default)]
    struct Sku {
        id: Option<EntityId>,
        audit: AuditMetadata,
    }

    impl Auditable for Sku {
        fn audit(&self) -> &AuditMetadata {
            &self.audit
        }
        fn audit_mut(&mut self) -> &mut AuditMetadata {
            &mut self.audit
        }
    }

    impl Entity for Sku {
        fn id(&self) -> Option<EntityId> {
            self.id
        }
        fn set_id(&mut self, id: EntityId) {
            self.id = Some(id);
        }
    }

    #[test]
    fn repository_is_shared_per_type() {
        let persistence = Persistence::new(Arc::new(NoopAuditingHook));

        let first = persistence.repository::<Sku>().unwrap();
        first.insert(Sku::default()).unwrap();

        let second = persistence.repository::<Sku>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(second.count(), 1);
        assert_eq!(persistence.store_count(), 1);
    }
}
