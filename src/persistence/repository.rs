//! In-memory entity store.

use std::fmt;
use std::sync::Arc;

use dashmap::mapref::entry::{Entry, OccupiedEntry, VacantEntry};
use dashmap::DashMap;

use crate::audit::AuditingHook;
use crate::persistence::entity::{Entity, EntityId};
use crate::persistence::PersistenceError;

/// A thread-safe store for one entity type.
///
/// Writes go through the auditing hook; reads return clones.
pub struct InMemoryRepository<E: Entity> {
    entries: DashMap<EntityId, E>,
    hook: Arc<dyn AuditingHook>,
}

impl<E: Entity> InMemoryRepository<E> {
    pub fn new(hook: Arc<dyn AuditingHook>) -> Self {
        Self {
            entries: DashMap::new(),
            hook,
        }
    }

    /// Store a new entity, assigning an id when it has none.
    pub fn insert(&self, mut entity: E) -> Result<E, PersistenceError> {
        let id = Self::assign_id(&mut entity);
        match self.entries.entry(id) {
            Entry::Occupied(_) => Err(PersistenceError::Conflict(id)),
            Entry::Vacant(slot) => Ok(self.create(slot, entity)),
        }
    }

    /// Overwrite an existing entity. Creation stamps are kept from the stored copy.
    pub fn update(&self, entity: E) -> Result<E, PersistenceError> {
        let id = entity.id().ok_or(PersistenceError::MissingId)?;
        match self.entries.entry(id) {
            Entry::Vacant(_) => Err(PersistenceError::NotFound(id)),
            Entry::Occupied(slot) => Ok(self.replace(slot, entity)),
        }
    }

    /// Insert when the entity is new, update otherwise.
    ///
    /// The choice is made under the entry lock, so a concurrent delete turns
    /// the save into an insert instead of failing it.
    pub fn save(&self, mut entity: E) -> Result<E, PersistenceError> {
        let id = Self::assign_id(&mut entity);
        match self.entries.entry(id) {
            Entry::Occupied(slot) => Ok(self.replace(slot, entity)),
            Entry::Vacant(slot) => Ok(self.create(slot, entity)),
        }
    }

    fn assign_id(entity: &mut E) -> EntityId {
        entity.id().unwrap_or_else(|| {
            let id = EntityId::new();
            entity.set_id(id);
            id
        })
    }

    fn create(&self, slot: VacantEntry<'_, EntityId, E>, mut entity: E) -> E {
        let id = *slot.key();
        self.hook.before_create(entity.audit_mut());
        slot.insert(entity.clone());
        tracing::trace!(%id, "Entity created");
        entity
    }

    fn replace(&self, mut slot: OccupiedEntry<'_, EntityId, E>, mut entity: E) -> E {
        let id = *slot.key();
        entity.audit_mut().keep_creation_from(slot.get().audit());
        self.hook.before_update(entity.audit_mut());
        slot.insert(entity.clone());
        tracing::trace!(%id, "Entity updated");
        entity
    }

    pub fn find_by_id(&self, id: &EntityId) -> Option<E> {
        self.entries.get(id).map(|entry| entry.value().clone())
    }

    pub fn find_all(&self) -> Vec<E> {
        self.entries.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Remove an entity. Returns whether it existed.
    pub fn delete_by_id(&self, id: &EntityId) -> bool {
        self.entries.remove(id).is_some()
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }
}

impl<E: Entity> fmt::Debug for InMemoryRepository<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryRepository")
            .field("entity", &std::any::type_name::<E>())
            .field("count", &self.entries.len())
            .finish()
    }
}
