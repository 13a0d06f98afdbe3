//! Entity identity.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::audit::Auditable;

/// Identifier assigned to an entity on first insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(Uuid);

impl EntityId {
    /// Generate a new random id (UUID v4).
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for EntityId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<Uuid> for EntityId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A persistable, audited record.
pub trait Entity: Auditable + Clone + Send + Sync + 'static {
    fn id(&self) -> Option<EntityId>;
    fn set_id(&mut self, id: EntityId);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique() {
        assert_ne!(EntityId::new(), EntityId::new());
    }

    #[test]
    fn serializes_as_plain_uuid() {
        let uuid = Uuid::new_v4();
        let json = serde_json::to_string(&EntityId::from(uuid)).unwrap();
        assert_eq!(json, format!("\"{}\"", uuid));
    }
}
