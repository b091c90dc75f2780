use std::{cell::RefCell, rc::Rc};

use crate::dao::{
    club_store::ClubStore,
    models::{ClubEntity, PersistedEnvelope},
    storage::{StorageError, StorageResult},
};

/// Store keeping the serialized envelope in memory.
///
/// The state still goes through JSON so tests exercise the same layout as the file store.
/// Clones share one document, so a caller can keep a handle on a store handed to the engine.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    document: Rc<RefCell<Option<String>>>,
}

impl MemoryStore {
    /// Empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw JSON document last written, if any.
    pub fn document(&self) -> Option<String> {
        self.document.borrow().clone()
    }
}

impl ClubStore for MemoryStore {
    fn load(&self) -> StorageResult<Option<ClubEntity>> {
        let document = self.document.borrow();
        let Some(document) = document.as_deref() else {
            return Ok(None);
        };
        let envelope: PersistedEnvelope = serde_json::from_str(document).map_err(|source| {
            StorageError::unavailable("failed to decode in-memory state".into(), source)
        })?;
        Ok(Some(envelope.state))
    }

    fn save(&mut self, state: &ClubEntity) -> StorageResult<()> {
        let envelope = PersistedEnvelope::new(state.clone());
        let document = serde_json::to_string(&envelope).map_err(|source| {
            StorageError::unavailable("failed to encode in-memory state".into(), source)
        })?;
        *self.document.borrow_mut() = Some(document);
        Ok(())
    }
}
