/// Store backed by a JSON file on disk.
pub mod json_file;
/// In-memory store.
pub mod memory;

use crate::dao::{models::ClubEntity, storage::StorageResult};

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;

/// Abstraction over wherever the host keeps the club state between runs.
///
/// The engine hands over the whole tuple after every successful command and reads it back once at
/// start-up; stores never see partial updates.
pub trait ClubStore {
    /// Load the last saved state, `None` when nothing was saved yet.
    fn load(&self) -> StorageResult<Option<ClubEntity>>;
    /// Replace the saved state.
    fn save(&mut self, state: &ClubEntity) -> StorageResult<()>;
}
