//! File-backed store keeping the club state as JSON under a namespace key.

mod error;
mod store;

pub use error::{FileStoreError, FileStoreResult};
pub use store::JsonFileStore;
