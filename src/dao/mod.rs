/// Club state storage backends.
pub mod club_store;
/// Persisted model definitions.
pub mod models;
/// Storage abstraction layer errors.
pub mod storage;
