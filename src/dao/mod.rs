/// Game and participant identifiers.
pub mod ids;
/// Record key layout shared with every other client of the store.
pub mod keys;
/// Persisted record shapes.
pub mod models;
/// Raw whole-value store backends.
pub mod record_store;
/// Typed accessors over the record store.
pub mod records;
/// Storage error type shared by every backend.
pub mod storage;
