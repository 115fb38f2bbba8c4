#[cfg(feature = "http-store")]
pub mod http;
pub mod memory;
#[cfg(test)]
pub(crate) mod testing;

use futures::future::BoxFuture;
use serde_json::Value;

use crate::dao::{keys::RecordKey, storage::StorageResult};

/// Whole-value key/value store shared by every session of a game.
///
/// `put` is a blind overwrite: there is no revision token, no compare-and-swap
/// and no merge. `get` of an absent key resolves to `Ok(None)`.
pub trait RecordStore: Send + Sync {
    fn get(&self, key: RecordKey) -> BoxFuture<'static, StorageResult<Option<Value>>>;
    fn put(&self, key: RecordKey, value: Value) -> BoxFuture<'static, StorageResult<()>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}
