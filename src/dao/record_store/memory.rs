use std::sync::Arc;

use dashmap::DashMap;
use futures::future::BoxFuture;
use serde_json::Value;

use crate::dao::{keys::RecordKey, record_store::RecordStore, storage::StorageResult};

/// Process-local store with the same blind-overwrite semantics as the remote
/// one. Used for single-machine play and as the substrate of the test suite.
#[derive(Clone, Default)]
pub struct InMemoryRecordStore {
    records: Arc<DashMap<String, Value>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of records currently held.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl RecordStore for InMemoryRecordStore {
    fn get(&self, key: RecordKey) -> BoxFuture<'static, StorageResult<Option<Value>>> {
        let value = self
            .records
            .get(key.as_str())
            .map(|entry| entry.value().clone());
        Box::pin(async move { Ok(value) })
    }

    fn put(&self, key: RecordKey, value: Value) -> BoxFuture<'static, StorageResult<()>> {
        let records = self.records.clone();
        Box::pin(async move {
            records.insert(key.as_str().to_string(), value);
            Ok(())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        Box::pin(async { Ok(()) })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn put_overwrites_whole_value() {
        let store = InMemoryRecordStore::new();
        let key = RecordKey::raw("game:x");

        assert_eq!(store.get(key.clone()).await.unwrap(), None);
        store.put(key.clone(), json!({"a": 1, "b": 2})).await.unwrap();
        store.put(key.clone(), json!({"a": 3})).await.unwrap();

        assert_eq!(store.get(key).await.unwrap(), Some(json!({"a": 3})));
        assert_eq!(store.len(), 1);
    }
}
