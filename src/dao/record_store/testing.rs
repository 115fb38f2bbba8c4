//! Fault-injecting store used by the unit tests.

use std::{
    io,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use dashmap::{DashMap, DashSet};
use futures::future::BoxFuture;
use serde_json::Value;
use tokio::sync::Notify;

use crate::dao::{
    keys::RecordKey,
    record_store::{RecordStore, memory::InMemoryRecordStore},
    storage::{StorageError, StorageResult},
};

/// Wraps an [`InMemoryRecordStore`] and misbehaves on demand for chosen keys.
#[derive(Clone, Default)]
pub struct FlakyStore {
    inner: InMemoryRecordStore,
    /// Next N PUTs to the key are acknowledged but silently lost, exactly like
    /// a concurrent writer overwriting them.
    dropped_puts: Arc<DashMap<String, usize>>,
    /// Next N PUTs to the key fail with a 503.
    failing_puts: Arc<DashMap<String, usize>>,
    /// GETs of these keys always fail as if the network were down.
    unreachable: Arc<DashSet<String>>,
    /// GETs of these keys wait for the gate to open before answering.
    held: Arc<DashMap<String, ReadGate>>,
    puts: Arc<AtomicUsize>,
}

/// Holds GETs of one key in flight until [`ReadGate::open`] is called.
#[derive(Clone, Default)]
pub struct ReadGate {
    entered: Arc<Notify>,
    release: Arc<Notify>,
}

impl ReadGate {
    /// Wait until a GET reached the gate.
    pub async fn entered(&self) {
        self.entered.notified().await;
    }

    /// Let the held GET complete.
    pub fn open(&self) {
        self.release.notify_one();
    }
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn drop_puts(&self, key: &RecordKey, count: usize) {
        self.dropped_puts.insert(key.to_string(), count);
    }

    pub fn fail_puts(&self, key: &RecordKey, count: usize) {
        self.failing_puts.insert(key.to_string(), count);
    }

    pub fn make_unreachable(&self, key: &RecordKey) {
        self.unreachable.insert(key.to_string());
    }

    /// Hold the next GETs of `key` until the returned gate is opened.
    pub fn hold_gets(&self, key: &RecordKey) -> ReadGate {
        let gate = ReadGate::default();
        self.held.insert(key.to_string(), gate.clone());
        gate
    }

    pub fn put_count(&self) -> usize {
        self.puts.load(Ordering::SeqCst)
    }

    fn take_one(budget: &DashMap<String, usize>, key: &str) -> bool {
        match budget.get_mut(key) {
            Some(mut remaining) if *remaining > 0 => {
                *remaining -= 1;
                true
            }
            _ => false,
        }
    }
}

impl RecordStore for FlakyStore {
    fn get(&self, key: RecordKey) -> BoxFuture<'static, StorageResult<Option<Value>>> {
        if self.unreachable.contains(key.as_str()) {
            let err = StorageError::unavailable(
                key.as_str(),
                "connection refused",
                io::Error::new(io::ErrorKind::ConnectionRefused, "injected"),
            );
            return Box::pin(async move { Err(err) });
        }
        let held = self.held.get(key.as_str()).map(|gate| gate.value().clone());
        if let Some(gate) = held {
            let inner = self.inner.clone();
            return Box::pin(async move {
                gate.entered.notify_one();
                gate.release.notified().await;
                inner.get(key).await
            });
        }
        self.inner.get(key)
    }

    fn put(&self, key: RecordKey, value: Value) -> BoxFuture<'static, StorageResult<()>> {
        self.puts.fetch_add(1, Ordering::SeqCst);
        if Self::take_one(&self.failing_puts, key.as_str()) {
            let err = StorageError::Status {
                key: key.to_string(),
                status: 503,
                body: "injected".into(),
            };
            return Box::pin(async move { Err(err) });
        }
        if Self::take_one(&self.dropped_puts, key.as_str()) {
            return Box::pin(async { Ok(()) });
        }
        self.inner.put(key, value)
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.inner.health_check()
    }
}
