//! Call state storage for CareBridge
//!
//! Provides [`MemoryStore`], the default in-process implementation of the
//! `KeyValueStore` trait from carebridge-core. State does not survive a
//! restart; a durable backend only needs to implement the same trait.
//!
//! # Example
//!
//! ```no_run
//! use carebridge_core::traits::KeyValueStore;
//! use carebridge_store::{keys, MemoryStore};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), carebridge_core::AppError> {
//!     let store = MemoryStore::new();
//!     store.put(&keys::call_key("CA1"), serde_json::json!({"status": "ringing"})).await?;
//!
//!     let value = store.get(&keys::call_key("CA1")).await?;
//!     assert!(value.is_some());
//!     Ok(())
//! }
//! ```

pub mod keys;

use async_trait::async_trait;
use carebridge_core::error::AppError;
use carebridge_core::traits::KeyValueStore;
use parking_lot::RwLock;
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::trace;

/// In-memory key-value store
///
/// Keys are kept ordered so prefix scans are range reads. Growth is
/// unbounded: nothing is evicted.
#[derive(Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<BTreeMap<String, Value>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn put(&self, key: &str, value: Value) -> Result<(), AppError> {
        trace!(key = %key, "store put");
        self.entries.write().insert(key.to_string(), value);
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<Value>, AppError> {
        Ok(self.entries.read().get(key).cloned())
    }

    async fn delete(&self, key: &str) -> Result<bool, AppError> {
        trace!(key = %key, "store delete");
        Ok(self.entries.write().remove(key).is_some())
    }

    async fn scan(&self, prefix: &str) -> Result<Vec<(String, Value)>, AppError> {
        let entries = self.entries.read();
        Ok(entries
            .range(prefix.to_string()..)
            .take_while(|(key, _)| key.starts_with(prefix))
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect())
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("entries", &self.len())
            .finish()
    }
}
