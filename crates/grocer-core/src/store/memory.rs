//! In-memory [`KvStore`] implementation for tests and single-process use.
//!
//! Uses a `BTreeMap` behind `std::sync::RwLock`, so prefix scans come back in
//! key order. Every operation takes the lock once, which makes `increment`
//! atomic with respect to other callers in the process.

use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};

use super::{expires_at, merge_documents, KvStore};

/// In-memory document store.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    docs: RwLock<BTreeMap<String, Value>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, BTreeMap<String, Value>>> {
        self.docs.read().map_err(|_| anyhow!("in-memory store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, BTreeMap<String, Value>>> {
        self.docs.write().map_err(|_| anyhow!("in-memory store lock poisoned"))
    }

    /// Number of stored documents.
    pub fn len(&self) -> usize {
        self.read().map(|d| d.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl KvStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.read()?.get(key).cloned())
    }

    async fn set(&self, key: &str, doc: Value, merge: bool) -> Result<()> {
        let mut docs = self.write()?;
        match docs.get_mut(key) {
            Some(existing) if merge => merge_documents(existing, doc),
            _ => {
                docs.insert(key.to_string(), doc);
            }
        }
        Ok(())
    }

    async fn increment(&self, key: &str, field: &str, delta: i64, init: Option<Value>) -> Result<i64> {
        let mut docs = self.write()?;
        let doc = docs.entry(key.to_string()).or_insert_with(|| {
            let mut fresh = Value::Object(Map::new());
            if let Some(init) = init {
                merge_documents(&mut fresh, init);
            }
            fresh
        });
        let obj = doc
            .as_object_mut()
            .ok_or_else(|| anyhow!("document at {} is not an object", key))?;
        let current = obj.get(field).and_then(Value::as_i64).unwrap_or(0);
        let next = current + delta;
        obj.insert(field.to_string(), Value::from(next));
        Ok(next)
    }

    async fn delete_expired(&self, prefix: &str, now_ms: i64) -> Result<u64> {
        let mut docs = self.write()?;
        let before = docs.len();
        docs.retain(|k, v| !(k.starts_with(prefix) && expires_at(v).is_some_and(|e| e <= now_ms)));
        Ok((before - docs.len()) as u64)
    }

    async fn scan(&self, prefix: &str) -> Result<Vec<(String, Value)>> {
        Ok(self
            .read()?
            .range(prefix.to_string()..)
            .take_while(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect())
    }
}
