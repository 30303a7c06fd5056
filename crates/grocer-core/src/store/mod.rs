//! Key-value document store abstraction.
//!
//! The [`KvStore`] trait is the whole persistence contract the cache and the
//! rate governor rely on: fetch a JSON document by key, write (or merge) one,
//! atomically add to a numeric field, and reclaim expired documents under a
//! key prefix. Any document store with these primitives satisfies it.
//!
//! Documents that expire carry an `expiresAt` field (Unix milliseconds);
//! [`delete_expired`](KvStore::delete_expired) uses it. Nothing else about a
//! document's shape is known to the store.
//!
//! Implementations must be `Send + Sync` to work with async runtimes.

pub mod memory;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

/// Name of the document field holding the expiry timestamp.
pub const EXPIRES_AT_FIELD: &str = "expiresAt";

/// Abstract key-value document store.
///
/// | Method | Purpose |
/// |--------|---------|
/// | [`get`](KvStore::get) | Fetch a document by key |
/// | [`set`](KvStore::set) | Write a document, replacing or shallow-merging |
/// | [`increment`](KvStore::increment) | Atomically add to a numeric field |
/// | [`delete_expired`](KvStore::delete_expired) | Remove expired documents under a prefix |
#[async_trait]
pub trait KvStore: Send + Sync {
    /// Fetch the document stored at `key`.
    async fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Write `doc` at `key`.
    ///
    /// With `merge = false` the stored document is replaced. With
    /// `merge = true` the top-level fields of `doc` are merged into the
    /// existing document (created if absent).
    async fn set(&self, key: &str, doc: Value, merge: bool) -> Result<()>;

    /// Atomically add `delta` to the numeric `field` of the document at
    /// `key`, creating the document (and field, starting at 0) if absent.
    /// Returns the new value.
    ///
    /// `init` is merged into a freshly created document only; it lets the
    /// caller attach an `expiresAt` to a counter in the same atomic step.
    async fn increment(&self, key: &str, field: &str, delta: i64, init: Option<Value>) -> Result<i64>;

    /// Delete every document under `prefix` whose `expiresAt` is at or
    /// before `now_ms`. Returns the number removed.
    async fn delete_expired(&self, prefix: &str, now_ms: i64) -> Result<u64>;

    /// List `(key, document)` pairs under `prefix`, ordered by key.
    async fn scan(&self, prefix: &str) -> Result<Vec<(String, Value)>>;
}

/// Shallow-merge the top-level fields of `patch` into `base`.
///
/// Non-object `base` values are replaced by `patch`.
pub fn merge_documents(base: &mut Value, patch: Value) {
    match (base.as_object_mut(), patch) {
        (Some(obj), Value::Object(fields)) => {
            for (k, v) in fields {
                obj.insert(k, v);
            }
        }
        (_, patch) => *base = patch,
    }
}

/// The `expiresAt` of a document, if it has a numeric one.
pub fn expires_at(doc: &Value) -> Option<i64> {
    doc.get(EXPIRES_AT_FIELD).and_then(Value::as_i64)
}
