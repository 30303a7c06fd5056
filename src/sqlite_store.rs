//! SQLite-backed [`KvStore`] implementation.
//!
//! Documents are stored as JSON text in the single `kv_documents` table.
//! Merges and counter increments are done inside SQLite with the JSON1
//! functions, so each is one statement and therefore atomic across every
//! process sharing the database file.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::{Row, SqlitePool};

use grocer_core::store::KvStore;

/// SQLite implementation of the [`KvStore`] trait.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

#[async_trait]
impl KvStore for SqliteStore {
    async fn get(&self, key: &str) -> Result<Option<Value>> {
        let row: Option<String> = sqlx::query_scalar("SELECT doc FROM kv_documents WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(text) => {
                let doc = serde_json::from_str(&text)
                    .with_context(|| format!("corrupt document at {}", key))?;
                Ok(Some(doc))
            }
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, doc: Value, merge: bool) -> Result<()> {
        let text = serde_json::to_string(&doc)?;
        let sql = if merge {
            r#"
            INSERT INTO kv_documents (key, doc, expires_at, updated_at)
            VALUES (?1, json(?2), json_extract(?2, '$.expiresAt'), ?3)
            ON CONFLICT(key) DO UPDATE SET
                doc = json_patch(kv_documents.doc, excluded.doc),
                expires_at = json_extract(json_patch(kv_documents.doc, excluded.doc), '$.expiresAt'),
                updated_at = excluded.updated_at
            "#
        } else {
            r#"
            INSERT INTO kv_documents (key, doc, expires_at, updated_at)
            VALUES (?1, json(?2), json_extract(?2, '$.expiresAt'), ?3)
            ON CONFLICT(key) DO UPDATE SET
                doc = excluded.doc,
                expires_at = excluded.expires_at,
                updated_at = excluded.updated_at
            "#
        };

        sqlx::query(sql)
            .bind(key)
            .bind(text)
            .bind(now_ms())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn increment(&self, key: &str, field: &str, delta: i64, init: Option<Value>) -> Result<i64> {
        let init = match init {
            Some(v) => serde_json::to_string(&v)?,
            None => "{}".to_string(),
        };

        let value: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO kv_documents (key, doc, expires_at, updated_at)
            VALUES (?1, json_set(?4, '$.' || ?2, ?3), json_extract(?4, '$.expiresAt'), ?5)
            ON CONFLICT(key) DO UPDATE SET
                doc = json_set(
                    kv_documents.doc,
                    '$.' || ?2,
                    COALESCE(json_extract(kv_documents.doc, '$.' || ?2), 0) + ?3
                ),
                updated_at = ?5
            RETURNING json_extract(doc, '$.' || ?2)
            "#,
        )
        .bind(key)
        .bind(field)
        .bind(delta)
        .bind(init)
        .bind(now_ms())
        .fetch_one(&self.pool)
        .await?;

        Ok(value)
    }

    async fn delete_expired(&self, prefix: &str, now_ms: i64) -> Result<u64> {
        let result = sqlx::query(
            r#"
            DELETE FROM kv_documents
            WHERE substr(key, 1, length(?1)) = ?1
              AND expires_at IS NOT NULL
              AND expires_at <= ?2
            "#,
        )
        .bind(prefix)
        .bind(now_ms)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn scan(&self, prefix: &str) -> Result<Vec<(String, Value)>> {
        let rows = sqlx::query(
            "SELECT key, doc FROM kv_documents WHERE substr(key, 1, length(?1)) = ?1 ORDER BY key",
        )
        .bind(prefix)
        .fetch_all(&self.pool)
        .await?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            let key: String = row.get("key");
            let text: String = row.get("doc");
            let doc = serde_json::from_str(&text)
                .with_context(|| format!("corrupt document at {}", key))?;
            out.push((key, doc));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::{db, migrate};
    use serde_json::json;
    use std::sync::Arc;
    use tempfile::TempDir;

    async fn store() -> (SqliteStore, TempDir) {
        let tmp = TempDir::new().unwrap();
        let config = Config::minimal(tmp.path().join("grocer.sqlite"));
        let pool = db::connect(&config).await.unwrap();
        migrate::apply(&pool).await.unwrap();
        (SqliteStore::new(pool), tmp)
    }

    #[tokio::test]
    async fn test_get_missing() {
        let (s, _tmp) = store().await;
        assert!(s.get("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_set_replace_and_merge() {
        let (s, _tmp) = store().await;
        s.set("k", json!({"a": 1, "b": 2}), false).await.unwrap();
        s.set("k", json!({"b": 3, "c": 4}), true).await.unwrap();
        assert_eq!(s.get("k").await.unwrap(), Some(json!({"a": 1, "b": 3, "c": 4})));
        s.set("k", json!({"z": 0}), false).await.unwrap();
        assert_eq!(s.get("k").await.unwrap(), Some(json!({"z": 0})));
    }

    #[tokio::test]
    async fn test_increment_is_atomic_and_keeps_init() {
        let (s, _tmp) = store().await;
        let s = Arc::new(s);
        let mut handles = Vec::new();
        for _ in 0..20 {
            let s = s.clone();
            handles.push(tokio::spawn(async move {
                s.increment("rate/second_1", "count", 1, Some(json!({"expiresAt": 7})))
                    .await
                    .unwrap()
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        let doc = s.get("rate/second_1").await.unwrap().unwrap();
        assert_eq!(doc["count"], 20);
        assert_eq!(doc["expiresAt"], 7);
    }

    #[tokio::test]
    async fn test_delete_expired_and_scan() {
        let (s, _tmp) = store().await;
        s.set("c/a", json!({"expiresAt": 100}), false).await.unwrap();
        s.set("c/b", json!({"expiresAt": 900}), false).await.unwrap();
        s.set("r/a", json!({"expiresAt": 100}), false).await.unwrap();

        assert_eq!(s.delete_expired("c/", 500).await.unwrap(), 1);
        let keys: Vec<String> = s.scan("c/").await.unwrap().into_iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["c/b"]);
        assert!(s.get("r/a").await.unwrap().is_some());
    }
}
