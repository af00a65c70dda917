use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, Sqlite, Transaction};

use super::SqliteRepository;
use crate::repository::{KeyValueStore, KvWrite, StorageError};

fn conn<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Connection(e.to_string())
}

const UPSERT: &str = r"
    INSERT INTO kv_entries (key, value, updated_at)
    VALUES (?1, ?2, ?3)
    ON CONFLICT(key) DO UPDATE SET
        value = excluded.value,
        updated_at = excluded.updated_at
";

const DELETE: &str = "DELETE FROM kv_entries WHERE key = ?1";

async fn apply_write(tx: &mut Transaction<'_, Sqlite>, write: &KvWrite) -> Result<(), StorageError> {
    match write {
        KvWrite::Set { key, value } => {
            sqlx::query(UPSERT)
                .bind(key.as_str())
                .bind(value.as_str())
                .bind(Utc::now())
                .execute(&mut **tx)
                .await
                .map_err(conn)?;
        }
        KvWrite::Remove { key } => {
            sqlx::query(DELETE)
                .bind(key.as_str())
                .execute(&mut **tx)
                .await
                .map_err(conn)?;
        }
    }
    Ok(())
}

#[async_trait]
impl KeyValueStore for SqliteRepository {
    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let row = sqlx::query("SELECT value FROM kv_entries WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        row.map(|row| {
            row.try_get::<String, _>("value")
                .map_err(|e| StorageError::Serialization(e.to_string()))
        })
        .transpose()
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        sqlx::query(UPSERT)
            .bind(key)
            .bind(value)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StorageError> {
        sqlx::query(DELETE)
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(())
    }

    async fn write_batch(&self, writes: &[KvWrite]) -> Result<(), StorageError> {
        let mut tx = self.pool.begin().await.map_err(conn)?;
        for write in writes {
            // Dropping `tx` on error rolls the batch back.
            apply_write(&mut tx, write).await?;
        }
        tx.commit().await.map_err(conn)?;
        Ok(())
    }
}
