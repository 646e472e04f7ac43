//! libSQL backend: async `KeyValueStore` implementation.
//!
//! Supports local file and in-memory databases. Values are stored as JSON
//! text in the `state` table.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use libsql::{Connection, Database as LibSqlDatabase, params};
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::error::DatabaseError;
use crate::store::migrations;
use crate::store::traits::{KeyValueStore, StateWrite};

/// libSQL database backend.
///
/// Stores a single connection that is reused for all operations. Reads and
/// writes both go through `write_lock`: a commit transaction is open on the
/// shared connection, so an unguarded read could see rows it may roll back.
pub struct LibSqlBackend {
    #[allow(dead_code)]
    db: Arc<LibSqlDatabase>,
    conn: Connection,
    write_lock: Mutex<()>,
}

impl LibSqlBackend {
    /// Open (or create) a local database file and run migrations.
    pub async fn new_local(path: &Path) -> Result<Self, DatabaseError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                DatabaseError::Pool(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| DatabaseError::Pool(format!("Failed to open libSQL database: {e}")))?;

        let backend = Self::from_database(db)?;
        backend.init_schema().await?;
        info!(path = %path.display(), "Database opened");
        Ok(backend)
    }

    /// Create an in-memory database (for tests).
    pub async fn new_memory() -> Result<Self, DatabaseError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| {
                DatabaseError::Pool(format!("Failed to create in-memory database: {e}"))
            })?;

        let backend = Self::from_database(db)?;
        backend.init_schema().await?;
        Ok(backend)
    }

    fn from_database(db: LibSqlDatabase) -> Result<Self, DatabaseError> {
        let conn = db
            .connect()
            .map_err(|e| DatabaseError::Pool(format!("Failed to create connection: {e}")))?;
        Ok(Self {
            db: Arc::new(db),
            conn,
            write_lock: Mutex::new(()),
        })
    }

    async fn init_schema(&self) -> Result<(), DatabaseError> {
        migrations::run_migrations(&self.conn).await
    }
}

fn encode(value: &serde_json::Value) -> Result<String, DatabaseError> {
    serde_json::to_string(value).map_err(|e| DatabaseError::Serialization(e.to_string()))
}

async fn upsert(
    conn: &Connection,
    scope: &str,
    key: &str,
    value: &serde_json::Value,
) -> Result<(), DatabaseError> {
    let value_str = encode(value)?;
    let now = Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO state (scope, key, value, updated_at) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT (scope, key) DO UPDATE SET value = ?3, updated_at = ?4",
        params![scope, key, value_str, now],
    )
    .await
    .map_err(|e| DatabaseError::Query(format!("set: {e}")))?;
    Ok(())
}

async fn remove(conn: &Connection, scope: &str, key: &str) -> Result<u64, DatabaseError> {
    conn.execute(
        "DELETE FROM state WHERE scope = ?1 AND key = ?2",
        params![scope, key],
    )
    .await
    .map_err(|e| DatabaseError::Query(format!("delete: {e}")))
}

#[async_trait]
impl KeyValueStore for LibSqlBackend {
    async fn get(&self, scope: &str, key: &str) -> Result<Option<serde_json::Value>, DatabaseError> {
        let _guard = self.write_lock.lock().await;
        let mut rows = self
            .conn
            .query(
                "SELECT value FROM state WHERE scope = ?1 AND key = ?2",
                params![scope, key],
            )
            .await
            .map_err(|e| DatabaseError::Query(format!("get: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => {
                let value_str: String = row
                    .get(0)
                    .map_err(|e| DatabaseError::Query(format!("get: {e}")))?;
                let value = serde_json::from_str(&value_str)
                    .map_err(|e| DatabaseError::Serialization(format!("{scope}/{key}: {e}")))?;
                Ok(Some(value))
            }
            Ok(None) => Ok(None),
            Err(e) => Err(DatabaseError::Query(format!("get: {e}"))),
        }
    }

    async fn set(
        &self,
        scope: &str,
        key: &str,
        value: &serde_json::Value,
    ) -> Result<(), DatabaseError> {
        let _guard = self.write_lock.lock().await;
        upsert(&self.conn, scope, key, value).await
    }

    async fn delete(&self, scope: &str, key: &str) -> Result<bool, DatabaseError> {
        let _guard = self.write_lock.lock().await;
        Ok(remove(&self.conn, scope, key).await? > 0)
    }

    async fn commit(&self, writes: &[StateWrite]) -> Result<(), DatabaseError> {
        let _guard = self.write_lock.lock().await;
        let tx = self
            .conn
            .transaction()
            .await
            .map_err(|e| DatabaseError::Transaction(format!("begin: {e}")))?;

        for write in writes {
            let applied = match write {
                StateWrite::Set { scope, key, value } => upsert(&tx, scope, key, value).await,
                StateWrite::Delete { scope, key } => remove(&tx, scope, key).await.map(|_| ()),
            };
            if let Err(e) = applied {
                tx.rollback()
                    .await
                    .map_err(|re| DatabaseError::Transaction(format!("rollback after {e}: {re}")))?;
                return Err(e);
            }
        }

        tx.commit()
            .await
            .map_err(|e| DatabaseError::Transaction(format!("commit: {e}")))?;
        debug!(writes = writes.len(), "State batch committed");
        Ok(())
    }
}
