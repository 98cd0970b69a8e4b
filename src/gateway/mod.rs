// src/gateway/mod.rs
//
// Persistence Gateway - the single writer boundary
//
// CRITICAL RULES:
// - Exactly one connection performs mutations; every write and every
//   multi-row read used for diffing runs inside one of its transactions,
//   so "what was read" and "what gets written" see the same snapshot
// - Transactions are commit-or-nothing; a failed closure rolls back
// - Read-only display queries come from the pool and never mutate
// - Blocking SQLite work runs on the blocking thread pool, keeping the
//   async runtime free for fetches and the UI-facing read path

use rusqlite::{Connection, Transaction};
use std::path::Path;
use std::sync::{Arc, Mutex};

use crate::db::{
    create_connection_pool, get_connection, initialize_database, open_writer_connection,
    ConnectionPool, PooledConn,
};
use crate::error::{AppError, AppResult};

pub struct PersistenceGateway {
    writer: Arc<Mutex<Connection>>,
    pool: Arc<ConnectionPool>,
}

impl PersistenceGateway {
    /// Open (and initialize) the database at the given path.
    pub fn open(db_path: &Path) -> AppResult<Self> {
        let writer = open_writer_connection(db_path)?;
        initialize_database(&writer)?;

        let pool = create_connection_pool(db_path)?;

        Ok(Self {
            writer: Arc::new(Mutex::new(writer)),
            pool: Arc::new(pool),
        })
    }

    /// Run a closure inside one writer transaction.
    ///
    /// The closure's error aborts the transaction; nothing it wrote
    /// survives. Runs on the blocking pool so callers may await it from
    /// async context.
    pub async fn write<T, F>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&Transaction) -> AppResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let writer = Arc::clone(&self.writer);

        tokio::task::spawn_blocking(move || {
            let mut conn = writer
                .lock()
                .map_err(|_| AppError::Pool("Writer mutex poisoned".to_string()))?;

            let tx = conn.transaction()?;
            let out = f(&tx)?;
            tx.commit()?;
            Ok(out)
        })
        .await
        .map_err(|e| AppError::Other(format!("Writer task failed: {}", e)))?
    }

    /// Synchronous variant of [`write`] for callers already off the
    /// async runtime (tests, CLI one-shots).
    pub fn write_blocking<T, F>(&self, f: F) -> AppResult<T>
    where
        F: FnOnce(&Transaction) -> AppResult<T>,
    {
        let mut conn = self
            .writer
            .lock()
            .map_err(|_| AppError::Pool("Writer mutex poisoned".to_string()))?;

        let tx = conn.transaction()?;
        let out = f(&tx)?;
        tx.commit()?;
        Ok(out)
    }

    /// Get a pooled read-only connection for display queries.
    pub fn read(&self) -> AppResult<PooledConn> {
        get_connection(&self.pool)
    }
}
