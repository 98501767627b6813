pub mod error;
pub mod migrations;
pub mod models;
pub mod queries;
mod statement;

pub use error::StorageError;
pub use statement::{Row, Rows, Statement};

use rusqlite::{Connection, TransactionBehavior};
use std::path::Path;
use std::sync::Mutex;
use tracing::{debug, info};

/// Shared handle to the message store. Safe to use from any thread; statements
/// are serialised on one connection.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let conn = Connection::open(path)?;

        // WAL mode for concurrent reads
        conn.pragma_update(None, "journal_mode", "WAL")?;

        let db = Self::init(conn)?;
        info!("Database opened at {}", path.display());
        Ok(db)
    }

    pub fn open_in_memory() -> Result<Self, StorageError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StorageError> {
        conn.pragma_update(None, "foreign_keys", "ON")?;
        migrations::run(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn with_conn<F, T>(&self, f: F) -> Result<T, StorageError>
    where
        F: FnOnce(&mut Connection) -> Result<T, StorageError>,
    {
        let mut conn = self.conn.lock().map_err(|_| StorageError::LockPoisoned)?;
        f(&mut conn)
    }

    /// Run a single statement. Queries yield their rows; writes yield an empty
    /// row set carrying the number of affected rows.
    pub fn execute(&self, statement: &Statement) -> Result<Rows, StorageError> {
        self.with_conn(|conn| statement::run(conn, statement))
    }

    /// Run statements in order inside one transaction. Either every statement
    /// is applied or none is.
    pub fn batch(&self, statements: &[Statement]) -> Result<Vec<Rows>, StorageError> {
        self.with_conn(|conn| {
            let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

            let mut results = Vec::with_capacity(statements.len());
            for statement in statements {
                results.push(statement::run(&tx, statement)?);
            }

            tx.commit()?;
            debug!("Committed batch of {} statements", statements.len());
            Ok(results)
        })
    }
}
