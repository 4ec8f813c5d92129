use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use rusqlite::Connection;

use super::migrations::run_migrations;
use super::schema::apply_pragmas;
use crate::error::Result;

/// The one SQLite connection behind a [`Database`](super::Database).
///
/// Each store operation takes the lock for its whole duration. A reader
/// therefore sees the contact table either before or after a batch delete,
/// never partway through it.
pub struct ContactConnection {
    path: Option<PathBuf>,
    conn: Mutex<Connection>,
}

impl ContactConnection {
    /// Opens (or creates) the database file and brings its schema up to date.
    pub fn open(path: &Path) -> Result<Self> {
        Self::prepare(Connection::open(path)?, Some(path.to_path_buf()))
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::prepare(Connection::open_in_memory()?, None)
    }

    fn prepare(conn: Connection, path: Option<PathBuf>) -> Result<Self> {
        apply_pragmas(&conn)?;
        run_migrations(&conn)?;
        Ok(Self {
            path,
            conn: Mutex::new(conn),
        })
    }

    pub fn lock(&self) -> MutexGuard<'_, Connection> {
        // A panic while holding the lock leaves the connection itself usable.
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }
}
