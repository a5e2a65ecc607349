//! Implements a struct that holds the shared state handed to collaborators.

use std::sync::{Arc, Mutex, MutexGuard};

use rusqlite::Connection;

use crate::{Error, db::initialize, pagination::PaginationConfig};

/// The shared state of the engine.
///
/// The database connection is guarded by a mutex: every writer acquires it
/// for the duration of a transaction-apply call, which serializes the
/// read-modify-write sequences on item stock and on the ledger's running
/// balance. Readers acquire the same lock and therefore always see a
/// consistent snapshot.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The config that controls how pages of data are returned.
    pub pagination_config: PaginationConfig,

    /// The database connection.
    db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for
    /// the domain models.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        pagination_config: PaginationConfig,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        Ok(Self {
            pagination_config,
            db_connection: Arc::new(Mutex::new(db_connection)),
        })
    }

    /// Acquire the database connection.
    ///
    /// Blocks until no other caller holds the lock. Hold the guard for the
    /// whole of a logical operation; releasing it mid-operation would let
    /// concurrent appliers interleave between the stock checks and the
    /// ledger append.
    ///
    /// # Errors
    /// Returns [Error::DatabaseLock] if the lock has been poisoned by a
    /// panicking writer.
    pub fn connection(&self) -> Result<MutexGuard<'_, Connection>, Error> {
        self.db_connection.lock().map_err(|_| Error::DatabaseLock)
    }
}
