//! Database schema initialization for the application.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};

use crate::{
    Error,
    item::create_item_table,
    ledger::create_ledger_entry_table,
    transaction::{create_payment_table, create_transaction_line_table, create_transaction_table},
};

/// Create the tables for the domain models.
///
/// All tables are created inside a single exclusive transaction so a partial
/// schema is never left behind. Safe to call on an already-initialized
/// database.
///
/// # Errors
/// Returns an error if a table cannot be created or if there is an SQL error.
pub fn initialize(connection: &Connection) -> Result<(), Error> {
    let transaction =
        SqlTransaction::new_unchecked(connection, TransactionBehavior::Exclusive)?;

    create_item_table(&transaction)?;
    create_transaction_table(&transaction)?;
    create_transaction_line_table(&transaction)?;
    create_payment_table(&transaction)?;
    create_ledger_entry_table(&transaction)?;

    transaction.commit()?;

    Ok(())
}
