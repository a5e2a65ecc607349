//! Defines the append-only financial ledger derived from transactions.
//!
//! Every applied transaction appends exactly one entry carrying the running
//! cash balance. Entries are never updated or deleted; the balance column is
//! a fold over the whole log in creation order, so appends must be
//! serialized by the caller (the processor runs inside the connection mutex
//! and an IMMEDIATE SQL transaction).

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::{LedgerEntryId, TransactionId},
    transaction::{TransactionLine, TransactionType},
};

// ============================================================================
// MODELS
// ============================================================================

/// One append-only financial record derived from a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    /// The ID of the entry. IDs are strictly increasing in append order.
    pub id: LedgerEntryId,
    /// The transaction this entry was derived from.
    pub transaction_id: TransactionId,
    /// The transaction's creation time.
    pub created_at: OffsetDateTime,
    /// A fixed human-readable label selected by the transaction type.
    pub description: String,
    /// Cash received. Zero for everything but sales.
    pub income: i64,
    /// Cash spent. Zero for everything but stock purchases.
    pub expense: i64,
    /// The running balance after this entry:
    /// the previous entry's balance plus `income - expense`.
    pub balance_after: i64,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Derive and append the ledger entry for a just-created transaction.
///
/// Income is the sum of the lines' sell subtotals for a sale; expense is the
/// sum of the lines' cost subtotals for a stock purchase. Rejects and
/// adjustments move stock without touching recorded cash flow, so they
/// append an entry with zero income and zero expense.
///
/// Must run inside the same SQL transaction as the stock mutations so the
/// ledger can never disagree with the stock state.
pub(crate) fn append_ledger_entry(
    transaction_id: TransactionId,
    created_at: OffsetDateTime,
    transaction_type: TransactionType,
    lines: &[TransactionLine],
    connection: &Connection,
) -> Result<LedgerEntry, Error> {
    let income = match transaction_type {
        TransactionType::Sale => lines.iter().filter_map(|line| line.subtotal_sell).sum(),
        _ => 0,
    };
    let expense = match transaction_type {
        TransactionType::StockIn => lines.iter().map(|line| line.subtotal_cost).sum(),
        _ => 0,
    };

    let prior_balance = last_ledger_entry(connection)?
        .map(|entry| entry.balance_after)
        .unwrap_or(0);
    let balance_after = prior_balance + income - expense;

    let description = description_for(transaction_type);

    connection.execute(
        "INSERT INTO ledger_entry \
        (transaction_id, created_at, description, income, expense, balance_after) \
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        (
            transaction_id,
            created_at,
            description,
            income,
            expense,
            balance_after,
        ),
    )?;

    Ok(LedgerEntry {
        id: connection.last_insert_rowid(),
        transaction_id,
        created_at,
        description: description.to_owned(),
        income,
        expense,
        balance_after,
    })
}

/// The fixed ledger label for a transaction type.
fn description_for(transaction_type: TransactionType) -> &'static str {
    match transaction_type {
        TransactionType::Sale => "sales revenue",
        TransactionType::StockIn => "stock purchase capital",
        TransactionType::Reject => "rejected stock (non-revenue)",
        TransactionType::Adjust => "stock adjustment",
    }
}

/// Get the most recently appended ledger entry, or `None` for an empty
/// ledger.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn last_ledger_entry(connection: &Connection) -> Result<Option<LedgerEntry>, Error> {
    let result = connection
        .prepare(
            "SELECT id, transaction_id, created_at, description, income, expense, balance_after \
            FROM ledger_entry ORDER BY id DESC LIMIT 1",
        )?
        .query_row([], map_ledger_entry_row);

    match result {
        Ok(entry) => Ok(Some(entry)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(error) => Err(error.into()),
    }
}

/// List every ledger entry in append order.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn list_ledger_entries(connection: &Connection) -> Result<Vec<LedgerEntry>, Error> {
    connection
        .prepare(
            "SELECT id, transaction_id, created_at, description, income, expense, balance_after \
            FROM ledger_entry ORDER BY id ASC",
        )?
        .query_map([], map_ledger_entry_row)?
        .map(|maybe_entry| maybe_entry.map_err(Error::SqlError))
        .collect()
}

/// Map a database row to a [LedgerEntry].
pub fn map_ledger_entry_row(row: &Row) -> Result<LedgerEntry, rusqlite::Error> {
    Ok(LedgerEntry {
        id: row.get(0)?,
        transaction_id: row.get(1)?,
        created_at: row.get(2)?,
        description: row.get(3)?,
        income: row.get(4)?,
        expense: row.get(5)?,
        balance_after: row.get(6)?,
    })
}

/// Create the ledger entry table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_ledger_entry_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS ledger_entry (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                transaction_id INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                description TEXT NOT NULL,
                income INTEGER NOT NULL,
                expense INTEGER NOT NULL,
                balance_after INTEGER NOT NULL,
                FOREIGN KEY(transaction_id) REFERENCES \"transaction\"(id)
                )",
        (),
    )?;

    // Index used by the date-ranged reports.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_ledger_entry_created_at ON ledger_entry(created_at);",
        (),
    )?;

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod database_tests {
    use rusqlite::Connection;

    use crate::{
        db::initialize,
        item::{Item, create_item},
        transaction::{LineRequest, TransactionRequest, TransactionType, apply_transaction},
    };

    use super::{last_ledger_entry, list_ledger_entries};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    /// Applies a stock-in, two sales, a reject, and an adjustment.
    fn apply_mixed_history(conn: &Connection) {
        let item = create_item(
            Item::build("Rice 5kg").cost_price(100).sell_price(150),
            conn,
        )
        .unwrap();

        let requests = [
            TransactionRequest::new(TransactionType::StockIn, vec![LineRequest::new(item.id, 20)]),
            TransactionRequest::new(TransactionType::Sale, vec![LineRequest::new(item.id, 3)]),
            TransactionRequest::new(TransactionType::Reject, vec![LineRequest::new(item.id, 2)]),
            TransactionRequest::new(TransactionType::Sale, vec![LineRequest::new(item.id, 5)]),
            TransactionRequest::new(TransactionType::Adjust, vec![LineRequest::new(item.id, -1)]),
        ];
        for request in requests {
            apply_transaction(request, conn).unwrap();
        }
    }

    #[test]
    fn last_entry_of_empty_ledger_is_none() {
        let conn = get_test_connection();

        assert_eq!(last_ledger_entry(&conn), Ok(None));
    }

    #[test]
    fn last_entry_is_the_most_recent_append() {
        let conn = get_test_connection();
        apply_mixed_history(&conn);

        let entry = last_ledger_entry(&conn).unwrap().unwrap();

        assert_eq!(entry.description, "stock adjustment");
        assert_eq!(entry.id, 5);
    }

    #[test]
    fn running_balance_satisfies_the_fold_invariant() {
        let conn = get_test_connection();
        apply_mixed_history(&conn);

        let entries = list_ledger_entries(&conn).unwrap();
        assert_eq!(entries.len(), 5);

        let mut balance = 0;
        for entry in &entries {
            balance += entry.income - entry.expense;
            assert_eq!(
                entry.balance_after, balance,
                "entry {} broke the running balance",
                entry.id
            );
        }
        // -2000 stock-in + 450 + 750 of sales.
        assert_eq!(balance, -800);
    }

    #[test]
    fn entries_and_transactions_are_one_to_one() {
        let conn = get_test_connection();
        apply_mixed_history(&conn);

        let transaction_count: u32 = conn
            .query_row("SELECT COUNT(*) FROM \"transaction\"", [], |row| row.get(0))
            .unwrap();

        assert_eq!(list_ledger_entries(&conn).unwrap().len() as u32, transaction_count);
    }
}
