//! Defines the core data models and database queries for transactions.
//!
//! A transaction owns its lines and its optional payment: the three are
//! written together by the processor and never have independent lifecycles.

use rusqlite::{Connection, Row, types::Type};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    database_id::{DatabaseId, ItemId, TransactionId},
};

// ============================================================================
// MODELS
// ============================================================================

/// The business event a transaction records.
///
/// The set is closed: every rule that varies by type (stock delta sign,
/// ledger income/expense attribution, ledger description) dispatches on this
/// enum so a new type cannot be added without the compiler pointing at every
/// rule table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionType {
    /// Stock received into the store; treated as a cash outflow.
    StockIn,
    /// Stock sold; the only type that produces income.
    Sale,
    /// Stock discarded as damaged or unsellable. Affects stock only.
    Reject,
    /// A manual stock correction, up or down. Affects stock only.
    Adjust,
}

impl TransactionType {
    /// The label stored in the database and reported by the cashflow query.
    pub fn as_str(self) -> &'static str {
        match self {
            TransactionType::StockIn => "STOCK_IN",
            TransactionType::Sale => "SALE",
            TransactionType::Reject => "REJECT",
            TransactionType::Adjust => "ADJUST",
        }
    }

    /// Parse a stored label back into a type.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "STOCK_IN" => Some(TransactionType::StockIn),
            "SALE" => Some(TransactionType::Sale),
            "REJECT" => Some(TransactionType::Reject),
            "ADJUST" => Some(TransactionType::Adjust),
            _ => None,
        }
    }

    /// The signed stock movement a line of this type causes.
    ///
    /// For adjustments the quantity itself may be negative, so the net
    /// effect can decrease stock even though the sign here is positive.
    pub(crate) fn stock_delta(self, qty: i64) -> i64 {
        match self {
            TransactionType::StockIn | TransactionType::Adjust => qty,
            TransactionType::Sale | TransactionType::Reject => -qty,
        }
    }

    /// Whether this type records sell prices and may carry a payment.
    pub fn is_sale(self) -> bool {
        self == TransactionType::Sale
    }
}

/// How a sale was paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    /// Paid in cash.
    Cash,
    /// Paid by bank transfer.
    Transfer,
}

impl PaymentMethod {
    /// The label stored in the database.
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Cash => "CASH",
            PaymentMethod::Transfer => "TRANSFER",
        }
    }

    /// Parse a stored label back into a method.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "CASH" => Some(PaymentMethod::Cash),
            "TRANSFER" => Some(PaymentMethod::Transfer),
            _ => None,
        }
    }
}

/// One business event (stock receipt, sale, reject, adjustment) composed of
/// one or more lines.
///
/// Immutable once created: the core exposes no update or delete operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// The ID of the transaction.
    pub id: TransactionId,
    /// The kind of business event this transaction records.
    pub transaction_type: TransactionType,
    /// When the transaction happened.
    pub date: OffsetDateTime,
    /// An optional free-text note.
    pub note: Option<String>,
    /// The opaque identifier of the actor who created the transaction,
    /// supplied by the authentication collaborator.
    pub created_by: Option<String>,
    /// The item movements, in request order.
    pub lines: Vec<TransactionLine>,
    /// The payment received, only ever present on sales.
    pub payment: Option<Payment>,
}

/// One item-quantity movement within a transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionLine {
    /// The ID of the line.
    pub id: DatabaseId,
    /// The transaction this line belongs to.
    pub transaction_id: TransactionId,
    /// The item moved.
    pub item_id: ItemId,
    /// How many units moved. Sign rules depend on the transaction type.
    pub qty: i64,
    /// The per-unit cost used for this line.
    pub unit_cost: i64,
    /// The per-unit sell price. Only stored for sales.
    pub unit_price: Option<i64>,
    /// `unit_cost x qty`.
    pub subtotal_cost: i64,
    /// `unit_price x qty`. Only stored for sales.
    pub subtotal_sell: Option<i64>,
}

/// The payment attached to a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    /// The ID of the payment.
    pub id: DatabaseId,
    /// The sale this payment belongs to.
    pub transaction_id: TransactionId,
    /// How the sale was paid.
    pub method: PaymentMethod,
    /// The amount received, in the smallest currency unit.
    pub amount: i64,
    /// A bank reference, for transfers.
    pub transfer_ref: Option<String>,
}

// ============================================================================
// DATABASE FUNCTIONS
// ============================================================================

/// Retrieve a transaction with its lines and payment by its `id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `id` does not refer to a valid transaction,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_transaction(id: TransactionId, connection: &Connection) -> Result<Transaction, Error> {
    let mut transaction = connection
        .prepare(
            "SELECT id, transaction_type, date, note, created_by \
            FROM \"transaction\" WHERE id = :id",
        )?
        .query_row(&[(":id", &id)], map_transaction_row)?;

    transaction.lines = get_transaction_lines(id, connection)?;
    transaction.payment = get_payment(id, connection)?;

    Ok(transaction)
}

/// List all transactions, most recent date first, with lines and payments
/// attached.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn list_transactions(connection: &Connection) -> Result<Vec<Transaction>, Error> {
    let mut transactions: Vec<Transaction> = connection
        .prepare(
            "SELECT id, transaction_type, date, note, created_by \
            FROM \"transaction\" ORDER BY date DESC, id DESC",
        )?
        .query_map([], map_transaction_row)?
        .map(|maybe_transaction| maybe_transaction.map_err(Error::SqlError))
        .collect::<Result<_, _>>()?;

    for transaction in &mut transactions {
        transaction.lines = get_transaction_lines(transaction.id, connection)?;
        transaction.payment = get_payment(transaction.id, connection)?;
    }

    Ok(transactions)
}

/// Get the lines of a transaction in request order.
pub(crate) fn get_transaction_lines(
    transaction_id: TransactionId,
    connection: &Connection,
) -> Result<Vec<TransactionLine>, Error> {
    connection
        .prepare(
            "SELECT id, transaction_id, item_id, qty, unit_cost, unit_price, \
            subtotal_cost, subtotal_sell \
            FROM transaction_line WHERE transaction_id = :id ORDER BY id ASC",
        )?
        .query_map(&[(":id", &transaction_id)], map_transaction_line_row)?
        .map(|maybe_line| maybe_line.map_err(Error::SqlError))
        .collect()
}

/// Get the payment attached to a transaction, if any.
pub(crate) fn get_payment(
    transaction_id: TransactionId,
    connection: &Connection,
) -> Result<Option<Payment>, Error> {
    let result = connection
        .prepare(
            "SELECT id, transaction_id, method, amount, transfer_ref \
            FROM payment WHERE transaction_id = :id",
        )?
        .query_row(&[(":id", &transaction_id)], map_payment_row);

    match result {
        Ok(payment) => Ok(Some(payment)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(error) => Err(error.into()),
    }
}

/// Map a database row to a [Transaction] with empty lines and no payment.
///
/// **Note:** the caller is responsible for attaching the child rows.
pub fn map_transaction_row(row: &Row) -> Result<Transaction, rusqlite::Error> {
    let id = row.get(0)?;
    let raw_type: String = row.get(1)?;
    let transaction_type = TransactionType::parse(&raw_type).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            1,
            Type::Text,
            format!("unknown transaction type {raw_type}").into(),
        )
    })?;
    let date = row.get(2)?;
    let note = row.get(3)?;
    let created_by = row.get(4)?;

    Ok(Transaction {
        id,
        transaction_type,
        date,
        note,
        created_by,
        lines: Vec::new(),
        payment: None,
    })
}

/// Map a database row to a [TransactionLine].
pub fn map_transaction_line_row(row: &Row) -> Result<TransactionLine, rusqlite::Error> {
    Ok(TransactionLine {
        id: row.get(0)?,
        transaction_id: row.get(1)?,
        item_id: row.get(2)?,
        qty: row.get(3)?,
        unit_cost: row.get(4)?,
        unit_price: row.get(5)?,
        subtotal_cost: row.get(6)?,
        subtotal_sell: row.get(7)?,
    })
}

/// Map a database row to a [Payment].
pub fn map_payment_row(row: &Row) -> Result<Payment, rusqlite::Error> {
    let raw_method: String = row.get(2)?;
    let method = PaymentMethod::parse(&raw_method).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            2,
            Type::Text,
            format!("unknown payment method {raw_method}").into(),
        )
    })?;

    Ok(Payment {
        id: row.get(0)?,
        transaction_id: row.get(1)?,
        method,
        amount: row.get(3)?,
        transfer_ref: row.get(4)?,
    })
}

/// Create the transaction table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS \"transaction\" (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                transaction_type TEXT NOT NULL,
                date TEXT NOT NULL,
                note TEXT,
                created_by TEXT
                )",
        (),
    )?;

    // Composite index used by the sale-scoped reports.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_type_date \
        ON \"transaction\"(transaction_type, date);",
        (),
    )?;

    Ok(())
}

/// Create the transaction line table in the database.
///
/// `item_id` deliberately carries no enforced foreign key: item removal is
/// owned by the item-management collaborator and historical reporting must
/// survive it.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_transaction_line_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS transaction_line (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                transaction_id INTEGER NOT NULL,
                item_id INTEGER NOT NULL,
                qty INTEGER NOT NULL,
                unit_cost INTEGER NOT NULL,
                unit_price INTEGER,
                subtotal_cost INTEGER NOT NULL,
                subtotal_sell INTEGER,
                FOREIGN KEY(transaction_id) REFERENCES \"transaction\"(id)
                )",
        (),
    )?;

    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_transaction_line_transaction \
        ON transaction_line(transaction_id);",
        (),
    )?;

    Ok(())
}

/// Create the payment table in the database.
///
/// # Errors
/// Returns an error if the table cannot be created or if there is an SQL error.
pub fn create_payment_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS payment (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                transaction_id INTEGER NOT NULL UNIQUE,
                method TEXT NOT NULL,
                amount INTEGER NOT NULL,
                transfer_ref TEXT,
                FOREIGN KEY(transaction_id) REFERENCES \"transaction\"(id)
                )",
        (),
    )?;

    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
