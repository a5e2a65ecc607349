//! Applies transaction requests: the one write path of the engine.
//!
//! A request is validated, each line's stock movement is checked and
//! persisted, the transaction aggregate (lines and optional payment) is
//! written, and the matching ledger entry is appended, all inside one
//! IMMEDIATE SQL transaction. Any failure at any step rolls the whole unit
//! back, so a rejected request leaves no trace.
//!
//! Callers must serialize invocations through the connection mutex on
//! [crate::AppState]: the "read stock, check, write" and "read last balance,
//! append" sequences are only safe because no two appliers run at once.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};
use time::OffsetDateTime;
use tracing::debug;

use crate::{
    Error,
    database_id::{ItemId, TransactionId},
    item::{get_item, set_item_stock},
    ledger::append_ledger_entry,
};

use super::{
    core::{Payment, Transaction, TransactionLine, TransactionType},
    request::{LineRequest, PaymentRequest, TransactionRequest},
};

/// Apply a transaction request atomically.
///
/// On success the returned [Transaction] carries the persisted lines (with
/// resolved unit costs/prices and computed subtotals) and the payment, if
/// one was attached to a sale.
///
/// # Errors
/// This function will return a:
/// - validation error from [TransactionRequest::validate], raised before any
///   row is touched,
/// - [Error::ItemNotFound] if a line references a missing item,
/// - [Error::InsufficientStock] if a line would drive an item's stock below
///   zero,
/// - or [Error::SqlError] if there is some other SQL error.
///
/// In every error case the database is left exactly as it was.
pub fn apply_transaction(
    request: TransactionRequest,
    connection: &Connection,
) -> Result<Transaction, Error> {
    request.validate()?;

    let sql_transaction =
        SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let transaction_type = request.transaction_type;
    let date = request.date.unwrap_or_else(transaction_timestamp);

    let mut resolved_lines = Vec::with_capacity(request.lines.len());
    for line in &request.lines {
        resolved_lines.push(apply_line(transaction_type, line, &sql_transaction)?);
    }

    let transaction_id = insert_transaction(
        transaction_type,
        date,
        request.note.as_deref(),
        request.created_by.as_deref(),
        &sql_transaction,
    )?;

    let lines = insert_lines(transaction_id, transaction_type, &resolved_lines, &sql_transaction)?;

    let payment = match request.payment {
        Some(payment) => Some(insert_payment(transaction_id, payment, &sql_transaction)?),
        None => None,
    };

    append_ledger_entry(transaction_id, date, transaction_type, &lines, &sql_transaction)?;

    sql_transaction.commit()?;

    debug!(
        id = transaction_id,
        transaction_type = transaction_type.as_str(),
        lines = lines.len(),
        "applied transaction"
    );

    Ok(Transaction {
        id: transaction_id,
        transaction_type,
        date,
        note: request.note,
        created_by: request.created_by,
        lines,
        payment,
    })
}

/// A line with its prices resolved against the item, after the stock write.
struct ResolvedLine {
    item_id: ItemId,
    qty: i64,
    unit_cost: i64,
    unit_price: i64,
}

/// Check and persist one line's stock movement.
fn apply_line(
    transaction_type: TransactionType,
    line: &LineRequest,
    connection: &Connection,
) -> Result<ResolvedLine, Error> {
    let item =
        get_item(line.item_id, connection).map_err(|error| error.missing_item(line.item_id))?;

    let unit_cost = line.unit_cost.unwrap_or(item.cost_price);
    let unit_price = line.unit_price.unwrap_or(item.sell_price);

    let new_stock = item.stock + transaction_type.stock_delta(line.qty);
    if new_stock < 0 {
        return Err(Error::InsufficientStock(item.name));
    }

    set_item_stock(item.id, new_stock, connection)?;

    Ok(ResolvedLine {
        item_id: item.id,
        qty: line.qty,
        unit_cost,
        unit_price,
    })
}

fn insert_transaction(
    transaction_type: TransactionType,
    date: OffsetDateTime,
    note: Option<&str>,
    created_by: Option<&str>,
    connection: &Connection,
) -> Result<TransactionId, Error> {
    connection.execute(
        "INSERT INTO \"transaction\" (transaction_type, date, note, created_by) \
        VALUES (?1, ?2, ?3, ?4)",
        (transaction_type.as_str(), date, note, created_by),
    )?;

    Ok(connection.last_insert_rowid())
}

fn insert_lines(
    transaction_id: TransactionId,
    transaction_type: TransactionType,
    resolved_lines: &[ResolvedLine],
    connection: &Connection,
) -> Result<Vec<TransactionLine>, Error> {
    let is_sale = transaction_type.is_sale();
    let mut lines = Vec::with_capacity(resolved_lines.len());

    for resolved in resolved_lines {
        let unit_price = is_sale.then_some(resolved.unit_price);
        let subtotal_cost = resolved.unit_cost * resolved.qty;
        let subtotal_sell = is_sale.then(|| resolved.unit_price * resolved.qty);

        connection.execute(
            "INSERT INTO transaction_line \
            (transaction_id, item_id, qty, unit_cost, unit_price, subtotal_cost, subtotal_sell) \
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            (
                transaction_id,
                resolved.item_id,
                resolved.qty,
                resolved.unit_cost,
                unit_price,
                subtotal_cost,
                subtotal_sell,
            ),
        )?;

        lines.push(TransactionLine {
            id: connection.last_insert_rowid(),
            transaction_id,
            item_id: resolved.item_id,
            qty: resolved.qty,
            unit_cost: resolved.unit_cost,
            unit_price,
            subtotal_cost,
            subtotal_sell,
        });
    }

    Ok(lines)
}

fn insert_payment(
    transaction_id: TransactionId,
    payment: PaymentRequest,
    connection: &Connection,
) -> Result<Payment, Error> {
    connection.execute(
        "INSERT INTO payment (transaction_id, method, amount, transfer_ref) \
        VALUES (?1, ?2, ?3, ?4)",
        (
            transaction_id,
            payment.method.as_str(),
            payment.amount,
            payment.transfer_ref.as_deref(),
        ),
    )?;

    Ok(Payment {
        id: connection.last_insert_rowid(),
        transaction_id,
        method: payment.method,
        amount: payment.amount,
        transfer_ref: payment.transfer_ref,
    })
}

/// The creation timestamp for a request that did not supply a date.
///
/// Truncated to whole seconds so the stored text sorts in time order
/// alongside caller-supplied dates.
fn transaction_timestamp() -> OffsetDateTime {
    OffsetDateTime::now_utc()
        .replace_nanosecond(0)
        .expect("zero is a valid nanosecond")
}

// ============================================================================
// TESTS
// ============================================================================
