//! The headline cash totals for a period.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{Error, item::stock_capital};

use super::range::{ReportRange, ledger_entries_in_range};

/// The cash position over a period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    /// Total income over the ledger entries in range.
    pub income: i64,
    /// Total expense over the ledger entries in range.
    pub expense: i64,
    /// `income - expense`.
    pub net_cash: i64,
    /// The running balance after the last entry in range, or zero when the
    /// range is empty.
    pub ending_balance: i64,
    /// The capital tied up in stock right now (`stock x cost_price` summed
    /// over all items). A snapshot: deliberately not date-filtered.
    pub stock_capital: i64,
}

/// Summarize the ledger over the given range.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn summary(range: ReportRange, connection: &Connection) -> Result<Summary, Error> {
    let entries = ledger_entries_in_range(range, connection)?;

    let income = entries.iter().map(|entry| entry.income).sum::<i64>();
    let expense = entries.iter().map(|entry| entry.expense).sum::<i64>();
    let ending_balance = entries.last().map(|entry| entry.balance_after).unwrap_or(0);

    Ok(Summary {
        income,
        expense,
        net_cash: income - expense,
        ending_balance,
        stock_capital: stock_capital(connection)?,
    })
}
