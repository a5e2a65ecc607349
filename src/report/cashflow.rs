//! Cashflow grouped by transaction type.

use std::collections::HashMap;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::Error;

use super::range::ReportRange;

/// The cash moved by one transaction type over a period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashflowGroup {
    /// The transaction type label, or `"OTHER"` for ledger entries whose
    /// transaction could not be resolved.
    pub transaction_type: String,
    /// Total income of the group.
    pub income: i64,
    /// Total expense of the group.
    pub expense: i64,
    /// `income - expense`.
    pub net: i64,
}

/// Group the in-range ledger entries by their originating transaction's
/// type.
///
/// Groups appear in the order their first entry appears in the ledger.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn cashflow_by_type(
    range: ReportRange,
    connection: &Connection,
) -> Result<Vec<CashflowGroup>, Error> {
    let rows: Vec<(Option<String>, i64, i64)> = connection
        .prepare(
            "SELECT t.transaction_type, entry.income, entry.expense \
            FROM ledger_entry entry \
            LEFT JOIN \"transaction\" t ON t.id = entry.transaction_id \
            WHERE (?1 IS NULL OR entry.created_at >= ?1) \
            AND (?2 IS NULL OR entry.created_at <= ?2) \
            ORDER BY entry.created_at ASC, entry.id ASC",
        )?
        .query_map((range.from, range.to), |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })?
        .map(|maybe_row| maybe_row.map_err(Error::SqlError))
        .collect::<Result<_, _>>()?;

    let mut groups: Vec<CashflowGroup> = Vec::new();
    let mut index_by_type: HashMap<String, usize> = HashMap::new();

    for (transaction_type, income, expense) in rows {
        let label = transaction_type.unwrap_or_else(|| "OTHER".to_owned());
        let index = *index_by_type.entry(label.clone()).or_insert_with(|| {
            groups.push(CashflowGroup {
                transaction_type: label,
                income: 0,
                expense: 0,
                net: 0,
            });
            groups.len() - 1
        });

        let group = &mut groups[index];
        group.income += income;
        group.expense += expense;
        group.net = group.income - group.expense;
    }

    Ok(groups)
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::macros::datetime;

    use crate::{
        db::initialize,
        item::{Item, create_item},
        transaction::{LineRequest, TransactionRequest, TransactionType, apply_transaction},
    };

    use super::{CashflowGroup, ReportRange, cashflow_by_type};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn groups_by_transaction_type() {
        let conn = get_test_connection();
        let item = create_item(
            Item::build("Rice 5kg").cost_price(100).sell_price(150),
            &conn,
        )
        .unwrap();
        let day = datetime!(2025-04-01 09:00 UTC);
        for (transaction_type, qty) in [
            (TransactionType::StockIn, 10),
            (TransactionType::Sale, 2),
            (TransactionType::Sale, 3),
            (TransactionType::Reject, 1),
        ] {
            apply_transaction(
                TransactionRequest::new(transaction_type, vec![LineRequest::new(item.id, qty)])
                    .date(day),
                &conn,
            )
            .unwrap();
        }

        let got = cashflow_by_type(ReportRange::all(), &conn).unwrap();

        assert_eq!(
            got,
            vec![
                CashflowGroup {
                    transaction_type: "STOCK_IN".to_owned(),
                    income: 0,
                    expense: 1000,
                    net: -1000,
                },
                CashflowGroup {
                    transaction_type: "SALE".to_owned(),
                    income: 750,
                    expense: 0,
                    net: 750,
                },
                CashflowGroup {
                    transaction_type: "REJECT".to_owned(),
                    income: 0,
                    expense: 0,
                    net: 0,
                },
            ]
        );
    }

    #[test]
    fn unresolvable_transactions_group_under_other() {
        let conn = get_test_connection();
        let item = create_item(Item::build("Rice 5kg").sell_price(150).stock(5), &conn).unwrap();
        let applied = apply_transaction(
            TransactionRequest::new(TransactionType::Sale, vec![LineRequest::new(item.id, 1)]),
            &conn,
        )
        .unwrap();
        // Simulate an out-of-band purge of the transaction row; the core
        // itself never deletes transactions.
        conn.execute("DELETE FROM \"transaction\" WHERE id = ?1", [applied.id])
            .unwrap();

        let got = cashflow_by_type(ReportRange::all(), &conn).unwrap();

        assert_eq!(got.len(), 1);
        assert_eq!(got[0].transaction_type, "OTHER");
        assert_eq!(got[0].income, 150);
    }

    #[test]
    fn empty_range_yields_no_groups() {
        let conn = get_test_connection();

        let got = cashflow_by_type(ReportRange::all(), &conn).unwrap();

        assert_eq!(got, vec![]);
    }
}
