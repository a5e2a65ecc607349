//! Gross profit over sales.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::Error;

use super::range::ReportRange;

/// Sales revenue against the cost of the goods sold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrossProfit {
    /// Total sell subtotals over the sale lines in range.
    pub income: i64,
    /// Cost of goods sold: `qty x unit_cost` summed over the same lines.
    pub cogs: i64,
    /// `income - cogs`.
    pub gross_profit: i64,
    /// `gross_profit / income x 100`, or zero when there was no income.
    pub margin_pct: f64,
}

/// Compute gross profit over the sale transactions in range.
///
/// The range filters on the transaction date.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn gross_profit(range: ReportRange, connection: &Connection) -> Result<GrossProfit, Error> {
    let lines: Vec<(i64, i64, Option<i64>)> = connection
        .prepare(
            "SELECT line.qty, line.unit_cost, line.subtotal_sell \
            FROM transaction_line line \
            INNER JOIN \"transaction\" t ON t.id = line.transaction_id \
            WHERE t.transaction_type = 'SALE' \
            AND (?1 IS NULL OR t.date >= ?1) AND (?2 IS NULL OR t.date <= ?2)",
        )?
        .query_map((range.from, range.to), |row| {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?))
        })?
        .map(|maybe_line| maybe_line.map_err(Error::SqlError))
        .collect::<Result<_, _>>()?;

    let mut income = 0;
    let mut cogs = 0;
    for (qty, unit_cost, subtotal_sell) in lines {
        income += subtotal_sell.unwrap_or(0);
        cogs += qty * unit_cost;
    }

    let gross = income - cogs;
    let margin_pct = if income == 0 {
        0.0
    } else {
        gross as f64 / income as f64 * 100.0
    };

    Ok(GrossProfit {
        income,
        cogs,
        gross_profit: gross,
        margin_pct,
    })
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

    use super::{ReportRange, gross_profit};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    #[test]
    fn computes_income_cogs_and_margin() {
        let conn = get_test_connection();
        let item = create_item(
            Item::build("Rice 5kg").cost_price(100).sell_price(150).stock(20),
            &conn,
        )
        .unwrap();
        apply_transaction(
            TransactionRequest::new(TransactionType::Sale, vec![LineRequest::new(item.id, 4)]),
            &conn,
        )
        .unwrap();

        let got = gross_profit(ReportRange::all(), &conn).unwrap();

        assert_eq!(got.income, 600);
        assert_eq!(got.cogs, 400);
        assert_eq!(got.gross_profit, 200);
        assert!((got.margin_pct - 33.333333333333336).abs() < 1e-9);
    }

    #[test]
    fn margin_is_zero_when_there_is_no_income() {
        let conn = get_test_connection();

        let got = gross_profit(ReportRange::all(), &conn).unwrap();

        assert_eq!(got.income, 0);
        assert_eq!(got.margin_pct, 0.0);
    }

    #[test]
    fn non_sale_transactions_are_ignored() {
        let conn = get_test_connection();
        let item = create_item(Item::build("Rice 5kg").cost_price(100), &conn).unwrap();
        apply_transaction(
            TransactionRequest::new(
                TransactionType::StockIn,
                vec![LineRequest::new(item.id, 10)],
            ),
            &conn,
        )
        .unwrap();

        let got = gross_profit(ReportRange::all(), &conn).unwrap();

        assert_eq!(got.income, 0);
        assert_eq!(got.cogs, 0);
    }

    #[test]
    fn range_filters_on_the_transaction_date() {
        let conn = get_test_connection();
        let item = create_item(
            Item::build("Rice 5kg").cost_price(100).sell_price(150).stock(20),
            &conn,
        )
        .unwrap();
        apply_transaction(
            TransactionRequest::new(TransactionType::Sale, vec![LineRequest::new(item.id, 4)])
                .date(datetime!(2025-03-01 12:00 UTC)),
            &conn,
        )
        .unwrap();
        apply_transaction(
            TransactionRequest::new(TransactionType::Sale, vec![LineRequest::new(item.id, 2)])
                .date(datetime!(2025-04-01 12:00 UTC)),
            &conn,
        )
        .unwrap();

        let got = gross_profit(
            ReportRange::since(datetime!(2025-03-15 00:00 UTC)),
            &conn,
        )
        .unwrap();

        assert_eq!(got.income, 300);
        assert_eq!(got.cogs, 200);
    }
}
