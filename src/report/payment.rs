//! Sales broken down by payment method.

use rusqlite::{Connection, types::Type};
use serde::{Deserialize, Serialize};

use crate::{Error, transaction::PaymentMethod};

use super::range::ReportRange;

/// The amount and number of sales that landed in one payment bucket.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PaymentBucket {
    /// For paid buckets, the payment amounts; for the unpaid bucket, the
    /// sell subtotals of the unpaid sales.
    pub amount: i64,
    /// How many sales landed in the bucket.
    pub count: u32,
}

/// Sales in range bucketed by how they were paid.
///
/// Every sale lands in exactly one bucket, so the three counts sum to the
/// number of sales in range.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PaymentBreakdown {
    /// Sales paid in cash.
    pub cash: PaymentBucket,
    /// Sales paid by bank transfer.
    pub transfer: PaymentBucket,
    /// Sales with no payment attached.
    pub unpaid: PaymentBucket,
}

/// Bucket the sale transactions in range by payment method.
///
/// The range filters on the transaction date.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn payment_breakdown(
    range: ReportRange,
    connection: &Connection,
) -> Result<PaymentBreakdown, Error> {
    let sales: Vec<(Option<PaymentMethod>, Option<i64>, i64)> = connection
        .prepare(
            "SELECT p.method, p.amount, \
            COALESCE((SELECT SUM(subtotal_sell) FROM transaction_line \
                      WHERE transaction_id = t.id), 0) \
            FROM \"transaction\" t \
            LEFT JOIN payment p ON p.transaction_id = t.id \
            WHERE t.transaction_type = 'SALE' \
            AND (?1 IS NULL OR t.date >= ?1) AND (?2 IS NULL OR t.date <= ?2)",
        )?
        .query_map((range.from, range.to), |row| {
            let method = match row.get::<_, Option<String>>(0)? {
                Some(raw) => Some(PaymentMethod::parse(&raw).ok_or_else(|| {
                    rusqlite::Error::FromSqlConversionFailure(
                        0,
                        Type::Text,
                        format!("unknown payment method {raw}").into(),
                    )
                })?),
                None => None,
            };

            Ok((method, row.get(1)?, row.get(2)?))
        })?
        .map(|maybe_sale| maybe_sale.map_err(Error::SqlError))
        .collect::<Result<_, _>>()?;

    let mut breakdown = PaymentBreakdown::default();
    for (method, amount, sale_total) in sales {
        let (bucket, amount) = match method {
            Some(PaymentMethod::Cash) => (&mut breakdown.cash, amount.unwrap_or(0)),
            Some(PaymentMethod::Transfer) => (&mut breakdown.transfer, amount.unwrap_or(0)),
            None => (&mut breakdown.unpaid, sale_total),
        };
        bucket.amount += amount;
        bucket.count += 1;
    }

    Ok(breakdown)
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{
        db::initialize,
        item::{Item, create_item},
        transaction::{
            LineRequest, PaymentMethod, PaymentRequest, TransactionRequest, TransactionType,
            apply_transaction,
        },
    };

    use super::{ReportRange, payment_breakdown};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn seed_sales(conn: &Connection) {
        let item = create_item(Item::build("Rice 5kg").sell_price(150).stock(100), conn).unwrap();

        // Two cash sales, one transfer, one unpaid.
        apply_transaction(
            TransactionRequest::new(TransactionType::Sale, vec![LineRequest::new(item.id, 3)])
                .payment(PaymentRequest::new(PaymentMethod::Cash, 450)),
            conn,
        )
        .unwrap();
        apply_transaction(
            TransactionRequest::new(TransactionType::Sale, vec![LineRequest::new(item.id, 1)])
                .payment(PaymentRequest::new(PaymentMethod::Cash, 150)),
            conn,
        )
        .unwrap();
        apply_transaction(
            TransactionRequest::new(TransactionType::Sale, vec![LineRequest::new(item.id, 2)])
                .payment(
                    PaymentRequest::new(PaymentMethod::Transfer, 300).transfer_ref("TRX-881"),
                ),
            conn,
        )
        .unwrap();
        apply_transaction(
            TransactionRequest::new(TransactionType::Sale, vec![LineRequest::new(item.id, 4)]),
            conn,
        )
        .unwrap();
    }

    #[test]
    fn buckets_cash_transfer_and_unpaid() {
        let conn = get_test_connection();
        seed_sales(&conn);

        let got = payment_breakdown(ReportRange::all(), &conn).unwrap();

        assert_eq!(got.cash.amount, 600);
        assert_eq!(got.cash.count, 2);
        assert_eq!(got.transfer.amount, 300);
        assert_eq!(got.transfer.count, 1);
        assert_eq!(got.unpaid.amount, 600);
        assert_eq!(got.unpaid.count, 1);
    }

    #[test]
    fn bucket_counts_sum_to_the_number_of_sales() {
        let conn = get_test_connection();
        seed_sales(&conn);

        let got = payment_breakdown(ReportRange::all(), &conn).unwrap();

        let sale_count: u32 = conn
            .query_row(
                "SELECT COUNT(*) FROM \"transaction\" WHERE transaction_type = 'SALE'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(got.cash.count + got.transfer.count + got.unpaid.count, sale_count);
    }

    #[test]
    fn unpaid_amount_complements_the_paid_amounts() {
        let conn = get_test_connection();
        seed_sales(&conn);

        let got = payment_breakdown(ReportRange::all(), &conn).unwrap();

        let total_revenue: i64 = conn
            .query_row(
                "SELECT COALESCE(SUM(subtotal_sell), 0) FROM transaction_line",
                [],
                |row| row.get(0),
            )
            .unwrap();
        // Payments exactly cover the paid sales, so unpaid revenue is the
        // remainder.
        assert_eq!(
            got.unpaid.amount,
            total_revenue - got.cash.amount - got.transfer.amount
        );
    }

    #[test]
    fn empty_range_yields_empty_buckets() {
        let conn = get_test_connection();

        let got = payment_breakdown(ReportRange::all(), &conn).unwrap();

        assert_eq!(got.cash.count, 0);
        assert_eq!(got.transfer.count, 0);
        assert_eq!(got.unpaid.count, 0);
    }

    #[test]
    fn non_sale_transactions_never_appear() {
        let conn = get_test_connection();
        let item = create_item(Item::build("Rice 5kg"), &conn).unwrap();
        apply_transaction(
            TransactionRequest::new(
                TransactionType::StockIn,
                vec![LineRequest::new(item.id, 5)],
            ),
            &conn,
        )
        .unwrap();

        let got = payment_breakdown(ReportRange::all(), &conn).unwrap();

        assert_eq!(got.unpaid.count, 0);
    }
}
