//! Time-bucketed cashflow trend.

use std::collections::HashMap;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::{Date, Duration};

use crate::Error;

use super::range::{ReportRange, ledger_entries_in_range};

/// The calendar interval to bucket ledger entries by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendInterval {
    /// One bucket per calendar day, keyed `YYYY-MM-DD`.
    Day,
    /// One bucket per ISO week, keyed by the `YYYY-MM-DD` of its Monday.
    Week,
    /// One bucket per calendar month, keyed `YYYY-MM`.
    Month,
}

impl TrendInterval {
    /// The bucket key for a calendar date.
    fn bucket_key(self, date: Date) -> String {
        match self {
            TrendInterval::Day => date.to_string(),
            TrendInterval::Week => {
                let days_past_monday = date.weekday().number_days_from_monday();
                (date - Duration::days(days_past_monday as i64)).to_string()
            }
            TrendInterval::Month => {
                format!("{:04}-{:02}", date.year(), u8::from(date.month()))
            }
        }
    }
}

/// One bucket of the trend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    /// The bucket key; see [TrendInterval] for the key formats.
    pub period: String,
    /// Total income of the entries in the bucket.
    pub income: i64,
    /// Total expense of the entries in the bucket.
    pub expense: i64,
    /// `income - expense`.
    pub net: i64,
    /// The running balance after the bucket's last entry.
    pub balance: i64,
}

/// Bucket the in-range ledger entries by the given interval, in ascending
/// time order.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn trend(
    interval: TrendInterval,
    range: ReportRange,
    connection: &Connection,
) -> Result<Vec<TrendPoint>, Error> {
    let entries = ledger_entries_in_range(range, connection)?;

    let mut points: Vec<TrendPoint> = Vec::new();
    let mut index_by_period: HashMap<String, usize> = HashMap::new();

    for entry in entries {
        let period = interval.bucket_key(entry.created_at.date());
        let index = *index_by_period.entry(period.clone()).or_insert_with(|| {
            points.push(TrendPoint {
                period,
                income: 0,
                expense: 0,
                net: 0,
                balance: 0,
            });
            points.len() - 1
        });

        let point = &mut points[index];
        point.income += entry.income;
        point.expense += entry.expense;
        point.net = point.income - point.expense;
        // Entries arrive in time order, so this ends up as the bucket's
        // last balance.
        point.balance = entry.balance_after;
    }

    Ok(points)
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::{OffsetDateTime, macros::datetime};

    use crate::{
        db::initialize,
        item::{Item, create_item},
        transaction::{LineRequest, TransactionRequest, TransactionType, apply_transaction},
    };

    use super::{ReportRange, TrendInterval, trend};

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn stock_in_on(date: OffsetDateTime, qty: i64, conn: &Connection) {
        let item = create_item(Item::build("Rice 5kg").cost_price(100), conn).unwrap();
        apply_transaction(
            TransactionRequest::new(TransactionType::StockIn, vec![LineRequest::new(item.id, qty)])
                .date(date),
            conn,
        )
        .unwrap();
    }

    #[test]
    fn daily_buckets_are_keyed_by_calendar_day() {
        let conn = get_test_connection();
        stock_in_on(datetime!(2025-04-01 08:00 UTC), 1, &conn);
        stock_in_on(datetime!(2025-04-01 17:00 UTC), 2, &conn);
        stock_in_on(datetime!(2025-04-02 09:00 UTC), 3, &conn);

        let got = trend(TrendInterval::Day, ReportRange::all(), &conn).unwrap();

        let periods: Vec<&str> = got.iter().map(|point| point.period.as_str()).collect();
        assert_eq!(periods, ["2025-04-01", "2025-04-02"]);
        assert_eq!(got[0].expense, 300);
        assert_eq!(got[1].expense, 300);
    }

    #[test]
    fn weekly_buckets_are_keyed_by_their_monday() {
        let conn = get_test_connection();
        // 2025-04-02 is a Wednesday; 2025-04-07 is the following Monday.
        stock_in_on(datetime!(2025-04-02 12:00 UTC), 1, &conn);
        stock_in_on(datetime!(2025-04-07 12:00 UTC), 1, &conn);

        let got = trend(TrendInterval::Week, ReportRange::all(), &conn).unwrap();

        let periods: Vec<&str> = got.iter().map(|point| point.period.as_str()).collect();
        assert_eq!(periods, ["2025-03-31", "2025-04-07"]);
    }

    #[test]
    fn a_monday_keys_its_own_week() {
        let conn = get_test_connection();
        stock_in_on(datetime!(2025-04-07 00:00 UTC), 1, &conn);

        let got = trend(TrendInterval::Week, ReportRange::all(), &conn).unwrap();

        assert_eq!(got[0].period, "2025-04-07");
    }

    #[test]
    fn monthly_buckets_are_keyed_year_dash_month() {
        let conn = get_test_connection();
        stock_in_on(datetime!(2025-11-28 12:00 UTC), 1, &conn);
        stock_in_on(datetime!(2025-12-01 12:00 UTC), 1, &conn);

        let got = trend(TrendInterval::Month, ReportRange::all(), &conn).unwrap();

        let periods: Vec<&str> = got.iter().map(|point| point.period.as_str()).collect();
        assert_eq!(periods, ["2025-11", "2025-12"]);
    }

    #[test]
    fn bucket_balance_is_the_last_entry_balance() {
        let conn = get_test_connection();
        let item = create_item(
            Item::build("Rice 5kg").cost_price(100).sell_price(150),
            &conn,
        )
        .unwrap();
        apply_transaction(
            TransactionRequest::new(
                TransactionType::StockIn,
                vec![LineRequest::new(item.id, 10)],
            )
            .date(datetime!(2025-04-01 08:00 UTC)),
            &conn,
        )
        .unwrap();
        apply_transaction(
            TransactionRequest::new(TransactionType::Sale, vec![LineRequest::new(item.id, 2)])
                .date(datetime!(2025-04-01 18:00 UTC)),
            &conn,
        )
        .unwrap();

        let got = trend(TrendInterval::Day, ReportRange::all(), &conn).unwrap();

        assert_eq!(got.len(), 1);
        assert_eq!(got[0].income, 300);
        assert_eq!(got[0].expense, 1000);
        assert_eq!(got[0].net, -700);
        assert_eq!(got[0].balance, -700);
    }
}
