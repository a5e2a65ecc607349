//! The best-selling items by revenue.

use std::collections::HashMap;

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    database_id::ItemId,
    item::get_item,
};

use super::range::ReportRange;

/// The number of items returned when the caller's limit is not positive.
const DEFAULT_LIMIT: i64 = 10;

/// One item's sales totals over a period.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopItem {
    /// The item sold.
    pub item_id: ItemId,
    /// The item's display name, or the raw ID when the item no longer
    /// exists.
    pub name: String,
    /// Total units sold.
    pub qty: i64,
    /// Total sell subtotals.
    pub revenue: i64,
}

/// Rank the items sold in range by revenue, highest first.
///
/// The range filters on the transaction date. A non-positive `limit` falls
/// back to the default of ten.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn top_items(
    limit: i64,
    range: ReportRange,
    connection: &Connection,
) -> Result<Vec<TopItem>, Error> {
    let limit = if limit < 1 { DEFAULT_LIMIT } else { limit };
    let limit = limit as usize;

    let lines: Vec<(ItemId, i64, Option<i64>)> = connection
        .prepare(
            "SELECT line.item_id, line.qty, line.subtotal_sell \
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

    let mut totals: HashMap<ItemId, (i64, i64)> = HashMap::new();
    for (item_id, qty, subtotal_sell) in lines {
        let entry = totals.entry(item_id).or_insert((0, 0));
        entry.0 += qty;
        entry.1 += subtotal_sell.unwrap_or(0);
    }

    let mut ranking: Vec<(ItemId, i64, i64)> = totals
        .into_iter()
        .map(|(item_id, (qty, revenue))| (item_id, qty, revenue))
        .collect();
    // Revenue descending; item ID breaks ties to keep the order stable.
    ranking.sort_by(|a, b| b.2.cmp(&a.2).then(a.0.cmp(&b.0)));
    ranking.truncate(limit);

    ranking
        .into_iter()
        .map(|(item_id, qty, revenue)| {
            let name = match get_item(item_id, connection) {
                Ok(item) => item.name,
                Err(Error::NotFound) => item_id.to_string(),
                Err(error) => return Err(error),
            };

            Ok(TopItem {
                item_id,
                name,
                qty,
                revenue,
            })
        })
        .collect()
}
