//! The paginated ledger statement.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, database_id::LedgerEntryId, pagination::PaginationConfig};

use super::range::ReportRange;

/// The parameters of a statement request.
///
/// The [Default] value covers all time with no text filter, and its zero
/// page/limit clamp to the configured defaults.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StatementQuery {
    /// The time filter.
    pub range: ReportRange,
    /// A case-insensitive substring filter on the entry description.
    pub description_query: Option<String>,
    /// The one-based page to return. Non-positive values clamp to the
    /// default page.
    pub page: i64,
    /// The page size. Non-positive values clamp to the default page size.
    pub limit: i64,
}

/// One row of the statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementRow {
    /// The ledger entry ID.
    pub id: LedgerEntryId,
    /// The entry's creation time.
    pub date: OffsetDateTime,
    /// The entry's description.
    pub description: String,
    /// Cash received.
    pub income: i64,
    /// Cash spent.
    pub expense: i64,
    /// The running balance after the entry.
    pub balance_after: i64,
}

/// One page of the statement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatementPage {
    /// The page that was returned, after clamping.
    pub page: u64,
    /// The page size that was used, after clamping.
    pub limit: u64,
    /// How many rows match the filter across all pages.
    pub total: u64,
    /// The rows of this page, in ascending time order.
    pub rows: Vec<StatementRow>,
}

/// Return one page of the ledger statement.
///
/// # Errors
/// This function will return a [Error::SqlError] if there is an SQL error.
pub fn statement(
    query: StatementQuery,
    config: &PaginationConfig,
    connection: &Connection,
) -> Result<StatementPage, Error> {
    let page = config.clamp_page(query.page);
    let limit = config.clamp_limit(query.limit);
    let offset = (page - 1) * limit;
    let description_query = query.description_query.as_deref();

    let rows = connection
        .prepare(
            "SELECT id, created_at, description, income, expense, balance_after \
            FROM ledger_entry \
            WHERE (?1 IS NULL OR created_at >= ?1) AND (?2 IS NULL OR created_at <= ?2) \
            AND (?3 IS NULL OR description LIKE '%' || ?3 || '%') \
            ORDER BY created_at ASC, id ASC \
            LIMIT ?4 OFFSET ?5",
        )?
        .query_map(
            (query.range.from, query.range.to, description_query, limit as i64, offset as i64),
            map_statement_row,
        )?
        .map(|maybe_row| maybe_row.map_err(Error::SqlError))
        .collect::<Result<Vec<StatementRow>, Error>>()?;

    let total = connection
        .prepare(
            "SELECT COUNT(*) FROM ledger_entry \
            WHERE (?1 IS NULL OR created_at >= ?1) AND (?2 IS NULL OR created_at <= ?2) \
            AND (?3 IS NULL OR description LIKE '%' || ?3 || '%')",
        )?
        .query_row((query.range.from, query.range.to, description_query), |row| {
            row.get::<_, i64>(0).map(|total| total as u64)
        })?;

    Ok(StatementPage {
        page,
        limit,
        total,
        rows,
    })
}

/// Map a database row to a [StatementRow].
fn map_statement_row(row: &Row) -> Result<StatementRow, rusqlite::Error> {
    Ok(StatementRow {
        id: row.get(0)?,
        date: row.get(1)?,
        description: row.get(2)?,
        income: row.get(3)?,
        expense: row.get(4)?,
        balance_after: row.get(5)?,
    })
}
