//! Date-range filtering shared by the reporting queries.

use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    Error,
    ledger::{LedgerEntry, map_ledger_entry_row},
};

/// An inclusive `[from, to]` time filter with both bounds optional.
///
/// An unset bound is unbounded, so [ReportRange::default] covers all time.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ReportRange {
    /// Entries strictly before this instant are excluded.
    pub from: Option<OffsetDateTime>,
    /// Entries strictly after this instant are excluded.
    pub to: Option<OffsetDateTime>,
}

impl ReportRange {
    /// A range covering all time.
    pub fn all() -> Self {
        Self::default()
    }

    /// A range bounded on both sides.
    pub fn between(from: OffsetDateTime, to: OffsetDateTime) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    /// A range with only a lower bound.
    pub fn since(from: OffsetDateTime) -> Self {
        Self {
            from: Some(from),
            to: None,
        }
    }

    /// A range with only an upper bound.
    pub fn until(to: OffsetDateTime) -> Self {
        Self {
            from: None,
            to: Some(to),
        }
    }
}

/// Get the ledger entries in range, in ascending time order (entry ID breaks
/// ties so the order is total).
pub(crate) fn ledger_entries_in_range(
    range: ReportRange,
    connection: &Connection,
) -> Result<Vec<LedgerEntry>, Error> {
    connection
        .prepare(
            "SELECT id, transaction_id, created_at, description, income, expense, balance_after \
            FROM ledger_entry \
            WHERE (?1 IS NULL OR created_at >= ?1) AND (?2 IS NULL OR created_at <= ?2) \
            ORDER BY created_at ASC, id ASC",
        )?
        .query_map((range.from, range.to), map_ledger_entry_row)?
        .map(|maybe_entry| maybe_entry.map_err(Error::SqlError))
        .collect()
}
