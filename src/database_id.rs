//! Database ID type definitions.

/// Alias for the integer type used for mapping to database IDs.
pub type DatabaseId = i64;

/// The ID of an item row.
pub type ItemId = i64;
/// The ID of a transaction row.
pub type TransactionId = i64;
/// The ID of a ledger entry row.
pub type LedgerEntryId = i64;
