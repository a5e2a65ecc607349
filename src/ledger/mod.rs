//! The append-only cash ledger derived from transactions.

mod core;

pub use core::{
    LedgerEntry, create_ledger_entry_table, last_ledger_entry, list_ledger_entries,
    map_ledger_entry_row,
};

pub(crate) use core::append_ledger_entry;
