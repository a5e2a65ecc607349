//! Transaction management for the inventory engine.
//!
//! This module contains everything related to transactions:
//! - The request types and the line-quantity validation rules
//! - The `Transaction`/`TransactionLine`/`Payment` models and their queries
//! - The processor that applies a request atomically and appends the
//!   matching ledger entry

mod core;
mod processor;
mod request;

pub use core::{
    Payment, PaymentMethod, Transaction, TransactionLine, TransactionType,
    create_payment_table, create_transaction_line_table, create_transaction_table,
    get_transaction, list_transactions, map_payment_row, map_transaction_line_row,
    map_transaction_row,
};
pub use processor::apply_transaction;
pub use request::{LineRequest, PaymentRequest, TransactionRequest};
