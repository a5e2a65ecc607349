//! Read-only aggregate queries over the ledger and transaction data.
//!
//! Every query takes an optional `[from, to]` date filter and returns a
//! plain value; none mutate state, and an empty range yields zero totals or
//! empty lists rather than an error.

mod cashflow;
mod gross_profit;
mod payment;
mod range;
mod statement;
mod summary;
mod top_items;
mod trend;

pub use cashflow::{CashflowGroup, cashflow_by_type};
pub use gross_profit::{GrossProfit, gross_profit};
pub use payment::{PaymentBreakdown, PaymentBucket, payment_breakdown};
pub use range::ReportRange;
pub use statement::{StatementPage, StatementQuery, StatementRow, statement};
pub use summary::{Summary, summary};
pub use top_items::{TopItem, top_items};
pub use trend::{TrendInterval, TrendPoint, trend};
