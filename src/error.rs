//! Defines the app level error type and the conversion from SQL errors.

use crate::database_id::ItemId;

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// A transaction request was submitted without any lines.
    #[error("a transaction must contain at least one line")]
    EmptyTransaction,

    /// An adjustment line had a quantity of zero, which would move no stock.
    ///
    /// The offending line index (zero-based) is included so the caller can
    /// point at the exact line in the request.
    #[error("line {0}: quantity must not be zero for a stock adjustment")]
    ZeroAdjustQuantity(usize),

    /// A sale, stock-in, or reject line had a quantity that was not strictly
    /// positive.
    #[error("line {0}: quantity must be greater than zero")]
    NonPositiveQuantity(usize),

    /// A payment was attached to a transaction type other than a sale.
    #[error("payment is only allowed on sale transactions")]
    PaymentNotAllowed,

    /// A transaction line referenced an item that does not exist.
    ///
    /// The whole request is aborted; no stock is mutated and no ledger entry
    /// is appended.
    #[error("item {0} could not be found")]
    ItemNotFound(ItemId),

    /// Applying a line would have driven the named item's stock below zero.
    ///
    /// The whole request is aborted, including lines that were applied
    /// earlier in the same request.
    #[error("stock not enough for {0}")]
    InsufficientStock(String),

    /// An item was created with a negative price or stock count.
    #[error("item prices and stock must not be negative")]
    NegativeItemValue,

    /// The requested resource could not be found.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// Could not acquire the database lock.
    #[error("could not acquire the database lock")]
    DatabaseLock,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl Error {
    /// Convert a lookup miss into a typed "unknown item" error.
    ///
    /// Lookups report [Error::NotFound]; inside the transaction processor a
    /// missing row is always an item referenced by a request line, so the
    /// item ID is worth naming.
    pub(crate) fn missing_item(self, item_id: ItemId) -> Error {
        match self {
            Error::NotFound => Error::ItemNotFound(item_id),
            error => error,
        }
    }
}
