//! Input types for creating transactions, and the validation rules over them.
//!
//! The embedding layer has already checked the request's *shape*; the rules
//! here are the stock-affecting business rules the engine re-checks itself.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, database_id::ItemId};

use super::core::{PaymentMethod, TransactionType};

/// A request to apply one transaction.
///
/// Build with [TransactionRequest::new] and the chained setters:
///
/// ```
/// use stockbook::transaction::{
///     LineRequest, PaymentMethod, PaymentRequest, TransactionRequest, TransactionType,
/// };
///
/// let request = TransactionRequest::new(
///     TransactionType::Sale,
///     vec![LineRequest::new(1, 3)],
/// )
/// .note("walk-in customer")
/// .payment(PaymentRequest::new(PaymentMethod::Cash, 450));
///
/// assert!(request.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRequest {
    /// The kind of business event to record.
    pub transaction_type: TransactionType,
    /// When the transaction happened. Defaults to the current time when
    /// omitted.
    pub date: Option<OffsetDateTime>,
    /// An optional free-text note.
    pub note: Option<String>,
    /// The opaque identifier of the acting user, from the authentication
    /// collaborator.
    pub created_by: Option<String>,
    /// The item movements. Must not be empty.
    pub lines: Vec<LineRequest>,
    /// The payment received. Only allowed on sales.
    pub payment: Option<PaymentRequest>,
}

impl TransactionRequest {
    /// Create a request with the given type and lines and nothing else set.
    pub fn new(transaction_type: TransactionType, lines: Vec<LineRequest>) -> Self {
        Self {
            transaction_type,
            date: None,
            note: None,
            created_by: None,
            lines,
            payment: None,
        }
    }

    /// Set the transaction date.
    pub fn date(mut self, date: OffsetDateTime) -> Self {
        self.date = Some(date);
        self
    }

    /// Set the free-text note.
    pub fn note(mut self, note: &str) -> Self {
        self.note = Some(note.to_owned());
        self
    }

    /// Set the acting user's identifier.
    pub fn created_by(mut self, created_by: &str) -> Self {
        self.created_by = Some(created_by.to_owned());
        self
    }

    /// Attach a payment.
    pub fn payment(mut self, payment: PaymentRequest) -> Self {
        self.payment = Some(payment);
        self
    }

    /// Check the line-quantity rules and the payment gate.
    ///
    /// The rules form a small state machine over the transaction type:
    /// adjustments accept any non-zero quantity (negative quantities shrink
    /// stock); every other type requires a strictly positive quantity; a
    /// payment may only accompany a sale.
    ///
    /// # Errors
    /// This function will return a:
    /// - [Error::EmptyTransaction] if there are no lines,
    /// - [Error::ZeroAdjustQuantity] naming the first adjustment line with a
    ///   zero quantity,
    /// - [Error::NonPositiveQuantity] naming the first line whose quantity
    ///   is not strictly positive,
    /// - or [Error::PaymentNotAllowed] if a payment accompanies a non-sale.
    pub fn validate(&self) -> Result<(), Error> {
        if self.lines.is_empty() {
            return Err(Error::EmptyTransaction);
        }

        if self.payment.is_some() && !self.transaction_type.is_sale() {
            return Err(Error::PaymentNotAllowed);
        }

        for (index, line) in self.lines.iter().enumerate() {
            match self.transaction_type {
                TransactionType::Adjust => {
                    if line.qty == 0 {
                        return Err(Error::ZeroAdjustQuantity(index));
                    }
                }
                TransactionType::StockIn | TransactionType::Sale | TransactionType::Reject => {
                    if line.qty <= 0 {
                        return Err(Error::NonPositiveQuantity(index));
                    }
                }
            }
        }

        Ok(())
    }
}

/// One requested item movement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineRequest {
    /// The item to move.
    pub item_id: ItemId,
    /// How many units to move.
    pub qty: i64,
    /// Override for the item's cost price on this line.
    pub unit_cost: Option<i64>,
    /// Override for the item's sell price on this line.
    pub unit_price: Option<i64>,
}

impl LineRequest {
    /// Create a line that uses the item's stored prices.
    pub fn new(item_id: ItemId, qty: i64) -> Self {
        Self {
            item_id,
            qty,
            unit_cost: None,
            unit_price: None,
        }
    }

    /// Override the cost price for this line.
    pub fn unit_cost(mut self, unit_cost: i64) -> Self {
        self.unit_cost = Some(unit_cost);
        self
    }

    /// Override the sell price for this line.
    pub fn unit_price(mut self, unit_price: i64) -> Self {
        self.unit_price = Some(unit_price);
        self
    }
}

/// A requested payment for a sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    /// How the sale was paid.
    pub method: PaymentMethod,
    /// The amount received.
    pub amount: i64,
    /// A bank reference, for transfers.
    pub transfer_ref: Option<String>,
}

impl PaymentRequest {
    /// Create a payment with no transfer reference.
    pub fn new(method: PaymentMethod, amount: i64) -> Self {
        Self {
            method,
            amount,
            transfer_ref: None,
        }
    }

    /// Set the bank reference.
    pub fn transfer_ref(mut self, transfer_ref: &str) -> Self {
        self.transfer_ref = Some(transfer_ref.to_owned());
        self
    }
}

#[cfg(test)]
mod validate_tests {
    use crate::Error;

    use super::{LineRequest, PaymentMethod, PaymentRequest, TransactionRequest, TransactionType};

    #[test]
    fn accepts_sale_with_payment() {
        let request =
            TransactionRequest::new(TransactionType::Sale, vec![LineRequest::new(1, 3)])
                .payment(PaymentRequest::new(PaymentMethod::Cash, 450));

        assert_eq!(request.validate(), Ok(()));
    }

    #[test]
    fn rejects_empty_lines() {
        let request = TransactionRequest::new(TransactionType::Sale, vec![]);

        assert_eq!(request.validate(), Err(Error::EmptyTransaction));
    }

    #[test]
    fn rejects_zero_adjust_quantity() {
        let request = TransactionRequest::new(
            TransactionType::Adjust,
            vec![LineRequest::new(1, -2), LineRequest::new(2, 0)],
        );

        assert_eq!(request.validate(), Err(Error::ZeroAdjustQuantity(1)));
    }

    #[test]
    fn accepts_negative_adjust_quantity() {
        let request =
            TransactionRequest::new(TransactionType::Adjust, vec![LineRequest::new(1, -4)]);

        assert_eq!(request.validate(), Ok(()));
    }

    #[test]
    fn rejects_non_positive_quantity_for_sales() {
        for qty in [0, -3] {
            let request =
                TransactionRequest::new(TransactionType::Sale, vec![LineRequest::new(1, qty)]);

            assert_eq!(request.validate(), Err(Error::NonPositiveQuantity(0)));
        }
    }

    #[test]
    fn rejects_non_positive_quantity_for_stock_in_and_reject() {
        for transaction_type in [TransactionType::StockIn, TransactionType::Reject] {
            let request =
                TransactionRequest::new(transaction_type, vec![LineRequest::new(1, 0)]);

            assert_eq!(request.validate(), Err(Error::NonPositiveQuantity(0)));
        }
    }

    #[test]
    fn rejects_payment_on_non_sales() {
        for transaction_type in [
            TransactionType::StockIn,
            TransactionType::Reject,
            TransactionType::Adjust,
        ] {
            let request =
                TransactionRequest::new(transaction_type, vec![LineRequest::new(1, 1)])
                    .payment(PaymentRequest::new(PaymentMethod::Transfer, 100));

            assert_eq!(request.validate(), Err(Error::PaymentNotAllowed));
        }
    }
}
