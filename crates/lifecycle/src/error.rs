use rfq_sourcing_evaluation::CriteriaError;
use rfq_sourcing_types::{BidStatus, RfqStatus};
use rust_decimal::Decimal;
use thiserror::Error;

/// An operation was invoked from a status that does not allow it
#[derive(Debug, Error)]
pub enum StateTransitionError {
    #[error("cannot {operation} rfq {rfq_id} in status {status}")]
    RfqStatus {
        operation: &'static str,
        rfq_id: String,
        status: RfqStatus,
    },

    #[error("cannot publish rfq {rfq_id} without invited suppliers")]
    MissingSuppliers { rfq_id: String },

    #[error("cannot publish rfq {rfq_id} without line items")]
    MissingItems { rfq_id: String },

    #[error("cannot {operation} bid {bid_id} in status {status}")]
    BidStatus {
        operation: &'static str,
        bid_id: String,
        status: BidStatus,
    },

    #[error("cannot submit bid {bid_id} without items")]
    EmptyBid { bid_id: String },
}

/// An operation referenced an entity outside the aggregate's legal set
#[derive(Debug, Error)]
pub enum ReferentialError {
    #[error("supplier {supplier_id} is not invited to rfq {rfq_id}")]
    SupplierNotInvited {
        supplier_id: String,
        rfq_id: String,
    },

    #[error("bid {bid_id} does not belong to rfq {rfq_id}")]
    BidRfqMismatch { bid_id: String, rfq_id: String },

    #[error("bid {bid_id} was not submitted by supplier {supplier_id}")]
    BidSupplierMismatch {
        bid_id: String,
        supplier_id: String,
    },

    #[error("bid {bid_id} is not the bid {decision_bid_id} named by the award decision")]
    BidDecisionMismatch {
        bid_id: String,
        decision_bid_id: String,
    },
}

/// A save-time invariant does not hold; blocks any save, not just transitions
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error(transparent)]
    Criteria(#[from] CriteriaError),

    #[error("estimated budget cannot be negative, got {budget}")]
    NegativeBudget { budget: Decimal },

    #[error("delivery date {delivery_date} must be after deadline {deadline}")]
    DeliveryBeforeDeadline {
        deadline: chrono::DateTime<chrono::Utc>,
        delivery_date: chrono::DateTime<chrono::Utc>,
    },

    #[error("bid opening date {bid_opening_date} must not precede deadline {deadline}")]
    BidOpeningBeforeDeadline {
        deadline: chrono::DateTime<chrono::Utc>,
        bid_opening_date: chrono::DateTime<chrono::Utc>,
    },

    #[error("validity period cannot be negative, got {days} days")]
    NegativeValidityPeriod { days: i64 },

    #[error("validity period of {days} days exceeds the maximum of {max}")]
    ValidityPeriodTooLong { days: i64, max: i64 },

    #[error("item {index}: unit price cannot be negative, got {unit_price}")]
    NegativeUnitPrice { index: usize, unit_price: Decimal },

    #[error("item {index}: quantity cannot be negative, got {quantity}")]
    NegativeQuantity { index: usize, quantity: Decimal },
}
