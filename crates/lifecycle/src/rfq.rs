use chrono::{DateTime, Duration, Utc};
use rfq_sourcing_evaluation::validate_criteria_weights;
use rfq_sourcing_types::{Rfq, RfqStatus};
use rust_decimal::Decimal;

use crate::{ReferentialError, StateTransitionError, ValidationError};

/// Apply the lazy time-driven transitions to an RFQ. Invoked at the start of
/// every mutating operation; the flip persists with that operation's save.
///
/// - published/open past the deadline closes the RFQ (`closed_by` stays
///   empty, nobody closed it)
/// - closed past the validity window expires it; awarded and cancelled RFQs
///   never expire
pub fn recompute_rfq(rfq: &mut Rfq, now: DateTime<Utc>) {
    if matches!(rfq.status, RfqStatus::Published | RfqStatus::Open) && now > rfq.deadline {
        rfq.status = RfqStatus::Closed;
        rfq.closed_at = Some(now);
    }

    if rfq.status == RfqStatus::Closed {
        if let Some(closed_at) = rfq.closed_at {
            if now > closed_at + Duration::days(rfq.validity_period_days) {
                rfq.status = RfqStatus::Expired;
            }
        }
    }
}

/// Save-time invariant checks. A violation blocks any save, not just the
/// transition that triggered it.
pub fn validate_rfq(rfq: &Rfq, weight_tolerance: Decimal) -> Result<(), ValidationError> {
    validate_criteria_weights(&rfq.evaluation_criteria, weight_tolerance)?;

    if rfq.estimated_budget < Decimal::ZERO {
        return Err(ValidationError::NegativeBudget {
            budget: rfq.estimated_budget,
        });
    }

    if rfq.delivery_date <= rfq.deadline {
        return Err(ValidationError::DeliveryBeforeDeadline {
            deadline: rfq.deadline,
            delivery_date: rfq.delivery_date,
        });
    }

    if let Some(bid_opening_date) = rfq.bid_opening_date {
        if bid_opening_date < rfq.deadline {
            return Err(ValidationError::BidOpeningBeforeDeadline {
                deadline: rfq.deadline,
                bid_opening_date,
            });
        }
    }

    if rfq.validity_period_days < 0 {
        return Err(ValidationError::NegativeValidityPeriod {
            days: rfq.validity_period_days,
        });
    }

    for (index, item) in rfq.items.iter().enumerate() {
        if item.quantity < Decimal::ZERO {
            return Err(ValidationError::NegativeQuantity {
                index,
                quantity: item.quantity,
            });
        }
    }

    Ok(())
}

/// `draft -> published`. Requires invited suppliers and line items.
pub fn publish(rfq: &mut Rfq, by: &str, now: DateTime<Utc>) -> Result<(), StateTransitionError> {
    if rfq.status != RfqStatus::Draft {
        return Err(StateTransitionError::RfqStatus {
            operation: "publish",
            rfq_id: rfq.id.clone(),
            status: rfq.status,
        });
    }
    if rfq.suppliers.is_empty() {
        return Err(StateTransitionError::MissingSuppliers {
            rfq_id: rfq.id.clone(),
        });
    }
    if rfq.items.is_empty() {
        return Err(StateTransitionError::MissingItems {
            rfq_id: rfq.id.clone(),
        });
    }

    rfq.status = RfqStatus::Published;
    rfq.published_by = Some(by.to_string());
    rfq.published_at = Some(now);
    Ok(())
}

/// `published/open -> closed`
pub fn close(rfq: &mut Rfq, by: &str, now: DateTime<Utc>) -> Result<(), StateTransitionError> {
    if !matches!(rfq.status, RfqStatus::Published | RfqStatus::Open) {
        return Err(StateTransitionError::RfqStatus {
            operation: "close",
            rfq_id: rfq.id.clone(),
            status: rfq.status,
        });
    }

    rfq.status = RfqStatus::Closed;
    rfq.closed_by = Some(by.to_string());
    rfq.closed_at = Some(now);
    Ok(())
}

/// `closed -> under_evaluation`
pub fn start_evaluation(
    rfq: &mut Rfq,
    _by: &str,
    _now: DateTime<Utc>,
) -> Result<(), StateTransitionError> {
    if rfq.status != RfqStatus::Closed {
        return Err(StateTransitionError::RfqStatus {
            operation: "start evaluation of",
            rfq_id: rfq.id.clone(),
            status: rfq.status,
        });
    }

    rfq.status = RfqStatus::UnderEvaluation;
    Ok(())
}

/// `any non-terminal -> cancelled`
pub fn cancel(
    rfq: &mut Rfq,
    by: &str,
    reason: &str,
    now: DateTime<Utc>,
) -> Result<(), StateTransitionError> {
    if rfq.is_terminal() {
        return Err(StateTransitionError::RfqStatus {
            operation: "cancel",
            rfq_id: rfq.id.clone(),
            status: rfq.status,
        });
    }

    rfq.status = RfqStatus::Cancelled;
    rfq.cancelled_by = Some(by.to_string());
    rfq.cancelled_at = Some(now);
    rfq.cancellation_reason = Some(reason.to_string());
    Ok(())
}

/// `closed/under_evaluation -> awarded`. The supplier must be in the invited
/// set. Savings are filled by the award calculator after this transition.
pub fn award_rfq(
    rfq: &mut Rfq,
    supplier_id: &str,
    bid_id: &str,
    by: &str,
    amount: Decimal,
    now: DateTime<Utc>,
) -> Result<(), AwardRfqError> {
    if !matches!(rfq.status, RfqStatus::Closed | RfqStatus::UnderEvaluation) {
        return Err(StateTransitionError::RfqStatus {
            operation: "award",
            rfq_id: rfq.id.clone(),
            status: rfq.status,
        }
        .into());
    }
    if !rfq.is_invited(supplier_id) {
        return Err(ReferentialError::SupplierNotInvited {
            supplier_id: supplier_id.to_string(),
            rfq_id: rfq.id.clone(),
        }
        .into());
    }

    rfq.status = RfqStatus::Awarded;
    rfq.awarded_to = Some(supplier_id.to_string());
    rfq.awarded_bid = Some(bid_id.to_string());
    rfq.awarded_by = Some(by.to_string());
    rfq.awarded_at = Some(now);
    rfq.actual_award_amount = Some(amount);
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum AwardRfqError {
    #[error(transparent)]
    StateTransition(#[from] StateTransitionError),
    #[error(transparent)]
    Referential(#[from] ReferentialError),
}
