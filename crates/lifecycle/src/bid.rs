use chrono::{DateTime, Duration, Utc};
use rfq_sourcing_evaluation::recompute_bid_overall;
use rfq_sourcing_types::{Bid, BidStatus};
use rust_decimal::Decimal;

use crate::{StateTransitionError, ValidationError};

/// Re-derive everything the bid derives from raw inputs and apply the lazy
/// expiry rule. Invoked at the start of every mutating operation.
///
/// - each item's `total = unit_price * quantity`, `total_amount` is their sum
/// - `overall_score` is the sum of weighted evaluation scores
/// - a submitted bid past its validity expiry flips to expired; the flip
///   happens on the next load/save only, never proactively
pub fn recompute_bid(bid: &mut Bid, now: DateTime<Utc>) {
    for item in &mut bid.items {
        item.total = item.unit_price * item.quantity;
    }
    bid.total_amount = bid.items.iter().map(|i| i.total).sum();

    recompute_bid_overall(bid);

    if bid.status == BidStatus::Submitted {
        if let Some(expiry) = bid.validity_expiry {
            if now > expiry {
                bid.status = BidStatus::Expired;
            }
        }
    }
}

/// Save-time invariant checks for a bid
pub fn validate_bid(bid: &Bid) -> Result<(), ValidationError> {
    for (index, item) in bid.items.iter().enumerate() {
        if item.unit_price < Decimal::ZERO {
            return Err(ValidationError::NegativeUnitPrice {
                index,
                unit_price: item.unit_price,
            });
        }
        if item.quantity < Decimal::ZERO {
            return Err(ValidationError::NegativeQuantity {
                index,
                quantity: item.quantity,
            });
        }
    }

    if bid.validity_period_days < 0 {
        return Err(ValidationError::NegativeValidityPeriod {
            days: bid.validity_period_days,
        });
    }

    Ok(())
}

/// `draft -> submitted`. Requires items. Sets the validity expiry to exactly
/// `now + validity_period_days`.
pub fn submit(bid: &mut Bid, by: &str, now: DateTime<Utc>) -> Result<(), StateTransitionError> {
    if bid.status != BidStatus::Draft {
        return Err(StateTransitionError::BidStatus {
            operation: "submit",
            bid_id: bid.id.clone(),
            status: bid.status,
        });
    }
    if bid.items.is_empty() {
        return Err(StateTransitionError::EmptyBid {
            bid_id: bid.id.clone(),
        });
    }

    bid.status = BidStatus::Submitted;
    bid.submitted_by = Some(by.to_string());
    bid.submitted_at = Some(now);
    bid.validity_expiry = Some(now + Duration::days(bid.validity_period_days));
    Ok(())
}

/// `submitted/under_review -> withdrawn`
pub fn withdraw(
    bid: &mut Bid,
    reason: &str,
    now: DateTime<Utc>,
) -> Result<(), StateTransitionError> {
    if !matches!(bid.status, BidStatus::Submitted | BidStatus::UnderReview) {
        return Err(StateTransitionError::BidStatus {
            operation: "withdraw",
            bid_id: bid.id.clone(),
            status: bid.status,
        });
    }

    bid.status = BidStatus::Withdrawn;
    bid.withdrawal_reason = Some(reason.to_string());
    bid.withdrawn_at = Some(now);
    Ok(())
}

/// `submitted -> under_review`
pub fn begin_review(
    bid: &mut Bid,
    _by: &str,
    _now: DateTime<Utc>,
) -> Result<(), StateTransitionError> {
    if bid.status != BidStatus::Submitted {
        return Err(StateTransitionError::BidStatus {
            operation: "review",
            bid_id: bid.id.clone(),
            status: bid.status,
        });
    }

    bid.status = BidStatus::UnderReview;
    Ok(())
}

/// `under_review -> qualified`
pub fn qualify(bid: &mut Bid, _by: &str, _now: DateTime<Utc>) -> Result<(), StateTransitionError> {
    if bid.status != BidStatus::UnderReview {
        return Err(StateTransitionError::BidStatus {
            operation: "qualify",
            bid_id: bid.id.clone(),
            status: bid.status,
        });
    }

    bid.status = BidStatus::Qualified;
    Ok(())
}

/// `any -> disqualified`. Deliberately permissive: unlike every other
/// transition, no status precondition applies here.
pub fn disqualify(bid: &mut Bid, by: &str, reason: &str, now: DateTime<Utc>) {
    bid.status = BidStatus::Disqualified;
    bid.disqualified_by = Some(by.to_string());
    bid.disqualification_reason = Some(reason.to_string());
    bid.disqualified_at = Some(now);
}

/// `qualified -> recommended`
pub fn recommend(
    bid: &mut Bid,
    _by: &str,
    _now: DateTime<Utc>,
) -> Result<(), StateTransitionError> {
    if bid.status != BidStatus::Qualified {
        return Err(StateTransitionError::BidStatus {
            operation: "recommend",
            bid_id: bid.id.clone(),
            status: bid.status,
        });
    }

    bid.status = BidStatus::Recommended;
    Ok(())
}

/// `submitted/under_review/qualified/recommended -> rejected`
pub fn reject(
    bid: &mut Bid,
    by: &str,
    reason: &str,
    now: DateTime<Utc>,
) -> Result<(), StateTransitionError> {
    if !matches!(
        bid.status,
        BidStatus::Submitted | BidStatus::UnderReview | BidStatus::Qualified | BidStatus::Recommended
    ) {
        return Err(StateTransitionError::BidStatus {
            operation: "reject",
            bid_id: bid.id.clone(),
            status: bid.status,
        });
    }

    bid.status = BidStatus::Rejected;
    bid.rejected_by = Some(by.to_string());
    bid.rejection_reason = Some(reason.to_string());
    bid.rejected_at = Some(now);
    Ok(())
}

/// `recommended -> awarded`
pub fn award_bid(
    bid: &mut Bid,
    by: &str,
    amount: Decimal,
    contract_terms: Option<String>,
    now: DateTime<Utc>,
) -> Result<(), StateTransitionError> {
    if bid.status != BidStatus::Recommended {
        return Err(StateTransitionError::BidStatus {
            operation: "award",
            bid_id: bid.id.clone(),
            status: bid.status,
        });
    }

    bid.status = BidStatus::Awarded;
    bid.award_amount = Some(amount);
    bid.awarded_by = Some(by.to_string());
    bid.awarded_at = Some(now);
    bid.contract_terms = contract_terms;
    Ok(())
}
