//! Award finalization. Validates every precondition across both aggregates
//! before mutating either, then applies the RFQ and bid award transitions
//! and fills the savings figures, so a caller persisting both under its
//! per-aggregate locks gets an atomic-in-effect award.

use chrono::{DateTime, Utc};
use rfq_sourcing_lifecycle::{
    award_bid, award_rfq, AwardRfqError, ReferentialError, StateTransitionError,
};
use rfq_sourcing_types::{Bid, BidStatus, Rfq, RfqStatus};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum AwardError {
    #[error(transparent)]
    StateTransition(#[from] StateTransitionError),

    #[error(transparent)]
    Referential(#[from] ReferentialError),

    #[error("award amount must be positive, got {amount}")]
    NonPositiveAmount { amount: Decimal },
}

impl From<AwardRfqError> for AwardError {
    fn from(e: AwardRfqError) -> Self {
        match e {
            AwardRfqError::StateTransition(e) => AwardError::StateTransition(e),
            AwardRfqError::Referential(e) => AwardError::Referential(e),
        }
    }
}

/// The caller's award choice
#[derive(Debug, Clone)]
pub struct AwardDecision {
    pub supplier_id: String,
    pub bid_id: String,
    pub awarded_by: String,
    pub amount: Decimal,
    pub contract_terms: Option<String>,
}

/// Cost-savings figures derived from the estimated budget and the award
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Savings {
    pub cost_savings: Decimal,

    /// Absent when the estimated budget is zero
    pub savings_percentage: Option<Decimal>,
}

/// `cost_savings = estimated_budget - actual_award_amount`;
/// `savings_percentage = cost_savings / estimated_budget * 100`, undefined
/// for a zero budget.
pub fn compute_savings(estimated_budget: Decimal, actual_award_amount: Decimal) -> Savings {
    let cost_savings = estimated_budget - actual_award_amount;
    let savings_percentage = if estimated_budget.is_zero() {
        None
    } else {
        Some(cost_savings / estimated_budget * Decimal::ONE_HUNDRED)
    };
    Savings {
        cost_savings,
        savings_percentage,
    }
}

/// Defensive recompute: whenever an RFQ is awarded and both inputs are
/// present, re-derive the savings fields. Idempotent.
pub fn reapply_savings(rfq: &mut Rfq) {
    if rfq.status != RfqStatus::Awarded {
        return;
    }
    if let Some(amount) = rfq.actual_award_amount {
        let savings = compute_savings(rfq.estimated_budget, amount);
        rfq.cost_savings = Some(savings.cost_savings);
        rfq.savings_percentage = savings.savings_percentage;
    }
}

/// Finalize the award across both aggregates.
///
/// All preconditions are checked up front: the RFQ must be closed or under
/// evaluation, the supplier invited, the bid recommended, and the bid must
/// belong to this RFQ and this supplier and be the one the decision names. Only then are both transitions
/// applied and the savings filled in. The caller persists both aggregates.
pub fn prepare_award(
    rfq: &mut Rfq,
    bid: &mut Bid,
    decision: &AwardDecision,
    now: DateTime<Utc>,
) -> Result<Savings, AwardError> {
    if !matches!(rfq.status, RfqStatus::Closed | RfqStatus::UnderEvaluation) {
        return Err(StateTransitionError::RfqStatus {
            operation: "award",
            rfq_id: rfq.id.clone(),
            status: rfq.status,
        }
        .into());
    }
    if !rfq.is_invited(&decision.supplier_id) {
        return Err(ReferentialError::SupplierNotInvited {
            supplier_id: decision.supplier_id.clone(),
            rfq_id: rfq.id.clone(),
        }
        .into());
    }
    if bid.rfq_id != rfq.id {
        return Err(ReferentialError::BidRfqMismatch {
            bid_id: bid.id.clone(),
            rfq_id: rfq.id.clone(),
        }
        .into());
    }
    if bid.supplier_id != decision.supplier_id {
        return Err(ReferentialError::BidSupplierMismatch {
            bid_id: bid.id.clone(),
            supplier_id: decision.supplier_id.clone(),
        }
        .into());
    }
    if bid.id != decision.bid_id {
        return Err(ReferentialError::BidDecisionMismatch {
            bid_id: bid.id.clone(),
            decision_bid_id: decision.bid_id.clone(),
        }
        .into());
    }
    if bid.status != BidStatus::Recommended {
        return Err(StateTransitionError::BidStatus {
            operation: "award",
            bid_id: bid.id.clone(),
            status: bid.status,
        }
        .into());
    }
    if decision.amount <= Decimal::ZERO {
        return Err(AwardError::NonPositiveAmount {
            amount: decision.amount,
        });
    }

    award_rfq(
        rfq,
        &decision.supplier_id,
        &decision.bid_id,
        &decision.awarded_by,
        decision.amount,
        now,
    )?;
    award_bid(
        bid,
        &decision.awarded_by,
        decision.amount,
        decision.contract_terms.clone(),
        now,
    )?;

    let savings = compute_savings(rfq.estimated_budget, decision.amount);
    rfq.cost_savings = Some(savings.cost_savings);
    rfq.savings_percentage = savings.savings_percentage;

    info!(
        rfq_number = %rfq.rfq_number,
        bid_number = %bid.bid_number,
        supplier_id = %decision.supplier_id,
        amount = %decision.amount,
        cost_savings = %savings.cost_savings,
        "rfq awarded"
    );

    Ok(savings)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rfq_sourcing_types::{BidItem, Compliance, RfqItem};

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 4, d, 0, 0, 0).unwrap()
    }

    fn make_awardable_pair() -> (Rfq, Bid) {
        let mut rfq = Rfq::builder()
            .title("Servers")
            .estimated_budget(Decimal::from(100_000))
            .deadline(day(10))
            .delivery_date(day(20))
            .supplier("supplier-1")
            .item(RfqItem {
                requisition_item_id: None,
                description: "Rack server".to_string(),
                quantity: Decimal::from(10),
                unit: None,
                category_id: None,
            })
            .build(day(1))
            .unwrap();
        rfq.id = "rfq-1".to_string();
        rfq.status = RfqStatus::UnderEvaluation;

        let mut bid = Bid::builder()
            .rfq_id("rfq-1")
            .supplier_id("supplier-1")
            .item(BidItem::new(
                "Rack server",
                Decimal::from(8_500),
                Decimal::from(10),
                Compliance::FullyCompliant,
            ))
            .build(day(2))
            .unwrap();
        bid.id = "bid-1".to_string();
        bid.status = BidStatus::Recommended;

        (rfq, bid)
    }

    fn make_decision(amount: i64) -> AwardDecision {
        AwardDecision {
            supplier_id: "supplier-1".to_string(),
            bid_id: "bid-1".to_string(),
            awarded_by: "buyer-1".to_string(),
            amount: Decimal::from(amount),
            contract_terms: Some("net 30".to_string()),
        }
    }

    #[test]
    fn savings_math() {
        let savings = compute_savings(Decimal::from(100_000), Decimal::from(85_000));
        assert_eq!(savings.cost_savings, Decimal::from(15_000));
        assert_eq!(savings.savings_percentage, Some(Decimal::from(15)));
    }

    #[test]
    fn zero_budget_leaves_percentage_undefined() {
        let savings = compute_savings(Decimal::ZERO, Decimal::from(85_000));
        assert_eq!(savings.cost_savings, Decimal::from(-85_000));
        assert_eq!(savings.savings_percentage, None);
    }

    #[test]
    fn overrun_gives_negative_savings() {
        let savings = compute_savings(Decimal::from(100_000), Decimal::from(120_000));
        assert_eq!(savings.cost_savings, Decimal::from(-20_000));
        assert_eq!(savings.savings_percentage, Some(Decimal::from(-20)));
    }

    #[test]
    fn prepare_award_finalizes_both_aggregates() {
        let (mut rfq, mut bid) = make_awardable_pair();
        let savings = prepare_award(&mut rfq, &mut bid, &make_decision(85_000), day(12)).unwrap();

        assert_eq!(rfq.status, RfqStatus::Awarded);
        assert_eq!(rfq.awarded_to.as_deref(), Some("supplier-1"));
        assert_eq!(rfq.cost_savings, Some(Decimal::from(15_000)));
        assert_eq!(rfq.savings_percentage, Some(Decimal::from(15)));
        assert_eq!(savings.cost_savings, Decimal::from(15_000));

        assert_eq!(bid.status, BidStatus::Awarded);
        assert_eq!(bid.award_amount, Some(Decimal::from(85_000)));
        assert_eq!(bid.awarded_by.as_deref(), Some("buyer-1"));
        assert_eq!(bid.contract_terms.as_deref(), Some("net 30"));
    }

    #[test]
    fn failed_precondition_mutates_nothing() {
        let (mut rfq, mut bid) = make_awardable_pair();
        bid.status = BidStatus::Qualified;
        let before_rfq = rfq.clone();
        let before_bid = bid.clone();

        let result = prepare_award(&mut rfq, &mut bid, &make_decision(85_000), day(12));
        assert!(matches!(result, Err(AwardError::StateTransition(_))));
        assert_eq!(rfq, before_rfq);
        assert_eq!(bid, before_bid);
    }

    #[test]
    fn uninvited_supplier_is_referential_error() {
        let (mut rfq, mut bid) = make_awardable_pair();
        rfq.suppliers.clear();
        let result = prepare_award(&mut rfq, &mut bid, &make_decision(85_000), day(12));
        assert!(matches!(result, Err(AwardError::Referential(_))));
    }

    #[test]
    fn bid_belonging_to_other_rfq_is_rejected() {
        let (mut rfq, mut bid) = make_awardable_pair();
        bid.rfq_id = "rfq-9".to_string();
        let result = prepare_award(&mut rfq, &mut bid, &make_decision(85_000), day(12));
        assert!(matches!(
            result,
            Err(AwardError::Referential(ReferentialError::BidRfqMismatch { .. }))
        ));
    }

    #[test]
    fn decision_naming_a_different_bid_is_rejected() {
        let (mut rfq, mut bid) = make_awardable_pair();
        let before_rfq = rfq.clone();
        let before_bid = bid.clone();

        let mut decision = make_decision(85_000);
        decision.bid_id = "bid-2".to_string();

        let result = prepare_award(&mut rfq, &mut bid, &decision, day(12));
        assert!(matches!(
            result,
            Err(AwardError::Referential(
                ReferentialError::BidDecisionMismatch { .. }
            ))
        ));
        assert_eq!(rfq, before_rfq);
        assert_eq!(bid, before_bid);
    }

    #[test]
    fn non_positive_amount_is_rejected() {
        let (mut rfq, mut bid) = make_awardable_pair();
        let result = prepare_award(&mut rfq, &mut bid, &make_decision(0), day(12));
        assert!(matches!(result, Err(AwardError::NonPositiveAmount { .. })));
    }

    #[test]
    fn reapply_savings_is_idempotent_and_guarded() {
        let (mut rfq, mut bid) = make_awardable_pair();
        prepare_award(&mut rfq, &mut bid, &make_decision(85_000), day(12)).unwrap();

        let snapshot = rfq.clone();
        reapply_savings(&mut rfq);
        assert_eq!(rfq, snapshot);

        // Not awarded: nothing to recompute
        let mut draft = snapshot.clone();
        draft.status = RfqStatus::Closed;
        draft.cost_savings = None;
        reapply_savings(&mut draft);
        assert_eq!(draft.cost_savings, None);
    }
}
