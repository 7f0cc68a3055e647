use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A supplier's priced, dated response to an RFQ. At most one bid may exist
/// per `(rfq_id, supplier_id)` pair; the store enforces the uniqueness.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Bid {
    // ═══════════════════════════════════════════════════════════════════════
    // IDENTIFICATION
    // ═══════════════════════════════════════════════════════════════════════
    /// Unique identifier (opaque)
    pub id: String,

    /// Human-facing number, unique, format `BID-YYYY-NNNN`
    pub bid_number: String,

    pub rfq_id: String,

    /// Supplier reference (opaque, externally owned)
    pub supplier_id: String,

    // ═══════════════════════════════════════════════════════════════════════
    // OFFER
    // ═══════════════════════════════════════════════════════════════════════
    pub status: BidStatus,

    /// Ordered priced line items, exclusively owned by the bid
    #[serde(default)]
    pub items: Vec<BidItem>,

    /// Derived: sum of item totals
    pub total_amount: Decimal,

    /// Days the submitted bid remains binding
    pub validity_period_days: i64,

    /// Derived on submit: `submitted_at + validity_period_days`
    #[serde(default)]
    pub validity_expiry: Option<DateTime<Utc>>,

    // ═══════════════════════════════════════════════════════════════════════
    // EVALUATION
    // ═══════════════════════════════════════════════════════════════════════
    /// Ad-hoc evaluation entries keyed by `(criterion, evaluated_by)`,
    /// see [`Bid::evaluation_key`]. Exclusively owned by the bid.
    #[serde(default)]
    pub evaluation_results: BTreeMap<String, BidEvaluation>,

    /// Derived: sum of weighted scores across all entries, across evaluators
    #[serde(default)]
    pub overall_score: Option<Decimal>,

    #[serde(default)]
    pub rank: Option<u32>,

    // ═══════════════════════════════════════════════════════════════════════
    // AWARD
    // ═══════════════════════════════════════════════════════════════════════
    #[serde(default)]
    pub award_amount: Option<Decimal>,

    #[serde(default)]
    pub contract_terms: Option<String>,

    // ═══════════════════════════════════════════════════════════════════════
    // TRANSITION METADATA
    // ═══════════════════════════════════════════════════════════════════════
    #[serde(default)]
    pub submitted_by: Option<String>,
    #[serde(default)]
    pub submitted_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub withdrawn_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub withdrawal_reason: Option<String>,

    #[serde(default)]
    pub disqualified_by: Option<String>,
    #[serde(default)]
    pub disqualified_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub disqualification_reason: Option<String>,

    #[serde(default)]
    pub rejected_by: Option<String>,
    #[serde(default)]
    pub rejected_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub rejection_reason: Option<String>,

    #[serde(default)]
    pub awarded_by: Option<String>,
    #[serde(default)]
    pub awarded_at: Option<DateTime<Utc>>,

    // ═══════════════════════════════════════════════════════════════════════
    // METADATA
    // ═══════════════════════════════════════════════════════════════════════
    /// Opaque extension point; core logic never branches on its contents
    #[serde(default)]
    pub custom_fields: BTreeMap<String, serde_json::Value>,

    pub created_at: DateTime<Utc>,

    /// Optimistic-concurrency counter, bumped by the store on update
    #[serde(default)]
    pub version: u64,
}

impl Bid {
    /// Create a new bid builder
    pub fn builder() -> BidBuilder {
        BidBuilder::default()
    }

    /// Composite key for an evaluation entry. Separator characters inside
    /// either part are escaped, so distinct `(criterion, evaluated_by)` pairs
    /// never share a key.
    pub fn evaluation_key(criterion: &str, evaluated_by: &str) -> String {
        crate::key::composite_key(criterion, evaluated_by)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            BidStatus::Awarded | BidStatus::Rejected | BidStatus::Withdrawn | BidStatus::Expired
        )
    }

    /// Percentage of fully compliant items, 0 for an empty bid
    pub fn compliance_rate(&self) -> Decimal {
        if self.items.is_empty() {
            return Decimal::ZERO;
        }
        let compliant = self
            .items
            .iter()
            .filter(|i| i.compliance == Compliance::FullyCompliant)
            .count();
        Decimal::from(compliant) / Decimal::from(self.items.len()) * Decimal::ONE_HUNDRED
    }

    /// A bid is compliant when its compliance rate reaches the configured
    /// threshold (80 under the default configuration)
    pub fn is_compliant(&self, threshold: Decimal) -> bool {
        self.compliance_rate() >= threshold
    }
}

/// Bid status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BidStatus {
    Draft,
    Submitted,
    UnderReview,
    Qualified,
    Disqualified,
    Recommended,
    Awarded,
    Rejected,
    Withdrawn,
    Expired,
}

impl BidStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BidStatus::Draft => "draft",
            BidStatus::Submitted => "submitted",
            BidStatus::UnderReview => "under_review",
            BidStatus::Qualified => "qualified",
            BidStatus::Disqualified => "disqualified",
            BidStatus::Recommended => "recommended",
            BidStatus::Awarded => "awarded",
            BidStatus::Rejected => "rejected",
            BidStatus::Withdrawn => "withdrawn",
            BidStatus::Expired => "expired",
        }
    }
}

impl std::fmt::Display for BidStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Item compliance against the requested specification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Compliance {
    FullyCompliant,
    PartiallyCompliant,
    NonCompliant,
}

/// A single priced line item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BidItem {
    pub description: String,

    pub unit_price: Decimal,

    pub quantity: Decimal,

    /// Derived: `unit_price * quantity`
    pub total: Decimal,

    pub compliance: Compliance,

    #[serde(default)]
    pub notes: Option<String>,
}

impl BidItem {
    pub fn new(
        description: impl Into<String>,
        unit_price: Decimal,
        quantity: Decimal,
        compliance: Compliance,
    ) -> Self {
        Self {
            description: description.into(),
            unit_price,
            quantity,
            total: unit_price * quantity,
            compliance,
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

/// One evaluator's score for one named criterion
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BidEvaluation {
    pub criterion: String,

    /// Raw score, 0-100
    pub score: Decimal,

    /// Criterion weight, 0-100
    pub weight: Decimal,

    /// Derived: `score * weight / 100`
    pub weighted_score: Decimal,

    pub evaluated_by: String,
    pub evaluated_at: DateTime<Utc>,

    #[serde(default)]
    pub comments: Option<String>,
}

/// Builder for constructing draft bids
#[derive(Default)]
pub struct BidBuilder {
    rfq_id: Option<String>,
    supplier_id: Option<String>,
    items: Vec<BidItem>,
    validity_period_days: Option<i64>,
}

impl BidBuilder {
    pub fn rfq_id(mut self, rfq_id: impl Into<String>) -> Self {
        self.rfq_id = Some(rfq_id.into());
        self
    }

    pub fn supplier_id(mut self, supplier_id: impl Into<String>) -> Self {
        self.supplier_id = Some(supplier_id.into());
        self
    }

    pub fn item(mut self, item: BidItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn validity_period_days(mut self, days: i64) -> Self {
        self.validity_period_days = Some(days);
        self
    }

    /// Build a draft bid. The `bid_number` is left empty and an unset
    /// validity period is left at zero; the engine assigns both, the number
    /// from the sequence collaborator and the period from its configured
    /// default, before the first save.
    pub fn build(self, created_at: DateTime<Utc>) -> Result<Bid, BidBuildError> {
        let rfq_id = self.rfq_id.ok_or(BidBuildError::MissingRfq)?;
        let supplier_id = self.supplier_id.ok_or(BidBuildError::MissingSupplier)?;
        let total_amount = self.items.iter().map(|i| i.total).sum();

        Ok(Bid {
            id: uuid::Uuid::new_v4().to_string(),
            bid_number: String::new(),
            rfq_id,
            supplier_id,
            status: BidStatus::Draft,
            items: self.items,
            total_amount,
            validity_period_days: self.validity_period_days.unwrap_or(0),
            validity_expiry: None,
            evaluation_results: BTreeMap::new(),
            overall_score: None,
            rank: None,
            award_amount: None,
            contract_terms: None,
            submitted_by: None,
            submitted_at: None,
            withdrawn_at: None,
            withdrawal_reason: None,
            disqualified_by: None,
            disqualified_at: None,
            disqualification_reason: None,
            rejected_by: None,
            rejected_at: None,
            rejection_reason: None,
            awarded_by: None,
            awarded_at: None,
            custom_fields: BTreeMap::new(),
            created_at,
            version: 0,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum BidBuildError {
    #[error("missing rfq reference")]
    MissingRfq,
    #[error("missing supplier reference")]
    MissingSupplier,
}
