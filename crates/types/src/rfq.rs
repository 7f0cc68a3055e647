use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A Request for Quotation: a sourcing event inviting suppliers to bid on a
/// set of line items.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Rfq {
    // ═══════════════════════════════════════════════════════════════════════
    // IDENTIFICATION
    // ═══════════════════════════════════════════════════════════════════════
    /// Unique identifier (opaque)
    pub id: String,

    /// Human-facing number, unique, format `RFQ-YYYY-NNNN`
    pub rfq_number: String,

    pub title: String,

    #[serde(default)]
    pub description: Option<String>,

    // ═══════════════════════════════════════════════════════════════════════
    // SOURCING EVENT
    // ═══════════════════════════════════════════════════════════════════════
    pub status: RfqStatus,

    /// Invited supplier ids. Set semantics, insertion order preserved.
    #[serde(default)]
    pub suppliers: Vec<String>,

    /// Ordered line items
    #[serde(default)]
    pub items: Vec<RfqItem>,

    pub estimated_budget: Decimal,

    /// Bidding deadline
    pub deadline: DateTime<Utc>,

    /// Must be after `deadline`
    pub delivery_date: DateTime<Utc>,

    /// Must be >= `deadline` when present
    #[serde(default)]
    pub bid_opening_date: Option<DateTime<Utc>>,

    /// Days a closed RFQ stays valid before expiring
    pub validity_period_days: i64,

    // ═══════════════════════════════════════════════════════════════════════
    // EVALUATION
    // ═══════════════════════════════════════════════════════════════════════
    pub evaluation_criteria: EvaluationCriteria,

    /// Standardized evaluation entries keyed by `(bid_id, evaluated_by)`,
    /// see [`Rfq::evaluation_key`]. Exclusively owned by the RFQ.
    #[serde(default)]
    pub evaluation_results: BTreeMap<String, RfqEvaluation>,

    // ═══════════════════════════════════════════════════════════════════════
    // AWARD
    // ═══════════════════════════════════════════════════════════════════════
    #[serde(default)]
    pub awarded_to: Option<String>,

    #[serde(default)]
    pub awarded_bid: Option<String>,

    #[serde(default)]
    pub actual_award_amount: Option<Decimal>,

    /// `estimated_budget - actual_award_amount`
    #[serde(default)]
    pub cost_savings: Option<Decimal>,

    /// `cost_savings / estimated_budget * 100`; absent when the budget is zero
    #[serde(default)]
    pub savings_percentage: Option<Decimal>,

    // ═══════════════════════════════════════════════════════════════════════
    // TRANSITION METADATA
    // ═══════════════════════════════════════════════════════════════════════
    #[serde(default)]
    pub published_by: Option<String>,
    #[serde(default)]
    pub published_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub closed_by: Option<String>,
    #[serde(default)]
    pub closed_at: Option<DateTime<Utc>>,

    #[serde(default)]
    pub cancelled_by: Option<String>,
    #[serde(default)]
    pub cancelled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub cancellation_reason: Option<String>,

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

impl Rfq {
    /// Create a new RFQ builder
    pub fn builder() -> RfqBuilder {
        RfqBuilder::default()
    }

    /// Composite key for an evaluation entry. Separator characters inside
    /// either part are escaped, so distinct `(bid_id, evaluated_by)` pairs
    /// never share a key.
    pub fn evaluation_key(bid_id: &str, evaluated_by: &str) -> String {
        crate::key::composite_key(bid_id, evaluated_by)
    }

    /// Check whether a supplier is in the invited set
    pub fn is_invited(&self, supplier_id: &str) -> bool {
        self.suppliers.iter().any(|s| s == supplier_id)
    }

    /// Invite a supplier, ignoring duplicates
    pub fn invite_supplier(&mut self, supplier_id: impl Into<String>) {
        let supplier_id = supplier_id.into();
        if !self.is_invited(&supplier_id) {
            self.suppliers.push(supplier_id);
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self.status,
            RfqStatus::Awarded | RfqStatus::Cancelled | RfqStatus::Expired
        )
    }

    /// Computed display status. A published RFQ before its deadline shows as
    /// `Open`; the stored enum only flips through the lazy load/save rules.
    pub fn effective_status(&self, now: DateTime<Utc>) -> RfqStatus {
        match self.status {
            RfqStatus::Published | RfqStatus::Open => {
                if now > self.deadline {
                    RfqStatus::Closed
                } else {
                    RfqStatus::Open
                }
            }
            RfqStatus::Closed => match self.closed_at {
                Some(closed_at)
                    if now > closed_at + Duration::days(self.validity_period_days) =>
                {
                    RfqStatus::Expired
                }
                _ => RfqStatus::Closed,
            },
            status => status,
        }
    }
}

/// RFQ status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RfqStatus {
    Draft,
    Published,
    Open,
    Closed,
    UnderEvaluation,
    Awarded,
    Cancelled,
    Expired,
}

impl RfqStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RfqStatus::Draft => "draft",
            RfqStatus::Published => "published",
            RfqStatus::Open => "open",
            RfqStatus::Closed => "closed",
            RfqStatus::UnderEvaluation => "under_evaluation",
            RfqStatus::Awarded => "awarded",
            RfqStatus::Cancelled => "cancelled",
            RfqStatus::Expired => "expired",
        }
    }
}

impl std::fmt::Display for RfqStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single requested line item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RfqItem {
    /// Requisition item reference (opaque, externally owned)
    #[serde(default)]
    pub requisition_item_id: Option<String>,

    pub description: String,

    pub quantity: Decimal,

    #[serde(default)]
    pub unit: Option<String>,

    /// Category reference (opaque, externally owned)
    #[serde(default)]
    pub category_id: Option<String>,
}

/// Weighted evaluation dimensions. All weights, including the specific
/// criteria, must sum to 100 within tolerance before any save.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EvaluationCriteria {
    pub technical_weight: Decimal,
    pub financial_weight: Decimal,
    pub delivery_weight: Decimal,
    pub quality_weight: Decimal,

    /// Additional named criteria with their own weights
    #[serde(default)]
    pub specific_criteria: Vec<SpecificCriterion>,
}

impl Default for EvaluationCriteria {
    fn default() -> Self {
        Self {
            technical_weight: Decimal::from(30),
            financial_weight: Decimal::from(30),
            delivery_weight: Decimal::from(20),
            quality_weight: Decimal::from(20),
            specific_criteria: Vec::new(),
        }
    }
}

/// A custom evaluation dimension
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SpecificCriterion {
    pub criterion: String,
    pub weight: Decimal,
}

/// One evaluator's standardized scores for one bid
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RfqEvaluation {
    pub bid_id: String,

    #[serde(default)]
    pub technical_score: Option<Decimal>,
    #[serde(default)]
    pub financial_score: Option<Decimal>,
    #[serde(default)]
    pub delivery_score: Option<Decimal>,
    #[serde(default)]
    pub quality_score: Option<Decimal>,

    /// Weighted composite over the dimensions present
    pub overall_score: Decimal,

    /// 1-based position after ranking; shared by all entries of a bid
    #[serde(default)]
    pub rank: Option<u32>,

    pub evaluated_by: String,
    pub evaluated_at: DateTime<Utc>,

    #[serde(default)]
    pub comments: Option<String>,
}

/// Builder for constructing draft RFQs
#[derive(Default)]
pub struct RfqBuilder {
    title: Option<String>,
    description: Option<String>,
    suppliers: Vec<String>,
    items: Vec<RfqItem>,
    estimated_budget: Option<Decimal>,
    deadline: Option<DateTime<Utc>>,
    delivery_date: Option<DateTime<Utc>>,
    bid_opening_date: Option<DateTime<Utc>>,
    validity_period_days: Option<i64>,
    evaluation_criteria: Option<EvaluationCriteria>,
}

impl RfqBuilder {
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn supplier(mut self, supplier_id: impl Into<String>) -> Self {
        let supplier_id = supplier_id.into();
        if !self.suppliers.contains(&supplier_id) {
            self.suppliers.push(supplier_id);
        }
        self
    }

    pub fn item(mut self, item: RfqItem) -> Self {
        self.items.push(item);
        self
    }

    pub fn estimated_budget(mut self, budget: Decimal) -> Self {
        self.estimated_budget = Some(budget);
        self
    }

    pub fn deadline(mut self, deadline: DateTime<Utc>) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn delivery_date(mut self, delivery_date: DateTime<Utc>) -> Self {
        self.delivery_date = Some(delivery_date);
        self
    }

    pub fn bid_opening_date(mut self, bid_opening_date: DateTime<Utc>) -> Self {
        self.bid_opening_date = Some(bid_opening_date);
        self
    }

    pub fn validity_period_days(mut self, days: i64) -> Self {
        self.validity_period_days = Some(days);
        self
    }

    pub fn evaluation_criteria(mut self, criteria: EvaluationCriteria) -> Self {
        self.evaluation_criteria = Some(criteria);
        self
    }

    /// Build a draft RFQ. The `rfq_number` is left empty and an unset
    /// validity period is left at zero; the engine assigns both before the
    /// first save.
    pub fn build(self, created_at: DateTime<Utc>) -> Result<Rfq, RfqBuildError> {
        let title = self.title.ok_or(RfqBuildError::MissingTitle)?;
        let estimated_budget = self
            .estimated_budget
            .ok_or(RfqBuildError::MissingEstimatedBudget)?;
        let deadline = self.deadline.ok_or(RfqBuildError::MissingDeadline)?;
        let delivery_date = self
            .delivery_date
            .ok_or(RfqBuildError::MissingDeliveryDate)?;

        Ok(Rfq {
            id: uuid::Uuid::new_v4().to_string(),
            rfq_number: String::new(),
            title,
            description: self.description,
            status: RfqStatus::Draft,
            suppliers: self.suppliers,
            items: self.items,
            estimated_budget,
            deadline,
            delivery_date,
            bid_opening_date: self.bid_opening_date,
            validity_period_days: self.validity_period_days.unwrap_or(0),
            evaluation_criteria: self.evaluation_criteria.unwrap_or_default(),
            evaluation_results: BTreeMap::new(),
            awarded_to: None,
            awarded_bid: None,
            actual_award_amount: None,
            cost_savings: None,
            savings_percentage: None,
            published_by: None,
            published_at: None,
            closed_by: None,
            closed_at: None,
            cancelled_by: None,
            cancelled_at: None,
            cancellation_reason: None,
            awarded_by: None,
            awarded_at: None,
            custom_fields: BTreeMap::new(),
            created_at,
            version: 0,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RfqBuildError {
    #[error("missing title")]
    MissingTitle,
    #[error("missing estimated budget")]
    MissingEstimatedBudget,
    #[error("missing deadline")]
    MissingDeadline,
    #[error("missing delivery date")]
    MissingDeliveryDate,
}
