//! The orchestration service: every mutating operation acquires the
//! aggregate's lock, loads it, replays any time-driven transition, validates,
//! applies the requested transition, and saves under an optimistic version
//! check. Audit and notification delivery run after the save and never fail
//! the operation.

use chrono::{DateTime, Datelike, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

use rfq_sourcing_award::{prepare_award, reapply_savings, AwardDecision, Savings};
use rfq_sourcing_config::{validate_config, SourcingConfig};
use rfq_sourcing_evaluation::{
    record_bid_evaluation, record_rfq_evaluation, BidScoreInput, BidStanding, RfqScoreInput,
};
use rfq_sourcing_lifecycle as lifecycle;
use rfq_sourcing_lifecycle::{validate_bid, validate_rfq, ReferentialError};
use rfq_sourcing_store::{NumberSequence, SourcingStore};
use rfq_sourcing_telemetry::CorrelationId;
use rfq_sourcing_types::{Bid, BidStatus, Rfq, RfqStatus, SourcingEvent};

use crate::audit::{AuditEntry, AuditLog};
use crate::error::EngineError;
use crate::locks::LockRegistry;
use crate::notify::NotificationSink;

// ═══════════════════════════════════════════════════════════════════════════
// BUILDER
// ═══════════════════════════════════════════════════════════════════════════

/// Builder error
#[derive(Debug, Error)]
pub enum BuilderError {
    #[error("missing required field: {field}")]
    MissingField { field: String },

    #[error("invalid configuration: {0}")]
    InvalidConfig(#[from] rfq_sourcing_config::ConfigError),
}

/// Builder for SourcingService
#[derive(Default)]
pub struct SourcingServiceBuilder {
    store: Option<Arc<dyn SourcingStore>>,
    sequence: Option<Arc<dyn NumberSequence>>,
    audit_log: Option<Arc<dyn AuditLog>>,
    notifications: Option<Arc<dyn NotificationSink>>,
    config: Option<SourcingConfig>,
}

impl SourcingServiceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the aggregate store
    pub fn with_store(mut self, store: Arc<dyn SourcingStore>) -> Self {
        self.store = Some(store);
        self
    }

    /// Set the document number sequence
    pub fn with_sequence(mut self, sequence: Arc<dyn NumberSequence>) -> Self {
        self.sequence = Some(sequence);
        self
    }

    /// Set the audit log
    pub fn with_audit_log(mut self, audit_log: Arc<dyn AuditLog>) -> Self {
        self.audit_log = Some(audit_log);
        self
    }

    /// Set the notification sink
    pub fn with_notifications(mut self, notifications: Arc<dyn NotificationSink>) -> Self {
        self.notifications = Some(notifications);
        self
    }

    /// Set the service configuration
    pub fn with_config(mut self, config: SourcingConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the SourcingService, validating that all collaborators are set
    /// and that the configuration holds together
    pub fn build(self) -> Result<SourcingService, BuilderError> {
        let store = self.store.ok_or_else(|| BuilderError::MissingField {
            field: "store".to_string(),
        })?;

        let sequence = self.sequence.ok_or_else(|| BuilderError::MissingField {
            field: "sequence".to_string(),
        })?;

        let audit_log = self.audit_log.ok_or_else(|| BuilderError::MissingField {
            field: "audit_log".to_string(),
        })?;

        let notifications = self
            .notifications
            .ok_or_else(|| BuilderError::MissingField {
                field: "notifications".to_string(),
            })?;

        let config = self.config.unwrap_or_default();
        validate_config(&config)?;

        Ok(SourcingService {
            store,
            sequence,
            audit_log,
            notifications,
            config,
            locks: LockRegistry::new(),
        })
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// SERVICE
// ═══════════════════════════════════════════════════════════════════════════

/// Host-side entry point over the sourcing domain
pub struct SourcingService {
    store: Arc<dyn SourcingStore>,
    sequence: Arc<dyn NumberSequence>,
    audit_log: Arc<dyn AuditLog>,
    notifications: Arc<dyn NotificationSink>,
    config: SourcingConfig,
    locks: LockRegistry,
}

fn snapshot<T: Serialize>(value: &T) -> Option<serde_json::Value> {
    serde_json::to_value(value).ok()
}

/// Replay time-driven RFQ transitions and re-derive dependent figures.
/// Returns the event describing a status flip, if one happened.
fn refresh_rfq(rfq: &mut Rfq, now: DateTime<Utc>) -> Option<SourcingEvent> {
    let prior = rfq.status;
    lifecycle::recompute_rfq(rfq, now);
    reapply_savings(rfq);
    if rfq.status == prior {
        return None;
    }
    match rfq.status {
        RfqStatus::Closed => Some(SourcingEvent::RfqClosed {
            rfq_id: rfq.id.clone(),
            rfq_number: rfq.rfq_number.clone(),
            actor: None,
        }),
        RfqStatus::Expired => Some(SourcingEvent::RfqExpired {
            rfq_id: rfq.id.clone(),
            rfq_number: rfq.rfq_number.clone(),
        }),
        _ => None,
    }
}

/// Replay time-driven bid transitions and re-derive dependent figures.
fn refresh_bid(bid: &mut Bid, now: DateTime<Utc>) -> Option<SourcingEvent> {
    let prior = bid.status;
    lifecycle::recompute_bid(bid, now);
    if bid.status == prior || bid.status != BidStatus::Expired {
        return None;
    }
    Some(SourcingEvent::BidExpired {
        bid_id: bid.id.clone(),
        bid_number: bid.bid_number.clone(),
    })
}

impl SourcingService {
    /// Create a new service builder
    pub fn builder() -> SourcingServiceBuilder {
        SourcingServiceBuilder::new()
    }

    // ═══════════════════════════════════════════════════════════════════════
    // PIPELINE HELPERS
    // ═══════════════════════════════════════════════════════════════════════

    async fn load_rfq(&self, rfq_id: &str) -> Result<Rfq, EngineError> {
        self.store
            .get_rfq(rfq_id)
            .await?
            .ok_or_else(|| EngineError::NotFound {
                entity: "rfq",
                id: rfq_id.to_string(),
            })
    }

    async fn load_bid(&self, bid_id: &str) -> Result<Bid, EngineError> {
        self.store
            .get_bid(bid_id)
            .await?
            .ok_or_else(|| EngineError::NotFound {
                entity: "bid",
                id: bid_id.to_string(),
            })
    }

    /// Cap enforced at creation; a zero validity period has already been
    /// replaced by the configured default.
    fn check_validity_period(&self, days: i64) -> Result<(), EngineError> {
        let max = self.config.lifecycle.max_validity_period_days;
        if days > max {
            return Err(lifecycle::ValidationError::ValidityPeriodTooLong { days, max }.into());
        }
        Ok(())
    }

    async fn audit(
        &self,
        entity: &'static str,
        entity_id: &str,
        actor: &str,
        action: &'static str,
        before_state: Option<serde_json::Value>,
        after_state: Option<serde_json::Value>,
        at: DateTime<Utc>,
    ) {
        let entry = AuditEntry {
            entity: entity.to_string(),
            entity_id: entity_id.to_string(),
            actor: actor.to_string(),
            action: action.to_string(),
            before_state,
            after_state,
            at,
        };
        if let Err(e) = self.audit_log.record(entry).await {
            warn!(error = %e, entity, entity_id, action, "audit write failed, continuing");
        }
    }

    async fn notify(&self, event: SourcingEvent) {
        if let Err(e) = self.notifications.publish(event).await {
            warn!(error = %e, "notification delivery failed, continuing");
        }
    }

    /// The shared mutation pipeline for one RFQ. The closure applies the
    /// actual transition and names the event to emit.
    async fn mutate_rfq<R, F>(
        &self,
        rfq_id: &str,
        actor: &str,
        action: &'static str,
        now: DateTime<Utc>,
        op: F,
    ) -> Result<(Rfq, R), EngineError>
    where
        R: Send,
        F: FnOnce(&mut Rfq) -> Result<(R, Option<SourcingEvent>), EngineError> + Send,
    {
        let _guard = self.locks.acquire(rfq_id).await;
        let mut rfq = self.load_rfq(rfq_id).await?;
        let before = snapshot(&rfq);
        let flip_event = refresh_rfq(&mut rfq, now);
        validate_rfq(&rfq, self.config.evaluation.weight_tolerance)?;
        let (out, event) = op(&mut rfq)?;
        self.store.update_rfq(&mut rfq).await?;
        self.audit("rfq", &rfq.id, actor, action, before, snapshot(&rfq), now)
            .await;
        if let Some(event) = flip_event {
            self.notify(event).await;
        }
        if let Some(event) = event {
            self.notify(event).await;
        }
        Ok((rfq, out))
    }

    /// The shared mutation pipeline for one bid.
    async fn mutate_bid<R, F>(
        &self,
        bid_id: &str,
        actor: &str,
        action: &'static str,
        now: DateTime<Utc>,
        op: F,
    ) -> Result<(Bid, R), EngineError>
    where
        R: Send,
        F: FnOnce(&mut Bid) -> Result<(R, Option<SourcingEvent>), EngineError> + Send,
    {
        let _guard = self.locks.acquire(bid_id).await;
        let mut bid = self.load_bid(bid_id).await?;
        let before = snapshot(&bid);
        let flip_event = refresh_bid(&mut bid, now);
        validate_bid(&bid)?;
        let (out, event) = op(&mut bid)?;
        self.store.update_bid(&mut bid).await?;
        self.audit("bid", &bid.id, actor, action, before, snapshot(&bid), now)
            .await;
        if let Some(event) = flip_event {
            self.notify(event).await;
        }
        if let Some(event) = event {
            self.notify(event).await;
        }
        Ok((bid, out))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // RFQ OPERATIONS
    // ═══════════════════════════════════════════════════════════════════════

    /// Persist a draft RFQ, assigning its year-scoped document number and
    /// filling an unset validity period with the configured default
    pub async fn create_rfq(
        &self,
        mut rfq: Rfq,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<Rfq, EngineError> {
        let correlation_id = CorrelationId::new();
        if rfq.rfq_number.is_empty() {
            let prefix = format!("{}{}-", self.config.numbering.rfq_prefix, now.year());
            rfq.rfq_number = self
                .sequence
                .next_number(&prefix, self.config.numbering.pad_width)
                .await?;
        }
        if rfq.validity_period_days == 0 {
            rfq.validity_period_days = self.config.lifecycle.default_validity_period_days;
        }
        self.check_validity_period(rfq.validity_period_days)?;
        validate_rfq(&rfq, self.config.evaluation.weight_tolerance)?;
        self.store.create_rfq(&rfq).await?;

        info!(
            correlation_id = %correlation_id,
            rfq_id = %rfq.id,
            rfq_number = %rfq.rfq_number,
            "rfq created"
        );
        self.audit("rfq", &rfq.id, actor, "create", None, snapshot(&rfq), now)
            .await;
        Ok(rfq)
    }

    /// `draft -> published`
    pub async fn publish_rfq(
        &self,
        rfq_id: &str,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<Rfq, EngineError> {
        let (rfq, _) = self
            .mutate_rfq(rfq_id, actor, "publish", now, |rfq| {
                lifecycle::publish(rfq, actor, now)?;
                let event = SourcingEvent::RfqPublished {
                    rfq_id: rfq.id.clone(),
                    rfq_number: rfq.rfq_number.clone(),
                    actor: actor.to_string(),
                };
                Ok(((), Some(event)))
            })
            .await?;
        info!(rfq_id = %rfq.id, rfq_number = %rfq.rfq_number, "rfq published");
        Ok(rfq)
    }

    /// `published/open -> closed`, explicit close ahead of the deadline
    pub async fn close_rfq(
        &self,
        rfq_id: &str,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<Rfq, EngineError> {
        let (rfq, _) = self
            .mutate_rfq(rfq_id, actor, "close", now, |rfq| {
                lifecycle::close(rfq, actor, now)?;
                let event = SourcingEvent::RfqClosed {
                    rfq_id: rfq.id.clone(),
                    rfq_number: rfq.rfq_number.clone(),
                    actor: Some(actor.to_string()),
                };
                Ok(((), Some(event)))
            })
            .await?;
        info!(rfq_id = %rfq.id, rfq_number = %rfq.rfq_number, "rfq closed");
        Ok(rfq)
    }

    /// `any non-terminal -> cancelled`
    pub async fn cancel_rfq(
        &self,
        rfq_id: &str,
        actor: &str,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<Rfq, EngineError> {
        let (rfq, _) = self
            .mutate_rfq(rfq_id, actor, "cancel", now, |rfq| {
                lifecycle::cancel(rfq, actor, reason, now)?;
                let event = SourcingEvent::RfqCancelled {
                    rfq_id: rfq.id.clone(),
                    rfq_number: rfq.rfq_number.clone(),
                    actor: actor.to_string(),
                    reason: reason.to_string(),
                };
                Ok(((), Some(event)))
            })
            .await?;
        info!(rfq_id = %rfq.id, rfq_number = %rfq.rfq_number, reason, "rfq cancelled");
        Ok(rfq)
    }

    /// `closed -> under_evaluation`
    pub async fn start_evaluation(
        &self,
        rfq_id: &str,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<Rfq, EngineError> {
        let (rfq, _) = self
            .mutate_rfq(rfq_id, actor, "start_evaluation", now, |rfq| {
                lifecycle::start_evaluation(rfq, actor, now)?;
                Ok(((), None))
            })
            .await?;
        info!(rfq_id = %rfq.id, rfq_number = %rfq.rfq_number, "rfq evaluation started");
        Ok(rfq)
    }

    /// Record one evaluator's standardized scores for a bid and re-rank.
    /// Returns the per-bid standings after the upsert.
    pub async fn score_bid_for_rfq(
        &self,
        rfq_id: &str,
        input: RfqScoreInput,
        now: DateTime<Utc>,
    ) -> Result<Vec<BidStanding>, EngineError> {
        let actor = input.evaluated_by.clone();
        let evaluated_by = input.evaluated_by.clone();
        let bid_id = input.bid_id.clone();
        let (rfq, standings) = self
            .mutate_rfq(rfq_id, &actor, "score_bid", now, move |rfq| {
                let standings = record_rfq_evaluation(rfq, input, now)?;
                let event = SourcingEvent::EvaluationRecorded {
                    entity: "rfq".to_string(),
                    entity_id: rfq.id.clone(),
                    evaluated_by: evaluated_by.clone(),
                };
                Ok((standings, Some(event)))
            })
            .await?;
        info!(
            rfq_id = %rfq.id,
            bid_id = %bid_id,
            evaluator_count = rfq.evaluation_results.len(),
            "rfq evaluation recorded"
        );
        Ok(standings)
    }

    /// Award the RFQ to a recommended bid. Locks the RFQ, then the bid, in
    /// that fixed order; validates every precondition across both aggregates
    /// before either is mutated, then saves both and emits both award events.
    pub async fn award_rfq(
        &self,
        rfq_id: &str,
        decision: AwardDecision,
        now: DateTime<Utc>,
    ) -> Result<(Rfq, Bid), EngineError> {
        let correlation_id = CorrelationId::new();
        let _rfq_guard = self.locks.acquire(rfq_id).await;
        let _bid_guard = self.locks.acquire(&decision.bid_id).await;

        let mut rfq = self.load_rfq(rfq_id).await?;
        let mut bid = self.load_bid(&decision.bid_id).await?;
        let rfq_before = snapshot(&rfq);
        let bid_before = snapshot(&bid);

        let rfq_flip = refresh_rfq(&mut rfq, now);
        let bid_flip = refresh_bid(&mut bid, now);
        validate_rfq(&rfq, self.config.evaluation.weight_tolerance)?;
        validate_bid(&bid)?;

        let savings: Savings = prepare_award(&mut rfq, &mut bid, &decision, now)?;

        self.store.update_rfq(&mut rfq).await?;
        self.store.update_bid(&mut bid).await?;

        info!(
            correlation_id = %correlation_id,
            rfq_id = %rfq.id,
            rfq_number = %rfq.rfq_number,
            bid_id = %bid.id,
            supplier_id = %decision.supplier_id,
            amount = %decision.amount,
            cost_savings = %savings.cost_savings,
            "rfq awarded"
        );

        self.audit(
            "rfq",
            &rfq.id,
            &decision.awarded_by,
            "award",
            rfq_before,
            snapshot(&rfq),
            now,
        )
        .await;
        self.audit(
            "bid",
            &bid.id,
            &decision.awarded_by,
            "award",
            bid_before,
            snapshot(&bid),
            now,
        )
        .await;

        if let Some(event) = rfq_flip {
            self.notify(event).await;
        }
        if let Some(event) = bid_flip {
            self.notify(event).await;
        }
        self.notify(SourcingEvent::RfqAwarded {
            rfq_id: rfq.id.clone(),
            rfq_number: rfq.rfq_number.clone(),
            supplier_id: decision.supplier_id.clone(),
            bid_id: bid.id.clone(),
            amount: decision.amount,
        })
        .await;
        self.notify(SourcingEvent::BidAwarded {
            bid_id: bid.id.clone(),
            bid_number: bid.bid_number.clone(),
            amount: decision.amount,
        })
        .await;

        Ok((rfq, bid))
    }

    // ═══════════════════════════════════════════════════════════════════════
    // BID OPERATIONS
    // ═══════════════════════════════════════════════════════════════════════

    /// Persist a draft bid against an existing RFQ the supplier was invited
    /// to, assigning its year-scoped document number
    pub async fn create_bid(
        &self,
        mut bid: Bid,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<Bid, EngineError> {
        let correlation_id = CorrelationId::new();
        let rfq = self.load_rfq(&bid.rfq_id).await?;
        if !rfq.is_invited(&bid.supplier_id) {
            return Err(ReferentialError::SupplierNotInvited {
                supplier_id: bid.supplier_id.clone(),
                rfq_id: rfq.id.clone(),
            }
            .into());
        }

        lifecycle::recompute_bid(&mut bid, now);
        if bid.validity_period_days == 0 {
            bid.validity_period_days = self.config.lifecycle.default_validity_period_days;
        }
        self.check_validity_period(bid.validity_period_days)?;
        validate_bid(&bid)?;
        if bid.bid_number.is_empty() {
            let prefix = format!("{}{}-", self.config.numbering.bid_prefix, now.year());
            bid.bid_number = self
                .sequence
                .next_number(&prefix, self.config.numbering.pad_width)
                .await?;
        }
        self.store.create_bid(&bid).await?;

        info!(
            correlation_id = %correlation_id,
            bid_id = %bid.id,
            bid_number = %bid.bid_number,
            rfq_id = %bid.rfq_id,
            supplier_id = %bid.supplier_id,
            "bid created"
        );
        self.audit("bid", &bid.id, actor, "create", None, snapshot(&bid), now)
            .await;
        Ok(bid)
    }

    /// `draft -> submitted`; starts the validity window
    pub async fn submit_bid(
        &self,
        bid_id: &str,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<Bid, EngineError> {
        let (bid, _) = self
            .mutate_bid(bid_id, actor, "submit", now, |bid| {
                lifecycle::submit(bid, actor, now)?;
                let event = SourcingEvent::BidSubmitted {
                    bid_id: bid.id.clone(),
                    bid_number: bid.bid_number.clone(),
                    rfq_id: bid.rfq_id.clone(),
                    supplier_id: bid.supplier_id.clone(),
                };
                Ok(((), Some(event)))
            })
            .await?;
        info!(bid_id = %bid.id, bid_number = %bid.bid_number, "bid submitted");
        Ok(bid)
    }

    /// `submitted/under_review -> withdrawn`
    pub async fn withdraw_bid(
        &self,
        bid_id: &str,
        actor: &str,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<Bid, EngineError> {
        let (bid, _) = self
            .mutate_bid(bid_id, actor, "withdraw", now, |bid| {
                lifecycle::withdraw(bid, reason, now)?;
                let event = SourcingEvent::BidWithdrawn {
                    bid_id: bid.id.clone(),
                    bid_number: bid.bid_number.clone(),
                    reason: reason.to_string(),
                };
                Ok(((), Some(event)))
            })
            .await?;
        info!(bid_id = %bid.id, bid_number = %bid.bid_number, reason, "bid withdrawn");
        Ok(bid)
    }

    /// `submitted -> under_review`
    pub async fn begin_bid_review(
        &self,
        bid_id: &str,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<Bid, EngineError> {
        let (bid, _) = self
            .mutate_bid(bid_id, actor, "begin_review", now, |bid| {
                lifecycle::begin_review(bid, actor, now)?;
                Ok(((), None))
            })
            .await?;
        info!(bid_id = %bid.id, bid_number = %bid.bid_number, "bid review started");
        Ok(bid)
    }

    /// `under_review -> qualified`
    pub async fn qualify_bid(
        &self,
        bid_id: &str,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<Bid, EngineError> {
        let threshold = self.config.evaluation.compliance_threshold;
        let (bid, _) = self
            .mutate_bid(bid_id, actor, "qualify", now, |bid| {
                lifecycle::qualify(bid, actor, now)?;
                if !bid.is_compliant(threshold) {
                    warn!(
                        bid_id = %bid.id,
                        compliance_rate = %bid.compliance_rate(),
                        %threshold,
                        "qualifying a bid below the compliance threshold"
                    );
                }
                Ok(((), None))
            })
            .await?;
        info!(bid_id = %bid.id, bid_number = %bid.bid_number, "bid qualified");
        Ok(bid)
    }

    /// `any -> disqualified`; no status precondition
    pub async fn disqualify_bid(
        &self,
        bid_id: &str,
        actor: &str,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<Bid, EngineError> {
        let (bid, _) = self
            .mutate_bid(bid_id, actor, "disqualify", now, |bid| {
                lifecycle::disqualify(bid, actor, reason, now);
                let event = SourcingEvent::BidDisqualified {
                    bid_id: bid.id.clone(),
                    bid_number: bid.bid_number.clone(),
                    actor: actor.to_string(),
                    reason: reason.to_string(),
                };
                Ok(((), Some(event)))
            })
            .await?;
        info!(bid_id = %bid.id, bid_number = %bid.bid_number, reason, "bid disqualified");
        Ok(bid)
    }

    /// `qualified -> recommended`
    pub async fn recommend_bid(
        &self,
        bid_id: &str,
        actor: &str,
        now: DateTime<Utc>,
    ) -> Result<Bid, EngineError> {
        let (bid, _) = self
            .mutate_bid(bid_id, actor, "recommend", now, |bid| {
                lifecycle::recommend(bid, actor, now)?;
                let event = SourcingEvent::BidRecommended {
                    bid_id: bid.id.clone(),
                    bid_number: bid.bid_number.clone(),
                    actor: actor.to_string(),
                };
                Ok(((), Some(event)))
            })
            .await?;
        info!(bid_id = %bid.id, bid_number = %bid.bid_number, "bid recommended");
        Ok(bid)
    }

    /// `submitted/under_review/qualified/recommended -> rejected`
    pub async fn reject_bid(
        &self,
        bid_id: &str,
        actor: &str,
        reason: &str,
        now: DateTime<Utc>,
    ) -> Result<Bid, EngineError> {
        let (bid, _) = self
            .mutate_bid(bid_id, actor, "reject", now, |bid| {
                lifecycle::reject(bid, actor, reason, now)?;
                let event = SourcingEvent::BidRejected {
                    bid_id: bid.id.clone(),
                    bid_number: bid.bid_number.clone(),
                    actor: actor.to_string(),
                    reason: reason.to_string(),
                };
                Ok(((), Some(event)))
            })
            .await?;
        info!(bid_id = %bid.id, bid_number = %bid.bid_number, reason, "bid rejected");
        Ok(bid)
    }

    /// Record one evaluator's score for one ad-hoc criterion. Returns the
    /// recomputed overall score.
    pub async fn score_bid_criterion(
        &self,
        bid_id: &str,
        input: BidScoreInput,
        now: DateTime<Utc>,
    ) -> Result<Decimal, EngineError> {
        let actor = input.evaluated_by.clone();
        let evaluated_by = input.evaluated_by.clone();
        let (bid, overall) = self
            .mutate_bid(bid_id, &actor, "score_criterion", now, move |bid| {
                let overall = record_bid_evaluation(bid, input, now)?;
                let event = SourcingEvent::EvaluationRecorded {
                    entity: "bid".to_string(),
                    entity_id: bid.id.clone(),
                    evaluated_by: evaluated_by.clone(),
                };
                Ok((overall, Some(event)))
            })
            .await?;
        info!(bid_id = %bid.id, overall_score = %overall, "bid evaluation recorded");
        Ok(overall)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // READS
    // ═══════════════════════════════════════════════════════════════════════

    /// Load an RFQ and return its recomputed view. Lazily-flipped statuses
    /// are not persisted by reads; the next mutating operation does that.
    pub async fn get_rfq(&self, rfq_id: &str, now: DateTime<Utc>) -> Result<Rfq, EngineError> {
        let mut rfq = self.load_rfq(rfq_id).await?;
        refresh_rfq(&mut rfq, now);
        Ok(rfq)
    }

    /// Load a bid and return its recomputed view (not persisted)
    pub async fn get_bid(&self, bid_id: &str, now: DateTime<Utc>) -> Result<Bid, EngineError> {
        let mut bid = self.load_bid(bid_id).await?;
        refresh_bid(&mut bid, now);
        Ok(bid)
    }

    /// All bids on an RFQ, recomputed views (not persisted)
    pub async fn list_bids(
        &self,
        rfq_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Vec<Bid>, EngineError> {
        let mut bids = self.store.list_bids_for_rfq(rfq_id).await?;
        for bid in &mut bids {
            refresh_bid(bid, now);
        }
        Ok(bids)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════
