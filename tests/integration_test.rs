use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use rfq_sourcing_award::AwardDecision;
use rfq_sourcing_config::SourcingConfig;
use rfq_sourcing_engine::{
    AuditEntry, AuditError, AuditLog, EngineError, InMemoryAuditLog, InMemorySink, SourcingService,
};
use rfq_sourcing_evaluation::RfqScoreInput;
use rfq_sourcing_store::{InMemorySequence, InMemoryStore, SourcingStore};
use rfq_sourcing_types::{
    Bid, BidItem, BidStatus, Compliance, Rfq, RfqItem, RfqStatus, SourcingEvent,
};
use rust_decimal::Decimal;
use std::sync::Arc;

// ═══════════════════════════════════════════════════════════════════════════
// TEST HARNESS
// ═══════════════════════════════════════════════════════════════════════════

struct Harness {
    service: SourcingService,
    store: Arc<InMemoryStore>,
    audit: Arc<InMemoryAuditLog>,
    sink: Arc<InMemorySink>,
}

fn make_harness() -> Harness {
    // First caller installs the subscriber; later calls are no-ops
    rfq_sourcing_telemetry::init_tracing().ok();

    let store = Arc::new(InMemoryStore::new());
    let audit = Arc::new(InMemoryAuditLog::new());
    let sink = Arc::new(InMemorySink::new());
    let service = SourcingService::builder()
        .with_store(store.clone())
        .with_sequence(Arc::new(InMemorySequence::default()))
        .with_audit_log(audit.clone())
        .with_notifications(sink.clone())
        .with_config(SourcingConfig::default())
        .build()
        .expect("service builds with all collaborators");
    Harness {
        service,
        store,
        audit,
        sink,
    }
}

fn base_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 2, 1, 10, 0, 0).unwrap()
}

fn laptop_rfq(now: DateTime<Utc>) -> Rfq {
    Rfq::builder()
        .title("Office laptop refresh")
        .description("25 developer laptops, delivery to HQ")
        .supplier("supplier-acme")
        .supplier("supplier-globex")
        .supplier("supplier-initech")
        .item(RfqItem {
            requisition_item_id: Some("req-77".to_string()),
            description: "14-inch developer laptop".to_string(),
            quantity: Decimal::from(25),
            unit: Some("unit".to_string()),
            category_id: Some("it-hardware".to_string()),
        })
        .estimated_budget(Decimal::from(100_000))
        .deadline(now + Duration::days(14))
        .delivery_date(now + Duration::days(60))
        .validity_period_days(90)
        .build(now)
        .unwrap()
}

fn laptop_bid(rfq_id: &str, supplier_id: &str, unit_price: i64, now: DateTime<Utc>) -> Bid {
    Bid::builder()
        .rfq_id(rfq_id)
        .supplier_id(supplier_id)
        .item(BidItem::new(
            "14-inch developer laptop",
            Decimal::from(unit_price),
            Decimal::from(25),
            Compliance::FullyCompliant,
        ))
        .validity_period_days(30)
        .build(now)
        .unwrap()
}

// ═══════════════════════════════════════════════════════════════════════════
// END-TO-END SOURCING FLOW
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_full_sourcing_flow_to_award() {
    let h = make_harness();
    let now = base_time();

    // Create and publish
    let rfq = h.service.create_rfq(laptop_rfq(now), "buyer-1", now).await.unwrap();
    assert_eq!(rfq.rfq_number, "RFQ-2024-0001");
    assert_eq!(rfq.status, RfqStatus::Draft);

    let rfq = h.service.publish_rfq(&rfq.id, "buyer-1", now).await.unwrap();
    assert_eq!(rfq.status, RfqStatus::Published);

    // Two suppliers bid
    let bid_a = h
        .service
        .create_bid(laptop_bid(&rfq.id, "supplier-acme", 3_400, now), "supplier-acme", now)
        .await
        .unwrap();
    assert_eq!(bid_a.bid_number, "BID-2024-0001");
    assert_eq!(bid_a.total_amount, Decimal::from(85_000));

    let bid_b = h
        .service
        .create_bid(
            laptop_bid(&rfq.id, "supplier-globex", 3_700, now),
            "supplier-globex",
            now,
        )
        .await
        .unwrap();

    let submit_at = now + Duration::days(2);
    h.service.submit_bid(&bid_a.id, "supplier-acme", submit_at).await.unwrap();
    h.service.submit_bid(&bid_b.id, "supplier-globex", submit_at).await.unwrap();

    // Deadline passes; evaluation starts (the lazy close rides on this save)
    let eval_at = now + Duration::days(15);
    let rfq = h.service.start_evaluation(&rfq.id, "buyer-1", eval_at).await.unwrap();
    assert_eq!(rfq.status, RfqStatus::UnderEvaluation);

    // Two evaluators score both bids
    let score = |bid_id: &str, evaluator: &str, value: i64| RfqScoreInput {
        bid_id: bid_id.to_string(),
        technical_score: Some(Decimal::from(value)),
        financial_score: Some(Decimal::from(value)),
        delivery_score: Some(Decimal::from(value)),
        quality_score: Some(Decimal::from(value)),
        evaluated_by: evaluator.to_string(),
        comments: None,
    };
    h.service
        .score_bid_for_rfq(&rfq.id, score(&bid_a.id, "eval-1", 90), eval_at)
        .await
        .unwrap();
    h.service
        .score_bid_for_rfq(&rfq.id, score(&bid_a.id, "eval-2", 74), eval_at)
        .await
        .unwrap();
    let standings = h
        .service
        .score_bid_for_rfq(&rfq.id, score(&bid_b.id, "eval-1", 80), eval_at)
        .await
        .unwrap();

    assert_eq!(standings[0].bid_id, bid_a.id);
    assert_eq!(standings[0].mean_overall, Decimal::from(82));
    assert_eq!(standings[0].rank, 1);
    assert_eq!(standings[1].mean_overall, Decimal::from(80));
    assert_eq!(standings[1].rank, 2);

    // Qualification pipeline on the winner
    h.service.begin_bid_review(&bid_a.id, "buyer-1", eval_at).await.unwrap();
    h.service.qualify_bid(&bid_a.id, "buyer-1", eval_at).await.unwrap();
    h.service.recommend_bid(&bid_a.id, "buyer-1", eval_at).await.unwrap();

    // Award with savings
    let (rfq, bid) = h
        .service
        .award_rfq(
            &rfq.id,
            AwardDecision {
                supplier_id: "supplier-acme".to_string(),
                bid_id: bid_a.id.clone(),
                awarded_by: "buyer-1".to_string(),
                amount: Decimal::from(85_000),
                contract_terms: Some("net 30".to_string()),
            },
            eval_at,
        )
        .await
        .unwrap();

    assert_eq!(rfq.status, RfqStatus::Awarded);
    assert_eq!(rfq.awarded_to, Some("supplier-acme".to_string()));
    assert_eq!(rfq.awarded_bid, Some(bid.id.clone()));
    assert_eq!(rfq.cost_savings, Some(Decimal::from(15_000)));
    assert_eq!(rfq.savings_percentage, Some(Decimal::from(15)));
    assert_eq!(bid.status, BidStatus::Awarded);
    assert_eq!(bid.contract_terms, Some("net 30".to_string()));

    // Both aggregates persisted
    let stored_rfq = h.store.get_rfq(&rfq.id).await.unwrap().unwrap();
    assert_eq!(stored_rfq.status, RfqStatus::Awarded);
    let stored_bid = h.store.get_bid(&bid.id).await.unwrap().unwrap();
    assert_eq!(stored_bid.status, BidStatus::Awarded);

    // Event trail covers the whole flow
    let events = h.sink.events();
    assert!(events.iter().any(|e| matches!(e, SourcingEvent::RfqPublished { .. })));
    assert!(events
        .iter()
        .any(|e| matches!(e, SourcingEvent::RfqClosed { actor: None, .. })));
    assert!(events.iter().any(|e| matches!(e, SourcingEvent::BidSubmitted { .. })));
    assert!(events.iter().any(|e| matches!(e, SourcingEvent::BidRecommended { .. })));
    assert!(events.iter().any(|e| matches!(e, SourcingEvent::RfqAwarded { .. })));
    assert!(events.iter().any(|e| matches!(e, SourcingEvent::BidAwarded { .. })));

    // Audit trail recorded one entry per mutating operation
    let audit_actions: Vec<String> = h.audit.entries().iter().map(|e| e.action.clone()).collect();
    assert!(audit_actions.contains(&"create".to_string()));
    assert!(audit_actions.contains(&"publish".to_string()));
    assert!(audit_actions.contains(&"award".to_string()));

    // Snapshots capture the transition itself
    let publish_entry = h
        .audit
        .entries()
        .into_iter()
        .find(|e| e.action == "publish")
        .unwrap();
    let before = publish_entry.before_state.unwrap();
    let after = publish_entry.after_state.unwrap();
    assert_eq!(before["status"], serde_json::json!("draft"));
    assert_eq!(after["status"], serde_json::json!("published"));
}

// ═══════════════════════════════════════════════════════════════════════════
// TIME-DRIVEN TRANSITIONS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_deadline_close_then_validity_expiry() {
    let h = make_harness();
    let now = base_time();

    let rfq = h.service.create_rfq(laptop_rfq(now), "buyer-1", now).await.unwrap();
    h.service.publish_rfq(&rfq.id, "buyer-1", now).await.unwrap();

    // Just past the deadline: closed
    let after_deadline = now + Duration::days(14) + Duration::hours(1);
    let view = h.service.get_rfq(&rfq.id, after_deadline).await.unwrap();
    assert_eq!(view.status, RfqStatus::Closed);

    // Reads never persist the flip
    let stored = h.store.get_rfq(&rfq.id).await.unwrap().unwrap();
    assert_eq!(stored.status, RfqStatus::Published);

    // A mutating operation persists the flip. Scoring has no status
    // precondition, so the lazy close rides on its save.
    h.service
        .score_bid_for_rfq(
            &rfq.id,
            RfqScoreInput {
                bid_id: "bid-a".to_string(),
                technical_score: Some(Decimal::from(75)),
                financial_score: None,
                delivery_score: None,
                quality_score: None,
                evaluated_by: "eval-1".to_string(),
                comments: None,
            },
            after_deadline,
        )
        .await
        .unwrap();
    let stored = h.store.get_rfq(&rfq.id).await.unwrap().unwrap();
    assert_eq!(stored.status, RfqStatus::Closed);
    assert_eq!(stored.closed_at, Some(after_deadline));
    assert!(h
        .sink
        .events()
        .iter()
        .any(|e| matches!(e, SourcingEvent::RfqClosed { actor: None, .. })));

    let long_after = after_deadline + Duration::days(91);
    let view = h.service.get_rfq(&rfq.id, long_after).await.unwrap();
    assert_eq!(view.status, RfqStatus::Expired);

    // Expired is terminal: cancel is refused
    let err = h
        .service
        .cancel_rfq(&rfq.id, "buyer-1", "no longer needed", long_after)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::StateTransition(_)));
}

#[tokio::test]
async fn test_bid_validity_expiry_boundary() {
    let h = make_harness();
    let created = Utc.with_ymd_and_hms(2023, 12, 15, 0, 0, 0).unwrap();

    let rfq = {
        let draft = Rfq::builder()
            .title("Office laptop refresh")
            .supplier("supplier-acme")
            .item(RfqItem {
                requisition_item_id: None,
                description: "laptop".to_string(),
                quantity: Decimal::from(10),
                unit: None,
                category_id: None,
            })
            .estimated_budget(Decimal::from(40_000))
            .deadline(created + Duration::days(60))
            .delivery_date(created + Duration::days(120))
            .build(created)
            .unwrap();
        h.service.create_rfq(draft, "buyer-1", created).await.unwrap()
    };

    let bid = h
        .service
        .create_bid(laptop_bid(&rfq.id, "supplier-acme", 3_400, created), "supplier-acme", created)
        .await
        .unwrap();

    let submitted_at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let bid = h.service.submit_bid(&bid.id, "supplier-acme", submitted_at).await.unwrap();
    let expiry = Utc.with_ymd_and_hms(2024, 1, 31, 0, 0, 0).unwrap();
    assert_eq!(bid.validity_expiry, Some(expiry));

    // Exactly at expiry the bid is still binding; strictly after it is not
    let at_expiry = h.service.get_bid(&bid.id, expiry).await.unwrap();
    assert_eq!(at_expiry.status, BidStatus::Submitted);
    let past_expiry = h.service.get_bid(&bid.id, expiry + Duration::seconds(1)).await.unwrap();
    assert_eq!(past_expiry.status, BidStatus::Expired);

    // An expired bid cannot enter review
    let err = h
        .service
        .begin_bid_review(&bid.id, "buyer-1", expiry + Duration::days(1))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::StateTransition(_)));
}

// ═══════════════════════════════════════════════════════════════════════════
// COLLABORATOR FAILURE ISOLATION
// ═══════════════════════════════════════════════════════════════════════════

struct FailingAuditLog;

#[async_trait]
impl AuditLog for FailingAuditLog {
    async fn record(&self, _entry: AuditEntry) -> Result<(), AuditError> {
        Err(AuditError::Unavailable("audit backend down".to_string()))
    }
}

#[tokio::test]
async fn test_audit_outage_never_blocks_operations() {
    let store = Arc::new(InMemoryStore::new());
    let sink = Arc::new(InMemorySink::new());
    let service = SourcingService::builder()
        .with_store(store.clone())
        .with_sequence(Arc::new(InMemorySequence::default()))
        .with_audit_log(Arc::new(FailingAuditLog))
        .with_notifications(sink.clone())
        .build()
        .unwrap();

    let now = base_time();
    let rfq = service.create_rfq(laptop_rfq(now), "buyer-1", now).await.unwrap();
    let rfq = service.publish_rfq(&rfq.id, "buyer-1", now).await.unwrap();
    assert_eq!(rfq.status, RfqStatus::Published);

    // The state change persisted and the event still went out
    let stored = store.get_rfq(&rfq.id).await.unwrap().unwrap();
    assert_eq!(stored.status, RfqStatus::Published);
    assert_eq!(sink.events().len(), 1);
}

// ═══════════════════════════════════════════════════════════════════════════
// CONCURRENT EVALUATOR UPSERTS
// ═══════════════════════════════════════════════════════════════════════════

#[tokio::test]
async fn test_concurrent_evaluators_all_land() {
    let h = make_harness();
    let now = base_time();

    let rfq = h.service.create_rfq(laptop_rfq(now), "buyer-1", now).await.unwrap();
    h.service.publish_rfq(&rfq.id, "buyer-1", now).await.unwrap();

    let service = Arc::new(h.service);
    let mut handles = Vec::new();
    for i in 0..8 {
        let service = service.clone();
        let rfq_id = rfq.id.clone();
        handles.push(tokio::spawn(async move {
            service
                .score_bid_for_rfq(
                    &rfq_id,
                    RfqScoreInput {
                        bid_id: "bid-a".to_string(),
                        technical_score: Some(Decimal::from(70 + i)),
                        financial_score: Some(Decimal::from(70 + i)),
                        delivery_score: Some(Decimal::from(70 + i)),
                        quality_score: Some(Decimal::from(70 + i)),
                        evaluated_by: format!("eval-{i}"),
                        comments: None,
                    },
                    now,
                )
                .await
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    // Per-id serialization means no upsert was lost to a version conflict
    let stored = h.store.get_rfq(&rfq.id).await.unwrap().unwrap();
    assert_eq!(stored.evaluation_results.len(), 8);
}
