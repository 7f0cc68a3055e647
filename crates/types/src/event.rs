use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Fire-and-forget domain event descriptors emitted after state changes.
/// Delivery is a collaborator concern; the core only describes what happened.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SourcingEvent {
    RfqPublished {
        rfq_id: String,
        rfq_number: String,
        actor: String,
    },
    RfqClosed {
        rfq_id: String,
        rfq_number: String,
        /// Absent when the deadline rule closed the RFQ
        actor: Option<String>,
    },
    RfqCancelled {
        rfq_id: String,
        rfq_number: String,
        actor: String,
        reason: String,
    },
    RfqExpired {
        rfq_id: String,
        rfq_number: String,
    },
    RfqAwarded {
        rfq_id: String,
        rfq_number: String,
        supplier_id: String,
        bid_id: String,
        amount: Decimal,
    },
    BidSubmitted {
        bid_id: String,
        bid_number: String,
        rfq_id: String,
        supplier_id: String,
    },
    BidWithdrawn {
        bid_id: String,
        bid_number: String,
        reason: String,
    },
    BidDisqualified {
        bid_id: String,
        bid_number: String,
        actor: String,
        reason: String,
    },
    BidRejected {
        bid_id: String,
        bid_number: String,
        actor: String,
        reason: String,
    },
    BidRecommended {
        bid_id: String,
        bid_number: String,
        actor: String,
    },
    BidAwarded {
        bid_id: String,
        bid_number: String,
        amount: Decimal,
    },
    BidExpired {
        bid_id: String,
        bid_number: String,
    },
    EvaluationRecorded {
        entity: String,
        entity_id: String,
        evaluated_by: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serializes_with_type_tag() {
        let event = SourcingEvent::RfqExpired {
            rfq_id: "rfq-1".to_string(),
            rfq_number: "RFQ-2024-0001".to_string(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "rfq_expired");
        assert_eq!(json["rfq_number"], "RFQ-2024-0001");
    }
}
