use async_trait::async_trait;
use rfq_sourcing_types::{Bid, Rfq};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use thiserror::Error;

// ═══════════════════════════════════════════════════════════════════════════
// ERROR TYPES
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("duplicate {entity} id: {id}")]
    DuplicateId { entity: &'static str, id: String },

    #[error("duplicate {entity} number: {number}")]
    DuplicateNumber {
        entity: &'static str,
        number: String,
    },

    #[error("supplier {supplier_id} already has a bid on rfq {rfq_id}")]
    DuplicateSupplierBid {
        rfq_id: String,
        supplier_id: String,
    },

    #[error("version conflict on {entity} {id}: expected {expected}, found {found}")]
    VersionConflict {
        entity: &'static str,
        id: String,
        expected: u64,
        found: u64,
    },

    #[error("database error: {0}")]
    DatabaseError(String),
}

// ═══════════════════════════════════════════════════════════════════════════
// STORE TRAIT
// ═══════════════════════════════════════════════════════════════════════════

/// Aggregate storage. The backend enforces `rfq_number`/`bid_number`
/// uniqueness and the one-bid-per-`(rfq, supplier)` invariant, and performs
/// an optimistic version check on every update: the caller's aggregate must
/// carry the version it was loaded at, and the store bumps it on success.
#[async_trait]
pub trait SourcingStore: Send + Sync {
    async fn create_rfq(&self, rfq: &Rfq) -> Result<(), StoreError>;

    /// Compare-and-bump update; `rfq.version` is incremented in place
    async fn update_rfq(&self, rfq: &mut Rfq) -> Result<(), StoreError>;

    async fn get_rfq(&self, id: &str) -> Result<Option<Rfq>, StoreError>;

    async fn get_rfq_by_number(&self, rfq_number: &str) -> Result<Option<Rfq>, StoreError>;

    async fn list_rfqs(&self) -> Result<Vec<Rfq>, StoreError>;

    async fn create_bid(&self, bid: &Bid) -> Result<(), StoreError>;

    /// Compare-and-bump update; `bid.version` is incremented in place
    async fn update_bid(&self, bid: &mut Bid) -> Result<(), StoreError>;

    async fn get_bid(&self, id: &str) -> Result<Option<Bid>, StoreError>;

    async fn list_bids_for_rfq(&self, rfq_id: &str) -> Result<Vec<Bid>, StoreError>;
}

// ═══════════════════════════════════════════════════════════════════════════
// IN-MEMORY STORE
// ═══════════════════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
pub struct InMemoryStore {
    rfqs: Arc<RwLock<HashMap<String, Rfq>>>,
    bids: Arc<RwLock<HashMap<String, Bid>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored RFQs (for testing)
    pub fn rfq_count(&self) -> usize {
        self.rfqs.read().unwrap().len()
    }

    /// Number of stored bids (for testing)
    pub fn bid_count(&self) -> usize {
        self.bids.read().unwrap().len()
    }
}

#[async_trait]
impl SourcingStore for InMemoryStore {
    async fn create_rfq(&self, rfq: &Rfq) -> Result<(), StoreError> {
        let mut rfqs = self.rfqs.write().unwrap();
        if rfqs.contains_key(&rfq.id) {
            return Err(StoreError::DuplicateId {
                entity: "rfq",
                id: rfq.id.clone(),
            });
        }
        if rfqs.values().any(|r| r.rfq_number == rfq.rfq_number) {
            return Err(StoreError::DuplicateNumber {
                entity: "rfq",
                number: rfq.rfq_number.clone(),
            });
        }
        rfqs.insert(rfq.id.clone(), rfq.clone());
        Ok(())
    }

    async fn update_rfq(&self, rfq: &mut Rfq) -> Result<(), StoreError> {
        let mut rfqs = self.rfqs.write().unwrap();
        let stored = rfqs.get(&rfq.id).ok_or_else(|| StoreError::NotFound {
            entity: "rfq",
            id: rfq.id.clone(),
        })?;
        if stored.version != rfq.version {
            return Err(StoreError::VersionConflict {
                entity: "rfq",
                id: rfq.id.clone(),
                expected: rfq.version,
                found: stored.version,
            });
        }
        rfq.version += 1;
        rfqs.insert(rfq.id.clone(), rfq.clone());
        Ok(())
    }

    async fn get_rfq(&self, id: &str) -> Result<Option<Rfq>, StoreError> {
        Ok(self.rfqs.read().unwrap().get(id).cloned())
    }

    async fn get_rfq_by_number(&self, rfq_number: &str) -> Result<Option<Rfq>, StoreError> {
        Ok(self
            .rfqs
            .read()
            .unwrap()
            .values()
            .find(|r| r.rfq_number == rfq_number)
            .cloned())
    }

    async fn list_rfqs(&self) -> Result<Vec<Rfq>, StoreError> {
        let mut rfqs: Vec<_> = self.rfqs.read().unwrap().values().cloned().collect();
        rfqs.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(rfqs)
    }

    async fn create_bid(&self, bid: &Bid) -> Result<(), StoreError> {
        let mut bids = self.bids.write().unwrap();
        if bids.contains_key(&bid.id) {
            return Err(StoreError::DuplicateId {
                entity: "bid",
                id: bid.id.clone(),
            });
        }
        if bids.values().any(|b| b.bid_number == bid.bid_number) {
            return Err(StoreError::DuplicateNumber {
                entity: "bid",
                number: bid.bid_number.clone(),
            });
        }
        if bids
            .values()
            .any(|b| b.rfq_id == bid.rfq_id && b.supplier_id == bid.supplier_id)
        {
            return Err(StoreError::DuplicateSupplierBid {
                rfq_id: bid.rfq_id.clone(),
                supplier_id: bid.supplier_id.clone(),
            });
        }
        bids.insert(bid.id.clone(), bid.clone());
        Ok(())
    }

    async fn update_bid(&self, bid: &mut Bid) -> Result<(), StoreError> {
        let mut bids = self.bids.write().unwrap();
        let stored = bids.get(&bid.id).ok_or_else(|| StoreError::NotFound {
            entity: "bid",
            id: bid.id.clone(),
        })?;
        if stored.version != bid.version {
            return Err(StoreError::VersionConflict {
                entity: "bid",
                id: bid.id.clone(),
                expected: bid.version,
                found: stored.version,
            });
        }
        bid.version += 1;
        bids.insert(bid.id.clone(), bid.clone());
        Ok(())
    }

    async fn get_bid(&self, id: &str) -> Result<Option<Bid>, StoreError> {
        Ok(self.bids.read().unwrap().get(id).cloned())
    }

    async fn list_bids_for_rfq(&self, rfq_id: &str) -> Result<Vec<Bid>, StoreError> {
        let mut bids: Vec<_> = self
            .bids
            .read()
            .unwrap()
            .values()
            .filter(|b| b.rfq_id == rfq_id)
            .cloned()
            .collect();
        bids.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(bids)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// TESTS
// ═══════════════════════════════════════════════════════════════════════════
