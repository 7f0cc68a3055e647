use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, RwLock};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("audit sink unavailable: {0}")]
    Unavailable(String),
}

/// One audit record per successful mutating operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// `"rfq"` or `"bid"`
    pub entity: String,
    pub entity_id: String,
    pub actor: String,
    pub action: String,

    /// Aggregate snapshot before the operation; absent on create
    pub before_state: Option<serde_json::Value>,

    /// Aggregate snapshot after the operation
    pub after_state: Option<serde_json::Value>,

    pub at: DateTime<Utc>,
}

/// Audit trail contract. A failing implementation never blocks the
/// operation that produced the entry; the service logs and moves on.
#[async_trait]
pub trait AuditLog: Send + Sync {
    async fn record(&self, entry: AuditEntry) -> Result<(), AuditError>;
}

/// In-memory audit log (for tests and single-process deployments)
#[derive(Debug, Default)]
pub struct InMemoryAuditLog {
    entries: Arc<RwLock<Vec<AuditEntry>>>,
}

impl InMemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.read().unwrap().clone()
    }
}

#[async_trait]
impl AuditLog for InMemoryAuditLog {
    async fn record(&self, entry: AuditEntry) -> Result<(), AuditError> {
        self.entries.write().unwrap().push(entry);
        Ok(())
    }
}
