use async_trait::async_trait;
use rfq_sourcing_types::SourcingEvent;
use std::sync::{Arc, RwLock};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("notification sink unavailable: {0}")]
    Unavailable(String),
}

/// Fire-and-forget event delivery. A failing sink never fails the
/// operation that emitted the event; the service logs and moves on.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn publish(&self, event: SourcingEvent) -> Result<(), NotifyError>;
}

/// In-memory sink (for tests and single-process deployments)
#[derive(Debug, Default)]
pub struct InMemorySink {
    events: Arc<RwLock<Vec<SourcingEvent>>>,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SourcingEvent> {
        self.events.read().unwrap().clone()
    }
}

#[async_trait]
impl NotificationSink for InMemorySink {
    async fn publish(&self, event: SourcingEvent) -> Result<(), NotifyError> {
        self.events.write().unwrap().push(event);
        Ok(())
    }
}
