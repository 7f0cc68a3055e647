use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::StoreError;

/// Sequence generator contract: given a prefix such as `RFQ-2024-`, return
/// the next number under that exact prefix, one past the highest already
/// issued, zero-padded to `pad_width` digits. Year-scoped prefixes give
/// per-year sequences.
#[async_trait]
pub trait NumberSequence: Send + Sync {
    async fn next_number(&self, prefix: &str, pad_width: usize) -> Result<String, StoreError>;
}

/// In-memory sequence generator, per-prefix counters
#[derive(Debug, Default)]
pub struct InMemorySequence {
    highest: Arc<RwLock<HashMap<String, u64>>>,
}

impl InMemorySequence {
    /// Seed the highest issued number under a prefix (for testing)
    pub fn seed(&self, prefix: &str, highest: u64) {
        self.highest
            .write()
            .unwrap()
            .insert(prefix.to_string(), highest);
    }
}

#[async_trait]
impl NumberSequence for InMemorySequence {
    async fn next_number(&self, prefix: &str, pad_width: usize) -> Result<String, StoreError> {
        let mut highest = self.highest.write().unwrap();
        let counter = highest.entry(prefix.to_string()).or_insert(0);
        *counter += 1;
        Ok(format!("{prefix}{:0width$}", counter, width = pad_width))
    }
}
