//! Orchestration service for the RFQ sourcing engine.
//!
//! [`SourcingService`] is the single entry point callers use. Every mutating
//! operation runs the same pipeline under a per-aggregate lock: load,
//! recompute time-driven transitions, validate, apply the transition, save
//! with an optimistic version check, then audit and notify on a best-effort
//! basis. Reads return a recomputed view without persisting it.

pub mod audit;
pub mod error;
pub mod locks;
pub mod notify;
pub mod service;

pub use audit::{AuditEntry, AuditError, AuditLog, InMemoryAuditLog};
pub use error::EngineError;
pub use locks::LockRegistry;
pub use notify::{InMemorySink, NotificationSink, NotifyError};
pub use service::{BuilderError, SourcingService, SourcingServiceBuilder};
