//! Persistence collaborator contracts. The core is storage-agnostic; any
//! backend implementing [`SourcingStore`] and [`NumberSequence`] works. The
//! in-memory implementations back the engine tests and the integration
//! suite.

mod sequence;
mod store;

pub use sequence::*;
pub use store::*;
