//! Lifecycle layer: the RFQ and bid state machines.
//!
//! Operations take the aggregate, the acting user, and an explicit `now`;
//! there is no hidden clock. Time-driven transitions (deadline close,
//! validity expiry) are evaluated lazily through the `recompute_*` functions,
//! which the host invokes at the start of every mutating operation. No
//! background sweep exists; an aggregate that is never touched keeps its
//! stored status until the next load/save.

mod bid;
mod error;
mod rfq;

pub use bid::*;
pub use error::*;
pub use rfq::*;
