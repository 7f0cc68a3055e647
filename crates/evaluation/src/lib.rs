//! Evaluation layer: the criteria weight gate and both scoring mechanisms.
//!
//! Two scoring mechanisms feed the same RFQ ranking and are deliberately not
//! reconciled:
//! - RFQ-level standardized scoring averages across evaluators per bid and
//!   produces the rank ordering ([`record_rfq_evaluation`]).
//! - Bid-level ad-hoc scoring sums weighted scores across all entries,
//!   additive across evaluators ([`record_bid_evaluation`]).
//!
//! Callers choose which mechanism drives their award decision.

mod criteria;
mod scoring;

pub use criteria::*;
pub use scoring::*;
