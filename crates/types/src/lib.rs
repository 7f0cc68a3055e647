pub mod bid;
pub mod event;
mod key;
pub mod rfq;

pub use bid::*;
pub use event::*;
pub use rfq::*;
