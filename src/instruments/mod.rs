//! Instrument definitions.

pub mod asian;
pub mod barrier;
pub mod basket;
pub mod vanilla;

pub use asian::AsianOption;
pub use barrier::{BarrierOption, BarrierOptionBuilder};
pub use basket::BasketOption;
pub use vanilla::VanillaOption;
