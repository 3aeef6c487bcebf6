//! Market data consumed by the engines: snapshots and the rate curve.

pub mod market;
pub mod rates;

pub use market::{Market, MarketBuilder, MultiAssetMarket};
pub use rates::RateCurve;
