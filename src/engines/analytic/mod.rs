//! Closed-form pricing engines used as comparators and control variates.

pub mod asian_geometric;
pub mod black_scholes;

pub use asian_geometric::{geometric_asian_expected_payoff, geometric_asian_price};
pub use black_scholes::{bs_greeks, bs_greeks_market, bs_price, bs_price_market};
