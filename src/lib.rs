//! OpenMonte is a Monte Carlo derivative pricing and portfolio risk library:
//! exact-GBM path simulation (single and correlated multi-asset), layered
//! variance reduction, vanilla and exotic payoffs, Longstaff-Schwartz early
//! exercise, bump-and-revalue Greeks, and empirical VaR/CVaR analytics.
//!
//! References used across modules include:
//! - Glasserman (2004), *Monte Carlo Methods in Financial Engineering*.
//! - Longstaff and Schwartz (2001) for least-squares early exercise.
//! - Hull, *Options, Futures, and Other Derivatives* (11th ed.), Ch. 15, 25.
//!
//! Numerical considerations:
//! - Paths use the exact lognormal GBM transition; there is no discretization
//!   bias to manage, only sampling error, which every estimate reports as a
//!   standard error and confidence interval.
//! - Each path draws from its own deterministic sub-stream of the base seed,
//!   so results are reproducible and independent of batching or thread count,
//!   and bumped revaluations can share streams for Greek estimation.
//! - Configuration problems (bad budgets, non-PSD correlation matrices,
//!   degenerate regressions) surface as errors immediately; nothing falls
//!   back to a default price.
//!
//! # Feature Flags
//! - `parallel`: enables Rayon-powered batch-parallel path generation and
//!   payoff evaluation (estimates are bit-identical with and without it).
//!
//! # Quick Start
//! Price a European call by simulation and compare with Black-Scholes:
//! ```rust
//! use openmonte::core::{OptionType, PricingEngine};
//! use openmonte::engines::analytic::bs_price;
//! use openmonte::engines::monte_carlo::{MonteCarloPricingEngine, SimulationConfig};
//! use openmonte::instruments::VanillaOption;
//! use openmonte::market::Market;
//!
//! let market = Market::builder().spot(100.0).rate(0.05).vol(0.2).build().unwrap();
//! let option = VanillaOption::european_call(100.0, 1.0);
//! let engine = MonteCarloPricingEngine::new(SimulationConfig::new(20_000, 25).with_seed(42));
//!
//! let estimate = engine.price(&option, &market).unwrap();
//! let reference = bs_price(OptionType::Call, 100.0, 100.0, 0.05, 0.0, 0.2, 1.0);
//! assert!((estimate.price - reference).abs() < 4.0 * estimate.std_error + 0.05);
//! ```
//!
//! Value an American put with Longstaff-Schwartz:
//! ```rust
//! use openmonte::core::PricingEngine;
//! use openmonte::engines::lsm::LongstaffSchwartzEngine;
//! use openmonte::engines::monte_carlo::SimulationConfig;
//! use openmonte::instruments::VanillaOption;
//! use openmonte::market::Market;
//!
//! let market = Market::builder().spot(36.0).rate(0.06).vol(0.2).build().unwrap();
//! let option = VanillaOption::american_put(40.0, 1.0);
//! let engine = LongstaffSchwartzEngine::new(SimulationConfig::new(20_000, 25).with_seed(42));
//!
//! let estimate = engine.price(&option, &market).unwrap();
//! assert!(estimate.price >= 4.0 && estimate.price <= 5.0);
//! ```
//!
//! Run an empirical VaR over a P&L sample:
//! ```rust
//! use openmonte::risk::historical_var;
//!
//! let pnl = [-2.0, -1.5, 0.2, 0.4, 1.0, -0.8, 0.1];
//! let var_95 = historical_var(&pnl, 0.95);
//! assert!(var_95 >= 0.0);
//! ```

pub mod core;
pub mod engines;
pub mod instruments;
pub mod market;
pub mod math;
pub mod models;
pub mod risk;

/// Common imports for ergonomic usage.
pub mod prelude {
    pub use crate::core::*;
    pub use crate::engines::analytic::*;
    pub use crate::engines::lsm::*;
    pub use crate::engines::monte_carlo::*;
    pub use crate::instruments::*;
    pub use crate::market::*;
    pub use crate::risk::*;
}
