//! Monte Carlo pricing engines.

pub mod correlated_mc;
pub mod mc_engine;
pub mod mc_greeks;
pub mod path_set;

pub use correlated_mc::BasketMonteCarloEngine;
pub use mc_engine::{
    BetaMode, ControlVariate, MonteCarloInstrument, MonteCarloPricingEngine, PathEvaluator,
};
pub use mc_greeks::BumpGreeksEngine;
pub use path_set::{
    GbmPathGenerator, PathSet, SimulationConfig, simulate_correlated_paths, simulate_gbm_paths,
};
