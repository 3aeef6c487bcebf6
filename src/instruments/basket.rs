//! Multi-asset weighted basket option.

use crate::core::{Instrument, OptionType, PricingError};

/// Weighted basket option: the vanilla payoff applied to
/// `sum_i w_i * S_i(T)`.
///
/// Weights are declared per instrument and need not sum to one.
#[derive(Debug, Clone, PartialEq)]
pub struct BasketOption {
    /// Call or put.
    pub option_type: OptionType,
    /// Strike level.
    pub strike: f64,
    /// Expiry in years.
    pub maturity: f64,
    /// Per-asset weights applied to terminal prices.
    pub weights: Vec<f64>,
}

impl BasketOption {
    /// Undiscounted payoff for one vector of terminal prices.
    #[inline]
    pub fn payoff(&self, terminals: &[f64]) -> f64 {
        let basket: f64 = self
            .weights
            .iter()
            .zip(terminals.iter())
            .map(|(w, s)| w * s)
            .sum();
        match self.option_type {
            OptionType::Call => (basket - self.strike).max(0.0),
            OptionType::Put => (self.strike - basket).max(0.0),
        }
    }

    /// Validates basket fields.
    pub fn validate(&self) -> Result<(), PricingError> {
        if !self.strike.is_finite() || self.strike <= 0.0 {
            return Err(PricingError::Configuration(
                "basket strike must be > 0".to_string(),
            ));
        }
        if !self.maturity.is_finite() || self.maturity <= 0.0 {
            return Err(PricingError::Configuration(
                "basket maturity must be > 0".to_string(),
            ));
        }
        if self.weights.is_empty() {
            return Err(PricingError::Configuration(
                "basket requires non-empty weights".to_string(),
            ));
        }
        if self.weights.iter().any(|w| !w.is_finite()) {
            return Err(PricingError::Configuration(
                "basket weights must be finite".to_string(),
            ));
        }
        Ok(())
    }
}

impl Instrument for BasketOption {
    fn instrument_type(&self) -> &str {
        "BasketOption"
    }
}
