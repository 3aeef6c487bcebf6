//! Instrument definition for fixed-strike Asian contracts.

use crate::core::{AsianSpec, Averaging, Instrument, OptionType, PricingError};

/// Fixed-strike Asian option: the vanilla payoff applied to the arithmetic or
/// geometric average of spot over the observation window.
#[derive(Debug, Clone, PartialEq)]
pub struct AsianOption {
    /// Call or put.
    pub option_type: OptionType,
    /// Strike level.
    pub strike: f64,
    /// Expiry in years.
    pub expiry: f64,
    /// Averaging specification.
    pub asian: AsianSpec,
}

impl AsianOption {
    /// Asian option averaging over `n_observations` equally spaced dates
    /// ending at expiry.
    pub fn with_uniform_observations(
        option_type: OptionType,
        strike: f64,
        expiry: f64,
        averaging: Averaging,
        n_observations: usize,
    ) -> Self {
        Self {
            option_type,
            strike,
            expiry,
            asian: AsianSpec::uniform(averaging, n_observations, expiry),
        }
    }

    /// Validates instrument fields.
    ///
    /// # Errors
    /// [`PricingError::Configuration`] when the strike or expiry is invalid,
    /// the observation window is empty, or any observation lies outside
    /// `(0, expiry]`.
    pub fn validate(&self) -> Result<(), PricingError> {
        if !self.strike.is_finite() || self.strike <= 0.0 {
            return Err(PricingError::Configuration(
                "asian strike must be > 0".to_string(),
            ));
        }
        if !self.expiry.is_finite() || self.expiry <= 0.0 {
            return Err(PricingError::Configuration(
                "asian expiry must be > 0".to_string(),
            ));
        }
        if self.asian.observation_times.is_empty() {
            return Err(PricingError::Configuration(
                "asian observation window cannot be empty".to_string(),
            ));
        }
        if self
            .asian
            .observation_times
            .iter()
            .any(|&t| !t.is_finite() || t <= 0.0 || t > self.expiry)
        {
            return Err(PricingError::Configuration(
                "asian observation times must lie in (0, expiry]".to_string(),
            ));
        }
        Ok(())
    }
}

impl Instrument for AsianOption {
    fn instrument_type(&self) -> &str {
        "AsianOption"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uniform_window_ends_at_expiry() {
        let option = AsianOption::with_uniform_observations(
            OptionType::Call,
            100.0,
            1.0,
            Averaging::Arithmetic,
            12,
        );
        assert!(option.validate().is_ok());
        assert_eq!(option.asian.observation_times.len(), 12);
        assert!((option.asian.observation_times[11] - 1.0).abs() < 1.0e-12);
        assert!(option.asian.observation_times[0] > 0.0);
    }

    #[test]
    fn validation_rejects_out_of_window_observations() {
        let mut option = AsianOption::with_uniform_observations(
            OptionType::Put,
            100.0,
            1.0,
            Averaging::Geometric,
            4,
        );
        option.asian.observation_times.push(1.5);
        assert!(option.validate().is_err());

        option.asian.observation_times.clear();
        assert!(option.validate().is_err());
    }
}
