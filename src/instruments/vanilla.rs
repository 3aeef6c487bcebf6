//! Canonical plain-vanilla option contract definition used throughout the
//! library.
//!
//! [`VanillaOption`] stores side, strike, expiry, and exercise rights
//! (European or American). Validation accepts `expiry == 0` (intrinsic-value
//! edge case). This type is the default input for the closed-form, Monte
//! Carlo, and Longstaff-Schwartz engines.

use crate::core::{ExerciseStyle, Instrument, OptionType, PricingError};

/// Vanilla option contract.
///
/// # Examples
/// ```
/// use openmonte::core::{ExerciseStyle, OptionType};
/// use openmonte::instruments::VanillaOption;
///
/// let option = VanillaOption {
///     option_type: OptionType::Call,
///     strike: 100.0,
///     expiry: 1.0,
///     exercise: ExerciseStyle::European,
/// };
/// assert!(option.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct VanillaOption {
    /// Call or put.
    pub option_type: OptionType,
    /// Strike level.
    pub strike: f64,
    /// Expiry in years.
    pub expiry: f64,
    /// Exercise style.
    pub exercise: ExerciseStyle,
}

impl VanillaOption {
    /// Builds a European call option.
    pub fn european_call(strike: f64, expiry: f64) -> Self {
        Self {
            option_type: OptionType::Call,
            strike,
            expiry,
            exercise: ExerciseStyle::European,
        }
    }

    /// Builds a European put option.
    pub fn european_put(strike: f64, expiry: f64) -> Self {
        Self {
            option_type: OptionType::Put,
            strike,
            expiry,
            exercise: ExerciseStyle::European,
        }
    }

    /// Builds an American call option.
    pub fn american_call(strike: f64, expiry: f64) -> Self {
        Self {
            option_type: OptionType::Call,
            strike,
            expiry,
            exercise: ExerciseStyle::American,
        }
    }

    /// Builds an American put option.
    pub fn american_put(strike: f64, expiry: f64) -> Self {
        Self {
            option_type: OptionType::Put,
            strike,
            expiry,
            exercise: ExerciseStyle::American,
        }
    }

    /// Undiscounted intrinsic value at `spot`.
    #[inline]
    pub fn intrinsic(&self, spot: f64) -> f64 {
        match self.option_type {
            OptionType::Call => (spot - self.strike).max(0.0),
            OptionType::Put => (self.strike - spot).max(0.0),
        }
    }

    /// Validates instrument fields.
    ///
    /// # Errors
    /// [`PricingError::Configuration`] when `strike <= 0` or `expiry < 0`.
    /// `expiry == 0` is accepted to support immediate-expiry intrinsic-value
    /// pricing.
    pub fn validate(&self) -> Result<(), PricingError> {
        if !self.strike.is_finite() || self.strike <= 0.0 {
            return Err(PricingError::Configuration(
                "vanilla strike must be > 0".to_string(),
            ));
        }
        if !self.expiry.is_finite() || self.expiry < 0.0 {
            return Err(PricingError::Configuration(
                "vanilla expiry must be >= 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Instrument for VanillaOption {
    fn instrument_type(&self) -> &str {
        "VanillaOption"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_exercise_rights() {
        assert_eq!(
            VanillaOption::european_call(100.0, 1.0).exercise,
            ExerciseStyle::European
        );
        assert_eq!(
            VanillaOption::american_put(100.0, 1.0).exercise,
            ExerciseStyle::American
        );
    }

    #[test]
    fn intrinsic_value_by_side() {
        let call = VanillaOption::european_call(100.0, 1.0);
        let put = VanillaOption::european_put(100.0, 1.0);

        assert_eq!(call.intrinsic(110.0), 10.0);
        assert_eq!(call.intrinsic(90.0), 0.0);
        assert_eq!(put.intrinsic(90.0), 10.0);
        assert_eq!(put.intrinsic(110.0), 0.0);
    }

    #[test]
    fn validation_rejects_bad_fields() {
        assert!(VanillaOption::european_call(0.0, 1.0).validate().is_err());
        assert!(VanillaOption::european_call(100.0, -0.5).validate().is_err());
        assert!(VanillaOption::european_call(100.0, 0.0).validate().is_ok());
    }
}
