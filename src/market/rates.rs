//! Risk-free rate term structure.
//!
//! The engines only ever need discount factors between two year fractions, so
//! the curve is either a flat continuously compounded rate or a
//! piecewise-constant forward-rate curve. Calendar conventions are out of
//! scope; all times are year fractions from the valuation date.

use crate::core::PricingError;

/// Continuously compounded risk-free rate curve.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum RateCurve {
    /// Single flat rate.
    Flat(f64),
    /// Piecewise-constant instantaneous forward rates.
    ///
    /// `rates[i]` applies on `(times[i-1], times[i]]` (with `times[-1] = 0`);
    /// the last rate extrapolates flat beyond `times.last()`.
    PiecewiseConstant { times: Vec<f64>, rates: Vec<f64> },
}

impl RateCurve {
    /// Flat curve constructor.
    pub fn flat(rate: f64) -> Self {
        Self::Flat(rate)
    }

    /// Validated piecewise-constant curve constructor.
    ///
    /// # Errors
    /// [`PricingError::Configuration`] when the pillars are empty, not
    /// strictly increasing and positive, or lengths mismatch.
    pub fn piecewise(times: Vec<f64>, rates: Vec<f64>) -> Result<Self, PricingError> {
        if times.is_empty() || times.len() != rates.len() {
            return Err(PricingError::Configuration(
                "rate curve needs matching, non-empty times and rates".to_string(),
            ));
        }
        if times[0] <= 0.0 || times.windows(2).any(|w| w[1] <= w[0]) {
            return Err(PricingError::Configuration(
                "rate curve times must be positive and strictly increasing".to_string(),
            ));
        }
        if rates.iter().any(|r| !r.is_finite()) {
            return Err(PricingError::Configuration(
                "rate curve rates must be finite".to_string(),
            ));
        }
        Ok(Self::PiecewiseConstant { times, rates })
    }

    /// Integrated rate `int_0^t r(s) ds`.
    pub fn zero_integral(&self, t: f64) -> f64 {
        match self {
            Self::Flat(r) => r * t,
            Self::PiecewiseConstant { times, rates } => {
                let mut integral = 0.0;
                let mut prev = 0.0;
                for (&pillar, &rate) in times.iter().zip(rates.iter()) {
                    if t <= pillar {
                        integral += rate * (t - prev);
                        return integral;
                    }
                    integral += rate * (pillar - prev);
                    prev = pillar;
                }
                // Flat extrapolation past the last pillar.
                integral + rates[rates.len() - 1] * (t - prev)
            }
        }
    }

    /// Average zero rate to time `t`.
    pub fn zero_rate(&self, t: f64) -> f64 {
        if t <= 0.0 {
            return match self {
                Self::Flat(r) => *r,
                Self::PiecewiseConstant { rates, .. } => rates[0],
            };
        }
        self.zero_integral(t) / t
    }

    /// Discount factor from time `t` back to 0.
    #[inline]
    pub fn discount_factor(&self, t: f64) -> f64 {
        (-self.zero_integral(t)).exp()
    }

    /// Discount factor from `t1` back to `t0`, with `t0 <= t1`.
    #[inline]
    pub fn discount_between(&self, t0: f64, t1: f64) -> f64 {
        (self.zero_integral(t0) - self.zero_integral(t1)).exp()
    }

    /// Parallel shift of the whole curve (used for rho bumps).
    pub fn bumped(&self, shift: f64) -> Self {
        match self {
            Self::Flat(r) => Self::Flat(r + shift),
            Self::PiecewiseConstant { times, rates } => Self::PiecewiseConstant {
                times: times.clone(),
                rates: rates.iter().map(|r| r + shift).collect(),
            },
        }
    }
}
