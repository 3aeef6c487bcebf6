//! Core traits, error taxonomy, and the estimate payload shared by every
//! pricing engine in the crate.

use crate::math::normal::normal_inv_cdf;
use crate::math::stats::RunningStats;

/// Standardized Greeks container used by engine results.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Greeks {
    /// First derivative to spot.
    pub delta: f64,
    /// Second derivative to spot.
    pub gamma: f64,
    /// First derivative to volatility.
    pub vega: f64,
    /// First derivative to time.
    pub theta: f64,
    /// First derivative to rate.
    pub rho: f64,
}

/// Common trait implemented by every priceable instrument.
pub trait Instrument: std::fmt::Debug {
    /// Returns a short type identifier for diagnostics.
    fn instrument_type(&self) -> &str;
}

/// Pricing engine abstraction over an instrument type.
pub trait PricingEngine<I: Instrument> {
    /// Prices an instrument under the provided market state.
    fn price(&self, instrument: &I, market: &crate::market::Market)
    -> Result<EstimateResult, PricingError>;
}

/// Compact key set for engine diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum DiagKey {
    Beta,
    ExerciseDates,
    Horizon,
    NumAssets,
    NumPaths,
    NumScenarios,
    NumSteps,
    Strata,
    Vol,
}

impl DiagKey {
    #[inline]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Beta => "beta",
            Self::ExerciseDates => "exercise_dates",
            Self::Horizon => "horizon",
            Self::NumAssets => "num_assets",
            Self::NumPaths => "num_paths",
            Self::NumScenarios => "num_scenarios",
            Self::NumSteps => "num_steps",
            Self::Strata => "strata",
            Self::Vol => "vol",
        }
    }
}

impl std::str::FromStr for DiagKey {
    type Err = ();

    fn from_str(key: &str) -> Result<Self, Self::Err> {
        match key {
            "beta" => Ok(Self::Beta),
            "exercise_dates" => Ok(Self::ExerciseDates),
            "horizon" => Ok(Self::Horizon),
            "num_assets" => Ok(Self::NumAssets),
            "num_paths" => Ok(Self::NumPaths),
            "num_scenarios" => Ok(Self::NumScenarios),
            "num_steps" => Ok(Self::NumSteps),
            "strata" => Ok(Self::Strata),
            "vol" => Ok(Self::Vol),
            _ => Err(()),
        }
    }
}

/// Inline scalar diagnostics attached to an [`EstimateResult`].
#[derive(Debug, Clone, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Diagnostics {
    entries: [Option<(DiagKey, f64)>; 8],
}

impl Diagnostics {
    pub const CAPACITY: usize = 8;

    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.iter().flatten().count()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries[0].is_none()
    }

    /// Inserts or overwrites a diagnostic value, returning any previous value.
    #[inline]
    pub fn insert(&mut self, key: DiagKey, value: f64) -> Option<f64> {
        for (entry_key, existing) in self.entries.iter_mut().flatten() {
            if *entry_key == key {
                let prev = *existing;
                *existing = value;
                return Some(prev);
            }
        }

        for entry in &mut self.entries {
            if entry.is_none() {
                *entry = Some((key, value));
                return None;
            }
        }

        panic!("diagnostics capacity exceeded ({})", Self::CAPACITY);
    }

    #[inline]
    pub fn get(&self, key: DiagKey) -> Option<f64> {
        self.entries
            .iter()
            .flatten()
            .find_map(|(entry_key, value)| (*entry_key == key).then_some(*value))
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        self.entries
            .iter()
            .flatten()
            .map(|(k, v)| (k.as_str(), *v))
    }
}

/// Terminal output of every pricer: point estimate plus sampling error.
///
/// The confidence interval uses the normal approximation
/// `price ± z(confidence) * std_error` and always satisfies
/// `conf_low <= price <= conf_high`.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EstimateResult {
    /// Present value.
    pub price: f64,
    /// Standard error of the estimate.
    pub std_error: f64,
    /// Lower confidence bound.
    pub conf_low: f64,
    /// Upper confidence bound.
    pub conf_high: f64,
    /// Two-sided confidence level in `(0, 1)`.
    pub confidence: f64,
    /// Number of (pair-averaged) samples behind the estimate.
    pub num_paths: usize,
    /// Engine-specific scalar diagnostics.
    pub diagnostics: Diagnostics,
}

impl EstimateResult {
    /// Builds an estimate from an explicit sample of discounted payoffs.
    ///
    /// # Errors
    /// [`PricingError::InsufficientSamples`] for fewer than two samples,
    /// [`PricingError::Configuration`] for a confidence level outside `(0, 1)`.
    pub fn from_samples(samples: &[f64], confidence: f64) -> Result<Self, PricingError> {
        let stats: RunningStats = samples.iter().copied().collect();
        Self::from_stats(&stats, confidence)
    }

    /// Builds an estimate from pooled running statistics.
    pub fn from_stats(stats: &RunningStats, confidence: f64) -> Result<Self, PricingError> {
        validate_confidence(confidence)?;
        if stats.count() < 2 {
            return Err(PricingError::InsufficientSamples(format!(
                "need at least 2 samples for a standard error, got {}",
                stats.count()
            )));
        }

        let price = stats.mean();
        let std_error = stats.std_error();
        let z = normal_inv_cdf(0.5 + 0.5 * confidence);
        Ok(Self {
            price,
            std_error,
            conf_low: price - z * std_error,
            conf_high: price + z * std_error,
            confidence,
            num_paths: stats.count() as usize,
            diagnostics: Diagnostics::new(),
        })
    }

    /// Exact (zero-variance) estimate, used for expired instruments.
    pub fn exact(price: f64, confidence: f64) -> Result<Self, PricingError> {
        validate_confidence(confidence)?;
        Ok(Self {
            price,
            std_error: 0.0,
            conf_low: price,
            conf_high: price,
            confidence,
            num_paths: 0,
            diagnostics: Diagnostics::new(),
        })
    }

    /// Confidence interval as an ordered pair.
    #[inline]
    pub fn conf_interval(&self) -> (f64, f64) {
        (self.conf_low, self.conf_high)
    }
}

pub(crate) fn validate_confidence(confidence: f64) -> Result<(), PricingError> {
    if !confidence.is_finite() || confidence <= 0.0 || confidence >= 1.0 {
        return Err(PricingError::Configuration(format!(
            "confidence level must lie in (0, 1), got {confidence}"
        )));
    }
    Ok(())
}

/// Errors surfaced by the pricing and risk APIs.
///
/// None of these are retried: configuration errors are caller bugs,
/// regression failures abort the affected estimate, and Monte Carlo noise is
/// reported through the standard error rather than treated as an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PricingError {
    /// Invalid or inconsistent inputs.
    Configuration(String),
    /// Numerically insufficient data for a least-squares basis fit.
    Regression(String),
    /// Statistics requested on fewer than two samples.
    InsufficientSamples(String),
}

impl std::fmt::Display for PricingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Configuration(msg) => write!(f, "configuration error: {msg}"),
            Self::Regression(msg) => write!(f, "regression error: {msg}"),
            Self::InsufficientSamples(msg) => write!(f, "insufficient samples: {msg}"),
        }
    }
}

impl std::error::Error for PricingError {}
