//! Market snapshots consumed by the pricing engines.
//!
//! A [`Market`] holds one asset's spot, flat volatility, dividend yield, and
//! the rate curve; [`MultiAssetMarket`] extends this to a correlated basket.
//! Both are created by the caller through validating builders and passed down
//! unmodified; the engines never mutate or cache market state.

use crate::core::PricingError;
use crate::market::rates::RateCurve;
use crate::math::correlation::{cholesky_lower_psd, validate_correlation_matrix};

/// Single-asset market snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct Market {
    /// Spot price.
    pub spot: f64,
    /// Risk-free rate curve.
    pub rate: RateCurve,
    /// Continuously compounded dividend yield.
    pub dividend_yield: f64,
    /// Flat annualized volatility.
    pub vol: f64,
}

impl Market {
    /// Starts a market builder.
    #[inline]
    pub fn builder() -> MarketBuilder {
        MarketBuilder::default()
    }

    /// Flat zero rate to `maturity` (drift input for the exact GBM step).
    #[inline]
    pub fn zero_rate(&self, maturity: f64) -> f64 {
        self.rate.zero_rate(maturity)
    }

    /// Discount factor from `maturity` back to the valuation date.
    #[inline]
    pub fn discount_factor(&self, maturity: f64) -> f64 {
        self.rate.discount_factor(maturity)
    }
}

/// Builder for [`Market`].
#[derive(Debug, Clone, Default)]
pub struct MarketBuilder {
    spot: Option<f64>,
    rate: Option<RateCurve>,
    dividend_yield: Option<f64>,
    vol: Option<f64>,
}

impl MarketBuilder {
    /// Sets the spot price.
    #[inline]
    pub fn spot(mut self, spot: f64) -> Self {
        self.spot = Some(spot);
        self
    }

    /// Sets a flat risk-free rate.
    #[inline]
    pub fn rate(mut self, rate: f64) -> Self {
        self.rate = Some(RateCurve::flat(rate));
        self
    }

    /// Sets a full rate curve.
    #[inline]
    pub fn rate_curve(mut self, curve: RateCurve) -> Self {
        self.rate = Some(curve);
        self
    }

    /// Sets the continuous dividend yield.
    #[inline]
    pub fn dividend_yield(mut self, dividend_yield: f64) -> Self {
        self.dividend_yield = Some(dividend_yield);
        self
    }

    /// Sets the flat volatility.
    #[inline]
    pub fn vol(mut self, vol: f64) -> Self {
        self.vol = Some(vol);
        self
    }

    /// Validates and builds a [`Market`].
    ///
    /// # Errors
    /// [`PricingError::Configuration`] when spot or vol is missing or
    /// non-positive, or the dividend yield is negative.
    pub fn build(self) -> Result<Market, PricingError> {
        let spot = self
            .spot
            .ok_or_else(|| PricingError::Configuration("market spot is required".to_string()))?;
        if !spot.is_finite() || spot <= 0.0 {
            return Err(PricingError::Configuration(
                "market spot must be finite and > 0".to_string(),
            ));
        }

        let vol = self
            .vol
            .ok_or_else(|| PricingError::Configuration("market vol is required".to_string()))?;
        if !vol.is_finite() || vol <= 0.0 {
            return Err(PricingError::Configuration(
                "market vol must be finite and > 0".to_string(),
            ));
        }

        let dividend_yield = self.dividend_yield.unwrap_or(0.0);
        if !dividend_yield.is_finite() || dividend_yield < 0.0 {
            return Err(PricingError::Configuration(
                "market dividend yield must be finite and >= 0".to_string(),
            ));
        }

        Ok(Market {
            spot,
            rate: self.rate.unwrap_or(RateCurve::Flat(0.0)),
            dividend_yield,
            vol,
        })
    }
}

/// Correlated multi-asset market snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiAssetMarket {
    /// Spot price per asset.
    pub spots: Vec<f64>,
    /// Flat annualized volatility per asset.
    pub vols: Vec<f64>,
    /// Continuous dividend yield per asset.
    pub dividend_yields: Vec<f64>,
    /// Shared risk-free rate curve.
    pub rate: RateCurve,
    /// Correlation matrix of the driving Brownian motions.
    pub correlation: Vec<Vec<f64>>,
}

impl MultiAssetMarket {
    /// Validated constructor.
    ///
    /// # Errors
    /// [`PricingError::Configuration`] when per-asset vectors disagree in
    /// length, any spot/vol is non-positive, any dividend yield is negative,
    /// or the correlation matrix is malformed or not positive semidefinite.
    /// A non-PSD matrix is never repaired.
    pub fn new(
        spots: Vec<f64>,
        vols: Vec<f64>,
        dividend_yields: Vec<f64>,
        rate: RateCurve,
        correlation: Vec<Vec<f64>>,
    ) -> Result<Self, PricingError> {
        let n = spots.len();
        if n == 0 {
            return Err(PricingError::Configuration(
                "multi-asset market needs at least one asset".to_string(),
            ));
        }
        if vols.len() != n || dividend_yields.len() != n {
            return Err(PricingError::Configuration(
                "spots, vols, and dividend yields must have the same length".to_string(),
            ));
        }
        if spots.iter().any(|s| !s.is_finite() || *s <= 0.0) {
            return Err(PricingError::Configuration(
                "multi-asset spots must be finite and > 0".to_string(),
            ));
        }
        if vols.iter().any(|v| !v.is_finite() || *v <= 0.0) {
            return Err(PricingError::Configuration(
                "multi-asset vols must be finite and > 0".to_string(),
            ));
        }
        if dividend_yields.iter().any(|q| !q.is_finite() || *q < 0.0) {
            return Err(PricingError::Configuration(
                "multi-asset dividend yields must be finite and >= 0".to_string(),
            ));
        }

        validate_correlation_matrix(&correlation, n).map_err(PricingError::Configuration)?;

        let market = Self {
            spots,
            vols,
            dividend_yields,
            rate,
            correlation,
        };
        // Factorization doubles as the PSD check; the factor itself is
        // recomputed per pricing call so market snapshots stay plain data.
        market.cholesky()?;
        Ok(market)
    }

    /// Number of assets.
    #[inline]
    pub fn n_assets(&self) -> usize {
        self.spots.len()
    }

    /// Lower Cholesky factor of the correlation matrix.
    ///
    /// # Errors
    /// [`PricingError::Configuration`] when the matrix is not positive
    /// semidefinite.
    pub fn cholesky(&self) -> Result<Vec<Vec<f64>>, PricingError> {
        cholesky_lower_psd(&self.correlation, 1.0e-12).ok_or_else(|| {
            PricingError::Configuration(
                "correlation matrix is not positive semidefinite".to_string(),
            )
        })
    }

    /// Single-asset view of asset `i` (used for per-leg closed-form pricing).
    pub fn asset(&self, i: usize) -> Result<Market, PricingError> {
        if i >= self.n_assets() {
            return Err(PricingError::Configuration(format!(
                "asset index {i} out of range for {} assets",
                self.n_assets()
            )));
        }
        Ok(Market {
            spot: self.spots[i],
            rate: self.rate.clone(),
            dividend_yield: self.dividend_yields[i],
            vol: self.vols[i],
        })
    }
}
