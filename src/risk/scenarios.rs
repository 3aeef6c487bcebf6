//! Deterministic stress scenarios.
//!
//! Stress tests bypass the simulated loss distribution entirely: the book is
//! revalued exactly under a shocked market and the P&L is the difference.

/// A deterministic market shock applied to every underlying at once.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub enum StressScenario {
    /// Proportional spot jump, e.g. `-0.20` for a 20% crash.
    SpotShock { pct: f64 },
    /// Proportional parallel volatility shock, e.g. `0.5` for vols times 1.5.
    VolShock { pct: f64 },
    /// Combined spot and volatility shock.
    SpotAndVol { spot_pct: f64, vol_pct: f64 },
}

impl StressScenario {
    /// Proportional spot move of this scenario.
    #[inline]
    pub fn spot_pct(&self) -> f64 {
        match self {
            Self::SpotShock { pct } => *pct,
            Self::VolShock { .. } => 0.0,
            Self::SpotAndVol { spot_pct, .. } => *spot_pct,
        }
    }

    /// Proportional volatility move of this scenario.
    #[inline]
    pub fn vol_pct(&self) -> f64 {
        match self {
            Self::SpotShock { .. } => 0.0,
            Self::VolShock { pct } => *pct,
            Self::SpotAndVol { vol_pct, .. } => *vol_pct,
        }
    }
}
