//! Simulation configuration, the owned path tensor, and the GBM simulators.
//!
//! Paths use the exact lognormal GBM transition, so there is no
//! discretization bias at any step count. Every path (or antithetic pair)
//! draws from its own deterministic sub-stream of the base seed; the output
//! is therefore identical however the work is batched across threads.
//!
//! References: Glasserman (2004), Ch. 2-4 for exact simulation, antithetic
//! pairing, and terminal stratification.

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::core::PricingError;
use crate::market::{Market, MultiAssetMarket};
use crate::math::fast_rng::{
    Xoshiro256PlusPlus, resolve_base_seed, sample_standard_normal, stream_seed, uniform_open01,
};
use crate::math::normal::normal_inv_cdf;

/// Caller-supplied simulation budget and random-stream policy.
///
/// `seed: None` makes the call non-reproducible (a fresh base seed is drawn
/// from process entropy). With `antithetic` an odd path budget is rounded up
/// to the next even count so every path has a mirrored partner.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct SimulationConfig {
    /// Number of simulated paths.
    pub num_paths: usize,
    /// Number of time steps per path.
    pub num_steps: usize,
    /// Base RNG seed; `None` draws one from entropy per call.
    pub seed: Option<u64>,
    /// Mirror every drawn normal vector into a paired path.
    pub antithetic: bool,
    /// Stratify the terminal draw (single-asset only).
    pub stratified: bool,
}

impl SimulationConfig {
    /// Creates a config with the given path and step budget.
    pub fn new(num_paths: usize, num_steps: usize) -> Self {
        Self {
            num_paths,
            num_steps,
            seed: None,
            antithetic: false,
            stratified: false,
        }
    }

    /// Sets a reproducible base seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Enables/disables antithetic path mirroring.
    pub fn with_antithetic(mut self, antithetic: bool) -> Self {
        self.antithetic = antithetic;
        self
    }

    /// Enables/disables terminal stratified sampling.
    pub fn with_stratified(mut self, stratified: bool) -> Self {
        self.stratified = stratified;
        self
    }

    /// Number of independent random draws: pairs count once when antithetic.
    #[inline]
    pub fn sample_count(&self) -> usize {
        if self.antithetic {
            self.num_paths.div_ceil(2)
        } else {
            self.num_paths
        }
    }

    /// Number of paths actually simulated (rounds odd antithetic budgets up).
    #[inline]
    pub fn effective_paths(&self) -> usize {
        if self.antithetic {
            2 * self.sample_count()
        } else {
            self.num_paths
        }
    }

    /// Validates the budget.
    ///
    /// # Errors
    /// [`PricingError::Configuration`] when paths or steps are zero.
    pub fn validate(&self) -> Result<(), PricingError> {
        if self.num_paths == 0 {
            return Err(PricingError::Configuration(
                "num_paths must be >= 1".to_string(),
            ));
        }
        if self.num_steps == 0 {
            return Err(PricingError::Configuration(
                "num_steps must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Owned tensor of simulated prices: `paths x time points x assets`.
///
/// Created once per pricing call and destroyed with it; never cached or
/// shared between calls. Antithetic partners occupy adjacent path rows
/// `(2i, 2i + 1)`.
#[derive(Debug, Clone, PartialEq)]
pub struct PathSet {
    data: Vec<f64>,
    num_paths: usize,
    num_points: usize,
    num_assets: usize,
    times: Vec<f64>,
}

impl PathSet {
    fn new(num_paths: usize, num_points: usize, num_assets: usize, times: Vec<f64>) -> Self {
        Self {
            data: vec![0.0; num_paths * num_points * num_assets],
            num_paths,
            num_points,
            num_assets,
            times,
        }
    }

    /// Number of simulated paths.
    #[inline]
    pub fn num_paths(&self) -> usize {
        self.num_paths
    }

    /// Number of time steps (`time points - 1`).
    #[inline]
    pub fn num_steps(&self) -> usize {
        self.num_points - 1
    }

    /// Number of assets per time point.
    #[inline]
    pub fn num_assets(&self) -> usize {
        self.num_assets
    }

    /// Simulation time grid, `times[0] = 0` through maturity.
    #[inline]
    pub fn times(&self) -> &[f64] {
        &self.times
    }

    /// Price of `asset` on `path` at time index `step`.
    #[inline]
    pub fn value(&self, path: usize, step: usize, asset: usize) -> f64 {
        self.data[(path * self.num_points + step) * self.num_assets + asset]
    }

    /// Full single-asset trajectory of one path.
    ///
    /// Panics if the set holds more than one asset.
    #[inline]
    pub fn path(&self, path: usize) -> &[f64] {
        assert_eq!(self.num_assets, 1, "path() requires a single-asset PathSet");
        let start = path * self.num_points;
        &self.data[start..start + self.num_points]
    }

    /// Terminal price of `asset` on `path`.
    #[inline]
    pub fn terminal(&self, path: usize, asset: usize) -> f64 {
        self.value(path, self.num_points - 1, asset)
    }
}

/// Exact-GBM single-asset path recursion with a per-step drift schedule.
///
/// The schedule folds the integrated forward rate over each step together
/// with the dividend and convexity terms, so a term structure of rates is
/// handled without approximation.
#[derive(Debug, Clone)]
pub struct GbmPathGenerator {
    s0: f64,
    sigma_sqrt_dt: f64,
    step_drifts: Vec<f64>,
}

impl GbmPathGenerator {
    /// Builds the generator for `steps` equal steps to `maturity`.
    pub fn from_market(market: &Market, steps: usize, maturity: f64) -> Self {
        let dt = maturity / steps as f64;
        let q = market.dividend_yield;
        let half_var = 0.5 * market.vol * market.vol;
        let step_drifts = (0..steps)
            .map(|i| {
                let t0 = dt * i as f64;
                let t1 = dt * (i + 1) as f64;
                (market.rate.zero_integral(t1) - market.rate.zero_integral(t0))
                    - (q + half_var) * dt
            })
            .collect();
        Self {
            s0: market.spot,
            sigma_sqrt_dt: market.vol * dt.sqrt(),
            step_drifts,
        }
    }

    /// Number of steps per path.
    #[inline]
    pub fn steps(&self) -> usize {
        self.step_drifts.len()
    }

    /// Writes one path into `out` (`out.len() == steps + 1`) from one normal
    /// draw per step.
    #[inline]
    pub fn generate_into(&self, normals: &[f64], out: &mut [f64]) {
        let mut s = self.s0;
        out[0] = s;
        for (j, (&z, &drift)) in normals.iter().zip(self.step_drifts.iter()).enumerate() {
            s *= self.sigma_sqrt_dt.mul_add(z, drift).exp();
            out[j + 1] = s;
        }
    }
}

/// Fills one sample's normal draws, stratifying the terminal draw on request.
///
/// Stratum `sample_idx` of `n_samples` maps its terminal uniform into
/// `[(i) / n, (i + 1) / n)`, which covers the tails evenly at equal budget.
#[inline]
pub(crate) fn fill_sample_normals(
    rng: &mut Xoshiro256PlusPlus,
    z: &mut [f64],
    stratified: bool,
    sample_idx: usize,
    n_samples: usize,
) {
    let last = z.len() - 1;
    for (j, slot) in z.iter_mut().enumerate() {
        if stratified && j == last {
            let u = (sample_idx as f64 + rng.next_f64()) / n_samples as f64;
            *slot = normal_inv_cdf(uniform_open01(u));
        } else {
            *slot = sample_standard_normal(rng);
        }
    }
}

/// Simulates a single-asset GBM [`PathSet`].
///
/// # Errors
/// [`PricingError::Configuration`] for an invalid budget or non-positive
/// maturity.
pub fn simulate_gbm_paths(
    market: &Market,
    config: &SimulationConfig,
    maturity: f64,
) -> Result<PathSet, PricingError> {
    config.validate()?;
    if !maturity.is_finite() || maturity <= 0.0 {
        return Err(PricingError::Configuration(
            "simulation maturity must be > 0".to_string(),
        ));
    }

    let steps = config.num_steps;
    let num_points = steps + 1;
    let n_paths = config.effective_paths();
    let samples = config.sample_count();
    let paths_per_sample = if config.antithetic { 2 } else { 1 };
    let base_seed = resolve_base_seed(config.seed);
    let generator = GbmPathGenerator::from_market(market, steps, maturity);

    let times: Vec<f64> = (0..=steps)
        .map(|i| maturity * i as f64 / steps as f64)
        .collect();
    let mut set = PathSet::new(n_paths, num_points, 1, times);

    let stratified = config.stratified;
    let antithetic = config.antithetic;
    let fill_sample = |i: usize, chunk: &mut [f64]| {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(stream_seed(base_seed, i));
        let mut z = vec![0.0_f64; steps];
        fill_sample_normals(&mut rng, &mut z, stratified, i, samples);

        generator.generate_into(&z, &mut chunk[..num_points]);
        if antithetic {
            for v in z.iter_mut() {
                *v = -*v;
            }
            generator.generate_into(&z, &mut chunk[num_points..]);
        }
    };

    let chunk_len = paths_per_sample * num_points;
    #[cfg(feature = "parallel")]
    set.data
        .par_chunks_mut(chunk_len)
        .enumerate()
        .for_each(|(i, chunk)| fill_sample(i, chunk));
    #[cfg(not(feature = "parallel"))]
    set.data
        .chunks_mut(chunk_len)
        .enumerate()
        .for_each(|(i, chunk)| fill_sample(i, chunk));

    Ok(set)
}

/// Simulates a correlated multi-asset GBM [`PathSet`].
///
/// Independent draws are mixed through the lower Cholesky factor of the
/// market's correlation matrix at every step.
///
/// # Errors
/// [`PricingError::Configuration`] for an invalid budget, non-positive
/// maturity, a non-PSD correlation matrix, or a stratification request
/// (terminal stratification is defined for single-asset simulation only).
pub fn simulate_correlated_paths(
    market: &MultiAssetMarket,
    config: &SimulationConfig,
    maturity: f64,
) -> Result<PathSet, PricingError> {
    config.validate()?;
    if !maturity.is_finite() || maturity <= 0.0 {
        return Err(PricingError::Configuration(
            "simulation maturity must be > 0".to_string(),
        ));
    }
    if config.stratified {
        return Err(PricingError::Configuration(
            "stratified sampling is defined for single-asset simulation only".to_string(),
        ));
    }

    let n_assets = market.n_assets();
    let chol = market.cholesky()?;
    let steps = config.num_steps;
    let num_points = steps + 1;
    let dt = maturity / steps as f64;
    let sqrt_dt = dt.sqrt();
    let samples = config.sample_count();
    let n_paths = config.effective_paths();
    let paths_per_sample = if config.antithetic { 2 } else { 1 };
    let base_seed = resolve_base_seed(config.seed);

    // Shared rate integral per step; dividend/convexity differ per asset.
    let rate_steps: Vec<f64> = (0..steps)
        .map(|i| {
            market.rate.zero_integral(dt * (i + 1) as f64)
                - market.rate.zero_integral(dt * i as f64)
        })
        .collect();
    let asset_adjust: Vec<f64> = (0..n_assets)
        .map(|a| (market.dividend_yields[a] + 0.5 * market.vols[a] * market.vols[a]) * dt)
        .collect();

    let times: Vec<f64> = (0..=steps)
        .map(|i| maturity * i as f64 / steps as f64)
        .collect();
    let mut set = PathSet::new(n_paths, num_points, n_assets, times);

    let antithetic = config.antithetic;
    let fill_sample = |i: usize, chunk: &mut [f64]| {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(stream_seed(base_seed, i));
        let mut indep = vec![0.0_f64; n_assets];
        let mut corr = vec![0.0_f64; n_assets];
        // Draws are stored so the mirror path can replay them negated.
        let mut draws = vec![0.0_f64; steps * n_assets];

        for step in 0..steps {
            for slot in indep.iter_mut() {
                *slot = sample_standard_normal(&mut rng);
            }
            crate::math::correlation::correlate_normals(&chol, &indep, &mut corr);
            draws[step * n_assets..(step + 1) * n_assets].copy_from_slice(&corr);
        }

        let mut write_path = |offset: usize, sign: f64| {
            for a in 0..n_assets {
                chunk[offset + a] = market.spots[a];
            }
            for step in 0..steps {
                let prev = offset + step * n_assets;
                let next = offset + (step + 1) * n_assets;
                for a in 0..n_assets {
                    let z = sign * draws[step * n_assets + a];
                    let drift = rate_steps[step] - asset_adjust[a];
                    chunk[next + a] = chunk[prev + a]
                        * (market.vols[a] * sqrt_dt).mul_add(z, drift).exp();
                }
            }
        };

        write_path(0, 1.0);
        if antithetic {
            write_path(num_points * n_assets, -1.0);
        }
    };

    let chunk_len = paths_per_sample * num_points * n_assets;
    #[cfg(feature = "parallel")]
    set.data
        .par_chunks_mut(chunk_len)
        .enumerate()
        .for_each(|(i, chunk)| fill_sample(i, chunk));
    #[cfg(not(feature = "parallel"))]
    set.data
        .chunks_mut(chunk_len)
        .enumerate()
        .for_each(|(i, chunk)| fill_sample(i, chunk));

    Ok(set)
}
