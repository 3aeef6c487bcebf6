//! Longstaff-Schwartz least-squares Monte Carlo for early exercise.
//!
//! Backward induction over the simulated grid: at each exercise date the
//! discounted *realized* cashflows of in-the-money paths are regressed on a
//! polynomial basis of spot, and a path exercises when intrinsic value beats
//! the fitted continuation. Out-of-the-money paths never enter the
//! regression (fitting them drags the conditional expectation toward zero
//! payoffs and distorts the boundary).
//!
//! The regression-pass estimate carries a small upward (foresight) bias
//! because the fitted policy has seen the same paths it is evaluated on.
//! [`LongstaffSchwartzEngine::with_two_pass`] reprices an independent path
//! set under the frozen policy, which is the standard low-biased counterpart.
//!
//! References:
//! - Longstaff and Schwartz (2001), *Valuing American Options by Simulation*.
//! - Glasserman (2004), Ch. 8.

use nalgebra::{DMatrix, DVector};

use crate::core::{
    DiagKey, EstimateResult, ExerciseStyle, OptionType, PricingEngine, PricingError,
};
use crate::engines::monte_carlo::path_set::{PathSet, SimulationConfig, simulate_gbm_paths};
use crate::instruments::VanillaOption;
use crate::market::Market;

/// Seed salt separating the out-of-sample path set from the regression set.
const SECOND_PASS_SALT: u64 = 0x9E37_79B9_7F4A_7C15;

/// Exercise-boundary point at one decision date.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ExerciseBoundaryPoint {
    /// Decision date in year fractions.
    pub time: f64,
    /// Estimated optimal boundary (`S*`); `None` when no path exercised.
    pub boundary_spot: Option<f64>,
    /// Number of in-the-money paths used for the regression.
    pub itm_paths: usize,
    /// Number of paths that exercised under the policy.
    pub exercised_paths: usize,
}

/// LSM output: headline estimate plus the in-sample estimate and the
/// exercise-boundary diagnostics.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct LsmOutput {
    /// Two-pass (policy) estimate when enabled, otherwise the in-sample one.
    pub result: EstimateResult,
    /// Estimate from the regression pass itself.
    pub in_sample: EstimateResult,
    /// Exercise boundary across decision dates in chronological order.
    pub exercise_boundary: Vec<ExerciseBoundaryPoint>,
}

/// Per-run realized-cashflow table: one amount and its time-step index per
/// path. Overwriting an entry at an earlier date enforces at-most-one
/// exercise per path; discounting always runs from the actual cashflow date.
struct CashflowMatrix {
    amount: Vec<f64>,
    step: Vec<usize>,
}

impl CashflowMatrix {
    fn at_maturity(paths: &PathSet, instrument: &VanillaOption) -> Self {
        let terminal_step = paths.num_steps();
        let n = paths.num_paths();
        Self {
            amount: (0..n)
                .map(|p| instrument.intrinsic(paths.value(p, terminal_step, 0)))
                .collect(),
            step: vec![terminal_step; n],
        }
    }

    fn exercise(&mut self, path: usize, amount: f64, step: usize) {
        self.amount[path] = amount;
        self.step[path] = step;
    }

    fn discounted_to_valuation(&self, market: &Market, times: &[f64]) -> Vec<f64> {
        self.amount
            .iter()
            .zip(self.step.iter())
            .map(|(&amount, &step)| amount * market.rate.discount_factor(times[step]))
            .collect()
    }
}

/// Longstaff-Schwartz least-squares Monte Carlo engine.
#[derive(Debug, Clone)]
pub struct LongstaffSchwartzEngine {
    /// Simulation budget and random-stream policy.
    pub config: SimulationConfig,
    /// Polynomial basis degree (default cubic).
    pub degree: usize,
    /// Reprice an independent path set under the frozen policy.
    pub two_pass: bool,
    /// Confidence level for the reported intervals.
    pub confidence: f64,
}

impl LongstaffSchwartzEngine {
    /// Creates an engine with the default cubic basis.
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            degree: 3,
            two_pass: false,
            confidence: 0.95,
        }
    }

    /// Sets the polynomial basis degree.
    pub fn with_degree(mut self, degree: usize) -> Self {
        self.degree = degree;
        self
    }

    /// Enables the out-of-sample second pass.
    pub fn with_two_pass(mut self) -> Self {
        self.two_pass = true;
        self
    }

    /// Sets the confidence level of the reported intervals.
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    /// Prices the option and returns boundary diagnostics alongside.
    ///
    /// # Errors
    /// [`PricingError::Configuration`] for invalid inputs,
    /// [`PricingError::Regression`] when an exercise date has too few
    /// in-the-money paths for the basis degree or the normal equations are
    /// singular. The basis degree is never silently reduced.
    pub fn price_with_diagnostics(
        &self,
        instrument: &VanillaOption,
        market: &Market,
    ) -> Result<LsmOutput, PricingError> {
        instrument.validate()?;
        self.config.validate()?;
        if self.degree == 0 {
            return Err(PricingError::Configuration(
                "LSM basis degree must be >= 1".to_string(),
            ));
        }
        if self.config.num_steps < 2 {
            return Err(PricingError::Configuration(
                "LSM needs num_steps >= 2 for an interior exercise date".to_string(),
            ));
        }

        if instrument.expiry == 0.0 {
            let exact = EstimateResult::exact(instrument.intrinsic(market.spot), self.confidence)?;
            return Ok(LsmOutput {
                result: exact.clone(),
                in_sample: exact,
                exercise_boundary: Vec::new(),
            });
        }

        let paths = simulate_gbm_paths(market, &self.config, instrument.expiry)?;
        let (cashflows, policy, exercise_boundary) =
            self.backward_pass(&paths, instrument, market)?;

        let discounted = cashflows.discounted_to_valuation(market, paths.times());
        let in_sample = self.summarize(discounted, market)?;

        let result = if self.two_pass {
            let mut second_config = self.config.clone();
            second_config.seed = self.config.seed.map(|s| s.wrapping_add(SECOND_PASS_SALT));
            let fresh = simulate_gbm_paths(market, &second_config, instrument.expiry)?;
            let replayed = self.forward_pass(&fresh, instrument, &policy);
            let discounted = replayed.discounted_to_valuation(market, fresh.times());
            self.summarize(discounted, market)?
        } else {
            in_sample.clone()
        };

        Ok(LsmOutput {
            result,
            in_sample,
            exercise_boundary,
        })
    }

    /// Backward induction: regress, compare, overwrite cashflows.
    #[allow(clippy::type_complexity)]
    fn backward_pass(
        &self,
        paths: &PathSet,
        instrument: &VanillaOption,
        market: &Market,
    ) -> Result<(CashflowMatrix, Vec<Option<DVector<f64>>>, Vec<ExerciseBoundaryPoint>), PricingError>
    {
        let num_steps = paths.num_steps();
        let times = paths.times();
        let n_paths = paths.num_paths();
        let strike = instrument.strike;
        let american = instrument.exercise == ExerciseStyle::American;

        let mut cashflows = CashflowMatrix::at_maturity(paths, instrument);
        let mut policy: Vec<Option<DVector<f64>>> = vec![None; num_steps + 1];
        let mut boundary_rev = Vec::new();

        let terminal_itm = cashflows.amount.iter().filter(|a| **a > 0.0).count();
        boundary_rev.push(ExerciseBoundaryPoint {
            time: times[num_steps],
            boundary_spot: Some(strike),
            itm_paths: terminal_itm,
            exercised_paths: terminal_itm,
        });

        if american {
            for ti in (1..num_steps).rev() {
                let itm: Vec<usize> = (0..n_paths)
                    .filter(|&p| instrument.intrinsic(paths.value(p, ti, 0)) > 0.0)
                    .collect();

                if itm.is_empty() {
                    boundary_rev.push(ExerciseBoundaryPoint {
                        time: times[ti],
                        boundary_spot: None,
                        itm_paths: 0,
                        exercised_paths: 0,
                    });
                    continue;
                }
                if itm.len() <= self.degree {
                    return Err(PricingError::Regression(format!(
                        "{} in-the-money paths cannot support a degree-{} basis at t={:.4}",
                        itm.len(),
                        self.degree,
                        times[ti]
                    )));
                }

                // Target: the cashflow each path actually realizes under the
                // policy fixed so far, discounted from its cashflow date back
                // to this decision date. Regressors are scaled by strike to
                // keep the normal equations well conditioned at high degree.
                let xs: Vec<f64> = itm
                    .iter()
                    .map(|&p| paths.value(p, ti, 0) / strike)
                    .collect();
                let ys: Vec<f64> = itm
                    .iter()
                    .map(|&p| {
                        let df = market
                            .rate
                            .discount_between(times[ti], times[cashflows.step[p]]);
                        cashflows.amount[p] * df
                    })
                    .collect();
                let beta = regress_polynomial(&xs, &ys, self.degree, times[ti])?;

                let mut exercised_spots = Vec::new();
                for &p in &itm {
                    let spot = paths.value(p, ti, 0);
                    let continuation = eval_polynomial(&beta, spot / strike);
                    let exercise_value = instrument.intrinsic(spot);
                    if exercise_value > continuation {
                        cashflows.exercise(p, exercise_value, ti);
                        exercised_spots.push(spot);
                    }
                }

                boundary_rev.push(ExerciseBoundaryPoint {
                    time: times[ti],
                    boundary_spot: boundary_from_exercised(
                        instrument.option_type,
                        &exercised_spots,
                    ),
                    itm_paths: itm.len(),
                    exercised_paths: exercised_spots.len(),
                });
                policy[ti] = Some(beta);
            }
        }

        boundary_rev.reverse();
        Ok((cashflows, policy, boundary_rev))
    }

    /// Forward sweep of a fresh path set under the frozen exercise rule.
    fn forward_pass(
        &self,
        paths: &PathSet,
        instrument: &VanillaOption,
        policy: &[Option<DVector<f64>>],
    ) -> CashflowMatrix {
        let num_steps = paths.num_steps();
        let strike = instrument.strike;
        let mut cashflows = CashflowMatrix::at_maturity(paths, instrument);

        for p in 0..paths.num_paths() {
            for (ti, beta) in policy.iter().enumerate().take(num_steps).skip(1) {
                let Some(beta) = beta else { continue };
                let spot = paths.value(p, ti, 0);
                let exercise_value = instrument.intrinsic(spot);
                if exercise_value > 0.0 && exercise_value > eval_polynomial(beta, spot / strike) {
                    cashflows.exercise(p, exercise_value, ti);
                    break;
                }
            }
        }

        cashflows
    }

    fn summarize(
        &self,
        discounted: Vec<f64>,
        market: &Market,
    ) -> Result<EstimateResult, PricingError> {
        let samples = if self.config.antithetic {
            discounted
                .chunks_exact(2)
                .map(|pair| 0.5 * (pair[0] + pair[1]))
                .collect()
        } else {
            discounted
        };

        let mut result = EstimateResult::from_samples(&samples, self.confidence)?;
        result
            .diagnostics
            .insert(DiagKey::NumPaths, self.config.effective_paths() as f64);
        result
            .diagnostics
            .insert(DiagKey::NumSteps, self.config.num_steps as f64);
        result.diagnostics.insert(DiagKey::Vol, market.vol);
        result.diagnostics.insert(
            DiagKey::ExerciseDates,
            self.config.num_steps as f64,
        );
        Ok(result)
    }
}

impl PricingEngine<VanillaOption> for LongstaffSchwartzEngine {
    fn price(
        &self,
        instrument: &VanillaOption,
        market: &Market,
    ) -> Result<EstimateResult, PricingError> {
        self.price_with_diagnostics(instrument, market)
            .map(|out| out.result)
    }
}

fn boundary_from_exercised(option_type: OptionType, exercised_spots: &[f64]) -> Option<f64> {
    if exercised_spots.is_empty() {
        return None;
    }
    match option_type {
        OptionType::Put => exercised_spots.iter().copied().reduce(f64::max),
        OptionType::Call => exercised_spots.iter().copied().reduce(f64::min),
    }
}

/// Least-squares polynomial fit via the normal equations.
fn regress_polynomial(
    xs: &[f64],
    ys: &[f64],
    degree: usize,
    time: f64,
) -> Result<DVector<f64>, PricingError> {
    let dim = degree + 1;
    let mut moments = vec![0.0_f64; 2 * degree + 1];
    let mut rhs = vec![0.0_f64; dim];

    for (&x, &y) in xs.iter().zip(ys.iter()) {
        let mut power = 1.0;
        for k in 0..moments.len() {
            moments[k] += power;
            if k < dim {
                rhs[k] += power * y;
            }
            power *= x;
        }
    }

    let xtx = DMatrix::from_fn(dim, dim, |i, j| moments[i + j]);
    let xty = DVector::from_vec(rhs);
    xtx.lu().solve(&xty).ok_or_else(|| {
        PricingError::Regression(format!(
            "singular normal equations for degree-{degree} basis at t={time:.4}"
        ))
    })
}

#[inline]
fn eval_polynomial(beta: &DVector<f64>, x: f64) -> f64 {
    let mut value = 0.0;
    for k in (0..beta.len()).rev() {
        value = value * x + beta[k];
    }
    value
}
