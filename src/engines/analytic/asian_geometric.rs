//! Closed form for discrete geometric-average Asian options.
//!
//! Under GBM the geometric average of lognormals is itself lognormal, so the
//! fixed-strike geometric Asian prices in closed form. The Monte Carlo engine
//! uses this as the control-variate reference for arithmetic Asians
//! (Kemna & Vorst 1990).

use crate::core::OptionType;
use crate::market::RateCurve;
use crate::math::normal::normal_cdf;

/// Price of a discrete fixed-strike geometric Asian option.
///
/// `observation_times` must be sorted ascending; the payoff is discounted
/// from `expiry`.
pub fn geometric_asian_price(
    option_type: OptionType,
    s: f64,
    k: f64,
    r: f64,
    q: f64,
    sigma: f64,
    observation_times: &[f64],
    expiry: f64,
) -> f64 {
    debug_assert!(!observation_times.is_empty());
    let n = observation_times.len() as f64;
    let df = (-r * expiry).exp();

    let mean_time = observation_times.iter().sum::<f64>() / n;
    // ln G is normal with mean m and variance v:
    //   m = ln S + (r - q - sigma^2/2) * tbar
    //   v = sigma^2 / n^2 * sum_{i,j} min(t_i, t_j)
    // For sorted times the double sum telescopes to sum_k (2(n-k)+1) t_k.
    let m = s.ln() + (r - q - 0.5 * sigma * sigma) * mean_time;
    let min_sum: f64 = observation_times
        .iter()
        .enumerate()
        .map(|(idx, &t)| (2.0 * (n - (idx as f64 + 1.0)) + 1.0) * t)
        .sum();
    let v = sigma * sigma * min_sum / (n * n);

    if v <= 0.0 {
        let g = m.exp();
        return df * (option_type.sign() * (g - k)).max(0.0);
    }

    let sqrt_v = v.sqrt();
    let d1 = (m - k.ln() + v) / sqrt_v;
    let d2 = d1 - sqrt_v;
    let forward_g = (m + 0.5 * v).exp();

    match option_type {
        OptionType::Call => df * (forward_g * normal_cdf(d1) - k * normal_cdf(d2)),
        OptionType::Put => df * (k * normal_cdf(-d2) - forward_g * normal_cdf(-d1)),
    }
}

/// Undiscounted expectation of the geometric-Asian payoff under a rate term
/// structure (the control-variate reference).
///
/// The drift of each `ln S(t_i)` uses the exact integrated forward rate, so
/// the expectation stays unbiased when rates are not flat.
pub fn geometric_asian_expected_payoff(
    option_type: OptionType,
    s: f64,
    k: f64,
    q: f64,
    sigma: f64,
    observation_times: &[f64],
    rate: &RateCurve,
) -> f64 {
    debug_assert!(!observation_times.is_empty());
    let n = observation_times.len() as f64;

    let mean_rate_integral = observation_times
        .iter()
        .map(|&t| rate.zero_integral(t))
        .sum::<f64>()
        / n;
    let mean_time = observation_times.iter().sum::<f64>() / n;
    let m = s.ln() + mean_rate_integral - (q + 0.5 * sigma * sigma) * mean_time;

    let min_sum: f64 = observation_times
        .iter()
        .enumerate()
        .map(|(idx, &t)| (2.0 * (n - (idx as f64 + 1.0)) + 1.0) * t)
        .sum();
    let v = sigma * sigma * min_sum / (n * n);

    if v <= 0.0 {
        let g = m.exp();
        return (option_type.sign() * (g - k)).max(0.0);
    }

    let sqrt_v = v.sqrt();
    let d1 = (m - k.ln() + v) / sqrt_v;
    let d2 = d1 - sqrt_v;
    let forward_g = (m + 0.5 * v).exp();

    match option_type {
        OptionType::Call => forward_g * normal_cdf(d1) - k * normal_cdf(d2),
        OptionType::Put => k * normal_cdf(-d2) - forward_g * normal_cdf(-d1),
    }
}
