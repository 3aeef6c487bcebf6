//! Black-Scholes-Merton closed forms with continuous dividend yield.
//!
//! These serve three roles: control-variate reference values for the Monte
//! Carlo engines, fast per-leg repricing inside the portfolio risk
//! aggregator, and analytic benchmarks in the test suites.
//!
//! References: Hull, *Options, Futures, and Other Derivatives* (11th ed.),
//! Ch. 15 and 19.

use crate::core::{Greeks, OptionType};
use crate::instruments::VanillaOption;
use crate::market::Market;
use crate::math::normal::{normal_cdf, normal_pdf};

/// Black-Scholes price with continuous dividend yield `q`.
///
/// Edge cases: `t <= 0` returns intrinsic value; `sigma <= 0` returns the
/// discounted deterministic-forward payoff.
pub fn bs_price(option_type: OptionType, s: f64, k: f64, r: f64, q: f64, sigma: f64, t: f64) -> f64 {
    let sign = option_type.sign();
    if t <= 0.0 {
        return (sign * (s - k)).max(0.0);
    }
    let df = (-r * t).exp();
    if sigma <= 0.0 {
        let forward = s * ((r - q) * t).exp();
        return df * (sign * (forward - k)).max(0.0);
    }

    let (d1, d2) = d1_d2(s, k, r, q, sigma, t);
    let s_q = s * (-q * t).exp();
    match option_type {
        OptionType::Call => s_q * normal_cdf(d1) - k * df * normal_cdf(d2),
        OptionType::Put => k * df * normal_cdf(-d2) - s_q * normal_cdf(-d1),
    }
}

/// Black-Scholes Greeks with continuous dividend yield.
///
/// Theta is the calendar-time derivative `dV/dt` (negative carry for long
/// vanilla positions), per year.
pub fn bs_greeks(
    option_type: OptionType,
    s: f64,
    k: f64,
    r: f64,
    q: f64,
    sigma: f64,
    t: f64,
) -> Greeks {
    if t <= 0.0 || sigma <= 0.0 {
        let itm = match option_type {
            OptionType::Call => s > k,
            OptionType::Put => s < k,
        };
        return Greeks {
            delta: if itm { option_type.sign() } else { 0.0 },
            gamma: 0.0,
            vega: 0.0,
            theta: 0.0,
            rho: 0.0,
        };
    }

    let (d1, d2) = d1_d2(s, k, r, q, sigma, t);
    let sqrt_t = t.sqrt();
    let df = (-r * t).exp();
    let dq = (-q * t).exp();
    let pdf_d1 = normal_pdf(d1);

    let gamma = dq * pdf_d1 / (s * sigma * sqrt_t);
    let vega = s * dq * pdf_d1 * sqrt_t;
    let theta_core = -s * dq * pdf_d1 * sigma / (2.0 * sqrt_t);

    match option_type {
        OptionType::Call => Greeks {
            delta: dq * normal_cdf(d1),
            gamma,
            vega,
            theta: theta_core + q * s * dq * normal_cdf(d1) - r * k * df * normal_cdf(d2),
            rho: k * t * df * normal_cdf(d2),
        },
        OptionType::Put => Greeks {
            delta: -dq * normal_cdf(-d1),
            gamma,
            vega,
            theta: theta_core - q * s * dq * normal_cdf(-d1) + r * k * df * normal_cdf(-d2),
            rho: -k * t * df * normal_cdf(-d2),
        },
    }
}

/// Prices a European vanilla against a market snapshot.
///
/// With a rate term structure the average zero rate to expiry is exact here:
/// the Black-Scholes value depends on rates only through the discount factor
/// and the forward.
pub fn bs_price_market(option: &VanillaOption, market: &Market) -> f64 {
    bs_price(
        option.option_type,
        market.spot,
        option.strike,
        market.zero_rate(option.expiry),
        market.dividend_yield,
        market.vol,
        option.expiry,
    )
}

/// Greeks for a European vanilla against a market snapshot.
pub fn bs_greeks_market(option: &VanillaOption, market: &Market) -> Greeks {
    bs_greeks(
        option.option_type,
        market.spot,
        option.strike,
        market.zero_rate(option.expiry),
        market.dividend_yield,
        market.vol,
        option.expiry,
    )
}

#[inline]
fn d1_d2(s: f64, k: f64, r: f64, q: f64, sigma: f64, t: f64) -> (f64, f64) {
    let vt = sigma * t.sqrt();
    let d1 = ((s / k).ln() + (r - q + 0.5 * sigma * sigma) * t) / vt;
    (d1, d1 - vt)
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    // Hull (11th ed.), Ch. 15 reference case: S=42, K=40, r=0.10, sigma=0.2,
    // T=0.5 -> call 4.759, put 0.808.
    #[test]
    fn hull_reference_prices() {
        let call = bs_price(OptionType::Call, 42.0, 40.0, 0.10, 0.0, 0.2, 0.5);
        let put = bs_price(OptionType::Put, 42.0, 40.0, 0.10, 0.0, 0.2, 0.5);
        assert_relative_eq!(call, 4.759, epsilon = 1.0e-3);
        assert_relative_eq!(put, 0.808, epsilon = 1.0e-3);
    }

    #[test]
    fn put_call_parity_holds() {
        let (s, k, r, q, sigma, t) = (100.0, 105.0, 0.05, 0.02, 0.2, 0.5);
        let call = bs_price(OptionType::Call, s, k, r, q, sigma, t);
        let put = bs_price(OptionType::Put, s, k, r, q, sigma, t);
        let parity = s * (-q * t).exp() - k * (-r * t).exp();
        assert_relative_eq!(call - put, parity, epsilon = 1.0e-10);
    }

    #[test]
    fn zero_maturity_collapses_to_intrinsic() {
        assert_eq!(bs_price(OptionType::Call, 110.0, 100.0, 0.05, 0.0, 0.2, 0.0), 10.0);
        assert_eq!(bs_price(OptionType::Put, 110.0, 100.0, 0.05, 0.0, 0.2, 0.0), 0.0);
    }

    #[test]
    fn greeks_match_finite_differences() {
        let (s, k, r, q, sigma, t) = (100.0, 100.0, 0.05, 0.01, 0.2, 1.0);
        let g = bs_greeks(OptionType::Call, s, k, r, q, sigma, t);

        let h = 1.0e-4;
        let up = bs_price(OptionType::Call, s + h, k, r, q, sigma, t);
        let dn = bs_price(OptionType::Call, s - h, k, r, q, sigma, t);
        let mid = bs_price(OptionType::Call, s, k, r, q, sigma, t);
        assert_relative_eq!(g.delta, (up - dn) / (2.0 * h), epsilon = 1.0e-6);
        assert_relative_eq!(g.gamma, (up - 2.0 * mid + dn) / (h * h), epsilon = 1.0e-4);

        let v_up = bs_price(OptionType::Call, s, k, r, q, sigma + h, t);
        let v_dn = bs_price(OptionType::Call, s, k, r, q, sigma - h, t);
        assert_relative_eq!(g.vega, (v_up - v_dn) / (2.0 * h), epsilon = 1.0e-4);

        let r_up = bs_price(OptionType::Call, s, k, r + h, q, sigma, t);
        let r_dn = bs_price(OptionType::Call, s, k, r - h, q, sigma, t);
        assert_relative_eq!(g.rho, (r_up - r_dn) / (2.0 * h), epsilon = 1.0e-4);

        let t_dn = bs_price(OptionType::Call, s, k, r, q, sigma, t - h);
        assert_relative_eq!(g.theta, (t_dn - mid) / h, epsilon = 1.0e-3);
    }

    #[test]
    fn market_facade_uses_average_zero_rate() {
        use crate::market::RateCurve;

        let curve = RateCurve::piecewise(vec![0.5, 1.0], vec![0.04, 0.06]).unwrap();
        let market = Market::builder()
            .spot(100.0)
            .rate_curve(curve.clone())
            .vol(0.2)
            .build()
            .unwrap();
        let option = VanillaOption::european_call(100.0, 1.0);

        let direct = bs_price(OptionType::Call, 100.0, 100.0, curve.zero_rate(1.0), 0.0, 0.2, 1.0);
        assert_relative_eq!(bs_price_market(&option, &market), direct, epsilon = 1.0e-12);
    }
}
