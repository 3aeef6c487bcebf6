//! Longstaff-Schwartz LSM reference tests.
//!
//! Reference values from Longstaff & Schwartz (2001) "Valuing American
//! Options by Simulation", Table 1. Because the engine is Monte Carlo based,
//! tolerances are wider than analytic tests.

use openmonte::core::{OptionType, PricingEngine, PricingError};
use openmonte::engines::analytic::bs_price;
use openmonte::engines::lsm::LongstaffSchwartzEngine;
use openmonte::engines::monte_carlo::SimulationConfig;
use openmonte::instruments::VanillaOption;
use openmonte::market::Market;

fn market(spot: f64, rate: f64, vol: f64) -> Market {
    Market::builder()
        .spot(spot)
        .rate(rate)
        .vol(vol)
        .build()
        .unwrap()
}

// ============================================================================
// Longstaff-Schwartz (2001) Table 1 -- American put, K=40, r=0.06, q=0.
// ============================================================================

struct LsmAmericanPutCase {
    spot: f64,
    sigma: f64,
    expiry: f64,
    expected: f64,
}

fn longstaff_schwartz_table1_cases() -> Vec<LsmAmericanPutCase> {
    vec![
        LsmAmericanPutCase { spot: 36.0, sigma: 0.20, expiry: 1.0, expected: 4.478 },
        LsmAmericanPutCase { spot: 36.0, sigma: 0.40, expiry: 2.0, expected: 8.508 },
        LsmAmericanPutCase { spot: 38.0, sigma: 0.20, expiry: 1.0, expected: 3.250 },
        LsmAmericanPutCase { spot: 40.0, sigma: 0.20, expiry: 1.0, expected: 2.314 },
        LsmAmericanPutCase { spot: 42.0, sigma: 0.40, expiry: 2.0, expected: 6.248 },
        LsmAmericanPutCase { spot: 44.0, sigma: 0.20, expiry: 2.0, expected: 1.675 },
    ]
}

#[test]
fn lsm_matches_longstaff_schwartz_table1() {
    let engine = LongstaffSchwartzEngine::new(SimulationConfig::new(50_000, 50).with_seed(42));

    for (i, case) in longstaff_schwartz_table1_cases().iter().enumerate() {
        let option = VanillaOption::american_put(40.0, case.expiry);
        let m = market(case.spot, 0.06, case.sigma);

        let result = engine.price(&option, &m).unwrap();
        let error = (result.price - case.expected).abs();
        assert!(
            error <= 0.12,
            "Table 1 case {i}: S={} sigma={} T={} expected={} got={:.4}",
            case.spot,
            case.sigma,
            case.expiry,
            case.expected,
            result.price
        );
    }
}

// ============================================================================
// Early-exercise premium: American put >= European put (closed form),
// minus one standard error of tolerance. Spec case: S=100, K=105, T=1.
// ============================================================================

#[test]
fn american_put_dominates_european_closed_form() {
    let option = VanillaOption::american_put(105.0, 1.0);
    let m = market(100.0, 0.05, 0.2);
    let engine = LongstaffSchwartzEngine::new(SimulationConfig::new(50_000, 50).with_seed(42));

    let result = engine.price(&option, &m).unwrap();
    let european = bs_price(OptionType::Put, 100.0, 105.0, 0.05, 0.0, 0.2, 1.0);
    assert!(
        result.price >= european - result.std_error,
        "american={} european={european} stderr={}",
        result.price,
        result.std_error
    );
}

#[test]
fn american_call_without_dividends_tracks_european() {
    // No dividends means no early-exercise premium for calls.
    let option = VanillaOption::american_call(100.0, 1.0);
    let m = market(100.0, 0.05, 0.3);
    let engine = LongstaffSchwartzEngine::new(SimulationConfig::new(50_000, 50).with_seed(42));

    let result = engine.price(&option, &m).unwrap();
    let european = bs_price(OptionType::Call, 100.0, 100.0, 0.05, 0.0, 0.3, 1.0);
    assert!(
        (result.price - european).abs() <= 4.0 * result.std_error + 0.05,
        "american={} european={european}",
        result.price
    );
}

// ============================================================================
// Basis-degree sensitivity: raising the degree beyond 1 must not push the
// estimate below immediate-exercise intrinsic value.
// ============================================================================

#[test]
fn higher_basis_degrees_never_drop_below_intrinsic() {
    let option = VanillaOption::american_put(105.0, 1.0);
    let m = market(100.0, 0.05, 0.2);
    let intrinsic = 5.0;

    let mut prices = Vec::new();
    for degree in 2..=5 {
        let engine = LongstaffSchwartzEngine::new(SimulationConfig::new(30_000, 50).with_seed(42))
            .with_degree(degree);
        let result = engine.price(&option, &m).unwrap();
        assert!(
            result.price >= intrinsic - 3.0 * result.std_error,
            "degree {degree}: price {} below intrinsic {intrinsic}",
            result.price
        );
        prices.push(result.price);
    }

    // The policy estimates agree across degrees within Monte Carlo noise.
    let spread = prices.iter().cloned().fold(f64::MIN, f64::max)
        - prices.iter().cloned().fold(f64::MAX, f64::min);
    assert!(spread <= 0.15, "degree sweep spread {spread}: {prices:?}");
}

// ============================================================================
// Two-pass mode: the out-of-sample estimate removes foresight bias, so it
// sits at or below the in-sample estimate up to Monte Carlo noise.
// ============================================================================

#[test]
fn two_pass_estimate_is_consistent_and_lower_biased() {
    let option = VanillaOption::american_put(40.0, 1.0);
    let m = market(36.0, 0.06, 0.2);
    let engine = LongstaffSchwartzEngine::new(SimulationConfig::new(50_000, 50).with_seed(42))
        .with_two_pass();

    let out = engine.price_with_diagnostics(&option, &m).unwrap();
    let noise = 3.0 * (out.result.std_error + out.in_sample.std_error);

    assert!(
        out.result.price <= out.in_sample.price + noise,
        "policy estimate {} above in-sample {} beyond noise",
        out.result.price,
        out.in_sample.price
    );
    // Both passes price the same contract.
    assert!((out.result.price - out.in_sample.price).abs() <= 0.15);
    // And the policy estimate still clears the European floor.
    let european = bs_price(OptionType::Put, 36.0, 40.0, 0.06, 0.0, 0.2, 1.0);
    assert!(out.result.price >= european - out.result.std_error);
}

// ============================================================================
// Boundary diagnostics and failure surface.
// ============================================================================

#[test]
fn exercise_boundary_for_a_put_sits_below_strike() {
    let option = VanillaOption::american_put(40.0, 1.0);
    let m = market(40.0, 0.06, 0.2);
    let engine = LongstaffSchwartzEngine::new(SimulationConfig::new(30_000, 50).with_seed(42));

    let out = engine.price_with_diagnostics(&option, &m).unwrap();
    assert!(!out.exercise_boundary.is_empty());

    // Away from maturity the optimal put boundary lies strictly below strike.
    for point in out
        .exercise_boundary
        .iter()
        .filter(|p| p.time < 0.9 && p.exercised_paths > 0)
    {
        let boundary = point.boundary_spot.unwrap();
        assert!(
            boundary < 40.0,
            "boundary {boundary} at t={} not below strike",
            point.time
        );
    }
}

#[test]
fn insufficient_itm_paths_surface_as_regression_error() {
    // All eight paths are deep in the money, so the ITM count equals the
    // path count and cannot support an equal-degree basis.
    let option = VanillaOption::american_put(500.0, 1.0);
    let engine = LongstaffSchwartzEngine::new(SimulationConfig::new(8, 10).with_seed(3))
        .with_degree(8);

    let err = engine.price(&option, &market(100.0, 0.05, 0.2)).unwrap_err();
    assert!(matches!(err, PricingError::Regression(_)), "got {err}");
}

#[test]
fn antithetic_lsm_reports_pair_count_and_reproduces() {
    let option = VanillaOption::american_put(40.0, 1.0);
    let m = market(38.0, 0.06, 0.2);
    let engine = LongstaffSchwartzEngine::new(
        SimulationConfig::new(40_000, 50).with_seed(9).with_antithetic(true),
    );

    let a = engine.price(&option, &m).unwrap();
    let b = engine.price(&option, &m).unwrap();
    assert_eq!(a.price.to_bits(), b.price.to_bits());
    // Pairs are averaged before the statistics.
    assert_eq!(a.num_paths, 20_000);
}
