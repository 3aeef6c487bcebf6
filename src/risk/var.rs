//! Value-at-Risk and Expected-Shortfall estimators over empirical P&L.
//!
//! The module uses a loss-positive convention (`loss = -pnl`) and returns
//! non-negative tail metrics. Empirical tail metrics are sample-size
//! sensitive at high confidence; the scenario engine controls the sample
//! budget, these functions only aggregate it.
//!
//! Preconditions here are programmer errors and assert; the caller-facing
//! risk engine validates its inputs and returns `Result` before reaching
//! this layer.
//!
//! References: McNeil, Frey, Embrechts, *Quantitative Risk Management*
//! (2015), Ch. 2.

/// Historical Value-at-Risk from a P&L sample.
///
/// Positive P&L values are profits and negative values are losses.
/// Returned VaR is a positive loss number.
///
/// # Examples
/// ```rust
/// use openmonte::risk::var::historical_var;
///
/// let pnl = [-2.0, -1.0, 0.5, 1.0, -0.2];
/// let var_95 = historical_var(&pnl, 0.95);
/// assert!(var_95 >= 0.0);
/// ```
pub fn historical_var(pnl: &[f64], confidence: f64) -> f64 {
    validate_inputs(pnl, confidence);
    let mut losses: Vec<f64> = pnl.iter().map(|x| -x).collect();
    empirical_quantile(&mut losses, confidence).max(0.0)
}

/// Historical Expected Shortfall (CVaR): mean loss at or beyond the VaR
/// quantile.
///
/// # Examples
/// ```rust
/// use openmonte::risk::var::{historical_expected_shortfall, historical_var};
///
/// let pnl = [-3.0, -2.0, -1.0, 0.5, 1.0];
/// let var_95 = historical_var(&pnl, 0.95);
/// let es_95 = historical_expected_shortfall(&pnl, 0.95);
/// assert!(es_95 >= var_95);
/// ```
pub fn historical_expected_shortfall(pnl: &[f64], confidence: f64) -> f64 {
    validate_inputs(pnl, confidence);

    let var = historical_var(pnl, confidence);
    let mut tail_sum = 0.0;
    let mut tail_count = 0usize;

    for &x in pnl {
        let loss = -x;
        if loss >= var - 1.0e-12 {
            tail_sum += loss;
            tail_count += 1;
        }
    }

    if tail_count == 0 {
        var
    } else {
        (tail_sum / tail_count as f64).max(0.0)
    }
}

fn validate_inputs(pnl: &[f64], confidence: f64) {
    assert!(!pnl.is_empty(), "pnl must not be empty");
    assert!(
        (0.0..1.0).contains(&confidence) && confidence > 0.0,
        "confidence must be in (0,1)"
    );
}

/// Linear-interpolated empirical quantile; sorts in place.
fn empirical_quantile(sample: &mut [f64], p: f64) -> f64 {
    sample.sort_by(|a, b| a.total_cmp(b));
    if sample.len() == 1 {
        return sample[0];
    }

    let rank = p * (sample.len() as f64 - 1.0);
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        sample[lo]
    } else {
        let w = rank - lo as f64;
        sample[lo] + w * (sample[hi] - sample[lo])
    }
}
