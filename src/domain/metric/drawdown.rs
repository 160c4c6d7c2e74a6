//! Maximum drawdown.
//!
//! W[0] = 1, W[j] = prod(1 + g[i] for i < j)
//! mdd  = max over j of (max(W[0..=j]) - W[j]) / max(W[0..=j])
//!
//! The curve starts at the window's opening wealth, so a loss in the first
//! period counts as drawdown.

use super::MetricInput;

pub fn mdd(input: &MetricInput<'_>) -> f64 {
    max_drawdown(input.gains)
}

pub fn max_drawdown(gains: &[f64]) -> f64 {
    if gains.is_empty() {
        return f64::NAN;
    }

    let mut wealth = 1.0_f64;
    let mut peak = 1.0_f64;
    let mut max_dd = 0.0_f64;

    for g in gains {
        wealth *= 1.0 + g;
        if wealth > peak {
            peak = wealth;
        } else if peak > 0.0 {
            let dd = (peak - wealth) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
        }
    }

    max_dd
}
