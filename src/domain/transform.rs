//! Lagged series transforms.
//!
//! diff(x, lag)[i]    = x[i+lag] - x[i]
//! ratio(x)[i]        = x[i+1] / x[i]
//! pdiff(x, lag)[i]   = x[i+lag] / x[i] - 1
//! pchange(x, lag)[i] = x[i+lag] / x[i] - 1
//!
//! Every transform returns a new vector of length n - lag. A lag outside
//! [1, n) is rejected instead of producing an empty result. Division by zero
//! is not special-cased: the IEEE result (inf or NaN) is passed through.

use crate::domain::error::FundMetricsError;

fn check_lag(len: usize, lag: usize) -> Result<(), FundMetricsError> {
    if lag < 1 {
        return Err(FundMetricsError::invalid("lag must be at least 1"));
    }
    if lag >= len {
        return Err(FundMetricsError::invalid(format!(
            "lag {} requires more than {} observations",
            lag, len
        )));
    }
    Ok(())
}

/// Lagged differences.
pub fn diff(x: &[f64], lag: usize) -> Result<Vec<f64>, FundMetricsError> {
    check_lag(x.len(), lag)?;
    Ok(x.iter().zip(&x[lag..]).map(|(a, b)| b - a).collect())
}

/// One-step ratios.
pub fn ratio(x: &[f64]) -> Result<Vec<f64>, FundMetricsError> {
    check_lag(x.len(), 1)?;
    Ok(x.windows(2).map(|w| w[1] / w[0]).collect())
}

/// Proportion differences; converts a price series to a gain series.
pub fn pdiff(x: &[f64], lag: usize) -> Result<Vec<f64>, FundMetricsError> {
    check_lag(x.len(), lag)?;
    Ok(x.iter().zip(&x[lag..]).map(|(a, b)| b / a - 1.0).collect())
}

/// Proportion changes. Same values as [`pdiff`].
pub fn pchange(x: &[f64], lag: usize) -> Result<Vec<f64>, FundMetricsError> {
    pdiff(x, lag)
}

/// Converts a gain earned over `units_in` periods to the equivalent gain over
/// `units_out` periods, e.g. `convert_gain(0.001, 1.0, 252.0)` annualizes a
/// daily gain.
pub fn convert_gain(gain: f64, units_in: f64, units_out: f64) -> f64 {
    (1.0 + gain).powf(units_out / units_in) - 1.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn diff_lag_one() {
        let out = diff(&[1.0, 3.0, 6.0, 10.0], 1).unwrap();
        assert_eq!(out, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn diff_lag_two() {
        let out = diff(&[1.0, 3.0, 6.0, 10.0], 2).unwrap();
        assert_eq!(out, vec![5.0, 7.0]);
    }

    #[test]
    fn diff_max_lag_gives_single_value() {
        let out = diff(&[2.0, 5.0, 9.0], 2).unwrap();
        assert_eq!(out, vec![7.0]);
    }

    #[test]
    fn diff_rejects_lag_at_or_beyond_length() {
        assert!(matches!(
            diff(&[1.0, 2.0], 2),
            Err(FundMetricsError::InvalidArgument { .. })
        ));
        assert!(diff(&[], 1).is_err());
    }

    #[test]
    fn diff_rejects_zero_lag() {
        assert!(matches!(
            diff(&[1.0, 2.0, 3.0], 0),
            Err(FundMetricsError::InvalidArgument { .. })
        ));
    }

    #[test]
    fn ratio_basic() {
        let out = ratio(&[100.0, 110.0, 99.0]).unwrap();
        assert_relative_eq!(out[0], 1.1);
        assert_relative_eq!(out[1], 0.9);
    }

    #[test]
    fn ratio_zero_denominator_propagates() {
        let out = ratio(&[0.0, 5.0, 0.0, 0.0]).unwrap();
        assert!(out[0].is_infinite());
        assert_eq!(out[1], 0.0);
        assert!(out[2].is_nan());
    }

    #[test]
    fn ratio_rejects_single_value() {
        assert!(ratio(&[1.0]).is_err());
    }

    #[test]
    fn pdiff_prices_to_gains() {
        let out = pdiff(&[100.0, 102.0, 99.96], 1).unwrap();
        assert_relative_eq!(out[0], 0.02, epsilon = 1e-12);
        assert_relative_eq!(out[1], -0.02, epsilon = 1e-12);
    }

    #[test]
    fn pdiff_lag_three() {
        let out = pdiff(&[50.0, 1.0, 1.0, 75.0], 3).unwrap();
        assert_eq!(out.len(), 1);
        assert_relative_eq!(out[0], 0.5);
    }

    #[test]
    fn convert_gain_annualizes_and_back() {
        let daily = 0.0005;
        let annual = convert_gain(daily, 1.0, 252.0);
        assert_relative_eq!(annual, 1.0005_f64.powf(252.0) - 1.0);
        assert_relative_eq!(convert_gain(annual, 252.0, 1.0), daily, epsilon = 1e-12);
    }

    proptest! {
        #[test]
        fn diff_length_and_values(
            x in prop::collection::vec(-1e6f64..1e6, 2..60),
            lag_seed in 1usize..60,
        ) {
            let lag = 1 + lag_seed % (x.len() - 1);
            let out = diff(&x, lag).unwrap();
            prop_assert_eq!(out.len(), x.len() - lag);
            for (i, v) in out.iter().enumerate() {
                prop_assert_eq!(*v, x[i + lag] - x[i]);
            }
        }

        #[test]
        fn pdiff_matches_ratio_minus_one_and_pchange(
            x in prop::collection::vec(0.01f64..1e4, 2..60),
        ) {
            let p = pdiff(&x, 1).unwrap();
            let c = pchange(&x, 1).unwrap();
            for i in 0..p.len() {
                prop_assert_eq!(p[i], x[i + 1] / x[i] - 1.0);
                prop_assert_eq!(p[i].to_bits(), c[i].to_bits());
            }
        }
    }
}
