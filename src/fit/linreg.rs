//! Simple linear regression of yield on year for a single group.
//!
//! The model is `yield = β0 + β1·year + ε`, fit by ordinary least squares.
//! Besides the coefficients we compute the inference statistics the pipeline
//! reports for the year term:
//!
//! - standard error of the slope (from residual variance and Σ(year − ȳear)²)
//! - t-statistic `β1 / SE`
//! - two-sided p-value against `β1 = 0` from Student's t with (n − 2) df
//!
//! Numeric notes:
//! - Years are centered before building the design matrix. Raw calendar years
//!   (≈2000) against an intercept column make the design needlessly
//!   ill-conditioned; centering fixes that without changing the slope, its
//!   standard error, or the residuals. The intercept is reconstructed as
//!   `β0 = β0_centered − β1·ȳear`.
//! - Every failure mode surfaces as a `SkipReason` instead of a NaN.

use std::collections::HashSet;

use nalgebra::{DMatrix, DVector};
use statrs::distribution::{ContinuousCDF, StudentsT};

use crate::domain::{SkipReason, TrendFit};
use crate::math::solve_least_squares;

/// Fit `values ~ years` for one group.
///
/// Requirements, checked here rather than assumed:
/// - at least 2 distinct year values (otherwise the slope is undefined)
/// - at least 3 observations (otherwise there is no residual degree of
///   freedom and no p-value; n = 2 interpolates exactly)
///
/// A perfect fit on ≥3 points is valid: zero residual variance gives an
/// infinite t-statistic and a p-value of exactly 0.
pub fn fit_trend(years: &[i32], values: &[f64]) -> Result<TrendFit, SkipReason> {
    let n = years.len();
    if n != values.len() {
        return Err(SkipReason::Degenerate {
            detail: format!("year/value length mismatch ({n} vs {})", values.len()),
        });
    }

    let distinct_years = years.iter().collect::<HashSet<_>>().len();
    if n < 3 || distinct_years < 2 {
        return Err(SkipReason::InsufficientData {
            n_obs: n,
            distinct_years,
        });
    }

    if let Some(bad) = values.iter().find(|v| !v.is_finite()) {
        return Err(SkipReason::Degenerate {
            detail: format!("non-finite yield value {bad}"),
        });
    }

    let x_mean = years.iter().map(|&y| y as f64).sum::<f64>() / n as f64;
    let x_centered: Vec<f64> = years.iter().map(|&y| y as f64 - x_mean).collect();

    let mut design = DMatrix::<f64>::zeros(n, 2);
    let mut rhs = DVector::<f64>::zeros(n);
    for i in 0..n {
        design[(i, 0)] = 1.0;
        design[(i, 1)] = x_centered[i];
        rhs[i] = values[i];
    }

    let beta = solve_least_squares(&design, &rhs).ok_or_else(|| SkipReason::Degenerate {
        detail: "ill-conditioned design matrix".to_string(),
    })?;
    let intercept_centered = beta[0];
    let slope = beta[1];
    let intercept = intercept_centered - slope * x_mean;

    let mut sse = 0.0;
    let mut sxx = 0.0;
    for i in 0..n {
        let fitted = intercept_centered + slope * x_centered[i];
        let r = values[i] - fitted;
        sse += r * r;
        sxx += x_centered[i] * x_centered[i];
    }

    if !(slope.is_finite() && intercept.is_finite()) || sxx <= 0.0 {
        return Err(SkipReason::Degenerate {
            detail: "zero-variance predictor".to_string(),
        });
    }

    let df = n - 2;
    let sigma2 = sse / df as f64;
    let slope_se = (sigma2 / sxx).sqrt();
    if !slope_se.is_finite() {
        return Err(SkipReason::Degenerate {
            detail: "non-finite slope standard error".to_string(),
        });
    }

    let t_value = slope / slope_se;
    let p_value = if t_value.is_nan() {
        // 0/0: no trend and no residual noise. There is no sensible test
        // statistic for such a group.
        return Err(SkipReason::Degenerate {
            detail: "indeterminate test statistic (zero slope, zero residual variance)".to_string(),
        });
    } else if t_value.is_infinite() {
        0.0
    } else {
        let dist = StudentsT::new(0.0, 1.0, df as f64).map_err(|e| SkipReason::Degenerate {
            detail: format!("t-distribution with {df} df: {e}"),
        })?;
        2.0 * dist.cdf(-t_value.abs())
    };

    Ok(TrendFit {
        intercept,
        slope,
        slope_se,
        t_value,
        p_value,
        df,
        n_obs: n,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recovers_closed_form_slope_and_intercept() {
        // y = 2 + 3x on x = [0,1,2,3,4], exact.
        let years = [0, 1, 2, 3, 4];
        let values = [2.0, 5.0, 8.0, 11.0, 14.0];

        let fit = fit_trend(&years, &values).unwrap();
        assert!((fit.slope - 3.0).abs() < 1e-10);
        assert!((fit.intercept - 2.0).abs() < 1e-10);
        assert_eq!(fit.df, 3);
    }

    #[test]
    fn inference_matches_hand_computed_reference() {
        // x = [0,1,2], y = [0,1,1]:
        //   slope = 0.5, SE = sqrt(1/12), t = sqrt(3), and with 1 df the
        //   t-distribution is Cauchy, so p = 2·(1 − (1/2 + atan(√3)/π)) = 1/3.
        let fit = fit_trend(&[0, 1, 2], &[0.0, 1.0, 1.0]).unwrap();

        assert!((fit.slope - 0.5).abs() < 1e-12);
        assert!((fit.slope_se - (1.0_f64 / 12.0).sqrt()).abs() < 1e-12);
        assert!((fit.t_value - 3.0_f64.sqrt()).abs() < 1e-12);
        assert!((fit.p_value - 1.0 / 3.0).abs() < 1e-9);
        assert_eq!(fit.df, 1);
    }

    #[test]
    fn perfect_linear_trend_gives_unit_slope_and_zero_p() {
        let fit = fit_trend(&[2018, 2019, 2020], &[3.0, 4.0, 5.0]).unwrap();

        assert!((fit.slope - 1.0).abs() < 1e-9);
        assert!(fit.p_value >= 0.0 && fit.p_value < 1e-6);
    }

    #[test]
    fn centering_handles_calendar_years() {
        // Same data as the closed-form test, shifted to calendar years. The
        // slope and its standard error must be unchanged by the shift.
        let shifted: Vec<i32> = [0, 1, 2].iter().map(|x| x + 2018).collect();
        let plain = fit_trend(&[0, 1, 2], &[0.0, 1.0, 1.0]).unwrap();
        let moved = fit_trend(&shifted, &[0.0, 1.0, 1.0]).unwrap();

        assert!((plain.slope - moved.slope).abs() < 1e-12);
        assert!((plain.slope_se - moved.slope_se).abs() < 1e-12);
        assert!((plain.p_value - moved.p_value).abs() < 1e-12);
    }

    #[test]
    fn single_year_group_is_insufficient() {
        let err = fit_trend(&[2020, 2020, 2020], &[1.0, 2.0, 3.0]).unwrap_err();
        assert_eq!(
            err,
            SkipReason::InsufficientData {
                n_obs: 3,
                distinct_years: 1
            }
        );
    }

    #[test]
    fn two_points_leave_no_residual_df() {
        let err = fit_trend(&[2019, 2020], &[1.0, 2.0]).unwrap_err();
        assert!(matches!(err, SkipReason::InsufficientData { n_obs: 2, .. }));
    }

    #[test]
    fn repeated_years_are_fine_with_two_distinct() {
        let fit = fit_trend(&[2000, 2000, 2001], &[1.0, 2.0, 4.0]).unwrap();
        assert!(fit.slope.is_finite());
        assert!(fit.p_value >= 0.0 && fit.p_value <= 1.0);
        assert_eq!(fit.df, 1);
    }

    #[test]
    fn flat_series_with_noise_is_not_significant() {
        let years = [2015, 2016, 2017, 2018, 2019, 2020];
        let values = [4.0, 4.1, 3.9, 4.05, 3.95, 4.0];

        let fit = fit_trend(&years, &values).unwrap();
        assert!(fit.p_value > 0.5);
    }
}
