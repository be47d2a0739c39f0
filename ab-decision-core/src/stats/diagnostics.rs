//! Assumption checks that accompany the parametric tests: Shapiro-Wilk for
//! normality and the median-centered Levene test for equal variances.

use statrs::distribution::{ContinuousCDF, FisherSnedecor, Normal};

use super::DiagnosticResult;
use crate::error::AnalysisError;

// Royston AS R94 polynomial coefficients.
const SW_C1: [f64; 6] = [0.0, 0.221157, -0.147981, -2.07119, 4.434685, -2.706056];
const SW_C2: [f64; 6] = [0.0, 0.042981, -0.293762, -1.752461, 5.682633, -3.582633];
const SW_C3: [f64; 4] = [0.544, -0.39978, 0.025054, -6.714e-4];
const SW_C4: [f64; 4] = [1.3822, -0.77857, 0.062767, -0.0020322];
const SW_C5: [f64; 4] = [-1.5861, -0.31082, -0.083751, 0.0038915];
const SW_C6: [f64; 3] = [-0.4803, -0.082676, 0.0030302];
const SW_G: [f64; 2] = [-2.273, 0.459];

fn poly(c: &[f64], x: f64) -> f64 {
    let mut acc = c[c.len() - 1];
    for &coeff in c[..c.len() - 1].iter().rev() {
        acc = acc * x + coeff;
    }
    acc
}

fn standard_normal() -> Normal {
    Normal::new(0.0, 1.0).expect("standard normal parameters are valid")
}

/// Shapiro-Wilk coefficients from Blom scores with Royston's endpoint
/// corrections.
fn shapiro_coefficients(n: usize) -> Result<Vec<f64>, AnalysisError> {
    let half = n / 2;
    let normal = standard_normal();

    let mut m = vec![0.0; half];
    let mut sum_m_sq = 0.0;
    for (i, mi) in m.iter_mut().enumerate() {
        let p = (i as f64 + 1.0 - 0.375) / (n as f64 + 0.25);
        *mi = normal.inverse_cdf(p);
        sum_m_sq += *mi * *mi;
    }
    sum_m_sq *= 2.0;
    let root_sum = sum_m_sq.sqrt();
    let rsn = 1.0 / (n as f64).sqrt();

    let a1 = poly(&SW_C1, rsn) - m[0] / root_sum;

    let mut a = vec![0.0; half];
    if n <= 5 {
        let fac_sq = sum_m_sq - 2.0 * m[0] * m[0];
        let remainder = 1.0 - 2.0 * a1 * a1;
        if fac_sq <= 0.0 || remainder <= 0.0 {
            return Err(AnalysisError::DegenerateStatistic(
                "Shapiro-Wilk coefficient normalization failed".to_string(),
            ));
        }
        let fac = (fac_sq / remainder).sqrt();
        a[0] = a1;
        for i in 1..half {
            a[i] = -m[i] / fac;
        }
    } else {
        let a2 = -m[1] / root_sum + poly(&SW_C2, rsn);
        let fac_sq = sum_m_sq - 2.0 * m[0] * m[0] - 2.0 * m[1] * m[1];
        let remainder = 1.0 - 2.0 * a1 * a1 - 2.0 * a2 * a2;
        if fac_sq <= 0.0 || remainder <= 0.0 {
            return Err(AnalysisError::DegenerateStatistic(
                "Shapiro-Wilk coefficient normalization failed".to_string(),
            ));
        }
        let fac = (fac_sq / remainder).sqrt();
        a[0] = a1;
        a[1] = a2;
        for i in 2..half {
            a[i] = -m[i] / fac;
        }
    }
    Ok(a)
}

/// Royston's p-value transformation: gamma-log for n <= 11, log-normal above.
fn shapiro_p_value(w: f64, n: usize) -> f64 {
    let nf = n as f64;
    let w1 = 1.0 - w;
    if w1 <= 0.0 {
        return 1.0;
    }
    let y = w1.ln();
    let normal = standard_normal();

    let z = if n <= 11 {
        let gamma = poly(&SW_G, nf);
        if y >= gamma {
            return 0.0;
        }
        let y2 = -(gamma - y).ln();
        let m = poly(&SW_C3, nf);
        let s = poly(&SW_C4, nf).exp();
        (y2 - m) / s
    } else {
        let ln_n = nf.ln();
        let m = poly(&SW_C5, ln_n);
        let s = poly(&SW_C6, ln_n).exp();
        (y - m) / s
    };
    (1.0 - normal.cdf(z)).clamp(0.0, 1.0)
}

/// Shapiro-Wilk test for normality of a single group.
///
/// `passed` means the normality hypothesis was not rejected at the 0.05
/// level, so a parametric test is defensible for this group. The `label`
/// names the group in the reported test name.
///
/// # Errors
///
/// [`AnalysisError::InvalidInput`] for fewer than 3 observations or
/// non-finite values; [`AnalysisError::DegenerateStatistic`] when every
/// observation is identical.
pub fn check_normality(data: &[f64], label: &str) -> Result<DiagnosticResult, AnalysisError> {
    let n = data.len();
    if n < 3 {
        return Err(AnalysisError::InvalidInput(format!(
            "Shapiro-Wilk requires at least 3 observations, got {n}"
        )));
    }
    if data.iter().any(|v| !v.is_finite()) {
        return Err(AnalysisError::InvalidInput(
            "Shapiro-Wilk requires finite observations".to_string(),
        ));
    }

    let mut x = data.to_vec();
    x.sort_by(|a, b| a.total_cmp(b));
    if x[n - 1] - x[0] < 1e-300 {
        return Err(AnalysisError::DegenerateStatistic(
            "all observations are identical; normality is undefined".to_string(),
        ));
    }

    let test_name = format!("Shapiro-Wilk ({label})");

    // Exact small-sample case: a = (1/sqrt(2), 0, -1/sqrt(2)).
    if n == 3 {
        let mean = (x[0] + x[1] + x[2]) / 3.0;
        let ss: f64 = x.iter().map(|&v| (v - mean).powi(2)).sum();
        let numerator = std::f64::consts::FRAC_1_SQRT_2 * (x[2] - x[0]);
        let w = ((numerator * numerator) / ss).clamp(0.75, 1.0);
        let p_value =
            (1.0 - (6.0 / std::f64::consts::PI) * w.sqrt().acos()).clamp(0.0, 1.0);
        return Ok(DiagnosticResult {
            test_name,
            statistic: w,
            p_value,
            passed: p_value > 0.05,
        });
    }

    let a = shapiro_coefficients(n)?;
    let half = n / 2;

    let mut sa = 0.0;
    for i in 0..half {
        sa += a[i] * (x[n - 1 - i] - x[i]);
    }
    let mean = x.iter().sum::<f64>() / n as f64;
    let ss: f64 = x.iter().map(|&v| (v - mean).powi(2)).sum();
    let w = ((sa * sa) / ss).min(1.0);

    let p_value = shapiro_p_value(w, n);
    Ok(DiagnosticResult {
        test_name,
        statistic: w,
        p_value,
        passed: p_value > 0.05,
    })
}

/// Median-centered Levene test (Brown-Forsythe) for equal variances of two
/// groups.
///
/// The absolute deviations from each group median are compared with a
/// one-way ANOVA, so the check stays robust when the data are not normal.
/// `passed` means the equal-variance hypothesis was not rejected at 0.05.
///
/// # Errors
///
/// [`AnalysisError::InvalidInput`] when either group has fewer than 2
/// observations; [`AnalysisError::DegenerateStatistic`] when the deviations
/// carry no within-group spread.
pub fn check_equal_variance(
    control: &[f64],
    variant: &[f64],
) -> Result<DiagnosticResult, AnalysisError> {
    if control.len() < 2 || variant.len() < 2 {
        return Err(AnalysisError::InvalidInput(
            "Levene test requires at least 2 observations per group".to_string(),
        ));
    }

    let z_control = median_deviations(control);
    let z_variant = median_deviations(variant);

    let n1 = z_control.len() as f64;
    let n2 = z_variant.len() as f64;
    let n = n1 + n2;

    let mean1 = z_control.iter().sum::<f64>() / n1;
    let mean2 = z_variant.iter().sum::<f64>() / n2;
    let grand_mean = (n1 * mean1 + n2 * mean2) / n;

    let ss_between = n1 * (mean1 - grand_mean).powi(2) + n2 * (mean2 - grand_mean).powi(2);
    let ss_within: f64 = z_control.iter().map(|&z| (z - mean1).powi(2)).sum::<f64>()
        + z_variant.iter().map(|&z| (z - mean2).powi(2)).sum::<f64>();

    let df_between = 1.0;
    let df_within = n - 2.0;
    if ss_within <= 0.0 {
        return Err(AnalysisError::DegenerateStatistic(
            "no within-group spread in absolute deviations".to_string(),
        ));
    }

    let f_statistic = (ss_between / df_between) / (ss_within / df_within);
    let p_value = match FisherSnedecor::new(df_between, df_within) {
        Ok(dist) => (1.0 - dist.cdf(f_statistic)).clamp(0.0, 1.0),
        Err(_) => 1.0,
    };

    Ok(DiagnosticResult {
        test_name: "Levene (median-centered)".to_string(),
        statistic: f_statistic,
        p_value,
        passed: p_value > 0.05,
    })
}

fn median_deviations(data: &[f64]) -> Vec<f64> {
    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let n = sorted.len();
    let median = if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    };
    data.iter().map(|&x| (x - median).abs()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normality_symmetric_data_passes() {
        let data = [-1.5, -1.0, -0.5, 0.0, 0.5, 1.0, 1.5];
        let result = check_normality(&data, "control").unwrap();
        assert!(result.statistic > 0.9);
        assert!(result.passed);
        assert_eq!(result.test_name, "Shapiro-Wilk (control)");
    }

    #[test]
    fn test_normality_heavy_skew_fails() {
        // Exponential-flavored sample with a long right tail.
        let data = [
            0.1, 0.2, 0.2, 0.3, 0.4, 0.5, 0.6, 0.8, 1.1, 1.5, 2.2, 3.5, 6.0, 12.0, 25.0, 60.0,
        ];
        let result = check_normality(&data, "variant").unwrap();
        assert!(!result.passed);
        assert!(result.p_value < 0.05);
    }

    #[test]
    fn test_normality_n3_exact_case() {
        let result = check_normality(&[1.0, 2.0, 3.0], "control").unwrap();
        // Perfectly symmetric triple gives W = 1.
        assert!((result.statistic - 1.0).abs() < 1e-12);
        assert!(result.passed);
    }

    #[test]
    fn test_normality_rejects_tiny_and_constant_input() {
        assert!(matches!(
            check_normality(&[1.0, 2.0], "control"),
            Err(AnalysisError::InvalidInput(_))
        ));
        assert!(matches!(
            check_normality(&[3.0, 3.0, 3.0, 3.0], "control"),
            Err(AnalysisError::DegenerateStatistic(_))
        ));
    }

    #[test]
    fn test_equal_variance_similar_spreads_pass() {
        let control = [4.8, 5.0, 5.2, 4.9, 5.1, 5.0, 4.7, 5.3];
        let variant = [6.0, 6.2, 5.8, 6.1, 5.9, 6.0, 6.3, 5.7];
        let result = check_equal_variance(&control, &variant).unwrap();
        assert!(result.passed);
    }

    #[test]
    fn test_equal_variance_wide_vs_tight_fails() {
        let control = [4.9, 5.0, 5.0, 5.1, 5.0, 4.95, 5.05, 5.0];
        let variant = [0.0, 3.0, 5.0, 7.0, 10.0, -2.0, 12.0, 1.0];
        let result = check_equal_variance(&control, &variant).unwrap();
        assert!(!result.passed);
        assert!(result.p_value < 0.05);
    }

    #[test]
    fn test_equal_variance_rejects_short_group() {
        assert!(matches!(
            check_equal_variance(&[1.0], &[1.0, 2.0]),
            Err(AnalysisError::InvalidInput(_))
        ));
    }
}
