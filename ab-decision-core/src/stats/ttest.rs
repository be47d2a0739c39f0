//! Welch's unequal-variance t-test for the continuous metric.

use statrs::distribution::{ContinuousCDF, StudentsT};

use super::{Alternative, HypothesisResult};
use crate::error::AnalysisError;
use crate::power::cohens_d;

/// Sample mean.
fn mean(samples: &[f64]) -> f64 {
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Sample variance with Bessel's correction (n−1 denominator).
fn variance(samples: &[f64], mean: f64) -> f64 {
    let sum_sq: f64 = samples
        .iter()
        .map(|v| {
            let d = v - mean;
            d * d
        })
        .sum();
    sum_sq / (samples.len() - 1) as f64
}

/// Welch-Satterthwaite effective degrees of freedom.
///
/// df = (s1 + s2)^2 / (s1^2/(n1-1) + s2^2/(n2-1)) with s_i = var_i / n_i.
fn welch_satterthwaite_df(var1: f64, n1: usize, var2: f64, n2: usize) -> f64 {
    let s1 = var1 / n1 as f64;
    let s2 = var2 / n2 as f64;
    let numerator = (s1 + s2).powi(2);
    let denominator = s1.powi(2) / (n1 - 1) as f64 + s2.powi(2) / (n2 - 1) as f64;

    if denominator == 0.0 {
        // Fallback to minimum df when variances are zero
        return (n1.min(n2) - 1) as f64;
    }

    numerator / denominator
}

/// Welch's independent-samples t-test.
///
/// Tests H0: mean_control == mean_variant without assuming equal variances.
/// The statistic carries the (control − variant) sign; the reported effect
/// size and confidence interval describe (variant − control), matching the
/// direction the rest of the pipeline reasons in. The interval uses the same
/// Welch-Satterthwaite degrees of freedom as the p-value.
///
/// # Errors
///
/// [`AnalysisError::InvalidInput`] if either group has fewer than two
/// observations or alpha is out of range;
/// [`AnalysisError::DegenerateStatistic`] if both groups have zero variance.
pub fn welch_t_test(
    control: &[f64],
    variant: &[f64],
    alpha: f64,
    alternative: Alternative,
) -> Result<HypothesisResult, AnalysisError> {
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(AnalysisError::InvalidInput(format!(
            "alpha must be in (0, 1), got {alpha}"
        )));
    }
    let n1 = control.len();
    let n2 = variant.len();
    if n1 < 2 || n2 < 2 {
        return Err(AnalysisError::InvalidInput(format!(
            "t-test requires at least 2 observations per group ({n1} vs {n2})"
        )));
    }

    let mean_control = mean(control);
    let mean_variant = mean(variant);
    let var_control = variance(control, mean_control);
    let var_variant = variance(variant, mean_variant);

    let se = (var_control / n1 as f64 + var_variant / n2 as f64).sqrt();
    if se == 0.0 {
        return Err(AnalysisError::DegenerateStatistic(
            "both groups have zero variance; the t statistic is undefined".to_string(),
        ));
    }

    let t_statistic = (mean_control - mean_variant) / se;
    let df = welch_satterthwaite_df(var_control, n1, var_variant, n2);

    let p_value = match StudentsT::new(0.0, 1.0, df) {
        Ok(t_dist) => match alternative {
            Alternative::TwoSided => 2.0 * (1.0 - t_dist.cdf(t_statistic.abs())),
            Alternative::Less => t_dist.cdf(t_statistic),
            Alternative::Greater => 1.0 - t_dist.cdf(t_statistic),
        },
        Err(_) => 1.0, // Conservative fallback if distribution creation fails
    };
    let p_value = p_value.clamp(0.0, 1.0);

    // Effect size from the simple average of the two group variances.
    let effect_size = cohens_d(
        mean_control,
        var_control.sqrt(),
        mean_variant,
        var_variant.sqrt(),
    );

    let mean_diff = mean_variant - mean_control;
    let t_critical = match StudentsT::new(0.0, 1.0, df) {
        Ok(t_dist) => t_dist.inverse_cdf(1.0 - alpha / 2.0),
        Err(_) => 0.0,
    };
    let ci_lower = mean_diff - t_critical * se;
    let ci_upper = mean_diff + t_critical * se;

    let significant = p_value < alpha;
    let verdict = if significant {
        "REJECT H0 - statistically significant difference in means".to_string()
    } else {
        "FAIL TO REJECT H0 - no significant difference in means".to_string()
    };

    Ok(HypothesisResult {
        test_name: "Welch's t-test".to_string(),
        statistic: t_statistic,
        p_value,
        effect_size,
        ci_lower,
        ci_upper,
        mean_control,
        mean_variant,
        significant,
        verdict,
    })
}
