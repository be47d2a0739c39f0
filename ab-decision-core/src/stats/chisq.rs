//! Pearson chi-square test of independence for the binary metric.

use statrs::distribution::{ChiSquared, ContinuousCDF, Normal};

use super::HypothesisResult;
use crate::error::AnalysisError;
use crate::power::cohens_h;

/// Chi-square test on the 2x2 table {converted, not converted} x {control,
/// variant}, with Yates continuity correction (df = 1).
///
/// The effect size is Cohen's h between the observed rates; the confidence
/// interval is the normal-approximation interval for the rate difference
/// (variant − control) from the unpooled sum of per-group standard errors.
///
/// # Errors
///
/// [`AnalysisError::InvalidInput`] for zero totals, conversions exceeding
/// totals, or alpha out of range; [`AnalysisError::DegenerateStatistic`] when
/// an expected cell count is zero (all or no observations converted).
pub fn chi_square_test(
    control_conversions: u64,
    control_total: u64,
    variant_conversions: u64,
    variant_total: u64,
    alpha: f64,
) -> Result<HypothesisResult, AnalysisError> {
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(AnalysisError::InvalidInput(format!(
            "alpha must be in (0, 1), got {alpha}"
        )));
    }
    if control_total == 0 || variant_total == 0 {
        return Err(AnalysisError::InvalidInput(
            "group totals must be positive".to_string(),
        ));
    }
    if control_conversions > control_total || variant_conversions > variant_total {
        return Err(AnalysisError::InvalidInput(
            "conversions cannot exceed the group total".to_string(),
        ));
    }

    // Rows: control, variant. Columns: converted, not converted.
    let observed = [
        [
            control_conversions as f64,
            (control_total - control_conversions) as f64,
        ],
        [
            variant_conversions as f64,
            (variant_total - variant_conversions) as f64,
        ],
    ];

    let row_totals = [control_total as f64, variant_total as f64];
    let col_totals = [
        observed[0][0] + observed[1][0],
        observed[0][1] + observed[1][1],
    ];
    let grand_total = row_totals[0] + row_totals[1];

    let mut statistic = 0.0;
    for (r, row) in observed.iter().enumerate() {
        for (c, &count) in row.iter().enumerate() {
            let expected = row_totals[r] * col_totals[c] / grand_total;
            if expected == 0.0 {
                return Err(AnalysisError::DegenerateStatistic(
                    "chi-square expected cell count is zero".to_string(),
                ));
            }
            // Yates continuity correction for the 2x2 / df=1 case.
            let adjusted = ((count - expected).abs() - 0.5).max(0.0);
            statistic += adjusted * adjusted / expected;
        }
    }

    let p_value = match ChiSquared::new(1.0) {
        Ok(dist) => (1.0 - dist.cdf(statistic)).clamp(0.0, 1.0),
        Err(_) => 1.0,
    };

    let rate_control = control_conversions as f64 / control_total as f64;
    let rate_variant = variant_conversions as f64 / variant_total as f64;
    let effect_size = cohens_h(rate_control, rate_variant)?;

    let se_control = (rate_control * (1.0 - rate_control) / control_total as f64).sqrt();
    let se_variant = (rate_variant * (1.0 - rate_variant) / variant_total as f64).sqrt();
    let se_diff = (se_control.powi(2) + se_variant.powi(2)).sqrt();

    let z_critical = Normal::new(0.0, 1.0)
        .map(|n| n.inverse_cdf(1.0 - alpha / 2.0))
        .unwrap_or(0.0);

    let rate_diff = rate_variant - rate_control;
    let ci_lower = rate_diff - z_critical * se_diff;
    let ci_upper = rate_diff + z_critical * se_diff;

    let significant = p_value < alpha;
    let verdict = if significant {
        "REJECT H0 - conversion rates are significantly different".to_string()
    } else {
        "FAIL TO REJECT H0 - no significant difference in conversion".to_string()
    };

    Ok(HypothesisResult {
        test_name: "Chi-square test".to_string(),
        statistic,
        p_value,
        effect_size,
        ci_lower,
        ci_upper,
        mean_control: rate_control,
        mean_variant: rate_variant,
        significant,
        verdict,
    })
}
