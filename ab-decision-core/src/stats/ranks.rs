//! Mann-Whitney U rank-sum test, a non-parametric alternative to the t-test.

use statrs::distribution::{ContinuousCDF, Normal};

use super::{Alternative, HypothesisResult};
use crate::error::AnalysisError;

/// Assign average ranks to sorted (value, group) pairs, averaging over ties.
fn average_ranks(sorted: &[(f64, usize)]) -> Vec<f64> {
    let n = sorted.len();
    let mut ranks = vec![0.0; n];
    let mut i = 0;
    while i < n {
        let mut j = i + 1;
        while j < n && sorted[j].0 == sorted[i].0 {
            j += 1;
        }
        // Positions i..j are tied; their shared rank is the average.
        let avg_rank = (i + 1 + j) as f64 / 2.0;
        for rank in ranks.iter_mut().take(j).skip(i) {
            *rank = avg_rank;
        }
        i = j;
    }
    ranks
}

/// Tie correction term: sum of t_k(t_k^2 - 1) over tie groups.
fn tie_correction(sorted: &[(f64, usize)]) -> f64 {
    let n = sorted.len();
    let mut correction = 0.0;
    let mut i = 0;
    while i < n {
        let mut j = i + 1;
        while j < n && sorted[j].0 == sorted[i].0 {
            j += 1;
        }
        let t = (j - i) as f64;
        if t > 1.0 {
            correction += t * (t * t - 1.0);
        }
        i = j;
    }
    correction
}

/// Mann-Whitney U test with a tie-corrected normal approximation.
///
/// The statistic is U for the control sample; the p-value uses the normal
/// approximation with average-rank tie correction and a 0.5 continuity
/// correction. The effect size is the absolute rank-biserial correlation.
/// No confidence interval is computed for this test; the bounds are reported
/// as (0, 0), a known limitation of the result contract.
///
/// # Errors
///
/// [`AnalysisError::InvalidInput`] for empty groups or alpha out of range;
/// [`AnalysisError::DegenerateStatistic`] when every observation is tied.
pub fn mann_whitney_u_test(
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
    if control.is_empty() || variant.is_empty() {
        return Err(AnalysisError::InvalidInput(
            "Mann-Whitney requires non-empty groups".to_string(),
        ));
    }

    let n1 = control.len() as f64;
    let n2 = variant.len() as f64;
    let n = n1 + n2;

    let mut combined: Vec<(f64, usize)> = Vec::with_capacity(control.len() + variant.len());
    combined.extend(control.iter().map(|&v| (v, 0)));
    combined.extend(variant.iter().map(|&v| (v, 1)));
    combined.sort_by(|a, b| a.0.total_cmp(&b.0));

    let ranks = average_ranks(&combined);

    let rank_sum_control: f64 = combined
        .iter()
        .zip(ranks.iter())
        .filter(|((_, group), _)| *group == 0)
        .map(|(_, &rank)| rank)
        .sum();

    let u_statistic = rank_sum_control - n1 * (n1 + 1.0) / 2.0;

    let ties = tie_correction(&combined);
    let mu = n1 * n2 / 2.0;
    let sigma_sq = n1 * n2 / 12.0 * (n + 1.0 - ties / (n * (n - 1.0)));
    if sigma_sq <= 0.0 {
        return Err(AnalysisError::DegenerateStatistic(
            "all observations are tied; the rank-sum variance is zero".to_string(),
        ));
    }
    let sigma = sigma_sq.sqrt();

    let normal = Normal::new(0.0, 1.0).expect("standard normal parameters are valid");
    // Continuity-corrected normal approximation. A large U means the control
    // observations carry the larger ranks.
    let p_value = match alternative {
        Alternative::TwoSided => {
            let z = ((u_statistic - mu).abs() - 0.5).max(0.0) / sigma;
            2.0 * (1.0 - normal.cdf(z))
        }
        Alternative::Greater => {
            let z = (u_statistic - mu - 0.5) / sigma;
            1.0 - normal.cdf(z)
        }
        Alternative::Less => {
            let z = (u_statistic - mu + 0.5) / sigma;
            normal.cdf(z)
        }
    };
    let p_value = p_value.clamp(0.0, 1.0);

    // Rank-biserial correlation, reported as a magnitude.
    let rank_biserial = 1.0 - 2.0 * u_statistic / (n1 * n2);
    let effect_size = rank_biserial.abs();

    let mean_control = control.iter().sum::<f64>() / n1;
    let mean_variant = variant.iter().sum::<f64>() / n2;

    let significant = p_value < alpha;
    let verdict = if significant {
        "REJECT H0 - distributions are significantly different".to_string()
    } else {
        "FAIL TO REJECT H0 - no significant distributional difference".to_string()
    };

    Ok(HypothesisResult {
        test_name: "Mann-Whitney U test".to_string(),
        statistic: u_statistic,
        p_value,
        effect_size,
        ci_lower: 0.0,
        ci_upper: 0.0,
        mean_control,
        mean_variant,
        significant,
        verdict,
    })
}
