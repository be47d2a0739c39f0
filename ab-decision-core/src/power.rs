//! Effect-size and sample-size/power arithmetic.
//!
//! Formulas follow the standard two-sample normal-approximation design:
//! n = 2 * ((z_alpha + z_beta) / d)^2 per group for continuous metrics, and
//! the arcsine-transformed equivalent for proportions.

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};

use crate::error::AnalysisError;
use crate::samples::MetricKind;

/// The outcome of designing an experiment for a target detection power.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerDesign {
    /// Required observations per group to hit the target power.
    pub required_n_per_group: u64,
    /// The power the design targets (1 − beta).
    pub target_power: f64,
    /// Standardized effect size: Cohen's d (continuous) or h (binary).
    pub effect_size: f64,
    /// Significance level the design assumes.
    pub alpha: f64,
    /// Type II error rate, 1 − target_power.
    pub beta: f64,
    /// Which metric kind the design applies to.
    pub metric_kind: MetricKind,
}

fn standard_normal() -> Normal {
    Normal::new(0.0, 1.0).expect("standard normal parameters are valid")
}

fn check_unit_open(name: &str, value: f64) -> Result<(), AnalysisError> {
    if !(value > 0.0 && value < 1.0) {
        return Err(AnalysisError::InvalidInput(format!(
            "{name} must be in (0, 1), got {value}"
        )));
    }
    Ok(())
}

fn check_rate(name: &str, value: f64) -> Result<(), AnalysisError> {
    if !(0.0..=1.0).contains(&value) || !value.is_finite() {
        return Err(AnalysisError::InvalidInput(format!(
            "{name} must be a rate in [0, 1], got {value}"
        )));
    }
    Ok(())
}

/// Critical value of the standard normal for the given alpha.
fn z_alpha(alpha: f64, two_tailed: bool) -> f64 {
    let normal = standard_normal();
    if two_tailed {
        normal.inverse_cdf(1.0 - alpha / 2.0)
    } else {
        normal.inverse_cdf(1.0 - alpha)
    }
}

/// Cohen's d: standardized mean difference (variant − control).
///
/// Returns 0.0 when the pooled standard deviation is zero; the ratio is
/// undefined there and 0 is the defined fallback (never NaN).
pub fn cohens_d(mean_control: f64, std_control: f64, mean_variant: f64, std_variant: f64) -> f64 {
    let pooled_std = ((std_control.powi(2) + std_variant.powi(2)) / 2.0).sqrt();
    if pooled_std > 0.0 {
        (mean_variant - mean_control) / pooled_std
    } else {
        0.0
    }
}

/// Cohen's h: arcsine-transformed difference between two proportions.
pub fn cohens_h(p_control: f64, p_variant: f64) -> Result<f64, AnalysisError> {
    check_rate("control rate", p_control)?;
    check_rate("variant rate", p_variant)?;
    Ok(2.0 * (p_variant.sqrt().asin() - p_control.sqrt().asin()))
}

/// Required sample size per group for a continuous metric.
///
/// # Errors
///
/// [`AnalysisError::InvalidEffectSize`] if `effect_size` is zero;
/// [`AnalysisError::InvalidInput`] if alpha or power are out of range.
pub fn sample_size_continuous(
    effect_size: f64,
    alpha: f64,
    power: f64,
    two_tailed: bool,
) -> Result<u64, AnalysisError> {
    check_unit_open("alpha", alpha)?;
    check_unit_open("power", power)?;
    if effect_size == 0.0 {
        return Err(AnalysisError::InvalidEffectSize);
    }

    let z1 = z_alpha(alpha, two_tailed);
    let z2 = standard_normal().inverse_cdf(power);
    let n = 2.0 * ((z1 + z2) / effect_size).powi(2);

    Ok(n.ceil() as u64)
}

/// Required sample size per group for a binary metric.
pub fn sample_size_binary(
    p_control: f64,
    p_variant: f64,
    alpha: f64,
    power: f64,
    two_tailed: bool,
) -> Result<u64, AnalysisError> {
    check_unit_open("alpha", alpha)?;
    check_unit_open("power", power)?;

    let h = cohens_h(p_control, p_variant)?;
    if h == 0.0 {
        return Err(AnalysisError::InvalidEffectSize);
    }

    let z1 = z_alpha(alpha, two_tailed);
    let z2 = standard_normal().inverse_cdf(power);
    let variance_term = (p_control * (1.0 - p_control) + p_variant * (1.0 - p_variant)) / 2.0;
    let n = ((z1 + z2) / h).powi(2) * variance_term;

    Ok(n.ceil() as u64)
}

/// Power achieved by the given group sizes for a fixed effect size.
///
/// Unequal group sizes are reduced to the harmonic effective size
/// n_eff = 2·n1·n2/(n1+n2).
pub fn achieved_power(
    n_control: u64,
    n_variant: u64,
    effect_size: f64,
    alpha: f64,
    two_tailed: bool,
) -> Result<f64, AnalysisError> {
    check_unit_open("alpha", alpha)?;
    if n_control == 0 || n_variant == 0 {
        return Err(AnalysisError::InvalidInput(
            "sample sizes must be positive".to_string(),
        ));
    }

    let n1 = n_control as f64;
    let n2 = n_variant as f64;
    let n_effective = 2.0 * n1 * n2 / (n1 + n2);

    let z1 = z_alpha(alpha, two_tailed);
    // The effect keeps its sign: a negative observed effect has essentially
    // no power to show the variant ahead.
    let noncentrality = effect_size * (n_effective / 2.0).sqrt();

    Ok(1.0 - standard_normal().cdf(z1 - noncentrality))
}

/// Design an experiment for a continuous metric from baseline statistics and
/// a minimum detectable relative lift (in percent).
pub fn design_continuous(
    baseline_mean: f64,
    baseline_std: f64,
    min_detectable_effect_pct: f64,
    alpha: f64,
    power: f64,
    two_tailed: bool,
) -> Result<PowerDesign, AnalysisError> {
    if min_detectable_effect_pct <= 0.0 {
        return Err(AnalysisError::InvalidInput(format!(
            "min_detectable_effect_pct must be positive, got {min_detectable_effect_pct}"
        )));
    }

    let effect_magnitude = baseline_mean * (min_detectable_effect_pct / 100.0);
    let variant_mean = baseline_mean + effect_magnitude;
    let effect_size = cohens_d(baseline_mean, baseline_std, variant_mean, baseline_std);
    let required = sample_size_continuous(effect_size, alpha, power, two_tailed)?;

    Ok(PowerDesign {
        required_n_per_group: required,
        target_power: power,
        effect_size,
        alpha,
        beta: 1.0 - power,
        metric_kind: MetricKind::Continuous,
    })
}

/// Design an experiment for a binary metric from a baseline conversion rate
/// and a minimum detectable relative lift (in percent).
pub fn design_binary(
    baseline_rate: f64,
    min_detectable_effect_pct: f64,
    alpha: f64,
    power: f64,
    two_tailed: bool,
) -> Result<PowerDesign, AnalysisError> {
    check_rate("baseline rate", baseline_rate)?;
    if min_detectable_effect_pct <= 0.0 {
        return Err(AnalysisError::InvalidInput(format!(
            "min_detectable_effect_pct must be positive, got {min_detectable_effect_pct}"
        )));
    }

    // Cap the projected rate at 100%.
    let variant_rate = (baseline_rate * (1.0 + min_detectable_effect_pct / 100.0)).min(1.0);
    let effect_size = cohens_h(baseline_rate, variant_rate)?;
    let required = sample_size_binary(baseline_rate, variant_rate, alpha, power, two_tailed)?;

    Ok(PowerDesign {
        required_n_per_group: required,
        target_power: power,
        effect_size,
        alpha,
        beta: 1.0 - power,
        metric_kind: MetricKind::Binary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cohens_d_known_value() {
        // (480 - 450) / 150 = 0.2 with equal stds.
        let d = cohens_d(450.0, 150.0, 480.0, 150.0);
        assert!((d - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_cohens_d_zero_pooled_std() {
        assert_eq!(cohens_d(450.0, 0.0, 480.0, 0.0), 0.0);
    }

    #[test]
    fn test_cohens_h_known_value() {
        // 0.080 vs 0.086 is a tiny effect, roughly 0.022.
        let h = cohens_h(0.080, 0.086).unwrap();
        assert!((h - 0.022).abs() < 0.002, "h = {h}");
    }

    #[test]
    fn test_cohens_h_rejects_out_of_range() {
        assert!(cohens_h(-0.1, 0.5).is_err());
        assert!(cohens_h(0.5, 1.1).is_err());
    }

    #[test]
    fn test_sample_size_continuous_closed_form() {
        // d = 0.5, alpha = 0.05 two-tailed, power = 0.80:
        // n = 2 * ((1.9600 + 0.8416) / 0.5)^2 = 62.79... -> 63.
        let n = sample_size_continuous(0.5, 0.05, 0.80, true).unwrap();
        assert_eq!(n, 63);
    }

    #[test]
    fn test_sample_size_zero_effect_rejected() {
        assert!(matches!(
            sample_size_continuous(0.0, 0.05, 0.80, true),
            Err(AnalysisError::InvalidEffectSize)
        ));
    }

    #[test]
    fn test_sample_size_monotone_in_effect() {
        let mut previous = u64::MAX;
        for effect in [0.05, 0.1, 0.2, 0.4, 0.8] {
            let n = sample_size_continuous(effect, 0.05, 0.80, true).unwrap();
            assert!(n <= previous, "n should not grow with |effect|");
            previous = n;
        }
    }

    #[test]
    fn test_sample_size_binary_monotone_in_lift() {
        let mut previous = u64::MAX;
        for variant_rate in [0.085, 0.09, 0.10, 0.12] {
            let n = sample_size_binary(0.08, variant_rate, 0.05, 0.80, true).unwrap();
            assert!(n <= previous);
            previous = n;
        }
    }

    #[test]
    fn test_achieved_power_monotone_in_sample_size() {
        let mut previous = 0.0;
        for n in [100, 500, 1000, 5000, 20000] {
            let p = achieved_power(n, n, 0.2, 0.05, true).unwrap();
            assert!(p >= previous, "power should not shrink with n");
            assert!((0.0..=1.0).contains(&p));
            previous = p;
        }
    }

    #[test]
    fn test_achieved_power_monotone_in_effect_size() {
        let mut previous = 0.0;
        for effect in [0.05, 0.1, 0.2, 0.5] {
            let p = achieved_power(1000, 1000, effect, 0.05, true).unwrap();
            assert!(p >= previous);
            previous = p;
        }
    }

    #[test]
    fn test_achieved_power_negative_effect_is_near_zero() {
        // A regressing variant has essentially no power to show a win, even
        // though |effect| alone would be well powered at this n.
        let negative = achieved_power(1000, 1000, -0.2, 0.05, true).unwrap();
        assert!(negative < 0.01, "got {negative}");

        let positive = achieved_power(1000, 1000, 0.2, 0.05, true).unwrap();
        assert!(positive > 0.9);
    }

    #[test]
    fn test_achieved_power_unequal_groups_uses_harmonic_n() {
        // Harmonic effective n of (2000, 500) equals that of (800, 800).
        let unequal = achieved_power(2000, 500, 0.2, 0.05, true).unwrap();
        let equal = achieved_power(800, 800, 0.2, 0.05, true).unwrap();
        assert!((unequal - equal).abs() < 1e-12);
    }

    #[test]
    fn test_design_continuous_matches_closed_form() {
        // 5% lift on mean 450 with std 150: d = 22.5 / 150 = 0.15.
        let design = design_continuous(450.0, 150.0, 5.0, 0.05, 0.80, true).unwrap();
        assert!((design.effect_size - 0.15).abs() < 1e-12);

        let expected = sample_size_continuous(0.15, 0.05, 0.80, true).unwrap();
        assert_eq!(design.required_n_per_group, expected);
        assert_eq!(design.metric_kind, MetricKind::Continuous);
        assert!((design.beta - 0.2).abs() < 1e-12);
    }

    #[test]
    fn test_design_binary_caps_variant_rate() {
        // A 50% lift on 0.9 would exceed 1.0; the projected rate caps there.
        let design = design_binary(0.9, 50.0, 0.05, 0.80, true).unwrap();
        assert!(design.effect_size > 0.0);
        assert!(design.required_n_per_group > 0);
    }

    #[test]
    fn test_invalid_alpha_rejected() {
        assert!(achieved_power(100, 100, 0.2, 0.0, true).is_err());
        assert!(sample_size_continuous(0.2, 1.0, 0.8, true).is_err());
        assert!(design_continuous(450.0, 150.0, 5.0, 0.05, 1.5, true).is_err());
    }
}
