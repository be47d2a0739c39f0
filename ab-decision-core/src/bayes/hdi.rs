//! Summaries computed over posterior draws: the highest-density interval,
//! exceedance probabilities, and expected losses.

use crate::error::AnalysisError;

/// Narrowest interval of sorted draws containing `target_prob` of the mass.
///
/// Slides a window of `ceil(target_prob * n)` draws over the sorted sample
/// and keeps the narrowest one; ties resolve to the leftmost window.
///
/// # Errors
///
/// [`AnalysisError::InvalidInput`] for an empty sample or a target
/// probability outside (0, 1].
pub fn highest_density_interval(
    samples: &[f64],
    target_prob: f64,
) -> Result<(f64, f64), AnalysisError> {
    if samples.is_empty() {
        return Err(AnalysisError::InvalidInput(
            "HDI requires at least one draw".to_string(),
        ));
    }
    if !(target_prob > 0.0 && target_prob <= 1.0) {
        return Err(AnalysisError::InvalidInput(format!(
            "HDI mass must be in (0, 1], got {target_prob}"
        )));
    }

    let mut sorted = samples.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = sorted.len();
    let window = ((target_prob * n as f64).ceil() as usize).clamp(1, n);

    let mut best_low = sorted[0];
    let mut best_high = sorted[window - 1];
    let mut best_width = best_high - best_low;
    for i in 1..=(n - window) {
        let width = sorted[i + window - 1] - sorted[i];
        if width < best_width {
            best_width = width;
            best_low = sorted[i];
            best_high = sorted[i + window - 1];
        }
    }
    Ok((best_low, best_high))
}

/// Fraction of draws strictly above `threshold`.
pub fn prob_exceeding(diff: &[f64], threshold: f64) -> f64 {
    if diff.is_empty() {
        return 0.0;
    }
    diff.iter().filter(|&&d| d > threshold).count() as f64 / diff.len() as f64
}

/// Expected loss on the control side: mean of max(0, -diff), the average
/// amount by which the variant falls short of control.
pub fn expected_loss_control(diff: &[f64]) -> f64 {
    if diff.is_empty() {
        return 0.0;
    }
    diff.iter().map(|&d| (-d).max(0.0)).sum::<f64>() / diff.len() as f64
}

/// Expected loss on the variant side: mean of max(0, diff), the average
/// amount by which the variant exceeds control.
pub fn expected_loss_variant(diff: &[f64]) -> f64 {
    if diff.is_empty() {
        return 0.0;
    }
    diff.iter().map(|&d| d.max(0.0)).sum::<f64>() / diff.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_distr::{Distribution, Normal};
    use rand_xoshiro::Xoshiro256PlusPlus;

    #[test]
    fn test_hdi_standard_normal_matches_quantiles() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(42);
        let normal = Normal::new(0.0, 1.0).unwrap();
        let samples: Vec<f64> = (0..100_000).map(|_| normal.sample(&mut rng)).collect();

        let (low, high) = highest_density_interval(&samples, 0.95).unwrap();
        assert!((low + 1.96).abs() < 0.05, "low = {low}");
        assert!((high - 1.96).abs() < 0.05, "high = {high}");
    }

    #[test]
    fn test_hdi_width_grows_with_mass() {
        let samples: Vec<f64> = (0..10_000).map(|i| i as f64 / 10_000.0).collect();

        let (l50, h50) = highest_density_interval(&samples, 0.50).unwrap();
        let (l95, h95) = highest_density_interval(&samples, 0.95).unwrap();
        assert!(h95 - l95 > h50 - l50);
    }

    #[test]
    fn test_hdi_tracks_the_dense_region() {
        // Mass packed near zero with a sparse right tail.
        let mut samples: Vec<f64> = (0..900).map(|i| i as f64 / 1000.0).collect();
        samples.extend((0..100).map(|i| 5.0 + i as f64 / 10.0));

        let (low, high) = highest_density_interval(&samples, 0.9).unwrap();
        assert_eq!(low, 0.0);
        assert!(high < 1.0);
    }

    #[test]
    fn test_hdi_rejects_empty_and_bad_mass() {
        assert!(highest_density_interval(&[], 0.95).is_err());
        assert!(highest_density_interval(&[1.0], 0.0).is_err());
        assert!(highest_density_interval(&[1.0], 1.5).is_err());
    }

    #[test]
    fn test_hdi_single_draw() {
        let (low, high) = highest_density_interval(&[2.5], 0.95).unwrap();
        assert_eq!((low, high), (2.5, 2.5));
    }

    #[test]
    fn test_prob_exceeding_counts_strictly_above() {
        let diff = [-1.0, 0.0, 0.5, 1.0];
        assert_eq!(prob_exceeding(&diff, 0.0), 0.5);
        assert_eq!(prob_exceeding(&diff, 2.0), 0.0);
        assert_eq!(prob_exceeding(&diff, -2.0), 1.0);
    }

    #[test]
    fn test_expected_losses_split_the_mean() {
        let diff = [-2.0, -1.0, 1.0, 4.0];
        assert_eq!(expected_loss_control(&diff), 0.75);
        assert_eq!(expected_loss_variant(&diff), 1.25);
        // loss_variant - loss_control equals the mean difference.
        let mean = diff.iter().sum::<f64>() / diff.len() as f64;
        assert!((expected_loss_variant(&diff) - expected_loss_control(&diff) - mean).abs() < 1e-12);
    }

    #[test]
    fn test_expected_loss_sides_follow_the_difference_sign() {
        // Variant strictly ahead: nothing is lost on the control side.
        let ahead = [1.0, 1.0, 1.0, 1.0];
        assert_eq!(expected_loss_control(&ahead), 0.0);
        assert_eq!(expected_loss_variant(&ahead), 1.0);

        // Variant strictly behind: the control side carries the loss.
        let behind = [-0.5, -0.5];
        assert_eq!(expected_loss_control(&behind), 0.5);
        assert_eq!(expected_loss_variant(&behind), 0.0);
    }
}
