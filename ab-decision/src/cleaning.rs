//! Outlier cleaning applied to raw observations before analysis.
//!
//! Outliers are detected on the primary metric only, but removal drops the
//! whole observation so the primary and secondary metrics stay paired.

use serde::{Deserialize, Serialize};

/// Outlier detection method for the primary metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlierMethod {
    /// Keep observations within 1.5 IQR of the quartiles.
    #[default]
    Iqr,
    /// Keep observations with |z| below the configured threshold.
    Zscore,
    /// Leave the data untouched.
    None,
}

/// One experiment group as loaded from disk, before cleaning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawGroup {
    /// Primary (continuous) metric, one value per observation.
    pub primary: Vec<f64>,
    /// Secondary (binary) metric, 0.0 or 1.0, paired with `primary`.
    pub secondary: Vec<f64>,
}

/// What cleaning did to one group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleaningOutcome {
    pub kept: usize,
    pub removed: usize,
}

/// Remove outlier observations from a group.
///
/// Returns the cleaned group and a removal count. Non-finite primary values
/// are always dropped; detection then runs on what remains.
pub fn clean_group(
    group: &RawGroup,
    method: OutlierMethod,
    zscore_threshold: f64,
) -> (RawGroup, CleaningOutcome) {
    let paired: Vec<(f64, f64)> = group
        .primary
        .iter()
        .zip(group.secondary.iter())
        .filter(|(p, _)| p.is_finite())
        .map(|(&p, &s)| (p, s))
        .collect();

    let keep: Vec<bool> = match method {
        OutlierMethod::None => vec![true; paired.len()],
        OutlierMethod::Iqr => iqr_mask(&paired),
        OutlierMethod::Zscore => zscore_mask(&paired, zscore_threshold),
    };

    let mut primary = Vec::with_capacity(paired.len());
    let mut secondary = Vec::with_capacity(paired.len());
    for ((p, s), keep) in paired.iter().zip(keep.iter()) {
        if *keep {
            primary.push(*p);
            secondary.push(*s);
        }
    }

    let kept = primary.len();
    let removed = group.primary.len() - kept;
    (
        RawGroup { primary, secondary },
        CleaningOutcome { kept, removed },
    )
}

/// Linear-interpolation quantile over a sorted slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let pos = q * (n - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let weight = pos - lower as f64;
    sorted[lower] * (1.0 - weight) + sorted[upper] * weight
}

fn iqr_mask(paired: &[(f64, f64)]) -> Vec<bool> {
    if paired.len() < 4 {
        return vec![true; paired.len()];
    }
    let mut sorted: Vec<f64> = paired.iter().map(|(p, _)| *p).collect();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let q1 = quantile(&sorted, 0.25);
    let q3 = quantile(&sorted, 0.75);
    let iqr = q3 - q1;
    let low = q1 - 1.5 * iqr;
    let high = q3 + 1.5 * iqr;

    paired.iter().map(|(p, _)| (low..=high).contains(p)).collect()
}

fn zscore_mask(paired: &[(f64, f64)], threshold: f64) -> Vec<bool> {
    let n = paired.len() as f64;
    if paired.len() < 2 {
        return vec![true; paired.len()];
    }
    let mean = paired.iter().map(|(p, _)| p).sum::<f64>() / n;
    let variance = paired.iter().map(|(p, _)| (p - mean).powi(2)).sum::<f64>() / (n - 1.0);
    let sd = variance.sqrt();
    if sd == 0.0 {
        return vec![true; paired.len()];
    }
    paired
        .iter()
        .map(|(p, _)| ((p - mean) / sd).abs() < threshold)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn group(primary: Vec<f64>) -> RawGroup {
        let secondary = primary.iter().map(|_| 0.0).collect();
        RawGroup { primary, secondary }
    }

    #[test]
    fn test_iqr_removes_extreme_point() {
        let mut primary: Vec<f64> = (0..50).map(|i| 100.0 + i as f64).collect();
        primary.push(10_000.0);
        let (cleaned, outcome) = clean_group(&group(primary), OutlierMethod::Iqr, 3.0);

        assert_eq!(outcome.removed, 1);
        assert_eq!(cleaned.primary.len(), 50);
        assert!(cleaned.primary.iter().all(|&p| p < 1000.0));
    }

    #[test]
    fn test_iqr_keeps_clean_data() {
        let primary: Vec<f64> = (0..50).map(|i| 100.0 + i as f64).collect();
        let (_, outcome) = clean_group(&group(primary), OutlierMethod::Iqr, 3.0);
        assert_eq!(outcome.removed, 0);
    }

    #[test]
    fn test_zscore_threshold_respected() {
        let mut primary: Vec<f64> = (0..100).map(|i| (i % 10) as f64).collect();
        primary.push(500.0);
        let (cleaned, outcome) = clean_group(&group(primary), OutlierMethod::Zscore, 3.0);

        assert_eq!(outcome.removed, 1);
        assert!(!cleaned.primary.contains(&500.0));
    }

    #[test]
    fn test_removal_keeps_metrics_paired() {
        let raw = RawGroup {
            primary: vec![1.0, 2.0, 3.0, 2.0, 1000.0, 2.5, 1.5, 2.2],
            secondary: vec![0.0, 1.0, 0.0, 1.0, 1.0, 0.0, 1.0, 0.0],
        };
        let (cleaned, outcome) = clean_group(&raw, OutlierMethod::Iqr, 3.0);

        assert_eq!(outcome.removed, 1);
        assert_eq!(cleaned.primary.len(), cleaned.secondary.len());
        // The conversion paired with the outlier went with it.
        assert_eq!(cleaned.secondary.iter().sum::<f64>(), 3.0);
    }

    #[test]
    fn test_none_method_passes_through() {
        let primary = vec![1.0, 2.0, 1_000_000.0];
        let (cleaned, outcome) = clean_group(&group(primary.clone()), OutlierMethod::None, 3.0);
        assert_eq!(outcome.removed, 0);
        assert_eq!(cleaned.primary, primary);
    }

    #[test]
    fn test_non_finite_values_always_dropped() {
        let raw = RawGroup {
            primary: vec![1.0, f64::NAN, 2.0, f64::INFINITY],
            secondary: vec![0.0, 1.0, 0.0, 1.0],
        };
        let (cleaned, outcome) = clean_group(&raw, OutlierMethod::None, 3.0);
        assert_eq!(outcome.removed, 2);
        assert_eq!(cleaned.primary, vec![1.0, 2.0]);
    }
}
