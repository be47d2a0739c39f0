//! Validated sample-group snapshots handed to the analysis engines.

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Which kind of metric an effect size or design refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    /// A continuous measurement (e.g. session duration).
    Continuous,
    /// A binary outcome in {0, 1} (e.g. conversion).
    Binary,
}

/// An immutable snapshot of one experiment arm.
///
/// Holds the per-observation primary (continuous) and secondary (binary)
/// metrics plus derived scalars computed once at construction. Engines borrow
/// sample groups and never mutate them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleGroup {
    primary: Vec<f64>,
    secondary: Vec<f64>,
    size: usize,
    primary_mean: f64,
    primary_std: f64,
    conversions: u64,
    conversion_rate: f64,
}

impl SampleGroup {
    /// Build a sample group from raw observations.
    ///
    /// # Errors
    ///
    /// Returns [`AnalysisError::InvalidInput`] if either sequence is empty,
    /// the lengths differ, a primary value is not finite, or a secondary
    /// value is not exactly 0.0 or 1.0.
    pub fn new(primary: Vec<f64>, secondary: Vec<f64>) -> Result<Self, AnalysisError> {
        if primary.is_empty() {
            return Err(AnalysisError::InvalidInput(
                "sample group must contain at least one observation".to_string(),
            ));
        }
        if primary.len() != secondary.len() {
            return Err(AnalysisError::InvalidInput(format!(
                "primary and secondary metrics must be the same length ({} vs {})",
                primary.len(),
                secondary.len()
            )));
        }
        if let Some(v) = primary.iter().find(|v| !v.is_finite()) {
            return Err(AnalysisError::InvalidInput(format!(
                "primary metric contains a non-finite value: {v}"
            )));
        }
        if let Some(v) = secondary.iter().find(|&&v| v != 0.0 && v != 1.0) {
            return Err(AnalysisError::InvalidInput(format!(
                "secondary metric must be 0 or 1, found {v}"
            )));
        }

        let size = primary.len();
        let primary_mean = primary.iter().sum::<f64>() / size as f64;
        let primary_std = sample_std(&primary, primary_mean);
        let conversions = secondary.iter().filter(|&&v| v == 1.0).count() as u64;
        let conversion_rate = conversions as f64 / size as f64;

        Ok(Self {
            primary,
            secondary,
            size,
            primary_mean,
            primary_std,
            conversions,
            conversion_rate,
        })
    }

    /// Observations of the primary (continuous) metric.
    pub fn primary(&self) -> &[f64] {
        &self.primary
    }

    /// Observations of the secondary (binary) metric.
    pub fn secondary(&self) -> &[f64] {
        &self.secondary
    }

    /// Number of observations in the group.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Mean of the primary metric.
    pub fn primary_mean(&self) -> f64 {
        self.primary_mean
    }

    /// Sample standard deviation (n−1 denominator) of the primary metric.
    pub fn primary_std(&self) -> f64 {
        self.primary_std
    }

    /// Number of secondary-metric successes.
    pub fn conversions(&self) -> u64 {
        self.conversions
    }

    /// Fraction of secondary-metric successes.
    pub fn conversion_rate(&self) -> f64 {
        self.conversion_rate
    }
}

/// Sample standard deviation with Bessel's correction; 0.0 for n < 2.
fn sample_std(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let sum_sq: f64 = values
        .iter()
        .map(|v| {
            let d = v - mean;
            d * d
        })
        .sum();
    (sum_sq / (values.len() - 1) as f64).sqrt()
}
