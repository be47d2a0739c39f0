//! Bayesian comparison of control and variant.
//!
//! The engine turns posterior draws from a [`PosteriorSampler`] into a
//! [`PosteriorResult`]: probability the variant is better, expected losses,
//! and the highest-density interval of the difference. When the configured
//! backend reports itself unavailable the engine re-runs the analysis on the
//! normal-approximation sampler instead of failing the pipeline.

mod hdi;
mod sampler;

pub use hdi::{expected_loss_control, expected_loss_variant, highest_density_interval, prob_exceeding};
pub use sampler::{
    AnalyticSampler, BetaPrior, BinaryCounts, ContinuousPrior, McmcSampler, PosteriorDraws,
    PosteriorMode, PosteriorSampler,
};

use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Posterior summary for one metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosteriorResult {
    pub prob_variant_better: f64,
    pub prob_control_better: f64,
    pub expected_loss_control: f64,
    pub expected_loss_variant: f64,
    pub hdi_lower: f64,
    pub hdi_upper: f64,
    pub interval_width: f64,
    pub posterior_mean_control: f64,
    pub posterior_mean_variant: f64,
    pub verdict: String,
    pub mode: PosteriorMode,
}

/// Runs the Bayesian comparison on a configured backend, falling back to the
/// analytic sampler when the backend is unsupported.
pub struct BayesianEngine {
    sampler: Box<dyn PosteriorSampler>,
    fallback: AnalyticSampler,
    hdi_prob: f64,
    min_effect_threshold: f64,
}

impl BayesianEngine {
    pub fn new(
        sampler: Box<dyn PosteriorSampler>,
        fallback: AnalyticSampler,
        hdi_prob: f64,
        min_effect_threshold: f64,
    ) -> Result<Self, AnalysisError> {
        if !(hdi_prob > 0.0 && hdi_prob <= 1.0) {
            return Err(AnalysisError::InvalidInput(format!(
                "HDI mass must be in (0, 1], got {hdi_prob}"
            )));
        }
        Ok(BayesianEngine {
            sampler,
            fallback,
            hdi_prob,
            min_effect_threshold,
        })
    }

    /// Compare two continuous samples.
    pub fn analyze_continuous(
        &self,
        control: &[f64],
        variant: &[f64],
        prior: &ContinuousPrior,
    ) -> Result<PosteriorResult, AnalysisError> {
        let (draws, mode) = match self.sampler.sample_continuous(control, variant, prior) {
            Ok(draws) => (draws, self.sampler.mode()),
            Err(AnalysisError::UnsupportedBackend(_)) => (
                self.fallback.sample_continuous(control, variant, prior)?,
                PosteriorMode::Approximate,
            ),
            Err(err) => return Err(err),
        };
        self.summarize(draws, mode)
    }

    /// Compare two conversion counts.
    pub fn analyze_binary(
        &self,
        control: BinaryCounts,
        variant: BinaryCounts,
        prior: &BetaPrior,
    ) -> Result<PosteriorResult, AnalysisError> {
        let (draws, mode) = match self.sampler.sample_binary(control, variant, prior) {
            Ok(draws) => (draws, self.sampler.mode()),
            Err(AnalysisError::UnsupportedBackend(_)) => (
                self.fallback.sample_binary(control, variant, prior)?,
                PosteriorMode::Approximate,
            ),
            Err(err) => return Err(err),
        };
        self.summarize(draws, mode)
    }

    fn summarize(
        &self,
        draws: PosteriorDraws,
        mode: PosteriorMode,
    ) -> Result<PosteriorResult, AnalysisError> {
        let prob_variant_better = prob_exceeding(&draws.diff, self.min_effect_threshold);
        let prob_control_better = 1.0 - prob_variant_better;
        let (hdi_lower, hdi_upper) = highest_density_interval(&draws.diff, self.hdi_prob)?;

        let mean = |v: &[f64]| v.iter().sum::<f64>() / v.len() as f64;

        let verdict = if prob_variant_better > 0.95 {
            "Strong evidence variant is better".to_string()
        } else if prob_variant_better > 0.80 {
            "Moderate evidence variant is better".to_string()
        } else if prob_control_better > 0.95 {
            "Strong evidence control is better".to_string()
        } else {
            "Insufficient evidence to call a winner".to_string()
        };

        Ok(PosteriorResult {
            prob_variant_better,
            prob_control_better,
            expected_loss_control: expected_loss_control(&draws.diff),
            expected_loss_variant: expected_loss_variant(&draws.diff),
            hdi_lower,
            hdi_upper,
            interval_width: hdi_upper - hdi_lower,
            posterior_mean_control: mean(&draws.control),
            posterior_mean_variant: mean(&draws.variant),
            verdict,
            mode,
        })
    }
}
