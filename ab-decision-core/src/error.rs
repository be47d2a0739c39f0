//! Error types for the analysis engines.

use thiserror::Error;

/// Errors surfaced by the statistical core.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Input data or configuration fails validation.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A statistic degenerated (zero variance, zero standard error) where a
    /// ratio is required and no fallback value is defined.
    #[error("degenerate statistic: {0}")]
    DegenerateStatistic(String),

    /// Sample-size formulas have no sensible answer for a zero effect size.
    #[error("effect size must be non-zero for sample size calculation")]
    InvalidEffectSize,

    /// The exact posterior-sampling backend is unavailable. The Bayesian
    /// engine recovers from this locally by switching to approximate mode.
    #[error("posterior sampling backend unavailable: {0}")]
    UnsupportedBackend(String),

    /// The recommendation combinator received an incomplete signal set.
    #[error("recommendation requires {expected} evidence signals, got {actual}")]
    IncompleteEvidence { expected: usize, actual: usize },
}
