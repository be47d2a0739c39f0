//! Frequentist hypothesis tests and distribution diagnostics.

use serde::{Deserialize, Serialize};

/// Which tail(s) of the sampling distribution the test considers.
///
/// Directions follow the (control, variant) argument order: `Less` tests
/// whether the control tends smaller than the variant, `Greater` the reverse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Alternative {
    /// Two-sided test (default).
    #[default]
    TwoSided,
    /// One-sided: control < variant.
    Less,
    /// One-sided: control > variant.
    Greater,
}

/// The result of a frequentist hypothesis test.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HypothesisResult {
    /// Human-readable name of the test.
    pub test_name: String,
    /// The test statistic (t, chi-square, or U).
    pub statistic: f64,
    /// The p-value in [0, 1].
    pub p_value: f64,
    /// Standardized effect size (Cohen's d, Cohen's h, or rank-biserial r).
    pub effect_size: f64,
    /// Lower bound of the confidence interval for the difference.
    pub ci_lower: f64,
    /// Upper bound of the confidence interval for the difference.
    pub ci_upper: f64,
    /// Control-group mean (or conversion rate).
    pub mean_control: f64,
    /// Variant-group mean (or conversion rate).
    pub mean_variant: f64,
    /// Whether p_value < alpha.
    pub significant: bool,
    /// Reject / fail-to-reject verdict text.
    pub verdict: String,
}

/// The result of a distributional diagnostic (normality, equal variance).
///
/// Diagnostics are informational: they never gate the recommendation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticResult {
    /// Name of the diagnostic test.
    pub test_name: String,
    /// The test statistic (W for Shapiro-Wilk, F for Levene).
    pub statistic: f64,
    /// The p-value in [0, 1].
    pub p_value: f64,
    /// Whether the assumption holds at the 0.05 threshold (p > 0.05).
    pub passed: bool,
}

mod chisq;
mod diagnostics;
mod ranks;
mod ttest;

pub use chisq::chi_square_test;
pub use diagnostics::{check_equal_variance, check_normality};
pub use ranks::mann_whitney_u_test;
pub use ttest::welch_t_test;
