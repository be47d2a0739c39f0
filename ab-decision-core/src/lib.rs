//! Core statistical engines for ab-decision.
//!
//! This crate provides the building blocks of the A/B decision pipeline:
//! power planning, frequentist hypothesis tests with assumption diagnostics,
//! Bayesian posterior comparison, and the evidence combinator that turns
//! both views into a single recommendation. The `ab-decision` CLI wraps
//! these engines with configuration, data cleaning, and terminal reporting.

pub mod bayes;
pub mod error;
pub mod pipeline;
pub mod power;
pub mod recommend;
pub mod report;
pub mod samples;
pub mod stats;

// Re-export main types for convenience
pub use bayes::{
    AnalyticSampler, BayesianEngine, BetaPrior, BinaryCounts, ContinuousPrior, McmcSampler,
    PosteriorMode, PosteriorResult, PosteriorSampler,
};
pub use error::AnalysisError;
pub use pipeline::{run_analysis, AnalysisOptions};
pub use power::PowerDesign;
pub use recommend::{Decision, EvidenceScore, EvidenceSignal, Recommendation};
pub use report::AnalysisReport;
pub use samples::{MetricKind, SampleGroup};
pub use stats::{Alternative, DiagnosticResult, HypothesisResult};
