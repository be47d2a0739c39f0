//! ab-decision: statistically rigorous go/no-go decisions for A/B experiments
//!
//! This library wraps the `ab-decision-core` engines with configuration,
//! input loading, outlier cleaning, and terminal reporting.

pub mod cleaning;
pub mod cli;
pub mod config;
pub mod input;
pub mod report;

// Re-export core types for convenience
pub use ab_decision_core::{
    run_analysis, AnalysisOptions, AnalysisReport, Decision, Recommendation, SampleGroup,
};

// Re-export main types from this crate
pub use cleaning::{clean_group, CleaningOutcome, OutlierMethod, RawGroup};
pub use cli::Cli;
pub use config::Config;
pub use input::ExperimentData;
pub use report::{ReportError, Reporter, TerminalReporter};
