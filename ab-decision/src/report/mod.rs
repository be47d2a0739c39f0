use ab_decision_core::AnalysisReport;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub trait Reporter: Send + Sync {
    fn report(&self, report: &AnalysisReport) -> Result<(), ReportError>;
}

mod terminal;
pub use terminal::TerminalReporter;
