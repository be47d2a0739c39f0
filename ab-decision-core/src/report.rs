//! The assembled analysis report and its JSON document form.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::bayes::PosteriorResult;
use crate::error::AnalysisError;
use crate::power::PowerDesign;
use crate::recommend::Recommendation;
use crate::stats::{DiagnosticResult, HypothesisResult};

/// Number of decimal places kept when serializing numeric fields.
const DOCUMENT_PRECISION: i32 = 6;

/// Descriptive statistics for one group as observed in the input.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupSummary {
    pub size: usize,
    pub primary_mean: f64,
    pub primary_std: f64,
    pub conversions: u64,
    pub conversion_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataSummary {
    pub control: GroupSummary,
    pub variant: GroupSummary,
}

/// Prospective designs plus the power actually achieved at the observed
/// sample sizes and effects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerSection {
    pub primary: PowerDesign,
    pub secondary: PowerDesign,
    pub achieved_power_primary: f64,
    pub achieved_power_secondary: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DiagnosticsSection {
    pub normality_control: DiagnosticResult,
    pub normality_variant: DiagnosticResult,
    pub equal_variance: DiagnosticResult,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrequentistSection {
    pub primary_ttest: HypothesisResult,
    pub primary_mann_whitney: HypothesisResult,
    pub secondary_chi_square: HypothesisResult,
    pub diagnostics: DiagnosticsSection,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BayesianSection {
    pub primary: PosteriorResult,
    pub secondary: PosteriorResult,
}

/// Everything the pipeline produced for one experiment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub data_summary: DataSummary,
    pub power: PowerSection,
    pub frequentist: FrequentistSection,
    pub bayesian: BayesianSection,
    pub recommendation: Recommendation,
}

impl AnalysisReport {
    /// Serialize to a JSON document with every number rounded to
    /// [`DOCUMENT_PRECISION`] decimals, so reports diff cleanly.
    pub fn to_document(&self) -> Result<Value, AnalysisError> {
        let mut value = serde_json::to_value(self).map_err(|err| {
            AnalysisError::InvalidInput(format!("report serialization failed: {err}"))
        })?;
        round_numbers(&mut value);
        Ok(value)
    }

    /// Rebuild a report from a document produced by [`Self::to_document`].
    pub fn from_document(value: Value) -> Result<Self, AnalysisError> {
        serde_json::from_value(value).map_err(|err| {
            AnalysisError::InvalidInput(format!("report deserialization failed: {err}"))
        })
    }
}

fn round_numbers(value: &mut Value) {
    match value {
        Value::Number(n) => {
            if let Some(f) = n.as_f64() {
                // Integers survive rounding untouched, so only rewrite when
                // the rounded float still maps to a JSON number.
                if n.is_f64() {
                    let factor = 10f64.powi(DOCUMENT_PRECISION);
                    let rounded = (f * factor).round() / factor;
                    if let Some(num) = serde_json::Number::from_f64(rounded) {
                        *n = num;
                    }
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                round_numbers(item);
            }
        }
        Value::Object(map) => {
            for (_, item) in map.iter_mut() {
                round_numbers(item);
            }
        }
        _ => {}
    }
}
