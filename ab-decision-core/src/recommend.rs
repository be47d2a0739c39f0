//! Combines frequentist and Bayesian evidence into a single go/no-go call.

use serde::{Deserialize, Serialize};

use crate::bayes::PosteriorResult;
use crate::error::AnalysisError;
use crate::stats::HypothesisResult;

/// How many evidence signals the combinator expects: the primary and
/// secondary metric, each scored by both engines.
pub const EXPECTED_SIGNALS: usize = 4;

/// Discrete strength of one piece of evidence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvidenceScore {
    Against,
    Neutral,
    Favors,
}

impl EvidenceScore {
    /// Numeric weight used when averaging into a confidence.
    pub fn value(self) -> f64 {
        match self {
            EvidenceScore::Against => 0.1,
            EvidenceScore::Neutral => 0.5,
            EvidenceScore::Favors => 0.8,
        }
    }
}

/// One scored piece of evidence with a human-readable annotation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceSignal {
    pub score: EvidenceScore,
    pub annotation: String,
}

/// Final decision band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Decision {
    Go,
    Caution,
    NoGo,
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Decision::Go => write!(f, "GO"),
            Decision::Caution => write!(f, "CAUTION"),
            Decision::NoGo => write!(f, "NO-GO"),
        }
    }
}

/// The combined recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub decision: Decision,
    pub confidence: f64,
    pub rationale: String,
    pub evidence_log: Vec<String>,
    pub threshold_used: f64,
    pub alpha_used: f64,
}

/// Score a frequentist test result for the combinator.
///
/// A significant result counts for the variant only when the variant mean is
/// also the larger one; a significant result in the other direction counts
/// against.
pub fn frequentist_signal(result: &HypothesisResult, metric_label: &str) -> EvidenceSignal {
    if result.significant && result.mean_variant > result.mean_control {
        EvidenceSignal {
            score: EvidenceScore::Favors,
            annotation: format!(
                "✓ {}: {} significant, variant ahead (p = {:.4})",
                metric_label, result.test_name, result.p_value
            ),
        }
    } else if result.significant {
        EvidenceSignal {
            score: EvidenceScore::Against,
            annotation: format!(
                "✗ {}: {} significant, control ahead (p = {:.4})",
                metric_label, result.test_name, result.p_value
            ),
        }
    } else {
        EvidenceSignal {
            score: EvidenceScore::Neutral,
            annotation: format!(
                "○ {}: {} not significant (p = {:.4})",
                metric_label, result.test_name, result.p_value
            ),
        }
    }
}

/// Score a posterior result for the combinator.
///
/// Favors the variant when P(variant better) clears the decision threshold;
/// otherwise neutral. The posterior never scores against the variant on its
/// own, the frequentist direction check covers that case.
pub fn bayesian_signal(
    result: &PosteriorResult,
    threshold: f64,
    metric_label: &str,
) -> EvidenceSignal {
    if result.prob_variant_better > threshold {
        EvidenceSignal {
            score: EvidenceScore::Favors,
            annotation: format!(
                "✓ {}: P(variant better) = {:.3} exceeds {:.2}",
                metric_label, result.prob_variant_better, threshold
            ),
        }
    } else {
        EvidenceSignal {
            score: EvidenceScore::Neutral,
            annotation: format!(
                "○ {}: P(variant better) = {:.3} below {:.2}",
                metric_label, result.prob_variant_better, threshold
            ),
        }
    }
}

/// Average the signal scores into a confidence and band it into a decision.
///
/// # Errors
///
/// [`AnalysisError::IncompleteEvidence`] unless exactly
/// [`EXPECTED_SIGNALS`] signals are supplied.
pub fn combine(
    signals: &[EvidenceSignal],
    threshold: f64,
    alpha: f64,
) -> Result<Recommendation, AnalysisError> {
    if signals.len() != EXPECTED_SIGNALS {
        return Err(AnalysisError::IncompleteEvidence {
            expected: EXPECTED_SIGNALS,
            actual: signals.len(),
        });
    }

    let confidence =
        signals.iter().map(|s| s.score.value()).sum::<f64>() / signals.len() as f64;

    let (decision, rationale) = if confidence >= 0.75 {
        (
            Decision::Go,
            "Strong evidence that variant outperforms control".to_string(),
        )
    } else if confidence >= 0.60 {
        (
            Decision::Caution,
            "Mixed evidence - consider running test longer or with larger sample".to_string(),
        )
    } else {
        (
            Decision::NoGo,
            "Insufficient evidence that variant improves metrics".to_string(),
        )
    };

    Ok(Recommendation {
        decision,
        confidence,
        rationale,
        evidence_log: signals.iter().map(|s| s.annotation.clone()).collect(),
        threshold_used: threshold,
        alpha_used: alpha,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bayes::PosteriorMode;

    fn signal(score: EvidenceScore) -> EvidenceSignal {
        EvidenceSignal {
            score,
            annotation: "test".to_string(),
        }
    }

    fn hypothesis(significant: bool, mean_control: f64, mean_variant: f64) -> HypothesisResult {
        HypothesisResult {
            test_name: "Welch's t-test".to_string(),
            statistic: 0.0,
            p_value: if significant { 0.01 } else { 0.4 },
            effect_size: 0.1,
            ci_lower: 0.0,
            ci_upper: 1.0,
            mean_control,
            mean_variant,
            significant,
            verdict: String::new(),
        }
    }

    fn posterior(prob_variant_better: f64) -> PosteriorResult {
        PosteriorResult {
            prob_variant_better,
            prob_control_better: 1.0 - prob_variant_better,
            expected_loss_control: 0.0,
            expected_loss_variant: 0.0,
            hdi_lower: 0.0,
            hdi_upper: 1.0,
            interval_width: 1.0,
            posterior_mean_control: 0.0,
            posterior_mean_variant: 0.0,
            verdict: String::new(),
            mode: PosteriorMode::Approximate,
        }
    }

    #[test]
    fn test_all_favors_is_go() {
        let signals = vec![signal(EvidenceScore::Favors); 4];
        let rec = combine(&signals, 0.8, 0.05).unwrap();
        assert_eq!(rec.decision, Decision::Go);
        assert!((rec.confidence - 0.8).abs() < 1e-12);
        assert_eq!(rec.rationale, "Strong evidence that variant outperforms control");
    }

    #[test]
    fn test_mixed_evidence_is_caution() {
        // Two favors and two neutral average to 0.65.
        let signals = vec![
            signal(EvidenceScore::Favors),
            signal(EvidenceScore::Favors),
            signal(EvidenceScore::Neutral),
            signal(EvidenceScore::Neutral),
        ];
        let rec = combine(&signals, 0.8, 0.05).unwrap();
        assert_eq!(rec.decision, Decision::Caution);
        assert!((rec.confidence - 0.65).abs() < 1e-12);
    }

    #[test]
    fn test_all_neutral_is_no_go() {
        let signals = vec![signal(EvidenceScore::Neutral); 4];
        let rec = combine(&signals, 0.8, 0.05).unwrap();
        assert_eq!(rec.decision, Decision::NoGo);
        assert!((rec.confidence - 0.5).abs() < 1e-12);
    }

    #[test]
    fn test_significant_regression_pulls_down() {
        let signals = vec![
            signal(EvidenceScore::Against),
            signal(EvidenceScore::Favors),
            signal(EvidenceScore::Neutral),
            signal(EvidenceScore::Neutral),
        ];
        let rec = combine(&signals, 0.8, 0.05).unwrap();
        assert_eq!(rec.decision, Decision::NoGo);
    }

    #[test]
    fn test_wrong_signal_count_rejected() {
        let signals = vec![signal(EvidenceScore::Neutral); 3];
        let err = combine(&signals, 0.8, 0.05).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::IncompleteEvidence {
                expected: 4,
                actual: 3
            }
        ));
    }

    #[test]
    fn test_combine_is_deterministic() {
        let signals = vec![
            signal(EvidenceScore::Favors),
            signal(EvidenceScore::Neutral),
            signal(EvidenceScore::Favors),
            signal(EvidenceScore::Against),
        ];
        let a = combine(&signals, 0.8, 0.05).unwrap();
        let b = combine(&signals, 0.8, 0.05).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_frequentist_signal_directions() {
        let up = frequentist_signal(&hypothesis(true, 10.0, 12.0), "primary");
        assert_eq!(up.score, EvidenceScore::Favors);
        assert!(up.annotation.starts_with('✓'));

        let down = frequentist_signal(&hypothesis(true, 12.0, 10.0), "primary");
        assert_eq!(down.score, EvidenceScore::Against);
        assert!(down.annotation.starts_with('✗'));

        let flat = frequentist_signal(&hypothesis(false, 10.0, 10.1), "primary");
        assert_eq!(flat.score, EvidenceScore::Neutral);
        assert!(flat.annotation.starts_with('○'));
    }

    #[test]
    fn test_bayesian_signal_threshold() {
        let strong = bayesian_signal(&posterior(0.97), 0.8, "primary");
        assert_eq!(strong.score, EvidenceScore::Favors);

        let weak = bayesian_signal(&posterior(0.6), 0.8, "primary");
        assert_eq!(weak.score, EvidenceScore::Neutral);

        // Exactly at the threshold does not clear it.
        let edge = bayesian_signal(&posterior(0.8), 0.8, "primary");
        assert_eq!(edge.score, EvidenceScore::Neutral);
    }
}
