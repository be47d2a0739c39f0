use std::io::{self, Write};

use colored::Colorize;

use ab_decision_core::report::{BayesianSection, DataSummary, FrequentistSection, PowerSection};
use ab_decision_core::stats::{DiagnosticResult, HypothesisResult};
use ab_decision_core::{AnalysisReport, Decision, Recommendation};

use super::{ReportError, Reporter};

/// A reporter that renders the analysis report to the terminal.
#[derive(Debug, Clone, Default)]
pub struct TerminalReporter {
    /// Whether to use colors in output (defaults to true).
    use_colors: bool,
}

impl TerminalReporter {
    /// Create a new terminal reporter with default settings.
    pub fn new() -> Self {
        Self { use_colors: true }
    }

    /// Create a terminal reporter with color output disabled.
    pub fn without_colors() -> Self {
        Self { use_colors: false }
    }

    fn heading(&self, text: &str) -> String {
        if self.use_colors {
            text.bold().to_string()
        } else {
            text.to_string()
        }
    }

    fn print_data_summary(
        &self,
        writer: &mut impl Write,
        summary: &DataSummary,
    ) -> io::Result<()> {
        writeln!(writer, "{}", self.heading("Data summary"))?;
        writeln!(
            writer,
            "{:<10} {:>8} {:>14} {:>12} {:>12} {:>10}",
            "Group", "n", "Mean", "Std dev", "Conversions", "Rate"
        )?;
        for (name, group) in [("control", &summary.control), ("variant", &summary.variant)] {
            writeln!(
                writer,
                "{:<10} {:>8} {:>14.4} {:>12.4} {:>12} {:>9.2}%",
                name,
                group.size,
                group.primary_mean,
                group.primary_std,
                group.conversions,
                group.conversion_rate * 100.0
            )?;
        }
        writeln!(writer)?;
        Ok(())
    }

    fn print_power(&self, writer: &mut impl Write, power: &PowerSection) -> io::Result<()> {
        writeln!(writer, "{}", self.heading("Power"))?;
        writeln!(
            writer,
            "Primary metric:   need {} per group for d = {:.4} (achieved power {:.1}%)",
            power.primary.required_n_per_group,
            power.primary.effect_size,
            power.achieved_power_primary * 100.0
        )?;
        writeln!(
            writer,
            "Secondary metric: need {} per group for h = {:.4} (achieved power {:.1}%)",
            power.secondary.required_n_per_group,
            power.secondary.effect_size,
            power.achieved_power_secondary * 100.0
        )?;
        writeln!(writer)?;
        Ok(())
    }

    fn significance(&self, result: &HypothesisResult) -> String {
        if result.significant {
            let text = "significant";
            if self.use_colors {
                text.green().to_string()
            } else {
                text.to_string()
            }
        } else {
            let text = "not significant";
            if self.use_colors {
                text.yellow().to_string()
            } else {
                text.to_string()
            }
        }
    }

    fn print_test_row(&self, writer: &mut impl Write, result: &HypothesisResult) -> io::Result<()> {
        writeln!(
            writer,
            "{:<22} stat = {:>10.4}  p = {:.4}  effect = {:.4}  [{}]",
            result.test_name,
            result.statistic,
            result.p_value,
            result.effect_size,
            self.significance(result)
        )
    }

    fn print_diagnostic_row(
        &self,
        writer: &mut impl Write,
        result: &DiagnosticResult,
    ) -> io::Result<()> {
        let status = if result.passed {
            if self.use_colors {
                "pass".green().to_string()
            } else {
                "pass".to_string()
            }
        } else if self.use_colors {
            "fail".yellow().to_string()
        } else {
            "fail".to_string()
        };
        writeln!(
            writer,
            "{:<26} stat = {:>8.4}  p = {:.4}  [{}]",
            result.test_name, result.statistic, result.p_value, status
        )
    }

    fn print_frequentist(
        &self,
        writer: &mut impl Write,
        section: &FrequentistSection,
    ) -> io::Result<()> {
        writeln!(writer, "{}", self.heading("Frequentist tests"))?;
        self.print_test_row(writer, &section.primary_ttest)?;
        self.print_test_row(writer, &section.primary_mann_whitney)?;
        self.print_test_row(writer, &section.secondary_chi_square)?;
        writeln!(writer)?;
        writeln!(writer, "{}", self.heading("Diagnostics"))?;
        self.print_diagnostic_row(writer, &section.diagnostics.normality_control)?;
        self.print_diagnostic_row(writer, &section.diagnostics.normality_variant)?;
        self.print_diagnostic_row(writer, &section.diagnostics.equal_variance)?;
        writeln!(writer)?;
        Ok(())
    }

    fn print_bayesian(&self, writer: &mut impl Write, section: &BayesianSection) -> io::Result<()> {
        writeln!(writer, "{}", self.heading("Bayesian comparison"))?;
        for (label, posterior) in [
            ("Primary metric", &section.primary),
            ("Secondary metric", &section.secondary),
        ] {
            writeln!(
                writer,
                "{} ({} posterior): P(variant better) = {:.3}",
                label, posterior.mode, posterior.prob_variant_better
            )?;
            writeln!(
                writer,
                "  HDI of difference: [{:.4}, {:.4}]  expected loss: control = {:.4}, variant = {:.4}",
                posterior.hdi_lower,
                posterior.hdi_upper,
                posterior.expected_loss_control,
                posterior.expected_loss_variant
            )?;
            writeln!(writer, "  {}", posterior.verdict)?;
        }
        writeln!(writer)?;
        Ok(())
    }

    fn print_recommendation(
        &self,
        writer: &mut impl Write,
        recommendation: &Recommendation,
    ) -> io::Result<()> {
        writeln!(writer, "{}", self.heading("Recommendation"))?;
        for line in &recommendation.evidence_log {
            writeln!(writer, "  {}", line)?;
        }

        let decision = recommendation.decision.to_string();
        let decision = if self.use_colors {
            match recommendation.decision {
                Decision::Go => decision.green().bold().to_string(),
                Decision::Caution => decision.yellow().bold().to_string(),
                Decision::NoGo => decision.red().bold().to_string(),
            }
        } else {
            decision
        };
        writeln!(
            writer,
            "\n{} (confidence {:.2}): {}",
            decision, recommendation.confidence, recommendation.rationale
        )?;
        writeln!(writer)?;
        Ok(())
    }

    fn print_report(&self, writer: &mut impl Write, report: &AnalysisReport) -> io::Result<()> {
        writeln!(writer)?;
        self.print_data_summary(writer, &report.data_summary)?;
        self.print_power(writer, &report.power)?;
        self.print_frequentist(writer, &report.frequentist)?;
        self.print_bayesian(writer, &report.bayesian)?;
        self.print_recommendation(writer, &report.recommendation)?;
        Ok(())
    }
}

impl Reporter for TerminalReporter {
    fn report(&self, report: &AnalysisReport) -> Result<(), ReportError> {
        let stdout = io::stdout();
        let mut writer = stdout.lock();
        self.print_report(&mut writer, report)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ab_decision_core::{run_analysis, AnalysisOptions, SampleGroup};

    fn sample_report() -> AnalysisReport {
        let build = |mean: f64, rate: f64| {
            let n = 200;
            let primary: Vec<f64> = (0..n)
                .map(|i| mean + 30.0 * (((i as f64 / n as f64) - 0.5) * 2.0))
                .collect();
            let secondary: Vec<f64> = (0..n)
                .map(|i| if (i as f64) < rate * n as f64 { 1.0 } else { 0.0 })
                .collect();
            SampleGroup::new(primary, secondary).unwrap()
        };
        let control = build(450.0, 0.08);
        let variant = build(465.0, 0.10);
        run_analysis(&control, &variant, &AnalysisOptions::default()).unwrap()
    }

    #[test]
    fn test_report_renders_all_sections() {
        let reporter = TerminalReporter::without_colors();
        let report = sample_report();

        let mut buffer = Vec::new();
        reporter.print_report(&mut buffer, &report).unwrap();

        let output = String::from_utf8(buffer).unwrap();
        assert!(output.contains("Data summary"));
        assert!(output.contains("Power"));
        assert!(output.contains("Frequentist tests"));
        assert!(output.contains("Welch's t-test"));
        assert!(output.contains("Diagnostics"));
        assert!(output.contains("Bayesian comparison"));
        assert!(output.contains("Recommendation"));
        assert!(output.contains("confidence"));
    }

    #[test]
    fn test_decision_labels() {
        assert_eq!(Decision::Go.to_string(), "GO");
        assert_eq!(Decision::Caution.to_string(), "CAUTION");
        assert_eq!(Decision::NoGo.to_string(), "NO-GO");
    }
}
