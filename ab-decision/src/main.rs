use anyhow::{Context, Result};
use clap::Parser;
use std::path::Path;

use ab_decision::{
    clean_group, run_analysis, Cli, Config, ExperimentData, Reporter, SampleGroup,
    TerminalReporter,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config and apply CLI overrides. A custom --config path must
    // exist; the default file name is optional.
    let mut config = if cli.config == ".ab-decision.toml" {
        Config::load_or_default()?
    } else {
        Config::load(Path::new(&cli.config))?
    };
    cli.apply_to_config(&mut config);

    if cli.verbose {
        eprintln!("Configuration: {:?}", config);
    }

    // 1. Load the experiment data
    let data = ExperimentData::load(&cli.input).context("Failed to load experiment data")?;

    // 2. Clean outliers before any statistics run
    let method = config.cleaning.outlier_method;
    let threshold = config.cleaning.zscore_threshold;
    let (control_raw, control_outcome) = clean_group(&data.control, method, threshold);
    let (variant_raw, variant_outcome) = clean_group(&data.variant, method, threshold);

    if cli.verbose {
        eprintln!(
            "Cleaning: control kept {} removed {}, variant kept {} removed {}",
            control_outcome.kept,
            control_outcome.removed,
            variant_outcome.kept,
            variant_outcome.removed
        );
    }

    let control = SampleGroup::new(control_raw.primary, control_raw.secondary)
        .context("Invalid control group after cleaning")?;
    let variant = SampleGroup::new(variant_raw.primary, variant_raw.secondary)
        .context("Invalid variant group after cleaning")?;

    // 3. Run the analysis pipeline
    let report = run_analysis(&control, &variant, &config.to_options())
        .context("Analysis failed")?;

    // 4. Report results
    let reporter = if cli.no_color {
        TerminalReporter::without_colors()
    } else {
        TerminalReporter::new()
    };
    reporter.report(&report)?;

    // 5. Optionally write the report document
    if let Some(output) = &cli.output {
        let document = report.to_document().context("Failed to serialize report")?;
        let json = serde_json::to_string_pretty(&document)?;
        std::fs::write(output, json)
            .with_context(|| format!("Failed to write report to {}", output.display()))?;
        if cli.verbose {
            eprintln!("Report written to {}", output.display());
        }
    }

    Ok(())
}
