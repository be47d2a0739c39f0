//! Command-line interface for ab-decision.

use crate::config::Config;
use ab_decision_core::bayes::PosteriorMode;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "ab-decision")]
#[command(about = "Statistically rigorous go/no-go decisions for A/B experiments")]
#[command(version)]
pub struct Cli {
    /// Path to the experiment data (JSON with control and variant groups)
    pub input: PathBuf,

    /// Path to config file
    #[arg(long, default_value = ".ab-decision.toml")]
    pub config: String,

    /// Significance level for frequentist tests (0.0-1.0)
    #[arg(long)]
    pub alpha: Option<f64>,

    /// Target power for the sample-size designs (0.0-1.0)
    #[arg(long)]
    pub power: Option<f64>,

    /// Minimum detectable relative lift, in percent
    #[arg(long)]
    pub min_detectable_effect: Option<f64>,

    /// Bayesian decision threshold on P(variant better)
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Seed for the posterior sampler
    #[arg(long)]
    pub seed: Option<u64>,

    /// Use the exact MCMC posterior instead of the normal approximation
    #[arg(long)]
    pub exact: bool,

    /// Write the report document (JSON) to this path
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Disable colored terminal output
    #[arg(long)]
    pub no_color: bool,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,
}

impl Cli {
    /// Apply CLI overrides to the configuration.
    ///
    /// CLI arguments take precedence over config file values.
    /// Only non-None optional values will override the config.
    pub fn apply_to_config(&self, config: &mut Config) {
        if let Some(alpha) = self.alpha {
            config.design.alpha = alpha;
        }

        if let Some(power) = self.power {
            config.design.power = power;
        }

        if let Some(mde) = self.min_detectable_effect {
            config.design.min_detectable_effect_pct = mde;
        }

        if let Some(threshold) = self.threshold {
            config.bayesian.decision_threshold = threshold;
        }

        if let Some(seed) = self.seed {
            config.bayesian.seed = seed;
        }

        if self.exact {
            config.bayesian.mode = PosteriorMode::Exact;
        }
    }
}
