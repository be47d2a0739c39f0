//! Configuration loading for ab-decision.
//!
//! Supports loading configuration from TOML files, with sensible defaults
//! for all settings.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use ab_decision_core::bayes::{BetaPrior, ContinuousPrior, PosteriorMode};
use ab_decision_core::stats::Alternative;
use ab_decision_core::AnalysisOptions;

use crate::cleaning::OutlierMethod;

/// Top-level configuration for ab-decision.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Settings for experiment sizing.
    pub design: DesignConfig,
    /// Settings for frequentist hypothesis testing.
    pub hypothesis: HypothesisConfig,
    /// Settings for the Bayesian comparison.
    pub bayesian: BayesianConfig,
    /// Settings for outlier cleaning of the input data.
    pub cleaning: CleaningConfig,
}

/// Configuration for experiment sizing and power.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DesignConfig {
    /// Significance level for all frequentist tests.
    pub alpha: f64,
    /// Target statistical power for the sample-size designs.
    pub power: f64,
    /// Minimum detectable relative lift, in percent.
    pub min_detectable_effect_pct: f64,
}

/// Configuration for frequentist hypothesis testing.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HypothesisConfig {
    /// Alternative hypothesis: "two-sided", "less", or "greater".
    pub alternative: Alternative,
}

/// Configuration for the Bayesian comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BayesianConfig {
    /// Posterior backend: "exact" (MCMC) or "approximate".
    pub mode: PosteriorMode,
    /// Number of retained posterior draws per group.
    pub draws: usize,
    /// Number of discarded tuning draws (exact mode only).
    pub tune: usize,
    /// Seed for the posterior sampler.
    pub seed: u64,
    /// P(variant better) must exceed this for the Bayesian evidence to count.
    pub decision_threshold: f64,
    /// Minimum posterior difference that counts as an improvement.
    pub min_effect_threshold: f64,
    /// Mass of the highest-density interval.
    pub hdi_prob: f64,
    /// Prior for continuous group means.
    pub continuous_prior: ContinuousPrior,
    /// Prior for conversion rates.
    pub beta_prior: BetaPrior,
}

/// Configuration for outlier cleaning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CleaningConfig {
    /// Outlier detection method applied to the primary metric.
    pub outlier_method: OutlierMethod,
    /// |z| cutoff when the z-score method is selected.
    pub zscore_threshold: f64,
}

impl Default for DesignConfig {
    fn default() -> Self {
        Self {
            alpha: 0.05,
            power: 0.80,
            min_detectable_effect_pct: 5.0,
        }
    }
}

impl Default for HypothesisConfig {
    fn default() -> Self {
        Self {
            alternative: Alternative::TwoSided,
        }
    }
}

impl Default for BayesianConfig {
    fn default() -> Self {
        Self {
            mode: PosteriorMode::Approximate,
            draws: 2000,
            tune: 1000,
            seed: 42,
            decision_threshold: 0.8,
            min_effect_threshold: 0.0,
            hdi_prob: 0.95,
            continuous_prior: ContinuousPrior::default(),
            beta_prior: BetaPrior::default(),
        }
    }
}

impl Default for CleaningConfig {
    fn default() -> Self {
        Self {
            outlier_method: OutlierMethod::Iqr,
            zscore_threshold: 3.0,
        }
    }
}

/// Default configuration file name.
const DEFAULT_CONFIG_FILE: &str = ".ab-decision.toml";

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> Result<Config> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Load configuration from the default file (`.ab-decision.toml`) or use defaults.
    ///
    /// If the file doesn't exist, default configuration is returned.
    /// If the file exists but cannot be parsed, an error is returned.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be parsed.
    pub fn load_or_default() -> Result<Config> {
        let path = Path::new(DEFAULT_CONFIG_FILE);

        if path.exists() {
            Self::load(path)
        } else {
            Ok(Config::default())
        }
    }

    /// Load configuration from the specified path, or try default locations.
    ///
    /// # Errors
    ///
    /// Returns an error if the specified file cannot be read or parsed.
    pub fn load_from(path: Option<&Path>) -> Result<Config> {
        match path {
            Some(p) => Self::load(p),
            None => Self::load_or_default(),
        }
    }

    /// Convert the configuration into the options the analysis pipeline takes.
    pub fn to_options(&self) -> AnalysisOptions {
        AnalysisOptions {
            alpha: self.design.alpha,
            power: self.design.power,
            min_detectable_effect_pct: self.design.min_detectable_effect_pct,
            alternative: self.hypothesis.alternative,
            decision_threshold: self.bayesian.decision_threshold,
            min_effect_threshold: self.bayesian.min_effect_threshold,
            hdi_prob: self.bayesian.hdi_prob,
            continuous_prior: self.bayesian.continuous_prior,
            beta_prior: self.bayesian.beta_prior,
            draws: self.bayesian.draws,
            tune: self.bayesian.tune,
            seed: self.bayesian.seed,
            mode: self.bayesian.mode,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.design.alpha, 0.05);
        assert_eq!(config.design.power, 0.80);
        assert_eq!(config.design.min_detectable_effect_pct, 5.0);
        assert_eq!(config.hypothesis.alternative, Alternative::TwoSided);
        assert_eq!(config.bayesian.mode, PosteriorMode::Approximate);
        assert_eq!(config.bayesian.draws, 2000);
        assert_eq!(config.bayesian.seed, 42);
        assert_eq!(config.bayesian.decision_threshold, 0.8);
        assert_eq!(config.cleaning.outlier_method, OutlierMethod::Iqr);
        assert_eq!(config.cleaning.zscore_threshold, 3.0);
    }

    #[test]
    fn test_load_partial_config() {
        let toml_content = r#"
[design]
alpha = 0.01

[bayesian]
draws = 5000
"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(toml_content.as_bytes()).unwrap();

        let config = Config::load(file.path()).unwrap();

        // Overridden values
        assert_eq!(config.design.alpha, 0.01);
        assert_eq!(config.bayesian.draws, 5000);

        // Default values
        assert_eq!(config.design.power, 0.80);
        assert_eq!(config.bayesian.seed, 42);
        assert_eq!(config.cleaning.outlier_method, OutlierMethod::Iqr);
    }

    #[test]
    fn test_load_full_config() {
        let toml_content = r#"
[design]
alpha = 0.01
power = 0.9
min_detectable_effect_pct = 2.5

[hypothesis]
alternative = "greater"

[bayesian]
mode = "exact"
draws = 4000
tune = 2000
seed = 7
decision_threshold = 0.9
min_effect_threshold = 0.5
hdi_prob = 0.9
continuous_prior = { mean = 100.0, std = 50.0, sigma_scale = 25.0 }
beta_prior = { alpha = 2.0, beta = 8.0 }

[cleaning]
outlier_method = "zscore"
zscore_threshold = 2.5
"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(toml_content.as_bytes()).unwrap();

        let config = Config::load(file.path()).unwrap();

        assert_eq!(config.design.alpha, 0.01);
        assert_eq!(config.design.power, 0.9);
        assert_eq!(config.design.min_detectable_effect_pct, 2.5);
        assert_eq!(config.hypothesis.alternative, Alternative::Greater);
        assert_eq!(config.bayesian.mode, PosteriorMode::Exact);
        assert_eq!(config.bayesian.draws, 4000);
        assert_eq!(config.bayesian.tune, 2000);
        assert_eq!(config.bayesian.seed, 7);
        assert_eq!(config.bayesian.decision_threshold, 0.9);
        assert_eq!(config.bayesian.min_effect_threshold, 0.5);
        assert_eq!(config.bayesian.hdi_prob, 0.9);
        assert_eq!(config.bayesian.continuous_prior.mean, 100.0);
        assert_eq!(config.bayesian.beta_prior.beta, 8.0);
        assert_eq!(config.cleaning.outlier_method, OutlierMethod::Zscore);
        assert_eq!(config.cleaning.zscore_threshold, 2.5);
    }

    #[test]
    fn test_load_nonexistent_file() {
        let result = Config::load(Path::new("/nonexistent/path/config.toml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_load_invalid_toml() {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(b"this is not valid toml {{{{").unwrap();

        let result = Config::load(file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_load_or_default_no_file() {
        let config = Config::load_or_default();
        assert!(config.is_ok());
    }

    #[test]
    fn test_to_options_round_trips_settings() {
        let mut config = Config::default();
        config.design.alpha = 0.01;
        config.bayesian.mode = PosteriorMode::Exact;
        config.bayesian.seed = 9;

        let options = config.to_options();
        assert_eq!(options.alpha, 0.01);
        assert_eq!(options.mode, PosteriorMode::Exact);
        assert_eq!(options.seed, 9);
        assert!(options.validate().is_ok());
    }

    #[test]
    fn test_config_serialization_roundtrip() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.design.alpha, parsed.design.alpha);
        assert_eq!(config.bayesian.draws, parsed.bayesian.draws);
        assert_eq!(config.cleaning.outlier_method, parsed.cleaning.outlier_method);
    }
}
