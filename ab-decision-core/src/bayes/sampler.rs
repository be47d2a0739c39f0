//! Posterior samplers for the Bayesian comparison.
//!
//! Two backends share a trait: [`McmcSampler`] draws from the exact
//! posterior (random-walk Metropolis for continuous metrics, conjugate Beta
//! draws for binary ones) and [`AnalyticSampler`] approximates each group
//! posterior with a normal distribution centered on the sample estimate.
//! Both are fully deterministic for a fixed seed.

use rand::{Rng, SeedableRng};
use rand_distr::{Beta, Distribution, Normal};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

/// Which posterior backend produced a set of draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PosteriorMode {
    Exact,
    Approximate,
}

impl std::fmt::Display for PosteriorMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PosteriorMode::Exact => write!(f, "exact"),
            PosteriorMode::Approximate => write!(f, "approximate"),
        }
    }
}

/// Posterior draws for both groups plus the elementwise difference
/// (variant minus control).
#[derive(Debug, Clone)]
pub struct PosteriorDraws {
    pub control: Vec<f64>,
    pub variant: Vec<f64>,
    pub diff: Vec<f64>,
}

impl PosteriorDraws {
    fn from_groups(control: Vec<f64>, variant: Vec<f64>) -> Self {
        let diff = control
            .iter()
            .zip(variant.iter())
            .map(|(&c, &v)| v - c)
            .collect();
        PosteriorDraws {
            control,
            variant,
            diff,
        }
    }
}

/// Prior for a continuous group mean: Normal(mean, std) on the location and
/// Half-Normal(sigma_scale) on the group standard deviation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ContinuousPrior {
    pub mean: f64,
    pub std: f64,
    pub sigma_scale: f64,
}

impl Default for ContinuousPrior {
    fn default() -> Self {
        ContinuousPrior {
            mean: 0.0,
            std: 100.0,
            sigma_scale: 100.0,
        }
    }
}

/// Beta prior for a conversion rate. Beta(1, 1) is the flat default.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BetaPrior {
    pub alpha: f64,
    pub beta: f64,
}

impl Default for BetaPrior {
    fn default() -> Self {
        BetaPrior {
            alpha: 1.0,
            beta: 1.0,
        }
    }
}

/// Conversion counts for one group of a binary metric.
#[derive(Debug, Clone, Copy)]
pub struct BinaryCounts {
    pub conversions: u64,
    pub total: u64,
}

impl BinaryCounts {
    fn validate(&self) -> Result<(), AnalysisError> {
        if self.total == 0 {
            return Err(AnalysisError::InvalidInput(
                "binary group has no observations".to_string(),
            ));
        }
        if self.conversions > self.total {
            return Err(AnalysisError::InvalidInput(format!(
                "conversions ({}) exceed group size ({})",
                self.conversions, self.total
            )));
        }
        Ok(())
    }

    fn rate(&self) -> f64 {
        self.conversions as f64 / self.total as f64
    }
}

/// A backend that produces posterior draws for the two groups.
pub trait PosteriorSampler: Send + Sync {
    fn mode(&self) -> PosteriorMode;

    fn sample_continuous(
        &self,
        control: &[f64],
        variant: &[f64],
        prior: &ContinuousPrior,
    ) -> Result<PosteriorDraws, AnalysisError>;

    fn sample_binary(
        &self,
        control: BinaryCounts,
        variant: BinaryCounts,
        prior: &BetaPrior,
    ) -> Result<PosteriorDraws, AnalysisError>;
}

fn validate_continuous_prior(prior: &ContinuousPrior) -> Result<(), AnalysisError> {
    if prior.std <= 0.0 || prior.sigma_scale <= 0.0 {
        return Err(AnalysisError::InvalidInput(
            "continuous prior scales must be positive".to_string(),
        ));
    }
    Ok(())
}

fn validate_beta_prior(prior: &BetaPrior) -> Result<(), AnalysisError> {
    if prior.alpha <= 0.0 || prior.beta <= 0.0 {
        return Err(AnalysisError::InvalidInput(
            "Beta prior parameters must be positive".to_string(),
        ));
    }
    Ok(())
}

fn validate_group(data: &[f64], label: &str) -> Result<(), AnalysisError> {
    if data.len() < 2 {
        return Err(AnalysisError::InvalidInput(format!(
            "{label} group needs at least 2 observations for posterior sampling"
        )));
    }
    Ok(())
}

/// Sufficient statistics for the continuous likelihood.
struct GroupStats {
    n: f64,
    mean: f64,
    // Sum of squared deviations from the sample mean.
    ss: f64,
}

impl GroupStats {
    fn from_data(data: &[f64]) -> Self {
        let n = data.len() as f64;
        let mean = data.iter().sum::<f64>() / n;
        let ss = data.iter().map(|&x| (x - mean).powi(2)).sum();
        GroupStats { n, mean, ss }
    }

    fn sd(&self) -> f64 {
        if self.n > 1.0 {
            (self.ss / (self.n - 1.0)).sqrt()
        } else {
            0.0
        }
    }
}

/// Exact posterior sampler: Metropolis for continuous metrics, conjugate
/// Beta draws for binary ones.
#[derive(Debug, Clone)]
pub struct McmcSampler {
    pub draws: usize,
    pub tune: usize,
    pub seed: u64,
}

impl McmcSampler {
    pub fn new(draws: usize, tune: usize, seed: u64) -> Self {
        McmcSampler { draws, tune, seed }
    }

    /// Random-walk Metropolis over (mu, ln sigma) for one group, driven by
    /// sufficient statistics. Returns `draws` retained mu samples.
    fn metropolis_group(
        &self,
        stats: &GroupStats,
        prior: &ContinuousPrior,
        rng: &mut Xoshiro256PlusPlus,
    ) -> Result<Vec<f64>, AnalysisError> {
        let log_post = |mu: f64, log_sigma: f64| -> f64 {
            let sigma = log_sigma.exp();
            // Gaussian likelihood in sufficient-statistic form.
            let ll = -stats.n * log_sigma
                - (stats.ss + stats.n * (stats.mean - mu).powi(2)) / (2.0 * sigma * sigma);
            let lp_mu = -((mu - prior.mean) / prior.std).powi(2) / 2.0;
            // Half-Normal on sigma plus the ln-sigma Jacobian.
            let lp_sigma = -(sigma / prior.sigma_scale).powi(2) / 2.0 + log_sigma;
            ll + lp_mu + lp_sigma
        };

        let data_sd = stats.sd().max(1e-12);
        let mu_step = 2.4 * data_sd / stats.n.sqrt();
        let ls_step = 1.0 / stats.n.sqrt().max(1.0);

        let mu_proposal = Normal::new(0.0, mu_step).map_err(|_| {
            AnalysisError::DegenerateStatistic("invalid Metropolis step size".to_string())
        })?;
        let ls_proposal = Normal::new(0.0, ls_step).map_err(|_| {
            AnalysisError::DegenerateStatistic("invalid Metropolis step size".to_string())
        })?;

        let mut mu = stats.mean;
        let mut log_sigma = data_sd.ln();
        let mut current_lp = log_post(mu, log_sigma);
        let mut retained = Vec::with_capacity(self.draws);

        for step in 0..(self.tune + self.draws) {
            let mu_prop = mu + mu_proposal.sample(rng);
            let ls_prop = log_sigma + ls_proposal.sample(rng);
            let prop_lp = log_post(mu_prop, ls_prop);
            // Accept with probability min(1, exp(delta)).
            let u: f64 = rng.random();
            if (prop_lp - current_lp) >= u.ln() {
                mu = mu_prop;
                log_sigma = ls_prop;
                current_lp = prop_lp;
            }
            if step >= self.tune {
                retained.push(mu);
            }
        }
        Ok(retained)
    }
}

impl PosteriorSampler for McmcSampler {
    fn mode(&self) -> PosteriorMode {
        PosteriorMode::Exact
    }

    fn sample_continuous(
        &self,
        control: &[f64],
        variant: &[f64],
        prior: &ContinuousPrior,
    ) -> Result<PosteriorDraws, AnalysisError> {
        validate_group(control, "control")?;
        validate_group(variant, "variant")?;
        validate_continuous_prior(prior)?;

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.seed);
        let control_draws =
            self.metropolis_group(&GroupStats::from_data(control), prior, &mut rng)?;
        let variant_draws =
            self.metropolis_group(&GroupStats::from_data(variant), prior, &mut rng)?;
        Ok(PosteriorDraws::from_groups(control_draws, variant_draws))
    }

    fn sample_binary(
        &self,
        control: BinaryCounts,
        variant: BinaryCounts,
        prior: &BetaPrior,
    ) -> Result<PosteriorDraws, AnalysisError> {
        control.validate()?;
        variant.validate()?;
        validate_beta_prior(prior)?;

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.seed);
        let mut draw_group = |counts: BinaryCounts| -> Result<Vec<f64>, AnalysisError> {
            let alpha = prior.alpha + counts.conversions as f64;
            let beta = prior.beta + (counts.total - counts.conversions) as f64;
            let dist = Beta::new(alpha, beta).map_err(|_| {
                AnalysisError::DegenerateStatistic(format!(
                    "invalid Beta posterior parameters ({alpha}, {beta})"
                ))
            })?;
            Ok((0..self.draws).map(|_| dist.sample(&mut rng)).collect())
        };

        let control_draws = draw_group(control)?;
        let variant_draws = draw_group(variant)?;
        Ok(PosteriorDraws::from_groups(control_draws, variant_draws))
    }
}

/// Normal-approximation sampler: each group posterior is Normal around the
/// sample estimate with its standard error.
#[derive(Debug, Clone)]
pub struct AnalyticSampler {
    pub draws: usize,
    pub seed: u64,
}

impl AnalyticSampler {
    pub fn new(draws: usize, seed: u64) -> Self {
        AnalyticSampler { draws, seed }
    }

    fn normal_draws(
        &self,
        mean: f64,
        se: f64,
        rng: &mut Xoshiro256PlusPlus,
    ) -> Result<Vec<f64>, AnalysisError> {
        let dist = Normal::new(mean, se.max(1e-12)).map_err(|_| {
            AnalysisError::DegenerateStatistic(format!(
                "invalid normal posterior parameters ({mean}, {se})"
            ))
        })?;
        Ok((0..self.draws).map(|_| dist.sample(rng)).collect())
    }
}

impl PosteriorSampler for AnalyticSampler {
    fn mode(&self) -> PosteriorMode {
        PosteriorMode::Approximate
    }

    fn sample_continuous(
        &self,
        control: &[f64],
        variant: &[f64],
        _prior: &ContinuousPrior,
    ) -> Result<PosteriorDraws, AnalysisError> {
        validate_group(control, "control")?;
        validate_group(variant, "variant")?;

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.seed);
        let c = GroupStats::from_data(control);
        let v = GroupStats::from_data(variant);
        let control_draws = self.normal_draws(c.mean, c.sd() / c.n.sqrt(), &mut rng)?;
        let variant_draws = self.normal_draws(v.mean, v.sd() / v.n.sqrt(), &mut rng)?;
        Ok(PosteriorDraws::from_groups(control_draws, variant_draws))
    }

    fn sample_binary(
        &self,
        control: BinaryCounts,
        variant: BinaryCounts,
        _prior: &BetaPrior,
    ) -> Result<PosteriorDraws, AnalysisError> {
        control.validate()?;
        variant.validate()?;

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.seed);
        let mut draw_group = |counts: BinaryCounts| -> Result<Vec<f64>, AnalysisError> {
            let p = counts.rate();
            let se = (p * (1.0 - p) / counts.total as f64).sqrt();
            let draws = self.normal_draws(p, se, &mut rng)?;
            // Rates live in [0, 1]; the normal tails are clipped.
            Ok(draws.into_iter().map(|d| d.clamp(0.0, 1.0)).collect())
        };

        let control_draws = draw_group(control)?;
        let variant_draws = draw_group(variant)?;
        Ok(PosteriorDraws::from_groups(control_draws, variant_draws))
    }
}
