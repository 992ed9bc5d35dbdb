//! Pseudo-data generation across a region chain.
//!
//! Configuration errors abort before any histogram is loaded. Once the Asimov
//! distributions exist, regions are sampled independently (and in parallel): a failing
//! region is reported next to the toys of the others.

use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::{Distribution, Poisson};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tg_core::{Error, Result};
use tg_hist::{Grid2D, HistogramLoader, algebra};

use crate::asimov::{RegionEstimate, RegionRole, build_asimov};
use crate::catalog::RegionCatalog;
use crate::chain::TransferChain;
use crate::ledger::{Ledger, NameSubstitution};
use crate::sampler::{self, Pdf};

/// Options of one generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PseudoDataConfig {
    /// Regions in chain order; the first is the fail region.
    pub regions: Vec<String>,
    /// Find/replace applied to the ledger before selection.
    #[serde(default)]
    pub substitutions: NameSubstitution,
    /// Do not produce a toy for the fail region.
    #[serde(default)]
    pub blind_fail: bool,
    /// Draw each region's event count from Poisson(observed) instead of using it directly.
    #[serde(default)]
    pub poisson: bool,
    /// Base seed; region `r` uses `seed + r`.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_seed() -> u64 {
    42
}

impl PseudoDataConfig {
    /// Config for `regions` with defaults for everything else.
    pub fn new<I, S>(regions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            regions: regions.into_iter().map(Into::into).collect(),
            substitutions: NameSubstitution::none(),
            blind_fail: false,
            poisson: false,
            seed: default_seed(),
        }
    }
}

/// One generated toy.
#[derive(Debug, Clone)]
pub struct RegionToy {
    /// Region name.
    pub region: String,
    /// Integer-count toy histogram, named after the region.
    pub toy: Grid2D,
    /// Number of sampled events.
    pub n_events: u64,
    /// Observed data integral in the region.
    pub observed: f64,
    /// Integral of the Asimov distribution the toy was drawn from.
    pub asimov_integral: f64,
}

/// A region whose toy could not be produced.
#[derive(Debug)]
pub struct RegionFailure {
    /// Region name.
    pub region: String,
    /// Cause.
    pub error: Error,
}

/// Result of a generation request.
#[derive(Debug)]
pub struct PseudoDataReport {
    /// Successful toys, in chain order.
    pub toys: Vec<RegionToy>,
    /// Failed regions, in chain order.
    pub failures: Vec<RegionFailure>,
    /// Per-region estimates the toys were drawn from.
    pub estimates: Vec<RegionEstimate>,
}

impl PseudoDataReport {
    /// True if every requested toy was produced.
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Toy histograms, ready to be written out.
    pub fn toy_grids(&self) -> Vec<Grid2D> {
        self.toys.iter().map(|t| t.toy.clone()).collect()
    }
}

/// Generates pseudo-data from postfit transfer functions.
#[derive(Debug, Clone)]
pub struct PseudoDataGenerator {
    config: PseudoDataConfig,
}

impl PseudoDataGenerator {
    /// Generator for `config`.
    pub fn new(config: PseudoDataConfig) -> Self {
        Self { config }
    }

    /// The configuration.
    pub fn config(&self) -> &PseudoDataConfig {
        &self.config
    }

    /// Build the chain, resolve and load templates, construct the Asimov per region and
    /// sample one toy per (non-blinded) region.
    pub fn generate(
        &self,
        ledger: &Ledger,
        loader: &dyn HistogramLoader,
        transfers: Vec<Grid2D>,
    ) -> Result<PseudoDataReport> {
        let cfg = &self.config;
        let chain = TransferChain::new(cfg.regions.clone(), transfers)?;
        let catalog = RegionCatalog::resolve(ledger, chain.regions(), &cfg.substitutions)?;
        let templates = catalog.load(loader)?;

        let seed = TransferChain::fail_residual(&templates[0])?;
        let estimates = chain.propagate(seed)?;
        let estimates = build_asimov(&templates, &estimates)?;

        let results: Vec<(usize, Result<RegionToy>)> = estimates
            .par_iter()
            .enumerate()
            .filter(|(_, e)| !(cfg.blind_fail && e.role == RegionRole::Fail))
            .map(|(idx, e)| {
                let mut rng = StdRng::seed_from_u64(cfg.seed.wrapping_add(idx as u64));
                (idx, self.sample_region(e, &mut rng))
            })
            .collect();

        let mut toys = Vec::new();
        let mut failures = Vec::new();
        for (idx, res) in results {
            match res {
                Ok(toy) => toys.push(toy),
                Err(error) => {
                    let region = estimates[idx].region.clone();
                    log::warn!("toy generation failed in {region}: {error}");
                    failures.push(RegionFailure { region, error });
                }
            }
        }
        if cfg.blind_fail {
            log::info!("fail region {} is blinded; no toy produced", chain.fail_region());
        }
        Ok(PseudoDataReport { toys, failures, estimates })
    }

    fn sample_region(&self, estimate: &RegionEstimate, rng: &mut StdRng) -> Result<RegionToy> {
        let asimov = estimate.asimov();
        let pdf = Pdf::from_asimov(asimov)?;
        let cdf = pdf.cdf()?;
        let n_events = target_events(estimate.observed, self.config.poisson, rng)?;
        log::info!(
            "generating {n_events} events in {} (observed {:.1}, asimov {:.3})",
            estimate.region,
            estimate.observed,
            algebra::integral(asimov)
        );
        let toy = sampler::sample(&pdf, &cdf, n_events, estimate.region.clone(), rng)?;
        Ok(RegionToy {
            region: estimate.region.clone(),
            toy,
            n_events,
            observed: estimate.observed,
            asimov_integral: algebra::integral(asimov),
        })
    }
}

/// Event count for a region: the observed integral rounded to the nearest integer, or a
/// Poisson draw around it.
pub fn target_events(observed: f64, poisson: bool, rng: &mut StdRng) -> Result<u64> {
    if !observed.is_finite() || observed < 0.0 {
        return Err(Error::Validation(format!(
            "observed event count must be finite and >= 0, got {observed}"
        )));
    }
    if !poisson {
        return Ok(observed.round() as u64);
    }
    if observed == 0.0 {
        return Ok(0);
    }
    let pois = Poisson::new(observed)
        .map_err(|e| Error::Validation(format!("Poisson({observed}): {e}")))?;
    Ok(pois.sample(rng) as u64)
}
