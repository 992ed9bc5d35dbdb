//! Asimov construction: per region, nominal MC background plus the data-driven estimate.

use tg_core::{Error, Result};
use tg_hist::{Grid2D, algebra};

use crate::catalog::RegionTemplates;
use crate::chain::ChainEstimates;

/// Position of a region in the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionRole {
    /// First region: its data-minus-background residual seeds the chain.
    Fail,
    /// Reached through `n`-th transfer (1-based).
    Transferred(usize),
}

/// Component of a [`RegionEstimate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EstimateKind {
    /// Summed nominal MC background.
    Background,
    /// Transfer-chain estimate (the residual itself for the fail region).
    DataDriven,
    /// Total expected background used as the toy shape.
    Asimov,
}

/// Per-region estimates.
#[derive(Debug, Clone)]
pub struct RegionEstimate {
    /// Region name.
    pub region: String,
    /// Chain position.
    pub role: RegionRole,
    /// Observed data integral, the toy's target normalization.
    pub observed: f64,
    background: Grid2D,
    data_driven: Grid2D,
    asimov: Grid2D,
}

impl RegionEstimate {
    /// The requested component.
    pub fn get(&self, kind: EstimateKind) -> &Grid2D {
        match kind {
            EstimateKind::Background => &self.background,
            EstimateKind::DataDriven => &self.data_driven,
            EstimateKind::Asimov => &self.asimov,
        }
    }

    /// Shorthand for `get(EstimateKind::Asimov)`.
    pub fn asimov(&self) -> &Grid2D {
        &self.asimov
    }
}

/// Combine templates and chain estimates into one [`RegionEstimate`] per region.
///
/// `templates` must list the chain regions in chain order. The fail region's Asimov is the
/// residual alone: it already is data minus nominal MC, so adding MC again would double count.
/// Every other region gets `total nominal MC + transferred estimate`.
pub fn build_asimov(templates: &[RegionTemplates], chain: &ChainEstimates) -> Result<Vec<RegionEstimate>> {
    if templates.len() != chain.len() {
        return Err(Error::Validation(format!(
            "asimov needs templates for all {} chain regions, got {}",
            chain.len(),
            templates.len()
        )));
    }

    let mut out = Vec::with_capacity(templates.len());
    for (idx, (t, (region, data_driven))) in templates.iter().zip(chain.iter()).enumerate() {
        if t.region != region {
            return Err(Error::Validation(format!(
                "template order mismatch at position {idx}: expected region '{region}', got '{}'",
                t.region
            )));
        }
        log::info!("determining total MC background in {region}");
        let background = t.total_background()?;
        let (role, asimov) = if idx == 0 {
            (RegionRole::Fail, data_driven.renamed(format!("asimov_{region}")))
        } else {
            let asimov = algebra::add(&background, data_driven, format!("asimov_{region}"))?;
            (RegionRole::Transferred(idx), asimov)
        };
        out.push(RegionEstimate {
            region: region.to_string(),
            role,
            observed: t.observed(),
            background,
            data_driven: data_driven.clone(),
            asimov,
        });
    }
    Ok(out)
}
