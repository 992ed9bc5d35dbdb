//! Transfer chain: propagates the data-driven estimate from the fail region through
//! successive transfer-function multiplications.

use tg_core::{Error, Result};
use tg_hist::{Grid2D, algebra};

use crate::catalog::RegionTemplates;

/// Ordered regions connected by `regions.len() - 1` transfer functions.
#[derive(Debug, Clone)]
pub struct TransferChain {
    regions: Vec<String>,
    transfers: Vec<Grid2D>,
}

impl TransferChain {
    /// Validate and build a chain.
    ///
    /// Fails with [`Error::ChainLengthMismatch`] unless `transfers.len() == regions.len() - 1`,
    /// then with [`Error::EmptyChain`] if there is no transfer at all.
    pub fn new(regions: Vec<String>, transfers: Vec<Grid2D>) -> Result<Self> {
        if regions.len() != transfers.len() + 1 {
            return Err(Error::ChainLengthMismatch {
                regions: regions.len(),
                transfers: transfers.len(),
            });
        }
        if transfers.is_empty() {
            return Err(Error::EmptyChain);
        }
        Ok(Self { regions, transfers })
    }

    /// Regions in chain order.
    pub fn regions(&self) -> &[String] {
        &self.regions
    }

    /// Transfer functions in chain order.
    pub fn transfers(&self) -> &[Grid2D] {
        &self.transfers
    }

    /// The first region, which seeds the chain.
    pub fn fail_region(&self) -> &str {
        &self.regions[0]
    }

    /// Data minus the sum of nominal backgrounds in the fail region.
    pub fn fail_residual(fail: &RegionTemplates) -> Result<Grid2D> {
        log::info!("determining data minus background estimate in {}", fail.region);
        let mut residual = fail.data.renamed(format!("{}_bkg_est", fail.region));
        for (process, bkg) in &fail.backgrounds {
            log::debug!("subtracting background {process} from data in {}", fail.region);
            residual = algebra::subtract(&residual, bkg, residual.name().to_string())?;
        }
        Ok(residual)
    }

    /// Propagate `seed` (the fail-region residual) through every transfer.
    ///
    /// Region `r_i` receives `multiply_clamped(estimate(r_{i-1}), transfers[i-1])`.
    pub fn propagate(&self, seed: Grid2D) -> Result<ChainEstimates> {
        let mut estimates: Vec<(String, Grid2D)> = Vec::with_capacity(self.regions.len());
        estimates.push((self.regions[0].clone(), seed));

        for (i, transfer) in self.transfers.iter().enumerate() {
            let previous_region = &self.regions[i];
            let region = &self.regions[i + 1];
            log::info!("performing transfer {} ({previous_region} -> {region})", i + 1);
            let previous = &estimates[i].1;
            let out_name = format!("{previous_region}_{}", transfer.name());
            let next = algebra::multiply_clamped(previous, transfer, out_name)?;
            estimates.push((region.clone(), next));
        }
        Ok(ChainEstimates { estimates })
    }
}

/// Data-driven estimate per chain region, in chain order; the first entry is the fail residual.
#[derive(Debug, Clone)]
pub struct ChainEstimates {
    estimates: Vec<(String, Grid2D)>,
}

impl ChainEstimates {
    /// Estimate for `region`.
    pub fn get(&self, region: &str) -> Option<&Grid2D> {
        self.estimates.iter().find(|(r, _)| r == region).map(|(_, g)| g)
    }

    /// The fail-region residual.
    pub fn fail(&self) -> &Grid2D {
        &self.estimates[0].1
    }

    /// `(region, estimate)` in chain order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Grid2D)> {
        self.estimates.iter().map(|(r, g)| (r.as_str(), g))
    }

    /// Number of regions covered.
    pub fn len(&self) -> usize {
        self.estimates.len()
    }

    /// Always false for a propagated chain.
    pub fn is_empty(&self) -> bool {
        self.estimates.is_empty()
    }
}
