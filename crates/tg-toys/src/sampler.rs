//! Inverse-CDF sampling of toy histograms from an Asimov distribution.
//!
//! Each region moves through `Asimov -> Pdf -> Cdf -> toy`. The stages are distinct types
//! so a grid is never in two computed states at once.

use rand::Rng;
use tg_core::{Error, Result};
use tg_hist::{Grid2D, algebra, unflatten};

/// Allowed excess of the final cumulative value over 1.
pub const CDF_TOLERANCE: f64 = 1e-6;

/// Asimov distribution normalized to unit integral over the grid.
#[derive(Debug, Clone)]
pub struct Pdf {
    grid: Grid2D,
}

impl Pdf {
    /// Normalize `asimov`.
    ///
    /// Fails with [`Error::DivideByZero`] if its integral is exactly zero and with
    /// [`Error::NegativeIntegral`] if it is negative.
    pub fn from_asimov(asimov: &Grid2D) -> Result<Self> {
        let total = algebra::integral(asimov);
        if total < 0.0 {
            return Err(Error::NegativeIntegral { name: asimov.name().to_string(), integral: total });
        }
        let grid = algebra::normalize(asimov, format!("pdf_{}", asimov.name()))?;
        Ok(Self { grid })
    }

    /// The normalized grid.
    pub fn grid(&self) -> &Grid2D {
        &self.grid
    }

    /// Probability of each cell in canonical order.
    pub fn probabilities(&self) -> &[f64] {
        self.grid.content()
    }

    /// Running prefix sum over the canonical order `k = (i-1)*ny + (j-1) + 1`.
    ///
    /// Every step must be non-negative ([`Error::NegativeProbability`]) and the final value
    /// may not exceed `1 + CDF_TOLERANCE` ([`Error::CdfOverflow`]).
    pub fn cdf(&self) -> Result<Cdf> {
        let mut values = Vec::with_capacity(self.grid.n_cells());
        let mut acc = 0.0;
        for (idx, &p) in self.probabilities().iter().enumerate() {
            if p < 0.0 || p.is_nan() {
                return Err(Error::NegativeProbability {
                    name: self.grid.name().to_string(),
                    bin: idx + 1,
                    value: p,
                });
            }
            acc += p;
            values.push(acc);
        }
        let max = values.last().copied().unwrap_or(0.0);
        if max > 1.0 + CDF_TOLERANCE {
            return Err(Error::CdfOverflow { name: self.grid.name().to_string(), max });
        }
        Ok(Cdf { name: format!("cdf_{}", self.grid.name()), ny: self.grid.ny(), values, max })
    }
}

/// Cumulative step function over the flattened bin index.
///
/// Non-decreasing by construction, with values in `[0, 1 + CDF_TOLERANCE]`.
#[derive(Debug, Clone)]
pub struct Cdf {
    name: String,
    ny: usize,
    values: Vec<f64>,
    max: f64,
}

impl Cdf {
    /// Name of the distribution.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Cumulative values; `values()[k-1]` is the CDF at flattened index `k`.
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Final (and largest) cumulative value.
    pub fn max(&self) -> f64 {
        self.max
    }

    /// Smallest 1-based `k` with `cdf[k] > u`.
    pub fn intersection(&self, u: f64) -> Result<usize> {
        let idx = self.values.partition_point(|&v| v <= u);
        if idx < self.values.len() {
            Ok(idx + 1)
        } else {
            Err(Error::NoIntersection { name: self.name.clone(), u, max: self.max })
        }
    }

/// Bin `(i, j)` of flattened index `k`.
    pub fn bin(&self, k: usize) -> (usize, usize) {
        unflatten(k, self.ny)
    }
}

/// Draw `n_events` from `cdf` and fill an integer-count toy on `pdf`'s binning.
///
/// Each draw takes `u` uniform in `[0, cdf.max())`, locates the first cumulative step above
/// it and adds one count to that bin, so the toy integrates to exactly `n_events`.
pub fn sample<R: Rng + ?Sized>(
    pdf: &Pdf,
    cdf: &Cdf,
    n_events: u64,
    name: impl Into<String>,
    rng: &mut R,
) -> Result<Grid2D> {
    if cdf.values.len() != pdf.grid.n_cells() || cdf.ny != pdf.grid.ny() {
        return Err(Error::IncompatibleGrids {
            op: "sample",
            left: pdf.grid.describe(),
            right: format!("{}[{} cells]", cdf.name, cdf.values.len()),
        });
    }
    let mut toy = pdf.grid.zeros_like(name);
    for _ in 0..n_events {
        let u = rng.random::<f64>() * cdf.max;
        let k = cdf.intersection(u)?;
        let (i, j) = cdf.bin(k);
        toy.fill(i, j, 1.0);
    }
    log::debug!("sampled {n_events} events into {}", toy.describe());
    Ok(toy)
}
