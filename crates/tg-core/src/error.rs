//! Error types for toygen

use thiserror::Error;

/// toygen error type
///
/// Configuration errors (`ChainLengthMismatch`, `EmptyChain`, `RegionNotFound`,
/// `AmbiguousData`) are raised before any histogram arithmetic. Numerical errors
/// (`DivideByZero`, `NegativeIntegral`, `NegativeProbability`, `CdfOverflow`,
/// `NoIntersection`) and `IncompatibleGrids` abort the computation they occur in. None of
/// them are retried.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Region and transfer-function counts do not form a chain.
    #[error(
        "chain length mismatch: {regions} regions need exactly {} transfer functions, got {transfers}",
        .regions.saturating_sub(1)
    )]
    ChainLengthMismatch {
        /// Number of regions supplied.
        regions: usize,
        /// Number of transfer functions supplied.
        transfers: usize,
    },

    /// A chain without any transfer function.
    #[error("transfer chain is empty: at least one transfer function is required")]
    EmptyChain,

    /// A requested region could not be matched to its histograms.
    #[error(
        "region '{region}' not found in histogram '{histogram}' (file '{file}'); \
         supply a name substitution map to generate toys for regions that were not fitted"
    )]
    RegionNotFound {
        /// Requested region.
        region: String,
        /// Offending source histogram name (empty if the region has no ledger rows).
        histogram: String,
        /// Offending source file name (empty if the region has no ledger rows).
        file: String,
    },

    /// A region does not resolve to exactly one data histogram.
    #[error("region '{region}' must have exactly one data histogram, found {found}")]
    AmbiguousData {
        /// Region name.
        region: String,
        /// Number of data rows found.
        found: usize,
    },

    /// Normalization of a grid whose integral is exactly zero.
    #[error("cannot normalize '{name}': integral is zero")]
    DivideByZero {
        /// Name of the grid.
        name: String,
    },

    /// An Asimov distribution whose total yield is negative cannot be normalized into a pdf.
    #[error("cannot build a pdf from '{name}': integral is {integral}")]
    NegativeIntegral {
        /// Name of the grid.
        name: String,
        /// Its integral.
        integral: f64,
    },

    /// A probability distribution with a negative cell, i.e. a decreasing CDF step.
    #[error("distribution '{name}' has negative probability {value} at flattened bin {bin}")]
    NegativeProbability {
        /// Name of the distribution.
        name: String,
        /// 1-based flattened bin index.
        bin: usize,
        /// Probability of that bin.
        value: f64,
    },

    /// Cumulative distribution exceeds unity beyond tolerance.
    #[error("cumulative distribution of '{name}' exceeds 1 (max = {max})")]
    CdfOverflow {
        /// Name of the distribution.
        name: String,
        /// Final cumulative value.
        max: f64,
    },

    /// Inverse-CDF lookup found no bin above the drawn value.
    #[error("no CDF intersection for '{name}': u = {u}, max = {max}")]
    NoIntersection {
        /// Name of the distribution.
        name: String,
        /// Drawn uniform value.
        u: f64,
        /// Final cumulative value.
        max: f64,
    },

    /// Binning mismatch between two operands.
    #[error("incompatible grids in {op}: '{left}' vs '{right}'")]
    IncompatibleGrids {
        /// Operation name.
        op: &'static str,
        /// Left operand description (name and bin counts).
        left: String,
        /// Right operand description (name and bin counts).
        right: String,
    },
}

impl Error {
    /// True for errors detected before any histogram arithmetic.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::ChainLengthMismatch { .. }
                | Error::EmptyChain
                | Error::RegionNotFound { .. }
                | Error::AmbiguousData { .. }
        )
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
