//! # tg-toys
//!
//! Pseudo-data generation for transfer-function ("ABCD") background estimates.
//!
//! The pipeline, leaves first:
//!
//! 1. [`catalog`]: resolve requested regions to data and nominal background templates
//!    through the [`ledger`].
//! 2. [`chain`]: seed with the fail-region data-minus-background residual and multiply
//!    through the ordered transfer functions.
//! 3. [`asimov`]: add nominal MC to each transferred estimate.
//! 4. [`sampler`]: normalize, accumulate, and draw toys by inverse-CDF sampling.
//!
//! [`pseudo::PseudoDataGenerator`] runs all four for a set of regions.
//!
//! ## Example
//!
//! ```no_run
//! use tg_hist::{JsonHistogramStore, read_histogram_file};
//! use tg_toys::{PseudoDataConfig, PseudoDataGenerator, read_ledger};
//!
//! let ledger = read_ledger("ledger.json".as_ref()).unwrap();
//! let rpfs = read_histogram_file("rpf.json".as_ref()).unwrap();
//! let transfers = vec![rpfs.get("b_2x1").unwrap().clone()];
//!
//! let generator = PseudoDataGenerator::new(PseudoDataConfig::new(["SR_fail", "SR_pass"]));
//! let report = generator.generate(&ledger, &JsonHistogramStore::new("."), transfers).unwrap();
//! for toy in &report.toys {
//!     println!("{}: {} events", toy.region, toy.n_events);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod asimov;
pub mod catalog;
pub mod chain;
pub mod ledger;
pub mod pseudo;
pub mod sampler;

pub use asimov::{EstimateKind, RegionEstimate, RegionRole, build_asimov};
pub use catalog::{RegionCatalog, RegionEntry, RegionTemplates};
pub use chain::{ChainEstimates, TransferChain};
pub use ledger::{Ledger, LedgerFilter, LedgerRow, NameSubstitution, filter_ledger, read_ledger};
pub use pseudo::{
    PseudoDataConfig, PseudoDataGenerator, PseudoDataReport, RegionFailure, RegionToy,
};
pub use sampler::{CDF_TOLERANCE, Cdf, Pdf, sample};
