//! # tg-hist
//!
//! Two-dimensional binned grids for toygen.
//!
//! - [`grid`]: [`Axis`] and [`Grid2D`] with 1-based bin addressing and canonical
//!   X-major flattening
//! - [`algebra`]: sign-safe multiply, add/subtract, integral and normalization
//! - [`io`]: JSON histogram files and the [`HistogramLoader`] seam
//! - [`transfer`]: parametric transfer-function shapes

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algebra;
pub mod grid;
pub mod io;
pub mod transfer;

pub use grid::{Axis, Grid2D, flatten, unflatten};
pub use io::{
    HistogramFile, HistogramLoader, InMemoryLoader, JsonHistogramStore, read_histogram_file,
    write_histogram_file,
};
pub use transfer::PolynomialForm;
