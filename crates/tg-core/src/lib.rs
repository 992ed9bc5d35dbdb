//! # tg-core
//!
//! Shared foundation for toygen: the error taxonomy and the vocabulary
//! (process kinds, variations, fit kinds) used by the histogram and toy crates.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{FitKind, NOMINAL, ProcessKind};

/// Crate version, reported by `toygen version`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
