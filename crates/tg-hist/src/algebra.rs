//! Histogram algebra on [`Grid2D`].
//!
//! All operations act on central values only: results carry zero errors, since toy
//! generation never propagates template uncertainties.

use crate::grid::Grid2D;
use tg_core::{Error, Result};

fn ensure_compatible(op: &'static str, a: &Grid2D, b: &Grid2D) -> Result<()> {
    if a.is_compatible(b) {
        return Ok(());
    }
    Err(Error::IncompatibleGrids { op, left: a.describe(), right: b.describe() })
}

/// Sign-safe product `max(a, 0) * b`.
///
/// Negative contents of the numerator `a` are clamped to zero; `b` is used as is. Each bin
/// of `b` is located by the coordinate of the bin centre of `a`, not by index, so the two
/// grids only need matching bin counts. A centre outside `b`'s range reads zero.
pub fn multiply_clamped(a: &Grid2D, b: &Grid2D, name: impl Into<String>) -> Result<Grid2D> {
    ensure_compatible("multiply", a, b)?;
    log::debug!("multiplying {} x {}", a.describe(), b.describe());

    let mut out = a.zeros_like(name);
    let (xa, ya) = (a.x_axis(), a.y_axis());
    for (i, j, v) in a.bins() {
        let numerator = v.max(0.0);
        let factor = b.value_at(xa.bin_center(i), ya.bin_center(j));
        out.set(i, j, numerator * factor);
    }
    Ok(out)
}

/// Elementwise `a + b`.
pub fn add(a: &Grid2D, b: &Grid2D, name: impl Into<String>) -> Result<Grid2D> {
    combine("add", a, b, name, |x, y| x + y)
}

/// Elementwise `a - b`.
pub fn subtract(a: &Grid2D, b: &Grid2D, name: impl Into<String>) -> Result<Grid2D> {
    combine("subtract", a, b, name, |x, y| x - y)
}

fn combine(
    op: &'static str,
    a: &Grid2D,
    b: &Grid2D,
    name: impl Into<String>,
    f: impl Fn(f64, f64) -> f64,
) -> Result<Grid2D> {
    ensure_compatible(op, a, b)?;
    let mut out = a.zeros_like(name);
    for ((dst, &x), &y) in out.content_mut().iter_mut().zip(a.content()).zip(b.content()) {
        *dst = f(x, y);
    }
    Ok(out)
}

/// Sum of `template`-binned zeros plus every grid in `terms`.
///
/// With no terms this is the zero grid on `template`'s binning.
pub fn sum<'a>(
    template: &Grid2D,
    terms: impl IntoIterator<Item = &'a Grid2D>,
    name: impl Into<String>,
) -> Result<Grid2D> {
    let mut acc = template.zeros_like(name);
    for t in terms {
        ensure_compatible("add", &acc, t)?;
        for (dst, &v) in acc.content_mut().iter_mut().zip(t.content()) {
            *dst += v;
        }
    }
    Ok(acc)
}

/// Sum of all in-range bins.
pub fn integral(grid: &Grid2D) -> f64 {
    grid.content().iter().sum()
}

/// Copy of `grid` with every bin multiplied by `factor`.
pub fn scale(grid: &Grid2D, factor: f64, name: impl Into<String>) -> Grid2D {
    let mut out = grid.zeros_like(name);
    for (dst, &v) in out.content_mut().iter_mut().zip(grid.content()) {
        *dst = v * factor;
    }
    out
}

/// Copy of `grid` divided by its integral.
///
/// Fails with [`Error::DivideByZero`] when the integral is exactly zero.
pub fn normalize(grid: &Grid2D, name: impl Into<String>) -> Result<Grid2D> {
    let total = integral(grid);
    if total == 0.0 {
        return Err(Error::DivideByZero { name: grid.name().to_string() });
    }
    Ok(scale(grid, 1.0 / total, name))
}
