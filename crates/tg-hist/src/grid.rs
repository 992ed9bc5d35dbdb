//! Binned axes and the dense 2D grid type.
//!
//! Bins are addressed ROOT-style with 1-based indices `(i, j)`, `1..=nx` × `1..=ny`.
//! Only in-range bins are stored; under/overflow is not tracked anywhere in the pipeline.
//! Contents are kept flat in canonical X-major / Y-minor order, so the flat position of
//! `(i, j)` is `(i - 1) * ny + (j - 1)`.

use serde::{Deserialize, Serialize};
use tg_core::{Error, Result};

/// Canonical 1-based flattened index `k = (i-1)*ny + (j-1) + 1` of bin `(i, j)`.
#[inline]
pub fn flatten(i: usize, j: usize, ny: usize) -> usize {
    (i - 1) * ny + (j - 1) + 1
}

/// Inverse of [`flatten`]: `i = (k-1)/ny + 1`, `j = (k-1) % ny + 1`.
#[inline]
pub fn unflatten(k: usize, ny: usize) -> (usize, usize) {
    let g = k - 1;
    (g / ny + 1, g % ny + 1)
}

/// One binned axis described by its edges.
#[derive(Debug, Clone, PartialEq)]
pub struct Axis {
    edges: Vec<f64>,
}

impl Axis {
    /// Axis from explicit edges (finite, strictly increasing, at least 2).
    pub fn new(edges: Vec<f64>) -> Result<Self> {
        if edges.len() < 2 {
            return Err(Error::Validation(format!(
                "axis requires at least 2 bin edges, got {}",
                edges.len()
            )));
        }
        for (k, e) in edges.iter().enumerate() {
            if !e.is_finite() {
                return Err(Error::Validation(format!("axis edge[{k}] must be finite, got {e}")));
            }
            if k > 0 && edges[k - 1] >= *e {
                return Err(Error::Validation(format!(
                    "axis edges must be strictly increasing, got edges[{}]={} and edges[{k}]={e}",
                    k - 1,
                    edges[k - 1]
                )));
            }
        }
        Ok(Self { edges })
    }

    /// `n` equal-width bins on `[lo, hi)`.
    pub fn uniform(n: usize, lo: f64, hi: f64) -> Result<Self> {
        if n == 0 {
            return Err(Error::Validation("axis requires at least one bin".into()));
        }
        let w = (hi - lo) / n as f64;
        Self::new((0..=n).map(|k| lo + w * k as f64).collect())
    }

    /// Number of in-range bins.
    #[inline]
    pub fn n_bins(&self) -> usize {
        self.edges.len() - 1
    }

    /// Bin edges (length `n_bins + 1`).
    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    /// Lower edge of the first bin.
    pub fn lo(&self) -> f64 {
        self.edges[0]
    }

    /// Upper edge of the last bin.
    pub fn hi(&self) -> f64 {
        self.edges[self.edges.len() - 1]
    }

    /// Centre of 1-based bin `i`.
    pub fn bin_center(&self, i: usize) -> f64 {
        0.5 * (self.edges[i - 1] + self.edges[i])
    }

    /// 1-based bin containing `x`: `0` below range, `n_bins + 1` at or above the upper edge.
    pub fn find_bin(&self, x: f64) -> usize {
        if x < self.lo() {
            return 0;
        }
        if x >= self.hi() {
            return self.n_bins() + 1;
        }
        // Number of edges <= x is the 1-based bin index.
        self.edges.partition_point(|e| *e <= x)
    }
}

/// A named, dense 2D binned grid of central values with asymmetric errors.
///
/// Value-like: `clone` yields an independent copy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Grid2DRepr", into = "Grid2DRepr")]
pub struct Grid2D {
    name: String,
    x: Axis,
    y: Axis,
    content: Vec<f64>,
    errors_up: Vec<f64>,
    errors_down: Vec<f64>,
}

impl Grid2D {
    /// All-zero grid on the given axes.
    pub fn zeros(name: impl Into<String>, x: Axis, y: Axis) -> Self {
        let n = x.n_bins() * y.n_bins();
        Self {
            name: name.into(),
            x,
            y,
            content: vec![0.0; n],
            errors_up: vec![0.0; n],
            errors_down: vec![0.0; n],
        }
    }

    /// Grid from flat contents in canonical X-major / Y-minor order. Errors start at zero.
    pub fn from_content(
        name: impl Into<String>,
        x: Axis,
        y: Axis,
        content: Vec<f64>,
    ) -> Result<Self> {
        let name = name.into();
        let n = x.n_bins() * y.n_bins();
        if content.len() != n {
            return Err(Error::Validation(format!(
                "grid '{name}' content length mismatch: expected {n} ({}x{}), got {}",
                x.n_bins(),
                y.n_bins(),
                content.len()
            )));
        }
        Ok(Self { name, x, y, content, errors_up: vec![0.0; n], errors_down: vec![0.0; n] })
    }

    /// Grid from rows indexed by x-bin, each row holding the y-bins: `rows[i-1][j-1]`.
    pub fn from_rows(name: impl Into<String>, x: Axis, y: Axis, rows: &[Vec<f64>]) -> Result<Self> {
        let name = name.into();
        if rows.len() != x.n_bins() || rows.iter().any(|r| r.len() != y.n_bins()) {
            return Err(Error::Validation(format!(
                "grid '{name}' rows do not match {}x{} binning",
                x.n_bins(),
                y.n_bins()
            )));
        }
        let content = rows.iter().flatten().copied().collect();
        Self::from_content(name, x, y, content)
    }

    /// All-zero grid with the same binning as `self`.
    pub fn zeros_like(&self, name: impl Into<String>) -> Self {
        Self::zeros(name, self.x.clone(), self.y.clone())
    }

    /// Independent copy under a new name.
    pub fn renamed(&self, name: impl Into<String>) -> Self {
        let mut g = self.clone();
        g.name = name.into();
        g
    }

    /// Grid name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Rename in place.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// X axis.
    pub fn x_axis(&self) -> &Axis {
        &self.x
    }

    /// Y axis.
    pub fn y_axis(&self) -> &Axis {
        &self.y
    }

    /// Number of x bins.
    #[inline]
    pub fn nx(&self) -> usize {
        self.x.n_bins()
    }

    /// Number of y bins.
    #[inline]
    pub fn ny(&self) -> usize {
        self.y.n_bins()
    }

    /// Number of in-range cells (`nx * ny`).
    pub fn n_cells(&self) -> usize {
        self.content.len()
    }

    /// Flat contents in canonical order.
    pub fn content(&self) -> &[f64] {
        &self.content
    }

    pub(crate) fn content_mut(&mut self) -> &mut [f64] {
        &mut self.content
    }

    #[inline]
    fn offset(&self, i: usize, j: usize) -> usize {
        debug_assert!((1..=self.nx()).contains(&i) && (1..=self.ny()).contains(&j));
        flatten(i, j, self.ny()) - 1
    }

    /// Content of bin `(i, j)`.
    #[inline]
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.content[self.offset(i, j)]
    }

    /// Set content of bin `(i, j)`.
    #[inline]
    pub fn set(&mut self, i: usize, j: usize, value: f64) {
        let k = self.offset(i, j);
        self.content[k] = value;
    }

    /// Add `value` to bin `(i, j)`.
    #[inline]
    pub fn fill(&mut self, i: usize, j: usize, value: f64) {
        let k = self.offset(i, j);
        self.content[k] += value;
    }

    /// Content at coordinate `(x, y)`; zero when the point lies outside the grid.
    pub fn value_at(&self, x: f64, y: f64) -> f64 {
        let i = self.x.find_bin(x);
        let j = self.y.find_bin(y);
        if i == 0 || i > self.nx() || j == 0 || j > self.ny() {
            return 0.0;
        }
        self.get(i, j)
    }

    /// `(error_low, error_up)` of bin `(i, j)`.
    pub fn errors(&self, i: usize, j: usize) -> (f64, f64) {
        let k = self.offset(i, j);
        (self.errors_down[k], self.errors_up[k])
    }

    /// Set the asymmetric errors of bin `(i, j)`.
    pub fn set_errors(&mut self, i: usize, j: usize, down: f64, up: f64) {
        let k = self.offset(i, j);
        self.errors_down[k] = down;
        self.errors_up[k] = up;
    }

    /// Same bin counts on both axes (edges are not compared).
    pub fn is_compatible(&self, other: &Grid2D) -> bool {
        self.nx() == other.nx() && self.ny() == other.ny()
    }

    /// `name[nx x ny]`, used in diagnostics.
    pub fn describe(&self) -> String {
        format!("{}[{}x{}]", self.name, self.nx(), self.ny())
    }

    /// Iterate `(i, j, content)` in canonical order.
    pub fn bins(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        let ny = self.ny();
        self.content.iter().enumerate().map(move |(g, &v)| (g / ny + 1, g % ny + 1, v))
    }
}

/// Serialized form of [`Grid2D`].
#[derive(Debug, Clone, Serialize, Deserialize)]
struct Grid2DRepr {
    name: String,
    x_edges: Vec<f64>,
    y_edges: Vec<f64>,
    content: Vec<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    errors_up: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    errors_down: Option<Vec<f64>>,
}

impl TryFrom<Grid2DRepr> for Grid2D {
    type Error = Error;

    fn try_from(r: Grid2DRepr) -> Result<Self> {
        let mut g = Grid2D::from_content(r.name, Axis::new(r.x_edges)?, Axis::new(r.y_edges)?, r.content)?;
        let n = g.n_cells();
        for (field, errs, dst) in [
            ("errors_up", r.errors_up, &mut g.errors_up),
            ("errors_down", r.errors_down, &mut g.errors_down),
        ] {
            if let Some(errs) = errs {
                if errs.len() != n {
                    return Err(Error::Validation(format!(
                        "grid '{}' {field} length mismatch: expected {n}, got {}",
                        g.name,
                        errs.len()
                    )));
                }
                *dst = errs;
            }
        }
        Ok(g)
    }
}

impl From<Grid2D> for Grid2DRepr {
    fn from(g: Grid2D) -> Self {
        let has_errors = g.errors_up.iter().chain(&g.errors_down).any(|e| *e != 0.0);
        Grid2DRepr {
            name: g.name,
            x_edges: g.x.edges,
            y_edges: g.y.edges,
            content: g.content,
            errors_up: has_errors.then_some(g.errors_up),
            errors_down: has_errors.then_some(g.errors_down),
        }
    }
}
