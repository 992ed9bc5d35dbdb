//! Parametric transfer-function shapes.
//!
//! A form `NxM` is a polynomial of order `N` in `x` and `M` in `y`, with both coordinates
//! mapped onto `[0, 1]` across the template's range:
//!
//! ```text
//! 0x0  (p0)
//! 1x0  (p0 + p1*x)
//! 0x1  (p0 + p1*y)
//! 1x1  (p0 + p1*x) * (p2 + p3*y)
//! 2x1  (p0 + p1*x + p2*x^2) * (p3 + p4*y)
//! ```
//!
//! Evaluating a form with postfit parameters on a grid yields the binned transfer function
//! consumed by the transfer chain.

use std::fmt;
use std::str::FromStr;

use tg_core::{Error, Result};

use crate::grid::Grid2D;

/// Polynomial order of a transfer function in `x` and `y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PolynomialForm {
    /// Order in x.
    pub x_order: usize,
    /// Order in y.
    pub y_order: usize,
}

impl PolynomialForm {
    /// Form of the given orders.
    pub fn new(x_order: usize, y_order: usize) -> Self {
        Self { x_order, y_order }
    }

    fn has_x_factor(&self) -> bool {
        self.x_order > 0 || self.y_order == 0
    }

    fn has_y_factor(&self) -> bool {
        self.y_order > 0
    }

    /// Number of parameters the form consumes.
    pub fn n_params(&self) -> usize {
        let nx = if self.has_x_factor() { self.x_order + 1 } else { 0 };
        let ny = if self.has_y_factor() { self.y_order + 1 } else { 0 };
        nx + ny
    }

    /// Evaluate at normalized coordinates `(x, y)`.
    pub fn eval(&self, params: &[f64], x: f64, y: f64) -> Result<f64> {
        if params.len() != self.n_params() {
            return Err(Error::Validation(format!(
                "transfer form {self} expects {} parameters, got {}",
                self.n_params(),
                params.len()
            )));
        }
        let mut rest = params;
        let mut value = 1.0;
        if self.has_x_factor() {
            let (px, tail) = rest.split_at(self.x_order + 1);
            value *= horner(px, x);
            rest = tail;
        }
        if self.has_y_factor() {
            value *= horner(rest, y);
        }
        Ok(value)
    }

    /// Evaluate on every bin centre of `template`, producing a grid named `name`.
    pub fn shape(&self, template: &Grid2D, params: &[f64], name: impl Into<String>) -> Result<Grid2D> {
        let (xa, ya) = (template.x_axis(), template.y_axis());
        let mut out = template.zeros_like(name);
        for i in 1..=template.nx() {
            let x = (xa.bin_center(i) - xa.lo()) / (xa.hi() - xa.lo());
            for j in 1..=template.ny() {
                let y = (ya.bin_center(j) - ya.lo()) / (ya.hi() - ya.lo());
                out.set(i, j, self.eval(params, x, y)?);
            }
        }
        log::debug!("evaluated transfer form {self} on {}", out.describe());
        Ok(out)
    }
}

/// `c0 + c1*t + c2*t^2 + ...`
fn horner(coeffs: &[f64], t: f64) -> f64 {
    coeffs.iter().rev().fold(0.0, |acc, c| acc * t + c)
}

impl fmt::Display for PolynomialForm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.x_order, self.y_order)
    }
}

impl FromStr for PolynomialForm {
    type Err = Error;

    /// Parses `NxM`, optionally prefixed with a fit tag such as `b_` or `s_`.
    fn from_str(s: &str) -> Result<Self> {
        let body = s.rsplit('_').next().unwrap_or(s);
        let parse = |part: Option<&str>| -> Result<usize> {
            part.and_then(|p| p.trim().parse().ok()).ok_or_else(|| {
                Error::Validation(format!("invalid transfer form '{s}', expected e.g. '2x1'"))
            })
        };
        let mut parts = body.splitn(2, 'x');
        let x_order = parse(parts.next())?;
        let y_order = parse(parts.next())?;
        Ok(Self { x_order, y_order })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Axis;
    use approx::assert_relative_eq;

    #[test]
    fn parse_forms() {
        assert_eq!("2x1".parse::<PolynomialForm>().unwrap(), PolynomialForm::new(2, 1));
        assert_eq!("b_3x2".parse::<PolynomialForm>().unwrap(), PolynomialForm::new(3, 2));
        assert!("2y1".parse::<PolynomialForm>().is_err());
        assert!("x1".parse::<PolynomialForm>().is_err());
        assert_eq!(PolynomialForm::new(1, 0).to_string(), "1x0");
    }

    #[test]
    fn parameter_counts() {
        assert_eq!(PolynomialForm::new(0, 0).n_params(), 1);
        assert_eq!(PolynomialForm::new(1, 0).n_params(), 2);
        assert_eq!(PolynomialForm::new(0, 1).n_params(), 2);
        assert_eq!(PolynomialForm::new(1, 1).n_params(), 4);
        assert_eq!(PolynomialForm::new(2, 1).n_params(), 5);
        assert_eq!(PolynomialForm::new(3, 2).n_params(), 7);
    }

    #[test]
    fn eval_matches_closed_form() {
        let f = PolynomialForm::new(1, 1);
        let v = f.eval(&[1.0, 2.0, 3.0, 4.0], 0.5, 0.25).unwrap();
        assert_relative_eq!(v, (1.0 + 2.0 * 0.5) * (3.0 + 4.0 * 0.25));

        let f = PolynomialForm::new(0, 1);
        assert_relative_eq!(f.eval(&[2.0, 1.0], 0.9, 0.5).unwrap(), 2.5);

        assert!(f.eval(&[1.0], 0.0, 0.0).is_err());
    }

    #[test]
    fn shape_uses_normalized_bin_centres() {
        let t = Grid2D::zeros(
            "t",
            Axis::new(vec![100.0, 200.0, 300.0]).unwrap(),
            Axis::uniform(1, 0.0, 50.0).unwrap(),
        );
        let g = PolynomialForm::new(1, 0).shape(&t, &[0.1, 0.2], "rpf").unwrap();
        assert_eq!(g.name(), "rpf");
        assert_relative_eq!(g.get(1, 1), 0.1 + 0.2 * 0.25);
        assert_relative_eq!(g.get(2, 1), 0.1 + 0.2 * 0.75);
    }
}
