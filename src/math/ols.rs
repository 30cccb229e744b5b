//! Least squares trend fitting.
//!
//! Intensity summaries report a linear trend (g/kWh per day) over the
//! readings on hand:
//!
//! ```text
//! minimize Σ (y_i - (a + b·t_i))^2
//! ```
//!
//! - We solve through SVD so a tall design matrix (many readings, two
//!   columns) is handled robustly.
//!   (Nalgebra's `QR::solve` is intended for square systems and will panic for
//!   non-square matrices.)
//! - Readings that share a single timestamp make the system rank-deficient;
//!   we report no trend rather than an arbitrary slope.

use nalgebra::{DMatrix, DVector};

/// Intercept and slope of a fitted line.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LinearTrend {
    pub intercept: f64,
    pub slope: f64,
}

/// Fit `y = intercept + slope·x` by ordinary least squares.
///
/// Returns `None` for fewer than two points, mismatched lengths, or when all
/// `x` values coincide.
pub fn linear_trend(xs: &[f64], ys: &[f64]) -> Option<LinearTrend> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }

    let x_min = xs.iter().copied().fold(f64::INFINITY, f64::min);
    let x_max = xs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !(x_max - x_min).is_finite() || (x_max - x_min).abs() < 1e-12 {
        return None;
    }

    let mut design = DMatrix::zeros(xs.len(), 2);
    for (i, &x) in xs.iter().enumerate() {
        design[(i, 0)] = 1.0;
        design[(i, 1)] = x;
    }
    let y = DVector::from_column_slice(ys);

    let beta = solve_least_squares(&design, &y)?;
    Some(LinearTrend {
        intercept: beta[0],
        slope: beta[1],
    })
}

/// Solve a least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>) -> Option<DVector<f64>> {
    let svd = x.clone().svd(true, true);

    for &tol in &[1e-10, 1e-8, 1e-6] {
        if let Ok(beta) = svd.solve(y, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}
