//! Least squares solver for the baseline window regressor.
//!
//! ```text
//! minimize ‖X β - y‖²  (+ λ ‖β‖² when a ridge penalty is requested)
//! ```
//!
//! Window summaries are strongly collinear (the last row and the window mean of
//! a slowly varying EUV line are almost the same column), so the system is
//! solved through SVD with a tolerance ladder rather than normal equations.
//! The ridge term is applied by row augmentation: `[X; √λ I] β = [y; 0]`.

use nalgebra::{DMatrix, DVector};

/// Solve a (optionally ridge-regularized) least squares problem using SVD.
///
/// Returns `None` if the system is too ill-conditioned to solve robustly.
pub fn solve_least_squares(x: &DMatrix<f64>, y: &DVector<f64>, ridge: f64) -> Option<DVector<f64>> {
    let (a, b) = if ridge > 0.0 {
        let (n, p) = x.shape();
        let mut a = DMatrix::zeros(n + p, p);
        a.view_mut((0, 0), (n, p)).copy_from(x);
        let penalty = ridge.sqrt();
        // Intercept (column 0) is not penalized.
        for j in 1..p {
            a[(n + j, j)] = penalty;
        }
        let mut b = DVector::zeros(n + p);
        b.rows_mut(0, n).copy_from(y);
        (a, b)
    } else {
        (x.clone(), y.clone())
    };

    let svd = a.svd(true, true);
    for &tol in &[1e-12, 1e-10, 1e-8] {
        if let Ok(beta) = svd.solve(&b, tol) {
            if beta.iter().all(|v| v.is_finite()) {
                return Some(beta);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y, 0.0).unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn ridge_shrinks_slope_but_not_intercept() {
        let x = DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 1.0, 1.0, 1.0, 2.0]);
        let y = DVector::from_row_slice(&[2.0, 5.0, 8.0]);

        let beta = solve_least_squares(&x, &y, 10.0).unwrap();
        assert!(beta[1] < 3.0 && beta[1] > 0.0);
        assert!(beta[0] > 2.0);
    }
}
