//! Correlation-matrix validation and factorization for multi-asset simulation.
//!
//! References:
//! - Glasserman, P. (2004), *Monte Carlo Methods in Financial Engineering*,
//!   §2.3.3 on generating correlated normals.
//!
//! A matrix that is not symmetric, unit-diagonal, and positive semidefinite is
//! rejected as a configuration error. There is deliberately no nearest-PSD
//! repair here: a broken correlation matrix is a caller bug, and a silently
//! projected matrix would price a different book than the one requested.

use nalgebra::{DMatrix, SymmetricEigen};

use crate::math::fast_rng::{Xoshiro256PlusPlus, sample_standard_normal};

/// Validates that `corr` is a finite, symmetric `n x n` correlation matrix
/// with unit diagonal and off-diagonal entries in `[-1, 1]`.
pub fn validate_correlation_matrix(corr: &[Vec<f64>], n_assets: usize) -> Result<(), String> {
    if corr.len() != n_assets || corr.iter().any(|row| row.len() != n_assets) {
        return Err("correlation matrix dimensions must match asset count".to_string());
    }

    for (i, row_i) in corr.iter().enumerate() {
        let di = row_i[i];
        if !di.is_finite() || (di - 1.0).abs() > 1.0e-10 {
            return Err("correlation matrix diagonal must be 1".to_string());
        }
        for (j, rho) in row_i.iter().copied().enumerate() {
            if !rho.is_finite() || !(-1.0..=1.0).contains(&rho) {
                return Err("correlation entries must be finite and in [-1, 1]".to_string());
            }
            if (rho - corr[j][i]).abs() > 1.0e-10 {
                return Err("correlation matrix must be symmetric".to_string());
            }
        }
    }

    Ok(())
}

/// Minimum eigenvalue of a symmetric matrix, or `None` for a malformed input.
pub fn min_eigenvalue_symmetric(matrix: &[Vec<f64>]) -> Option<f64> {
    let n = matrix.len();
    if n == 0 || matrix.iter().any(|row| row.len() != n) {
        return None;
    }

    let data: Vec<f64> = matrix.iter().flat_map(|row| row.iter().copied()).collect();
    let m = DMatrix::from_row_slice(n, n, &data);
    let eig = SymmetricEigen::new(m);
    eig.eigenvalues.iter().copied().reduce(f64::min)
}

/// Returns `true` if the matrix is positive semidefinite within tolerance.
pub fn is_positive_semidefinite(matrix: &[Vec<f64>], tol: f64) -> bool {
    min_eigenvalue_symmetric(matrix).is_some_and(|lmin| lmin >= -tol)
}

/// Cholesky factorization tolerant of semidefinite (rank-deficient) input.
///
/// Returns lower-triangular `L` with `L L^T ~= matrix`, or `None` when a pivot
/// falls below `-tol` (the matrix is indefinite).
pub fn cholesky_lower_psd(matrix: &[Vec<f64>], tol: f64) -> Option<Vec<Vec<f64>>> {
    let n = matrix.len();
    if n == 0 || matrix.iter().any(|row| row.len() != n) {
        return None;
    }

    let mut l = vec![vec![0.0_f64; n]; n];

    for i in 0..n {
        for j in 0..=i {
            let mut sum = matrix[i][j];
            for (&lik, &ljk) in l[i].iter().zip(l[j].iter()).take(j) {
                sum -= lik * ljk;
            }

            if i == j {
                if sum < -tol {
                    return None;
                }
                l[i][j] = sum.max(tol).sqrt();
            } else if l[j][j] > tol {
                l[i][j] = sum / l[j][j];
            }
        }
    }

    Some(l)
}

/// Applies a lower Cholesky factor to independent normals: `out = L * indep`.
pub fn correlate_normals(chol: &[Vec<f64>], indep: &[f64], out: &mut [f64]) {
    for i in 0..chol.len() {
        let mut sum = 0.0;
        for (j, lij) in chol[i].iter().enumerate().take(i + 1) {
            sum += *lij * indep[j];
        }
        out[i] = sum;
    }
}

/// Draws one vector of correlated standard normals through `chol`.
pub fn sample_correlated_normals(
    chol: &[Vec<f64>],
    rng: &mut Xoshiro256PlusPlus,
    indep_buf: &mut [f64],
    out: &mut [f64],
) {
    debug_assert_eq!(indep_buf.len(), chol.len());
    debug_assert_eq!(out.len(), chol.len());
    for z in indep_buf.iter_mut() {
        *z = sample_standard_normal(rng);
    }
    correlate_normals(chol, indep_buf, out);
}
