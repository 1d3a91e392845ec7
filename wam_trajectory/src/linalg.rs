//! Dense square-matrix operations: determinant, inverse and linear solve.
//!
//! Small matrices (order up to [`COFACTOR_MAX_ORDER`]) go through cofactor
//! expansion and the adjugate, larger ones through an LU decomposition with
//! partial pivoting. Both paths agree on every non-singular system. A matrix
//! is singular only when its determinant is exactly zero.

use nalgebra::{DMatrix, DVector};

use crate::errors::LinalgError;

/// Largest order handled by cofactor expansion.
pub const COFACTOR_MAX_ORDER: usize = 4;

fn check_square(m: &DMatrix<f64>) -> Result<usize, LinalgError> {
    if m.is_empty() {
        return Err(LinalgError::Empty);
    }
    if !m.is_square() {
        return Err(LinalgError::NotSquare {
            rows: m.nrows(),
            cols: m.ncols(),
        });
    }
    Ok(m.nrows())
}

/// Determinant of a square matrix.
pub fn determinant(m: &DMatrix<f64>) -> Result<f64, LinalgError> {
    let n = check_square(m)?;
    if n <= COFACTOR_MAX_ORDER {
        Ok(cofactor_determinant(m))
    } else {
        Ok(m.clone().lu().determinant())
    }
}

/// First-row expansion, direct formula for 2x2.
fn cofactor_determinant(m: &DMatrix<f64>) -> f64 {
    match m.nrows() {
        1 => m[(0, 0)],
        2 => m[(0, 0)] * m[(1, 1)] - m[(1, 0)] * m[(0, 1)],
        n => (0..n)
            .filter(|&col| m[(0, col)] != 0.0)
            .map(|col| {
                let sign = if col % 2 == 0 { 1.0 } else { -1.0 };
                sign * m[(0, col)] * cofactor_determinant(&minor(m, 0, col))
            })
            .sum(),
    }
}

/// `m` without row `row` and column `col`.
fn minor(m: &DMatrix<f64>, row: usize, col: usize) -> DMatrix<f64> {
    m.clone().remove_row(row).remove_column(col)
}

/// Inverse of a square, non-singular matrix.
pub fn inverse(m: &DMatrix<f64>) -> Result<DMatrix<f64>, LinalgError> {
    let n = check_square(m)?;
    if n > COFACTOR_MAX_ORDER {
        let lu = m.clone().lu();
        if lu.determinant() == 0.0 {
            return Err(LinalgError::Singular);
        }
        return lu.try_inverse().ok_or(LinalgError::Singular);
    }

    let det = cofactor_determinant(m);
    if det == 0.0 {
        return Err(LinalgError::Singular);
    }

    match n {
        1 => Ok(DMatrix::from_element(1, 1, 1.0 / det)),
        2 => Ok(DMatrix::from_row_slice(
            2,
            2,
            &[
                m[(1, 1)] / det,
                -m[(0, 1)] / det,
                -m[(1, 0)] / det,
                m[(0, 0)] / det,
            ],
        )),
        // adj(A)ᵢⱼ = Cⱼᵢ
        _ => Ok(DMatrix::from_fn(n, n, |i, j| {
            let sign = if (i + j) % 2 == 0 { 1.0 } else { -1.0 };
            sign * cofactor_determinant(&minor(m, j, i)) / det
        })),
    }
}

/// Solve `A x = b`.
pub fn solve(a: &DMatrix<f64>, b: &DVector<f64>) -> Result<DVector<f64>, LinalgError> {
    let n = check_square(a)?;
    if b.len() != n {
        return Err(LinalgError::DimensionMismatch {
            expected: n,
            found: b.len(),
        });
    }

    if n <= COFACTOR_MAX_ORDER {
        return Ok(inverse(a)? * b);
    }

    let lu = a.clone().lu();
    if lu.determinant() == 0.0 {
        return Err(LinalgError::Singular);
    }
    lu.solve(b).ok_or(LinalgError::Singular)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_matrix_close(a: &DMatrix<f64>, b: &DMatrix<f64>) {
        assert_eq!(a.shape(), b.shape());
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-9, "{} != {}", a, b);
        }
    }

    #[test]
    fn test_determinant_small() {
        let m = DMatrix::from_row_slice(2, 2, &[3.0, 8.0, 4.0, 6.0]);
        assert_eq!(determinant(&m).unwrap(), -14.0);

        let m = DMatrix::from_row_slice(3, 3, &[6.0, 1.0, 1.0, 4.0, -2.0, 5.0, 2.0, 8.0, 7.0]);
        assert_eq!(determinant(&m).unwrap(), -306.0);

        let m = DMatrix::from_element(1, 1, 5.0);
        assert_eq!(determinant(&m).unwrap(), 5.0);
    }

    #[test]
    fn test_determinant_paths_agree() {
        // Diagonally dominant 6x6 goes through LU, its 4x4 corner through cofactors
        let m = DMatrix::from_fn(6, 6, |i, j| {
            if i == j {
                10.0 + i as f64
            } else {
                (i * 3 + j) as f64 * 0.1
            }
        });
        let corner = m.view((0, 0), (4, 4)).into_owned();

        assert!(
            (determinant(&corner).unwrap() - corner.determinant()).abs() < 1e-9
        );
        assert!((determinant(&m).unwrap() - m.determinant()).abs() < 1e-6);
    }

    #[test]
    fn test_not_square() {
        let m = DMatrix::<f64>::zeros(2, 3);
        assert_eq!(
            determinant(&m),
            Err(LinalgError::NotSquare { rows: 2, cols: 3 })
        );
        assert_eq!(
            inverse(&m),
            Err(LinalgError::NotSquare { rows: 2, cols: 3 })
        );
        assert_eq!(
            solve(&m, &DVector::zeros(2)),
            Err(LinalgError::NotSquare { rows: 2, cols: 3 })
        );
        assert_eq!(
            determinant(&DMatrix::<f64>::zeros(0, 0)),
            Err(LinalgError::Empty)
        );
    }

    #[test]
    fn test_singular() {
        let m = DMatrix::from_row_slice(2, 2, &[1.0, 2.0, 2.0, 4.0]);
        assert_eq!(inverse(&m), Err(LinalgError::Singular));
        assert_eq!(
            solve(&m, &DVector::from_vec(vec![1.0, 1.0])),
            Err(LinalgError::Singular)
        );

        // Zero column in a matrix large enough for the LU path
        let mut big = DMatrix::<f64>::identity(6, 6);
        big[(3, 3)] = 0.0;
        assert_eq!(determinant(&big).unwrap(), 0.0);
        assert_eq!(solve(&big, &DVector::zeros(6)), Err(LinalgError::Singular));
        assert_eq!(inverse(&big), Err(LinalgError::Singular));
    }

    #[test]
    fn test_dimension_mismatch() {
        let m = DMatrix::<f64>::identity(3, 3);
        assert_eq!(
            solve(&m, &DVector::zeros(2)),
            Err(LinalgError::DimensionMismatch { expected: 3, found: 2 })
        );
    }

    #[test]
    fn test_inverse_adjugate() {
        let m = DMatrix::from_row_slice(3, 3, &[2.0, 0.0, 1.0, 1.0, 3.0, 0.0, 0.0, 1.0, 4.0]);
        let inv = inverse(&m).unwrap();
        assert_matrix_close(&(&m * &inv), &DMatrix::identity(3, 3));

        let m2 = DMatrix::from_row_slice(2, 2, &[4.0, 7.0, 2.0, 6.0]);
        let inv2 = inverse(&m2).unwrap();
        assert_matrix_close(
            &inv2,
            &DMatrix::from_row_slice(2, 2, &[0.6, -0.7, -0.2, 0.4]),
        );
    }

    #[test]
    fn test_solve_both_paths() {
        let a = DMatrix::from_row_slice(3, 3, &[2.0, 1.0, -1.0, -3.0, -1.0, 2.0, -2.0, 1.0, 2.0]);
        let b = DVector::from_vec(vec![8.0, -11.0, -3.0]);
        let x = solve(&a, &b).unwrap();
        for (value, expected) in x.iter().zip([2.0, 3.0, -1.0]) {
            assert!((value - expected).abs() < 1e-9);
        }

        let big = DMatrix::from_fn(8, 8, |i, j| match i.abs_diff(j) {
            0 => 4.0,
            1 => 1.0,
            _ => 0.0,
        });
        let expected = DVector::from_fn(8, |i, _| i as f64 - 3.0);
        let rhs = &big * &expected;
        let x = solve(&big, &rhs).unwrap();
        for (value, want) in x.iter().zip(expected.iter()) {
            assert!((value - want).abs() < 1e-9);
        }
    }
}
