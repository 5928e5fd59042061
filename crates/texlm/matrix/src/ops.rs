//! The closed set of matrix operations: transpose, inverse, add, multiply
//!
//! All operations are pure. Inputs are never modified and identical
//! inputs always produce bit-identical outputs.

use crate::error::{MatrixError, MatrixResult};
use crate::matrix::{MatrixValue, Shape};
use crate::scalar::Scalar;

/// Pivot threshold, relative to the largest entry of the pivot's own row,
/// below which a matrix is treated as singular
pub const SINGULARITY_TOLERANCE: f64 = 1e-12;

impl MatrixValue {
    /// Index-swap transpose
    pub fn transpose(&self) -> MatrixValue {
        let Shape { rows, cols } = self.shape();
        let mut cells = Vec::with_capacity(rows * cols);
        for c in 0..cols {
            for r in 0..rows {
                cells.push(self.cells()[r * cols + c]);
            }
        }
        MatrixValue::from_cells(Shape { rows: cols, cols: rows }, cells)
    }

    /// Dense inverse by Gauss-Jordan elimination with partial pivoting.
    ///
    /// Fails with a shape error for non-square or singular input.
    pub fn inverse(&self) -> MatrixResult<MatrixValue> {
        let shape = self.shape();
        if !shape.is_square() {
            return Err(MatrixError::shape(
                "inverse",
                format!("matrix must be square, got {}", shape),
            ));
        }

        let n = shape.rows;
        let mut a: Vec<Vec<f64>> = self.to_f64_rows();
        let mut inv: Vec<Vec<f64>> = (0..n)
            .map(|i| (0..n).map(|j| if i == j { 1.0 } else { 0.0 }).collect())
            .collect();

        // Largest original entry per row; travels with the row on swaps.
        let mut row_scale: Vec<f64> = a
            .iter()
            .map(|row| row.iter().map(|v| v.abs()).fold(0.0_f64, f64::max))
            .collect();

        for col in 0..n {
            let mut pivot_row = col;
            let mut pivot_abs = a[col][col].abs();
            for (r, row) in a.iter().enumerate().skip(col + 1) {
                if row[col].abs() > pivot_abs {
                    pivot_row = r;
                    pivot_abs = row[col].abs();
                }
            }

            let threshold = row_scale[pivot_row] * SINGULARITY_TOLERANCE;
            if pivot_abs == 0.0 || pivot_abs <= threshold || !pivot_abs.is_finite() {
                return Err(MatrixError::shape(
                    "inverse",
                    "matrix is singular and has no inverse",
                ));
            }

            a.swap(col, pivot_row);
            inv.swap(col, pivot_row);
            row_scale.swap(col, pivot_row);

            let pivot = a[col][col];
            for j in 0..n {
                a[col][j] /= pivot;
                inv[col][j] /= pivot;
            }

            for r in 0..n {
                if r == col {
                    continue;
                }
                let factor = a[r][col];
                if factor == 0.0 {
                    continue;
                }
                for j in 0..n {
                    a[r][j] -= factor * a[col][j];
                    inv[r][j] -= factor * inv[col][j];
                }
            }
        }

        let cells = inv
            .into_iter()
            .flatten()
            // -0.0 carries no information for display
            .map(|v| Scalar::Float(if v == 0.0 { 0.0 } else { v }))
            .collect();
        Ok(MatrixValue::from_cells(shape, cells))
    }

    /// Element-wise sum. Shapes must be equal.
    pub fn add(&self, other: &MatrixValue) -> MatrixResult<MatrixValue> {
        if self.shape() != other.shape() {
            return Err(MatrixError::shape(
                "add",
                format!(
                    "operands must have the same shape, got {} and {}",
                    self.shape(),
                    other.shape()
                ),
            ));
        }

        let cells = self
            .cells()
            .iter()
            .zip(other.cells())
            .map(|(a, b)| a.add(*b))
            .collect();
        Ok(MatrixValue::from_cells(self.shape(), cells))
    }

    /// Standard matrix product. `self.cols` must equal `other.rows`.
    pub fn multiply(&self, other: &MatrixValue) -> MatrixResult<MatrixValue> {
        let left = self.shape();
        let right = other.shape();
        if left.cols != right.rows {
            return Err(MatrixError::shape(
                "multiply",
                format!(
                    "inner dimensions must match, got {} times {}",
                    left, right
                ),
            ));
        }

        let mut cells = Vec::with_capacity(left.rows * right.cols);
        for i in 0..left.rows {
            for j in 0..right.cols {
                let mut acc = Scalar::Int(0);
                for k in 0..left.cols {
                    let a = self.cells()[i * left.cols + k];
                    let b = other.cells()[k * right.cols + j];
                    acc = acc.add(a.mul(b));
                }
                cells.push(acc);
            }
        }

        Ok(MatrixValue::from_cells(
            Shape {
                rows: left.rows,
                cols: right.cols,
            },
            cells,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ints(rows: &[&[i64]]) -> MatrixValue {
        MatrixValue::from_rows(
            rows.iter()
                .map(|row| row.iter().map(|v| Scalar::Int(*v)).collect())
                .collect(),
        )
        .unwrap()
    }

    fn assert_close(actual: &MatrixValue, expected: &[&[f64]]) {
        let rows = actual.to_f64_rows();
        assert_eq!(rows.len(), expected.len());
        for (got, want) in rows.iter().zip(expected) {
            assert_eq!(got.len(), want.len());
            for (g, w) in got.iter().zip(want.iter()) {
                assert!((g - w).abs() < 1e-9, "expected {}, got {}", w, g);
            }
        }
    }

    #[test]
    fn test_transpose_square() {
        let m = ints(&[&[1, 2], &[3, 4]]);
        assert_eq!(m.transpose(), ints(&[&[1, 3], &[2, 4]]));
    }

    #[test]
    fn test_transpose_row_becomes_column() {
        let m = ints(&[&[1, 2, 3]]);
        let t = m.transpose();
        assert_eq!(t.shape(), Shape { rows: 3, cols: 1 });
        assert_eq!(t, ints(&[&[1], &[2], &[3]]));
    }

    #[test]
    fn test_multiply_column_vector() {
        let a = ints(&[&[1, 0], &[2, 3]]);
        let b = ints(&[&[4], &[5]]);
        let product = a.multiply(&b).unwrap();
        assert_eq!(product, ints(&[&[4], &[23]]));
        assert!(product.cells().iter().all(|c| c.is_int()));
    }

    #[test]
    fn test_multiply_inner_mismatch() {
        let a = ints(&[&[1, 2]]);
        let b = ints(&[&[1, 2]]);
        let err = a.multiply(&b).unwrap_err();
        assert!(matches!(err, MatrixError::Shape { operation: "multiply", .. }));
    }

    #[test]
    fn test_add_same_shape() {
        let a = ints(&[&[1, 2], &[3, 4]]);
        let b = ints(&[&[5, 6], &[7, 8]]);
        assert_eq!(a.add(&b).unwrap(), ints(&[&[6, 8], &[10, 12]]));
    }

    #[test]
    fn test_add_shape_mismatch() {
        let a = ints(&[&[1, 2], &[3, 4]]);
        let b = ints(&[&[1, 2]]);
        let err = a.add(&b).unwrap_err();
        assert!(matches!(err, MatrixError::Shape { operation: "add", .. }));
        assert!(err.to_string().contains("2x2"));
    }

    #[test]
    fn test_inverse_2x2() {
        let m = ints(&[&[4, 7], &[2, 6]]);
        let inv = m.inverse().unwrap();
        assert_close(&inv, &[&[0.6, -0.7], &[-0.2, 0.4]]);
    }

    #[test]
    fn test_inverse_needs_pivoting() {
        let m = ints(&[&[0, 1], &[1, 0]]);
        let inv = m.inverse().unwrap();
        assert_close(&inv, &[&[0.0, 1.0], &[1.0, 0.0]]);
    }

    #[test]
    fn test_inverse_times_original_is_identity() {
        let m = ints(&[&[2, -1, 0], &[-1, 2, -1], &[0, -1, 2]]);
        let product = m.multiply(&m.inverse().unwrap()).unwrap();
        assert_close(
            &product,
            &[&[1.0, 0.0, 0.0], &[0.0, 1.0, 0.0], &[0.0, 0.0, 1.0]],
        );
    }

    #[test]
    fn test_inverse_singular() {
        let m = ints(&[&[1, 2], &[2, 4]]);
        let err = m.inverse().unwrap_err();
        assert!(matches!(err, MatrixError::Shape { operation: "inverse", .. }));
        assert!(err.to_string().contains("singular"));
    }

    #[test]
    fn test_inverse_singular_floats() {
        let m = MatrixValue::from_rows(vec![
            vec![Scalar::Float(0.1), Scalar::Float(0.2)],
            vec![Scalar::Float(0.3), Scalar::Float(0.6)],
        ])
        .unwrap();
        assert!(m.inverse().is_err());
    }

    #[test]
    fn test_inverse_of_badly_scaled_matrix() {
        let m = MatrixValue::from_rows(vec![
            vec![Scalar::Int(1), Scalar::Int(0)],
            vec![Scalar::Int(0), Scalar::Float(1e-13)],
        ])
        .unwrap();
        let inv = m.inverse().unwrap().to_f64_rows();
        assert_eq!(inv[0], vec![1.0, 0.0]);
        assert_eq!(inv[1][0], 0.0);
        assert!((inv[1][1] / 1e13 - 1.0).abs() < 1e-9, "got {}", inv[1][1]);
    }

    #[test]
    fn test_inverse_non_square() {
        let m = ints(&[&[1, 2, 3], &[4, 5, 6]]);
        let err = m.inverse().unwrap_err();
        assert!(err.to_string().contains("square"));
    }

    #[test]
    fn test_inverse_has_no_negative_zero() {
        let inv = ints(&[&[2, 0], &[0, 4]]).inverse().unwrap();
        for cell in inv.cells() {
            assert!(!(cell.to_f64() == 0.0 && cell.to_f64().is_sign_negative()));
        }
    }

    fn arb_matrix() -> impl Strategy<Value = MatrixValue> {
        (1usize..6, 1usize..6).prop_flat_map(|(rows, cols)| {
            prop::collection::vec(
                prop_oneof![
                    any::<i32>().prop_map(|v| Scalar::Int(v as i64)),
                    (-1.0e6f64..1.0e6).prop_map(Scalar::Float),
                ],
                rows * cols,
            )
            .prop_map(move |cells| MatrixValue::from_cells(Shape { rows, cols }, cells))
        })
    }

    proptest! {
        #[test]
        fn property_transpose_is_an_involution(m in arb_matrix()) {
            prop_assert_eq!(m.transpose().transpose(), m);
        }

        #[test]
        fn property_operations_are_deterministic(m in arb_matrix()) {
            let t = m.transpose();
            let first = m.multiply(&t).unwrap();
            let second = m.multiply(&t).unwrap();
            for (a, b) in first.cells().iter().zip(second.cells()) {
                prop_assert_eq!(a.to_f64().to_bits(), b.to_f64().to_bits());
            }
        }
    }
}
