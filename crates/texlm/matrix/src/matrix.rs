//! Dense row-major matrix value

use crate::error::{MatrixError, MatrixResult};
use crate::scalar::Scalar;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Rows and columns of a matrix
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Shape {
    pub rows: usize,
    pub cols: usize,
}

impl Shape {
    pub fn is_square(&self) -> bool {
        self.rows == self.cols
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.rows, self.cols)
    }
}

/// A non-empty rectangular grid of numeric cells.
///
/// One-dimensional input is stored as a single row, so every value has
/// a well-defined two-dimensional shape.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(into = "Vec<Vec<Scalar>>", try_from = "Vec<Vec<Scalar>>")]
pub struct MatrixValue {
    shape: Shape,
    cells: Vec<Scalar>,
}

impl MatrixValue {
    /// Build a matrix from rows. Fails unless there is at least one row,
    /// every row is non-empty, and all rows have the same length.
    pub fn from_rows(rows: Vec<Vec<Scalar>>) -> MatrixResult<Self> {
        let Some(first) = rows.first() else {
            return Err(MatrixError::Dimension(
                "matrix must contain at least one row".into(),
            ));
        };
        let cols = first.len();
        if cols == 0 {
            return Err(MatrixError::Dimension(
                "matrix rows must contain at least one element".into(),
            ));
        }

        let mut cells = Vec::with_capacity(rows.len() * cols);
        for (index, row) in rows.iter().enumerate() {
            if row.len() != cols {
                return Err(MatrixError::Dimension(format!(
                    "matrix is not rectangular: row {} has {} elements, expected {}",
                    index + 1,
                    row.len(),
                    cols
                )));
            }
            cells.extend_from_slice(row);
        }

        Ok(Self {
            shape: Shape {
                rows: rows.len(),
                cols,
            },
            cells,
        })
    }

    /// Build a single-row matrix from a one-dimensional list
    pub fn from_row(row: Vec<Scalar>) -> MatrixResult<Self> {
        Self::from_rows(vec![row])
    }

    /// Build a matrix from row-major cells. `cells.len()` must equal `rows * cols`.
    pub(crate) fn from_cells(shape: Shape, cells: Vec<Scalar>) -> Self {
        debug_assert_eq!(cells.len(), shape.rows * shape.cols);
        Self { shape, cells }
    }

    pub fn shape(&self) -> Shape {
        self.shape
    }

    pub fn rows(&self) -> usize {
        self.shape.rows
    }

    pub fn cols(&self) -> usize {
        self.shape.cols
    }

    pub fn is_square(&self) -> bool {
        self.shape.is_square()
    }

    /// Cell at (row, col), if in range
    pub fn get(&self, row: usize, col: usize) -> Option<Scalar> {
        if row < self.shape.rows && col < self.shape.cols {
            Some(self.cells[row * self.shape.cols + col])
        } else {
            None
        }
    }

    /// Iterate over rows as slices
    pub fn row_slices(&self) -> impl Iterator<Item = &[Scalar]> {
        self.cells.chunks(self.shape.cols)
    }

    /// Row-major cells
    pub fn cells(&self) -> &[Scalar] {
        &self.cells
    }

    /// Copy into nested rows
    pub fn to_rows(&self) -> Vec<Vec<Scalar>> {
        self.row_slices().map(|row| row.to_vec()).collect()
    }

    /// Copy into nested rows of floats
    pub fn to_f64_rows(&self) -> Vec<Vec<f64>> {
        self.row_slices()
            .map(|row| row.iter().map(|cell| cell.to_f64()).collect())
            .collect()
    }
}

impl From<MatrixValue> for Vec<Vec<Scalar>> {
    fn from(value: MatrixValue) -> Self {
        value.to_rows()
    }
}

impl TryFrom<Vec<Vec<Scalar>>> for MatrixValue {
    type Error = MatrixError;

    fn try_from(rows: Vec<Vec<Scalar>>) -> Result<Self, Self::Error> {
        Self::from_rows(rows)
    }
}

impl fmt::Display for MatrixValue {
    /// Renders in DSL literal syntax, e.g. `[[1, 2], [3, 4]]`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (r, row) in self.row_slices().enumerate() {
            if r > 0 {
                write!(f, ", ")?;
            }
            write!(f, "[")?;
            for (c, cell) in row.iter().enumerate() {
                if c > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{}", cell)?;
            }
            write!(f, "]")?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(rows: &[&[i64]]) -> Vec<Vec<Scalar>> {
        rows.iter()
            .map(|row| row.iter().map(|v| Scalar::Int(*v)).collect())
            .collect()
    }

    #[test]
    fn test_from_rows() {
        let m = MatrixValue::from_rows(ints(&[&[1, 2, 3], &[4, 5, 6]])).unwrap();
        assert_eq!(m.shape(), Shape { rows: 2, cols: 3 });
        assert_eq!(m.get(1, 2), Some(Scalar::Int(6)));
        assert_eq!(m.get(2, 0), None);
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let err = MatrixValue::from_rows(ints(&[&[1, 2], &[3]])).unwrap_err();
        assert!(matches!(err, MatrixError::Dimension(_)));
        assert!(err.to_string().contains("row 2"));
    }

    #[test]
    fn test_empty_rejected() {
        assert!(MatrixValue::from_rows(vec![]).is_err());
        assert!(MatrixValue::from_rows(vec![vec![]]).is_err());
    }

    #[test]
    fn test_single_row() {
        let m = MatrixValue::from_row(vec![Scalar::Int(1), Scalar::Float(2.5)]).unwrap();
        assert_eq!(m.shape(), Shape { rows: 1, cols: 2 });
    }

    #[test]
    fn test_display_as_literal() {
        let m = MatrixValue::from_rows(ints(&[&[1, 2], &[3, 4]])).unwrap();
        assert_eq!(m.to_string(), "[[1, 2], [3, 4]]");
    }

    #[test]
    fn test_serde_nested_rows() {
        let m = MatrixValue::from_rows(ints(&[&[1, 2], &[3, 4]])).unwrap();
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, "[[1,2],[3,4]]");

        let back: MatrixValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, m);

        let ragged: Result<MatrixValue, _> = serde_json::from_str("[[1,2],[3]]");
        assert!(ragged.is_err());
    }
}
