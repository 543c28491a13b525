use std::fmt;
use std::ops::{Index, IndexMut};

use crate::backend::ComputeBackend;
use crate::dtype::Element;
use crate::error::{Result, TensorError};
use crate::shape::Shape;
use crate::storage;
use crate::verify;

/// A dense `rows x cols` matrix.
///
/// Holds contiguous, row-major data. Operations that require computation are
/// dispatched to a [`ComputeBackend`]; every result is a newly allocated
/// matrix independent of its operands.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix<T: Element> {
    data: Vec<T>,
    shape: Shape,
}

impl<T: Element> Matrix<T> {
    /// Create a matrix from row-major data.
    ///
    /// # Errors
    /// Returns `ShapeMismatch` if `data.len() != rows * cols`.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<T>) -> Result<Self> {
        let shape = Shape::new(rows, cols);
        if data.len() != shape.numel()? {
            return Err(TensorError::ShapeMismatch {
                expected: vec![rows, cols],
                got: vec![data.len()],
            });
        }
        Ok(Matrix { data, shape })
    }

    /// Create a matrix from a list of rows.
    ///
    /// An empty list gives a `0 x 0` matrix.
    ///
    /// # Errors
    /// Returns `ShapeMismatch` if the rows do not all have the same length.
    pub fn from_rows<R: AsRef<[T]>>(rows: &[R]) -> Result<Self> {
        let cols = rows.first().map_or(0, |r| r.as_ref().len());
        let mut data = Vec::new();
        for row in rows {
            let row = row.as_ref();
            if row.len() != cols {
                return Err(TensorError::ShapeMismatch {
                    expected: vec![cols],
                    got: vec![row.len()],
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Matrix {
            data,
            shape: Shape::new(rows.len(), cols),
        })
    }

    /// Create a zero-filled matrix.
    pub fn zeros(rows: usize, cols: usize) -> Result<Self> {
        let shape = Shape::new(rows, cols);
        Ok(Matrix {
            data: storage::zeroed_for(shape)?,
            shape,
        })
    }

    /// Create the `n x n` identity matrix.
    pub fn identity(n: usize) -> Result<Self> {
        let mut m = Self::zeros(n, n)?;
        for i in 0..n {
            m.data[i * n + i] = T::ONE;
        }
        Ok(m)
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

    pub fn get(&self, row: usize, col: usize) -> Option<T> {
        if row < self.shape.rows && col < self.shape.cols {
            Some(self.data[row * self.shape.cols + col])
        } else {
            None
        }
    }

    /// The elements of row `i`.
    ///
    /// # Panics
    /// Panics if `i >= rows()`.
    pub fn row(&self, i: usize) -> &[T] {
        assert!(i < self.shape.rows, "row {} out of range for {}", i, self.shape);
        let cols = self.shape.cols;
        &self.data[i * cols..(i + 1) * cols]
    }

    /// Returns the row-major data.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Matrix multiplication using the given backend.
    ///
    /// self is [m, k], other is [k, n], result is [m, n].
    pub fn matmul(&self, other: &Matrix<T>, backend: &dyn ComputeBackend<T>) -> Result<Matrix<T>> {
        let out = self.shape.matmul(&other.shape)?;
        let data = backend.matmul(&self.data, &other.data, out.rows, self.shape.cols, out.cols)?;
        Matrix::from_vec(out.rows, out.cols, data)
    }

    /// Tiled matrix multiplication with `tile x tile` blocks.
    pub fn matmul_tiled(
        &self,
        other: &Matrix<T>,
        tile: usize,
        backend: &dyn ComputeBackend<T>,
    ) -> Result<Matrix<T>> {
        if tile == 0 {
            return Err(TensorError::InvalidTileSize(tile));
        }
        let out = self.shape.matmul(&other.shape)?;
        let data = backend.matmul_tiled(
            &self.data,
            &other.data,
            out.rows,
            self.shape.cols,
            out.cols,
            tile,
        )?;
        Matrix::from_vec(out.rows, out.cols, data)
    }

    /// True if the shapes are equal and every pair of elements is within
    /// `rtol` (see [`verify::is_close`]).
    pub fn approx_eq(&self, other: &Matrix<T>, rtol: f64) -> bool {
        self.shape == other.shape && verify::all_close(&self.data, &other.data, rtol)
    }
}

impl<T: Element> Index<(usize, usize)> for Matrix<T> {
    type Output = T;

    fn index(&self, (row, col): (usize, usize)) -> &T {
        assert!(
            row < self.shape.rows && col < self.shape.cols,
            "index ({}, {}) out of range for {}",
            row,
            col,
            self.shape
        );
        &self.data[row * self.shape.cols + col]
    }
}

impl<T: Element> IndexMut<(usize, usize)> for Matrix<T> {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut T {
        assert!(
            row < self.shape.rows && col < self.shape.cols,
            "index ({}, {}) out of range for {}",
            row,
            col,
            self.shape
        );
        &mut self.data[row * self.shape.cols + col]
    }
}

/// One row per line, elements separated by spaces.
impl<T: Element> fmt::Display for Matrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for i in 0..self.shape.rows {
            for (j, v) in self.row(i).iter().enumerate() {
                if j > 0 {
                    write!(f, " ")?;
                }
                write!(f, "{}", v)?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
