use crate::error::{Result, TensorError};
use std::fmt;

/// The dimensions of a matrix: `rows x cols`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Shape {
    pub rows: usize,
    pub cols: usize,
}

impl Shape {
    pub fn new(rows: usize, cols: usize) -> Self {
        Shape { rows, cols }
    }

    /// Total number of elements.
    ///
    /// # Errors
    /// Returns `SizeOverflow` if `rows * cols` does not fit in a `usize`.
    pub fn numel(&self) -> Result<usize> {
        self.rows
            .checked_mul(self.cols)
            .ok_or(TensorError::SizeOverflow {
                rows: self.rows,
                cols: self.cols,
            })
    }

    /// Returns true if the shape holds no elements.
    pub fn is_empty(&self) -> bool {
        self.rows == 0 || self.cols == 0
    }

    /// Shape of `self @ rhs`.
    ///
    /// Requires `self.cols == rhs.rows`; the result is `self.rows x rhs.cols`.
    pub fn matmul(&self, rhs: &Shape) -> Result<Shape> {
        if self.cols != rhs.rows {
            return Err(TensorError::MatmulMismatch {
                m: self.rows,
                k: self.cols,
                k2: rhs.rows,
                n: rhs.cols,
            });
        }
        Ok(Shape::new(self.rows, rhs.cols))
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}x{}]", self.rows, self.cols)
    }
}
