use std::fmt::Debug;

use crate::dtype::Element;
use crate::error::Result;

/// Binary operator applied position-by-position by
/// [`ComputeBackend::elementwise`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    #[inline]
    pub fn apply<T: Element>(self, a: T, b: T) -> T {
        match self {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div => a / b,
        }
    }
}

/// Trait for pluggable compute backends (sequential CPU, thread pool, ...).
///
/// Data is passed in as row-major slices and returned as freshly allocated
/// vectors. A backend validates buffer lengths against the given dimensions
/// before computing and never returns a partial result.
pub trait ComputeBackend<T: Element>: Send + Sync + Debug {
    /// Returns the name of this backend (e.g., "cpu", "parallel").
    fn name(&self) -> &str;

    /// `result[i] = op(a[i], b[i])`.
    ///
    /// Fails with `ShapeMismatch` if the lengths differ.
    fn elementwise(&self, a: &[T], b: &[T], op: BinaryOp) -> Result<Vec<T>>;

    /// Element-wise addition: result[i] = a[i] + b[i].
    fn add(&self, a: &[T], b: &[T]) -> Result<Vec<T>> {
        self.elementwise(a, b, BinaryOp::Add)
    }

    /// Element-wise multiplication: result[i] = a[i] * b[i].
    fn mul(&self, a: &[T], b: &[T]) -> Result<Vec<T>> {
        self.elementwise(a, b, BinaryOp::Mul)
    }

    /// Scalar multiplication: result[i] = a[i] * s.
    fn scale(&self, a: &[T], s: T) -> Result<Vec<T>>;

    /// Matrix multiplication: C = A @ B.
    ///
    /// - `a`: row-major data of shape [m, k]
    /// - `b`: row-major data of shape [k, n]
    /// - Returns: row-major data of shape [m, n]
    fn matmul(&self, a: &[T], b: &[T], m: usize, k: usize, n: usize) -> Result<Vec<T>>;

    /// Tiled matrix multiplication with square `tile x tile` blocks.
    ///
    /// Same contract as [`matmul`](Self::matmul); the result agrees with it
    /// up to floating-point rounding. Fails with `InvalidTileSize` if
    /// `tile == 0`.
    fn matmul_tiled(
        &self,
        a: &[T],
        b: &[T],
        m: usize,
        k: usize,
        n: usize,
        tile: usize,
    ) -> Result<Vec<T>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_binary_op_apply() {
        assert_eq!(BinaryOp::Add.apply(2.0f32, 3.0), 5.0);
        assert_eq!(BinaryOp::Sub.apply(2.0f64, 3.0), -1.0);
        assert_eq!(BinaryOp::Mul.apply(2.0f32, 3.0), 6.0);
        assert_eq!(BinaryOp::Div.apply(3.0f64, 2.0), 1.5);
    }
}
