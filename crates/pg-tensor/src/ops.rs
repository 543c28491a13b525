//! Free-function entry points backed by the sequential [`CpuBackend`].
//!
//! ```
//! use pg_tensor::{multiply, Matrix};
//!
//! let a = Matrix::from_rows(&[[1.0f64, 2.0, 3.0], [4.0, 5.0, 6.0]]).unwrap();
//! let b = Matrix::from_rows(&[[7.0f64, 8.0], [9.0, 10.0], [11.0, 12.0]]).unwrap();
//! let c = multiply(&a, &b).unwrap();
//! assert_eq!(c.as_slice(), &[58.0, 64.0, 139.0, 154.0]);
//! ```

use crate::cpu::CpuBackend;
use crate::dtype::Element;
use crate::error::Result;
use crate::matrix::Matrix;
use crate::vector::Vector;

/// `a + b` element by element. Fails with `ShapeMismatch` if the lengths differ.
pub fn add<T: Element>(a: &Vector<T>, b: &Vector<T>) -> Result<Vector<T>> {
    a.add(b, &CpuBackend)
}

/// `a @ b`. Fails with `MatmulMismatch` if `a.cols() != b.rows()`.
pub fn multiply<T: Element>(a: &Matrix<T>, b: &Matrix<T>) -> Result<Matrix<T>> {
    a.matmul(b, &CpuBackend)
}

/// `a @ b` computed in `tile_size x tile_size` blocks. Same contract as
/// [`multiply`], plus `InvalidTileSize` if `tile_size == 0`.
pub fn multiply_tiled<T: Element>(a: &Matrix<T>, b: &Matrix<T>, tile_size: usize) -> Result<Matrix<T>> {
    a.matmul_tiled(b, tile_size, &CpuBackend)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add() {
        let a = Vector::from(vec![1.0f32, 2.0, 3.0]);
        let b = Vector::from(vec![4.0f32, 5.0, 6.0]);
        assert_eq!(add(&a, &b).unwrap().as_slice(), &[5.0, 7.0, 9.0]);
    }

    #[test]
    fn test_multiply_and_tiled_agree() {
        let a = Matrix::from_rows(&[[1.0f32, 2.0, 3.0], [4.0, 5.0, 6.0]]).unwrap();
        let b = Matrix::from_rows(&[[7.0f32, 8.0], [9.0, 10.0], [11.0, 12.0]]).unwrap();
        assert_eq!(multiply(&a, &b).unwrap(), multiply_tiled(&a, &b, 16).unwrap());
    }
}
