pub mod elementwise;
pub mod matmul;

use tracing::debug;

use crate::backend::{BinaryOp, ComputeBackend};
use crate::dtype::Element;
use crate::error::{Result, TensorError};
use crate::storage;

/// Pure-Rust sequential compute backend.
///
/// Implements all operations with straightforward loops on the calling
/// thread. Intended as the reference implementation that the parallel
/// backend is checked against.
#[derive(Debug, Clone)]
pub struct CpuBackend;

impl CpuBackend {
    pub fn new() -> Self {
        CpuBackend
    }
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Element> ComputeBackend<T> for CpuBackend {
    fn name(&self) -> &str {
        "cpu"
    }

    fn elementwise(&self, a: &[T], b: &[T], op: BinaryOp) -> Result<Vec<T>> {
        storage::check_same_len(a, b)?;
        Ok(elementwise::zip(a, b, op))
    }

    fn scale(&self, a: &[T], s: T) -> Result<Vec<T>> {
        Ok(elementwise::scale(a, s))
    }

    fn matmul(&self, a: &[T], b: &[T], m: usize, k: usize, n: usize) -> Result<Vec<T>> {
        let out = storage::check_matmul_operands(a, b, m, k, n)?;
        debug!(m, k, n, dtype = %T::DTYPE, backend = "cpu", "matmul");

        let mut c = storage::zeroed_for::<T>(out)?;
        matmul::naive(a, b, &mut c, m, k, n);
        Ok(c)
    }

    fn matmul_tiled(
        &self,
        a: &[T],
        b: &[T],
        m: usize,
        k: usize,
        n: usize,
        tile: usize,
    ) -> Result<Vec<T>> {
        if tile == 0 {
            return Err(TensorError::InvalidTileSize(tile));
        }
        let out = storage::check_matmul_operands(a, b, m, k, n)?;
        let tile = storage::effective_tile(tile, m, k, n);
        if tile.checked_mul(tile).is_none() {
            return Err(TensorError::SizeOverflow {
                rows: tile,
                cols: tile,
            });
        }
        debug!(m, k, n, tile, dtype = %T::DTYPE, backend = "cpu", "tiled matmul");

        let mut c = storage::zeroed_for::<T>(out)?;
        matmul::blocked(a, b, &mut c, m, k, n, tile)?;
        Ok(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn backend() -> CpuBackend {
        CpuBackend::new()
    }

    #[test]
    fn test_matmul_identity() {
        let b = backend();
        // 2x2 identity @ [1,2;3,4]
        let a = vec![1.0f32, 0.0, 0.0, 1.0];
        let x = vec![1.0, 2.0, 3.0, 4.0];
        let c = b.matmul(&a, &x, 2, 2, 2).unwrap();
        assert_eq!(c, vec![1.0, 2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_matmul_basic() {
        let b = backend();
        // [1,2;3,4] @ [5,6;7,8] = [19,22;43,50]
        let a = vec![1.0f64, 2.0, 3.0, 4.0];
        let x = vec![5.0, 6.0, 7.0, 8.0];
        let c = b.matmul(&a, &x, 2, 2, 2).unwrap();
        assert_eq!(c, vec![19.0, 22.0, 43.0, 50.0]);
    }

    #[test]
    fn test_matmul_tiled_basic() {
        let b = backend();
        let a = vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0];
        let x = vec![7.0, 8.0, 9.0, 10.0, 11.0, 12.0];
        for tile in [1, 2, 16] {
            let c = b.matmul_tiled(&a, &x, 2, 3, 2, tile).unwrap();
            assert_eq!(c, vec![58.0, 64.0, 139.0, 154.0]);
        }
    }

    #[test]
    fn test_matmul_tiled_zero_tile() {
        let b = backend();
        let err = b.matmul_tiled(&[1.0f32], &[1.0], 1, 1, 1, 0).unwrap_err();
        assert!(matches!(err, TensorError::InvalidTileSize(0)));
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_matmul_tiled_tile_larger_than_operands() {
        let b = backend();
        assert_eq!(b.matmul_tiled(&[3.0f32], &[2.0], 1, 1, 1, 4096).unwrap(), vec![6.0]);
        assert_eq!(b.matmul_tiled(&[3.0f64], &[2.0], 1, 1, 1, usize::MAX).unwrap(), vec![6.0]);
    }

    #[test]
    fn test_matmul_buffer_length_mismatch() {
        let b = backend();
        let err = b.matmul(&[1.0f32, 2.0, 3.0], &[1.0, 2.0], 2, 2, 1).unwrap_err();
        assert!(matches!(err, TensorError::BufferLength { name: "matmul lhs", .. }));
    }

    #[test]
    fn test_matmul_empty() {
        let b = backend();
        let c: Vec<f32> = b.matmul(&[], &[0.0; 6], 0, 3, 2).unwrap();
        assert!(c.is_empty());
        let c: Vec<f32> = b.matmul(&[], &[], 2, 0, 2).unwrap();
        assert_eq!(c, vec![0.0; 4]);
    }

    #[test]
    fn test_add() {
        let b = backend();
        let r = b.add(&[1.0f32, 2.0], &[3.0, 4.0]).unwrap();
        assert_eq!(r, vec![4.0, 6.0]);
    }

    #[test]
    fn test_mul() {
        let b = backend();
        let r = b.mul(&[2.0f64, 3.0], &[4.0, 5.0]).unwrap();
        assert_eq!(r, vec![8.0, 15.0]);
    }

    #[test]
    fn test_scale() {
        let b = backend();
        let r = b.scale(&[1.0f32, 2.0, 3.0], 2.0).unwrap();
        assert_eq!(r, vec![2.0, 4.0, 6.0]);
    }

    #[test]
    fn test_add_length_mismatch() {
        let b = backend();
        let err = ComputeBackend::<f32>::add(&b, &[1.0], &[1.0, 2.0]).unwrap_err();
        assert!(err.is_shape_mismatch());
    }

    #[test]
    fn test_dyn_dispatch() {
        let backend: &dyn ComputeBackend<f64> = &CpuBackend;
        assert_eq!(backend.name(), "cpu");
        assert_eq!(backend.elementwise(&[1.0], &[2.0], BinaryOp::Sub).unwrap(), vec![-1.0]);
    }
}
