//! Sequential matmul kernels used by `CpuBackend`.
//!
//! Both kernels write into a caller-allocated, zero-filled row-major `c`
//! of `m * n` elements. Operand lengths are validated by the caller.

use crate::dtype::Element;
use crate::error::Result;
use crate::storage;

/// Triple loop: each output cell is an independent left-to-right reduction
/// over `k`.
pub fn naive<T: Element>(a: &[T], b: &[T], c: &mut [T], m: usize, k: usize, n: usize) {
    for i in 0..m {
        for j in 0..n {
            let mut sum = T::ZERO;
            for p in 0..k {
                sum += a[i * k + p] * b[p * n + j];
            }
            c[i * n + j] = sum;
        }
    }
}

/// Blocked multiply over `tile x tile` pieces of `m`, `n` and `k`.
///
/// For every output tile, the matching pieces of `a` and `b` are copied into
/// local scratch tiles (zero-padded past the matrix edges), a partial sum is
/// formed per cell, and partial sums are accumulated across all `k` tiles
/// before the output tile is written back.
pub fn blocked<T: Element>(
    a: &[T],
    b: &[T],
    c: &mut [T],
    m: usize,
    k: usize,
    n: usize,
    tile: usize,
) -> Result<()> {
    let tile_len = tile * tile;
    let mut a_tile = storage::zeroed::<T>(tile_len)?;
    let mut b_tile = storage::zeroed::<T>(tile_len)?;
    let mut acc = storage::zeroed::<T>(tile_len)?;

    for i0 in (0..m).step_by(tile) {
        for j0 in (0..n).step_by(tile) {
            acc.fill(T::ZERO);

            for p0 in (0..k).step_by(tile) {
                // Load.
                for ty in 0..tile {
                    for tx in 0..tile {
                        let (row, col) = (i0 + ty, p0 + tx);
                        a_tile[ty * tile + tx] = if row < m && col < k {
                            a[row * k + col]
                        } else {
                            T::ZERO
                        };
                        let (row, col) = (p0 + ty, j0 + tx);
                        b_tile[ty * tile + tx] = if row < k && col < n {
                            b[row * n + col]
                        } else {
                            T::ZERO
                        };
                    }
                }

                // Consume.
                for ty in 0..tile {
                    for tx in 0..tile {
                        let mut partial = T::ZERO;
                        for p in 0..tile {
                            partial += a_tile[ty * tile + p] * b_tile[p * tile + tx];
                        }
                        acc[ty * tile + tx] += partial;
                    }
                }
            }

            let rows = tile.min(m - i0);
            let cols = tile.min(n - j0);
            for ty in 0..rows {
                let out = (i0 + ty) * n + j0;
                c[out..out + cols].copy_from_slice(&acc[ty * tile..ty * tile + cols]);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seq(len: usize, scale: f64) -> Vec<f64> {
        (0..len).map(|i| ((i * 7 + 3) % 11) as f64 * scale - 2.0).collect()
    }

    #[test]
    fn test_naive_rectangular() {
        let a = [1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0];
        let b = [7.0f32, 8.0, 9.0, 10.0, 11.0, 12.0];
        let mut c = vec![0.0f32; 4];
        naive(&a, &b, &mut c, 2, 3, 2);
        assert_eq!(c, vec![58.0, 64.0, 139.0, 154.0]);
    }

    #[test]
    fn test_blocked_matches_naive_on_ragged_edges() {
        let (m, k, n) = (5, 7, 3);
        let a = seq(m * k, 0.5);
        let b = seq(k * n, 0.25);
        let mut expected = vec![0.0; m * n];
        naive(&a, &b, &mut expected, m, k, n);

        for tile in [1, 2, 3, 4, 8] {
            let mut c = vec![0.0; m * n];
            blocked(&a, &b, &mut c, m, k, n, tile).unwrap();
            for (x, y) in expected.iter().zip(&c) {
                assert!((x - y).abs() < 1e-12, "tile {tile}: {x} != {y}");
            }
        }
    }

    #[test]
    fn test_blocked_empty_k_leaves_zeros() {
        let mut c = vec![0.0f32; 6];
        blocked(&[], &[], &mut c, 2, 0, 3, 4).unwrap();
        assert_eq!(c, vec![0.0; 6]);
    }
}
