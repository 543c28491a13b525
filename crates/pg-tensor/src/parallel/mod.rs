mod tiled;

use std::fmt;

use pg_kernel::Schedule;
use rayon::prelude::*;
use tracing::debug;

use crate::backend::{BinaryOp, ComputeBackend};
use crate::config::ComputeConfig;
use crate::dtype::Element;
use crate::error::{Result, TensorError};
use crate::storage;

use self::tiled::TiledMatmul;

/// Thread-pool compute backend.
///
/// Owns a dedicated rayon pool. Element-wise operations and naive matmul
/// are parallel-for loops over output elements (one row of C per task).
/// Tiled matmul launches one cooperating worker group per output tile, each
/// group sharing scratch storage and synchronizing on a barrier between
/// loading and consuming every tile.
pub struct ParallelBackend {
    pool: rayon::ThreadPool,
    config: ComputeConfig,
}

impl ParallelBackend {
    /// Create a backend from the given configuration.
    ///
    /// # Errors
    /// Returns an error if the configuration is invalid or the thread pool
    /// cannot be created.
    pub fn new(config: ComputeConfig) -> Result<Self> {
        config.validate()?;
        let mut builder =
            rayon::ThreadPoolBuilder::new().thread_name(|idx| format!("pg-compute-{}", idx));
        if let Some(n) = config.num_threads {
            builder = builder.num_threads(n);
        }
        let pool = builder.build()?;
        debug!(threads = pool.current_num_threads(), ?config, "parallel backend ready");
        Ok(ParallelBackend { pool, config })
    }

    /// Create a backend with default configuration.
    pub fn with_defaults() -> Result<Self> {
        Self::new(ComputeConfig::default())
    }

    /// The configuration this backend was created with.
    pub fn config(&self) -> &ComputeConfig {
        &self.config
    }

    /// Number of threads in the backend's pool.
    pub fn num_threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Tiled matmul using the configured tile size.
    pub fn matmul_tiled_default<T: Element>(
        &self,
        a: &[T],
        b: &[T],
        m: usize,
        k: usize,
        n: usize,
    ) -> Result<Vec<T>> {
        self.matmul_tiled(a, b, m, k, n, self.config.tile_size)
    }
}

impl fmt::Debug for ParallelBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParallelBackend")
            .field("threads", &self.pool.current_num_threads())
            .field("config", &self.config)
            .finish()
    }
}

impl<T: Element> ComputeBackend<T> for ParallelBackend {
    fn name(&self) -> &str {
        "parallel"
    }

    fn elementwise(&self, a: &[T], b: &[T], op: BinaryOp) -> Result<Vec<T>> {
        storage::check_same_len(a, b)?;
        let mut out = storage::zeroed::<T>(a.len())?;
        self.pool.install(|| {
            out.par_iter_mut()
                .zip(a.par_iter().zip(b.par_iter()))
                .for_each(|(o, (&x, &y))| *o = op.apply(x, y));
        });
        Ok(out)
    }

    fn scale(&self, a: &[T], s: T) -> Result<Vec<T>> {
        let mut out = storage::zeroed::<T>(a.len())?;
        self.pool.install(|| {
            out.par_iter_mut()
                .zip(a.par_iter())
                .for_each(|(o, &x)| *o = x * s);
        });
        Ok(out)
    }

    fn matmul(&self, a: &[T], b: &[T], m: usize, k: usize, n: usize) -> Result<Vec<T>> {
        let out = storage::check_matmul_operands(a, b, m, k, n)?;
        debug!(m, k, n, dtype = %T::DTYPE, backend = "parallel", "matmul");

        let mut c = storage::zeroed_for::<T>(out)?;
        if out.is_empty() {
            return Ok(c);
        }
        self.pool.install(|| {
            c.par_chunks_mut(n).enumerate().for_each(|(i, row)| {
                let a_row = &a[i * k..(i + 1) * k];
                for (j, cell) in row.iter_mut().enumerate() {
                    let mut sum = T::ZERO;
                    for (p, &x) in a_row.iter().enumerate() {
                        sum += x * b[p * n + j];
                    }
                    *cell = sum;
                }
            });
        });
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
        if tile.checked_mul(tile).and_then(|t2| t2.checked_mul(2)).is_none() {
            return Err(TensorError::SizeOverflow {
                rows: tile,
                cols: tile,
            });
        }
        debug!(
            m,
            k,
            n,
            tile,
            group_threads = self.config.group_threads,
            dtype = %T::DTYPE,
            backend = "parallel",
            "tiled matmul"
        );

        let mut c = storage::zeroed_for::<T>(out)?;
        let kernel = TiledMatmul::new(a, b, m, k, n, tile);
        self.pool
            .install(|| kernel.run_into(&mut c, self.config.group_threads, Schedule::Threaded))?;
        Ok(c)
    }
}
