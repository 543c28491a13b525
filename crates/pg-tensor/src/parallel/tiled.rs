//! Shared-scratch tiled matmul expressed as a worker-group kernel.
//!
//! One group computes one `tile x tile` block of C, one lane per output
//! cell. For every tile of the shared `k` dimension the group:
//! 1. loads one A tile and one B tile into scratch (zero past the edges),
//! 2. syncs,
//! 3. accumulates each lane's partial dot product from scratch,
//! 4. syncs again before the next load overwrites scratch.

use pg_kernel::{ceil_div, launch, Kernel, LaunchConfig, Schedule, WorkerCtx};

use crate::dtype::Element;
use crate::error::Result;

pub(crate) struct TiledMatmul<'a, T> {
    a: &'a [T],
    b: &'a [T],
    m: usize,
    k: usize,
    n: usize,
    tile: usize,
}

impl<'a, T: Element> TiledMatmul<'a, T> {
    pub(crate) fn new(a: &'a [T], b: &'a [T], m: usize, k: usize, n: usize, tile: usize) -> Self {
        TiledMatmul { a, b, m, k, n, tile }
    }

    /// Run the kernel and scatter every group's cells into `c`.
    pub(crate) fn run_into(
        &self,
        c: &mut [T],
        group_threads: usize,
        schedule: Schedule,
    ) -> Result<()> {
        let config = LaunchConfig::tiled(self.m, self.n, self.tile)?.with_group_threads(group_threads);
        for group in launch(&config, schedule, self)? {
            for cells in group.workers {
                for (idx, value) in cells {
                    c[idx] = value;
                }
            }
        }
        Ok(())
    }

    fn a_at(&self, row: usize, col: usize) -> T {
        if row < self.m && col < self.k {
            self.a[row * self.k + col]
        } else {
            T::ZERO
        }
    }

    fn b_at(&self, row: usize, col: usize) -> T {
        if row < self.k && col < self.n {
            self.b[row * self.n + col]
        } else {
            T::ZERO
        }
    }
}

impl<T: Element> Kernel for TiledMatmul<'_, T> {
    type Value = T;
    /// `(flat index into C, value)` for every in-bounds lane of the worker.
    type Output = Vec<(usize, T)>;

    fn scratch_len(&self) -> usize {
        2 * self.tile * self.tile
    }

    fn run(&self, ctx: &WorkerCtx<'_, T>) -> pg_kernel::Result<Self::Output> {
        let t = self.tile;
        let b_base = t * t;
        let scratch = ctx.scratch();
        let row0 = ctx.block_idx().y * t;
        let col0 = ctx.block_idx().x * t;

        let lanes: Vec<_> = ctx.lanes().collect();
        let mut acc = vec![T::ZERO; lanes.len()];

        for kt in 0..ceil_div(self.k, t) {
            let k0 = kt * t;

            for lane in &lanes {
                let (tx, ty) = (lane.x, lane.y);
                scratch.store(ty * t + tx, self.a_at(row0 + ty, k0 + tx));
                scratch.store(b_base + ty * t + tx, self.b_at(k0 + ty, col0 + tx));
            }
            ctx.sync()?;

            for (lane, sum) in lanes.iter().zip(acc.iter_mut()) {
                let (tx, ty) = (lane.x, lane.y);
                let mut partial = T::ZERO;
                for p in 0..t {
                    partial += scratch.load(ty * t + p) * scratch.load(b_base + p * t + tx);
                }
                *sum += partial;
            }
            ctx.sync()?;
        }

        Ok(lanes
            .iter()
            .zip(acc)
            .filter_map(|(lane, value)| {
                let (row, col) = (row0 + lane.y, col0 + lane.x);
                (row < self.m && col < self.n).then_some((row * self.n + col, value))
            })
            .collect())
    }
}
