use crate::barrier::GroupBarrier;
use crate::dim::Dim2;
use crate::error::Result;
use crate::scratch::{Scratch, ScratchValue};

/// A computation executed by every worker of every group in a launch.
///
/// All workers of a group share one [`Scratch`] of `scratch_len()` cells and
/// one barrier. A kernel must call [`WorkerCtx::sync`] the same number of
/// times on every worker of a group, or the group deadlocks.
pub trait Kernel: Sync {
    /// Element type kept in group scratch storage.
    type Value: ScratchValue;
    /// What one worker hands back to the host when it finishes.
    type Output: Send;

    /// Number of scratch cells each group needs.
    fn scratch_len(&self) -> usize;

    fn run(&self, ctx: &WorkerCtx<'_, Self::Value>) -> Result<Self::Output>;
}

/// Everything one worker can see while running a kernel.
#[derive(Debug)]
pub struct WorkerCtx<'g, T: ScratchValue> {
    pub(crate) block_idx: Dim2,
    pub(crate) block_dim: Dim2,
    pub(crate) grid_dim: Dim2,
    pub(crate) worker: usize,
    pub(crate) workers: usize,
    pub(crate) scratch: &'g Scratch<T>,
    pub(crate) barrier: &'g GroupBarrier,
}

impl<'g, T: ScratchValue> WorkerCtx<'g, T> {
    /// Index of this worker's group within the grid.
    pub fn block_idx(&self) -> Dim2 {
        self.block_idx
    }

    /// Logical lanes per group.
    pub fn block_dim(&self) -> Dim2 {
        self.block_dim
    }

    pub fn grid_dim(&self) -> Dim2 {
        self.grid_dim
    }

    /// Index of this worker inside its group, in `0..workers()`.
    pub fn worker(&self) -> usize {
        self.worker
    }

    /// Number of real workers executing this group.
    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Lanes (logical threads) owned by this worker.
    ///
    /// Lanes are dealt round-robin: worker `w` of `G` owns linear lanes
    /// `w, w + G, w + 2G, ...`. Across a group every lane is owned exactly once.
    pub fn lanes(&self) -> impl Iterator<Item = Dim2> + 'static {
        let block_dim = self.block_dim;
        (self.worker..block_dim.count())
            .step_by(self.workers)
            .map(move |linear| block_dim.unflatten(linear))
    }

    pub fn scratch(&self) -> &'g Scratch<T> {
        self.scratch
    }

    /// Wait for every worker of the group. Scratch writes made before the
    /// call are visible to all workers after it.
    pub fn sync(&self) -> Result<()> {
        self.barrier.wait().map(|_| ())
    }
}
