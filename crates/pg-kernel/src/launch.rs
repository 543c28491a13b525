use std::panic::{self, AssertUnwindSafe};
use std::thread::{self, Scope, ScopedJoinHandle};

use rayon::prelude::*;
use tracing::{debug, trace};

use crate::barrier::{GroupBarrier, PoisonOnPanic};
use crate::dim::{ceil_div, Dim2};
use crate::error::{KernelError, Result};
use crate::scratch::Scratch;
use crate::worker::{Kernel, WorkerCtx};

/// How the groups of a launch are executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Schedule {
    /// One group at a time on the calling thread, one worker per group.
    /// Barriers degenerate to no-ops.
    Sequential,
    /// Groups run concurrently on the current rayon pool. Worker 0 of each
    /// group runs on the pool thread that picked the group up; its peers get
    /// freshly spawned scoped OS threads, so a launch spawns
    /// `groups * (workers - 1)` threads in total.
    #[default]
    Threaded,
}

/// Launch geometry: a grid of groups, each made of `block` logical lanes
/// executed by up to `group_threads` real workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchConfig {
    pub grid: Dim2,
    pub block: Dim2,
    pub group_threads: usize,
}

impl LaunchConfig {
    pub fn new(grid: Dim2, block: Dim2) -> Self {
        LaunchConfig {
            grid,
            block,
            group_threads: 1,
        }
    }

    /// Set the number of real workers per group. Builder-style.
    pub fn with_group_threads(mut self, group_threads: usize) -> Self {
        self.group_threads = group_threads;
        self
    }

    /// Geometry that covers a `rows x cols` output with square
    /// `tile x tile` groups, one lane per output cell.
    ///
    /// The grid's `x` axis walks output columns and `y` walks output rows.
    pub fn tiled(rows: usize, cols: usize, tile: usize) -> Result<Self> {
        if tile == 0 {
            return Err(KernelError::InvalidLaunch("tile size must be > 0".to_string()));
        }
        let block = Dim2::new(tile, tile);
        if block.checked_count().is_none() {
            return Err(KernelError::InvalidLaunch(format!(
                "tile size {} overflows the lane count",
                tile
            )));
        }
        let grid = Dim2::new(ceil_div(cols, tile), ceil_div(rows, tile));
        Ok(LaunchConfig::new(grid, block))
    }

    /// Logical lanes in each group.
    pub fn lanes_per_group(&self) -> usize {
        self.block.count()
    }

    /// Number of groups in the grid.
    pub fn groups(&self) -> usize {
        self.grid.count()
    }

    /// Real workers each group gets under `schedule`.
    pub fn workers_per_group(&self, schedule: Schedule) -> usize {
        match schedule {
            Schedule::Sequential => 1,
            Schedule::Threaded => self.group_threads.clamp(1, self.lanes_per_group().max(1)),
        }
    }

    fn validate(&self) -> Result<()> {
        match self.block.checked_count() {
            None => Err(KernelError::InvalidLaunch(format!(
                "block {} overflows the lane count",
                self.block
            ))),
            Some(0) => Err(KernelError::InvalidLaunch(format!(
                "block {} has no lanes",
                self.block
            ))),
            Some(_) if self.grid.checked_count().is_none() => Err(KernelError::InvalidLaunch(
                format!("grid {} overflows the group count", self.grid),
            )),
            Some(_) => Ok(()),
        }
    }
}

/// Outputs of one group, indexed by worker.
#[derive(Debug)]
pub struct GroupOutput<O> {
    pub block: Dim2,
    pub workers: Vec<O>,
}

/// Run `kernel` over every group of `config`.
///
/// The launch is all-or-nothing: if any worker fails or panics the whole
/// launch returns an error and no group outputs are produced. Group outputs
/// are returned in row-major grid order.
pub fn launch<K: Kernel>(
    config: &LaunchConfig,
    schedule: Schedule,
    kernel: &K,
) -> Result<Vec<GroupOutput<K::Output>>> {
    config.validate()?;
    let workers = config.workers_per_group(schedule);
    debug!(
        grid = %config.grid,
        block = %config.block,
        workers,
        ?schedule,
        "launching kernel"
    );

    match schedule {
        Schedule::Sequential => (0..config.groups())
            .map(|group| run_group(config, workers, group, kernel))
            .collect(),
        Schedule::Threaded => (0..config.groups())
            .into_par_iter()
            .map(|group| run_group(config, workers, group, kernel))
            .collect(),
    }
}

fn run_group<K: Kernel>(
    config: &LaunchConfig,
    workers: usize,
    group: usize,
    kernel: &K,
) -> Result<GroupOutput<K::Output>> {
    let block_idx = config.grid.unflatten(group);
    let scratch = Scratch::new(kernel.scratch_len())?;
    let barrier = GroupBarrier::new(workers);
    trace!(block = %block_idx, workers, "running group");

    let ctx = WorkerCtx {
        block_idx,
        block_dim: config.block,
        grid_dim: config.grid,
        worker: 0,
        workers,
        scratch: &scratch,
        barrier: &barrier,
    };

    if workers == 1 {
        return join_group(block_idx, run_inline(kernel, &ctx), Vec::new());
    }

    // Worker 0 runs on the calling thread; only its peers get OS threads.
    thread::scope(|s| {
        let mut handles = Vec::with_capacity(workers - 1);
        for worker in 1..workers {
            match spawn_worker(s, config, block_idx, worker, workers, &scratch, &barrier, kernel) {
                Ok(handle) => handles.push(handle),
                Err(source) => {
                    barrier.poison();
                    for handle in handles {
                        let _ = handle.join();
                    }
                    return Err(KernelError::Spawn {
                        block: block_idx,
                        worker,
                        source,
                    });
                }
            }
        }
        let first = run_inline(kernel, &ctx);
        join_group(block_idx, first, handles)
    })
}

/// Run one worker on the current thread, turning a panic into
/// `WorkerPanicked`. Any failure poisons the group barrier.
fn run_inline<K: Kernel>(kernel: &K, ctx: &WorkerCtx<'_, K::Value>) -> Result<K::Output> {
    match panic::catch_unwind(AssertUnwindSafe(|| kernel.run(ctx))) {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(err)) => {
            ctx.barrier.poison();
            Err(err)
        }
        Err(_) => {
            ctx.barrier.poison();
            Err(KernelError::WorkerPanicked {
                block: ctx.block_idx,
                worker: ctx.worker,
            })
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn spawn_worker<'scope, 'env, K: Kernel>(
    s: &'scope Scope<'scope, 'env>,
    config: &'env LaunchConfig,
    block_idx: Dim2,
    worker: usize,
    workers: usize,
    scratch: &'env Scratch<K::Value>,
    barrier: &'env GroupBarrier,
    kernel: &'env K,
) -> std::io::Result<ScopedJoinHandle<'scope, Result<K::Output>>> {
    thread::Builder::new()
        .name(format!("pg-group-{}.{}-w{}", block_idx.x, block_idx.y, worker))
        .spawn_scoped(s, move || {
            let _guard = PoisonOnPanic(barrier);
            let ctx = WorkerCtx {
                block_idx,
                block_dim: config.block,
                grid_dim: config.grid,
                worker,
                workers,
                scratch,
                barrier,
            };
            let result = kernel.run(&ctx);
            if result.is_err() {
                // Peers may be parked on the barrier waiting for us.
                barrier.poison();
            }
            result
        })
}

/// Collect worker 0's result and the spawned peers (workers `1..`) into one
/// group output, or the most informative failure among them.
fn join_group<O>(
    block: Dim2,
    first: Result<O>,
    handles: Vec<ScopedJoinHandle<'_, Result<O>>>,
) -> Result<GroupOutput<O>> {
    let mut outputs = Vec::with_capacity(handles.len() + 1);
    let mut failure: Option<KernelError> = None;

    let results = std::iter::once(first).chain(
        handles
            .into_iter()
            .enumerate()
            .map(|(i, handle)| match handle.join() {
                Ok(result) => result,
                Err(_) => Err(KernelError::WorkerPanicked {
                    block,
                    worker: i + 1,
                }),
            }),
    );
    for result in results {
        let err = match result {
            Ok(output) => {
                outputs.push(output);
                continue;
            }
            Err(err) => err,
        };
        failure = Some(match failure {
            Some(prev) if severity(&prev) <= severity(&err) => prev,
            _ => err,
        });
    }

    match failure {
        Some(err) => Err(err),
        None => Ok(GroupOutput {
            block,
            workers: outputs,
        }),
    }
}

/// Lower is more informative. `GroupAborted` only says a peer failed, so any
/// root cause wins over it.
fn severity(err: &KernelError) -> u8 {
    match err {
        KernelError::WorkerPanicked { .. } => 0,
        KernelError::Spawn { .. } => 1,
        KernelError::GroupAborted => 3,
        _ => 2,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Each lane writes its linear id into scratch; after the barrier every
    /// lane reads its mirror lane's value.
    struct MirrorKernel;

    impl Kernel for MirrorKernel {
        type Value = f64;
        type Output = Vec<(Dim2, f64)>;

        fn scratch_len(&self) -> usize {
            16
        }

        fn run(&self, ctx: &WorkerCtx<'_, f64>) -> Result<Self::Output> {
            let dim = ctx.block_dim();
            let lanes: Vec<Dim2> = ctx.lanes().collect();
            for &lane in &lanes {
                ctx.scratch().store(dim.flatten(lane), dim.flatten(lane) as f64);
            }
            ctx.sync()?;
            let last = dim.count() - 1;
            let out = lanes
                .iter()
                .map(|&lane| (lane, ctx.scratch().load(last - dim.flatten(lane))))
                .collect();
            ctx.sync()?;
            Ok(out)
        }
    }

    fn check_mirror(outputs: &[GroupOutput<Vec<(Dim2, f64)>>]) {
        let dim = Dim2::new(4, 4);
        let mut total = 0;
        for group in outputs {
            for worker in &group.workers {
                for &(lane, value) in worker {
                    assert_eq!(value, (15 - dim.flatten(lane)) as f64);
                    total += 1;
                }
            }
        }
        assert_eq!(total, outputs.len() * 16);
    }

    #[test]
    fn test_tiled_geometry() {
        let cfg = LaunchConfig::tiled(17, 33, 16).unwrap();
        assert_eq!(cfg.grid, Dim2::new(3, 2));
        assert_eq!(cfg.block, Dim2::new(16, 16));
        assert_eq!(cfg.groups(), 6);

        let empty = LaunchConfig::tiled(0, 5, 4).unwrap();
        assert_eq!(empty.groups(), 0);

        assert!(LaunchConfig::tiled(4, 4, 0).is_err());
        assert!(LaunchConfig::tiled(4, 4, usize::MAX).is_err());
    }

    #[test]
    fn test_workers_per_group_is_clamped() {
        let cfg = LaunchConfig::new(Dim2::new(1, 1), Dim2::new(2, 2)).with_group_threads(64);
        assert_eq!(cfg.workers_per_group(Schedule::Threaded), 4);
        assert_eq!(cfg.workers_per_group(Schedule::Sequential), 1);
        let cfg = cfg.with_group_threads(0);
        assert_eq!(cfg.workers_per_group(Schedule::Threaded), 1);
    }

    #[test]
    fn test_sequential_launch() {
        let cfg = LaunchConfig::new(Dim2::new(3, 2), Dim2::new(4, 4));
        let outputs = launch(&cfg, Schedule::Sequential, &MirrorKernel).unwrap();
        assert_eq!(outputs.len(), 6);
        assert_eq!(outputs[4].block, Dim2::new(1, 1));
        check_mirror(&outputs);
    }

    #[test]
    fn test_threaded_launch_with_coarsening() {
        for group_threads in [2, 3, 16] {
            let cfg = LaunchConfig::new(Dim2::new(2, 2), Dim2::new(4, 4))
                .with_group_threads(group_threads);
            let outputs = launch(&cfg, Schedule::Threaded, &MirrorKernel).unwrap();
            assert_eq!(outputs.len(), 4);
            for group in &outputs {
                assert_eq!(group.workers.len(), group_threads);
            }
            check_mirror(&outputs);
        }
    }

    #[test]
    fn test_empty_block_is_rejected() {
        let cfg = LaunchConfig::new(Dim2::new(1, 1), Dim2::new(0, 4));
        assert!(matches!(
            launch(&cfg, Schedule::Sequential, &MirrorKernel),
            Err(KernelError::InvalidLaunch(_))
        ));
    }

    /// Panics on one worker of one group; everyone else syncs twice.
    struct FaultyKernel {
        block: Dim2,
        worker: usize,
    }

    impl Kernel for FaultyKernel {
        type Value = f32;
        type Output = ();

        fn scratch_len(&self) -> usize {
            0
        }

        fn run(&self, ctx: &WorkerCtx<'_, f32>) -> Result<()> {
            if ctx.block_idx() == self.block && ctx.worker() == self.worker {
                panic!("simulated device fault");
            }
            ctx.sync()?;
            ctx.sync()
        }
    }

    #[test]
    fn test_worker_panic_fails_the_launch() {
        let cfg = LaunchConfig::new(Dim2::new(1, 1), Dim2::new(2, 2)).with_group_threads(4);
        for worker in [0, 1] {
            let kernel = FaultyKernel {
                block: Dim2::new(0, 0),
                worker,
            };
            let err = launch(&cfg, Schedule::Threaded, &kernel).unwrap_err();
            assert!(matches!(err, KernelError::WorkerPanicked { worker: w, .. } if w == worker));
            assert!(err.is_environment_failure());
        }
    }

    #[test]
    fn test_sequential_worker_panic_fails_the_launch() {
        let cfg = LaunchConfig::new(Dim2::new(2, 2), Dim2::new(2, 2));
        let kernel = FaultyKernel {
            block: Dim2::new(1, 0),
            worker: 0,
        };
        let err = launch(&cfg, Schedule::Sequential, &kernel).unwrap_err();
        assert!(matches!(
            err,
            KernelError::WorkerPanicked { block, worker: 0 } if block == Dim2::new(1, 0)
        ));

        // One lane per group takes the same single-worker path when threaded.
        let cfg = LaunchConfig::new(Dim2::new(2, 1), Dim2::new(1, 1)).with_group_threads(4);
        let err = launch(&cfg, Schedule::Threaded, &kernel).unwrap_err();
        assert!(matches!(err, KernelError::WorkerPanicked { worker: 0, .. }));
    }

    struct ThreadNameKernel;

    impl Kernel for ThreadNameKernel {
        type Value = f32;
        type Output = Option<String>;

        fn scratch_len(&self) -> usize {
            0
        }

        fn run(&self, ctx: &WorkerCtx<'_, f32>) -> Result<Option<String>> {
            ctx.sync()?;
            Ok(thread::current().name().map(str::to_string))
        }
    }

    #[test]
    fn test_worker_zero_runs_on_the_launching_thread() {
        let cfg = LaunchConfig::new(Dim2::new(2, 1), Dim2::new(2, 2)).with_group_threads(3);
        let outputs = launch(&cfg, Schedule::Threaded, &ThreadNameKernel).unwrap();
        for group in &outputs {
            assert_eq!(group.workers.len(), 3);
            let spawned = |name: &Option<String>| {
                name.as_deref().is_some_and(|n| n.starts_with("pg-group-"))
            };
            assert!(!spawned(&group.workers[0]));
            assert!(group.workers[1..].iter().all(spawned));
        }
    }
}
