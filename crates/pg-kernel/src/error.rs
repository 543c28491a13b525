use thiserror::Error;

use crate::dim::Dim2;

#[derive(Error, Debug)]
pub enum KernelError {
    #[error("invalid launch configuration: {0}")]
    InvalidLaunch(String),
    #[error("cannot allocate {len} scratch cells for a worker group")]
    ScratchExhausted { len: usize },
    #[error("failed to spawn worker {worker} for group {block}: {source}")]
    Spawn {
        block: Dim2,
        worker: usize,
        #[source]
        source: std::io::Error,
    },
    #[error("worker {worker} of group {block} panicked")]
    WorkerPanicked { block: Dim2, worker: usize },
    #[error("worker group aborted: a peer left the barrier")]
    GroupAborted,
}

impl KernelError {
    /// Returns true if the error means the execution environment itself failed,
    /// as opposed to a bad launch request or an allocation limit.
    pub fn is_environment_failure(&self) -> bool {
        matches!(
            self,
            KernelError::Spawn { .. } | KernelError::WorkerPanicked { .. } | KernelError::GroupAborted
        )
    }
}

pub type Result<T> = std::result::Result<T, KernelError>;
