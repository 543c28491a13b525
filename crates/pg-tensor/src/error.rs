use pg_kernel::KernelError;
use thiserror::Error;

use crate::dtype::DType;

#[derive(Error, Debug)]
pub enum TensorError {
    #[error("shape mismatch: expected {expected:?}, got {got:?}")]
    ShapeMismatch { expected: Vec<usize>, got: Vec<usize> },
    #[error("matmul dimension mismatch: [{m}x{k}] @ [{k2}x{n}]")]
    MatmulMismatch {
        m: usize,
        k: usize,
        k2: usize,
        n: usize,
    },
    #[error("{name}: buffer holds {len} elements but the shape needs {expected}")]
    BufferLength {
        name: &'static str,
        len: usize,
        expected: usize,
    },
    #[error("invalid tile size {0}: must be > 0")]
    InvalidTileSize(usize),
    #[error("cannot allocate {elements} {dtype} elements")]
    ResourceExhaustion { elements: usize, dtype: DType },
    #[error("size of [{rows}x{cols}] overflows usize")]
    SizeOverflow { rows: usize, cols: usize },
    #[error("configuration error: {0}")]
    Config(String),
    #[error("kernel launch failed: {0}")]
    Kernel(#[from] KernelError),
    #[error("failed to build thread pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),
}

/// Broad classes of [`TensorError`], for callers that only care about how to
/// react rather than what exactly went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Operand dimensions are incompatible. Fix the input and retry.
    ShapeMismatch,
    /// Not enough memory for operands, results or scratch storage.
    ResourceExhaustion,
    /// The execution environment is broken. No partial result exists.
    FatalEnvironment,
    /// A parameter other than a shape is out of range.
    InvalidArgument,
}

impl TensorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TensorError::ShapeMismatch { .. }
            | TensorError::MatmulMismatch { .. }
            | TensorError::BufferLength { .. } => ErrorKind::ShapeMismatch,
            TensorError::ResourceExhaustion { .. }
            | TensorError::SizeOverflow { .. }
            | TensorError::Kernel(KernelError::ScratchExhausted { .. }) => {
                ErrorKind::ResourceExhaustion
            }
            TensorError::InvalidTileSize(_)
            | TensorError::Config(_)
            | TensorError::Kernel(KernelError::InvalidLaunch(_)) => ErrorKind::InvalidArgument,
            TensorError::Kernel(_) | TensorError::ThreadPool(_) => ErrorKind::FatalEnvironment,
        }
    }

    pub fn is_shape_mismatch(&self) -> bool {
        self.kind() == ErrorKind::ShapeMismatch
    }

    pub fn is_fatal(&self) -> bool {
        self.kind() == ErrorKind::FatalEnvironment
    }
}

pub type Result<T> = std::result::Result<T, TensorError>;

#[cfg(test)]
mod tests {
    use super::*;
    use pg_kernel::Dim2;

    #[test]
    fn test_kinds() {
        let e = TensorError::MatmulMismatch { m: 2, k: 3, k2: 4, n: 2 };
        assert!(e.is_shape_mismatch());
        assert_eq!(e.to_string(), "matmul dimension mismatch: [2x3] @ [4x2]");

        let e = TensorError::ResourceExhaustion { elements: 10, dtype: DType::F64 };
        assert_eq!(e.kind(), ErrorKind::ResourceExhaustion);
        assert_eq!(e.to_string(), "cannot allocate 10 f64 elements");

        let e: TensorError = KernelError::ScratchExhausted { len: 8 }.into();
        assert_eq!(e.kind(), ErrorKind::ResourceExhaustion);

        let e: TensorError = KernelError::WorkerPanicked { block: Dim2::new(0, 1), worker: 2 }.into();
        assert!(e.is_fatal());

        assert_eq!(TensorError::InvalidTileSize(0).kind(), ErrorKind::InvalidArgument);
    }
}
