//! `pg-tensor` - Vectors, matrices and pluggable matmul backends for parallel-gemm.
//!
//! This crate provides:
//! - `Vector` and `Matrix` types over `f32` / `f64`
//! - A `ComputeBackend` trait for pluggable compute
//! - A sequential reference `CpuBackend` (naive and blocked matmul)
//! - A thread-pool `ParallelBackend` (parallel-for matmul, worker-group tiled matmul)
//! - Shape validation, verification helpers and runtime configuration

pub mod backend;
pub mod config;
pub mod cpu;
pub mod dtype;
pub mod error;
pub mod matrix;
pub mod ops;
pub mod parallel;
pub mod shape;
pub mod storage;
pub mod vector;
pub mod verify;

// Re-export primary types at the crate root for convenience.
pub use backend::{BinaryOp, ComputeBackend};
pub use config::ComputeConfig;
pub use cpu::CpuBackend;
pub use dtype::{DType, Element};
pub use error::{ErrorKind, Result, TensorError};
pub use matrix::Matrix;
pub use ops::{add, multiply, multiply_tiled};
pub use parallel::ParallelBackend;
pub use shape::Shape;
pub use vector::Vector;
