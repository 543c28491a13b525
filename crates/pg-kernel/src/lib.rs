//! `pg-kernel` - Data-parallel launch model for parallel-gemm.
//!
//! This crate provides:
//! - Launch geometry (`Dim2`, `LaunchConfig`) covering an output with groups
//! - A `Kernel` trait run by every worker of every group
//! - Group-local `Scratch` storage and a poisonable `GroupBarrier`
//! - `launch`, executing groups sequentially or on real threads

pub mod barrier;
pub mod dim;
pub mod error;
pub mod launch;
pub mod scratch;
pub mod worker;

pub use barrier::GroupBarrier;
pub use dim::{ceil_div, Dim2};
pub use error::{KernelError, Result};
pub use launch::{launch, GroupOutput, LaunchConfig, Schedule};
pub use scratch::{Scratch, ScratchValue};
pub use worker::{Kernel, WorkerCtx};
