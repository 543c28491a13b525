use std::marker::PhantomData;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{KernelError, Result};

/// Values that can be kept in group scratch storage.
///
/// Scratch cells hold raw bits so that several workers may write disjoint
/// cells concurrently without locks.
pub trait ScratchValue: Copy + Send + Sync + 'static {
    fn to_bits64(self) -> u64;
    fn from_bits64(bits: u64) -> Self;
}

impl ScratchValue for f32 {
    fn to_bits64(self) -> u64 {
        u64::from(self.to_bits())
    }

    fn from_bits64(bits: u64) -> Self {
        f32::from_bits(bits as u32)
    }
}

impl ScratchValue for f64 {
    fn to_bits64(self) -> u64 {
        self.to_bits()
    }

    fn from_bits64(bits: u64) -> Self {
        f64::from_bits(bits)
    }
}

/// Fixed-size storage shared by the workers of one group.
///
/// Accesses use relaxed atomics; cross-worker visibility comes from the
/// group barrier, so a cell written in one phase must only be read after
/// the next `sync()`.
#[derive(Debug)]
pub struct Scratch<T: ScratchValue> {
    cells: Vec<AtomicU64>,
    _marker: PhantomData<T>,
}

impl<T: ScratchValue> Scratch<T> {
    /// Allocate `len` cells, all holding the bit pattern of zero.
    pub fn new(len: usize) -> Result<Self> {
        let mut cells = Vec::new();
        cells
            .try_reserve_exact(len)
            .map_err(|_| KernelError::ScratchExhausted { len })?;
        cells.extend((0..len).map(|_| AtomicU64::new(0)));
        Ok(Scratch {
            cells,
            _marker: PhantomData,
        })
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// # Panics
    /// Panics if `idx >= len()`.
    pub fn store(&self, idx: usize, value: T) {
        self.cells[idx].store(value.to_bits64(), Ordering::Relaxed);
    }

    /// # Panics
    /// Panics if `idx >= len()`.
    pub fn load(&self, idx: usize) -> T {
        T::from_bits64(self.cells[idx].load(Ordering::Relaxed))
    }
}
