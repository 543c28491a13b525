use std::fmt;
use std::ops::Index;

use crate::backend::{BinaryOp, ComputeBackend};
use crate::dtype::Element;
use crate::error::Result;
use crate::storage;
use crate::verify;

/// A fixed-length sequence of elements.
#[derive(Debug, Clone, PartialEq)]
pub struct Vector<T: Element> {
    data: Vec<T>,
}

impl<T: Element> Vector<T> {
    pub fn from_vec(data: Vec<T>) -> Self {
        Vector { data }
    }

    pub fn from_slice(data: &[T]) -> Self {
        Vector {
            data: data.to_vec(),
        }
    }

    /// Create a zero-filled vector of `len` elements.
    pub fn zeros(len: usize) -> Result<Self> {
        Ok(Vector {
            data: storage::zeroed(len)?,
        })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn get(&self, i: usize) -> Option<T> {
        self.data.get(i).copied()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub fn into_vec(self) -> Vec<T> {
        self.data
    }

    /// Element-wise `op` of two vectors of equal length on the given backend.
    pub fn elementwise(
        &self,
        other: &Vector<T>,
        op: BinaryOp,
        backend: &dyn ComputeBackend<T>,
    ) -> Result<Vector<T>> {
        Ok(Vector::from_vec(backend.elementwise(&self.data, &other.data, op)?))
    }

    /// Element-wise sum of two vectors of equal length.
    pub fn add(&self, other: &Vector<T>, backend: &dyn ComputeBackend<T>) -> Result<Vector<T>> {
        Ok(Vector::from_vec(backend.add(&self.data, &other.data)?))
    }

    /// Combine two vectors of equal length with an arbitrary operator,
    /// sequentially on the calling thread.
    pub fn zip_with<F>(&self, other: &Vector<T>, f: F) -> Result<Vector<T>>
    where
        F: Fn(T, T) -> T,
    {
        storage::check_same_len(&self.data, &other.data)?;
        Ok(Vector::from_vec(
            self.data
                .iter()
                .zip(&other.data)
                .map(|(&a, &b)| f(a, b))
                .collect(),
        ))
    }

    /// True if both vectors have the same length and every pair of elements
    /// is within `rtol` (see [`verify::is_close`]).
    pub fn approx_eq(&self, other: &Vector<T>, rtol: f64) -> bool {
        verify::all_close(&self.data, &other.data, rtol)
    }
}

impl<T: Element> From<Vec<T>> for Vector<T> {
    fn from(data: Vec<T>) -> Self {
        Vector::from_vec(data)
    }
}

impl<T: Element> Index<usize> for Vector<T> {
    type Output = T;

    fn index(&self, i: usize) -> &T {
        &self.data[i]
    }
}

impl<T: Element> fmt::Display for Vector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, v) in self.data.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", v)?;
        }
        write!(f, "]")
    }
}
