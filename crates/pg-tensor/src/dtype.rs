use std::fmt;
use std::ops::{Add, AddAssign, Div, Mul, Sub};

use pg_kernel::ScratchValue;

/// Supported element types for vectors and matrices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    /// 32-bit floating point.
    F32,
    /// 64-bit floating point.
    F64,
}

impl DType {
    /// Returns the size in bytes of a single element.
    pub fn size_in_bytes(&self) -> usize {
        match self {
            DType::F32 => 4,
            DType::F64 => 8,
        }
    }

    /// Relative tolerance used when comparing results computed with
    /// different summation orders.
    pub fn default_tolerance(&self) -> f64 {
        match self {
            DType::F32 => 1e-4,
            DType::F64 => 1e-9,
        }
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DType::F32 => write!(f, "f32"),
            DType::F64 => write!(f, "f64"),
        }
    }
}

/// Scalar element of a [`Vector`](crate::Vector) or [`Matrix`](crate::Matrix).
///
/// Implemented for `f32` and `f64`.
pub trait Element:
    ScratchValue
    + fmt::Debug
    + fmt::Display
    + PartialEq
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + AddAssign
{
    const ZERO: Self;
    const ONE: Self;
    const DTYPE: DType;

    fn to_f64(self) -> f64;
}

macro_rules! impl_element {
    ($t:ty, $dtype:expr) => {
        impl Element for $t {
            const ZERO: Self = 0.0;
            const ONE: Self = 1.0;
            const DTYPE: DType = $dtype;

            fn to_f64(self) -> f64 {
                self as f64
            }
        }
    };
}

impl_element!(f32, DType::F32);
impl_element!(f64, DType::F64);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_in_bytes() {
        assert_eq!(DType::F32.size_in_bytes(), 4);
        assert_eq!(DType::F64.size_in_bytes(), 8);
        assert_eq!(DType::F32.size_in_bytes(), std::mem::size_of::<f32>());
    }

    #[test]
    fn test_element_dtype() {
        assert_eq!(<f32 as Element>::DTYPE, DType::F32);
        assert_eq!(<f64 as Element>::DTYPE, DType::F64);
        assert_eq!(DType::F64.to_string(), "f64");
    }

    #[test]
    fn test_tolerance_tracks_precision() {
        assert!(DType::F64.default_tolerance() < DType::F32.default_tolerance());
    }

    #[test]
    fn test_to_f64() {
        assert_eq!(Element::to_f64(0.5f32), 0.5);
        assert_eq!(Element::to_f64(-2.25f64), -2.25);
        assert_eq!(<f32 as Element>::ZERO + <f32 as Element>::ONE, 1.0);
    }
}
