//! Comparing computed results against a reference.

use crate::dtype::Element;

/// The first position at which two buffers disagree.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mismatch<T> {
    pub index: usize,
    pub expected: T,
    pub actual: T,
}

/// True if `actual` is within `rtol` of `expected`.
///
/// The error is measured relative to `max(1, |expected|, |actual|)`, so values
/// near zero are compared absolutely. NaN never compares close.
pub fn is_close<T: Element>(expected: T, actual: T, rtol: f64) -> bool {
    let (e, a) = (expected.to_f64(), actual.to_f64());
    let scale = 1.0f64.max(e.abs()).max(a.abs());
    (e - a).abs() <= rtol * scale
}

/// Find the first element that is not close, or a length difference.
///
/// A length difference is reported at the index of the first missing element
/// with a zero stand-in for the absent side.
pub fn first_mismatch<T: Element>(expected: &[T], actual: &[T], rtol: f64) -> Option<Mismatch<T>> {
    if let Some(index) = expected
        .iter()
        .zip(actual)
        .position(|(&e, &a)| !is_close(e, a, rtol))
    {
        return Some(Mismatch {
            index,
            expected: expected[index],
            actual: actual[index],
        });
    }
    let common = expected.len().min(actual.len());
    if expected.len() != actual.len() {
        return Some(Mismatch {
            index: common,
            expected: expected.get(common).copied().unwrap_or(T::ZERO),
            actual: actual.get(common).copied().unwrap_or(T::ZERO),
        });
    }
    None
}

pub fn all_close<T: Element>(expected: &[T], actual: &[T], rtol: f64) -> bool {
    first_mismatch(expected, actual, rtol).is_none()
}
