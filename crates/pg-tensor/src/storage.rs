use crate::dtype::Element;
use crate::error::{Result, TensorError};
use crate::shape::Shape;

/// Allocate a zero-filled buffer of `len` elements.
///
/// # Errors
/// Returns `ResourceExhaustion` if the allocator cannot satisfy the request.
pub fn zeroed<T: Element>(len: usize) -> Result<Vec<T>> {
    let mut data = Vec::new();
    data.try_reserve_exact(len)
        .map_err(|_| TensorError::ResourceExhaustion {
            elements: len,
            dtype: T::DTYPE,
        })?;
    data.resize(len, T::ZERO);
    Ok(data)
}

/// Allocate a zero-filled buffer large enough for `shape`.
pub fn zeroed_for<T: Element>(shape: Shape) -> Result<Vec<T>> {
    zeroed(shape.numel()?)
}

/// Check that a flat row-major buffer matches the element count of `shape`.
pub fn check_len(name: &'static str, len: usize, shape: Shape) -> Result<()> {
    let expected = shape.numel()?;
    if len != expected {
        return Err(TensorError::BufferLength {
            name,
            len,
            expected,
        });
    }
    Ok(())
}

/// Validate flat matmul operands for `[m x k] @ [k x n]` and return the
/// output shape.
pub fn check_matmul_operands<T>(a: &[T], b: &[T], m: usize, k: usize, n: usize) -> Result<Shape> {
    check_len("matmul lhs", a.len(), Shape::new(m, k))?;
    check_len("matmul rhs", b.len(), Shape::new(k, n))?;
    let out = Shape::new(m, n);
    out.numel()?;
    Ok(out)
}

/// Largest useful tile edge for `[m x k] @ [k x n]`.
///
/// Tiles wider than every dimension only add zero padding, so the result is
/// the same with the smaller tile.
pub fn effective_tile(tile: usize, m: usize, k: usize, n: usize) -> usize {
    tile.min(m.max(k).max(n).max(1))
}

/// Validate that two flat operands have the same length.
pub fn check_same_len<T>(a: &[T], b: &[T]) -> Result<()> {
    if a.len() != b.len() {
        return Err(TensorError::ShapeMismatch {
            expected: vec![a.len()],
            got: vec![b.len()],
        });
    }
    Ok(())
}
