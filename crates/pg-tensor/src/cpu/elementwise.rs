//! Sequential element-wise kernels used by `CpuBackend`.

use crate::backend::BinaryOp;
use crate::dtype::Element;

pub fn zip<T: Element>(a: &[T], b: &[T], op: BinaryOp) -> Vec<T> {
    a.iter().zip(b.iter()).map(|(&x, &y)| op.apply(x, y)).collect()
}

pub fn scale<T: Element>(a: &[T], s: T) -> Vec<T> {
    a.iter().map(|&x| x * s).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zip_ops() {
        let a = [6.0f64, 8.0];
        let b = [2.0f64, 4.0];
        assert_eq!(zip(&a, &b, BinaryOp::Add), vec![8.0, 12.0]);
        assert_eq!(zip(&a, &b, BinaryOp::Sub), vec![4.0, 4.0]);
        assert_eq!(zip(&a, &b, BinaryOp::Mul), vec![12.0, 32.0]);
        assert_eq!(zip(&a, &b, BinaryOp::Div), vec![3.0, 2.0]);
    }

    #[test]
    fn test_scale() {
        assert_eq!(scale(&[1.0f32, -2.0], 3.0), vec![3.0, -6.0]);
    }
}
