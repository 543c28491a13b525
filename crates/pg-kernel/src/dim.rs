use std::fmt;

/// A two-dimensional extent or index, `x` being the fastest-varying axis
/// (columns) and `y` the slower one (rows).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Dim2 {
    pub x: usize,
    pub y: usize,
}

impl Dim2 {
    pub const fn new(x: usize, y: usize) -> Self {
        Dim2 { x, y }
    }

    /// Total number of points covered by this extent.
    pub fn count(&self) -> usize {
        self.x * self.y
    }

    /// Like [`count`](Self::count) but returns `None` on overflow.
    pub fn checked_count(&self) -> Option<usize> {
        self.x.checked_mul(self.y)
    }

    /// Converts a row-major linear index inside this extent into a 2-D index.
    pub fn unflatten(&self, linear: usize) -> Dim2 {
        Dim2 {
            x: linear % self.x,
            y: linear / self.x,
        }
    }

    /// Row-major linear index of `idx` inside this extent.
    pub fn flatten(&self, idx: Dim2) -> usize {
        idx.y * self.x + idx.x
    }
}

impl fmt::Display for Dim2 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// Number of `tile`-sized pieces needed to cover `len`.
///
/// # Panics
/// Panics if `tile == 0`.
pub fn ceil_div(len: usize, tile: usize) -> usize {
    len.div_ceil(tile)
}
