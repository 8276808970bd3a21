//! NxN grids of optional cross-rate values and the guarded division helper.
//!
//! A grid is indexed by `(base, quote)` positions in a [`CoinUniverse`]. The
//! diagonal (a coin against itself) is never populated: reads return `None`
//! and writes panic.
//!
//! [`CoinUniverse`]: super::CoinUniverse

use super::TimeMs;
use serde::ser::{Serialize, SerializeSeq, Serializer};

/// Denominators with a smaller magnitude are treated as zero.
pub const DIVIDE_EPSILON: f64 = 1e-300;

/// Guarded division used by every derived ratio.
///
/// Returns `None` when either operand is missing or non-finite, when the
/// denominator is within [`DIVIDE_EPSILON`] of zero, or when the quotient
/// overflows.
pub fn safe_divide(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    let (n, d) = (numerator?, denominator?);
    if !n.is_finite() || !d.is_finite() || d.abs() < DIVIDE_EPSILON {
        return None;
    }
    let q = n / d;
    q.is_finite().then_some(q)
}

/// Square matrix of optional values with an always-empty diagonal.
#[derive(Debug, Clone, PartialEq)]
pub struct Grid {
    n: usize,
    cells: Vec<Option<f64>>,
}

impl Grid {
    /// Allocate an `n x n` grid with every off-diagonal cell set to `fill`.
    pub fn new(n: usize, fill: Option<f64>) -> Self {
        let mut cells = vec![fill; n * n];
        for i in 0..n {
            cells[i * n + i] = None;
        }
        Self { n, cells }
    }

    /// An `n x n` grid with no data anywhere.
    pub fn empty(n: usize) -> Self {
        Self::new(n, None)
    }

    pub fn dim(&self) -> usize {
        self.n
    }

    /// Read a cell. Panics when a coordinate is outside the grid.
    pub fn get(&self, base: usize, quote: usize) -> Option<f64> {
        self.cells[self.offset(base, quote)]
    }

    /// Write a cell. Panics on the diagonal or outside the grid.
    pub fn set(&mut self, base: usize, quote: usize, value: Option<f64>) {
        assert!(
            base != quote,
            "grid diagonal ({base},{base}) cannot hold a value"
        );
        let idx = self.offset(base, quote);
        self.cells[idx] = value;
    }

    /// True when no cell holds a value.
    pub fn is_empty(&self) -> bool {
        self.cells.iter().all(Option::is_none)
    }

    /// Number of cells holding a value.
    pub fn populated(&self) -> usize {
        self.cells.iter().filter(|c| c.is_some()).count()
    }

    /// Row-major copy as nested vectors.
    pub fn to_rows(&self) -> Vec<Vec<Option<f64>>> {
        self.cells.chunks(self.n.max(1)).map(<[_]>::to_vec).collect()
    }

    fn offset(&self, base: usize, quote: usize) -> usize {
        assert!(
            base < self.n && quote < self.n,
            "grid coordinate ({base},{quote}) out of range for dimension {}",
            self.n
        );
        base * self.n + quote
    }
}

impl Serialize for Grid {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.n))?;
        if self.n > 0 {
            for row in self.cells.chunks(self.n) {
                seq.serialize_element(row)?;
            }
        }
        seq.end()
    }
}

/// A grid captured at a resolved anchor timestamp.
///
/// `ts == None` means no anchor exists and the grid carries no data.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct AnchorGrid {
    pub ts: Option<TimeMs>,
    pub grid: Grid,
}

impl AnchorGrid {
    pub fn new(ts: TimeMs, grid: Grid) -> Self {
        Self { ts: Some(ts), grid }
    }

    /// No anchor for this universe/session.
    pub fn absent(n: usize) -> Self {
        Self {
            ts: None,
            grid: Grid::empty(n),
        }
    }

    pub fn is_absent(&self) -> bool {
        self.ts.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_divide_missing_operands() {
        assert_eq!(safe_divide(Some(1.0), None), None);
        assert_eq!(safe_divide(None, Some(2.0)), None);
        assert_eq!(safe_divide(None, None), None);
    }

    #[test]
    fn test_safe_divide_zero_and_tiny_denominator() {
        assert_eq!(safe_divide(Some(5.0), Some(0.0)), None);
        assert_eq!(safe_divide(Some(5.0), Some(-0.0)), None);
        assert_eq!(safe_divide(Some(5.0), Some(1e-301)), None);
        assert!(safe_divide(Some(5.0), Some(1e-299)).is_some());
    }

    #[test]
    fn test_safe_divide_non_finite() {
        assert_eq!(safe_divide(Some(f64::NAN), Some(1.0)), None);
        assert_eq!(safe_divide(Some(1.0), Some(f64::INFINITY)), None);
        assert_eq!(safe_divide(Some(1e300), Some(1e-299)), None);
    }

    #[test]
    fn test_safe_divide_plain() {
        assert_eq!(safe_divide(Some(3.0), Some(2.0)), Some(1.5));
        assert_eq!(safe_divide(Some(0.0), Some(-4.0)), Some(-0.0));
    }

    #[test]
    fn test_new_grid_fills_off_diagonal_only() {
        let g = Grid::new(3, Some(7.0));
        assert_eq!(g.dim(), 3);
        for i in 0..3 {
            for j in 0..3 {
                if i == j {
                    assert_eq!(g.get(i, j), None);
                } else {
                    assert_eq!(g.get(i, j), Some(7.0));
                }
            }
        }
        assert_eq!(g.populated(), 6);
    }

    #[test]
    fn test_set_and_get() {
        let mut g = Grid::empty(2);
        assert!(g.is_empty());
        g.set(0, 1, Some(2.5));
        assert_eq!(g.get(0, 1), Some(2.5));
        assert_eq!(g.get(1, 0), None);
        assert!(!g.is_empty());
    }

    #[test]
    #[should_panic(expected = "diagonal")]
    fn test_set_diagonal_panics() {
        let mut g = Grid::empty(2);
        g.set(1, 1, Some(1.0));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_get_out_of_range_panics() {
        let g = Grid::empty(2);
        let _ = g.get(2, 0);
    }

    #[test]
    fn test_grid_serializes_as_nested_arrays() {
        let mut g = Grid::empty(2);
        g.set(0, 1, Some(1.5));
        let json = serde_json::to_string(&g).unwrap();
        assert_eq!(json, "[[null,1.5],[null,null]]");
        assert_eq!(g.to_rows(), vec![vec![None, Some(1.5)], vec![None, None]]);
    }

    #[test]
    fn test_absent_anchor_is_empty() {
        let a = AnchorGrid::absent(4);
        assert!(a.is_absent());
        assert!(a.grid.is_empty());
        assert_eq!(a.grid.dim(), 4);
    }
}
