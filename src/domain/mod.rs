//! Domain types for cross-rate matrices.
//!
//! This module provides:
//! - Domain primitives: TimeMs, Coin, SessionKey, MatrixKind
//! - The ordered coin universe that defines grid coordinates
//! - NxN grids, anchor grids, and the guarded division helper

pub mod grid;
pub mod primitives;
pub mod universe;

pub use grid::{safe_divide, AnchorGrid, Grid, DIVIDE_EPSILON};
pub use primitives::{Coin, MatrixKind, PairValue, SessionKey, StampedRows, TimeMs};
pub use universe::{CoinUniverse, DEFAULT_PIVOT};
