//! Pure computation over cross-rate grids.
//!
//! Storage is reached only through the provider traits in [`providers`];
//! the live grid builder reads a [`TickerStore`](crate::datasource::TickerStore).

pub mod derivation;
pub mod live;
pub mod providers;

pub use derivation::{
    anchor_pct, derive_cell, momentum, CellInputs, CellMetrics, DerivedGrids, EngineError,
    MatrixEngine, MatrixEngineBuilder,
};
pub use live::{LiveGridBuilder, LiveGrids};
pub use providers::{AnchorProvider, PreviousValueProvider, Providers, StorePreviousValues};
