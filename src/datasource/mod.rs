//! Store abstractions for persisted matrix time series and ticker prices.

use crate::domain::{CoinUniverse, MatrixKind, PairValue, SessionKey, StampedRows, TimeMs};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

pub mod mock;
pub mod sqlite;

pub use mock::{MockTickerStore, MockTimeSeriesStore};
pub use sqlite::{SqliteTickerStore, SqliteTimeSeriesStore};

/// Tagging convention that marks a set of persisted rows as an anchor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnchorStamp {
    /// `benchmark` rows flagged `opening_stamp`, keyed by `ts_ms`.
    Opening,
    /// `benchmark_trade` rows keyed by `trade_stamp_ts`.
    Trade,
    /// `benchmark` rows flagged `trade_stamp`, keyed by `ts_ms`.
    Traded,
}

impl AnchorStamp {
    /// Matrix kind the stamped rows are recorded under.
    pub fn kind(&self) -> MatrixKind {
        match self {
            AnchorStamp::Opening | AnchorStamp::Traded => MatrixKind::Benchmark,
            AnchorStamp::Trade => MatrixKind::BenchmarkTrade,
        }
    }
}

impl fmt::Display for AnchorStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AnchorStamp::Opening => f.write_str("opening"),
            AnchorStamp::Trade => f.write_str("trade"),
            AnchorStamp::Traded => f.write_str("traded"),
        }
    }
}

/// Persisted matrix time series.
///
/// All reads are scoped; none of these calls write.
#[async_trait]
pub trait TimeSeriesStore: Send + Sync + fmt::Debug {
    /// Most recent value for `(kind, base, quote)` strictly before `before`.
    async fn previous_value(
        &self,
        kind: MatrixKind,
        base: &str,
        quote: &str,
        before: TimeMs,
    ) -> Result<Option<f64>, StoreError>;

    /// Rows of the latest stamp of the given convention for a session.
    ///
    /// # Returns
    /// `None` when no stamp exists. Rows are limited to pairs inside `universe`.
    async fn latest_stamped_rows(
        &self,
        stamp: AnchorStamp,
        session: &SessionKey,
        universe: &CoinUniverse,
    ) -> Result<Option<StampedRows>, StoreError>;

    /// Latest global snapshot registry stamp.
    async fn latest_snapshot_stamp(&self) -> Result<Option<TimeMs>, StoreError>;

    /// Newest row timestamp for `kind` at or before `at` within a session.
    async fn latest_ts_at_or_before(
        &self,
        kind: MatrixKind,
        session: &SessionKey,
        at: TimeMs,
    ) -> Result<Option<TimeMs>, StoreError>;

    /// Values recorded for `kind` at exactly `ts`, limited to `universe`.
    async fn rows_at(
        &self,
        kind: MatrixKind,
        session: &SessionKey,
        ts: TimeMs,
        universe: &CoinUniverse,
    ) -> Result<Vec<PairValue>, StoreError>;
}

/// Latest observed price for a ticker symbol.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TickerPrice {
    pub price: f64,
    pub ts: TimeMs,
}

/// Raw per-symbol ticker prices.
#[async_trait]
pub trait TickerStore: Send + Sync + fmt::Debug {
    /// Latest price per symbol. Symbols without ticks are absent from the map.
    async fn latest_prices(
        &self,
        symbols: &[String],
    ) -> Result<HashMap<String, TickerPrice>, StoreError>;

    /// Latest price at or before `now - hours` per symbol.
    async fn prices_hours_ago(
        &self,
        symbols: &[String],
        hours: i64,
        now: TimeMs,
    ) -> Result<HashMap<String, f64>, StoreError>;
}

/// Error type for store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Db(#[from] sqlx::Error),
    #[error("Decode error: {0}")]
    Decode(String),
    #[error("Store unavailable: {0}")]
    Unavailable(String),
}
