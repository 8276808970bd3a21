//! Provider seams that keep the derivation engine free of storage.

use crate::datasource::TimeSeriesStore;
use crate::domain::{AnchorGrid, Coin, CoinUniverse, MatrixKind, SessionKey, TimeMs};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::warn;

/// Point lookup of the most recent recorded value strictly before a time.
#[async_trait]
pub trait PreviousValueProvider: Send + Sync {
    async fn previous_value(
        &self,
        kind: MatrixKind,
        base: &Coin,
        quote: &Coin,
        before: TimeMs,
    ) -> Option<f64>;
}

/// Anchor grids consumed by the engine, resolved per call.
#[async_trait]
pub trait AnchorProvider: Send + Sync {
    async fn opening_grid(&self, universe: &CoinUniverse, session: &SessionKey) -> AnchorGrid;
    async fn snapshot_grid(&self, universe: &CoinUniverse, session: &SessionKey) -> AnchorGrid;
    async fn trade_grid(&self, universe: &CoinUniverse, session: &SessionKey) -> AnchorGrid;
}

/// The full set of collaborators a [`MatrixEngine`](super::MatrixEngine) needs.
#[derive(Clone)]
pub struct Providers {
    pub previous: Arc<dyn PreviousValueProvider>,
    pub anchors: Arc<dyn AnchorProvider>,
}

/// Previous-value lookups served by a time-series store.
///
/// Store failures read as "no data".
#[derive(Debug, Clone)]
pub struct StorePreviousValues {
    store: Arc<dyn TimeSeriesStore>,
}

impl StorePreviousValues {
    pub fn new(store: Arc<dyn TimeSeriesStore>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl PreviousValueProvider for StorePreviousValues {
    async fn previous_value(
        &self,
        kind: MatrixKind,
        base: &Coin,
        quote: &Coin,
        before: TimeMs,
    ) -> Option<f64> {
        match self
            .store
            .previous_value(kind, base.as_str(), quote.as_str(), before)
            .await
        {
            Ok(v) => v,
            Err(e) => {
                warn!(%kind, %base, %quote, error = %e, "previous value lookup failed");
                None
            }
        }
    }
}
