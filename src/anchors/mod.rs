//! Anchor grid resolvers.
//!
//! Each resolver turns one persisted stamp convention into an [`AnchorGrid`]
//! over a requested [`CoinUniverse`]:
//! - `opening` - latest session opening, with a cached timestamp fallback
//! - `snapshot` - latest global snapshot registry stamp
//! - `trade` - latest trade stamp, in both persisted conventions
//!
//! Store failures never propagate out of a resolver; they are logged and
//! reported as "no anchor".

pub mod cache;
pub mod opening;
pub mod snapshot;
pub mod trade;

pub use cache::{opening_cache_key, InMemoryOpeningTsCache, OpeningTsCache};
pub use opening::OpeningResolver;
pub use snapshot::SnapshotResolver;
pub use trade::TradeResolver;

use crate::datasource::{AnchorStamp, StoreError, TimeSeriesStore};
use crate::domain::{AnchorGrid, CoinUniverse, Grid, PairValue, SessionKey};
use crate::engine::AnchorProvider;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Which persisted trade-stamp convention feeds the derivation engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TradeConvention {
    /// `benchmark_trade` rows keyed by their trade-stamp timestamp.
    #[default]
    Trade,
    /// `benchmark` rows carrying the trade-stamp flag.
    Traded,
}

/// Place persisted rows onto their own `(base, quote)` cells.
///
/// No reciprocal is inferred. Rows naming unknown coins, the diagonal, or a
/// non-finite value are skipped.
pub fn map_rows(universe: &CoinUniverse, rows: &[PairValue]) -> Grid {
    let mut grid = Grid::empty(universe.len());
    for row in rows {
        let (Some(b), Some(q)) = (
            universe.index_of(row.base.as_str()),
            universe.index_of(row.quote.as_str()),
        ) else {
            continue;
        };
        if b == q || !row.value.is_finite() {
            continue;
        }
        grid.set(b, q, Some(row.value));
    }
    grid
}

/// Resolve the latest stamp of a convention into an anchor grid.
///
/// `Ok(None)` when the store holds no such stamp.
pub(crate) async fn resolve_stamped(
    store: &dyn TimeSeriesStore,
    stamp: AnchorStamp,
    universe: &CoinUniverse,
    session: &SessionKey,
) -> Result<Option<AnchorGrid>, StoreError> {
    let Some(stamped) = store.latest_stamped_rows(stamp, session, universe).await? else {
        debug!(%stamp, %session, "no stamp recorded");
        return Ok(None);
    };
    let grid = map_rows(universe, &stamped.rows);
    debug!(
        %stamp,
        %session,
        ts = stamped.ts.as_ms(),
        cells = grid.populated(),
        "anchor resolved"
    );
    Ok(Some(AnchorGrid::new(stamped.ts, grid)))
}

/// All resolvers over one store, exposed to the engine as an [`AnchorProvider`].
#[derive(Debug, Clone)]
pub struct AnchorResolvers {
    pub opening: OpeningResolver,
    pub snapshot: SnapshotResolver,
    pub trade: TradeResolver,
    convention: TradeConvention,
}

impl AnchorResolvers {
    pub fn new(
        store: Arc<dyn TimeSeriesStore>,
        cache: Arc<dyn OpeningTsCache>,
        opening_window: String,
        convention: TradeConvention,
    ) -> Self {
        Self {
            opening: OpeningResolver::new(store.clone(), cache, opening_window),
            snapshot: SnapshotResolver::new(store.clone()),
            trade: TradeResolver::new(store),
            convention,
        }
    }

    pub fn convention(&self) -> TradeConvention {
        self.convention
    }
}

#[async_trait]
impl AnchorProvider for AnchorResolvers {
    async fn opening_grid(&self, universe: &CoinUniverse, session: &SessionKey) -> AnchorGrid {
        self.opening
            .fetch_opening_grid(universe, Some(session), None, None)
            .await
    }

    async fn snapshot_grid(&self, universe: &CoinUniverse, session: &SessionKey) -> AnchorGrid {
        self.snapshot
            .fetch_snapshot_grid(universe, Some(session))
            .await
    }

    async fn trade_grid(&self, universe: &CoinUniverse, session: &SessionKey) -> AnchorGrid {
        match self.convention {
            TradeConvention::Trade => self.trade.fetch_trade_grid(universe, Some(session)).await,
            TradeConvention::Traded => self.trade.fetch_traded_grid(universe, Some(session)).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::MockTimeSeriesStore;
    use crate::domain::{TimeMs, DEFAULT_PIVOT};

    #[test]
    fn test_map_rows_no_reciprocal_and_skips_invalid() {
        let universe = CoinUniverse::new(&["BTC", "ETH"], DEFAULT_PIVOT);
        let grid = map_rows(
            &universe,
            &[
                PairValue::new("BTC", "ETH", 15.0),
                PairValue::new("BTC", "BTC", 1.0),
                PairValue::new("DOGE", "ETH", 0.1),
                PairValue::new("ETH", "USDT", f64::NAN),
            ],
        );
        assert_eq!(grid.get(0, 1), Some(15.0));
        assert_eq!(grid.get(1, 0), None);
        assert_eq!(grid.get(1, 2), None);
        assert_eq!(grid.populated(), 1);
    }

    fn resolvers(store: MockTimeSeriesStore, convention: TradeConvention) -> AnchorResolvers {
        AnchorResolvers::new(
            Arc::new(store),
            Arc::new(InMemoryOpeningTsCache::new()),
            "24h".to_string(),
            convention,
        )
    }

    #[tokio::test]
    async fn test_trade_convention_selects_resolver() {
        let universe = CoinUniverse::new(&["BTC"], DEFAULT_PIVOT);
        let store = MockTimeSeriesStore::new()
            .with_trade("global", 3000, vec![PairValue::new("BTC", "USDT", 50_500.0)])
            .with_traded("global", 2000, vec![PairValue::new("BTC", "USDT", 49_500.0)]);

        let trade = resolvers(store.clone(), TradeConvention::Trade)
            .trade_grid(&universe, &SessionKey::global())
            .await;
        assert_eq!(trade.ts, Some(TimeMs::new(3000)));
        assert_eq!(trade.grid.get(0, 1), Some(50_500.0));

        let traded = resolvers(store, TradeConvention::Traded)
            .trade_grid(&universe, &SessionKey::global())
            .await;
        assert_eq!(traded.ts, Some(TimeMs::new(2000)));
        assert_eq!(traded.grid.get(0, 1), Some(49_500.0));
    }
}
