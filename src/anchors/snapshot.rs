//! Snapshot registry anchor.

use crate::datasource::{StoreError, TimeSeriesStore};
use crate::domain::{AnchorGrid, CoinUniverse, MatrixKind, SessionKey};
use std::sync::Arc;
use tracing::{debug, warn};

use super::map_rows;

/// Resolves the benchmark grid nearest to the latest global snapshot stamp.
#[derive(Debug, Clone)]
pub struct SnapshotResolver {
    store: Arc<dyn TimeSeriesStore>,
}

impl SnapshotResolver {
    pub fn new(store: Arc<dyn TimeSeriesStore>) -> Self {
        Self { store }
    }

    /// Fetch the snapshot grid for `universe`.
    ///
    /// `ts` is `None` when no registry stamp exists or no benchmark row sits at
    /// or before it. A resolved `ts` with no rows for these pairs yields an
    /// empty grid carrying that `ts`.
    pub async fn fetch_snapshot_grid(
        &self,
        universe: &CoinUniverse,
        session: Option<&SessionKey>,
    ) -> AnchorGrid {
        let session = session.cloned().unwrap_or_default();
        match self.resolve(universe, &session).await {
            Ok(anchor) => anchor,
            Err(e) => {
                warn!(%session, error = %e, "snapshot anchor query failed");
                AnchorGrid::absent(universe.len())
            }
        }
    }

    async fn resolve(
        &self,
        universe: &CoinUniverse,
        session: &SessionKey,
    ) -> Result<AnchorGrid, StoreError> {
        let Some(stamp) = self.store.latest_snapshot_stamp().await? else {
            debug!("snapshot registry empty");
            return Ok(AnchorGrid::absent(universe.len()));
        };

        let Some(ts) = self
            .store
            .latest_ts_at_or_before(MatrixKind::Benchmark, session, stamp)
            .await?
        else {
            debug!(%session, stamp = stamp.as_ms(), "no benchmark rows at or before snapshot stamp");
            return Ok(AnchorGrid::absent(universe.len()));
        };

        let rows = self
            .store
            .rows_at(MatrixKind::Benchmark, session, ts, universe)
            .await?;
        Ok(AnchorGrid::new(ts, map_rows(universe, &rows)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datasource::MockTimeSeriesStore;
    use crate::domain::{PairValue, TimeMs, DEFAULT_PIVOT};

    fn universe() -> CoinUniverse {
        CoinUniverse::new(&["BTC", "ETH"], DEFAULT_PIVOT)
    }

    #[tokio::test]
    async fn test_no_registry_stamp() {
        let store = MockTimeSeriesStore::new().with_value(
            MatrixKind::Benchmark,
            "BTC",
            "ETH",
            15.0,
            1000,
        );
        let anchor = SnapshotResolver::new(Arc::new(store))
            .fetch_snapshot_grid(&universe(), None)
            .await;
        assert!(anchor.is_absent());
        assert!(anchor.grid.is_empty());
    }

    #[tokio::test]
    async fn test_translates_stamp_to_nearest_earlier_benchmark() {
        let store = MockTimeSeriesStore::new()
            .with_snapshot_stamp(1500)
            .with_value(MatrixKind::Benchmark, "BTC", "ETH", 15.0, 1000)
            .with_value(MatrixKind::Benchmark, "BTC", "ETH", 15.5, 1400)
            .with_value(MatrixKind::Benchmark, "ETH", "USDT", 3000.0, 1400)
            .with_value(MatrixKind::Benchmark, "BTC", "ETH", 16.0, 1600);

        let anchor = SnapshotResolver::new(Arc::new(store))
            .fetch_snapshot_grid(&universe(), None)
            .await;
        assert_eq!(anchor.ts, Some(TimeMs::new(1400)));
        assert_eq!(anchor.grid.get(0, 1), Some(15.5));
        assert_eq!(anchor.grid.get(1, 2), Some(3000.0));
        assert_eq!(anchor.grid.get(1, 0), None);
    }

    #[tokio::test]
    async fn test_stamp_before_any_benchmark_row() {
        let store = MockTimeSeriesStore::new()
            .with_snapshot_stamp(500)
            .with_value(MatrixKind::Benchmark, "BTC", "ETH", 15.0, 1000);
        let anchor = SnapshotResolver::new(Arc::new(store))
            .fetch_snapshot_grid(&universe(), None)
            .await;
        assert!(anchor.is_absent());
    }

    #[tokio::test]
    async fn test_resolved_ts_without_pairs_keeps_ts() {
        let store = MockTimeSeriesStore::new()
            .with_snapshot_stamp(1500)
            .with_value(MatrixKind::Benchmark, "SOL", "USDT", 150.0, 1400);
        let anchor = SnapshotResolver::new(Arc::new(store))
            .fetch_snapshot_grid(&universe(), None)
            .await;
        assert_eq!(anchor.ts, Some(TimeMs::new(1400)));
        assert!(anchor.grid.is_empty());
    }

    #[tokio::test]
    async fn test_session_scoping() {
        let store = MockTimeSeriesStore::new()
            .with_snapshot_stamp(1500)
            .with_session_value(
                MatrixKind::Benchmark,
                "badge-2",
                PairValue::new("BTC", "ETH", 14.0),
                1200,
            );
        let resolver = SnapshotResolver::new(Arc::new(store));

        let global = resolver.fetch_snapshot_grid(&universe(), None).await;
        assert!(global.is_absent());

        let badge = resolver
            .fetch_snapshot_grid(&universe(), Some(&SessionKey::new("badge-2")))
            .await;
        assert_eq!(badge.ts, Some(TimeMs::new(1200)));
        assert_eq!(badge.grid.get(0, 1), Some(14.0));
    }

    #[tokio::test]
    async fn test_store_failure_is_absent() {
        let anchor = SnapshotResolver::new(Arc::new(MockTimeSeriesStore::unavailable()))
            .fetch_snapshot_grid(&universe(), None)
            .await;
        assert!(anchor.is_absent());
        assert_eq!(anchor.grid.dim(), 3);
    }
}
