//! Trade-stamp anchors.
//!
//! Two persisted conventions mark "I traded now": `benchmark_trade` rows keyed
//! by `trade_stamp_ts`, and `benchmark` rows carrying the `trade_stamp` flag.
//! Both resolve the same way.

use super::resolve_stamped;
use crate::datasource::{AnchorStamp, TimeSeriesStore};
use crate::domain::{AnchorGrid, CoinUniverse, SessionKey};
use std::sync::Arc;
use tracing::warn;

#[derive(Debug, Clone)]
pub struct TradeResolver {
    store: Arc<dyn TimeSeriesStore>,
}

impl TradeResolver {
    pub fn new(store: Arc<dyn TimeSeriesStore>) -> Self {
        Self { store }
    }

    /// Latest `benchmark_trade` stamp for the session.
    pub async fn fetch_trade_grid(
        &self,
        universe: &CoinUniverse,
        session: Option<&SessionKey>,
    ) -> AnchorGrid {
        self.fetch(AnchorStamp::Trade, universe, session).await
    }

    /// Latest trade-flagged `benchmark` commit for the session.
    pub async fn fetch_traded_grid(
        &self,
        universe: &CoinUniverse,
        session: Option<&SessionKey>,
    ) -> AnchorGrid {
        self.fetch(AnchorStamp::Traded, universe, session).await
    }

    async fn fetch(
        &self,
        stamp: AnchorStamp,
        universe: &CoinUniverse,
        session: Option<&SessionKey>,
    ) -> AnchorGrid {
        let session = session.cloned().unwrap_or_default();
        match resolve_stamped(self.store.as_ref(), stamp, universe, &session).await {
            Ok(Some(anchor)) => anchor,
            Ok(None) => AnchorGrid::absent(universe.len()),
            Err(e) => {
                warn!(%stamp, %session, error = %e, "trade anchor query failed");
                AnchorGrid::absent(universe.len())
            }
        }
    }
}
