//! Session-opening anchor.

use super::cache::{opening_cache_key, OpeningTsCache};
use super::resolve_stamped;
use crate::datasource::{AnchorStamp, TimeSeriesStore};
use crate::domain::{AnchorGrid, CoinUniverse, Grid, SessionKey, TimeMs};
use std::sync::Arc;
use tracing::{debug, warn};

/// Resolves the latest `opening_stamp` benchmark grid for a session.
#[derive(Debug, Clone)]
pub struct OpeningResolver {
    store: Arc<dyn TimeSeriesStore>,
    cache: Arc<dyn OpeningTsCache>,
    default_window: String,
}

impl OpeningResolver {
    pub fn new(
        store: Arc<dyn TimeSeriesStore>,
        cache: Arc<dyn OpeningTsCache>,
        default_window: String,
    ) -> Self {
        Self {
            store,
            cache,
            default_window,
        }
    }

    /// Fetch the opening grid for `universe`.
    ///
    /// When no opening stamp is persisted the grid is empty and `ts` falls back
    /// to `explicit_opening_ts`, then the cached value for
    /// `session|window|pivot`, then now. The chosen fallback is written back to
    /// the cache, so `ts` is never `None` from this resolver.
    pub async fn fetch_opening_grid(
        &self,
        universe: &CoinUniverse,
        session: Option<&SessionKey>,
        window: Option<&str>,
        explicit_opening_ts: Option<TimeMs>,
    ) -> AnchorGrid {
        let session = session.cloned().unwrap_or_default();

        match resolve_stamped(self.store.as_ref(), AnchorStamp::Opening, universe, &session).await
        {
            Ok(Some(anchor)) => return anchor,
            Ok(None) => {}
            Err(e) => {
                warn!(%session, error = %e, "opening anchor query failed, using fallback timestamp");
            }
        }

        let window = window.unwrap_or(self.default_window.as_str());
        let key = opening_cache_key(&session, window, universe.pivot());
        let ts = explicit_opening_ts
            .or_else(|| self.cache.get(&key))
            .unwrap_or_else(TimeMs::now);
        self.cache.set(&key, ts);

        debug!(key = %key, ts = ts.as_ms(), "opening stamp missing, fallback timestamp");
        AnchorGrid::new(ts, Grid::empty(universe.len()))
    }
}
