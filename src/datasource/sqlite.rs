//! Store implementations backed by the SQLite repository.

use super::{AnchorStamp, StoreError, TickerPrice, TickerStore, TimeSeriesStore};
use crate::db::Repository;
use crate::domain::{CoinUniverse, MatrixKind, PairValue, SessionKey, StampedRows, TimeMs};
use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Matrix time series read from the `matrix_values` table.
#[derive(Clone)]
pub struct SqliteTimeSeriesStore {
    repo: Arc<Repository>,
}

impl SqliteTimeSeriesStore {
    pub fn new(repo: Arc<Repository>) -> Self {
        Self { repo }
    }
}

impl fmt::Debug for SqliteTimeSeriesStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteTimeSeriesStore").finish_non_exhaustive()
    }
}

fn retain_universe(rows: Vec<PairValue>, universe: &CoinUniverse) -> Vec<PairValue> {
    rows.into_iter()
        .filter(|r| {
            universe.index_of(r.base.as_str()).is_some()
                && universe.index_of(r.quote.as_str()).is_some()
        })
        .collect()
}

#[async_trait]
impl TimeSeriesStore for SqliteTimeSeriesStore {
    async fn previous_value(
        &self,
        kind: MatrixKind,
        base: &str,
        quote: &str,
        before: TimeMs,
    ) -> Result<Option<f64>, StoreError> {
        Ok(self
            .repo
            .query_previous_value(kind, base, quote, before)
            .await?)
    }

    async fn latest_stamped_rows(
        &self,
        stamp: AnchorStamp,
        session: &SessionKey,
        universe: &CoinUniverse,
    ) -> Result<Option<StampedRows>, StoreError> {
        let Some(ts) = self.repo.query_latest_stamp_ts(stamp, session).await? else {
            return Ok(None);
        };
        let rows = self.repo.query_stamped_rows(stamp, session, ts).await?;
        Ok(Some(StampedRows {
            ts,
            rows: retain_universe(rows, universe),
        }))
    }

    async fn latest_snapshot_stamp(&self) -> Result<Option<TimeMs>, StoreError> {
        Ok(self.repo.query_latest_snapshot_stamp().await?)
    }

    async fn latest_ts_at_or_before(
        &self,
        kind: MatrixKind,
        session: &SessionKey,
        at: TimeMs,
    ) -> Result<Option<TimeMs>, StoreError> {
        Ok(self
            .repo
            .query_latest_ts_at_or_before(kind, session, at)
            .await?)
    }

    async fn rows_at(
        &self,
        kind: MatrixKind,
        session: &SessionKey,
        ts: TimeMs,
        universe: &CoinUniverse,
    ) -> Result<Vec<PairValue>, StoreError> {
        let rows = self.repo.query_rows_at(kind, session, ts).await?;
        Ok(retain_universe(rows, universe))
    }
}

/// Ticker prices read from the `ticks` table.
#[derive(Clone)]
pub struct SqliteTickerStore {
    repo: Arc<Repository>,
}

impl SqliteTickerStore {
    pub fn new(repo: Arc<Repository>) -> Self {
        Self { repo }
    }
}

impl fmt::Debug for SqliteTickerStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteTickerStore").finish_non_exhaustive()
    }
}

#[async_trait]
impl TickerStore for SqliteTickerStore {
    async fn latest_prices(
        &self,
        symbols: &[String],
    ) -> Result<HashMap<String, TickerPrice>, StoreError> {
        let mut out = HashMap::with_capacity(symbols.len());
        for symbol in symbols {
            if let Some(tick) = self.repo.query_latest_tick(symbol).await? {
                out.insert(symbol.clone(), tick);
            }
        }
        Ok(out)
    }

    async fn prices_hours_ago(
        &self,
        symbols: &[String],
        hours: i64,
        now: TimeMs,
    ) -> Result<HashMap<String, f64>, StoreError> {
        let cutoff = now.hours_before(hours);
        let mut out = HashMap::with_capacity(symbols.len());
        for symbol in symbols {
            if let Some(price) = self.repo.query_tick_price_at_or_before(symbol, cutoff).await? {
                out.insert(symbol.clone(), price);
            }
        }
        Ok(out)
    }
}
