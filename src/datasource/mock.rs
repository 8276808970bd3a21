//! In-memory stores for testing without a database.

use super::{AnchorStamp, StoreError, TickerPrice, TickerStore, TimeSeriesStore};
use crate::domain::{CoinUniverse, MatrixKind, PairValue, SessionKey, StampedRows, TimeMs};
use async_trait::async_trait;
use std::collections::HashMap;

/// One stored matrix row, mirroring the `matrix_values` table.
#[derive(Debug, Clone, PartialEq)]
pub struct MockRow {
    pub kind: MatrixKind,
    pub session: SessionKey,
    pub value: PairValue,
    pub ts: TimeMs,
    pub opening_stamp: bool,
    pub trade_stamp: bool,
    pub trade_stamp_ts: Option<TimeMs>,
}

impl MockRow {
    fn plain(kind: MatrixKind, session: &SessionKey, value: PairValue, ts: TimeMs) -> Self {
        Self {
            kind,
            session: session.clone(),
            value,
            ts,
            opening_stamp: false,
            trade_stamp: false,
            trade_stamp_ts: None,
        }
    }

    fn stamp_ts(&self, stamp: AnchorStamp) -> Option<TimeMs> {
        if self.kind != stamp.kind() {
            return None;
        }
        match stamp {
            AnchorStamp::Opening => self.opening_stamp.then_some(self.ts),
            AnchorStamp::Traded => self.trade_stamp.then_some(self.ts),
            AnchorStamp::Trade => self.trade_stamp_ts,
        }
    }
}

/// Mock time-series store backed by a row vector.
#[derive(Debug, Clone, Default)]
pub struct MockTimeSeriesStore {
    rows: Vec<MockRow>,
    snapshot_stamps: Vec<TimeMs>,
    unavailable: bool,
}

impl MockTimeSeriesStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every call fails.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// Add an unstamped value in the `global` session.
    pub fn with_value(
        mut self,
        kind: MatrixKind,
        base: &str,
        quote: &str,
        value: f64,
        ts: i64,
    ) -> Self {
        self.rows.push(MockRow::plain(
            kind,
            &SessionKey::global(),
            PairValue::new(base, quote, value),
            TimeMs::new(ts),
        ));
        self
    }

    /// Add an unstamped value in a specific session.
    pub fn with_session_value(
        mut self,
        kind: MatrixKind,
        session: &str,
        pair: PairValue,
        ts: i64,
    ) -> Self {
        self.rows.push(MockRow::plain(
            kind,
            &SessionKey::new(session),
            pair,
            TimeMs::new(ts),
        ));
        self
    }

    /// Add benchmark rows flagged as a session opening.
    pub fn with_opening(mut self, session: &str, ts: i64, pairs: Vec<PairValue>) -> Self {
        let session = SessionKey::new(session);
        for pair in pairs {
            let mut row = MockRow::plain(MatrixKind::Benchmark, &session, pair, TimeMs::new(ts));
            row.opening_stamp = true;
            self.rows.push(row);
        }
        self
    }

    /// Add `benchmark_trade` rows stamped at `trade_ts`.
    pub fn with_trade(mut self, session: &str, trade_ts: i64, pairs: Vec<PairValue>) -> Self {
        let session = SessionKey::new(session);
        for pair in pairs {
            let mut row = MockRow::plain(
                MatrixKind::BenchmarkTrade,
                &session,
                pair,
                TimeMs::new(trade_ts),
            );
            row.trade_stamp_ts = Some(TimeMs::new(trade_ts));
            self.rows.push(row);
        }
        self
    }

    /// Add benchmark rows flagged as trade-stamped.
    pub fn with_traded(mut self, session: &str, ts: i64, pairs: Vec<PairValue>) -> Self {
        let session = SessionKey::new(session);
        for pair in pairs {
            let mut row = MockRow::plain(MatrixKind::Benchmark, &session, pair, TimeMs::new(ts));
            row.trade_stamp = true;
            self.rows.push(row);
        }
        self
    }

    /// Register a global snapshot stamp.
    pub fn with_snapshot_stamp(mut self, ts: i64) -> Self {
        self.snapshot_stamps.push(TimeMs::new(ts));
        self
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable {
            return Err(StoreError::Unavailable("mock store offline".to_string()));
        }
        Ok(())
    }
}

fn in_universe(universe: &CoinUniverse, pair: &PairValue) -> bool {
    universe.index_of(pair.base.as_str()).is_some()
        && universe.index_of(pair.quote.as_str()).is_some()
}

#[async_trait]
impl TimeSeriesStore for MockTimeSeriesStore {
    async fn previous_value(
        &self,
        kind: MatrixKind,
        base: &str,
        quote: &str,
        before: TimeMs,
    ) -> Result<Option<f64>, StoreError> {
        self.check()?;
        Ok(self
            .rows
            .iter()
            .filter(|r| {
                r.kind == kind
                    && r.value.base.as_str() == base
                    && r.value.quote.as_str() == quote
                    && r.ts < before
            })
            .max_by_key(|r| r.ts)
            .map(|r| r.value.value))
    }

    async fn latest_stamped_rows(
        &self,
        stamp: AnchorStamp,
        session: &SessionKey,
        universe: &CoinUniverse,
    ) -> Result<Option<StampedRows>, StoreError> {
        self.check()?;
        let latest = self
            .rows
            .iter()
            .filter(|r| &r.session == session)
            .filter_map(|r| r.stamp_ts(stamp))
            .max();
        let Some(ts) = latest else {
            return Ok(None);
        };

        let rows = self
            .rows
            .iter()
            .filter(|r| &r.session == session && r.stamp_ts(stamp) == Some(ts))
            .filter(|r| in_universe(universe, &r.value))
            .map(|r| r.value.clone())
            .collect();
        Ok(Some(StampedRows { ts, rows }))
    }

    async fn latest_snapshot_stamp(&self) -> Result<Option<TimeMs>, StoreError> {
        self.check()?;
        Ok(self.snapshot_stamps.iter().copied().max())
    }

    async fn latest_ts_at_or_before(
        &self,
        kind: MatrixKind,
        session: &SessionKey,
        at: TimeMs,
    ) -> Result<Option<TimeMs>, StoreError> {
        self.check()?;
        Ok(self
            .rows
            .iter()
            .filter(|r| r.kind == kind && &r.session == session && r.ts <= at)
            .map(|r| r.ts)
            .max())
    }

    async fn rows_at(
        &self,
        kind: MatrixKind,
        session: &SessionKey,
        ts: TimeMs,
        universe: &CoinUniverse,
    ) -> Result<Vec<PairValue>, StoreError> {
        self.check()?;
        Ok(self
            .rows
            .iter()
            .filter(|r| r.kind == kind && &r.session == session && r.ts == ts)
            .filter(|r| in_universe(universe, &r.value))
            .map(|r| r.value.clone())
            .collect())
    }
}

/// Mock ticker store backed by per-symbol tick lists.
#[derive(Debug, Clone, Default)]
pub struct MockTickerStore {
    ticks: HashMap<String, Vec<TickerPrice>>,
    unavailable: bool,
}

impl MockTickerStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store whose every call fails.
    pub fn unavailable() -> Self {
        Self {
            unavailable: true,
            ..Self::default()
        }
    }

    /// Record a tick for a symbol such as `BTCUSDT`.
    pub fn with_tick(mut self, symbol: &str, price: f64, ts: i64) -> Self {
        self.ticks
            .entry(symbol.to_string())
            .or_default()
            .push(TickerPrice {
                price,
                ts: TimeMs::new(ts),
            });
        self
    }

    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable {
            return Err(StoreError::Unavailable("mock ticker offline".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl TickerStore for MockTickerStore {
    async fn latest_prices(
        &self,
        symbols: &[String],
    ) -> Result<HashMap<String, TickerPrice>, StoreError> {
        self.check()?;
        Ok(symbols
            .iter()
            .filter_map(|s| {
                let latest = self.ticks.get(s)?.iter().max_by_key(|t| t.ts)?;
                Some((s.clone(), *latest))
            })
            .collect())
    }

    async fn prices_hours_ago(
        &self,
        symbols: &[String],
        hours: i64,
        now: TimeMs,
    ) -> Result<HashMap<String, f64>, StoreError> {
        self.check()?;
        let cutoff = now.hours_before(hours);
        Ok(symbols
            .iter()
            .filter_map(|s| {
                let tick = self
                    .ticks
                    .get(s)?
                    .iter()
                    .filter(|t| t.ts <= cutoff)
                    .max_by_key(|t| t.ts)?;
                Some((s.clone(), tick.price))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DEFAULT_PIVOT;

    #[tokio::test]
    async fn test_previous_value_is_strictly_before() {
        let store = MockTimeSeriesStore::new()
            .with_value(MatrixKind::Benchmark, "BTC", "USDT", 100.0, 1000)
            .with_value(MatrixKind::Benchmark, "BTC", "USDT", 110.0, 2000);

        let v = store
            .previous_value(MatrixKind::Benchmark, "BTC", "USDT", TimeMs::new(2000))
            .await
            .unwrap();
        assert_eq!(v, Some(100.0));

        let v = store
            .previous_value(MatrixKind::Benchmark, "BTC", "USDT", TimeMs::new(1000))
            .await
            .unwrap();
        assert_eq!(v, None);
    }

    #[tokio::test]
    async fn test_latest_stamped_rows_picks_newest_stamp() {
        let universe = CoinUniverse::new(&["BTC", "ETH"], DEFAULT_PIVOT);
        let store = MockTimeSeriesStore::new()
            .with_opening("global", 500, vec![PairValue::new("BTC", "ETH", 14.0)])
            .with_opening("global", 1000, vec![PairValue::new("BTC", "ETH", 15.0)])
            .with_opening("other", 2000, vec![PairValue::new("BTC", "ETH", 16.0)]);

        let stamped = store
            .latest_stamped_rows(AnchorStamp::Opening, &SessionKey::global(), &universe)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stamped.ts, TimeMs::new(1000));
        assert_eq!(stamped.rows, vec![PairValue::new("BTC", "ETH", 15.0)]);
    }

    #[tokio::test]
    async fn test_unavailable_store_errors() {
        let store = MockTimeSeriesStore::unavailable();
        assert!(store.latest_snapshot_stamp().await.is_err());

        let ticker = MockTickerStore::unavailable();
        assert!(ticker.latest_prices(&["BTCUSDT".to_string()]).await.is_err());
    }

    #[tokio::test]
    async fn test_mock_ticker_hours_ago() {
        let hour = 3_600_000;
        let ticker = MockTickerStore::new()
            .with_tick("BTCUSDT", 40_000.0, 0)
            .with_tick("BTCUSDT", 41_000.0, hour)
            .with_tick("BTCUSDT", 50_000.0, 25 * hour);

        let symbols = vec!["BTCUSDT".to_string(), "ETHUSDT".to_string()];
        let latest = ticker.latest_prices(&symbols).await.unwrap();
        assert_eq!(latest["BTCUSDT"].price, 50_000.0);
        assert!(!latest.contains_key("ETHUSDT"));

        let ago = ticker
            .prices_hours_ago(&symbols, 24, TimeMs::new(25 * hour))
            .await
            .unwrap();
        assert_eq!(ago["BTCUSDT"], 41_000.0);
    }
}
