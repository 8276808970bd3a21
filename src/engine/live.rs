//! Live benchmark and 24h-change grids built straight from ticker prices.

use crate::datasource::{StoreError, TickerStore};
use crate::domain::{safe_divide, AnchorGrid, Coin, CoinUniverse, Grid, TimeMs};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Live grids over the universe of coins that currently have a price.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LiveGrids {
    pub coins: CoinUniverse,
    pub benchmark: AnchorGrid,
    pub pct24h: AnchorGrid,
}

#[derive(Debug, Clone)]
pub struct LiveGridBuilder {
    ticker: Arc<dyn TickerStore>,
    pivot: String,
    lookback_hours: i64,
}

impl LiveGridBuilder {
    pub fn new(ticker: Arc<dyn TickerStore>, pivot: &str, lookback_hours: i64) -> Self {
        Self {
            ticker,
            pivot: pivot.trim().to_ascii_uppercase(),
            lookback_hours,
        }
    }

    /// Ticker symbol quoting `coin` in the pivot, e.g. `BTCUSDT`.
    pub fn symbol_for(&self, coin: &Coin) -> String {
        format!("{}{}", coin, self.pivot)
    }

    pub async fn build_live_grids<S: AsRef<str>>(
        &self,
        requested: &[S],
    ) -> Result<LiveGrids, StoreError> {
        self.build_live_grids_at(requested, TimeMs::now()).await
    }

    /// Build live grids with `now` as the reference for the 24h lookback.
    ///
    /// Coins without a current price are dropped; the pivot is always kept at
    /// a price of exactly 1. A failed lookback query only blanks the 24h grid.
    pub async fn build_live_grids_at<S: AsRef<str>>(
        &self,
        requested: &[S],
        now: TimeMs,
    ) -> Result<LiveGrids, StoreError> {
        let requested = CoinUniverse::new(requested, &self.pivot);
        let pivot = requested.pivot().clone();

        let symbols: Vec<String> = requested
            .iter()
            .filter(|c| **c != pivot)
            .map(|c| self.symbol_for(c))
            .collect();
        let latest = self.ticker.latest_prices(&symbols).await?;

        let mut prices: HashMap<Coin, f64> = HashMap::with_capacity(requested.len());
        let mut newest: Option<TimeMs> = None;
        prices.insert(pivot.clone(), 1.0);
        for coin in requested.iter().filter(|c| **c != pivot) {
            if let Some(tick) = latest.get(&self.symbol_for(coin)) {
                if tick.price.is_finite() {
                    prices.insert(coin.clone(), tick.price);
                    newest = newest.max(Some(tick.ts));
                }
            }
        }

        let coins = requested.retain(|c| prices.contains_key(c));
        let dropped = requested.len() - coins.len();
        if dropped > 0 {
            debug!(dropped, "coins without a current price dropped");
        }

        let kept_symbols: Vec<String> = coins
            .iter()
            .filter(|c| **c != pivot)
            .map(|c| self.symbol_for(c))
            .collect();
        let past = match self
            .ticker
            .prices_hours_ago(&kept_symbols, self.lookback_hours, now)
            .await
        {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, hours = self.lookback_hours, "lookback price query failed");
                HashMap::new()
            }
        };

        let returns: Vec<Option<f64>> = coins
            .iter()
            .map(|c| {
                if *c == pivot {
                    return Some(0.0);
                }
                let current = prices.get(c).copied();
                let before = past.get(&self.symbol_for(c)).copied();
                safe_divide(current, before).map(|ratio| ratio - 1.0)
            })
            .collect();
        let price_row: Vec<Option<f64>> = coins.iter().map(|c| prices.get(c).copied()).collect();

        let n = coins.len();
        let mut benchmark = Grid::empty(n);
        let mut pct24h = Grid::empty(n);
        for (b, q) in coins.pairs() {
            benchmark.set(b, q, safe_divide(price_row[b], price_row[q]));
            let growth = safe_divide(returns[b].map(|r| 1.0 + r), returns[q].map(|r| 1.0 + r));
            pct24h.set(b, q, growth.map(|g| g - 1.0));
        }

        let ts = newest.unwrap_or(now);
        Ok(LiveGrids {
            coins,
            benchmark: AnchorGrid::new(ts, benchmark),
            pct24h: AnchorGrid::new(ts, pct24h),
        })
    }
}
