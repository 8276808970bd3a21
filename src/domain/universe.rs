//! Ordered coin universe defining grid coordinates.

use super::Coin;
use serde::Serialize;
use std::collections::HashMap;

/// Canonical pivot quote asset.
pub const DEFAULT_PIVOT: &str = "USDT";

/// Ordered, de-duplicated, upper-cased symbols that always include the pivot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct CoinUniverse {
    coins: Vec<Coin>,
    #[serde(skip)]
    index: HashMap<Coin, usize>,
    #[serde(skip)]
    pivot: Coin,
}

impl CoinUniverse {
    /// Normalize a requested symbol list. The pivot is appended when missing.
    pub fn new<S: AsRef<str>>(requested: &[S], pivot: &str) -> Self {
        let pivot = Coin::new(pivot);
        let mut coins: Vec<Coin> = Vec::with_capacity(requested.len() + 1);
        let mut index = HashMap::with_capacity(requested.len() + 1);

        let candidates = requested
            .iter()
            .map(|s| Coin::new(s.as_ref()))
            .chain(std::iter::once(pivot.clone()));
        for coin in candidates {
            if coin.as_str().is_empty() || index.contains_key(&coin) {
                continue;
            }
            index.insert(coin.clone(), coins.len());
            coins.push(coin);
        }

        Self {
            coins,
            index,
            pivot,
        }
    }

    /// Parse a comma-separated list such as `btc,eth, sol`.
    pub fn parse(list: &str, pivot: &str) -> Self {
        let parts: Vec<&str> = list.split(',').collect();
        Self::new(&parts, pivot)
    }

    pub fn len(&self) -> usize {
        self.coins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coins.is_empty()
    }

    pub fn pivot(&self) -> &Coin {
        &self.pivot
    }

    pub fn coins(&self) -> &[Coin] {
        &self.coins
    }

    pub fn coin(&self, idx: usize) -> &Coin {
        &self.coins[idx]
    }

    pub fn index_of(&self, symbol: &str) -> Option<usize> {
        self.index.get(&Coin::new(symbol)).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Coin> {
        self.coins.iter()
    }

    /// Keep only coins accepted by `keep`; the pivot always survives.
    pub fn retain<F: Fn(&Coin) -> bool>(&self, keep: F) -> Self {
        let kept: Vec<&str> = self
            .coins
            .iter()
            .filter(|c| **c == self.pivot || keep(c))
            .map(Coin::as_str)
            .collect();
        Self::new(&kept, self.pivot.as_str())
    }

    /// Every ordered off-diagonal coordinate pair.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        let n = self.len();
        (0..n).flat_map(move |i| (0..n).filter(move |&j| j != i).map(move |j| (i, j)))
    }
}
