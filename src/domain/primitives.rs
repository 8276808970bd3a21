//! Domain primitives: TimeMs, Coin, SessionKey, MatrixKind, PairValue.

use serde::{Deserialize, Serialize};

/// Time in milliseconds since Unix epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeMs(pub i64);

impl TimeMs {
    /// Create a TimeMs from milliseconds.
    pub fn new(ms: i64) -> Self {
        TimeMs(ms)
    }

    /// Current wall-clock time.
    pub fn now() -> Self {
        TimeMs(chrono::Utc::now().timestamp_millis())
    }

    /// Get the underlying milliseconds value.
    pub fn as_ms(&self) -> i64 {
        self.0
    }

    /// This time shifted back by a number of hours.
    pub fn hours_before(&self, hours: i64) -> Self {
        TimeMs(self.0.saturating_sub(hours.saturating_mul(3_600_000)))
    }
}

impl std::fmt::Display for TimeMs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Coin/asset symbol (e.g., "BTC", "ETH"), always upper-cased.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Coin(pub String);

impl Coin {
    /// Create a Coin, normalizing to trimmed upper case.
    pub fn new(coin: &str) -> Self {
        Coin(coin.trim().to_ascii_uppercase())
    }

    /// Get the coin as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for Coin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Logical session scope used to isolate persisted anchor rows.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionKey(pub String);

impl SessionKey {
    pub const GLOBAL: &'static str = "global";

    pub fn new(key: &str) -> Self {
        SessionKey(key.to_string())
    }

    pub fn global() -> Self {
        SessionKey(Self::GLOBAL.to_string())
    }

    /// Resolve an optional caller-supplied key, falling back to `global`.
    pub fn or_global(key: Option<&str>) -> Self {
        match key.map(str::trim).filter(|s| !s.is_empty()) {
            Some(k) => SessionKey::new(k),
            None => SessionKey::global(),
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for SessionKey {
    fn default() -> Self {
        SessionKey::global()
    }
}

impl std::fmt::Display for SessionKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Matrix kind tag of a persisted time-series row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatrixKind {
    Benchmark,
    IdPct,
    BenchmarkTrade,
}

impl MatrixKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MatrixKind::Benchmark => "benchmark",
            MatrixKind::IdPct => "id_pct",
            MatrixKind::BenchmarkTrade => "benchmark_trade",
        }
    }
}

impl std::fmt::Display for MatrixKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One persisted pairwise value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PairValue {
    pub base: Coin,
    pub quote: Coin,
    pub value: f64,
}

impl PairValue {
    pub fn new(base: &str, quote: &str, value: f64) -> Self {
        Self {
            base: Coin::new(base),
            quote: Coin::new(quote),
            value,
        }
    }
}

/// Rows recorded under a single resolved stamp.
#[derive(Debug, Clone, PartialEq)]
pub struct StampedRows {
    pub ts: TimeMs,
    pub rows: Vec<PairValue>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coin_normalized() {
        assert_eq!(Coin::new(" btc ").as_str(), "BTC");
    }

    #[test]
    fn test_session_or_global() {
        assert_eq!(SessionKey::or_global(None).as_str(), "global");
        assert_eq!(SessionKey::or_global(Some("  ")).as_str(), "global");
        assert_eq!(SessionKey::or_global(Some("badge-7")).as_str(), "badge-7");
    }

    #[test]
    fn test_matrix_kind_serialization() {
        let json = serde_json::to_string(&MatrixKind::BenchmarkTrade).unwrap();
        assert_eq!(json, "\"benchmark_trade\"");
        assert_eq!(MatrixKind::IdPct.as_str(), "id_pct");
    }

    #[test]
    fn test_hours_before() {
        let t = TimeMs::new(10 * 3_600_000);
        assert_eq!(t.hours_before(24).as_ms(), -14 * 3_600_000);
        assert_eq!(t.hours_before(1).as_ms(), 9 * 3_600_000);
    }

    #[test]
    fn test_timems_ordering() {
        let t1 = TimeMs::new(1000);
        let t2 = TimeMs::new(2000);
        assert!(t1 < t2);
    }
}
