//! Ticker price operations for the repository.

use crate::datasource::TickerPrice;
use crate::domain::TimeMs;
use sqlx::Row;

use super::Repository;

impl Repository {
    /// Record a tick. A repeated `(symbol, ts)` overwrites the price.
    pub async fn insert_tick(&self, symbol: &str, price: f64, ts: TimeMs) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO ticks (symbol, price, ts_ms)
            VALUES (?, ?, ?)
            ON CONFLICT(symbol, ts_ms) DO UPDATE SET price = excluded.price
            "#,
        )
        .bind(symbol)
        .bind(price)
        .bind(ts.as_ms())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Newest tick for a symbol.
    pub async fn query_latest_tick(&self, symbol: &str) -> Result<Option<TickerPrice>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT price, ts_ms
            FROM ticks
            WHERE symbol = ?
            ORDER BY ts_ms DESC
            LIMIT 1
            "#,
        )
        .bind(symbol)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| TickerPrice {
            price: r.get::<f64, _>("price"),
            ts: TimeMs::new(r.get::<i64, _>("ts_ms")),
        }))
    }

    /// Newest tick price for a symbol at or before `at`.
    pub async fn query_tick_price_at_or_before(
        &self,
        symbol: &str,
        at: TimeMs,
    ) -> Result<Option<f64>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT price
            FROM ticks
            WHERE symbol = ? AND ts_ms <= ?
            ORDER BY ts_ms DESC
            LIMIT 1
            "#,
        )
        .bind(symbol)
        .bind(at.as_ms())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.get::<f64, _>("price")))
    }
}

#[cfg(test)]
mod tests {
    use crate::db::migrations::init_memory_db;
    use crate::db::Repository;
    use crate::domain::TimeMs;

    #[tokio::test]
    async fn test_latest_tick_and_at_or_before() {
        let repo = Repository::new(init_memory_db().await.unwrap());
        repo.insert_tick("BTCUSDT", 100.0, TimeMs::new(1000)).await.unwrap();
        repo.insert_tick("BTCUSDT", 110.0, TimeMs::new(2000)).await.unwrap();
        repo.insert_tick("BTCUSDT", 111.0, TimeMs::new(2000)).await.unwrap();

        let latest = repo.query_latest_tick("BTCUSDT").await.unwrap().unwrap();
        assert_eq!(latest.price, 111.0);
        assert_eq!(latest.ts, TimeMs::new(2000));

        let past = repo
            .query_tick_price_at_or_before("BTCUSDT", TimeMs::new(1999))
            .await
            .unwrap();
        assert_eq!(past, Some(100.0));

        assert!(repo.query_latest_tick("ETHUSDT").await.unwrap().is_none());
    }
}
