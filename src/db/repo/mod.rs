//! Repository layer for database operations.
//!
//! This module provides the `Repository` struct for all database operations.
//! Methods are organized across submodules by table:
//! - `mod.rs` - Matrix time series and the snapshot registry
//! - `ticks.rs` - Raw ticker prices

mod ticks;

use crate::datasource::AnchorStamp;
use crate::domain::{MatrixKind, PairValue, SessionKey, TimeMs};
use sqlx::sqlite::SqlitePool;
use sqlx::Row;

/// One row of the `matrix_values` table.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixValueRow {
    pub session: SessionKey,
    pub kind: MatrixKind,
    pub value: PairValue,
    pub ts: TimeMs,
    pub opening_stamp: bool,
    pub trade_stamp: bool,
    pub trade_stamp_ts: Option<TimeMs>,
}

impl MatrixValueRow {
    /// An unstamped value.
    pub fn new(session: &SessionKey, kind: MatrixKind, value: PairValue, ts: TimeMs) -> Self {
        Self {
            session: session.clone(),
            kind,
            value,
            ts,
            opening_stamp: false,
            trade_stamp: false,
            trade_stamp_ts: None,
        }
    }

    pub fn opening(mut self) -> Self {
        self.opening_stamp = true;
        self
    }

    pub fn traded(mut self) -> Self {
        self.trade_stamp = true;
        self
    }

    pub fn trade_stamped_at(mut self, ts: TimeMs) -> Self {
        self.trade_stamp_ts = Some(ts);
        self
    }
}

/// Column holding the authoritative timestamp and the row filter of a stamp convention.
fn stamp_columns(stamp: AnchorStamp) -> (&'static str, &'static str) {
    match stamp {
        AnchorStamp::Opening => ("ts_ms", "opening_stamp = 1"),
        AnchorStamp::Trade => ("trade_stamp_ts", "trade_stamp_ts IS NOT NULL"),
        AnchorStamp::Traded => ("ts_ms", "trade_stamp = 1"),
    }
}

/// Repository for database operations.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Repository { pool }
    }

    // =========================================================================
    // Matrix value writes (seeding / host application)
    // =========================================================================

    /// Insert matrix rows in a single transaction.
    ///
    /// # Errors
    /// Returns an error if the transaction fails.
    pub async fn insert_matrix_values(&self, rows: &[MatrixValueRow]) -> Result<usize, sqlx::Error> {
        if rows.is_empty() {
            return Ok(0);
        }

        let mut tx = self.pool.begin().await?;
        for row in rows {
            sqlx::query(
                r#"
                INSERT INTO matrix_values
                (app_session_id, matrix_type, base, quote, value, ts_ms, opening_stamp, trade_stamp, trade_stamp_ts)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(row.session.as_str())
            .bind(row.kind.as_str())
            .bind(row.value.base.as_str())
            .bind(row.value.quote.as_str())
            .bind(row.value.value)
            .bind(row.ts.as_ms())
            .bind(row.opening_stamp as i32)
            .bind(row.trade_stamp as i32)
            .bind(row.trade_stamp_ts.map(|t| t.as_ms()))
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(rows.len())
    }

    /// Register a global snapshot stamp.
    pub async fn insert_snapshot_stamp(&self, stamp: TimeMs) -> Result<(), sqlx::Error> {
        sqlx::query("INSERT INTO snapshot_registry (snapshot_stamp) VALUES (?)")
            .bind(stamp.as_ms())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    // =========================================================================
    // Matrix value reads
    // =========================================================================

    /// Latest value of `(kind, base, quote)` strictly before `before`.
    pub async fn query_previous_value(
        &self,
        kind: MatrixKind,
        base: &str,
        quote: &str,
        before: TimeMs,
    ) -> Result<Option<f64>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT value
            FROM matrix_values
            WHERE matrix_type = ? AND base = ? AND quote = ? AND ts_ms < ?
            ORDER BY ts_ms DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(kind.as_str())
        .bind(base)
        .bind(quote)
        .bind(before.as_ms())
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| r.get::<f64, _>("value")))
    }

    /// Timestamp of the newest stamp of a convention within a session.
    pub async fn query_latest_stamp_ts(
        &self,
        stamp: AnchorStamp,
        session: &SessionKey,
    ) -> Result<Option<TimeMs>, sqlx::Error> {
        let (ts_column, filter) = stamp_columns(stamp);
        let sql = format!(
            "SELECT MAX({ts_column}) AS ts FROM matrix_values \
             WHERE matrix_type = ? AND app_session_id = ? AND {filter}"
        );
        let row = sqlx::query(&sql)
            .bind(stamp.kind().as_str())
            .bind(session.as_str())
            .fetch_one(&self.pool)
            .await?;

        Ok(row.get::<Option<i64>, _>("ts").map(TimeMs::new))
    }

    /// Rows recorded under the stamp of a convention at `ts`.
    pub async fn query_stamped_rows(
        &self,
        stamp: AnchorStamp,
        session: &SessionKey,
        ts: TimeMs,
    ) -> Result<Vec<PairValue>, sqlx::Error> {
        let (ts_column, filter) = stamp_columns(stamp);
        let sql = format!(
            "SELECT base, quote, value FROM matrix_values \
             WHERE matrix_type = ? AND app_session_id = ? AND {filter} AND {ts_column} = ? \
             ORDER BY id ASC"
        );
        let rows = sqlx::query(&sql)
            .bind(stamp.kind().as_str())
            .bind(session.as_str())
            .bind(ts.as_ms())
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(pair_from_row).collect())
    }

    /// Newest global snapshot registry stamp.
    pub async fn query_latest_snapshot_stamp(&self) -> Result<Option<TimeMs>, sqlx::Error> {
        let row = sqlx::query("SELECT MAX(snapshot_stamp) AS stamp FROM snapshot_registry")
            .fetch_one(&self.pool)
            .await?;
        Ok(row.get::<Option<i64>, _>("stamp").map(TimeMs::new))
    }

    /// Newest `ts_ms` for a kind at or before `at` within a session.
    pub async fn query_latest_ts_at_or_before(
        &self,
        kind: MatrixKind,
        session: &SessionKey,
        at: TimeMs,
    ) -> Result<Option<TimeMs>, sqlx::Error> {
        let row = sqlx::query(
            r#"
            SELECT MAX(ts_ms) AS ts
            FROM matrix_values
            WHERE matrix_type = ? AND app_session_id = ? AND ts_ms <= ?
            "#,
        )
        .bind(kind.as_str())
        .bind(session.as_str())
        .bind(at.as_ms())
        .fetch_one(&self.pool)
        .await?;

        Ok(row.get::<Option<i64>, _>("ts").map(TimeMs::new))
    }

    /// All values of a kind recorded at exactly `ts` within a session.
    pub async fn query_rows_at(
        &self,
        kind: MatrixKind,
        session: &SessionKey,
        ts: TimeMs,
    ) -> Result<Vec<PairValue>, sqlx::Error> {
        let rows = sqlx::query(
            r#"
            SELECT base, quote, value
            FROM matrix_values
            WHERE matrix_type = ? AND app_session_id = ? AND ts_ms = ?
            ORDER BY id ASC
            "#,
        )
        .bind(kind.as_str())
        .bind(session.as_str())
        .bind(ts.as_ms())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(pair_from_row).collect())
    }
}

fn pair_from_row(row: &sqlx::sqlite::SqliteRow) -> PairValue {
    PairValue::new(
        row.get::<String, _>("base").as_str(),
        row.get::<String, _>("quote").as_str(),
        row.get::<f64, _>("value"),
    )
}
