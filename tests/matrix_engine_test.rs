use crossrate::db::migrations::init_memory_db;
use crossrate::db::MatrixValueRow;
use crossrate::domain::{MatrixKind, PairValue, SessionKey, TimeMs};
use crossrate::{
    Config, InMemoryOpeningTsCache, MatrixService, Repository, SqliteTickerStore,
    SqliteTimeSeriesStore,
};
use std::collections::HashMap;
use std::sync::Arc;

const HOUR: i64 = 3_600_000;

fn config(trade_convention: &str) -> Config {
    let mut env = HashMap::new();
    env.insert("DATABASE_PATH".to_string(), ":memory:".to_string());
    env.insert("TRADE_CONVENTION".to_string(), trade_convention.to_string());
    Config::from_env_map(env).unwrap()
}

async fn service(repo: Arc<Repository>, trade_convention: &str) -> MatrixService {
    MatrixService::from_stores(
        Arc::new(SqliteTimeSeriesStore::new(repo.clone())),
        Arc::new(SqliteTickerStore::new(repo)),
        Arc::new(InMemoryOpeningTsCache::new()),
        &config(trade_convention),
    )
    .unwrap()
}

fn benchmark(session: &SessionKey, value: f64, hours: i64) -> MatrixValueRow {
    MatrixValueRow::new(
        session,
        MatrixKind::Benchmark,
        PairValue::new("BTC", "USDT", value),
        TimeMs::new(hours * HOUR),
    )
}

fn assert_close(actual: Option<f64>, expected: f64) {
    let v = actual.expect("value present");
    assert!((v - expected).abs() < 1e-9, "expected {expected}, got {v}");
}

#[tokio::test]
async fn test_all_anchors_resolved_from_sqlite() {
    let repo = Arc::new(Repository::new(init_memory_db().await.unwrap()));
    let session = SessionKey::new("s1");
    let now = TimeMs::new(100 * HOUR);

    repo.insert_tick("BTCUSDT", 40_000.0, TimeMs::new(70 * HOUR))
        .await
        .unwrap();
    repo.insert_tick("BTCUSDT", 50_000.0, now).await.unwrap();
    repo.insert_snapshot_stamp(TimeMs::new(95 * HOUR)).await.unwrap();
    repo.insert_matrix_values(&[
        benchmark(&session, 48_000.0, 90).opening(),
        benchmark(&session, 47_000.0, 94),
        benchmark(&session, 49_000.0, 99),
        MatrixValueRow::new(
            &session,
            MatrixKind::BenchmarkTrade,
            PairValue::new("BTC", "USDT", 45_000.0),
            TimeMs::new(96 * HOUR),
        )
        .trade_stamped_at(TimeMs::new(96 * HOUR)),
    ])
    .await
    .unwrap();

    let report = service(repo, "trade")
        .await
        .matrices_at(&["BTC"], &session, now)
        .await
        .unwrap();
    let derived = &report.derived;
    let (btc, usdt) = (0, 1);

    assert_eq!(derived.opening_ts, Some(TimeMs::new(90 * HOUR)));
    assert_eq!(derived.snapshot_ts, Some(TimeMs::new(94 * HOUR)));
    assert_eq!(derived.trade_ts, Some(TimeMs::new(96 * HOUR)));

    let id_pct = 1_000.0 / 49_000.0;
    assert_close(derived.id_pct.get(btc, usdt), id_pct);
    assert_eq!(derived.pct_drv.get(btc, usdt), None);
    assert_close(derived.delta.get(btc, usdt), 2_040.816_326_530_612);

    let pct_snap = (47_000.0 - 50_000.0) / 47_000.0;
    assert_close(derived.pct_snap.get(btc, usdt), pct_snap);
    assert_close(derived.snap.get(btc, usdt), (1.0 + id_pct) * pct_snap);

    let pct_traded = (45_000.0 - 50_000.0) / 45_000.0;
    assert_close(derived.pct_traded.get(btc, usdt), pct_traded);
    assert_close(derived.traded.get(btc, usdt), (1.0 + id_pct) * pct_traded);

    // No reciprocal rows were recorded, so the reverse direction stays empty.
    assert_eq!(derived.id_pct.get(usdt, btc), None);
    assert_eq!(derived.pct_ref.get(usdt, btc), None);
    assert_eq!(derived.snap.get(usdt, btc), None);
}

#[tokio::test]
async fn test_traded_convention_and_missing_opening() {
    let repo = Arc::new(Repository::new(init_memory_db().await.unwrap()));
    let session = SessionKey::new("s2");
    let now = TimeMs::new(100 * HOUR);

    repo.insert_tick("BTCUSDT", 50_000.0, now).await.unwrap();
    repo.insert_matrix_values(&[
        benchmark(&session, 46_000.0, 97).traded(),
        benchmark(&session, 49_000.0, 99),
    ])
    .await
    .unwrap();

    let report = service(repo, "traded")
        .await
        .matrices_at(&["BTC"], &session, now)
        .await
        .unwrap();
    let derived = &report.derived;

    assert_eq!(derived.trade_ts, Some(TimeMs::new(97 * HOUR)));
    assert_close(
        derived.pct_traded.get(0, 1),
        (46_000.0 - 50_000.0) / 46_000.0,
    );

    // Opening falls back to a timestamp with no values behind it.
    assert!(derived.opening_ts.is_some());
    assert_eq!(derived.pct_ref.get(0, 1), None);
    assert_eq!(derived.delta.get(0, 1), None);
    assert_eq!(derived.snapshot_ts, None);
}

#[tokio::test]
async fn test_sessions_do_not_share_anchors() {
    let repo = Arc::new(Repository::new(init_memory_db().await.unwrap()));
    let now = TimeMs::new(100 * HOUR);

    repo.insert_tick("BTCUSDT", 50_000.0, now).await.unwrap();
    repo.insert_matrix_values(&[benchmark(&SessionKey::new("a"), 48_000.0, 90).opening()])
        .await
        .unwrap();

    let report = service(repo, "trade")
        .await
        .matrices_at(&["BTC"], &SessionKey::new("b"), now)
        .await
        .unwrap();

    assert_ne!(report.derived.opening_ts, Some(TimeMs::new(90 * HOUR)));
    assert_eq!(report.derived.pct_ref.get(0, 1), None);
}
