use crossrate::anchors::InMemoryOpeningTsCache;
use crossrate::datasource::{SqliteTickerStore, SqliteTimeSeriesStore, TimeSeriesStore};
use crossrate::{api, config::Config, db::init_db, MatrixService, Repository};
use std::net::SocketAddr;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing_subscriber::filter::LevelFilter::INFO.into()),
        )
        .init();

    let config = match Config::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    let pool = match init_db(&config.database_path).await {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Failed to initialize database: {}", e);
            std::process::exit(1);
        }
    };

    let repo = Arc::new(Repository::new(pool));
    let store: Arc<dyn TimeSeriesStore> = Arc::new(SqliteTimeSeriesStore::new(repo.clone()));
    let ticker = Arc::new(SqliteTickerStore::new(repo));
    let cache = Arc::new(InMemoryOpeningTsCache::new());

    let service = match MatrixService::from_stores(store.clone(), ticker, cache, &config) {
        Ok(s) => Arc::new(s),
        Err(e) => {
            eprintln!("Failed to wire matrix engine: {}", e);
            std::process::exit(1);
        }
    };

    let port = config.port;
    tracing::info!(
        pivot = %config.pivot,
        window = %config.opening_window,
        trade_convention = ?config.trade_convention,
        "matrix engine configured"
    );
    let app = api::create_router(api::AppState::new(config, service, store));

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = match tokio::net::TcpListener::bind(&addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    tracing::info!("Server listening on {}", addr);

    if let Err(e) = axum::serve(listener, app).await {
        eprintln!("Server error: {}", e);
        std::process::exit(1);
    }
}
