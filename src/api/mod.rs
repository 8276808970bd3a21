pub mod anchors;
pub mod health;
pub mod matrices;

use crate::config::Config;
use crate::datasource::TimeSeriesStore;
use crate::error::AppError;
use crate::orchestration::MatrixService;
use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub service: Arc<MatrixService>,
    pub store: Arc<dyn TimeSeriesStore>,
}

impl AppState {
    pub fn new(config: Config, service: Arc<MatrixService>, store: Arc<dyn TimeSeriesStore>) -> Self {
        Self {
            config,
            service,
            store,
        }
    }
}

/// Split a `coins=BTC,ETH` query value; at least one symbol is required.
pub(crate) fn parse_coins(input: Option<&str>) -> Result<Vec<String>, AppError> {
    let coins: Vec<String> = input
        .unwrap_or("")
        .split(',')
        .map(|s| s.trim().to_ascii_uppercase())
        .filter(|s| !s.is_empty())
        .collect();
    if coins.is_empty() {
        return Err(AppError::BadRequest("coins is required".to_string()));
    }
    if let Some(bad) = coins.iter().find(|c| !c.chars().all(|ch| ch.is_ascii_alphanumeric())) {
        return Err(AppError::BadRequest(format!("Invalid coin symbol: {}", bad)));
    }
    Ok(coins)
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health::health))
        .route("/ready", get(health::ready))
        .route("/v1/live", get(matrices::get_live))
        .route("/v1/matrices", get(matrices::get_matrices))
        .route("/v1/anchors/:kind", get(anchors::get_anchor))
        .layer(cors)
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coins() {
        assert_eq!(
            parse_coins(Some("btc, eth,,")).unwrap(),
            vec!["BTC".to_string(), "ETH".to_string()]
        );
        assert!(matches!(parse_coins(None), Err(AppError::BadRequest(_))));
        assert!(matches!(parse_coins(Some(" , ")), Err(AppError::BadRequest(_))));
        assert!(matches!(
            parse_coins(Some("BTC,E-TH")),
            Err(AppError::BadRequest(_))
        ));
    }
}
