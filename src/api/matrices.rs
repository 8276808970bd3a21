use axum::extract::{Query, State};
use axum::Json;
use serde::Deserialize;

use crate::api::{parse_coins, AppState};
use crate::domain::SessionKey;
use crate::engine::LiveGrids;
use crate::error::AppError;
use crate::orchestration::MatrixReport;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LiveQuery {
    pub coins: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MatricesQuery {
    pub coins: Option<String>,
    pub session: Option<String>,
}

pub async fn get_live(
    Query(params): Query<LiveQuery>,
    State(state): State<AppState>,
) -> Result<Json<LiveGrids>, AppError> {
    let coins = parse_coins(params.coins.as_deref())?;
    let live = state.service.live_grids(&coins).await?;
    Ok(Json(live))
}

pub async fn get_matrices(
    Query(params): Query<MatricesQuery>,
    State(state): State<AppState>,
) -> Result<Json<MatrixReport>, AppError> {
    let coins = parse_coins(params.coins.as_deref())?;
    let session = match params.session.as_deref() {
        Some(s) => SessionKey::or_global(Some(s)),
        None => state.config.default_session.clone(),
    };
    let report = state.service.matrices(&coins, &session).await?;
    Ok(Json(report))
}
