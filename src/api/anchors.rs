use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use crate::api::{parse_coins, AppState};
use crate::domain::{AnchorGrid, CoinUniverse, SessionKey, TimeMs};
use crate::error::AppError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnchorQuery {
    pub coins: Option<String>,
    pub session: Option<String>,
    pub window: Option<String>,
    pub opening_ts: Option<i64>,
}

#[derive(Debug, serde::Serialize)]
pub struct AnchorResponse {
    pub kind: String,
    pub coins: CoinUniverse,
    #[serde(flatten)]
    pub anchor: AnchorGrid,
}

/// Resolve one anchor grid (`opening`, `snapshot`, `trade` or `traded`).
pub async fn get_anchor(
    Path(kind): Path<String>,
    Query(params): Query<AnchorQuery>,
    State(state): State<AppState>,
) -> Result<Json<AnchorResponse>, AppError> {
    let coins = parse_coins(params.coins.as_deref())?;
    let universe = CoinUniverse::new(&coins, &state.config.pivot);
    let session = match params.session.as_deref() {
        Some(s) => SessionKey::or_global(Some(s)),
        None => state.config.default_session.clone(),
    };
    let anchors = state.service.anchors();

    let anchor = match kind.as_str() {
        "opening" => {
            anchors
                .opening
                .fetch_opening_grid(
                    &universe,
                    Some(&session),
                    params.window.as_deref(),
                    params.opening_ts.map(TimeMs::new),
                )
                .await
        }
        "snapshot" => {
            anchors
                .snapshot
                .fetch_snapshot_grid(&universe, Some(&session))
                .await
        }
        "trade" => anchors.trade.fetch_trade_grid(&universe, Some(&session)).await,
        "traded" => anchors.trade.fetch_traded_grid(&universe, Some(&session)).await,
        other => return Err(AppError::NotFound(format!("Unknown anchor kind: {}", other))),
    };

    Ok(Json(AnchorResponse {
        kind,
        coins: universe,
        anchor,
    }))
}
