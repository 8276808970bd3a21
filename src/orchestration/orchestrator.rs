use crate::anchors::{AnchorResolvers, OpeningTsCache};
use crate::config::Config;
use crate::datasource::{StoreError, TickerStore, TimeSeriesStore};
use crate::domain::{SessionKey, TimeMs};
use crate::engine::{DerivedGrids, EngineError, LiveGridBuilder, LiveGrids, MatrixEngine, StorePreviousValues};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// Live grids together with the matrices derived from them.
#[derive(Debug, Clone, Serialize)]
pub struct MatrixReport {
    pub now: TimeMs,
    pub session: SessionKey,
    #[serde(flatten)]
    pub live: LiveGrids,
    pub derived: DerivedGrids,
}

/// Request-level entry point: live grids first, then derivation against them.
#[derive(Clone)]
pub struct MatrixService {
    live: LiveGridBuilder,
    engine: MatrixEngine,
    anchors: Arc<AnchorResolvers>,
}

impl MatrixService {
    pub fn new(live: LiveGridBuilder, engine: MatrixEngine, anchors: Arc<AnchorResolvers>) -> Self {
        Self {
            live,
            engine,
            anchors,
        }
    }

    /// Wire stores and the opening cache according to `config`.
    pub fn from_stores(
        store: Arc<dyn TimeSeriesStore>,
        ticker: Arc<dyn TickerStore>,
        cache: Arc<dyn OpeningTsCache>,
        config: &Config,
    ) -> Result<Self, EngineError> {
        let anchors = Arc::new(AnchorResolvers::new(
            store.clone(),
            cache,
            config.opening_window.clone(),
            config.trade_convention,
        ));
        let engine = MatrixEngine::builder()
            .previous(Arc::new(StorePreviousValues::new(store)))
            .anchors(anchors.clone())
            .build()?;
        let live = LiveGridBuilder::new(ticker, &config.pivot, config.pct24h_hours);
        Ok(Self::new(live, engine, anchors))
    }

    pub fn anchors(&self) -> &AnchorResolvers {
        &self.anchors
    }

    pub fn live_builder(&self) -> &LiveGridBuilder {
        &self.live
    }

    pub async fn live_grids<S: AsRef<str>>(&self, requested: &[S]) -> Result<LiveGrids, ServiceError> {
        Ok(self.live.build_live_grids(requested).await?)
    }

    /// Build live grids for `requested` and derive matrices at `now`.
    pub async fn matrices_at<S: AsRef<str>>(
        &self,
        requested: &[S],
        session: &SessionKey,
        now: TimeMs,
    ) -> Result<MatrixReport, ServiceError> {
        let live = self.live.build_live_grids_at(requested, now).await?;
        let derived = self
            .engine
            .compute(&live.coins, now, &live.benchmark.grid, session)
            .await?;

        tracing::info!(
            coins = live.coins.len(),
            %session,
            opening_ts = ?derived.opening_ts,
            snapshot_ts = ?derived.snapshot_ts,
            trade_ts = ?derived.trade_ts,
            "matrices served"
        );

        Ok(MatrixReport {
            now,
            session: session.clone(),
            live,
            derived,
        })
    }

    pub async fn matrices<S: AsRef<str>>(
        &self,
        requested: &[S],
        session: &SessionKey,
    ) -> Result<MatrixReport, ServiceError> {
        self.matrices_at(requested, session, TimeMs::now()).await
    }
}

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}
