//! Derivation of momentum and anchor-relative grids from a live benchmark grid.

use super::providers::{AnchorProvider, PreviousValueProvider, Providers};
use crate::domain::{safe_divide, CoinUniverse, Grid, MatrixKind, SessionKey, TimeMs};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EngineError {
    #[error("matrix engine is not configured: missing {0} provider")]
    Unconfigured(&'static str),
    #[error("live grid dimension {live} does not match universe size {universe}")]
    DimensionMismatch { live: usize, universe: usize },
}

/// Output of one [`MatrixEngine::compute`] call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DerivedGrids {
    /// Change since the last recorded benchmark value.
    pub id_pct: Grid,
    /// First difference of `id_pct`.
    pub pct_drv: Grid,
    /// `(opening - now) / opening`.
    pub pct_ref: Grid,
    /// `pct_ref * id_pct`.
    #[serde(rename = "ref")]
    pub reference: Grid,
    /// `now - opening * (1 + ref)`.
    pub delta: Grid,
    pub pct_snap: Grid,
    pub snap: Grid,
    pub pct_traded: Grid,
    pub traded: Grid,
    pub opening_ts: Option<TimeMs>,
    pub snapshot_ts: Option<TimeMs>,
    pub trade_ts: Option<TimeMs>,
}

impl DerivedGrids {
    fn empty(n: usize) -> Self {
        Self {
            id_pct: Grid::empty(n),
            pct_drv: Grid::empty(n),
            pct_ref: Grid::empty(n),
            reference: Grid::empty(n),
            delta: Grid::empty(n),
            pct_snap: Grid::empty(n),
            snap: Grid::empty(n),
            pct_traded: Grid::empty(n),
            traded: Grid::empty(n),
            opening_ts: None,
            snapshot_ts: None,
            trade_ts: None,
        }
    }
}

/// Derived values for a single ordered pair.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CellMetrics {
    pub id_pct: Option<f64>,
    pub pct_drv: Option<f64>,
    pub pct_ref: Option<f64>,
    pub reference: Option<f64>,
    pub delta: Option<f64>,
    pub pct_snap: Option<f64>,
    pub snap: Option<f64>,
    pub pct_traded: Option<f64>,
    pub traded: Option<f64>,
}

/// Inputs gathered for a single ordered pair.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CellInputs {
    pub bm_now: Option<f64>,
    pub bm_prev: Option<f64>,
    pub prev_id: Option<f64>,
    pub opening: Option<f64>,
    pub snapshot: Option<f64>,
    pub trade: Option<f64>,
}

fn diff(a: Option<f64>, b: Option<f64>) -> Option<f64> {
    Some(a? - b?)
}

/// Percentage move from the previous value: `(now - prev) / prev`.
pub fn momentum(bm_now: Option<f64>, bm_prev: Option<f64>) -> Option<f64> {
    safe_divide(diff(bm_now, bm_prev), bm_prev)
}

/// Anchor-relative drift: `(anchor - now) / anchor`.
pub fn anchor_pct(anchor: Option<f64>, bm_now: Option<f64>) -> Option<f64> {
    safe_divide(diff(anchor, bm_now), anchor)
}

/// Apply every formula to one pair's inputs.
pub fn derive_cell(inputs: &CellInputs) -> CellMetrics {
    let id_pct = momentum(inputs.bm_now, inputs.bm_prev);

    let pct_drv = match (id_pct, inputs.prev_id) {
        (Some(id), Some(prev)) if prev.is_finite() => Some(id - prev),
        _ => None,
    };

    let pct_ref = anchor_pct(inputs.opening, inputs.bm_now);
    let reference = match (pct_ref, id_pct) {
        (Some(p), Some(id)) => Some(p * id),
        _ => None,
    };
    let delta = match (inputs.bm_now, inputs.opening, reference) {
        (Some(now), Some(open), Some(r)) => Some(now - open * (1.0 + r)),
        _ => None,
    };

    let pct_snap = anchor_pct(inputs.snapshot, inputs.bm_now);
    let snap = scale_by_momentum(id_pct, pct_snap);

    let pct_traded = anchor_pct(inputs.trade, inputs.bm_now);
    let traded = scale_by_momentum(id_pct, pct_traded);

    CellMetrics {
        id_pct,
        pct_drv,
        pct_ref,
        reference,
        delta,
        pct_snap,
        snap,
        pct_traded,
        traded,
    }
}

fn scale_by_momentum(id_pct: Option<f64>, pct: Option<f64>) -> Option<f64> {
    Some((1.0 + id_pct?) * pct?)
}

/// Combines a live benchmark grid with anchor grids and prior values.
#[derive(Clone)]
pub struct MatrixEngine {
    previous: Arc<dyn PreviousValueProvider>,
    anchors: Arc<dyn AnchorProvider>,
}

impl MatrixEngine {
    pub fn new(providers: Providers) -> Self {
        Self {
            previous: providers.previous,
            anchors: providers.anchors,
        }
    }

    pub fn builder() -> MatrixEngineBuilder {
        MatrixEngineBuilder::default()
    }

    /// Derive every comparison grid for `universe` at `now`.
    ///
    /// Anchors are resolved once per call, in order opening, snapshot, trade.
    /// Missing data in any input leaves the affected cells empty; the only
    /// failure is a live grid whose dimension differs from the universe.
    pub async fn compute(
        &self,
        universe: &CoinUniverse,
        now: TimeMs,
        live: &Grid,
        session: &SessionKey,
    ) -> Result<DerivedGrids, EngineError> {
        let n = universe.len();
        if live.dim() != n {
            return Err(EngineError::DimensionMismatch {
                live: live.dim(),
                universe: n,
            });
        }

        let opening = self.anchors.opening_grid(universe, session).await;
        let snapshot = self.anchors.snapshot_grid(universe, session).await;
        let trade = self.anchors.trade_grid(universe, session).await;

        let mut out = DerivedGrids::empty(n);
        out.opening_ts = opening.ts;
        out.snapshot_ts = snapshot.ts;
        out.trade_ts = trade.ts;

        for (i, j) in universe.pairs() {
            let (base, quote) = (universe.coin(i), universe.coin(j));
            let bm_now = live.get(i, j);

            // Lookups whose result cannot reach any output are skipped.
            let bm_prev = match bm_now {
                Some(_) => {
                    self.previous
                        .previous_value(MatrixKind::Benchmark, base, quote, now)
                        .await
                }
                None => None,
            };
            let prev_id = match momentum(bm_now, bm_prev) {
                Some(_) => {
                    self.previous
                        .previous_value(MatrixKind::IdPct, base, quote, now)
                        .await
                }
                None => None,
            };

            let cell = derive_cell(&CellInputs {
                bm_now,
                bm_prev,
                prev_id,
                opening: opening.grid.get(i, j),
                snapshot: snapshot.grid.get(i, j),
                trade: trade.grid.get(i, j),
            });

            out.id_pct.set(i, j, cell.id_pct);
            out.pct_drv.set(i, j, cell.pct_drv);
            out.pct_ref.set(i, j, cell.pct_ref);
            out.reference.set(i, j, cell.reference);
            out.delta.set(i, j, cell.delta);
            out.pct_snap.set(i, j, cell.pct_snap);
            out.snap.set(i, j, cell.snap);
            out.pct_traded.set(i, j, cell.pct_traded);
            out.traded.set(i, j, cell.traded);
        }

        debug!(
            coins = n,
            %session,
            now = now.as_ms(),
            id_pct_cells = out.id_pct.populated(),
            "derived matrices computed"
        );
        Ok(out)
    }
}

/// Wires providers into a [`MatrixEngine`]; building without all of them fails.
#[derive(Default)]
pub struct MatrixEngineBuilder {
    previous: Option<Arc<dyn PreviousValueProvider>>,
    anchors: Option<Arc<dyn AnchorProvider>>,
}

impl MatrixEngineBuilder {
    pub fn previous(mut self, provider: Arc<dyn PreviousValueProvider>) -> Self {
        self.previous = Some(provider);
        self
    }

    pub fn anchors(mut self, provider: Arc<dyn AnchorProvider>) -> Self {
        self.anchors = Some(provider);
        self
    }

    pub fn build(self) -> Result<MatrixEngine, EngineError> {
        let previous = self.previous.ok_or(EngineError::Unconfigured("previous value"))?;
        let anchors = self.anchors.ok_or(EngineError::Unconfigured("anchor"))?;
        Ok(MatrixEngine::new(Providers { previous, anchors }))
    }
}
