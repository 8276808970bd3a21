pub mod anchors;
pub mod api;
pub mod config;
pub mod datasource;
pub mod db;
pub mod domain;
pub mod engine;
pub mod error;
pub mod orchestration;

pub use anchors::{AnchorResolvers, InMemoryOpeningTsCache, OpeningTsCache, TradeConvention};
pub use config::Config;
pub use datasource::{
    MockTickerStore, MockTimeSeriesStore, SqliteTickerStore, SqliteTimeSeriesStore, StoreError,
    TickerStore, TimeSeriesStore,
};
pub use db::{init_db, Repository};
pub use domain::{safe_divide, AnchorGrid, Coin, CoinUniverse, Grid, SessionKey, TimeMs};
pub use engine::{DerivedGrids, EngineError, LiveGridBuilder, LiveGrids, MatrixEngine};
pub use error::AppError;
pub use orchestration::{MatrixReport, MatrixService};
