use crate::anchors::TradeConvention;
use crate::domain::{SessionKey, DEFAULT_PIVOT};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub database_path: String,
    pub pivot: String,
    pub opening_window: String,
    pub pct24h_hours: i64,
    pub default_session: SessionKey,
    pub trade_convention: TradeConvention,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnv(String),
    #[error("Invalid value for {0}: {1}")]
    InvalidValue(String, String),
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_map(std::env::vars().collect())
    }

    pub fn from_env_map(env_map: HashMap<String, String>) -> Result<Self, ConfigError> {
        let port = env_map
            .get("PORT")
            .map(|s| s.as_str())
            .unwrap_or("8080")
            .parse::<u16>()
            .map_err(|_| {
                ConfigError::InvalidValue("PORT".to_string(), "must be a valid u16".to_string())
            })?;

        let database_path = env_map
            .get("DATABASE_PATH")
            .cloned()
            .ok_or_else(|| ConfigError::MissingEnv("DATABASE_PATH".to_string()))?;

        let pivot = env_map
            .get("PIVOT")
            .map(|s| s.trim().to_ascii_uppercase())
            .unwrap_or_else(|| DEFAULT_PIVOT.to_string());
        if pivot.is_empty() || !pivot.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(ConfigError::InvalidValue(
                "PIVOT".to_string(),
                format!("must be an alphanumeric symbol, got {:?}", pivot),
            ));
        }

        let opening_window = env_map
            .get("OPENING_WINDOW")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "24h".to_string());

        let pct24h_hours = env_map
            .get("PCT24H_HOURS")
            .map(|s| s.as_str())
            .unwrap_or("24")
            .parse::<i64>()
            .ok()
            .filter(|h| *h > 0)
            .ok_or_else(|| {
                ConfigError::InvalidValue(
                    "PCT24H_HOURS".to_string(),
                    "must be a positive integer".to_string(),
                )
            })?;

        let default_session = SessionKey::or_global(env_map.get("DEFAULT_SESSION").map(|s| s.as_str()));

        let trade_convention = match env_map
            .get("TRADE_CONVENTION")
            .map(|s| s.as_str())
            .unwrap_or("trade")
        {
            "trade" => TradeConvention::Trade,
            "traded" => TradeConvention::Traded,
            other => {
                return Err(ConfigError::InvalidValue(
                    "TRADE_CONVENTION".to_string(),
                    format!("must be trade or traded, got {}", other),
                ))
            }
        };

        Ok(Config {
            port,
            database_path,
            pivot,
            opening_window,
            pct24h_hours,
            default_session,
            trade_convention,
        })
    }
}
