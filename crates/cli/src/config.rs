use ledgersort_engine::ScoringConfig;
use std::env;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} is required but not set")]
    Missing(&'static str),
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid scoring config in {path}: {source}")]
    Scoring {
        path: PathBuf,
        source: ledgersort_engine::EngineError,
    },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_path: PathBuf,
    pub scoring_path: Option<PathBuf>,
    pub log_level: String,
}

impl AppConfig {
    /// Loads `.env` if present, then reads `LEDGERSORT_DB` (required),
    /// `LEDGERSORT_SCORING` and `LOG_LEVEL`.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            database_path: env::var("LEDGERSORT_DB")
                .map(PathBuf::from)
                .map_err(|_| ConfigError::Missing("LEDGERSORT_DB"))?,
            scoring_path: env::var("LEDGERSORT_SCORING").ok().map(PathBuf::from),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_owned()),
        })
    }

    pub fn scoring(&self) -> Result<ScoringConfig, ConfigError> {
        let Some(path) = &self.scoring_path else {
            return Ok(ScoringConfig::default());
        };
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.clone(),
            source,
        })?;
        ScoringConfig::from_toml(&content).map_err(|source| ConfigError::Scoring {
            path: path.clone(),
            source,
        })
    }
}
