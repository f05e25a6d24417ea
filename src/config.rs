// ⚙️ Configuration - environment variables with defaults
//
//   CREAMERY_DB_PATH      SQLite file               (creamery.db)
//   CREAMERY_CURRENCY     currency symbol           ($)
//   CREAMERY_UNIT_POLICY  lenient | strict          (lenient)
//   CREAMERY_ELASTICITY   optimizer demand curve    (-1.5)
//   CREAMERY_LOG_LEVEL    default tracing filter    (info)
//   CREAMERY_BIND_ADDR    API server address        (0.0.0.0:3000)

use crate::simulator::DEFAULT_ELASTICITY;
use crate::units::ConversionPolicy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub db_path: PathBuf,
    pub currency: String,
    pub unit_policy: ConversionPolicy,
    pub elasticity: f64,
    pub log_level: String,
    pub bind_addr: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            db_path: PathBuf::from("creamery.db"),
            currency: "$".to_string(),
            unit_policy: ConversionPolicy::Lenient,
            elasticity: DEFAULT_ELASTICITY,
            log_level: "info".to_string(),
            bind_addr: "0.0.0.0:3000".to_string(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from any key lookup; missing keys keep their defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(path) = lookup("CREAMERY_DB_PATH") {
            config.db_path = PathBuf::from(path);
        }
        if let Some(currency) = lookup("CREAMERY_CURRENCY") {
            config.currency = currency;
        }
        if let Some(policy) = lookup("CREAMERY_UNIT_POLICY") {
            config.unit_policy = policy
                .parse()
                .with_context(|| format!("CREAMERY_UNIT_POLICY must be lenient or strict: {:?}", policy))?;
        }
        if let Some(raw) = lookup("CREAMERY_ELASTICITY") {
            config.elasticity = raw
                .trim()
                .parse()
                .with_context(|| format!("CREAMERY_ELASTICITY is not a number: {:?}", raw))?;
        }
        if let Some(level) = lookup("CREAMERY_LOG_LEVEL") {
            config.log_level = level;
        }
        if let Some(addr) = lookup("CREAMERY_BIND_ADDR") {
            config.bind_addr = addr;
        }

        Ok(config)
    }

    /// Install the global tracing subscriber. RUST_LOG wins over the configured level.
    pub fn init_logging(&self) {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(&self.log_level));

        // A subscriber may already be installed (tests, embedding); keep it
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .try_init();
    }
}
