//! Configuration management

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::constants::MASTER_DEFAULT_PASSWORD;

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub app: AppSettings,
    pub storage: StorageSettings,
    pub logging: LoggingSettings,
    pub seed: SeedSettings,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppSettings {
    pub env: String,
    pub name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageSettings {
    pub data_dir: String,
    /// Upper bound on the total size of all stored blobs, mimicking a browser quota.
    pub quota_bytes: Option<u64>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub level: String,
    pub json: bool,
    pub file_dir: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SeedSettings {
    pub master_password: String,
}

impl Default for SeedSettings {
    fn default() -> Self {
        Self { master_password: MASTER_DEFAULT_PASSWORD.to_string() }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let env = std::env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let config = Config::builder()
            .set_default("app.env", "development")?
            .set_default("app.name", "kasir")?
            .set_default("storage.data_dir", "data")?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            .set_default("seed.master_password", MASTER_DEFAULT_PASSWORD)?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("KASIR").separator("__").try_parsing(true))
            .build()?;
        config.try_deserialize()
    }
}
