//! Configuration for Products API

use core_config::{app_info, env_or_default, env_parse, server::ServerConfig, AppInfo, ConfigError, FromEnv};
use database::postgres::PostgresConfig;
use strum::{Display, EnumString};

pub use core_config::Environment;

/// Where the product catalog lives
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum StoreBackend {
    #[default]
    Postgres,
    /// Process-local catalog, lost on restart
    Memory,
}

impl FromEnv for StoreBackend {
    fn from_env() -> Result<Self, ConfigError> {
        let value = env_or_default("STORE_BACKEND", "postgres");
        value.parse().map_err(|_| ConfigError::InvalidChoice {
            key: "STORE_BACKEND".to_string(),
            value,
            expected: "postgres, memory".to_string(),
        })
    }
}

/// Application configuration
#[derive(Clone, Debug)]
pub struct Config {
    pub app: AppInfo,
    pub store: StoreBackend,
    /// Present only for the PostgreSQL backend
    pub database: Option<PostgresConfig>,
    pub run_migrations: bool,
    pub server: ServerConfig,
    pub environment: Environment,
}

impl Config {
    pub fn from_env() -> eyre::Result<Self> {
        let environment = Environment::from_env();
        let store = StoreBackend::from_env()?;
        let server = ServerConfig::from_env()?; // HOST=0.0.0.0, PORT=8080 by default

        // DATABASE_URL is only required when the catalog is stored in PostgreSQL
        let database = match store {
            StoreBackend::Postgres => Some(PostgresConfig::from_env()?),
            StoreBackend::Memory => None,
        };
        let run_migrations = env_parse("RUN_MIGRATIONS", "true")?;

        Ok(Self {
            app: app_info!(),
            store,
            database,
            run_migrations,
            server,
            environment,
        })
    }
}
