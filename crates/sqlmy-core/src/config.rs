//! Layered configuration
//!
//! Settings are read, lowest precedence first, from built-in defaults, an
//! optional `sqlmy.toml` file, a `.env` file and `SQLMY_`-prefixed
//! environment variables. Nested keys use `__` in variable names, so
//! `SQLMY_DATABASE__HOST=db.internal` sets `database.host`.

use crate::engine_url::EngineUrl;
use crate::errors::Result;
use crate::logging_facility::Profile;
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use sqlmy_core_types::Sensitive;
use std::path::Path;

/// Prefix of the environment variables read by `Settings::load`
pub const ENV_PREFIX: &str = "SQLMY";

const DEFAULT_FILE: &str = "sqlmy";

/// Parameters for constructing a database handle
///
/// `url`, when present, wins over the individual parts.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    pub url: Option<String>,
    pub dialect: String,
    pub driver: Option<String>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub user: Option<String>,
    pub password: Option<Sensitive<String>>,
    pub database: String,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            url: None,
            dialect: "sqlite".to_string(),
            driver: None,
            host: None,
            port: None,
            user: None,
            password: None,
            database: ":memory:".to_string(),
        }
    }
}

impl ConnectionConfig {
    /// Configuration for a SQLite database at `database` (a path or `:memory:`)
    pub fn sqlite(database: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            ..Self::default()
        }
    }

    /// Build the engine URL these parameters describe
    ///
    /// # Errors
    ///
    /// `InvalidUrl` when the explicit URL or the assembled parts do not parse.
    pub fn engine_url(&self) -> Result<EngineUrl> {
        if let Some(url) = &self.url {
            return EngineUrl::parse(url);
        }
        if self.dialect == "sqlite" {
            return EngineUrl::sqlite(&self.database);
        }
        EngineUrl::from_parts(
            &self.dialect,
            self.driver.as_deref(),
            self.host.as_deref().unwrap_or("localhost"),
            self.port,
            self.user.as_deref(),
            self.password.as_ref().map(|p| p.expose().as_str()),
            &self.database,
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingSettings {
    pub profile: Profile,
    /// Minimum level written to the database log table
    pub level: String,
    /// Value stored in the `environment` column of log rows
    pub environment: Option<String>,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            profile: Profile::default(),
            level: "info".to_string(),
            environment: None,
        }
    }
}

/// Top-level settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub database: ConnectionConfig,
    pub logging: LoggingSettings,
}

impl Settings {
    /// Load settings from `sqlmy.toml` (if present), `.env` and the environment
    ///
    /// # Errors
    ///
    /// `Config` when a source is malformed or a value has the wrong type.
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();
        let config = Config::builder()
            .add_source(File::with_name(DEFAULT_FILE).required(false))
            .add_source(environment())
            .build()?;
        Ok(config.try_deserialize()?)
    }

    /// Load settings from an explicit file, with environment overrides
    ///
    /// # Errors
    ///
    /// `Config` when the file is missing or malformed.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        dotenvy::dotenv().ok();
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(environment())
            .build()?;
        Ok(config.try_deserialize()?)
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .try_parsing(true)
}
