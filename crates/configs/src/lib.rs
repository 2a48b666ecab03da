//! # configs
//!
//! Layered runtime configuration for the message board:
//! built-in defaults, then an optional `config/message-board.toml`, then
//! `BOARD_*` environment variables (`BOARD_SERVER__PORT=8080`). A `.env`
//! file in the working directory is loaded into the environment first.

use config::{builder::DefaultState, Config, ConfigBuilder, Environment, File};
use domains::BoardName;
use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;

/// Looked up relative to the working directory; the extension is optional.
pub const DEFAULT_CONFIG_FILE: &str = "config/message-board";
pub const ENV_PREFIX: &str = "BOARD";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("failed to read .env file: {0}")]
    DotEnv(#[from] dotenvy::Error),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub board: BoardConfig,
    pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Allowed CORS origins; empty allows any origin.
    pub cors_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            cors_origins: Vec::new(),
        }
    }
}

impl ServerConfig {
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// SQLite URL, e.g. `sqlite://message-board.db` or `sqlite::memory:`.
    pub url: SecretString,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: SecretString::from("sqlite://message-board.db"),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Board guaranteed to exist after startup.
    pub default_board: String,
    pub recent_thread_limit: usize,
    pub preview_reply_count: usize,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            default_board: "general".to_string(),
            recent_thread_limit: 10,
            preview_reply_count: 3,
        }
    }
}

impl BoardConfig {
    pub fn default_board_name(&self) -> Result<BoardName, ConfigError> {
        BoardName::parse(&self.default_board)
            .map_err(|v| ConfigError::Invalid(format!("board.default_board {}", v.message)))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    pub format: LogFormat,
    /// `EnvFilter` directives; `RUST_LOG` takes precedence when set.
    pub filter: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::Pretty,
            filter: "info,tower_http=info,sqlx=warn".to_string(),
        }
    }
}

/// `BOARD_SECTION__KEY` variables; `BOARD_SERVER__CORS_ORIGINS` is comma-separated.
fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("server.cors_origins")
        .try_parsing(true)
}

impl AppConfig {
    /// Loads `.env`, [`DEFAULT_CONFIG_FILE`] and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(DEFAULT_CONFIG_FILE)
    }

    pub fn load_from(path: &str) -> Result<Self, ConfigError> {
        match dotenvy::dotenv() {
            Ok(_) => {}
            Err(e) if e.not_found() => {}
            Err(e) => return Err(e.into()),
        }

        let builder = Config::builder()
            .add_source(File::with_name(path).required(false))
            .add_source(environment());
        Self::from_builder(builder)
    }

    fn from_builder(builder: ConfigBuilder<DefaultState>) -> Result<Self, ConfigError> {
        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be at least 1".to_string(),
            ));
        }
        if self.board.recent_thread_limit == 0 {
            return Err(ConfigError::Invalid(
                "board.recent_thread_limit must be at least 1".to_string(),
            ));
        }
        self.board.default_board_name()?;
        Ok(())
    }

    /// Logs the effective settings, secrets excluded.
    pub fn log_summary(&self) {
        tracing::info!(
            bind = %self.server.bind_address(),
            cors_origins = ?self.server.cors_origins,
            max_connections = self.database.max_connections,
            default_board = %self.board.default_board,
            recent_thread_limit = self.board.recent_thread_limit,
            preview_reply_count = self.board.preview_reply_count,
            "Configuration loaded"
        );
    }
}
