use clap::{Parser, ValueEnum};
use ipnet::IpNet;
use serde::Deserialize;
use shurl_service::config::DEFAULT_QUEUE_CAPACITY;
use shurl_telemetry::LogFormat;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_ENV: &str = "SHURL_CONFIG";
pub const SERVER_ADDRESS_ENV: &str = "SHURL_SERVER_ADDRESS";
pub const BASE_URL_ENV: &str = "SHURL_BASE_URL";
pub const STORAGE_BACKEND_ENV: &str = "SHURL_STORAGE";
pub const FILE_STORAGE_PATH_ENV: &str = "SHURL_FILE_STORAGE_PATH";
pub const DATABASE_DSN_ENV: &str = "SHURL_DATABASE_DSN";
pub const JWT_SECRET_ENV: &str = "SHURL_JWT_SECRET";
pub const TRUSTED_SUBNET_ENV: &str = "SHURL_TRUSTED_SUBNET";
pub const QUEUE_CAPACITY_ENV: &str = "SHURL_QUEUE_CAPACITY";
pub const LOG_FORMAT_ENV: &str = "SHURL_LOG_FORMAT";
pub const LOG_FILTER_ENV: &str = "SHURL_LOG_FILTER";

pub const DEFAULT_SERVER_ADDRESS: &str = "127.0.0.1:8080";
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";
pub const DEFAULT_FILE_STORAGE_PATH: &str = "data/shortener.json";
pub const DEFAULT_JWT_SECRET: &str = "supersecretkey";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid server address {0:?}")]
    ServerAddress(String),
    #[error("a database dsn is required when storage backend is sqlite")]
    MissingDatabaseDsn,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StorageBackendArg {
    #[value(name = "memory")]
    Memory,
    #[value(name = "json-file")]
    JsonFile,
    #[value(name = "sqlite")]
    Sqlite,
}

impl Display for StorageBackendArg {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            StorageBackendArg::Memory => write!(f, "memory"),
            StorageBackendArg::JsonFile => write!(f, "json-file"),
            StorageBackendArg::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Command line flags. Every flag also reads its environment variable;
/// anything left unset falls back to the config file, then to a default.
#[derive(Debug, Default, Parser)]
#[command(name = "shurl-gateway", about = "HTTP front end of the shurl link shortener")]
pub struct Cli {
    /// JSON config file.
    #[arg(short = 'c', long, env = CONFIG_ENV)]
    pub config: Option<PathBuf>,

    /// Address the HTTP server listens on.
    #[arg(short = 'a', long, env = SERVER_ADDRESS_ENV)]
    pub server_address: Option<String>,

    /// Base of the short URLs handed out to clients.
    #[arg(short = 'b', long, env = BASE_URL_ENV)]
    pub base_url: Option<String>,

    #[arg(long, env = STORAGE_BACKEND_ENV, value_enum)]
    pub storage: Option<StorageBackendArg>,

    #[arg(short = 'f', long, env = FILE_STORAGE_PATH_ENV)]
    pub file_storage_path: Option<PathBuf>,

    /// SQLite connection string, e.g. `sqlite://data/shortener.db`.
    #[arg(short = 'd', long, env = DATABASE_DSN_ENV)]
    pub database_dsn: Option<String>,

    #[arg(long, env = JWT_SECRET_ENV, hide_env_values = true)]
    pub jwt_secret: Option<String>,

    /// CIDR allowed to call `GET /api/internal/stats`, matched against
    /// `X-Real-IP`. Unset denies every caller.
    #[arg(short = 't', long, env = TRUSTED_SUBNET_ENV)]
    pub trusted_subnet: Option<IpNet>,

    #[arg(long, env = QUEUE_CAPACITY_ENV)]
    pub queue_capacity: Option<usize>,

    #[arg(long, env = LOG_FORMAT_ENV, value_enum)]
    pub log_format: Option<LogFormat>,

    /// Log filter used when `RUST_LOG` is unset.
    #[arg(long, env = LOG_FILTER_ENV)]
    pub log_filter: Option<String>,
}

/// Contents of the optional JSON config file.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub server_address: Option<String>,
    pub base_url: Option<String>,
    pub storage: Option<StorageBackendArg>,
    pub file_storage_path: Option<PathBuf>,
    pub database_dsn: Option<String>,
    pub jwt_secret: Option<String>,
    pub trusted_subnet: Option<IpNet>,
    pub queue_capacity: Option<usize>,
    pub log_format: Option<LogFormat>,
    pub log_filter: Option<String>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_slice(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    Memory,
    JsonFile(PathBuf),
    Sqlite(String),
}

/// Fully resolved gateway settings.
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub server_address: SocketAddr,
    pub base_url: String,
    pub storage: StorageConfig,
    pub jwt_secret: String,
    pub trusted_subnet: Option<IpNet>,
    pub queue_capacity: usize,
    pub log_format: LogFormat,
    pub log_filter: String,
}

impl GatewayConfig {
    /// Resolves the flags against the config file they point at, if any.
    pub fn load(cli: Cli) -> Result<Self, ConfigError> {
        let file = match &cli.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Self::resolve(cli, file)
    }

    /// Merges flags over file values over defaults.
    pub fn resolve(cli: Cli, file: FileConfig) -> Result<Self, ConfigError> {
        let server_address = cli
            .server_address
            .or(file.server_address)
            .unwrap_or_else(|| DEFAULT_SERVER_ADDRESS.to_string());
        let server_address = server_address
            .parse()
            .map_err(|_| ConfigError::ServerAddress(server_address))?;

        let database_dsn = cli.database_dsn.or(file.database_dsn);
        // Without an explicit backend, a dsn selects sqlite.
        let backend = cli
            .storage
            .or(file.storage)
            .unwrap_or(match database_dsn {
                Some(_) => StorageBackendArg::Sqlite,
                None => StorageBackendArg::JsonFile,
            });
        let storage = match backend {
            StorageBackendArg::Memory => StorageConfig::Memory,
            StorageBackendArg::JsonFile => StorageConfig::JsonFile(
                cli.file_storage_path
                    .or(file.file_storage_path)
                    .unwrap_or_else(|| PathBuf::from(DEFAULT_FILE_STORAGE_PATH)),
            ),
            StorageBackendArg::Sqlite => {
                StorageConfig::Sqlite(database_dsn.ok_or(ConfigError::MissingDatabaseDsn)?)
            }
        };

        Ok(Self {
            server_address,
            base_url: cli
                .base_url
                .or(file.base_url)
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            storage,
            jwt_secret: cli
                .jwt_secret
                .or(file.jwt_secret)
                .unwrap_or_else(|| DEFAULT_JWT_SECRET.to_string()),
            trusted_subnet: cli.trusted_subnet.or(file.trusted_subnet),
            queue_capacity: cli
                .queue_capacity
                .or(file.queue_capacity)
                .unwrap_or(DEFAULT_QUEUE_CAPACITY),
            log_format: cli.log_format.or(file.log_format).unwrap_or_default(),
            log_filter: cli
                .log_filter
                .or(file.log_filter)
                .unwrap_or_else(|| shurl_telemetry::DEFAULT_FILTER.to_string()),
        })
    }
}
