//! Configuration management for the MediRisk server
//!
//! Sources are layered: `conf/application.yml`, then `MEDIRISK.*` environment
//! variables, then command line flags.

use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use config::{Config, Environment};
use tracing::warn;

use medirisk_auth::{DEFAULT_BCRYPT_COST, DEFAULT_TOKEN_EXPIRE_SECONDS};
use medirisk_common::SERVICE_NAME;
use medirisk_persistence::StorageMode;
use medirisk_persistence::file::HISTORY_FILE;
use medirisk_predict::ModelSettings;

use super::constants::*;
use crate::middleware::rate_limit::{LoginLimitConfig, RateLimitConfig};
use crate::startup::logging::LoggingConfig;

/// Command line arguments for the server
#[derive(Debug, Default, Parser)]
#[command(name = "medirisk-server", version, about = "Disease risk prediction service")]
pub struct Cli {
    /// Path of the YAML configuration file
    #[arg(short = 'c', long = "config")]
    pub config: Option<String>,
    #[arg(short = 'p', long = "port", env = "PORT")]
    pub port: Option<u16>,
    #[arg(short = 'a', long = "address")]
    pub address: Option<String>,
    /// Storage backend: file or embedded
    #[arg(short = 's', long = "storage")]
    pub storage: Option<String>,
    #[arg(short = 'd', long = "data-dir")]
    pub data_dir: Option<String>,
}

/// `MEDIRISK.SERVER.PORT=8080` overrides `server.port`
fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .separator(".")
        .try_parsing(true)
}

/// Application configuration loaded from config files and environment
#[derive(Clone, Debug, Default)]
pub struct Configuration {
    pub config: Config,
}

impl Configuration {
    /// Load from the process arguments; exits on invalid flags or a broken config file
    pub fn new() -> Self {
        Self::from_cli(Cli::parse()).expect("Failed to build configuration")
    }

    pub fn from_cli(args: Cli) -> anyhow::Result<Self> {
        let file = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_FILE);
        let mut builder = Config::builder()
            .add_source(config::File::with_name(file).required(args.config.is_some()))
            .add_source(environment());

        if let Some(v) = args.port {
            builder = builder.set_override(SERVER_PORT, v)?;
        }
        if let Some(v) = args.address {
            builder = builder.set_override(SERVER_ADDRESS, v)?;
        }
        if let Some(v) = args.storage {
            builder = builder.set_override(STORAGE_MODE, v)?;
        }
        if let Some(v) = args.data_dir {
            builder = builder.set_override(STORAGE_DATA_DIR, v)?;
        }

        Ok(Self::from_config(builder.build()?))
    }

    pub fn from_config(config: Config) -> Self {
        Configuration { config }
    }

    // ========================================================================
    // Server Configuration
    // ========================================================================

    pub fn server_address(&self) -> String {
        self.config
            .get_string(SERVER_ADDRESS)
            .unwrap_or(DEFAULT_SERVER_ADDRESS.to_string())
    }

    pub fn server_port(&self) -> u16 {
        self.config
            .get_int(SERVER_PORT)
            .ok()
            .and_then(|v| u16::try_from(v).ok())
            .unwrap_or(DEFAULT_SERVER_PORT)
    }

    /// Worker count; `None` lets actix use one per core
    pub fn server_workers(&self) -> Option<usize> {
        self.config
            .get_int(SERVER_WORKERS)
            .ok()
            .and_then(|v| usize::try_from(v).ok())
            .filter(|v| *v > 0)
    }

    // ========================================================================
    // Storage Configuration
    // ========================================================================

    pub fn storage_mode(&self) -> anyhow::Result<StorageMode> {
        match self.config.get_string(STORAGE_MODE) {
            Ok(v) => v.parse().map_err(anyhow::Error::msg),
            Err(_) => Ok(StorageMode::File),
        }
    }

    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(
            self.config
                .get_string(STORAGE_DATA_DIR)
                .unwrap_or(DEFAULT_DATA_DIR.to_string()),
        )
    }

    /// History JSON file; relative names resolve inside the data directory
    pub fn history_path(&self) -> PathBuf {
        let name = self
            .config
            .get_string(STORAGE_HISTORY_FILE)
            .unwrap_or(HISTORY_FILE.to_string());
        self.data_dir().join(name)
    }

    pub fn embedded_path(&self) -> PathBuf {
        let name = self
            .config
            .get_string(STORAGE_EMBEDDED_DIR)
            .unwrap_or(DEFAULT_EMBEDDED_DIR.to_string());
        self.data_dir().join(name)
    }

    // ========================================================================
    // Model Configuration
    // ========================================================================

    pub fn model_settings(&self) -> ModelSettings {
        let defaults = ModelSettings::default();
        let positive = |key: &str, default: usize| {
            self.config
                .get_int(key)
                .ok()
                .and_then(|v| usize::try_from(v).ok())
                .filter(|v| *v > 0)
                .unwrap_or(default)
        };

        ModelSettings {
            n_estimators: positive(MODEL_ESTIMATORS, defaults.n_estimators),
            max_depth: self
                .config
                .get_int(MODEL_MAX_DEPTH)
                .ok()
                .and_then(|v| usize::try_from(v).ok())
                .filter(|v| *v > 0),
            seed: self
                .config
                .get_int(MODEL_SEED)
                .ok()
                .and_then(|v| u64::try_from(v).ok())
                .unwrap_or(defaults.seed),
            samples: positive(MODEL_SAMPLES, defaults.samples),
        }
    }

    pub fn model_cache_path(&self) -> Option<PathBuf> {
        self.config
            .get_string(MODEL_CACHE_PATH)
            .ok()
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }

    // ========================================================================
    // Auth Configuration
    // ========================================================================

    pub fn token_secret_key(&self) -> Option<String> {
        self.config
            .get_string(TOKEN_SECRET_KEY)
            .ok()
            .filter(|v| !v.is_empty())
    }

    pub fn token_expire_seconds(&self) -> i64 {
        self.config
            .get_int(TOKEN_EXPIRE_SECONDS)
            .ok()
            .filter(|v| *v > 0)
            .unwrap_or(DEFAULT_TOKEN_EXPIRE_SECONDS)
    }

    pub fn bcrypt_cost(&self) -> u32 {
        self.config
            .get_int(BCRYPT_COST)
            .ok()
            .and_then(|v| u32::try_from(v).ok())
            .unwrap_or(DEFAULT_BCRYPT_COST)
    }

    // ========================================================================
    // Rate Limit Configuration
    // ========================================================================

    pub fn rate_limit_config(&self) -> RateLimitConfig {
        let defaults = RateLimitConfig::default();
        RateLimitConfig {
            max_requests: self
                .config
                .get_int(RATE_LIMIT_MAX_REQUESTS)
                .ok()
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(defaults.max_requests),
            window_duration: self
                .seconds(RATE_LIMIT_WINDOW_SECONDS)
                .unwrap_or(defaults.window_duration),
            enabled: self
                .config
                .get_bool(RATE_LIMIT_ENABLED)
                .unwrap_or(defaults.enabled),
            trusted_proxies: self.trusted_proxies(),
        }
    }

    /// A YAML list or a comma separated string; unparsable entries are skipped
    fn trusted_proxies(&self) -> Vec<IpAddr> {
        let entries = self
            .config
            .get::<Vec<String>>(RATE_LIMIT_TRUSTED_PROXIES)
            .or_else(|_| {
                self.config
                    .get_string(RATE_LIMIT_TRUSTED_PROXIES)
                    .map(|v| v.split(',').map(str::to_string).collect())
            })
            .unwrap_or_default();
        entries
            .iter()
            .map(|e| e.trim())
            .filter(|e| !e.is_empty())
            .filter_map(|e| match e.parse::<IpAddr>() {
                Ok(ip) => Some(ip),
                Err(_) => {
                    warn!(entry = %e, "Ignoring invalid trusted proxy address");
                    None
                }
            })
            .collect()
    }

    pub fn login_limit_config(&self) -> LoginLimitConfig {
        let defaults = LoginLimitConfig::default();
        LoginLimitConfig {
            max_attempts: self
                .config
                .get_int(LOGIN_LIMIT_MAX_ATTEMPTS)
                .ok()
                .and_then(|v| u32::try_from(v).ok())
                .unwrap_or(defaults.max_attempts),
            window_duration: self
                .seconds(LOGIN_LIMIT_WINDOW_SECONDS)
                .unwrap_or(defaults.window_duration),
            lockout_duration: self
                .seconds(LOGIN_LIMIT_LOCKOUT_SECONDS)
                .unwrap_or(defaults.lockout_duration),
            enabled: self
                .config
                .get_bool(LOGIN_LIMIT_ENABLED)
                .unwrap_or(defaults.enabled),
        }
    }

    fn seconds(&self, key: &str) -> Option<Duration> {
        self.config
            .get_int(key)
            .ok()
            .and_then(|v| u64::try_from(v).ok())
            .filter(|v| *v > 0)
            .map(Duration::from_secs)
    }

    // ========================================================================
    // Report, Logging and Metrics Configuration
    // ========================================================================

    pub fn report_author(&self) -> String {
        self.config
            .get_string(REPORT_AUTHOR)
            .unwrap_or(SERVICE_NAME.to_string())
    }

    pub fn logging_config(&self) -> LoggingConfig {
        LoggingConfig::from_config(
            self.config.get_string(LOGS_PATH).ok(),
            self.config.get_bool(LOGS_CONSOLE).unwrap_or(true),
            self.config.get_bool(LOGS_FILE).unwrap_or(true),
            self.config
                .get_string(LOGS_LEVEL)
                .unwrap_or("info".to_string()),
            self.config
                .get_string(LOGS_ROTATION)
                .unwrap_or("daily".to_string()),
        )
    }

    pub fn metrics_enabled(&self) -> bool {
        self.config.get_bool(METRICS_ENABLED).unwrap_or(true)
    }
}
