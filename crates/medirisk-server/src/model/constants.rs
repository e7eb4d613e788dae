//! Configuration keys and defaults for the MediRisk server

pub const DEFAULT_CONFIG_FILE: &str = "conf/application.yml";
pub const ENV_PREFIX: &str = "medirisk";

// Server
pub const SERVER_ADDRESS: &str = "server.address";
pub const SERVER_PORT: &str = "server.port";
pub const SERVER_WORKERS: &str = "server.workers";
pub const DEFAULT_SERVER_ADDRESS: &str = "0.0.0.0";
pub const DEFAULT_SERVER_PORT: u16 = 5000;

// Storage
pub const STORAGE_MODE: &str = "storage.mode";
pub const STORAGE_DATA_DIR: &str = "storage.data_dir";
pub const STORAGE_HISTORY_FILE: &str = "storage.history_file";
pub const STORAGE_EMBEDDED_DIR: &str = "storage.embedded_dir";
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_EMBEDDED_DIR: &str = "rocksdb";

// Model
pub const MODEL_ESTIMATORS: &str = "model.n_estimators";
pub const MODEL_MAX_DEPTH: &str = "model.max_depth";
pub const MODEL_SEED: &str = "model.seed";
pub const MODEL_SAMPLES: &str = "model.samples";
pub const MODEL_CACHE_PATH: &str = "model.cache_path";

// Auth
pub const TOKEN_SECRET_KEY: &str = "auth.token.secret_key";
pub const TOKEN_EXPIRE_SECONDS: &str = "auth.token.expire_seconds";
pub const BCRYPT_COST: &str = "auth.bcrypt_cost";

// Rate limiting
pub const RATE_LIMIT_ENABLED: &str = "rate_limit.enabled";
pub const RATE_LIMIT_MAX_REQUESTS: &str = "rate_limit.max_requests";
pub const RATE_LIMIT_WINDOW_SECONDS: &str = "rate_limit.window_seconds";
pub const RATE_LIMIT_TRUSTED_PROXIES: &str = "rate_limit.trusted_proxies";
pub const LOGIN_LIMIT_ENABLED: &str = "rate_limit.login.enabled";
pub const LOGIN_LIMIT_MAX_ATTEMPTS: &str = "rate_limit.login.max_attempts";
pub const LOGIN_LIMIT_WINDOW_SECONDS: &str = "rate_limit.login.window_seconds";
pub const LOGIN_LIMIT_LOCKOUT_SECONDS: &str = "rate_limit.login.lockout_seconds";

// Reports
pub const REPORT_AUTHOR: &str = "report.author";

// Logging
pub const LOGS_PATH: &str = "logs.path";
pub const LOGS_CONSOLE: &str = "logs.console";
pub const LOGS_FILE: &str = "logs.file";
pub const LOGS_LEVEL: &str = "logs.level";
pub const LOGS_ROTATION: &str = "logs.rotation";

// Metrics
pub const METRICS_ENABLED: &str = "metrics.enabled";

// Response file names
pub const HEALTH_REPORT_FILE: &str = "health_report.pdf";
pub const STATISTICS_REPORT_FILE: &str = "statistics_report.pdf";

// User-facing messages
pub const NO_PREDICTION_FOUND: &str = "No prediction found";
pub const NO_STATISTICS_DATA: &str = "No data available for statistics";
pub const INVALID_REPORT_DATA: &str = "Invalid prediction data for the report";
pub const LOGIN_REQUIRED: &str = "Authentication required";
