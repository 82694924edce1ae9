use chrono::{DateTime, Utc};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub refresh: RefreshConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UpstreamConfig {
    /// Ranking endpoint (query parameters are appended per request)
    pub base_url: String,
    /// Sent as the `api-key` header
    #[serde(default)]
    pub api_key: Option<String>,
    /// Sent as the `code` query parameter
    #[serde(default)]
    pub partner_code: Option<String>,
    /// Ranking metric (`by`)
    #[serde(default = "default_metric")]
    pub metric: String,
    #[serde(default = "default_sort")]
    pub sort: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default)]
    pub offset: u32,
    /// Lower time bound (`gt`), ISO-8601
    #[serde(default = "default_since")]
    pub since: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    /// Total attempts on the raw path, first try included
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    #[serde(default = "default_backoff_cap_ms")]
    pub backoff_cap_ms: u64,
    #[serde(default = "default_jitter_max_ms")]
    pub jitter_max_ms: u64,
}

fn default_metric() -> String {
    "wagered".to_string()
}

fn default_sort() -> String {
    "desc".to_string()
}

fn default_page_size() -> u32 {
    1000
}

fn default_since() -> String {
    "2024-01-01T00:00:00.000Z".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_cache_ttl_secs() -> u64 {
    60
}

fn default_max_attempts() -> u32 {
    5
}

fn default_backoff_base_ms() -> u64 {
    600
}

fn default_backoff_cap_ms() -> u64 {
    15_000
}

fn default_jitter_max_ms() -> u64 {
    250
}

impl UpstreamConfig {
    /// Config for a given endpoint with every tunable at its default.
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            api_key: None,
            partner_code: None,
            metric: default_metric(),
            sort: default_sort(),
            page_size: default_page_size(),
            offset: 0,
            since: default_since(),
            timeout_secs: default_timeout_secs(),
            cache_ttl_secs: default_cache_ttl_secs(),
            max_attempts: default_max_attempts(),
            backoff_base_ms: default_backoff_base_ms(),
            backoff_cap_ms: default_backoff_cap_ms(),
            jitter_max_ms: default_jitter_max_ms(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RefreshConfig {
    /// Seconds between scheduled refresh cycles
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    /// Delay before the first cycle after startup
    #[serde(default = "default_warmup_secs")]
    pub warmup_secs: u64,
    /// After this instant the leaderboard is frozen
    #[serde(default)]
    pub countdown_deadline: Option<DateTime<Utc>>,
}

fn default_interval_secs() -> u64 {
    30 * 60
}

fn default_warmup_secs() -> u64 {
    5
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            interval_secs: default_interval_secs(),
            warmup_secs: default_warmup_secs(),
            countdown_deadline: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    #[serde(default = "default_cache_file")]
    pub cache_file: String,
    #[serde(default = "default_snapshot_file")]
    pub snapshot_file: String,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

fn default_cache_file() -> String {
    "leaderboard_cache.json".to_string()
}

fn default_snapshot_file() -> String {
    "snapshots.jsonl".to_string()
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            cache_file: default_cache_file(),
            snapshot_file: default_snapshot_file(),
        }
    }
}

impl StorageConfig {
    pub fn cache_path(&self) -> PathBuf {
        self.data_dir.join(&self.cache_file)
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.data_dir.join(&self.snapshot_file)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: default_port(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    /// Shared secret expected in `x-admin-secret`
    #[serde(default)]
    pub secret: Option<String>,
    /// When false and no secret is configured, admin endpoints are open
    #[serde(default = "default_auth_required")]
    pub auth_required: bool,
}

fn default_auth_required() -> bool {
    true
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            secret: None,
            auth_required: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
    /// Directory for daily-rolling log files
    #[serde(default)]
    pub dir: Option<PathBuf>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl AppConfig {
    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default values
            .set_default("upstream.base_url", "https://api.example.com/affiliate/v2/stats")?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("WAGERBOARD_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (WAGERBOARD_UPSTREAM__API_KEY, etc.)
            .add_source(
                Environment::with_prefix("WAGERBOARD")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Create a default configuration pointing at the given upstream
    pub fn default_config(base_url: &str) -> Self {
        Self {
            upstream: UpstreamConfig::with_base_url(base_url),
            refresh: RefreshConfig::default(),
            storage: StorageConfig::default(),
            server: ServerConfig::default(),
            admin: AdminConfig::default(),
            logging: LoggingConfig {
                level: default_log_level(),
                json: false,
                dir: None,
            },
        }
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.upstream.base_url.trim().is_empty() {
            errors.push("upstream.base_url must not be empty".to_string());
        } else if url::Url::parse(&self.upstream.base_url).is_err() {
            errors.push(format!(
                "upstream.base_url is not a valid URL: {}",
                self.upstream.base_url
            ));
        }

        if DateTime::parse_from_rfc3339(&self.upstream.since).is_err() {
            errors.push(format!(
                "upstream.since must be RFC 3339, got {}",
                self.upstream.since
            ));
        }

        if self.upstream.max_attempts == 0 {
            errors.push("upstream.max_attempts must be at least 1".to_string());
        }

        if self.upstream.backoff_base_ms > self.upstream.backoff_cap_ms {
            errors.push("upstream.backoff_base_ms must not exceed backoff_cap_ms".to_string());
        }

        if self.upstream.timeout_secs == 0 {
            errors.push("upstream.timeout_secs must be positive".to_string());
        }

        if self.refresh.interval_secs == 0 {
            errors.push("refresh.interval_secs must be positive".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
