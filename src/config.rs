use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub db: DbConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub queue: QueueConfig,
    #[serde(default)]
    pub rate_limit: RateLimitConfig,
    #[serde(default)]
    pub breaker: BreakerConfig,
    #[serde(default)]
    pub transport: TransportConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub rules: RulesConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DbConfig {
    pub path: PathBuf,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_token_url")]
    pub token_url: String,
    #[serde(default = "default_scope")]
    pub scope: String,
    #[serde(default = "default_client_id_env")]
    pub client_id_env: String,
    #[serde(default = "default_client_secret_env")]
    pub client_secret_env: String,
    /// Bearer token used verbatim instead of the client-credentials flow.
    #[serde(default)]
    pub static_token: Option<String>,
    #[serde(default = "default_search_limit")]
    pub search_limit: u32,
    #[serde(default)]
    pub fulfillment: Option<String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token_url: default_token_url(),
            scope: default_scope(),
            client_id_env: default_client_id_env(),
            client_secret_env: default_client_secret_env(),
            static_token: None,
            search_limit: default_search_limit(),
            fulfillment: None,
        }
    }
}

fn default_base_url() -> String {
    "https://api.kroger.com/v1".to_string()
}
fn default_token_url() -> String {
    "https://api.kroger.com/v1/connect/oauth2/token".to_string()
}
fn default_scope() -> String {
    "product.compact".to_string()
}
fn default_client_id_env() -> String {
    "GROCER_CLIENT_ID".to_string()
}
fn default_client_secret_env() -> String {
    "GROCER_CLIENT_SECRET".to_string()
}
fn default_search_limit() -> u32 {
    20
}

#[derive(Debug, Deserialize, Clone)]
pub struct QueueConfig {
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
    #[serde(default = "default_dispatch_delay_ms")]
    pub dispatch_delay_ms: u64,
    #[serde(default = "default_task_timeout_ms")]
    pub task_timeout_ms: u64,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            dispatch_delay_ms: default_dispatch_delay_ms(),
            task_timeout_ms: default_task_timeout_ms(),
        }
    }
}

impl QueueConfig {
    pub fn dispatch_delay(&self) -> Duration {
        Duration::from_millis(self.dispatch_delay_ms)
    }

    pub fn task_timeout(&self) -> Duration {
        Duration::from_millis(self.task_timeout_ms)
    }
}

fn default_max_concurrent() -> usize {
    5
}
fn default_dispatch_delay_ms() -> u64 {
    50
}
fn default_task_timeout_ms() -> u64 {
    60_000
}

#[derive(Debug, Deserialize, Clone)]
pub struct RateLimitConfig {
    #[serde(default = "default_per_second")]
    pub per_second: u64,
    #[serde(default = "default_per_hour")]
    pub per_hour: u64,
    /// How long a caller waits for budget before giving up.
    #[serde(default = "default_max_wait_ms")]
    pub max_wait_ms: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            per_second: default_per_second(),
            per_hour: default_per_hour(),
            max_wait_ms: default_max_wait_ms(),
        }
    }
}

fn default_per_second() -> u64 {
    10
}
fn default_per_hour() -> u64 {
    5000
}
fn default_max_wait_ms() -> u64 {
    30_000
}

#[derive(Debug, Deserialize, Clone)]
pub struct BreakerConfig {
    #[serde(default = "default_failure_threshold")]
    pub failure_threshold: u32,
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
    #[serde(default = "default_failure_window_secs")]
    pub failure_window_secs: u64,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: default_failure_threshold(),
            cooldown_secs: default_cooldown_secs(),
            failure_window_secs: default_failure_window_secs(),
        }
    }
}

fn default_failure_threshold() -> u32 {
    5
}
fn default_cooldown_secs() -> u64 {
    120
}
fn default_failure_window_secs() -> u64 {
    60
}

#[derive(Debug, Deserialize, Clone)]
pub struct TransportConfig {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_base_delay_ms")]
    pub base_delay_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_retry_after_secs")]
    pub default_retry_after_secs: u64,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            base_delay_ms: default_base_delay_ms(),
            timeout_secs: default_timeout_secs(),
            default_retry_after_secs: default_retry_after_secs(),
        }
    }
}

fn default_max_attempts() -> u32 {
    3
}
fn default_base_delay_ms() -> u64 {
    1000
}
fn default_timeout_secs() -> u64 {
    15
}
fn default_retry_after_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_ttl_hours")]
    pub ttl_hours: u64,
    #[serde(default = "default_empty_ttl_hours")]
    pub empty_ttl_hours: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_hours: default_ttl_hours(),
            empty_ttl_hours: default_empty_ttl_hours(),
        }
    }
}

fn default_ttl_hours() -> u64 {
    24
}
fn default_empty_ttl_hours() -> u64 {
    6
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct RulesConfig {
    /// Optional TOML file of extra ingredient rules.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7341".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_level")]
    pub level: String,
    #[serde(default = "default_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            format: default_format(),
        }
    }
}

fn default_level() -> String {
    "info".to_string()
}
fn default_format() -> String {
    "pretty".to_string()
}

impl Config {
    /// All defaults with the database at `db_path`. Used by tests and by
    /// commands that run without a config file.
    pub fn minimal(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db: DbConfig {
                path: db_path.into(),
            },
            upstream: UpstreamConfig::default(),
            queue: QueueConfig::default(),
            rate_limit: RateLimitConfig::default(),
            breaker: BreakerConfig::default(),
            transport: TransportConfig::default(),
            cache: CacheConfig::default(),
            rules: RulesConfig::default(),
            server: ServerConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    if config.queue.max_concurrent == 0 {
        anyhow::bail!("queue.max_concurrent must be > 0");
    }

    if config.rate_limit.per_second == 0 || config.rate_limit.per_hour == 0 {
        anyhow::bail!("rate_limit.per_second and rate_limit.per_hour must be > 0");
    }
    if config.rate_limit.per_second > config.rate_limit.per_hour {
        anyhow::bail!(
            "rate_limit.per_second ({}) must not exceed rate_limit.per_hour ({})",
            config.rate_limit.per_second,
            config.rate_limit.per_hour
        );
    }

    if config.breaker.failure_threshold == 0 {
        anyhow::bail!("breaker.failure_threshold must be >= 1");
    }

    if config.transport.max_attempts == 0 {
        anyhow::bail!("transport.max_attempts must be >= 1");
    }
    if config.transport.timeout_secs == 0 {
        anyhow::bail!("transport.timeout_secs must be > 0");
    }

    if config.cache.ttl_hours == 0 || config.cache.empty_ttl_hours == 0 {
        anyhow::bail!("cache.ttl_hours and cache.empty_ttl_hours must be > 0");
    }
    if config.cache.empty_ttl_hours > config.cache.ttl_hours {
        anyhow::bail!("cache.empty_ttl_hours must not exceed cache.ttl_hours");
    }

    if config.upstream.search_limit == 0 {
        anyhow::bail!("upstream.search_limit must be > 0");
    }

    match config.logging.format.as_str() {
        "pretty" | "json" => {}
        other => anyhow::bail!(
            "Unknown logging format: '{}'. Must be pretty or json.",
            other
        ),
    }

    Ok(())
}
