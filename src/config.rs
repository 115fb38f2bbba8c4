//! Application-level configuration loading: store backend, retry tuning and polling cadence.

use std::{env, fs, io::ErrorKind, path::PathBuf, time::Duration};

use serde::Deserialize;
use serde_with::{DurationMilliSeconds, serde_as};
use tracing::{info, warn};

use crate::services::retry::RetryPolicy;

/// Default location on disk where the session host looks for the JSON configuration.
const DEFAULT_CONFIG_PATH: &str = "config/app.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "TIL_SHUFFLE_CONFIG_PATH";
const DEFAULT_INVITE_BASE_URL: &str = "http://localhost:8080/";

/// Which record store implementation backs the session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// Remote bearer-authenticated store shared with the other sessions.
    #[default]
    Http,
    /// Process-local store, only useful for a single-process demo.
    Memory,
}

/// Store selection as configured on disk.
#[derive(Debug, Clone, Default)]
pub struct StoreSettings {
    pub backend: StoreBackend,
    /// Used when `TIL_SHUFFLE_STORE_URL` is not set.
    pub base_url: Option<String>,
}

#[derive(Debug, Clone)]
/// Immutable runtime configuration shared across the application.
pub struct AppConfig {
    pub store: StoreSettings,
    pub retry: RetryPolicy,
    pub poll_interval: Duration,
    pub transition_timeout: Option<Duration>,
    /// Base URL the invite links are built on.
    pub invite_base_url: String,
    /// Advisory lifetime written into new game records.
    pub game_ttl: time::Duration,
}

impl AppConfig {
    /// Load the application configuration from disk, falling back to built-in defaults.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match Self::from_json(&contents) {
                Ok(app_config) => {
                    info!(
                        path = %path.display(),
                        backend = ?app_config.store.backend,
                        "loaded configuration"
                    );
                    app_config
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "config file not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// Parse a configuration document. Missing keys take their default value.
    pub fn from_json(contents: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<RawConfig>(contents).map(Into::into)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        RawConfig::default().into()
    }
}

#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(default)]
/// JSON representation of the configuration file located at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    store: RawStore,
    retry: RawRetry,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    poll_interval_ms: Duration,
    /// `0` disables the owner transition timeout.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    transition_timeout_ms: Duration,
    invite_base_url: String,
    game_ttl_days: u32,
}

impl Default for RawConfig {
    fn default() -> Self {
        Self {
            store: RawStore::default(),
            retry: RawRetry::default(),
            poll_interval_ms: Duration::from_millis(2_000),
            transition_timeout_ms: Duration::from_millis(15_000),
            invite_base_url: DEFAULT_INVITE_BASE_URL.into(),
            game_ttl_days: 30,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawStore {
    backend: StoreBackend,
    base_url: Option<String>,
}

#[serde_as]
#[derive(Debug, Deserialize)]
#[serde(default)]
struct RawRetry {
    max_attempts: u32,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    base_delay_ms: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    max_delay_ms: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    jitter_ms: Duration,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    settle_delay_ms: Duration,
}

impl Default for RawRetry {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            base_delay_ms: policy.base_delay,
            max_delay_ms: policy.max_delay,
            jitter_ms: policy.jitter,
            settle_delay_ms: policy.settle_delay,
        }
    }
}

impl From<RawConfig> for AppConfig {
    fn from(value: RawConfig) -> Self {
        let retry = RetryPolicy {
            max_attempts: value.retry.max_attempts.max(1),
            base_delay: value.retry.base_delay_ms,
            max_delay: value.retry.max_delay_ms.max(value.retry.base_delay_ms),
            jitter: value.retry.jitter_ms,
            settle_delay: value.retry.settle_delay_ms,
        };

        Self {
            store: StoreSettings {
                backend: value.store.backend,
                base_url: value.store.base_url.filter(|url| !url.trim().is_empty()),
            },
            retry,
            poll_interval: value.poll_interval_ms.max(Duration::from_millis(100)),
            transition_timeout: Some(value.transition_timeout_ms).filter(|d| !d.is_zero()),
            invite_base_url: value.invite_base_url,
            game_ttl: time::Duration::days(i64::from(value.game_ttl_days)),
        }
    }
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}
