use super::error::{HttpStoreError, HttpStoreResult};

const BASE_URL_ENV: &str = "TIL_SHUFFLE_STORE_URL";
const API_KEY_ENV: &str = "TIL_SHUFFLE_API_KEY";

/// Runtime configuration describing how to reach the remote record store.
#[derive(Debug, Clone)]
pub struct HttpStoreConfig {
    pub base_url: String,
    /// Opaque bearer credential. Absence is only reported when a call is attempted.
    pub api_key: Option<String>,
}

impl HttpStoreConfig {
    /// Construct a configuration from an explicit base URL.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
        }
    }

    /// Attach the bearer credential to the configuration.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Build a configuration from the environment, using `fallback_url` when
    /// the URL variable is unset.
    pub fn from_env(fallback_url: Option<&str>) -> HttpStoreResult<Self> {
        let base_url = std::env::var(BASE_URL_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .or_else(|| fallback_url.map(str::to_string))
            .ok_or(HttpStoreError::MissingEnvVar { var: BASE_URL_ENV })?;

        let mut config = Self::new(base_url);
        if let Some(api_key) = std::env::var(API_KEY_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
        {
            config = config.with_api_key(api_key);
        }

        Ok(config)
    }
}
