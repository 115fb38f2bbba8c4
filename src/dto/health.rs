use serde::Serialize;
use utoipa::ToSchema;

/// Health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Error of the probe just run, when it failed.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub store_error: Option<String>,
}

impl HealthResponse {
    /// The record store answered the probe.
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            store_error: None,
        }
    }

    /// The record store could not be reached.
    pub fn degraded(store_error: Option<String>) -> Self {
        Self {
            status: "degraded".to_string(),
            store_error,
        }
    }
}
