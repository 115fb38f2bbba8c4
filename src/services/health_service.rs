use tracing::warn;

use crate::{dto::health::HealthResponse, services::storage_supervisor, state::SharedState};

/// Probe the record store now and report the result, updating degraded mode.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    match state.records().store().health_check().await {
        Ok(()) => {
            storage_supervisor::set_degraded(state, false);
            HealthResponse::ok()
        }
        Err(err) => {
            warn!(error = %err, "record store health check failed");
            storage_supervisor::set_degraded(state, true);
            HealthResponse::degraded(Some(err.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, dao::record_store::memory::InMemoryRecordStore, state::AppState};
    use std::sync::Arc;

    #[tokio::test]
    async fn reachable_store_reports_ok() {
        let state = AppState::new(AppConfig::default(), Arc::new(InMemoryRecordStore::new()));
        state.update_degraded(true);

        let health = health_status(&state).await;

        assert_eq!(health.status, "ok");
        assert!(health.store_error.is_none());
        assert!(!state.is_degraded());
    }
}
