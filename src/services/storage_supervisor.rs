use std::time::Duration;

use tokio::time::sleep;
use tracing::{info, warn};

use crate::{services::sse_events::broadcast_system_status, state::SharedState};

const INITIAL_DELAY: Duration = Duration::from_millis(1_000);
const MAX_DELAY: Duration = Duration::from_secs(10);
const HEALTH_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Flip degraded mode, notifying SSE subscribers when the flag changes.
pub fn set_degraded(state: &SharedState, degraded: bool) {
    if state.update_degraded(degraded) {
        if degraded {
            warn!("record store unreachable; entering degraded mode");
        } else {
            info!("record store reachable; leaving degraded mode");
        }
        broadcast_system_status(state, degraded);
    }
}

/// Probe the record store forever, backing off while it stays unreachable.
pub async fn run(state: SharedState) {
    let mut delay = INITIAL_DELAY;

    loop {
        match state.records().store().health_check().await {
            Ok(()) => {
                set_degraded(&state, false);
                delay = INITIAL_DELAY;
                sleep(HEALTH_POLL_INTERVAL).await;
            }
            Err(err) => {
                warn!(error = %err, retry_in_ms = delay.as_millis() as u64, "record store health check failed");
                set_degraded(&state, true);
                sleep(delay).await;
                delay = (delay * 2).min(MAX_DELAY);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, dao::record_store::memory::InMemoryRecordStore, state::AppState};
    use std::sync::Arc;

    #[tokio::test]
    async fn status_is_broadcast_only_on_change() {
        let state = AppState::new(AppConfig::default(), Arc::new(InMemoryRecordStore::new()));
        let mut receiver = state.view_sse().subscribe();

        set_degraded(&state, true);
        set_degraded(&state, true);
        set_degraded(&state, false);

        let first = receiver.recv().await.unwrap();
        assert_eq!(first.event.as_deref(), Some("system.status"));
        assert_eq!(first.data, r#"{"degraded":true}"#);
        let second = receiver.recv().await.unwrap();
        assert_eq!(second.data, r#"{"degraded":false}"#);
        assert!(receiver.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn healthy_store_clears_degraded_mode() {
        let state = AppState::new(AppConfig::default(), Arc::new(InMemoryRecordStore::new()));
        state.update_degraded(true);

        let task = tokio::spawn(run(state.clone()));
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(!state.is_degraded());
        task.abort();
    }
}
