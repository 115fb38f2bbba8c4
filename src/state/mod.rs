pub mod identity;
pub mod session;
mod sse;
pub mod state_machine;
pub mod transitions;
pub mod view;

use std::{future::Future, sync::Arc, time::Duration};

use tokio::sync::{Mutex, RwLock, watch};
use tokio::time::timeout;
use tracing::warn;

use crate::{
    config::AppConfig,
    dao::{record_store::RecordStore, records::Records},
    error::ServiceError,
    services::{poller::PollerHandle, retry::RetryPolicy},
};

pub use self::sse::SseHub;
pub use self::state_machine::{AbortError, ApplyError, Plan, PlanError, PlanId, Snapshot};
use self::{
    identity::IdentityProvider,
    session::ClientSession,
    state_machine::{GameEvent, GamePhase, GameStateMachine},
};

pub type SharedState = Arc<AppState>;

/// Process-wide context of one client session.
pub struct AppState {
    config: AppConfig,
    records: Records,
    identity: IdentityProvider,
    session: RwLock<ClientSession>,
    game: RwLock<GameStateMachine>,
    sse: SseHub,
    degraded: watch::Sender<bool>,
    poller: Mutex<Option<PollerHandle>>,
    transition_gate: Mutex<()>,
    transition_timeout: Option<Duration>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(config: AppConfig, store: Arc<dyn RecordStore>) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(false);
        let transition_timeout = config.transition_timeout;
        Arc::new(Self {
            config,
            records: Records::new(store),
            identity: IdentityProvider::new(),
            session: RwLock::new(ClientSession::default()),
            game: RwLock::new(GameStateMachine::new()),
            sse: SseHub::default(),
            degraded: degraded_tx,
            poller: Mutex::new(None),
            transition_gate: Mutex::new(()),
            transition_timeout,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.config.retry
    }

    /// Typed access to the shared record store.
    pub fn records(&self) -> &Records {
        &self.records
    }

    pub fn identity(&self) -> &IdentityProvider {
        &self.identity
    }

    /// The session document, written by commands and the poller.
    pub fn session(&self) -> &RwLock<ClientSession> {
        &self.session
    }

    /// Broadcast hub used for the view SSE stream.
    pub fn view_sse(&self) -> &SseHub {
        &self.sse
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Update the degraded flag, returning whether it changed.
    pub fn update_degraded(&self, value: bool) -> bool {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        })
    }

    /// Install the poller of the current game, stopping the previous one.
    pub async fn replace_poller(&self, poller: Option<PollerHandle>) {
        let previous = {
            let mut guard = self.poller.lock().await;
            std::mem::replace(&mut *guard, poller)
        };
        if let Some(previous) = previous {
            previous.stop();
        }
    }

    /// Whether a poller is installed and still running.
    pub async fn poller_running(&self) -> bool {
        self.poller
            .lock()
            .await
            .as_ref()
            .is_some_and(|handle| !handle.is_finished())
    }

    /// Snapshot the current phase of the owner state machine.
    pub async fn state_machine_phase(&self) -> GamePhase {
        self.game.read().await.phase()
    }

    pub async fn snapshot(&self) -> Snapshot {
        let sm = self.game.read().await;
        sm.snapshot()
    }

    /// Put the owner state machine back to waiting, under the transition gate.
    pub async fn reset_state_machine(&self) {
        let _gate = self.transition_gate.lock().await;
        self.game.write().await.reset();
    }

    /// Plan a transition to the shared game state machine, returning the plan.
    async fn plan_transition(&self, event: GameEvent) -> Result<Plan, PlanError> {
        let mut sm = self.game.write().await;
        sm.plan(event)
    }

    /// Apply the planned transition to the shared game state machine, returning the next phase.
    async fn apply_planned_transition(&self, plan_id: PlanId) -> Result<GamePhase, ApplyError> {
        let mut sm = self.game.write().await;
        sm.apply(plan_id)
    }

    /// Abort a planned transition of the shared game state machine
    async fn abort_transition(&self, plan_id: PlanId) -> Result<(), AbortError> {
        let mut sm = self.game.write().await;
        sm.abort(plan_id)
    }

    /// Plan `event`, run `work` with the target phase, then apply on success or
    /// abort on failure or timeout. Only one transition runs at a time.
    pub async fn run_transition<F, Fut, T>(
        &self,
        event: GameEvent,
        work: F,
    ) -> Result<(T, GamePhase), ServiceError>
    where
        F: FnOnce(GamePhase) -> Fut,
        Fut: Future<Output = Result<T, ServiceError>>,
    {
        let gate = self.transition_gate.lock().await;
        let Plan {
            id: plan_id, to, ..
        } = self.plan_transition(event.clone()).await?;

        let work_future = work(to);
        let outcome = if let Some(limit) = self.transition_timeout {
            match timeout(limit, work_future).await {
                Ok(result) => result,
                Err(_) => {
                    if let Err(abort_err) = self.abort_transition(plan_id).await {
                        warn!(
                            event = ?event,
                            plan_id = %plan_id,
                            error = ?abort_err,
                            "failed to abort transition after timeout"
                        );
                    }
                    drop(gate);
                    return Err(ServiceError::Timeout);
                }
            }
        } else {
            work_future.await
        };

        match outcome {
            Ok(value) => {
                let next = self.apply_planned_transition(plan_id).await?;
                drop(gate);
                Ok((value, next))
            }
            Err(err) => {
                if let Err(abort_err) = self.abort_transition(plan_id).await {
                    warn!(
                        event = ?event,
                        plan_id = %plan_id,
                        error = ?abort_err,
                        "failed to abort transition after work error"
                    );
                }
                drop(gate);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::record_store::memory::InMemoryRecordStore;

    fn state_with_timeout(limit: Option<Duration>) -> SharedState {
        let config = AppConfig {
            transition_timeout: limit,
            ..AppConfig::default()
        };
        AppState::new(config, Arc::new(InMemoryRecordStore::new()))
    }

    #[tokio::test]
    async fn successful_work_applies_planned_phase() {
        let state = state_with_timeout(None);

        let (seen, next) = state
            .run_transition(GameEvent::Start { total_tils: 2 }, |to| async move {
                Ok::<_, ServiceError>(to)
            })
            .await
            .unwrap();

        assert_eq!(seen, GamePhase::Voting { index: 0 });
        assert_eq!(next, GamePhase::Voting { index: 0 });
        assert_eq!(state.state_machine_phase().await, next);
    }

    #[tokio::test]
    async fn failed_work_leaves_phase_unchanged() {
        let state = state_with_timeout(None);

        let result = state
            .run_transition(GameEvent::Start { total_tils: 2 }, |_| async {
                Err::<(), _>(ServiceError::InvalidState("publish failed".into()))
            })
            .await;

        assert!(result.is_err());
        let snapshot = state.snapshot().await;
        assert_eq!(snapshot.phase, GamePhase::Waiting);
        assert_eq!(snapshot.pending, None);
    }

    #[tokio::test(start_paused = true)]
    async fn slow_work_times_out_and_aborts() {
        let state = state_with_timeout(Some(Duration::from_millis(50)));

        let result = state
            .run_transition(GameEvent::Start { total_tils: 1 }, |_| async {
                tokio::time::sleep(Duration::from_secs(1)).await;
                Ok::<_, ServiceError>(())
            })
            .await;

        assert!(matches!(result, Err(ServiceError::Timeout)));
        assert_eq!(state.snapshot().await.pending, None);
    }

    #[test]
    fn degraded_flag_reports_changes_only() {
        let state = state_with_timeout(None);
        assert!(!state.is_degraded());
        assert!(state.update_degraded(true));
        assert!(!state.update_degraded(true));
        assert!(state.is_degraded());
    }
}
