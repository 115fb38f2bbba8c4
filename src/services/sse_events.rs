use tracing::{debug, warn};

use crate::{
    dao::models::GameStateRecord,
    dto::sse::{Handshake, ServerEvent, SystemStatus},
    state::{SharedState, session::ClientSession, view::ViewTransition},
};

const EVENT_HANDSHAKE: &str = "handshake";
const EVENT_SYSTEM_STATUS: &str = "system.status";

/// Fold a game-state observation into the session view and broadcast the
/// resulting transition, if any.
pub async fn fold_and_broadcast(
    state: &SharedState,
    record: Option<&GameStateRecord>,
) -> Option<ViewTransition> {
    fold_and_broadcast_if(state, record, |_| true).await
}

/// Same as [`fold_and_broadcast`], but only if `still_current` accepts the
/// session. The check, the fold and the broadcast happen under one write lock,
/// so a session swapped in concurrently never sees the record.
pub async fn fold_and_broadcast_if(
    state: &SharedState,
    record: Option<&GameStateRecord>,
    still_current: impl FnOnce(&ClientSession) -> bool,
) -> Option<ViewTransition> {
    let mut session = state.session().write().await;
    if !still_current(&session) {
        return None;
    }
    let transition = session.view.observe(record)?;
    broadcast_transition(state, &transition);
    Some(transition)
}

/// Push a view transition to every SSE subscriber.
pub fn broadcast_transition(state: &SharedState, transition: &ViewTransition) {
    debug!(event = transition.event_name(), "broadcasting view transition");
    state
        .view_sse()
        .broadcast_json(transition.event_name(), transition);
}

/// Notify subscribers that the store health changed.
pub fn broadcast_system_status(state: &SharedState, degraded: bool) {
    state
        .view_sse()
        .broadcast_json(EVENT_SYSTEM_STATUS, &SystemStatus { degraded });
}

/// Handshake greeting a freshly connected subscriber with the current view.
pub async fn handshake_event(state: &SharedState) -> Option<ServerEvent> {
    let handshake = {
        let session = state.session().read().await;
        Handshake {
            stream: "view".into(),
            degraded: state.is_degraded(),
            game_id: session.game_id,
            role: session.role,
            view: session.view.clone(),
        }
    };
    match ServerEvent::json(Some(EVENT_HANDSHAKE.to_string()), &handshake) {
        Ok(event) => Some(event),
        Err(err) => {
            warn!(error = %err, "failed to serialize SSE handshake");
            None
        }
    }
}
