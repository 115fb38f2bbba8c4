use std::future::Future;

use crate::{
    dao::models::GameStateRecord,
    error::ServiceError,
    services::sse_events::fold_and_broadcast,
    state::{
        SharedState,
        state_machine::{GameEvent, GamePhase},
    },
};

/// Execute a planned state-machine transition whose work publishes a game-state
/// record, then fold that record into the local view and broadcast it.
pub async fn run_transition_with_broadcast<F, Fut, T>(
    state: &SharedState,
    event: GameEvent,
    work: F,
) -> Result<T, ServiceError>
where
    F: FnOnce(GamePhase) -> Fut,
    Fut: Future<Output = Result<(T, GameStateRecord), ServiceError>>,
{
    let ((res, published), _next) = state.run_transition(event, work).await?;
    fold_and_broadcast(state, Some(&published)).await;
    Ok(res)
}
