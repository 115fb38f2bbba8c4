//! Game bootstrap: creating a game as owner, joining one as participant.

use time::OffsetDateTime;
use tracing::info;

use crate::{
    dao::{ids::GameId, models::GameRecord},
    dto::game::{GameSummary, InviteLinks},
    error::ServiceError,
    services::{links, poller, retry::retry_write, sse_events::fold_and_broadcast},
    state::{
        SharedState,
        session::{ClientSession, Role},
    },
};

/// Create a fresh game with nobody registered and make this session its owner.
pub async fn create_game(state: &SharedState) -> Result<GameSummary, ServiceError> {
    let game_id = state.identity().new_game_id();
    let record = GameRecord::new(game_id, OffsetDateTime::now_utc(), state.config().game_ttl);

    let records = state.records();
    let pending = &record;
    retry_write(state.retry_policy(), "create game", || async move {
        records.put_game(pending).await.map_err(ServiceError::from)
    })
    .await?;

    state.replace_poller(None).await;
    *state.session().write().await = ClientSession::owner(game_id);
    state.reset_state_machine().await;
    fold_and_broadcast(state, None).await;

    info!(game_id = %game_id, owner = %state.identity().participant_id(), "game created");
    Ok(summary(state, game_id, true))
}

/// Join the game designated by `invite` (a game id or an invite link) and
/// start following its live state.
pub async fn join_game(state: &SharedState, invite: &str) -> Result<GameSummary, ServiceError> {
    let game_id =
        links::parse_invite(invite).map_err(|err| ServiceError::InvalidInput(err.to_string()))?;

    state
        .records()
        .get_game(game_id)
        .await?
        .ok_or(ServiceError::GameNotFound(game_id))?;

    state.replace_poller(None).await;
    *state.session().write().await = ClientSession::participant(game_id);
    state.reset_state_machine().await;

    let handle = poller::spawn(state.clone(), game_id, state.config().poll_interval);
    state.replace_poller(Some(handle)).await;

    info!(game_id = %game_id, participant = %state.identity().participant_id(), "joined game");
    Ok(summary(state, game_id, false))
}

/// Invite links for `game_id` built on the configured base URL.
pub fn invite_links(state: &SharedState, game_id: GameId) -> InviteLinks {
    let base = state.config().invite_base_url.as_str();
    InviteLinks {
        owner: links::build_owner_link(base, game_id),
        participant: links::build_participant_link(base, game_id),
        game_view: links::build_game_view_link(base, game_id),
    }
}

fn summary(state: &SharedState, game_id: GameId, owner: bool) -> GameSummary {
    GameSummary {
        game_id,
        role: if owner { Role::Owner } else { Role::Participant },
        links: invite_links(state, game_id),
    }
}
