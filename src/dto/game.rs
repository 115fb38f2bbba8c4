use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::ids::{GameId, ParticipantId},
    dto::votes::VoteTallyResponse,
    state::{session::Role, view::GameView},
};

/// Join an existing game from an invite link or a bare game id.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct JoinGameRequest {
    /// Game id (`<uuid>` or legacy `<uuid>.<ext>`) or a link carrying `gameId`.
    #[validate(length(min = 1, max = 2048))]
    pub invite: String,
}

/// Links the owner shares with the other sessions.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct InviteLinks {
    pub owner: String,
    pub participant: String,
    pub game_view: String,
}

/// Summary returned once a game has been created or joined.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameSummary {
    pub game_id: GameId,
    pub role: Role,
    pub links: InviteLinks,
}

/// Result of the owner starting the game.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StartGameResponse {
    pub view: GameView,
    pub total_tils: usize,
    /// Entries left out because they break the submission rules.
    pub dropped_entries: usize,
    /// Author names used by more than one entry (case-insensitive).
    pub duplicate_names: Vec<String>,
    /// Participants whose entries could not be read.
    pub skipped_participants: Vec<ParticipantId>,
}

/// Result of the owner revealing the current author.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RevealResponse {
    pub view: GameView,
    pub author_name: String,
    pub votes: VoteTallyResponse,
}

/// View after an owner transition without extra payload.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TransitionResponse {
    pub view: GameView,
}
