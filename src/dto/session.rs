use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dao::ids::{GameId, ParticipantId},
    state::{session::Role, view::GameView},
};

/// Projection of the session for the UI.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub participant_id: ParticipantId,
    pub role: Role,
    pub game_id: Option<GameId>,
    pub view: GameView,
    /// Owner only: number of entries in the shuffled deck.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deck_size: Option<usize>,
    pub polling: bool,
    pub degraded: bool,
}
