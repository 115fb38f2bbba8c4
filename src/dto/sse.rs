use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dao::ids::GameId,
    state::{session::Role, view::GameView},
};

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
/// Initial snapshot sent when a UI connects to the view stream.
pub struct Handshake {
    pub stream: String,
    /// Whether the last store health probe failed.
    pub degraded: bool,
    pub game_id: Option<GameId>,
    pub role: Role,
    pub view: GameView,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the record store becomes unreachable or reachable again.
pub struct SystemStatus {
    pub degraded: bool,
}
