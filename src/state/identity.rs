use std::sync::OnceLock;

use crate::dao::ids::{GameId, ParticipantId};

/// Hands out identifiers for this session.
///
/// The participant id is drawn on first use and then stays fixed for the
/// lifetime of the process; it is never persisted.
#[derive(Debug, Default)]
pub struct IdentityProvider {
    participant: OnceLock<ParticipantId>,
}

impl IdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn participant_id(&self) -> ParticipantId {
        *self.participant.get_or_init(ParticipantId::random)
    }

    /// Fresh identifier for a game this session is about to own.
    pub fn new_game_id(&self) -> GameId {
        GameId::random()
    }
}
