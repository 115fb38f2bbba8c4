use std::fmt;

use crate::dao::ids::{GameId, ParticipantId};

pub const GAME_PREFIX: &str = "game:";
pub const PARTICIPANT_PREFIX: &str = "participant:";
pub const GAME_STATE_PREFIX: &str = "gamestate:";

/// Name of a record in the store. Other clients sharing the store must use the
/// exact same layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RecordKey(String);

impl RecordKey {
    /// `game:<gameId>`
    pub fn game(game_id: GameId) -> Self {
        Self(format!("{GAME_PREFIX}{game_id}"))
    }

    /// `participant:<gameId>:<participantId>`
    pub fn participant(game_id: GameId, participant_id: ParticipantId) -> Self {
        Self(format!("{PARTICIPANT_PREFIX}{game_id}:{participant_id}"))
    }

    /// `gamestate:<gameId>`
    pub fn game_state(game_id: GameId) -> Self {
        Self(format!("{GAME_STATE_PREFIX}{game_id}"))
    }

    /// Wrap an arbitrary key, e.g. a health probe.
    pub fn raw(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_layout_matches_store_contract() {
        let game: GameId = "11111111-2222-4333-8444-555555555555".parse().unwrap();
        let participant: ParticipantId = "66666666-7777-4888-9999-aaaaaaaaaaaa".parse().unwrap();

        assert_eq!(
            RecordKey::game(game).as_str(),
            "game:11111111-2222-4333-8444-555555555555"
        );
        assert_eq!(
            RecordKey::participant(game, participant).as_str(),
            "participant:11111111-2222-4333-8444-555555555555:66666666-7777-4888-9999-aaaaaaaaaaaa"
        );
        assert_eq!(
            RecordKey::game_state(game).as_str(),
            "gamestate:11111111-2222-4333-8444-555555555555"
        );
    }
}
