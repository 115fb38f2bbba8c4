use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dao::{
        ids::GameId,
        models::{Entry, GameStateRecord},
    },
    state::view::GameView,
};

/// Part this session plays in its current game.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Created the game and drives the game state.
    Owner,
    #[default]
    Participant,
}

/// Shuffled entries the owner plays through. Never leaves the owner session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Deck {
    entries: Vec<Entry>,
    order: Vec<usize>,
    participant_names: Vec<String>,
}

impl Deck {
    /// `order` must be a permutation of the entry indices.
    pub fn new(entries: Vec<Entry>, order: Vec<usize>, participant_names: Vec<String>) -> Self {
        Self {
            entries,
            order,
            participant_names,
        }
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Entry shown at `position` of the shuffled sequence.
    pub fn entry_at(&self, position: usize) -> Option<&Entry> {
        self.order
            .get(position)
            .and_then(|index| self.entries.get(*index))
    }

    pub fn order(&self) -> &[usize] {
        &self.order
    }

    pub fn participant_names(&self) -> &[String] {
        &self.participant_names
    }
}

/// Everything this process knows about the game it takes part in.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSession {
    pub role: Role,
    pub game_id: Option<GameId>,
    /// Owner only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deck: Option<Deck>,
    pub view: GameView,
    /// Owner only: the game-state record most recently published.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_published: Option<GameStateRecord>,
}

impl ClientSession {
    /// Fresh session owning `game_id`.
    pub fn owner(game_id: GameId) -> Self {
        Self {
            role: Role::Owner,
            game_id: Some(game_id),
            ..Self::default()
        }
    }

    /// Fresh session taking part in `game_id`.
    pub fn participant(game_id: GameId) -> Self {
        Self {
            role: Role::Participant,
            game_id: Some(game_id),
            ..Self::default()
        }
    }

    pub fn is_owner(&self) -> bool {
        self.role == Role::Owner
    }
}
