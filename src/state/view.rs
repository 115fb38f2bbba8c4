//! What this session currently displays, rebuilt by folding game-state records.

use serde::Serialize;
use time::OffsetDateTime;
use utoipa::ToSchema;

use crate::dao::models::{GameStateRecord, Phase};

/// Last game-state observation, used to tell a new record from a repeat.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
enum Observed {
    #[default]
    Nothing,
    Absent,
    Record(OffsetDateTime),
}

/// Projection of the live game for the UI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct GameView {
    pub phase: Phase,
    pub current_til_index: usize,
    pub total_tils: usize,
    pub participant_names: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question_text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revealed_author_name: Option<String>,
    #[serde(skip)]
    observed: Observed,
}

/// What the UI has to render after a fold changed the view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ViewTransition {
    /// No game running yet.
    Waiting,
    /// A new question is up for voting.
    #[serde(rename_all = "camelCase")]
    Question {
        index: usize,
        total: usize,
        text: String,
        participant_names: Vec<String>,
    },
    /// The author of the current question is known.
    #[serde(rename_all = "camelCase")]
    Reveal {
        index: usize,
        total: usize,
        text: String,
        author_name: Option<String>,
    },
    /// Every entry has been played.
    Ended { total: usize },
}

impl ViewTransition {
    /// SSE event name for this transition.
    pub fn event_name(&self) -> &'static str {
        match self {
            ViewTransition::Waiting => "view.waiting",
            ViewTransition::Question { .. } => "view.question",
            ViewTransition::Reveal { .. } => "view.reveal",
            ViewTransition::Ended { .. } => "view.ended",
        }
    }
}

impl GameView {
    /// Fold the latest read of the game-state record into the view.
    ///
    /// An absent record means the game has not started. A present record only
    /// counts when its `updatedAt` differs from the last one folded, so
    /// repeated polls of the same record are no-ops and a missed intermediate
    /// record never leaves the view stuck.
    pub fn observe(&mut self, record: Option<&GameStateRecord>) -> Option<ViewTransition> {
        let Some(record) = record else {
            if self.observed == Observed::Absent {
                return None;
            }
            *self = GameView {
                observed: Observed::Absent,
                ..GameView::default()
            };
            return Some(ViewTransition::Waiting);
        };

        if self.observed == Observed::Record(record.updated_at) {
            return None;
        }

        self.observed = Observed::Record(record.updated_at);
        self.phase = record.phase;
        self.current_til_index = record.current_til_index;
        self.total_tils = record.total_tils;
        self.participant_names = record.participant_names.clone();
        self.question_text = match record.phase {
            Phase::Voting | Phase::Revealed => Some(record.current_question_text.clone()),
            Phase::Waiting | Phase::Ended => None,
        };
        self.revealed_author_name = match record.phase {
            Phase::Revealed => record.revealed_author_name.clone(),
            _ => None,
        };

        Some(self.transition())
    }

    /// Transition matching the current phase.
    pub fn transition(&self) -> ViewTransition {
        match self.phase {
            Phase::Waiting => ViewTransition::Waiting,
            Phase::Voting => ViewTransition::Question {
                index: self.current_til_index,
                total: self.total_tils,
                text: self.question_text.clone().unwrap_or_default(),
                participant_names: self.participant_names.clone(),
            },
            Phase::Revealed => ViewTransition::Reveal {
                index: self.current_til_index,
                total: self.total_tils,
                text: self.question_text.clone().unwrap_or_default(),
                author_name: self.revealed_author_name.clone(),
            },
            Phase::Ended => ViewTransition::Ended {
                total: self.total_tils,
            },
        }
    }
}
