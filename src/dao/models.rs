//! Record shapes persisted in the shared store.
//!
//! Every record is a whole JSON document; the store offers no partial update,
//! so each type carries the helpers that mutate it locally before a full PUT.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use time::{Duration, OffsetDateTime};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dao::ids::{GameId, ParticipantId};

/// Membership record shared by every session of a game.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    pub game_id: GameId,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// Advisory only; nothing in this crate enforces it.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub last_updated: OffsetDateTime,
    /// Ordered list, logically a set. Only ever grows.
    #[serde(default)]
    pub registered_participants: Vec<ParticipantId>,
}

impl GameRecord {
    /// Fresh game with nobody registered yet.
    pub fn new(game_id: GameId, now: OffsetDateTime, ttl: Duration) -> Self {
        Self {
            game_id,
            created_at: now,
            expires_at: now + ttl,
            last_updated: now,
            registered_participants: Vec::new(),
        }
    }

    pub fn is_registered(&self, participant_id: ParticipantId) -> bool {
        self.registered_participants.contains(&participant_id)
    }

    /// Append `participant_id` unless already listed. Returns whether the list changed.
    pub fn register(&mut self, participant_id: ParticipantId, now: OffsetDateTime) -> bool {
        if self.is_registered(participant_id) {
            return false;
        }
        self.registered_participants.push(participant_id);
        self.last_updated = now;
        true
    }

    pub(crate) fn check_shape(&self, game_id: GameId) -> Result<(), String> {
        if self.game_id != game_id {
            return Err(format!("record belongs to game {}", self.game_id));
        }
        Ok(())
    }

    /// Drop repeated participant ids, keeping first occurrences in order.
    /// Returns how many were removed.
    pub fn dedupe_participants(&mut self) -> usize {
        let before = self.registered_participants.len();
        let mut seen = HashSet::with_capacity(before);
        self.registered_participants.retain(|id| seen.insert(*id));
        before - self.registered_participants.len()
    }
}

/// One submitted fact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    pub id: Uuid,
    pub text: String,
    pub author_name: String,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub submitted_at: OffsetDateTime,
}

/// A guess for the author of the entry shown at `til_index`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Vote {
    pub til_index: usize,
    pub voted_for_name: String,
    #[serde(with = "time::serde::rfc3339")]
    #[schema(value_type = String, format = DateTime)]
    pub voted_at: OffsetDateTime,
}

/// Single-writer shard holding one participant's entries and votes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantRecord {
    pub participant_id: ParticipantId,
    pub game_id: GameId,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    #[serde(default)]
    pub entries: Vec<Entry>,
    #[serde(default)]
    pub votes: Vec<Vote>,
}

impl ParticipantRecord {
    pub fn new(game_id: GameId, participant_id: ParticipantId, now: OffsetDateTime) -> Self {
        Self {
            participant_id,
            game_id,
            updated_at: now,
            entries: Vec::new(),
            votes: Vec::new(),
        }
    }

    /// Append entries not already present (matched by id), keeping insertion
    /// order. Returns how many were added.
    pub fn append_entries(&mut self, entries: &[Entry], now: OffsetDateTime) -> usize {
        let mut added = 0;
        for entry in entries {
            if self.entries.iter().any(|existing| existing.id == entry.id) {
                continue;
            }
            self.entries.push(entry.clone());
            added += 1;
        }
        if added > 0 {
            self.updated_at = now;
        }
        added
    }

    /// Insert or replace the vote for `vote.til_index`, returning the replaced vote.
    pub fn upsert_vote(&mut self, vote: Vote, now: OffsetDateTime) -> Option<Vote> {
        self.updated_at = now;
        match self
            .votes
            .iter_mut()
            .find(|existing| existing.til_index == vote.til_index)
        {
            Some(existing) => Some(std::mem::replace(existing, vote)),
            None => {
                self.votes.push(vote);
                None
            }
        }
    }

    pub fn vote_for(&self, til_index: usize) -> Option<&Vote> {
        self.votes.iter().find(|vote| vote.til_index == til_index)
    }

    /// Name shown next to this participant's vote: the author of their first
    /// entry, or an anonymous label derived from the id.
    pub fn display_name(&self) -> String {
        self.entries
            .first()
            .map(|entry| entry.author_name.clone())
            .unwrap_or_else(|| anonymous_name(self.participant_id))
    }

    pub(crate) fn check_shape(
        &self,
        game_id: GameId,
        participant_id: ParticipantId,
    ) -> Result<(), String> {
        if self.game_id != game_id || self.participant_id != participant_id {
            return Err(format!(
                "record belongs to participant {} of game {}",
                self.participant_id, self.game_id
            ));
        }
        let mut indices = HashSet::with_capacity(self.votes.len());
        if let Some(dup) = self.votes.iter().find(|vote| !indices.insert(vote.til_index)) {
            return Err(format!("two votes recorded for index {}", dup.til_index));
        }
        Ok(())
    }
}

/// Fallback label for a participant that never submitted an entry.
pub fn anonymous_name(participant_id: ParticipantId) -> String {
    format!("Participant {}", participant_id.short())
}

/// Phase of the live game as broadcast by the owner.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    #[default]
    Waiting,
    Voting,
    Revealed,
    Ended,
}

/// Live game state, written only by the owner and polled by everyone else.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStateRecord {
    pub game_id: GameId,
    #[serde(rename = "currentTILIndex")]
    pub current_til_index: usize,
    #[serde(rename = "totalTILs")]
    pub total_tils: usize,
    pub shuffled_order: Vec<usize>,
    pub phase: Phase,
    #[serde(default)]
    pub participant_names: Vec<String>,
    #[serde(default)]
    pub current_question_text: String,
    #[serde(default)]
    pub revealed_author_name: Option<String>,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub updated_by: ParticipantId,
}

impl GameStateRecord {
    pub(crate) fn check_shape(&self, game_id: GameId) -> Result<(), String> {
        if self.game_id != game_id {
            return Err(format!("record belongs to game {}", self.game_id));
        }
        if self.shuffled_order.len() != self.total_tils {
            return Err(format!(
                "shuffled order has {} slots for {} TILs",
                self.shuffled_order.len(),
                self.total_tils
            ));
        }
        let mut seen = vec![false; self.total_tils];
        for &slot in &self.shuffled_order {
            match seen.get_mut(slot) {
                Some(flag) if !*flag => *flag = true,
                _ => return Err(format!("shuffled order is not a permutation (slot {slot})")),
            }
        }
        let index_ok = match self.phase {
            Phase::Voting | Phase::Revealed => self.current_til_index < self.total_tils,
            Phase::Waiting | Phase::Ended => self.current_til_index <= self.total_tils,
        };
        if !index_ok {
            return Err(format!(
                "index {} out of range for phase {:?} with {} TILs",
                self.current_til_index, self.phase, self.total_tils
            ));
        }
        Ok(())
    }
}
