//! Strongly typed identifiers used as shard keys.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

/// Length of a hyphenated UUID (`xxxxxxxx-xxxx-xxxx-xxxx-xxxxxxxxxxxx`).
const HYPHENATED_UUID_LEN: usize = 36;

/// Raised when a textual identifier is not a hyphenated UUID.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("`{input}` is not a valid {kind} identifier")]
pub struct InvalidId {
    /// Raw text that failed to parse.
    pub input: String,
    /// Which identifier was being parsed.
    pub kind: &'static str,
}

/// Durable game handle shared through invite links.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct GameId(Uuid);

impl GameId {
    /// Draw a fresh random (v4) game identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl From<Uuid> for GameId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for GameId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

impl FromStr for GameId {
    type Err = InvalidId;

    /// Accepts a hyphenated UUID, and also the legacy `<uuid>.<ext>` form that
    /// older invite links carried.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let trimmed = input.trim();
        let candidate = match trimmed.split_once('.') {
            Some((id, ext)) if !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphabetic()) => {
                id
            }
            _ => trimmed,
        };
        parse_hyphenated(candidate)
            .map(Self)
            .ok_or_else(|| InvalidId {
                input: input.to_string(),
                kind: "game",
            })
    }
}

/// Private per-session identifier; also the shard key of a participant record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(transparent)]
pub struct ParticipantId(Uuid);

impl ParticipantId {
    /// Draw a fresh random (v4) participant identifier.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// First eight hex characters, used to build anonymous display names.
    pub fn short(&self) -> String {
        let mut simple = self.0.simple().to_string();
        simple.truncate(8);
        simple
    }
}

impl From<Uuid> for ParticipantId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.hyphenated().fmt(f)
    }
}

impl FromStr for ParticipantId {
    type Err = InvalidId;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        parse_hyphenated(input.trim())
            .map(Self)
            .ok_or_else(|| InvalidId {
                input: input.to_string(),
                kind: "participant",
            })
    }
}

fn parse_hyphenated(candidate: &str) -> Option<Uuid> {
    if candidate.len() != HYPHENATED_UUID_LEN {
        return None;
    }
    Uuid::try_parse(candidate).ok()
}
