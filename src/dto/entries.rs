use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::{ids::ParticipantId, models::Entry},
    dto::validation::{validate_author_name, validate_entry_text},
    services::{aggregation_service::EntryAggregate, registration_service::RegistrationOutcome},
};

/// One fact typed by the participant.
#[derive(Debug, Serialize, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct EntryInput {
    #[validate(custom(function = "validate_entry_text"))]
    pub text: String,
    #[validate(custom(function = "validate_author_name"))]
    pub author_name: String,
}

/// Batch of entries submitted at once.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct SubmitEntriesRequest {
    #[validate(length(min = 1, max = 50), nested)]
    pub entries: Vec<EntryInput>,
}

/// Whether this session is known to be listed in the game record.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RegistrationStatus {
    AlreadyRegistered,
    Registered { attempts: u32 },
    /// Writes kept being overwritten; the next submission tries again.
    Unverified { attempts: u32 },
}

impl From<RegistrationOutcome> for RegistrationStatus {
    fn from(value: RegistrationOutcome) -> Self {
        match value {
            RegistrationOutcome::AlreadyRegistered => RegistrationStatus::AlreadyRegistered,
            RegistrationOutcome::Registered { attempts } => RegistrationStatus::Registered { attempts },
            RegistrationOutcome::Unverified { attempts } => RegistrationStatus::Unverified { attempts },
        }
    }
}

/// Entries as stored after a submission.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SubmitEntriesResponse {
    pub entries: Vec<Entry>,
    pub registration: RegistrationStatus,
}

/// Every entry of the game that could be read.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct EntriesResponse {
    pub entries: Vec<Entry>,
    pub skipped_participants: Vec<ParticipantId>,
}

impl From<EntryAggregate> for EntriesResponse {
    fn from(value: EntryAggregate) -> Self {
        Self {
            entries: value.entries,
            skipped_participants: value.skipped,
        }
    }
}
