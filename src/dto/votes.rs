use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

use crate::{
    dao::{ids::ParticipantId, models::Vote},
    dto::entries::RegistrationStatus,
    services::aggregation_service::{VoteAggregate, VoterRecord},
};

/// Guess for the author of the entry at `tilIndex`.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    pub til_index: usize,
    #[validate(length(min = 1, max = 200))]
    pub voted_for_name: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoteResponse {
    pub vote: Vote,
    /// Whether an earlier vote for the same index was replaced.
    pub replaced: bool,
    pub registration: RegistrationStatus,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoterSummary {
    pub voter_participant_id: ParticipantId,
    pub voter_display_name: String,
    pub voted_for: String,
}

impl From<VoterRecord> for VoterSummary {
    fn from(value: VoterRecord) -> Self {
        Self {
            voter_participant_id: value.voter_participant_id,
            voter_display_name: value.voter_display_name,
            voted_for: value.voted_for,
        }
    }
}

/// Votes cast for one entry.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VoteTallyResponse {
    pub til_index: usize,
    /// Votes per name, in order of first vote.
    #[schema(value_type = Object)]
    pub tally: IndexMap<String, usize>,
    pub total_votes: usize,
    pub voters: Vec<VoterSummary>,
    pub skipped_participants: Vec<ParticipantId>,
}

impl From<VoteAggregate> for VoteTallyResponse {
    fn from(value: VoteAggregate) -> Self {
        Self {
            til_index: value.til_index,
            tally: value.tally,
            total_votes: value.total_votes,
            voters: value.voters.into_iter().map(Into::into).collect(),
            skipped_participants: value.skipped,
        }
    }
}

/// This session's own vote, if any.
#[derive(Debug, Serialize, ToSchema)]
pub struct MyVoteResponse {
    pub vote: Option<Vote>,
}
