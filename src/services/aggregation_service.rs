//! Fan-out reads rebuilding the shared entry list and vote tallies from the
//! per-participant shards.
//!
//! Shards are read one after the other. A shard that cannot be read is left out
//! and reported in `skipped`; it never fails the whole aggregation.

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::{
    dao::{
        ids::{GameId, ParticipantId},
        models::{Entry, ParticipantRecord, Vote},
        records::Records,
    },
    error::ServiceError,
};

/// Every entry of the game, in participant order then submission order.
#[derive(Debug, Clone, Default)]
pub struct EntryAggregate {
    pub entries: Vec<Entry>,
    /// Participants whose shard could not be read.
    pub skipped: Vec<ParticipantId>,
}

/// One participant's vote as shown in the reveal breakdown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoterRecord {
    pub voter_participant_id: ParticipantId,
    pub voter_display_name: String,
    pub voted_for: String,
}

/// Votes cast for one position of the deck.
#[derive(Debug, Clone, Default)]
pub struct VoteAggregate {
    pub til_index: usize,
    /// Votes per name, in order of first vote.
    pub tally: IndexMap<String, usize>,
    pub total_votes: usize,
    pub voters: Vec<VoterRecord>,
    pub skipped: Vec<ParticipantId>,
}

/// Registered participants plus the caller, who is appended when the
/// registration has not been observed yet.
pub fn participant_union(registered: &[ParticipantId], caller: ParticipantId) -> Vec<ParticipantId> {
    let mut ids = registered.to_vec();
    if !ids.contains(&caller) {
        ids.push(caller);
    }
    ids
}

pub async fn aggregate_entries(
    records: &Records,
    game_id: GameId,
    caller: ParticipantId,
) -> Result<EntryAggregate, ServiceError> {
    let (shards, skipped) = read_shards(records, game_id, caller).await?;
    let entries = shards
        .into_iter()
        .flat_map(|shard| shard.entries)
        .collect::<Vec<_>>();

    debug!(game_id = %game_id, count = entries.len(), skipped = skipped.len(), "aggregated entries");
    Ok(EntryAggregate { entries, skipped })
}

pub async fn aggregate_votes(
    records: &Records,
    game_id: GameId,
    caller: ParticipantId,
    til_index: usize,
) -> Result<VoteAggregate, ServiceError> {
    let (shards, skipped) = read_shards(records, game_id, caller).await?;

    let mut aggregate = VoteAggregate {
        til_index,
        skipped,
        ..VoteAggregate::default()
    };
    for shard in &shards {
        let Some(vote) = shard.vote_for(til_index) else {
            continue;
        };
        *aggregate
            .tally
            .entry(vote.voted_for_name.clone())
            .or_insert(0) += 1;
        aggregate.voters.push(VoterRecord {
            voter_participant_id: shard.participant_id,
            voter_display_name: shard.display_name(),
            voted_for: vote.voted_for_name.clone(),
        });
    }
    aggregate.total_votes = aggregate.voters.len();

    debug!(
        game_id = %game_id,
        til_index,
        total_votes = aggregate.total_votes,
        skipped = aggregate.skipped.len(),
        "aggregated votes"
    );
    Ok(aggregate)
}

/// The caller's own vote for `til_index`, read from their shard only.
pub async fn get_my_vote(
    records: &Records,
    game_id: GameId,
    participant_id: ParticipantId,
    til_index: usize,
) -> Result<Option<Vote>, ServiceError> {
    Ok(records
        .get_participant(game_id, participant_id)
        .await?
        .and_then(|shard| shard.vote_for(til_index).cloned()))
}

async fn read_shards(
    records: &Records,
    game_id: GameId,
    caller: ParticipantId,
) -> Result<(Vec<ParticipantRecord>, Vec<ParticipantId>), ServiceError> {
    let game = records
        .get_game(game_id)
        .await?
        .ok_or(ServiceError::GameNotFound(game_id))?;

    let mut shards = Vec::new();
    let mut skipped = Vec::new();
    for participant_id in participant_union(&game.registered_participants, caller) {
        match records.get_participant(game_id, participant_id).await {
            Ok(Some(shard)) => shards.push(shard),
            // Registered but nothing submitted yet.
            Ok(None) => {}
            Err(err) => {
                warn!(
                    game_id = %game_id,
                    participant_id = %participant_id,
                    error = %err,
                    "skipping unreadable participant shard"
                );
                skipped.push(participant_id);
            }
        }
    }

    Ok((shards, skipped))
}
