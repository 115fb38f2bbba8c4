//! Writes a participant makes to its own shard, each followed by registration.

use time::OffsetDateTime;
use tracing::info;
use uuid::Uuid;

use crate::{
    dao::{
        ids::{GameId, ParticipantId},
        models::{Entry, ParticipantRecord, Vote},
        records::Records,
    },
    error::ServiceError,
    services::{
        registration_service::{RegistrationOutcome, ensure_registered},
        retry::{RetryPolicy, retry_write},
    },
};

/// Minimum length of an entry text, after trimming.
pub const MIN_TEXT_CHARS: usize = 5;
/// Minimum length of an author name, after trimming.
pub const MIN_AUTHOR_CHARS: usize = 2;

/// A validated entry that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    text: String,
    author_name: String,
}

impl NewEntry {
    pub fn new(text: &str, author_name: &str) -> Result<Self, ServiceError> {
        let text = text.trim();
        let author_name = author_name.trim();
        if text.chars().count() < MIN_TEXT_CHARS {
            return Err(ServiceError::InvalidInput(format!(
                "entry text must be at least {MIN_TEXT_CHARS} characters"
            )));
        }
        if author_name.chars().count() < MIN_AUTHOR_CHARS {
            return Err(ServiceError::InvalidInput(format!(
                "author name must be at least {MIN_AUTHOR_CHARS} characters"
            )));
        }
        Ok(Self {
            text: text.to_string(),
            author_name: author_name.to_string(),
        })
    }

    fn into_entry(self, submitted_at: OffsetDateTime) -> Entry {
        Entry {
            id: Uuid::new_v4(),
            text: self.text,
            author_name: self.author_name,
            submitted_at,
        }
    }
}

/// Whether a stored entry still satisfies the submission rules.
pub fn is_valid_entry(entry: &Entry) -> bool {
    entry.text.trim().chars().count() >= MIN_TEXT_CHARS
        && entry.author_name.trim().chars().count() >= MIN_AUTHOR_CHARS
}

#[derive(Debug, Clone)]
pub struct SubmissionReceipt {
    /// Entries as stored, with their generated ids.
    pub entries: Vec<Entry>,
    pub registration: RegistrationOutcome,
}

#[derive(Debug, Clone)]
pub struct VoteReceipt {
    pub vote: Vote,
    /// Vote for the same index that this one overwrote.
    pub replaced: Option<Vote>,
    pub registration: RegistrationOutcome,
}

/// Append entries to the caller's shard, then register the caller.
///
/// Ids are drawn once, so a retried write re-appends nothing that already landed.
pub async fn submit_entries(
    records: &Records,
    policy: &RetryPolicy,
    game_id: GameId,
    participant_id: ParticipantId,
    new_entries: Vec<NewEntry>,
) -> Result<SubmissionReceipt, ServiceError> {
    if new_entries.is_empty() {
        return Err(ServiceError::InvalidInput(
            "at least one entry is required".into(),
        ));
    }

    let now = OffsetDateTime::now_utc();
    let entries: Vec<Entry> = new_entries
        .into_iter()
        .map(|entry| entry.into_entry(now))
        .collect();

    let pending = &entries;
    retry_write(policy, "submit entries", || async move {
        let mut shard = records
            .get_participant(game_id, participant_id)
            .await?
            .unwrap_or_else(|| ParticipantRecord::new(game_id, participant_id, now));
        shard.append_entries(pending, OffsetDateTime::now_utc());
        records.put_participant(&shard).await?;
        Ok(())
    })
    .await?;

    info!(game_id = %game_id, participant_id = %participant_id, count = entries.len(), "entries submitted");

    let registration = ensure_registered(records, policy, game_id, participant_id).await?;
    Ok(SubmissionReceipt {
        entries,
        registration,
    })
}

/// Record (or replace) the caller's vote for `til_index`, then register the caller.
pub async fn submit_vote(
    records: &Records,
    policy: &RetryPolicy,
    game_id: GameId,
    participant_id: ParticipantId,
    til_index: usize,
    voted_for_name: &str,
) -> Result<VoteReceipt, ServiceError> {
    let voted_for_name = voted_for_name.trim();
    if voted_for_name.is_empty() {
        return Err(ServiceError::InvalidInput("a name to vote for is required".into()));
    }

    let vote = Vote {
        til_index,
        voted_for_name: voted_for_name.to_string(),
        voted_at: OffsetDateTime::now_utc(),
    };

    let pending = &vote;
    let replaced = retry_write(policy, "submit vote", || async move {
        let now = OffsetDateTime::now_utc();
        let mut shard = records
            .get_participant(game_id, participant_id)
            .await?
            .unwrap_or_else(|| ParticipantRecord::new(game_id, participant_id, now));
        let replaced = shard.upsert_vote(pending.clone(), now);
        records.put_participant(&shard).await?;
        Ok(replaced)
    })
    .await?;

    info!(
        game_id = %game_id,
        participant_id = %participant_id,
        til_index,
        replaced = replaced.is_some(),
        "vote recorded"
    );

    let registration = ensure_registered(records, policy, game_id, participant_id).await?;
    Ok(VoteReceipt {
        vote,
        replaced,
        registration,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dao::{
            keys::RecordKey,
            models::GameRecord,
            record_store::{memory::InMemoryRecordStore, testing::FlakyStore},
        },
        services::aggregation_service::{aggregate_entries, aggregate_votes, get_my_vote},
    };
    use std::sync::Arc;

    async fn create_game(records: &Records) -> GameId {
        let game_id = GameId::random();
        let game = GameRecord::new(game_id, OffsetDateTime::now_utc(), time::Duration::days(30));
        records.put_game(&game).await.unwrap();
        game_id
    }

    fn entry(text: &str, author: &str) -> NewEntry {
        NewEntry::new(text, author).unwrap()
    }

    #[test]
    fn entry_rules_apply_to_trimmed_input() {
        assert!(NewEntry::new("  Hi  ", "Al").is_err());
        assert!(NewEntry::new("Hello", " A ").is_err());
        let ok = NewEntry::new("  Hello  ", " Al ").unwrap();
        assert_eq!(ok.text, "Hello");
        assert_eq!(ok.author_name, "Al");
    }

    #[tokio::test(start_paused = true)]
    async fn two_participants_submit_and_both_entries_aggregate() {
        let records = Records::new(Arc::new(InMemoryRecordStore::new()));
        let policy = RetryPolicy::default();
        let game_id = create_game(&records).await;
        assert!(
            records
                .get_game(game_id)
                .await
                .unwrap()
                .unwrap()
                .registered_participants
                .is_empty()
        );

        let (p1, p2) = (ParticipantId::random(), ParticipantId::random());
        let r1 = submit_entries(&records, &policy, game_id, p1, vec![entry("Otters hold hands", "Ana")])
            .await
            .unwrap();
        let r2 = submit_entries(&records, &policy, game_id, p2, vec![entry("Snails can sleep for years", "Ben")])
            .await
            .unwrap();
        assert!(r1.registration.is_verified());
        assert!(r2.registration.is_verified());

        let aggregate = aggregate_entries(&records, game_id, p1).await.unwrap();
        let authors: Vec<_> = aggregate
            .entries
            .iter()
            .map(|e| e.author_name.as_str())
            .collect();
        assert_eq!(authors, vec!["Ana", "Ben"]);
    }

    #[tokio::test(start_paused = true)]
    async fn revote_replaces_previous_choice() {
        let records = Records::new(Arc::new(InMemoryRecordStore::new()));
        let policy = RetryPolicy::default();
        let game_id = create_game(&records).await;
        let p1 = ParticipantId::random();

        let first = submit_vote(&records, &policy, game_id, p1, 0, "Alice").await.unwrap();
        let second = submit_vote(&records, &policy, game_id, p1, 0, "Bob").await.unwrap();

        assert!(first.replaced.is_none());
        assert_eq!(
            second.replaced.map(|v| v.voted_for_name),
            Some("Alice".to_string())
        );
        let mine = get_my_vote(&records, game_id, p1, 0).await.unwrap().unwrap();
        assert_eq!(mine.voted_for_name, "Bob");

        let tally = aggregate_votes(&records, game_id, p1, 0).await.unwrap();
        assert_eq!(tally.total_votes, 1);
        assert_eq!(tally.tally.len(), 1);
        assert_eq!(tally.tally.get("Bob"), Some(&1));
    }

    #[tokio::test(start_paused = true)]
    async fn vote_counts_even_when_registration_stays_unverified() {
        let store = FlakyStore::new();
        let records = Records::new(Arc::new(store.clone()));
        let policy = RetryPolicy::default();
        let game_id = create_game(&records).await;
        let p1 = ParticipantId::random();
        let observer = ParticipantId::random();
        store.drop_puts(&RecordKey::game(game_id), 5);

        let receipt = submit_entries(&records, &policy, game_id, p1, vec![entry("Koalas have fingerprints", "Cleo")])
            .await
            .unwrap();
        assert_eq!(
            receipt.registration,
            RegistrationOutcome::Unverified { attempts: 5 }
        );

        // The drop budget is spent, so this registration goes through.
        let vote = submit_vote(&records, &policy, game_id, p1, 0, "Cleo").await.unwrap();
        assert!(vote.registration.is_verified());

        let tally = aggregate_votes(&records, game_id, observer, 0).await.unwrap();
        assert_eq!(tally.tally.get("Cleo"), Some(&1));
        assert_eq!(tally.voters[0].voter_participant_id, p1);
    }

    #[tokio::test(start_paused = true)]
    async fn shard_write_is_retried_without_duplicating_entries() {
        let store = FlakyStore::new();
        let records = Records::new(Arc::new(store.clone()));
        let policy = RetryPolicy::default();
        let game_id = create_game(&records).await;
        let p1 = ParticipantId::random();
        store.fail_puts(&RecordKey::participant(game_id, p1), 2);

        submit_entries(
            &records,
            &policy,
            game_id,
            p1,
            vec![entry("Otters hold hands", "Ana"), entry("Cows have best friends", "Ana")],
        )
        .await
        .unwrap();

        let shard = records.get_participant(game_id, p1).await.unwrap().unwrap();
        assert_eq!(shard.entries.len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn empty_submission_is_rejected() {
        let records = Records::new(Arc::new(InMemoryRecordStore::new()));
        let game_id = create_game(&records).await;
        let err = submit_entries(&records, &RetryPolicy::default(), game_id, ParticipantId::random(), vec![])
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }
}
