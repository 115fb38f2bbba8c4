//! Owner actions driving the live game: start, reveal, advance.
//!
//! Every action plans a state-machine transition whose work step publishes the
//! full game-state record. A failed publish aborts the plan so the phase stays
//! put and the action can be retried.

use std::collections::HashMap;

use rand::{rng, seq::SliceRandom};
use time::{Duration, OffsetDateTime};
use tracing::{info, warn};

use crate::{
    dao::{
        ids::GameId,
        models::{Entry, GameStateRecord},
    },
    dto::game::{RevealResponse, StartGameResponse, TransitionResponse},
    error::ServiceError,
    services::{
        aggregation_service::{aggregate_entries, aggregate_votes},
        participant_service::is_valid_entry,
        retry::retry_write,
    },
    state::{
        SharedState,
        session::Deck,
        state_machine::{GameEvent, GamePhase},
        transitions::run_transition_with_broadcast,
    },
};

async fn ensure_owner(state: &SharedState) -> Result<GameId, ServiceError> {
    let session = state.session().read().await;
    match session.game_id {
        Some(game_id) if session.is_owner() => Ok(game_id),
        Some(_) => Err(ServiceError::InvalidState(
            "only the game owner can drive the game".into(),
        )),
        None => Err(ServiceError::NotFound("no active game".into())),
    }
}

async fn current_deck(state: &SharedState) -> Result<Deck, ServiceError> {
    state
        .session()
        .read()
        .await
        .deck
        .clone()
        .ok_or_else(|| ServiceError::InvalidState("the game has not started".into()))
}

/// Author names used by more than one entry, compared case-insensitively.
/// Each is reported once, spelled as on its second occurrence.
pub fn duplicate_names(entries: &[Entry]) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    let mut duplicates = Vec::new();
    for entry in entries {
        let count = counts
            .entry(entry.author_name.trim().to_lowercase())
            .or_insert(0);
        *count += 1;
        if *count == 2 {
            duplicates.push(entry.author_name.clone());
        }
    }
    duplicates
}

/// Distinct author names in first-seen order.
fn distinct_names(entries: &[Entry]) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for entry in entries {
        if !names.contains(&entry.author_name) {
            names.push(entry.author_name.clone());
        }
    }
    names
}

/// Timestamp for the next publish, strictly after the previous one.
fn next_stamp(previous: Option<&GameStateRecord>, now: OffsetDateTime) -> OffsetDateTime {
    match previous {
        Some(last) if last.updated_at >= now => last.updated_at + Duration::milliseconds(1),
        _ => now,
    }
}

fn build_record(
    game_id: GameId,
    deck: &Deck,
    phase: GamePhase,
    revealed_author_name: Option<String>,
    state: &SharedState,
    updated_at: OffsetDateTime,
) -> GameStateRecord {
    let current_til_index = match phase {
        GamePhase::Waiting => 0,
        GamePhase::Voting { index } | GamePhase::Revealed { index } => index,
        GamePhase::Ended => deck.len(),
    };
    let current_question_text = phase
        .index()
        .and_then(|index| deck.entry_at(index))
        .map(|entry| entry.text.clone())
        .unwrap_or_default();

    GameStateRecord {
        game_id,
        current_til_index,
        total_tils: deck.len(),
        shuffled_order: deck.order().to_vec(),
        phase: phase.kind(),
        participant_names: deck.participant_names().to_vec(),
        current_question_text,
        revealed_author_name,
        updated_at,
        updated_by: state.identity().participant_id(),
    }
}

/// Publish the game-state record for `phase`, retrying transient failures.
async fn publish(
    state: &SharedState,
    game_id: GameId,
    deck: &Deck,
    phase: GamePhase,
    revealed_author_name: Option<String>,
) -> Result<GameStateRecord, ServiceError> {
    let previous = state.session().read().await.last_published.clone();
    let updated_at = next_stamp(previous.as_ref(), OffsetDateTime::now_utc());
    let record = build_record(game_id, deck, phase, revealed_author_name, state, updated_at);

    let records = state.records();
    let pending = &record;
    retry_write(state.retry_policy(), "publish game state", || async move {
        records.put_game_state(pending).await.map_err(ServiceError::from)
    })
    .await?;

    state.session().write().await.last_published = Some(record.clone());
    info!(
        game_id = %game_id,
        phase = ?record.phase,
        index = record.current_til_index,
        "game state published"
    );
    Ok(record)
}

/// Shuffle every valid entry into a deck and show the first one.
pub async fn start_game(state: &SharedState) -> Result<StartGameResponse, ServiceError> {
    let game_id = ensure_owner(state).await?;
    let phase = state.state_machine_phase().await;
    if phase != GamePhase::Waiting {
        return Err(ServiceError::InvalidState(format!(
            "the game has already started (phase {phase:?})"
        )));
    }

    let aggregate =
        aggregate_entries(state.records(), game_id, state.identity().participant_id()).await?;
    let collected = aggregate.entries.len();
    let entries: Vec<Entry> = aggregate
        .entries
        .into_iter()
        .filter(is_valid_entry)
        .collect();
    let dropped_entries = collected - entries.len();
    if dropped_entries > 0 {
        warn!(game_id = %game_id, dropped = dropped_entries, "dropping invalid entries");
    }
    if entries.is_empty() {
        return Err(ServiceError::InvalidState(
            "cannot start a game without any valid entry".into(),
        ));
    }

    let duplicate_names = duplicate_names(&entries);
    if !duplicate_names.is_empty() {
        warn!(game_id = %game_id, names = ?duplicate_names, "several entries share an author name");
    }

    let mut order: Vec<usize> = (0..entries.len()).collect();
    order.shuffle(&mut rng());
    let names = distinct_names(&entries);
    let deck = Deck::new(entries, order, names);
    let total_tils = deck.len();

    let pending = &deck;
    run_transition_with_broadcast(state, GameEvent::Start { total_tils }, |to| async move {
        publish(state, game_id, pending, to, None)
            .await
            .map(|record| ((), record))
    })
    .await?;

    let mut session = state.session().write().await;
    session.deck = Some(deck);
    Ok(StartGameResponse {
        view: session.view.clone(),
        total_tils,
        dropped_entries,
        duplicate_names,
        skipped_participants: aggregate.skipped,
    })
}

/// Tally the votes for the current entry and show its author.
pub async fn reveal(state: &SharedState) -> Result<RevealResponse, ServiceError> {
    let game_id = ensure_owner(state).await?;
    let index = match state.state_machine_phase().await {
        GamePhase::Voting { index } => index,
        other => {
            return Err(ServiceError::InvalidState(format!(
                "reveal requires a question on screen, current phase {other:?}"
            )));
        }
    };
    let deck = current_deck(state).await?;
    let author_name = deck
        .entry_at(index)
        .map(|entry| entry.author_name.clone())
        .ok_or_else(|| ServiceError::InvalidState(format!("no entry at position {index}")))?;

    let votes = aggregate_votes(
        state.records(),
        game_id,
        state.identity().participant_id(),
        index,
    )
    .await?;

    let pending = &deck;
    let revealed = author_name.clone();
    run_transition_with_broadcast(state, GameEvent::Reveal, |to| async move {
        publish(state, game_id, pending, to, Some(revealed))
            .await
            .map(|record| ((), record))
    })
    .await?;

    Ok(RevealResponse {
        view: state.session().read().await.view.clone(),
        author_name,
        votes: votes.into(),
    })
}

/// Move past the revealed entry, ending the game after the last one.
pub async fn advance(state: &SharedState) -> Result<TransitionResponse, ServiceError> {
    let game_id = ensure_owner(state).await?;
    let deck = current_deck(state).await?;
    let total_tils = deck.len();

    let pending = &deck;
    run_transition_with_broadcast(state, GameEvent::Advance { total_tils }, |to| async move {
        publish(state, game_id, pending, to, None)
            .await
            .map(|record| ((), record))
    })
    .await?;

    Ok(TransitionResponse {
        view: state.session().read().await.view.clone(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            ids::ParticipantId,
            keys::RecordKey,
            models::Phase,
            record_store::{RecordStore, memory::InMemoryRecordStore, testing::FlakyStore},
        },
        services::{game_service, participant_service},
        state::{AppState, session::ClientSession, view::ViewTransition},
    };
    use std::sync::Arc;
    use uuid::Uuid;

    fn entry(text: &str, author: &str) -> Entry {
        Entry {
            id: Uuid::new_v4(),
            text: text.into(),
            author_name: author.into(),
            submitted_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    async fn owner_with_entries(store: Arc<dyn RecordStore>, entries: &[(&str, &str)]) -> SharedState {
        let state = AppState::new(AppConfig::default(), store);
        let game = game_service::create_game(&state).await.unwrap();
        let pending = entries
            .iter()
            .map(|(text, author)| participant_service::NewEntry::new(text, author).unwrap())
            .collect();
        participant_service::submit_entries(
            state.records(),
            state.retry_policy(),
            game.game_id,
            state.identity().participant_id(),
            pending,
        )
        .await
        .unwrap();
        state
    }

    #[test]
    fn duplicate_names_ignore_case_and_report_once() {
        let entries = [
            entry("Honey never spoils", "Ana"),
            entry("Bananas are berries", "ana "),
            entry("Sharks predate trees", "ANA"),
            entry("Wombat poop is cubic", "Ben"),
        ];
        assert_eq!(duplicate_names(&entries), vec!["ana ".to_string()]);
        assert_eq!(distinct_names(&entries), vec!["Ana", "ana ", "ANA", "Ben"]);
    }

    #[test]
    fn stamps_strictly_increase() {
        let now = OffsetDateTime::UNIX_EPOCH + Duration::days(1);
        let mut previous = GameStateRecord {
            game_id: GameId::random(),
            current_til_index: 0,
            total_tils: 0,
            shuffled_order: vec![],
            phase: Phase::Voting,
            participant_names: vec![],
            current_question_text: String::new(),
            revealed_author_name: None,
            updated_at: now,
            updated_by: ParticipantId::random(),
        };

        assert_eq!(next_stamp(None, now), now);
        assert_eq!(next_stamp(Some(&previous), now), now + Duration::milliseconds(1));
        previous.updated_at = now - Duration::seconds(1);
        assert_eq!(next_stamp(Some(&previous), now), now);
    }

    #[tokio::test]
    async fn full_game_walks_every_entry_then_ends() {
        let store = InMemoryRecordStore::new();
        let state = owner_with_entries(
            Arc::new(store.clone()),
            &[("Honey never spoils", "Ana"), ("Octopuses have three hearts", "Ana")],
        )
        .await;
        let mut receiver = state.view_sse().subscribe();

        let started = start_game(&state).await.unwrap();
        assert_eq!(started.total_tils, 2);
        assert_eq!(started.view.phase, Phase::Voting);
        assert_eq!(started.view.participant_names, vec!["Ana".to_string()]);
        assert!(started.view.question_text.is_some());

        let revealed = reveal(&state).await.unwrap();
        assert_eq!(revealed.author_name, "Ana");
        assert_eq!(revealed.view.revealed_author_name.as_deref(), Some("Ana"));

        let next = advance(&state).await.unwrap();
        assert_eq!(next.view.phase, Phase::Voting);
        assert_eq!(next.view.current_til_index, 1);

        reveal(&state).await.unwrap();
        let ended = advance(&state).await.unwrap();
        assert_eq!(ended.view.phase, Phase::Ended);

        let game_id = state.session().read().await.game_id.unwrap();
        let published = state.records().get_game_state(game_id).await.unwrap().unwrap();
        assert_eq!(published.phase, Phase::Ended);
        assert_eq!(published.current_til_index, 2);
        assert_eq!(published.updated_by, state.identity().participant_id());

        let first = receiver.recv().await.unwrap();
        assert_eq!(first.event.as_deref(), Some("view.question"));
    }

    #[tokio::test]
    async fn start_refuses_empty_games() {
        let state = AppState::new(AppConfig::default(), Arc::new(InMemoryRecordStore::new()));
        game_service::create_game(&state).await.unwrap();

        let err = start_game(&state).await.unwrap_err();

        assert!(matches!(err, ServiceError::InvalidState(_)));
        assert_eq!(state.state_machine_phase().await, GamePhase::Waiting);
    }

    #[tokio::test]
    async fn only_the_owner_drives_the_game() {
        let store = InMemoryRecordStore::new();
        let owner = owner_with_entries(Arc::new(store.clone()), &[("Honey never spoils", "Ana")]).await;
        let game_id = owner.session().read().await.game_id.unwrap();
        let participant = AppState::new(AppConfig::default(), Arc::new(store));
        *participant.session().write().await = ClientSession::participant(game_id);

        assert!(matches!(
            start_game(&participant).await,
            Err(ServiceError::InvalidState(_))
        ));
        assert!(matches!(
            reveal(&owner).await,
            Err(ServiceError::InvalidState(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_publish_keeps_phase() {
        let store = FlakyStore::new();
        let state = owner_with_entries(Arc::new(store.clone()), &[("Honey never spoils", "Ana")]).await;
        let game_id = state.session().read().await.game_id.unwrap();
        store.fail_puts(&RecordKey::game_state(game_id), 10);

        let err = start_game(&state).await.unwrap_err();

        assert!(err.is_retryable());
        assert_eq!(state.state_machine_phase().await, GamePhase::Waiting);
        assert_eq!(
            state.session().read().await.view.transition(),
            ViewTransition::Waiting
        );
    }
}
