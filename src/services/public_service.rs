//! Session-scoped reads and participant writes exposed to the UI. Every
//! helper works on the game currently held by the session.

use crate::{
    dao::{ids::GameId, models::Phase},
    dto::{
        entries::{EntriesResponse, SubmitEntriesRequest, SubmitEntriesResponse},
        game::InviteLinks,
        session::SessionResponse,
        votes::{MyVoteResponse, VoteRequest, VoteResponse, VoteTallyResponse},
    },
    error::ServiceError,
    services::{aggregation_service, game_service, participant_service},
    state::SharedState,
};

async fn active_game(state: &SharedState) -> Result<GameId, ServiceError> {
    state
        .session()
        .read()
        .await
        .game_id
        .ok_or_else(|| ServiceError::NotFound("no active game".into()))
}

/// Every readable entry of the current game.
pub async fn get_entries(state: &SharedState) -> Result<EntriesResponse, ServiceError> {
    let game_id = active_game(state).await?;
    let aggregate = aggregation_service::aggregate_entries(
        state.records(),
        game_id,
        state.identity().participant_id(),
    )
    .await?;
    Ok(aggregate.into())
}

/// Votes cast for the entry at `til_index`.
pub async fn get_votes(
    state: &SharedState,
    til_index: usize,
) -> Result<VoteTallyResponse, ServiceError> {
    let game_id = active_game(state).await?;
    let aggregate = aggregation_service::aggregate_votes(
        state.records(),
        game_id,
        state.identity().participant_id(),
        til_index,
    )
    .await?;
    Ok(aggregate.into())
}

pub async fn get_my_vote(
    state: &SharedState,
    til_index: usize,
) -> Result<MyVoteResponse, ServiceError> {
    let game_id = active_game(state).await?;
    let vote = aggregation_service::get_my_vote(
        state.records(),
        game_id,
        state.identity().participant_id(),
        til_index,
    )
    .await?;
    Ok(MyVoteResponse { vote })
}

/// Projection of the session for the UI.
pub async fn get_session(state: &SharedState) -> SessionResponse {
    let polling = state.poller_running().await;
    let session = state.session().read().await;
    SessionResponse {
        participant_id: state.identity().participant_id(),
        role: session.role,
        game_id: session.game_id,
        view: session.view.clone(),
        deck_size: session.deck.as_ref().map(|deck| deck.len()),
        polling,
        degraded: state.is_degraded(),
    }
}

pub async fn get_links(state: &SharedState) -> Result<InviteLinks, ServiceError> {
    let game_id = active_game(state).await?;
    Ok(game_service::invite_links(state, game_id))
}

/// Store entries in this session's shard, then register it in the game.
pub async fn submit_entries(
    state: &SharedState,
    request: SubmitEntriesRequest,
) -> Result<SubmitEntriesResponse, ServiceError> {
    let game_id = active_game(state).await?;
    let entries = request
        .entries
        .iter()
        .map(|input| participant_service::NewEntry::new(&input.text, &input.author_name))
        .collect::<Result<Vec<_>, _>>()?;

    let receipt = participant_service::submit_entries(
        state.records(),
        state.retry_policy(),
        game_id,
        state.identity().participant_id(),
        entries,
    )
    .await?;
    Ok(SubmitEntriesResponse {
        entries: receipt.entries,
        registration: receipt.registration.into(),
    })
}

/// Game of the session, provided the entry at `til_index` is the one on screen
/// and still open for voting.
async fn open_for_voting(state: &SharedState, til_index: usize) -> Result<GameId, ServiceError> {
    let session = state.session().read().await;
    let game_id = session
        .game_id
        .ok_or_else(|| ServiceError::NotFound("no active game".into()))?;
    let view = &session.view;
    if view.phase != Phase::Voting || view.current_til_index != til_index {
        return Err(ServiceError::InvalidState(format!(
            "entry {til_index} is not open for voting (phase {:?}, current entry {})",
            view.phase, view.current_til_index
        )));
    }
    Ok(game_id)
}

/// Record or replace this session's vote, then register it in the game.
/// Only the entry currently up for voting accepts votes.
pub async fn vote(state: &SharedState, request: VoteRequest) -> Result<VoteResponse, ServiceError> {
    let game_id = open_for_voting(state, request.til_index).await?;
    let receipt = participant_service::submit_vote(
        state.records(),
        state.retry_policy(),
        game_id,
        state.identity().participant_id(),
        request.til_index,
        &request.voted_for_name,
    )
    .await?;
    Ok(VoteResponse {
        vote: receipt.vote,
        replaced: receipt.replaced.is_some(),
        registration: receipt.registration.into(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dao::record_store::memory::InMemoryRecordStore,
        dto::{entries::EntryInput, entries::RegistrationStatus},
        services::owner_service,
        state::AppState,
    };
    use std::sync::Arc;

    #[tokio::test]
    async fn reads_require_an_active_game() {
        let state = AppState::new(AppConfig::default(), Arc::new(InMemoryRecordStore::new()));

        assert!(matches!(get_entries(&state).await, Err(ServiceError::NotFound(_))));
        assert!(matches!(get_links(&state).await, Err(ServiceError::NotFound(_))));
        let session = get_session(&state).await;
        assert_eq!(session.game_id, None);
        assert!(!session.polling);
    }

    fn vote_for(til_index: usize, name: &str) -> VoteRequest {
        VoteRequest {
            til_index,
            voted_for_name: name.into(),
        }
    }

    #[tokio::test]
    async fn participant_flow_through_the_session() {
        let store = InMemoryRecordStore::new();
        let owner = AppState::new(AppConfig::default(), Arc::new(store.clone()));
        let game = game_service::create_game(&owner).await.unwrap();

        let submitted = submit_entries(
            &owner,
            SubmitEntriesRequest {
                entries: vec![EntryInput {
                    text: "  Honey never spoils ".into(),
                    author_name: "Ana".into(),
                }],
            },
        )
        .await
        .unwrap();
        assert_eq!(submitted.entries[0].text, "Honey never spoils");
        assert!(matches!(
            submitted.registration,
            RegistrationStatus::Registered { .. }
        ));

        owner_service::start_game(&owner).await.unwrap();
        let first = vote(&owner, vote_for(0, "Ben")).await.unwrap();
        let second = vote(&owner, vote_for(0, "Ana")).await.unwrap();
        assert!(!first.replaced);
        assert!(second.replaced);

        let tally = get_votes(&owner, 0).await.unwrap();
        assert_eq!(tally.total_votes, 1);
        assert_eq!(tally.tally.get("Ana"), Some(&1));
        let mine = get_my_vote(&owner, 0).await.unwrap();
        assert_eq!(mine.vote.map(|v| v.voted_for_name).as_deref(), Some("Ana"));

        let entries = get_entries(&owner).await.unwrap();
        assert_eq!(entries.entries.len(), 1);
        assert_eq!(get_links(&owner).await.unwrap().owner, game.links.owner);
    }

    #[tokio::test]
    async fn votes_only_land_on_the_entry_up_for_voting() {
        let state = AppState::new(AppConfig::default(), Arc::new(InMemoryRecordStore::new()));
        game_service::create_game(&state).await.unwrap();
        submit_entries(
            &state,
            SubmitEntriesRequest {
                entries: vec![EntryInput {
                    text: "Honey never spoils".into(),
                    author_name: "Ana".into(),
                }],
            },
        )
        .await
        .unwrap();

        let waiting = vote(&state, vote_for(0, "Ana")).await.unwrap_err();
        assert!(matches!(waiting, ServiceError::InvalidState(_)));

        owner_service::start_game(&state).await.unwrap();
        let wrong_index = vote(&state, vote_for(99, "Ghost")).await.unwrap_err();
        assert!(matches!(wrong_index, ServiceError::InvalidState(_)));
        vote(&state, vote_for(0, "Ben")).await.unwrap();

        owner_service::reveal(&state).await.unwrap();
        let after_reveal = vote(&state, vote_for(0, "Ana")).await.unwrap_err();
        assert!(matches!(after_reveal, ServiceError::InvalidState(_)));

        let tally = get_votes(&state, 0).await.unwrap();
        assert_eq!(tally.total_votes, 1);
        assert_eq!(tally.tally.get("Ben"), Some(&1));
    }

    #[tokio::test]
    async fn short_entries_are_rejected() {
        let state = AppState::new(AppConfig::default(), Arc::new(InMemoryRecordStore::new()));
        game_service::create_game(&state).await.unwrap();

        let err = submit_entries(
            &state,
            SubmitEntriesRequest {
                entries: vec![EntryInput {
                    text: "hey".into(),
                    author_name: "Ana".into(),
                }],
            },
        )
        .await
        .unwrap_err();

        assert!(matches!(err, ServiceError::InvalidInput(_)));
    }
}
