//! Single entry point for every UI command. Each command is routed to the
//! service owning it; the view is re-rendered from the broadcast transitions.

use tracing::debug;

use crate::{
    dto::{
        entries::{SubmitEntriesRequest, SubmitEntriesResponse},
        game::{GameSummary, RevealResponse, StartGameResponse, TransitionResponse},
        votes::{VoteRequest, VoteResponse},
    },
    error::ServiceError,
    services::{game_service, owner_service, poller, public_service},
    state::{SharedState, view::ViewTransition},
};

/// Actions a user can take from the UI, plus the poller tick.
#[derive(Debug)]
pub enum Command {
    CreateGame,
    JoinGame { invite: String },
    SubmitEntries(SubmitEntriesRequest),
    StartGame,
    Reveal,
    Advance,
    Vote(VoteRequest),
    /// Read the game-state record once, outside the poll loop.
    PollTick,
}

impl Command {
    fn name(&self) -> &'static str {
        match self {
            Command::CreateGame => "create_game",
            Command::JoinGame { .. } => "join_game",
            Command::SubmitEntries(_) => "submit_entries",
            Command::StartGame => "start_game",
            Command::Reveal => "reveal",
            Command::Advance => "advance",
            Command::Vote(_) => "vote",
            Command::PollTick => "poll_tick",
        }
    }
}

/// What a command produced.
#[derive(Debug)]
pub enum CommandOutcome {
    Game(GameSummary),
    Entries(SubmitEntriesResponse),
    Started(StartGameResponse),
    Revealed(RevealResponse),
    Advanced(TransitionResponse),
    Voted(VoteResponse),
    /// Transition produced by a poll, if the record changed.
    Polled(Option<ViewTransition>),
}

pub async fn dispatch(state: &SharedState, command: Command) -> Result<CommandOutcome, ServiceError> {
    debug!(command = command.name(), "dispatching command");
    match command {
        Command::CreateGame => game_service::create_game(state).await.map(CommandOutcome::Game),
        Command::JoinGame { invite } => game_service::join_game(state, &invite)
            .await
            .map(CommandOutcome::Game),
        Command::SubmitEntries(request) => public_service::submit_entries(state, request)
            .await
            .map(CommandOutcome::Entries),
        Command::StartGame => owner_service::start_game(state)
            .await
            .map(CommandOutcome::Started),
        Command::Reveal => owner_service::reveal(state).await.map(CommandOutcome::Revealed),
        Command::Advance => owner_service::advance(state)
            .await
            .map(CommandOutcome::Advanced),
        Command::Vote(request) => public_service::vote(state, request)
            .await
            .map(CommandOutcome::Voted),
        Command::PollTick => {
            let game_id = state
                .session()
                .read()
                .await
                .game_id
                .ok_or_else(|| ServiceError::NotFound("no active game".into()))?;
            poller::poll_tick(state, game_id, None)
                .await
                .map(CommandOutcome::Polled)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::AppConfig,
        dao::{models::Phase, record_store::memory::InMemoryRecordStore},
        dto::entries::EntryInput,
        state::AppState,
    };
    use std::sync::Arc;

    fn entries(items: &[(&str, &str)]) -> Command {
        Command::SubmitEntries(SubmitEntriesRequest {
            entries: items
                .iter()
                .map(|(text, author)| EntryInput {
                    text: text.to_string(),
                    author_name: author.to_string(),
                })
                .collect(),
        })
    }

    #[tokio::test(start_paused = true)]
    async fn owner_and_participant_play_a_round() {
        let store = InMemoryRecordStore::new();
        let owner = AppState::new(AppConfig::default(), Arc::new(store.clone()));
        let player = AppState::new(AppConfig::default(), Arc::new(store));

        let CommandOutcome::Game(game) = dispatch(&owner, Command::CreateGame).await.unwrap() else {
            panic!("expected a game summary");
        };
        dispatch(
            &player,
            Command::JoinGame {
                invite: game.links.participant.clone(),
            },
        )
        .await
        .unwrap();
        player.replace_poller(None).await;

        dispatch(&owner, entries(&[("Honey never spoils", "Ana")]))
            .await
            .unwrap();
        dispatch(&player, entries(&[("Bananas are berries", "Ben")]))
            .await
            .unwrap();

        let CommandOutcome::Started(started) = dispatch(&owner, Command::StartGame).await.unwrap()
        else {
            panic!("expected a start response");
        };
        assert_eq!(started.total_tils, 2);

        let CommandOutcome::Polled(Some(ViewTransition::Question { index, .. })) =
            dispatch(&player, Command::PollTick).await.unwrap()
        else {
            panic!("expected the first question");
        };
        assert_eq!(index, 0);

        dispatch(
            &player,
            Command::Vote(VoteRequest {
                til_index: 0,
                voted_for_name: "Ana".into(),
            }),
        )
        .await
        .unwrap();

        let CommandOutcome::Revealed(revealed) = dispatch(&owner, Command::Reveal).await.unwrap()
        else {
            panic!("expected a reveal response");
        };
        assert_eq!(revealed.votes.total_votes, 1);

        let CommandOutcome::Polled(Some(ViewTransition::Reveal { author_name, .. })) =
            dispatch(&player, Command::PollTick).await.unwrap()
        else {
            panic!("expected the reveal");
        };
        assert_eq!(author_name, Some(revealed.author_name));
        assert!(matches!(
            dispatch(&player, Command::PollTick).await.unwrap(),
            CommandOutcome::Polled(None)
        ));

        dispatch(&owner, Command::Advance).await.unwrap();
        assert_eq!(
            player_phase_after_poll(&player).await,
            Phase::Voting
        );
    }

    async fn player_phase_after_poll(player: &SharedState) -> Phase {
        dispatch(player, Command::PollTick).await.unwrap();
        player.session().read().await.view.phase
    }

    #[tokio::test]
    async fn poll_without_game_is_rejected() {
        let state = AppState::new(AppConfig::default(), Arc::new(InMemoryRecordStore::new()));
        assert!(matches!(
            dispatch(&state, Command::PollTick).await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
