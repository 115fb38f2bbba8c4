use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the TIL Shuffle session host.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::game::create_game,
        crate::routes::game::join_game,
        crate::routes::game::start_game,
        crate::routes::game::reveal,
        crate::routes::game::advance,
        crate::routes::entries::submit_entries,
        crate::routes::entries::list_entries,
        crate::routes::votes::vote,
        crate::routes::votes::tally,
        crate::routes::votes::my_vote,
        crate::routes::session::session,
        crate::routes::session::links,
        crate::routes::sse::view_stream,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::game::JoinGameRequest,
            crate::dto::game::GameSummary,
            crate::dto::game::InviteLinks,
            crate::dto::game::StartGameResponse,
            crate::dto::game::RevealResponse,
            crate::dto::game::TransitionResponse,
            crate::dto::entries::EntryInput,
            crate::dto::entries::SubmitEntriesRequest,
            crate::dto::entries::SubmitEntriesResponse,
            crate::dto::entries::EntriesResponse,
            crate::dto::entries::RegistrationStatus,
            crate::dto::votes::VoteRequest,
            crate::dto::votes::VoteResponse,
            crate::dto::votes::VoteTallyResponse,
            crate::dto::votes::VoterSummary,
            crate::dto::votes::MyVoteResponse,
            crate::dto::session::SessionResponse,
            crate::dto::sse::Handshake,
            crate::dto::sse::SystemStatus,
            crate::state::view::GameView,
            crate::state::view::ViewTransition,
            crate::dao::models::Phase,
        )
    ),
    tags(
        (name = "health", description = "Record store health"),
        (name = "game", description = "Create, join and drive a game"),
        (name = "entries", description = "Submit and list entries"),
        (name = "votes", description = "Cast votes and read tallies"),
        (name = "session", description = "Session projection and invite links"),
        (name = "sse", description = "Server-sent events streams"),
    )
)]
pub struct ApiDoc;
