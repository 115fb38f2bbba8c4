use axum::{Json, Router, extract::State, routing::post};
use validator::Validate;

use crate::{
    dto::game::{
        GameSummary, JoinGameRequest, RevealResponse, StartGameResponse, TransitionResponse,
    },
    error::AppError,
    services::{game_service, owner_service},
    state::SharedState,
};

/// Game lifecycle endpoints: create or join, then drive the game as owner.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/games", post(create_game))
        .route("/games/join", post(join_game))
        .route("/games/start", post(start_game))
        .route("/games/reveal", post(reveal))
        .route("/games/advance", post(advance))
}

/// Create a new game owned by this session.
#[utoipa::path(
    post,
    path = "/games",
    tag = "game",
    responses(
        (status = 200, description = "Game created", body = GameSummary),
        (status = 401, description = "Record store credential missing"),
        (status = 503, description = "Record store unreachable")
    )
)]
pub async fn create_game(State(state): State<SharedState>) -> Result<Json<GameSummary>, AppError> {
    Ok(Json(game_service::create_game(&state).await?))
}

/// Join an existing game and start following its state.
#[utoipa::path(
    post,
    path = "/games/join",
    tag = "game",
    request_body = JoinGameRequest,
    responses(
        (status = 200, description = "Game joined", body = GameSummary),
        (status = 400, description = "Invite is not a game id or link"),
        (status = 404, description = "Game does not exist")
    )
)]
pub async fn join_game(
    State(state): State<SharedState>,
    Json(payload): Json<JoinGameRequest>,
) -> Result<Json<GameSummary>, AppError> {
    payload.validate()?;
    Ok(Json(game_service::join_game(&state, &payload.invite).await?))
}

/// Shuffle the submitted entries and show the first one.
#[utoipa::path(
    post,
    path = "/games/start",
    tag = "game",
    responses(
        (status = 200, description = "Game started", body = StartGameResponse),
        (status = 409, description = "Not the owner, already started, or no entries")
    )
)]
pub async fn start_game(
    State(state): State<SharedState>,
) -> Result<Json<StartGameResponse>, AppError> {
    Ok(Json(owner_service::start_game(&state).await?))
}

/// Show the author of the current entry together with the votes.
#[utoipa::path(
    post,
    path = "/games/reveal",
    tag = "game",
    responses(
        (status = 200, description = "Author revealed", body = RevealResponse),
        (status = 409, description = "No question on screen")
    )
)]
pub async fn reveal(State(state): State<SharedState>) -> Result<Json<RevealResponse>, AppError> {
    Ok(Json(owner_service::reveal(&state).await?))
}

/// Move to the next entry, or end the game after the last one.
#[utoipa::path(
    post,
    path = "/games/advance",
    tag = "game",
    responses(
        (status = 200, description = "Next entry shown or game ended", body = TransitionResponse),
        (status = 409, description = "Current entry not revealed yet")
    )
)]
pub async fn advance(
    State(state): State<SharedState>,
) -> Result<Json<TransitionResponse>, AppError> {
    Ok(Json(owner_service::advance(&state).await?))
}
