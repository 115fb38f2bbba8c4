use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use validator::Validate;

use crate::{
    dto::votes::{MyVoteResponse, VoteRequest, VoteResponse, VoteTallyResponse},
    error::AppError,
    services::public_service,
    state::SharedState,
};

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/votes", post(vote))
        .route("/votes/{index}", get(tally))
        .route("/votes/{index}/mine", get(my_vote))
}

/// Record or replace this session's guess for an entry.
#[utoipa::path(
    post,
    path = "/votes",
    tag = "votes",
    request_body = VoteRequest,
    responses(
        (status = 200, description = "Vote stored", body = VoteResponse),
        (status = 400, description = "Missing name"),
        (status = 404, description = "No active game"),
        (status = 409, description = "That entry is not open for voting")
    )
)]
pub async fn vote(
    State(state): State<SharedState>,
    Json(payload): Json<VoteRequest>,
) -> Result<Json<VoteResponse>, AppError> {
    payload.validate()?;
    Ok(Json(public_service::vote(&state, payload).await?))
}

/// Votes cast for the entry at `index`.
#[utoipa::path(
    get,
    path = "/votes/{index}",
    tag = "votes",
    params(("index" = usize, Path, description = "Position of the entry in the shuffled deck")),
    responses((status = 200, description = "Vote tally", body = VoteTallyResponse))
)]
pub async fn tally(
    State(state): State<SharedState>,
    Path(index): Path<usize>,
) -> Result<Json<VoteTallyResponse>, AppError> {
    Ok(Json(public_service::get_votes(&state, index).await?))
}

/// This session's own vote for the entry at `index`.
#[utoipa::path(
    get,
    path = "/votes/{index}/mine",
    tag = "votes",
    params(("index" = usize, Path, description = "Position of the entry in the shuffled deck")),
    responses((status = 200, description = "Own vote, if any", body = MyVoteResponse))
)]
pub async fn my_vote(
    State(state): State<SharedState>,
    Path(index): Path<usize>,
) -> Result<Json<MyVoteResponse>, AppError> {
    Ok(Json(public_service::get_my_vote(&state, index).await?))
}
