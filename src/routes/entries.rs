use axum::{Json, Router, extract::State, routing::post};
use validator::Validate;

use crate::{
    dto::entries::{EntriesResponse, SubmitEntriesRequest, SubmitEntriesResponse},
    error::AppError,
    services::public_service,
    state::SharedState,
};

pub fn router() -> Router<SharedState> {
    Router::new().route("/entries", post(submit_entries).get(list_entries))
}

/// Store entries for this session, then register it in the game.
#[utoipa::path(
    post,
    path = "/entries",
    tag = "entries",
    request_body = SubmitEntriesRequest,
    responses(
        (status = 200, description = "Entries stored", body = SubmitEntriesResponse),
        (status = 400, description = "Entry text or author name too short"),
        (status = 404, description = "No active game")
    )
)]
pub async fn submit_entries(
    State(state): State<SharedState>,
    Json(payload): Json<SubmitEntriesRequest>,
) -> Result<Json<SubmitEntriesResponse>, AppError> {
    payload.validate()?;
    Ok(Json(public_service::submit_entries(&state, payload).await?))
}

/// Every entry of the game that could be read.
#[utoipa::path(
    get,
    path = "/entries",
    tag = "entries",
    responses(
        (status = 200, description = "Aggregated entries", body = EntriesResponse),
        (status = 404, description = "No active game")
    )
)]
pub async fn list_entries(
    State(state): State<SharedState>,
) -> Result<Json<EntriesResponse>, AppError> {
    Ok(Json(public_service::get_entries(&state).await?))
}
