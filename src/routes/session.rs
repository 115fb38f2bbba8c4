use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::{game::InviteLinks, session::SessionResponse},
    error::AppError,
    services::public_service,
    state::SharedState,
};

pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/session", get(session))
        .route("/links", get(links))
}

/// Current session: identity, role, game and view.
#[utoipa::path(
    get,
    path = "/session",
    tag = "session",
    responses((status = 200, description = "Session projection", body = SessionResponse))
)]
pub async fn session(State(state): State<SharedState>) -> Json<SessionResponse> {
    Json(public_service::get_session(&state).await)
}

/// Invite links for the current game.
#[utoipa::path(
    get,
    path = "/links",
    tag = "session",
    responses(
        (status = 200, description = "Invite links", body = InviteLinks),
        (status = 404, description = "No active game")
    )
)]
pub async fn links(State(state): State<SharedState>) -> Result<Json<InviteLinks>, AppError> {
    Ok(Json(public_service::get_links(&state).await?))
}
