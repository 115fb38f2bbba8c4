use std::convert::Infallible;

use axum::{Router, extract::State, response::sse::Sse, routing::get};
use futures::Stream;
use tracing::info;

use crate::{
    services::{sse_events, sse_service},
    state::SharedState,
};

#[utoipa::path(
    get,
    path = "/sse/view",
    tag = "sse",
    responses((status = 200, description = "View transitions stream", content_type = "text/event-stream", body = String))
)]
/// Stream view transitions, starting with a handshake carrying the current view.
pub async fn view_stream(
    State(state): State<SharedState>,
) -> Sse<impl Stream<Item = Result<axum::response::sse::Event, Infallible>>> {
    let receiver = sse_service::subscribe_view(&state);
    info!("New view SSE connection");
    let handshake = sse_events::handshake_event(&state).await;
    sse_service::to_sse_stream(receiver, handshake)
}

/// Configure the SSE endpoints.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route("/sse/view", get(view_stream))
}
