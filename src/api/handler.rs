use std::sync::Arc;

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::Json;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::api::server::{AppState, JsonResult, RouteError};
use crate::app::{IncomingMessage, Invoker};
use crate::board::render::Embed;

#[derive(Debug, Serialize)]
pub struct IngestReply {
    pub reply: Embed,
}

#[derive(Debug, Deserialize)]
pub struct ResetRequest {
    #[serde(flatten)]
    pub invoker: Invoker,
    #[serde(default)]
    pub confirm: String,
}

/// Relayed chat message; answers `204` whenever the message is ignored
#[instrument(skip(state, message), fields(channel = message.channel_id))]
pub async fn ingest_message(
    State(state): State<Arc<AppState>>,
    Json(message): Json<IncomingMessage>,
) -> Result<Response, RouteError> {
    match state.dispatch.ingest(message).await?? {
        Some(reply) => Ok(Json(IngestReply { reply }).into_response()),
        None => Ok(StatusCode::NO_CONTENT.into_response()),
    }
}

#[instrument(skip(state))]
pub async fn top(
    State(state): State<Arc<AppState>>,
    Json(invoker): Json<Invoker>,
) -> JsonResult<Embed> {
    Ok(Json(state.dispatch.top(invoker).await??))
}

#[instrument(skip(state))]
pub async fn full_board(
    State(state): State<Arc<AppState>>,
    Json(invoker): Json<Invoker>,
) -> JsonResult<Vec<Embed>> {
    Ok(Json(state.dispatch.full_board(invoker).await??))
}

#[instrument(skip(state, req), fields(is_admin = req.invoker.is_admin))]
pub async fn reset(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ResetRequest>,
) -> JsonResult<Embed> {
    Ok(Json(state.dispatch.reset(req.invoker, req.confirm).await??))
}
