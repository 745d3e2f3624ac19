use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;

use axum::body::Body;
use axum::extract::{MatchedPath, Request};
use axum::middleware::{self, Next, from_fn};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use http::StatusCode;
use serde::Serialize;
use thiserror::Error;
use tower_http::trace::TraceLayer;
use tracing::instrument;

use crate::api::handler::*;
use crate::api::middleware::verify_bridge_token;
use crate::app::dispatch::{DispatchError, DispatchHandle};
use crate::board::BoardError;
use crate::board::render;

pub type JsonResult<T> = core::result::Result<Json<T>, RouteError>;

#[derive(Debug)]
pub struct AppState {
    pub dispatch: DispatchHandle,
    pub bridge_token: String,
}

pub fn router(state: Arc<AppState>) -> Router {
    let bridge_routes = Router::new()
        .route("/ingest", post(ingest_message))
        .route("/command/top", post(top))
        .route("/command/fullbxh", post(full_board))
        .route("/command/resetbxh", post(reset))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            verify_bridge_token,
        ));

    Router::new()
        .merge(bridge_routes)
        .route("/", get(|| async { Response::new(Body::empty()) }))
        .layer(
            TraceLayer::new_for_http().make_span_with(|req: &Request<_>| {
                let method = req.method();
                let uri = req.uri();

                let matched_path = req
                    .extensions()
                    .get::<MatchedPath>()
                    .map(|matched| matched.as_str());

                tracing::debug_span!("bridge_request", ?method, ?uri, ?matched_path)
            }),
        )
        .layer(from_fn(log_route_errors))
        .with_state(state)
}

/// Logs the server-side failures `RouteError` stashes in the response extensions; the caller
/// only ever sees the user-facing message.
#[instrument(skip(request, next), fields(uri = request.uri().to_string()))]
async fn log_route_errors(request: Request, next: Next) -> Response {
    let res = next.run(request).await;
    if let Some(err) = res.extensions().get::<Arc<RouteError>>() {
        tracing::error!(error = ?err, "error occurred inside route handler");
    }

    res
}

/// Binds the bridge and serves until `shutdown` resolves.
#[instrument(skip(state, shutdown))]
pub async fn start_server(
    port: u16,
    state: Arc<AppState>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> std::io::Result<()> {
    let socket_addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port);
    let listener = tokio::net::TcpListener::bind(socket_addr).await?;

    tracing::info!(
        server_url = &format!("http://127.0.0.1:{}", listener.local_addr()?.port()),
        "bridge ready"
    );

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

#[derive(Debug, Error)]
pub enum RouteError {
    #[error(transparent)]
    Board(#[from] BoardError),

    #[error(transparent)]
    Dispatch(#[from] DispatchError),
}

impl IntoResponse for RouteError {
    fn into_response(self) -> Response {
        #[derive(Serialize)]
        struct ErrorResponse {
            message: String,
            ephemeral: bool,
        }

        let (status, message, err) = match &self {
            RouteError::Board(board_err) => {
                let message = render::error_message(board_err);
                match board_err {
                    BoardError::NoData => (StatusCode::NOT_FOUND, message, None),
                    BoardError::ConfirmationRequired => (StatusCode::BAD_REQUEST, message, None),
                    BoardError::MissingPermission => (StatusCode::FORBIDDEN, message, None),
                    BoardError::Store(_) => {
                        (StatusCode::INTERNAL_SERVER_ERROR, message, Some(self))
                    }
                }
            }

            RouteError::Dispatch(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                String::from("bot core is not running"),
                Some(self),
            ),
        };

        let mut response = (
            status,
            Json(ErrorResponse {
                message,
                ephemeral: true,
            }),
        )
            .into_response();

        if let Some(err) = err {
            response.extensions_mut().insert(Arc::new(err));
        }

        response
    }
}
