//! HTTP and WebSocket transport.

use std::sync::Arc;

use axum::{
    Json, Router,
    body::Body,
    extract::{
        Query, State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    http::{HeaderMap, Request, StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use tower::ServiceBuilder;
use tracing::{debug, error, info, instrument, warn};

use crate::db::{MatchPlayerRecord, MatchRecord, MatchRepository};
use crate::engine::GameService;
use crate::error::GameError;
use crate::game::{AccountRef, ConnId};
use crate::notify::RoomHub;
use crate::protocol::{ActionReply, ClientMessage, ServerMessage};

/// Header carrying the authenticated account id, set by a fronting proxy.
pub const ACCOUNT_HEADER: &str = "x-account-id";

const DEFAULT_HISTORY_LIMIT: i64 = 20;
const MAX_HISTORY_LIMIT: i64 = 100;

/// Shared state for every route.
#[derive(Clone)]
pub struct AppState {
    service: GameService,
    hub: Arc<RoomHub>,
    repo: MatchRepository,
    allowed_origin: Option<String>,
}

impl AppState {
    /// Bundles the transport's collaborators.
    pub fn new(
        service: GameService,
        hub: Arc<RoomHub>,
        repo: MatchRepository,
        allowed_origin: Option<String>,
    ) -> Self {
        Self {
            service,
            hub,
            repo,
            allowed_origin,
        }
    }
}

/// Builds the router with request logging.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/ws", get(ws_handler))
        .route("/matches", get(recent_matches))
        .layer(ServiceBuilder::new().map_request(|req: Request<Body>| {
            info!(method = %req.method(), uri = %req.uri(), "Incoming HTTP request");
            req
        }))
        .with_state(state)
}

async fn root() -> &'static str {
    "strictly_grams is running"
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

#[instrument(skip(headers))]
fn origin_allowed(allowed: Option<&str>, headers: &HeaderMap) -> bool {
    let Some(allowed) = allowed else {
        return true;
    };
    headers
        .get(header::ORIGIN)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|origin| origin.contains(allowed))
}

#[instrument(skip(headers))]
fn account_from(headers: &HeaderMap) -> Option<AccountRef> {
    headers
        .get(ACCOUNT_HEADER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<i32>().ok())
        .map(AccountRef)
}

#[instrument(skip(ws, headers, state))]
async fn ws_handler(
    ws: WebSocketUpgrade,
    headers: HeaderMap,
    State(state): State<AppState>,
) -> Response {
    if !origin_allowed(state.allowed_origin.as_deref(), &headers) {
        warn!(origin = ?headers.get(header::ORIGIN), "Rejected WebSocket origin");
        return StatusCode::FORBIDDEN.into_response();
    }
    let account = account_from(&headers);
    ws.on_upgrade(move |socket| handle_socket(socket, state, account))
}

#[instrument(skip(socket, state))]
async fn handle_socket(socket: WebSocket, state: AppState, account: Option<AccountRef>) {
    let (conn, mut outbound) = state.hub.register();
    info!(%conn, "Client connected");
    let (mut sender, mut receiver) = socket.split();

    let writer = tokio::spawn(async move {
        while let Some(message) = outbound.recv().await {
            let text = match serde_json::to_string(&message) {
                Ok(text) => text,
                Err(e) => {
                    error!(error = %e, "Failed to encode outbound frame");
                    continue;
                }
            };
            if sender.send(Message::Text(text.into())).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(frame)) = receiver.next().await {
        match frame {
            Message::Text(text) => handle_frame(&state, conn, account, text.as_str()).await,
            Message::Close(_) => break,
            _ => {}
        }
    }

    info!(%conn, "Client disconnected");
    state.service.disconnect(conn).await;
    state.hub.unregister(conn);
    writer.abort();
}

#[instrument(skip(state, text))]
async fn handle_frame(state: &AppState, conn: ConnId, account: Option<AccountRef>, text: &str) {
    let (request_id, reply) = match serde_json::from_str::<ClientMessage>(text) {
        Ok(message) => {
            debug!(%conn, action = message.action.name(), "Received action");
            let reply = state.service.dispatch(conn, account, message.action).await;
            (message.request_id, reply)
        }
        Err(e) => {
            debug!(%conn, error = %e, "Malformed frame");
            let err = GameError::invalid_request(format!("malformed message: {e}"));
            (None, ActionReply::from(err))
        }
    };
    state.hub.send(conn, ServerMessage::Reply { request_id, reply });
}

/// Query for `/matches`.
#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    limit: Option<i64>,
}

/// A finished match with its ranked players.
#[derive(Debug, Serialize)]
pub struct MatchHistory {
    #[serde(flatten)]
    record: MatchRecord,
    players: Vec<MatchPlayerRecord>,
}

#[instrument(skip(state))]
async fn recent_matches(
    State(state): State<AppState>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<MatchHistory>>, StatusCode> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_HISTORY_LIMIT)
        .clamp(1, MAX_HISTORY_LIMIT);
    let repo = state.repo.clone();

    let history = tokio::task::spawn_blocking(move || {
        repo.recent_matches(limit)?
            .into_iter()
            .map(|record| {
                let players = repo.match_players(*record.id())?;
                Ok(MatchHistory { record, players })
            })
            .collect::<Result<Vec<_>, crate::db::DbError>>()
    })
    .await
    .map_err(|e| {
        error!(error = %e, "Match history task failed");
        StatusCode::INTERNAL_SERVER_ERROR
    })?
    .map_err(|e| {
        error!(error = %e, "Failed to load match history");
        StatusCode::INTERNAL_SERVER_ERROR
    })?;

    Ok(Json(history))
}

/// Binds and serves until the process is stopped.
#[instrument(skip(state))]
pub async fn serve(host: &str, port: u16, state: AppState) -> anyhow::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    info!("Server ready at http://{}:{}/", host, port);
    axum::serve(listener, app).await?;
    Ok(())
}
