//! HTTP surface: watcher counts, the scheduled finalize trigger and
//! the WebSocket upgrade endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use types::clock::now_ms;
use types::ids::AuctionId;
use uuid::Uuid;

use crate::error::AppError;
use crate::finalizer::{Finalizer, SweepSummary};
use crate::hub::AuctionHub;
use crate::store::DocumentStore;
use crate::ws;

/// Shared service state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub hub: Arc<AuctionHub>,
    pub finalizer: Arc<Finalizer>,
    pub store: Arc<dyn DocumentStore>,
}

pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/auctions/:id/watchers", get(watcher_count))
        .route("/finalize", post(run_finalize))
        .route("/ws", get(ws::ws_handler));

    Router::new()
        .nest("/v1", api_routes)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Current room size for an auction. Answers 404 for auctions the
/// store has never seen, so callers can tell "empty room" apart from
/// "no such auction".
async fn watcher_count(
    Path(id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<Value>, AppError> {
    let auction_id = AuctionId::from_uuid(id);
    state
        .store
        .auction(&auction_id)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .ok_or_else(|| AppError::NotFound(format!("auction {auction_id}")))?;
    let count = state.hub.watcher_count(&auction_id);
    Ok(Json(json!({
        "auction_id": auction_id,
        "watcher_count": count
    })))
}

/// The scheduled trigger. Always answers with the sweep summary; a
/// failed initial query is reported inside it, not as an HTTP error.
async fn run_finalize(State(state): State<AppState>) -> Json<SweepSummary> {
    Json(state.finalizer.sweep(now_ms()).await)
}
