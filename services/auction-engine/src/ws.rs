//! WebSocket bridge between watcher connections and the hub
//!
//! Each connection gets a fresh subscriber id and an unbounded event
//! channel; a writer task forwards hub events to the socket while the
//! read loop translates client messages into hub calls. On disconnect
//! the connection leaves every room it joined.
//!
//! Watcher identity comes from the `user_id` query parameter; session
//! authentication is handled upstream of this service.

use std::collections::HashSet;

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tracing::debug;
use types::clock::now_ms;
use types::ids::{AuctionId, SubscriberId, UserId};

use crate::events::{ClientMessage, WatcherEvent};
use crate::router::AppState;

#[derive(Debug, Deserialize)]
pub struct WsParams {
    user_id: UserId,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<AppState>,
    Query(params): Query<WsParams>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, state, params.user_id))
}

async fn handle_socket(socket: WebSocket, state: AppState, user_id: UserId) {
    let subscriber = SubscriberId::new();
    let (tx, mut rx) = mpsc::unbounded_channel::<WatcherEvent>();
    let (mut sink, mut stream) = socket.split();

    let writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            let Ok(text) = serde_json::to_string(&event) else {
                continue;
            };
            if sink.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let mut joined: HashSet<AuctionId> = HashSet::new();
    while let Some(Ok(msg)) = stream.next().await {
        match msg {
            Message::Text(text) => match serde_json::from_str::<ClientMessage>(&text) {
                Ok(ClientMessage::JoinAuction { auction_id }) => {
                    state
                        .hub
                        .join(auction_id, subscriber, user_id, tx.clone())
                        .await;
                    joined.insert(auction_id);
                }
                Ok(ClientMessage::LeaveAuction { auction_id }) => {
                    state.hub.leave(&auction_id, &subscriber);
                    joined.remove(&auction_id);
                }
                Ok(ClientMessage::SyncCountdown { auction_id }) => {
                    state.hub.sync_countdown(auction_id, now_ms()).await;
                }
                Err(e) => {
                    debug!(subscriber = %subscriber, error = %e, "unparseable client message");
                }
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    for auction_id in joined {
        state.hub.leave(&auction_id, &subscriber);
    }
    writer.abort();
    debug!(subscriber = %subscriber, "watcher connection closed");
}
