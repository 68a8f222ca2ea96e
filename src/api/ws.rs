use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::IntoResponse,
};
use chrono::Utc;
use futures::{SinkExt, StreamExt};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::sync::{DegradedNotice, Legend, MapSurfaceStore, MapUpdateSender, Marker, NoticeStore};

#[derive(Clone)]
pub struct WsState {
    pub surface: MapSurfaceStore,
    pub notice: NoticeStore,
    pub map_updates_tx: MapUpdateSender,
}

/// Server message sent to clients
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
#[serde(rename_all = "snake_case")]
enum ServerMessage {
    /// Initial connection acknowledgment
    Connected { message: String },
    /// Full marker/legend/notice snapshot; sent on connect and after
    /// every rendered cycle. Clients replace their state wholesale.
    Snapshot {
        timestamp: String,
        markers: Vec<Marker>,
        legend: Option<Legend>,
        notice: DegradedNotice,
    },
}

async fn build_snapshot(state: &WsState) -> ServerMessage {
    let surface = state.surface.read().await;
    let notice = state.notice.read().await;
    ServerMessage::Snapshot {
        timestamp: Utc::now().to_rfc3339(),
        markers: surface.markers().to_vec(),
        legend: surface.legend().cloned(),
        notice: notice.clone(),
    }
}

/// WebSocket endpoint for map snapshots
pub async fn ws_markers(ws: WebSocketUpgrade, State(state): State<WsState>) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: WsState) {
    let (mut sender, mut receiver) = socket.split();
    let mut update_rx = state.map_updates_tx.subscribe();

    let connected_msg = ServerMessage::Connected {
        message: "Connected to map updates.".to_string(),
    };
    if let Ok(json) = serde_json::to_string(&connected_msg) {
        let _ = sender.send(Message::Text(json.into())).await;
    }

    // Send the current state immediately so late joiners are not blank
    // until the next cycle completes.
    let snapshot = build_snapshot(&state).await;
    if let Ok(json) = serde_json::to_string(&snapshot) {
        if sender.send(Message::Text(json.into())).await.is_err() {
            return;
        }
    }

    // Spawn task to forward broadcast updates to the WebSocket
    let forward_state = state.clone();
    let forward_task = tokio::spawn(async move {
        loop {
            match update_rx.recv().await {
                Ok(_update) => {
                    let snapshot = build_snapshot(&forward_state).await;
                    if let Ok(json) = serde_json::to_string(&snapshot) {
                        if sender.send(Message::Text(json.into())).await.is_err() {
                            break;
                        }
                    }
                }
                Err(broadcast::error::RecvError::Closed) => break,
                // A lagged client just gets the next full snapshot.
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
            }
        }
    });

    // Drain incoming messages until the client goes away
    while let Some(msg) = receiver.next().await {
        match msg {
            Ok(Message::Ping(_)) => {
                // Axum handles pong automatically
            }
            Ok(Message::Close(_)) => break,
            Err(_) => break,
            _ => {}
        }
    }

    // Cleanup
    forward_task.abort();
}
