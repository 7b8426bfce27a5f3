//! WebSocket push of generation events.

use std::sync::atomic::{AtomicI64, Ordering};
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Query, State};
use axum::response::IntoResponse;
use futures_util::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{debug, info};

use vidforge_models::WsMessage;

use crate::metrics;
use crate::state::AppState;

/// Global counter for active WebSocket connections.
static ACTIVE_WS_CONNECTIONS: AtomicI64 = AtomicI64::new(0);

/// Configuration for WebSocket backpressure.
const WS_SEND_BUFFER_SIZE: usize = 32;
const WS_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
pub struct WsEventsQuery {
    pub user_id: String,
}

/// Send a WebSocket message with backpressure handling.
async fn send_ws_message(tx: &mpsc::Sender<Message>, msg: &WsMessage) -> bool {
    let json = match serde_json::to_string(msg) {
        Ok(j) => j,
        Err(_) => return false,
    };
    // try_send first, block only when the buffer is full
    match tx.try_send(Message::Text(json.clone())) {
        Ok(_) => true,
        Err(mpsc::error::TrySendError::Full(_)) => {
            debug!("WebSocket send buffer full, applying backpressure");
            tx.send(Message::Text(json)).await.is_ok()
        }
        Err(mpsc::error::TrySendError::Closed(_)) => false,
    }
}

/// `GET /ws/events?user_id=...`
///
/// One subscription covers every in-flight job the user owns. Events
/// are best-effort: a client that connects late reconciles via the
/// job-status and notification endpoints.
pub async fn ws_events(
    ws: WebSocketUpgrade,
    Query(query): Query<WsEventsQuery>,
    State(state): State<AppState>,
) -> impl IntoResponse {
    let count = ACTIVE_WS_CONNECTIONS.fetch_add(1, Ordering::SeqCst) + 1;
    metrics::set_ws_active_connections(count);
    metrics::record_ws_connection();

    ws.on_upgrade(move |socket| async move {
        handle_events_socket(socket, state, query.user_id).await;
        let count = ACTIVE_WS_CONNECTIONS.fetch_sub(1, Ordering::SeqCst) - 1;
        metrics::set_ws_active_connections(count);
    })
}

/// Forward the user's event stream until either side disconnects.
async fn handle_events_socket(socket: WebSocket, state: AppState, user_id: String) {
    let (ws_sender, mut receiver) = socket.split();

    // Bounded channel for backpressure
    let (tx, mut rx) = mpsc::channel::<Message>(WS_SEND_BUFFER_SIZE);

    let send_task = tokio::spawn(async move {
        let mut ws_sender = ws_sender;
        while let Some(msg) = rx.recv().await {
            if ws_sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    let mut events = match state.events.subscribe(&user_id).await {
        Ok(stream) => stream,
        Err(e) => {
            let error = format!("{{\"type\":\"error\",\"message\":\"{}\"}}", e);
            let _ = tx.send(Message::Text(error)).await;
            drop(tx);
            let _ = send_task.await;
            return;
        }
    };

    info!(user = %user_id, "WebSocket event subscription started");

    let mut heartbeat = interval(WS_HEARTBEAT_INTERVAL);
    heartbeat.tick().await; // first tick is immediate

    loop {
        tokio::select! {
            event = events.next() => {
                match event {
                    Some(event) => {
                        let message_type = match &event.message {
                            WsMessage::GenerationStarted { .. } => "started",
                            WsMessage::GenerationProgress { .. } => "progress",
                            WsMessage::GenerationCompleted { .. } => "completed",
                            WsMessage::GenerationFailed { .. } => "failed",
                        };
                        if !send_ws_message(&tx, &event.message).await {
                            break;
                        }
                        metrics::record_ws_message_sent(message_type);
                    }
                    None => break,
                }
            }
            _ = heartbeat.tick() => {
                if tx.send(Message::Ping(Vec::new())).await.is_err() {
                    break;
                }
            }
            incoming = receiver.next() => {
                match incoming {
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(_)) => break,
                    // Pongs and stray client messages are ignored
                    Some(Ok(_)) => {}
                }
            }
        }
    }

    drop(tx);
    let _ = send_task.await;
    info!(user = %user_id, "WebSocket event subscription closed");
}
