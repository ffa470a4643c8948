use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::State;
use axum::response::IntoResponse;
use futures::future;
use futures::stream;
use futures::SinkExt;
use futures::StreamExt;
use tokio::sync::mpsc;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::{BroadcastStream, ReceiverStream};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::models::event::RealtimeEvent;
use crate::state::AppState;

const REPLY_BUFFER: usize = 32;

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let sid = Uuid::new_v4().to_string();
    let (mut sender, mut receiver) = socket.split();
    let (reply_tx, reply_rx) = mpsc::channel::<RealtimeEvent>(REPLY_BUFFER);

    state.metrics.relay_connections.inc();
    info!(sid = %sid, "realtime client connected");

    let broadcasts = BroadcastStream::new(state.location_events_tx.subscribe()).filter_map(
        |item| {
            future::ready(match item {
                Ok(sample) => Some(RealtimeEvent::AgentLocationUpdate(sample)),
                Err(BroadcastStreamRecvError::Lagged(skipped)) => {
                    warn!(skipped, "realtime client lagged behind broadcasts");
                    None
                }
            })
        },
    );

    let greeting = RealtimeEvent::ConnectionResponse {
        status: "connected".to_string(),
        sid: sid.clone(),
    };
    let mut outbound = stream::once(future::ready(greeting))
        .chain(stream::select(ReceiverStream::new(reply_rx), broadcasts))
        .boxed();

    let mut send_task = tokio::spawn(async move {
        while let Some(event) = outbound.next().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(err) => {
                    warn!(error = %err, "failed to serialize realtime event");
                    continue;
                }
            };

            if sender.send(Message::Text(json)).await.is_err() {
                break;
            }
        }
    });

    let recv_state = state.clone();
    let recv_sid = sid.clone();
    let mut recv_task = tokio::spawn(async move {
        while let Some(Ok(msg)) = receiver.next().await {
            match msg {
                Message::Text(text) => {
                    if let Some(reply) = handle_frame(&recv_state, &recv_sid, &text) {
                        if reply_tx.send(reply).await.is_err() {
                            break;
                        }
                    }
                }
                Message::Close(_) => break,
                _ => {}
            }
        }
    });

    tokio::select! {
        _ = &mut send_task => recv_task.abort(),
        _ = &mut recv_task => send_task.abort(),
    }

    state.metrics.relay_connections.dec();
    info!(sid = %sid, "realtime client disconnected");
}

/// Applies one inbound text frame. Returns an event to send back to the
/// originating client, if any.
pub fn handle_frame(state: &AppState, sid: &str, text: &str) -> Option<RealtimeEvent> {
    let event = match serde_json::from_str::<RealtimeEvent>(text) {
        Ok(event) => event,
        Err(err) => {
            warn!(sid = %sid, error = %err, "malformed realtime frame");
            state
                .metrics
                .location_updates_total
                .with_label_values(&["invalid"])
                .inc();
            return Some(RealtimeEvent::Error {
                message: format!("malformed frame: {err}"),
            });
        }
    };

    match event {
        RealtimeEvent::LocationUpdate(sample) => {
            if let Err(reason) = sample.validate() {
                warn!(sid = %sid, reason = %reason, "location update rejected");
                state
                    .metrics
                    .location_updates_total
                    .with_label_values(&["invalid"])
                    .inc();
                return Some(RealtimeEvent::Error { message: reason });
            }

            debug!(
                sid = %sid,
                agent_id = %sample.agent_id,
                order_id = %sample.order_id,
                lat = sample.lat,
                lng = sample.lng,
                "location update"
            );
            if let Err(err) = state.record_location(&sample) {
                warn!(sid = %sid, error = %err, "location update for unknown order");
                state
                    .metrics
                    .location_updates_total
                    .with_label_values(&["invalid"])
                    .inc();
                return Some(RealtimeEvent::Error {
                    message: err.to_string(),
                });
            }
            // No subscribers is fine; history already has the sample.
            let _ = state.location_events_tx.send(sample);
            state
                .metrics
                .location_updates_total
                .with_label_values(&["relayed"])
                .inc();
            None
        }
        other => {
            debug!(sid = %sid, event = other.name(), "ignoring client event");
            None
        }
    }
}
