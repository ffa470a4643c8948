use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use crate::error::ClientError;
use crate::models::event::RealtimeEvent;

const OUTBOUND_BUFFER: usize = 64;
const CLOSE_GRACE: Duration = Duration::from_secs(1);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Bidirectional event channel. Calls return explicit results; callers
/// that treat the relay as best-effort choose to ignore them.
#[async_trait]
pub trait RealtimeTransport: Send + Sync {
    async fn connect(&self) -> Result<(), ClientError>;

    async fn emit(&self, event: RealtimeEvent) -> Result<(), ClientError>;

    /// Closes the channel. Safe to call when never connected or twice.
    async fn disconnect(&self);
}

struct Connection {
    outbound: mpsc::Sender<Message>,
    writer: JoinHandle<()>,
    reader: JoinHandle<()>,
}

pub struct WsTransport {
    url: String,
    connect_timeout: Duration,
    connection: Mutex<Option<Connection>>,
}

impl WsTransport {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            connect_timeout: CONNECT_TIMEOUT,
            connection: Mutex::new(None),
        }
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub async fn is_connected(&self) -> bool {
        self.connection
            .lock()
            .await
            .as_ref()
            .is_some_and(|conn| !conn.writer.is_finished())
    }
}

#[async_trait]
impl RealtimeTransport for WsTransport {
    async fn connect(&self) -> Result<(), ClientError> {
        if self.is_connected().await {
            return Ok(());
        }

        // The lock is not held over the handshake so emit fails fast meanwhile.
        let (socket, _response) =
            tokio::time::timeout(self.connect_timeout, connect_async(self.url.as_str()))
                .await
                .map_err(|_| {
                    ClientError::Transport(format!(
                        "connect to {} timed out after {:?}",
                        self.url, self.connect_timeout
                    ))
                })?
                .map_err(|err| {
                    ClientError::Transport(format!("connect to {} failed: {err}", self.url))
                })?;
        let (mut sink, mut stream) = socket.split();
        let (outbound, mut outbound_rx) = mpsc::channel::<Message>(OUTBOUND_BUFFER);

        let writer = tokio::spawn(async move {
            while let Some(message) = outbound_rx.recv().await {
                let closing = matches!(message, Message::Close(_));
                if let Err(err) = sink.send(message).await {
                    warn!(error = %err, "realtime send failed");
                    break;
                }
                if closing {
                    break;
                }
            }
            let _ = sink.close().await;
        });

        let reader = tokio::spawn(async move {
            while let Some(frame) = stream.next().await {
                match frame {
                    Ok(Message::Text(text)) => log_inbound(&text),
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(err) => {
                        warn!(error = %err, "realtime receive failed");
                        break;
                    }
                }
            }
            info!("realtime channel closed by server");
        });

        let mut guard = self.connection.lock().await;
        if let Some(stale) = guard.replace(Connection {
            outbound,
            writer,
            reader,
        }) {
            stale.reader.abort();
            stale.writer.abort();
        }
        info!(url = %self.url, "realtime channel connected");
        Ok(())
    }

    async fn emit(&self, event: RealtimeEvent) -> Result<(), ClientError> {
        let guard = self.connection.lock().await;
        let conn = guard
            .as_ref()
            .ok_or_else(|| ClientError::Transport("not connected".to_string()))?;

        let json = serde_json::to_string(&event)
            .map_err(|err| ClientError::Transport(format!("serialize {}: {err}", event.name())))?;

        conn.outbound
            .try_send(Message::Text(json))
            .map_err(|err| ClientError::Transport(format!("{} not sent: {err}", event.name())))
    }

    async fn disconnect(&self) {
        let Some(conn) = self.connection.lock().await.take() else {
            return;
        };

        let _ = conn.outbound.try_send(Message::Close(None));
        drop(conn.outbound);
        conn.reader.abort();
        if tokio::time::timeout(CLOSE_GRACE, conn.writer).await.is_err() {
            warn!("realtime close did not finish in time");
        }
        info!("realtime channel disconnected");
    }
}

fn log_inbound(text: &str) {
    match serde_json::from_str::<RealtimeEvent>(text) {
        Ok(RealtimeEvent::ConnectionResponse { status, sid }) => {
            info!(status = %status, sid = %sid, "realtime connection acknowledged");
        }
        Ok(RealtimeEvent::AgentLocationUpdate(sample)) => {
            debug!(agent_id = %sample.agent_id, order_id = %sample.order_id, "agent location broadcast");
        }
        Ok(RealtimeEvent::Error { message }) => {
            warn!(message = %message, "realtime error from server");
        }
        Ok(other) => debug!(event = other.name(), "realtime event"),
        Err(err) => warn!(error = %err, "unrecognized realtime frame"),
    }
}
