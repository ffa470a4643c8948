use serde::{Deserialize, Serialize};

use crate::models::location::LocationSample;

pub const LOCATION_UPDATE: &str = "location_update";
pub const AGENT_LOCATION_UPDATE: &str = "agent_location_update";

/// Frame envelope on the realtime channel: `{"event": "...", "data": {...}}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "event", content = "data", rename_all = "snake_case")]
pub enum RealtimeEvent {
    LocationUpdate(LocationSample),
    AgentLocationUpdate(LocationSample),
    ConnectionResponse { status: String, sid: String },
    Error { message: String },
}

impl RealtimeEvent {
    pub fn name(&self) -> &'static str {
        match self {
            RealtimeEvent::LocationUpdate(_) => LOCATION_UPDATE,
            RealtimeEvent::AgentLocationUpdate(_) => AGENT_LOCATION_UPDATE,
            RealtimeEvent::ConnectionResponse { .. } => "connection_response",
            RealtimeEvent::Error { .. } => "error",
        }
    }
}
