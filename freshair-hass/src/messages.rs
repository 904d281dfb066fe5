use core::{
    fmt::Display,
    sync::atomic::{AtomicU32, Ordering},
};

use chrono::{DateTime, Utc};
use freshair_common::{EntityId, EntityState};
use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const STATE_CHANGED: &str = "state_changed";

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[expect(clippy::enum_variant_names)]
pub enum AuthServerMessage {
    AuthRequired {
        ha_version: String,
    },
    AuthOk {
        #[expect(dead_code)]
        ha_version: String,
    },
    AuthInvalid {
        message: String,
    },
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthClientMessage {
    Auth { access_token: String },
}

#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct Packet<T> {
    pub(crate) id: PacketId,
    #[serde(flatten)]
    pub(crate) payload: T,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub(crate) struct PacketId(pub u32);

/// Message ids must be unique and increasing within a connection, and 0 is
/// not accepted
#[derive(Debug)]
pub(crate) struct PacketIds(AtomicU32);

impl PacketIds {
    pub(crate) fn new() -> Self {
        Self(AtomicU32::new(1))
    }

    pub(crate) fn next(&self) -> PacketId {
        PacketId(match self.0.fetch_add(1, Ordering::Relaxed) {
            0 => self.0.fetch_add(1, Ordering::Relaxed), // skip 0
            n => n,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    Result {
        success: bool,
        #[serde(default)]
        result: Value,
        #[serde(default)]
        error: Option<ServerError>,
    },
    Event {
        event: Event,
    },
}

#[derive(Debug, Deserialize)]
pub struct ServerError {
    pub code: String,
    pub message: String,
}

impl Display for ServerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

#[derive(Debug, PartialEq, Deserialize)]
pub struct Event {
    pub event_type: String,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub time_fired: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    GetStates,
    SubscribeEvents {
        #[serde(skip_serializing_if = "Option::is_none")]
        event_type: Option<String>,
    },
    CallService {
        domain: String,
        service: String,
        #[serde(skip_serializing_if = "Value::is_null")]
        service_data: Value,
    },
}

/// `new_state` is null when the entity was removed, `old_state` when it was
/// just added
#[derive(Debug, PartialEq, Deserialize)]
pub struct StateChangeEvent {
    pub entity_id: EntityId,
    pub new_state: Option<EntityState>,
    #[serde(default)]
    pub old_state: Option<EntityState>,
}
