//! Home Assistant websocket host for the fan card
//!
//! Keeps a local copy of the state table up to date and forwards the card's
//! service calls.

use tokio_tungstenite::tungstenite;

mod hass;
mod messages;
mod snapshot;

pub use self::hass::HomeAssistant;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("protocol error: {0}")]
    Protocol(String),
    #[error("authentication failed: {0}")]
    Authentication(String),
}
