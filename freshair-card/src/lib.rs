//! Dashboard card for a three-speed ventilation fan
//!
//! The card is bound to one fan entity. The host pushes state snapshots with
//! [`FanControlCard::set_hass`], the UI draws [`FanControlCard::render`], and
//! clicked [`Action`]s come back through [`FanControlCard::handle`], which
//! issues at most one service call per click.

pub mod card;
pub mod config;
pub mod view;

pub use freshair_common as common;

pub use self::{
    card::{Action, CARD_SIZE, FanControlCard},
    config::CardConfig,
    view::{CardView, Control, ControlStyle, FanView, SpeedBar},
};

pub type Result<T, E = ConfigurationError> = std::result::Result<T, E>;

#[derive(thiserror::Error, Debug)]
pub enum ConfigurationError {
    #[error("you should define an entity")]
    MissingEntity,
    #[error("card configuration must be an object")]
    NotAnObject,
    #[error("invalid card configuration: {0}")]
    Invalid(#[from] serde_json::Error),
}
