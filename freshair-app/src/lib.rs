mod app;
mod theme;
pub mod widget;

pub use app::{FanCardApp, HostSettings};
