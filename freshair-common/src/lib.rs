pub mod fan;
pub mod service;
pub mod state;

mod string;
pub use fan::{FanMode, FanSpeed};
pub use service::{ServiceCall, ServiceCaller};
pub use state::{EntityState, StateAttributes, StateSnapshot};
pub use string::*;
