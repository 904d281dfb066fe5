use core::fmt::Display;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{EntityId, FanMode, FanSpeed};

pub const FAN_DOMAIN: &str = "fan";

/// Domain of the integration providing the `set_mode` service
pub const DEFAULT_MODE_DOMAIN: &str = "zhijing_freshair";

/// A `call_service` request, with the entity id inside `service_data`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceCall {
    pub domain: String,
    pub service: String,
    pub service_data: Value,
}

impl ServiceCall {
    pub fn new(domain: impl Into<String>, service: impl Into<String>, service_data: Value) -> Self {
        Self { domain: domain.into(), service: service.into(), service_data }
    }

    pub fn turn_off(entity_id: &EntityId) -> Self {
        Self::new(FAN_DOMAIN, "turn_off", serde_json::json!({ "entity_id": entity_id }))
    }

    /// The empty speed lets the device resume at whatever speed it had
    pub fn turn_on(entity_id: &EntityId) -> Self {
        Self::new(FAN_DOMAIN, "turn_on", serde_json::json!({ "entity_id": entity_id, "speed": "" }))
    }

    pub fn set_speed(entity_id: &EntityId, speed: FanSpeed) -> Self {
        Self::new(FAN_DOMAIN, "set_speed", serde_json::json!({
            "entity_id": entity_id,
            "speed": speed,
        }))
    }

    pub fn set_mode(domain: &str, entity_id: &EntityId, mode: FanMode) -> Self {
        Self::new(domain, "set_mode", serde_json::json!({ "entity_id": entity_id, "mode": mode }))
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.service_data.get("entity_id").and_then(Value::as_str)
    }
}

impl Display for ServiceCall {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{} {}", self.domain, self.service, self.service_data)
    }
}

/// Outbound half of the host. Calls are fire-and-forget; the next state
/// snapshot is the only feedback.
pub trait ServiceCaller {
    fn call_service(&self, call: ServiceCall);
}

impl<T: ServiceCaller + ?Sized> ServiceCaller for &T {
    fn call_service(&self, call: ServiceCall) {
        (**self).call_service(call)
    }
}
