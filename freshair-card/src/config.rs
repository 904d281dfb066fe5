use freshair_common::{EntityId, service::DEFAULT_MODE_DOMAIN};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{ConfigurationError, Result};

/// Card configuration as placed on the dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CardConfig {
    pub entity: EntityId,
    /// Domain of the `set_mode` service
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode_domain: Option<String>,
    /// Kept as given, unused
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl CardConfig {
    /// Builds an owned copy; nothing borrowed from `value` survives
    pub fn from_value(value: &Value) -> Result<Self> {
        let Some(fields) = value.as_object() else {
            return Err(ConfigurationError::NotAnObject);
        };

        match fields.get("entity") {
            Some(Value::String(entity)) if !entity.is_empty() => {}
            _ => return Err(ConfigurationError::MissingEntity),
        }

        Ok(CardConfig::deserialize(value)?)
    }

    pub fn for_entity(entity: impl Into<EntityId>) -> Self {
        Self { entity: entity.into(), mode_domain: None, extra: Map::new() }
    }

    pub fn mode_domain(&self) -> &str {
        self.mode_domain.as_deref().unwrap_or(DEFAULT_MODE_DOMAIN)
    }
}
