use std::collections::{BTreeMap, btree_map};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{EntityId, FanMode, FanSpeed};

pub const STATE_ON: &str = "on";
pub const STATE_OFF: &str = "off";

/// One entry of the host's state table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityState {
    /// Filled in from the table key when missing
    #[serde(default)]
    pub entity_id: EntityId,
    pub state: String,
    #[serde(default)]
    pub attributes: StateAttributes,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_changed: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

impl EntityState {
    pub fn new(entity_id: impl Into<EntityId>, state: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            state: state.into(),
            attributes: StateAttributes::default(),
            last_changed: None,
            last_updated: None,
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.0.insert(key.into(), value.into());
        self
    }

    /// Anything other than `"on"` (including `"unavailable"`) counts as off
    pub fn is_on(&self) -> bool {
        self.state == STATE_ON
    }
}

/// Free-form attribute bag. Values of unexpected types read as absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StateAttributes(pub Map<String, Value>);

impl StateAttributes {
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.0.get(key).and_then(Value::as_str)
    }

    pub fn icon(&self) -> Option<&str> {
        self.get_str("icon")
    }

    pub fn friendly_name(&self) -> Option<&str> {
        self.get_str("friendly_name")
    }

    /// `mode`, falling back to the standard `preset_mode` attribute
    pub fn mode(&self) -> Option<&str> {
        self.get_str("mode").or_else(|| self.get_str("preset_mode"))
    }

    pub fn fan_mode(&self) -> Option<FanMode> {
        self.mode()?.parse().ok()
    }

    /// Raw `speed` attribute, or one derived from `percentage` when the
    /// integration only reports that
    pub fn speed(&self) -> Option<&str> {
        match self.get_str("speed") {
            Some(speed) => Some(speed),
            None => self
                .0
                .get("percentage")
                .and_then(Value::as_f64)
                .map(|pct| FanSpeed::from_percentage(pct).as_str()),
        }
    }

    pub fn speed_level(&self) -> u8 {
        FanSpeed::level_of(self.speed())
    }
}

/// Full state table as of the most recent host push
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(from = "BTreeMap<EntityId, EntityState>")]
pub struct StateSnapshot {
    states: BTreeMap<EntityId, EntityState>,
}

impl StateSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, entity_id: &str) -> Option<&EntityState> {
        self.states.get(entity_id)
    }

    pub fn contains(&self, entity_id: &str) -> bool {
        self.states.contains_key(entity_id)
    }

    /// Replaces any previous record for the same entity
    pub fn insert(&mut self, state: EntityState) -> Option<EntityState> {
        self.states.insert(state.entity_id.clone(), state)
    }

    pub fn remove(&mut self, entity_id: &str) -> Option<EntityState> {
        self.states.remove(entity_id)
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn iter(&self) -> btree_map::Values<'_, EntityId, EntityState> {
        self.states.values()
    }
}

impl From<BTreeMap<EntityId, EntityState>> for StateSnapshot {
    fn from(mut states: BTreeMap<EntityId, EntityState>) -> Self {
        for (id, state) in states.iter_mut() {
            if state.entity_id.is_empty() {
                state.entity_id = id.clone();
            }
        }

        Self { states }
    }
}

impl FromIterator<EntityState> for StateSnapshot {
    fn from_iter<T: IntoIterator<Item = EntityState>>(iter: T) -> Self {
        Self {
            states: iter
                .into_iter()
                .map(|state| (state.entity_id.clone(), state))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_fills_missing_entity_ids() {
        let snapshot: StateSnapshot = serde_json::from_value(serde_json::json!({
            "fan.living_room": {
                "state": "on",
                "attributes": { "speed": "low", "mode": "auto" },
            },
        }))
        .unwrap();

        let fan = snapshot.get("fan.living_room").unwrap();
        assert_eq!(fan.entity_id, "fan.living_room");
        assert!(fan.is_on());
        assert_eq!(fan.attributes.speed(), Some("low"));
        assert_eq!(fan.attributes.fan_mode(), Some(FanMode::Auto));
    }

    #[test]
    fn parse_host_state() {
        let state: EntityState = serde_json::from_value(serde_json::json!({
            "entity_id": "fan.zhijing_freshair",
            "state": "off",
            "attributes": {
                "icon": "mdi:fan-off",
                "friendly_name": "Air Handling Unit",
                "preset_mode": "timing",
                "percentage": 66,
                "percentage_step": 33,
                "preset_modes": ["auto", "manually", "timing"],
            },
            "last_changed": "2024-05-01T10:00:00+00:00",
            "last_updated": "2024-05-01T10:00:00+00:00",
            "context": { "id": "01HX", "parent_id": null, "user_id": null },
        }))
        .unwrap();

        assert!(!state.is_on());
        assert_eq!(state.attributes.icon(), Some("mdi:fan-off"));
        assert_eq!(state.attributes.friendly_name(), Some("Air Handling Unit"));
        assert_eq!(state.attributes.mode(), Some("timing"));
        assert_eq!(state.attributes.speed(), Some("medium"));
        assert_eq!(state.attributes.speed_level(), 2);
        assert!(state.last_updated.is_some());
    }

    #[test]
    fn speed_attribute_wins_over_percentage() {
        let state = EntityState::new("fan.a", STATE_ON)
            .with_attribute("speed", "high")
            .with_attribute("percentage", 33);

        assert_eq!(state.attributes.speed(), Some("high"));
    }

    #[test]
    fn attributes_of_unexpected_type_read_as_absent() {
        let state = EntityState::new("fan.a", STATE_ON)
            .with_attribute("speed", 3)
            .with_attribute("mode", serde_json::json!(["auto"]));

        assert_eq!(state.attributes.speed(), None);
        assert_eq!(state.attributes.speed_level(), 0);
        assert_eq!(state.attributes.fan_mode(), None);
    }

    #[test]
    fn unavailable_is_not_on() {
        assert!(!EntityState::new("fan.a", "unavailable").is_on());
        assert!(!EntityState::new("fan.a", STATE_OFF).is_on());
    }

    #[test]
    fn insert_replaces() {
        let mut snapshot = StateSnapshot::new();
        assert!(snapshot.insert(EntityState::new("fan.a", STATE_OFF)).is_none());
        assert!(snapshot.insert(EntityState::new("fan.a", STATE_ON)).is_some());
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.get("fan.a").unwrap().is_on());

        assert!(snapshot.remove("fan.a").is_some());
        assert!(snapshot.is_empty());
    }
}
