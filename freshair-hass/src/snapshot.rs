use std::sync::Arc;

use freshair_common::{EntityState, StateSnapshot};
use serde_json::Value;

use crate::{
    Error, Result,
    messages::{Packet, PacketId, STATE_CHANGED, ServerMessage, StateChangeEvent},
};

/// Follows the host's state table over one connection. Nothing is published
/// until the `get_states` result has been loaded.
#[derive(Debug)]
pub(crate) struct StateTracker {
    get_states_id: PacketId,
    loaded: bool,
}

impl StateTracker {
    pub(crate) fn new(get_states_id: PacketId) -> Self {
        Self { get_states_id, loaded: false }
    }

    /// Returns whether `states` changed and should be published. A failed
    /// `get_states` is fatal for the connection.
    pub(crate) fn handle(
        &mut self,
        states: &mut Arc<StateSnapshot>,
        packet: Packet<ServerMessage>,
    ) -> Result<bool> {
        match packet.payload {
            ServerMessage::Result { success: false, error, .. } if packet.id == self.get_states_id => {
                Err(Error::Protocol(match error {
                    Some(error) => format!("loading states failed: {error}"),
                    None => "loading states failed".to_owned(),
                }))
            }
            ServerMessage::Result { success: false, error, .. } => {
                match error {
                    Some(error) => tracing::warn!("Request {:?} failed: {error}", packet.id),
                    None => tracing::warn!("Request {:?} failed", packet.id),
                }
                Ok(false)
            }
            ServerMessage::Result { result, .. } if packet.id == self.get_states_id => {
                *states = Arc::new(from_states(result));
                self.loaded = true;
                tracing::info!("Received {} entity states", states.len());
                Ok(true)
            }
            ServerMessage::Result { .. } => Ok(false),
            ServerMessage::Event { event } if event.event_type == STATE_CHANGED => {
                // the get_states result already includes it
                if !self.loaded {
                    tracing::debug!("Ignoring state change before the initial load");
                    return Ok(false);
                }

                match serde_json::from_value::<StateChangeEvent>(event.data) {
                    Ok(change) => {
                        tracing::debug!("State change fired at {:?}", event.time_fired);
                        apply_change(Arc::make_mut(states), change);
                        Ok(true)
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse state change: {e}");
                        Ok(false)
                    }
                }
            }
            ServerMessage::Event { event } => {
                tracing::trace!("Ignoring {} event", event.event_type);
                Ok(false)
            }
        }
    }
}

/// Builds the initial table from a `get_states` result. Entries that don't
/// parse are skipped.
pub(crate) fn from_states(result: Value) -> StateSnapshot {
    let states = match result {
        Value::Array(states) => states,
        other => {
            tracing::warn!("get_states returned a non-array result: {other}");
            return StateSnapshot::new();
        }
    };

    states
        .into_iter()
        .filter_map(|state| match serde_json::from_value::<EntityState>(state) {
            Ok(state) if !state.entity_id.is_empty() => Some(state),
            Ok(state) => {
                tracing::warn!("Skipping state without entity id: {state:?}");
                None
            }
            Err(e) => {
                tracing::warn!("Skipping unparseable state: {e}");
                None
            }
        })
        .collect()
}

pub(crate) fn apply_change(snapshot: &mut StateSnapshot, change: StateChangeEvent) {
    let StateChangeEvent { entity_id, new_state, old_state } = change;

    match new_state {
        Some(mut new_state) => {
            tracing::debug!(
                "'{entity_id}' changed from {} to {}",
                old_state.as_ref().map_or("(none)", |s| s.state.as_str()),
                new_state.state,
            );

            if new_state.entity_id.is_empty() {
                new_state.entity_id = entity_id;
            }
            snapshot.insert(new_state);
        }
        None => {
            tracing::debug!("'{entity_id}' was removed");
            snapshot.remove(&entity_id);
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    const GET_STATES: PacketId = PacketId(2);

    fn packet(message: Value) -> Packet<ServerMessage> {
        serde_json::from_value(message).unwrap()
    }

    fn states_result(id: u32) -> Packet<ServerMessage> {
        packet(json!({
            "id": id,
            "type": "result",
            "success": true,
            "result": [
                { "entity_id": "fan.living_room", "state": "off" },
                { "entity_id": "sensor.pm2_5", "state": "12" },
            ],
        }))
    }

    fn turned_on() -> Packet<ServerMessage> {
        packet(json!({
            "id": 1,
            "type": "event",
            "event": {
                "event_type": "state_changed",
                "data": {
                    "entity_id": "fan.living_room",
                    "new_state": { "entity_id": "fan.living_room", "state": "on" },
                },
            },
        }))
    }

    #[test]
    fn changes_wait_for_the_initial_load() {
        let mut tracker = StateTracker::new(GET_STATES);
        let mut states = Arc::new(StateSnapshot::new());

        assert!(!tracker.handle(&mut states, turned_on()).unwrap());
        assert!(states.is_empty());

        assert!(tracker.handle(&mut states, states_result(2)).unwrap());
        assert_eq!(states.len(), 2);
        assert!(!states.get("fan.living_room").unwrap().is_on());

        assert!(tracker.handle(&mut states, turned_on()).unwrap());
        assert!(states.get("fan.living_room").unwrap().is_on());
    }

    #[test]
    fn published_tables_are_not_mutated() {
        let mut tracker = StateTracker::new(GET_STATES);
        let mut states = Arc::new(StateSnapshot::new());
        tracker.handle(&mut states, states_result(2)).unwrap();

        let shown = Arc::clone(&states);
        tracker.handle(&mut states, turned_on()).unwrap();

        assert!(!shown.get("fan.living_room").unwrap().is_on());
        assert!(states.get("fan.living_room").unwrap().is_on());
    }

    #[test]
    fn failed_initial_load_is_an_error() {
        let mut tracker = StateTracker::new(GET_STATES);
        let mut states = Arc::new(StateSnapshot::new());

        let err = tracker
            .handle(&mut states, packet(json!({
                "id": 2,
                "type": "result",
                "success": false,
                "error": { "code": "unknown_error", "message": "Unknown error" },
            })))
            .unwrap_err();

        assert!(matches!(err, Error::Protocol(msg) if msg.contains("unknown_error")));
    }

    #[test]
    fn other_results_are_ignored() {
        let mut tracker = StateTracker::new(GET_STATES);
        let mut states = Arc::new(StateSnapshot::new());

        assert!(!tracker.handle(&mut states, states_result(5)).unwrap());
        assert!(states.is_empty());

        let failed_call = packet(json!({
            "id": 6,
            "type": "result",
            "success": false,
            "error": { "code": "not_found", "message": "Service not found." },
        }));
        assert!(!tracker.handle(&mut states, failed_call).unwrap());
    }

    #[test]
    fn other_events_are_ignored() {
        let mut tracker = StateTracker::new(GET_STATES);
        let mut states = Arc::new(StateSnapshot::new());
        tracker.handle(&mut states, states_result(2)).unwrap();

        let event = packet(json!({
            "id": 1,
            "type": "event",
            "event": { "event_type": "call_service", "data": { "domain": "fan" } },
        }));
        assert!(!tracker.handle(&mut states, event).unwrap());
        assert_eq!(states.len(), 2);
    }

    #[test]
    fn initial_states() {
        let snapshot = from_states(serde_json::json!([
            {
                "entity_id": "fan.living_room",
                "state": "on",
                "attributes": { "speed": "medium", "mode": "auto" },
                "last_changed": "2024-05-01T10:00:00+00:00",
                "last_updated": "2024-05-01T10:00:00+00:00",
                "context": { "id": "01HX" },
            },
            {
                "entity_id": "sensor.pm2_5",
                "state": "12",
                "attributes": { "unit_of_measurement": "µg/m³" },
            },
            { "state": "on" },
            "garbage",
        ]));

        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get("fan.living_room").unwrap().attributes.speed_level(), 2);
        assert_eq!(snapshot.get("sensor.pm2_5").unwrap().state, "12");
    }

    #[test]
    fn non_array_result() {
        assert!(from_states(serde_json::json!(null)).is_empty());
    }

    #[test]
    fn changes_replace_and_remove() {
        let mut snapshot = from_states(serde_json::json!([
            { "entity_id": "fan.living_room", "state": "off" },
        ]));

        apply_change(&mut snapshot, StateChangeEvent {
            entity_id: "fan.living_room".into(),
            new_state: Some(EntityState::new("", "on").with_attribute("speed", "high")),
            old_state: None,
        });

        let fan = snapshot.get("fan.living_room").unwrap();
        assert!(fan.is_on());
        assert_eq!(fan.entity_id, "fan.living_room");
        assert_eq!(fan.attributes.speed(), Some("high"));

        apply_change(&mut snapshot, StateChangeEvent {
            entity_id: "fan.living_room".into(),
            new_state: None,
            old_state: None,
        });
        assert!(snapshot.is_empty());
    }
}
