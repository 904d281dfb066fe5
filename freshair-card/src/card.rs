use std::sync::Arc;

use freshair_common::{EntityState, FanMode, FanSpeed, ServiceCall, ServiceCaller, StateSnapshot};
use serde_json::Value;

use crate::{CardConfig, Result, view::CardView};

/// Layout weight reported to the dashboard
pub const CARD_SIZE: u32 = 1;

/// Something the user clicked
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Toggle,
    SetMode(FanMode),
    SpeedDown,
    SpeedUp,
}

/// Dashboard card bound to a single fan entity
///
/// Holds its own copy of the configuration and the last snapshot pushed by
/// the host. Click handlers always read that latest snapshot; two clicks
/// before the next push both act on the same state.
#[derive(Debug, Clone)]
pub struct FanControlCard {
    config: CardConfig,
    hass: Arc<StateSnapshot>,
}

impl FanControlCard {
    pub fn new(config: &Value) -> Result<Self> {
        Ok(Self::with_config(CardConfig::from_value(config)?))
    }

    pub fn with_config(config: CardConfig) -> Self {
        Self { config, hass: Arc::default() }
    }

    /// Replaces the whole configuration. On error the previous one is kept.
    pub fn set_config(&mut self, config: &Value) -> Result<()> {
        self.config = CardConfig::from_value(config)?;
        Ok(())
    }

    pub fn config(&self) -> &CardConfig {
        &self.config
    }

    pub fn set_hass(&mut self, hass: Arc<StateSnapshot>) {
        self.hass = hass;
    }

    pub fn hass(&self) -> &StateSnapshot {
        &self.hass
    }

    pub fn card_size(&self) -> u32 {
        CARD_SIZE
    }

    pub fn render(&self) -> CardView {
        crate::view::render(&self.config, &self.hass)
    }

    fn fan(&self) -> Option<&EntityState> {
        let fan = self.hass.get(&self.config.entity);
        if fan.is_none() {
            tracing::debug!(entity = %self.config.entity, "entity not in snapshot, ignoring action");
        }
        fan
    }

    fn issue(&self, caller: &impl ServiceCaller, call: Option<ServiceCall>) {
        if let Some(call) = call {
            tracing::info!("{} <- {call}", self.config.entity);
            caller.call_service(call);
        }
    }

    pub fn handle(&self, action: Action, caller: &impl ServiceCaller) {
        match action {
            Action::Toggle => self.toggle(caller),
            Action::SetMode(mode) => self.set_mode(mode, caller),
            Action::SpeedDown => self.speed_down(caller),
            Action::SpeedUp => self.speed_up(caller),
        }
    }

    pub fn toggle(&self, caller: &impl ServiceCaller) {
        self.issue(caller, self.fan().map(toggle));
    }

    pub fn set_mode(&self, mode: FanMode, caller: &impl ServiceCaller) {
        self.issue(caller, self.fan().and_then(|fan| set_mode(&self.config, fan, mode)));
    }

    pub fn speed_down(&self, caller: &impl ServiceCaller) {
        self.issue(caller, self.fan().and_then(speed_down));
    }

    pub fn speed_up(&self, caller: &impl ServiceCaller) {
        self.issue(caller, self.fan().and_then(speed_up));
    }

    pub fn set_speed(&self, level: u8, caller: &impl ServiceCaller) {
        self.issue(caller, self.fan().and_then(|fan| set_speed(fan, level)));
    }
}

pub fn toggle(fan: &EntityState) -> ServiceCall {
    if fan.is_on() {
        ServiceCall::turn_off(&fan.entity_id)
    } else {
        ServiceCall::turn_on(&fan.entity_id)
    }
}

pub fn set_mode(config: &CardConfig, fan: &EntityState, mode: FanMode) -> Option<ServiceCall> {
    if !fan.is_on() {
        tracing::debug!(entity = %fan.entity_id, %mode, "fan is off, not changing mode");
        return None;
    }

    Some(ServiceCall::set_mode(config.mode_domain(), &fan.entity_id, mode))
}

pub fn speed_down(fan: &EntityState) -> Option<ServiceCall> {
    match fan.attributes.speed_level() {
        0 => None,
        level => set_speed(fan, level - 1),
    }
}

pub fn speed_up(fan: &EntityState) -> Option<ServiceCall> {
    match fan.attributes.speed_level() {
        level if level >= FanSpeed::MAX_LEVEL => None,
        level => set_speed(fan, level + 1),
    }
}

pub fn set_speed(fan: &EntityState, level: u8) -> Option<ServiceCall> {
    if !fan.is_on() {
        tracing::debug!(entity = %fan.entity_id, level, "fan is off, not changing speed");
        return None;
    }

    Some(ServiceCall::set_speed(&fan.entity_id, FanSpeed::from_level(level)))
}
