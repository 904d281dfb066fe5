//! View tree of the card
//!
//! [`render`] is a pure function of the configuration and the latest state
//! snapshot. Every control carries the [`Action`] it triggers so a UI adapter
//! only has to draw the tree and hand clicked actions back to the card.

use freshair_common::{EntityId, EntityState, FanMode, FanSpeed, StateSnapshot};

use crate::{Action, CardConfig};

pub const ICON_ON: &str = "mdi:fan";
pub const ICON_OFF: &str = "mdi:fan-off";
pub const ICON_POWER: &str = "hass:power";
pub const ICON_SPEED_DOWN: &str = "mdi:minus-circle-outline";
pub const ICON_SPEED_UP: &str = "mdi:plus-circle-outline";

#[derive(Debug, Clone, PartialEq)]
pub enum CardView {
    /// Configured entity is not in the snapshot
    NotFound { entity: EntityId },
    Fan(FanView),
}

impl CardView {
    pub fn placeholder(&self) -> Option<String> {
        match self {
            CardView::NotFound { entity } => Some(format!("Entity {entity} not found.")),
            CardView::Fan(_) => None,
        }
    }

    pub fn as_fan(&self) -> Option<&FanView> {
        match self {
            CardView::Fan(fan) => Some(fan),
            CardView::NotFound { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FanView {
    pub icon: String,
    pub name: String,
    pub speed_bars: [SpeedBar; 3],
    pub power: Control,
    pub modes: [Control; 3],
    pub speed_down: Control,
    pub speed_up: Control,
}

impl FanView {
    pub fn active_bars(&self) -> usize {
        self.speed_bars.iter().filter(|bar| bar.active).count()
    }

    pub fn mode(&self, mode: FanMode) -> &Control {
        let idx = FanMode::ALL
            .iter()
            .position(|m| *m == mode)
            .unwrap_or_default();
        &self.modes[idx]
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SpeedBar {
    pub speed: FanSpeed,
    pub active: bool,
}

impl SpeedBar {
    /// Bar height relative to the bar-graph area
    pub fn height(&self) -> f32 {
        match self.speed {
            FanSpeed::Off => 0.,
            FanSpeed::Low => 0.20,
            FanSpeed::Medium => 0.38,
            FanSpeed::High => 0.56,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlStyle {
    Normal,
    /// Power button of a running fan
    Engaged,
    /// Currently selected mode
    Checked,
    /// Greyed out; still clickable
    Inactive,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Control {
    pub icon: &'static str,
    pub title: &'static str,
    pub style: ControlStyle,
    pub action: Action,
}

pub fn mode_icon(mode: FanMode) -> &'static str {
    match mode {
        FanMode::Auto => "mdi:alpha-a-circle-outline",
        FanMode::Manually => "mdi:alpha-m-circle-outline",
        FanMode::Timing => "mdi:alpha-t-circle-outline",
    }
}

fn mode_title(mode: FanMode) -> &'static str {
    match mode {
        FanMode::Auto => "Auto",
        FanMode::Manually => "Manual",
        FanMode::Timing => "Timer",
    }
}

pub fn render(config: &CardConfig, snapshot: &StateSnapshot) -> CardView {
    match snapshot.get(&config.entity) {
        Some(fan) => CardView::Fan(render_fan(fan)),
        None => CardView::NotFound { entity: config.entity.clone() },
    }
}

fn render_fan(fan: &EntityState) -> FanView {
    let on = fan.is_on();
    let level = fan.attributes.speed_level();
    let speed = fan.attributes.speed();

    let icon = match fan.attributes.icon() {
        Some(icon) => icon.to_owned(),
        None if on => ICON_ON.to_owned(),
        None => ICON_OFF.to_owned(),
    };

    let name = fan
        .attributes
        .friendly_name()
        .unwrap_or(fan.entity_id.as_str())
        .to_owned();

    let speed_bars = [FanSpeed::Low, FanSpeed::Medium, FanSpeed::High]
        .map(|speed| SpeedBar { speed, active: on && level >= speed.level() });

    let power = Control {
        icon: ICON_POWER,
        title: "Power",
        style: if on { ControlStyle::Engaged } else { ControlStyle::Normal },
        action: Action::Toggle,
    };

    let current_mode = fan.attributes.mode();
    let modes = FanMode::ALL.map(|mode| Control {
        icon: mode_icon(mode),
        title: mode_title(mode),
        style: if !on {
            ControlStyle::Inactive
        } else if current_mode == Some(mode.as_str()) {
            ControlStyle::Checked
        } else {
            ControlStyle::Normal
        },
        action: Action::SetMode(mode),
    });

    let inactive_at = |limit: FanSpeed| {
        if !on || speed == Some(limit.as_str()) {
            ControlStyle::Inactive
        } else {
            ControlStyle::Normal
        }
    };

    FanView {
        icon,
        name,
        speed_bars,
        power,
        modes,
        speed_down: Control {
            icon: ICON_SPEED_DOWN,
            title: "Slower",
            style: inactive_at(FanSpeed::Off),
            action: Action::SpeedDown,
        },
        speed_up: Control {
            icon: ICON_SPEED_UP,
            title: "Faster",
            style: inactive_at(FanSpeed::High),
            action: Action::SpeedUp,
        },
    }
}
