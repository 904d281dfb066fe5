use egui::{Color32, Visuals};
use freshair_card::{ControlStyle, view};

/// Size of one control, in points
pub const UNIT: f32 = 40.;

pub const ACCENT: Color32 = Color32::from_rgb(0xf3, 0x9c, 0x12);
pub const ICON: Color32 = Color32::from_rgb(0x44, 0x73, 0x9e);
pub const CHECKED: Color32 = Color32::from_rgb(0x03, 0xa9, 0xf4);
pub const INACTIVE: Color32 = Color32::from_rgb(0xd4, 0xd4, 0xd4);

pub fn control_color(style: ControlStyle, visuals: &Visuals) -> Color32 {
    match style {
        ControlStyle::Normal => visuals.text_color(),
        ControlStyle::Engaged => ACCENT,
        ControlStyle::Checked => CHECKED,
        ControlStyle::Inactive => INACTIVE,
    }
}

/// Text stand-in for an icon id, since egui has no icon font for them
pub fn glyph(icon: &str) -> &str {
    match icon {
        view::ICON_ON => "🌀",
        view::ICON_OFF => "⭘",
        view::ICON_POWER => "⚡",
        view::ICON_SPEED_DOWN => "➖",
        view::ICON_SPEED_UP => "➕",
        "mdi:alpha-a-circle-outline" => "A",
        "mdi:alpha-m-circle-outline" => "M",
        "mdi:alpha-t-circle-outline" => "T",
        other => other.rsplit(':').next().unwrap_or(other),
    }
}
