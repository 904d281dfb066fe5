//! Speed and mode vocabulary of the ventilation fan
//!
//! Speeds are exchanged with Home Assistant as strings, but increment and
//! decrement work on a numeric level:
//!
//! ```plain
//! off    => 0
//! low    => 1
//! medium => 2
//! high   => 3
//! ```

use core::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FanSpeed {
    Off,
    Low,
    Medium,
    High,
}

impl FanSpeed {
    pub const ALL: [FanSpeed; 4] = [FanSpeed::Off, FanSpeed::Low, FanSpeed::Medium, FanSpeed::High];

    pub const MAX_LEVEL: u8 = 3;

    pub fn level(self) -> u8 {
        match self {
            FanSpeed::Off => 0,
            FanSpeed::Low => 1,
            FanSpeed::Medium => 2,
            FanSpeed::High => 3,
        }
    }

    /// Levels above [`Self::MAX_LEVEL`] saturate to [`FanSpeed::High`]
    pub fn from_level(level: u8) -> Self {
        match level {
            0 => FanSpeed::Off,
            1 => FanSpeed::Low,
            2 => FanSpeed::Medium,
            _ => FanSpeed::High,
        }
    }

    /// Numeric level of a raw speed attribute. Anything unrecognised is 0.
    pub fn level_of(raw: Option<&str>) -> u8 {
        raw.and_then(|s| s.parse::<FanSpeed>().ok())
            .map_or(0, FanSpeed::level)
    }

    /// Percentage as reported by the fan integration
    pub fn percentage(self) -> u8 {
        match self {
            FanSpeed::Off => 0,
            FanSpeed::Low => 33,
            FanSpeed::Medium => 66,
            FanSpeed::High => 100,
        }
    }

    pub fn from_percentage(percentage: f64) -> Self {
        if percentage <= 0. {
            FanSpeed::Off
        } else if percentage <= 33. {
            FanSpeed::Low
        } else if percentage <= 66. {
            FanSpeed::Medium
        } else {
            FanSpeed::High
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FanSpeed::Off => "off",
            FanSpeed::Low => "low",
            FanSpeed::Medium => "medium",
            FanSpeed::High => "high",
        }
    }
}

impl FromStr for FanSpeed {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FanSpeed::ALL
            .into_iter()
            .find(|speed| speed.as_str() == s)
            .ok_or(UnknownValue)
    }
}

impl Display for FanSpeed {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FanMode {
    Auto,
    Manually,
    Timing,
}

impl FanMode {
    pub const ALL: [FanMode; 3] = [FanMode::Auto, FanMode::Manually, FanMode::Timing];

    pub fn as_str(self) -> &'static str {
        match self {
            FanMode::Auto => "auto",
            FanMode::Manually => "manually",
            FanMode::Timing => "timing",
        }
    }
}

impl FromStr for FanMode {
    type Err = UnknownValue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FanMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or(UnknownValue)
    }
}

impl Display for FanMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnknownValue;

impl Display for UnknownValue {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str("unknown value")
    }
}

impl core::error::Error for UnknownValue {}
