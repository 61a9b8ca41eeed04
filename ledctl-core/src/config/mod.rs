//! Topology configuration
//!
//! The topology lists the LEDs a board carries: output pin, optional
//! proportional output, trigger wiring and thermal policy. It is written in
//! a small TOML subset (see [`parse_topology`]) and embedded in the
//! firmware image.

mod toml;

pub use self::toml::{parse_topology, ParseError, ParseErrorKind};

use heapless::{String, Vec};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use ledctl_hal::LineId;

use crate::thermal::ThermalConfig;
use crate::trigger::TriggerConfig;

/// Longest LED name
pub const MAX_NAME_LEN: usize = 16;

/// Entries a topology may list; only the first
/// [`MAX_DEVICES`](crate::MAX_DEVICES) are registered
pub const MAX_TOPOLOGY_ENTRIES: usize = 16;

/// Pin with optional inversion and pull-up
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PinConfig {
    /// GPIO number
    pub pin: u8,
    /// Active low
    pub inverted: bool,
    /// Internal pull-up (inputs only)
    pub pull_up: bool,
}

impl PinConfig {
    pub const fn new(pin: u8) -> Self {
        Self {
            pin,
            inverted: false,
            pull_up: false,
        }
    }

    pub const fn inverted(pin: u8) -> Self {
        Self {
            pin,
            inverted: true,
            pull_up: false,
        }
    }

    pub const fn line(&self) -> LineId {
        LineId(self.pin)
    }
}

/// One LED entry of the topology
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct LedSpec {
    pub name: String<MAX_NAME_LEN>,
    pub pin: PinConfig,
    /// A proportional output is wired to this LED
    pub pwm: bool,
    pub trigger: TriggerConfig,
    /// Enable the pull-up on the trigger input
    pub trigger_pull_up: bool,
    pub thermal: ThermalConfig,
}

impl LedSpec {
    /// Entry with default trigger and thermal settings
    pub fn new(pin: PinConfig) -> Self {
        Self {
            name: String::new(),
            pin,
            pwm: false,
            trigger: TriggerConfig::default(),
            trigger_pull_up: false,
            thermal: ThermalConfig::default(),
        }
    }
}

/// All LEDs of a board, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Topology {
    pub leds: Vec<LedSpec, MAX_TOPOLOGY_ENTRIES>,
}

impl Topology {
    pub fn new() -> Self {
        Self::default()
    }

    /// Find an entry by name
    pub fn find(&self, name: &str) -> Option<&LedSpec> {
        self.leds.iter().find(|led| led.name.as_str() == name)
    }
}
