//! Per-LED device record
//!
//! Holds everything the four execution contexts share. The record never
//! locks itself; every access goes through the store's guard for its slot.

use ledctl_hal::{LineId, OutputLine, ProportionalOutput};
use ledctl_protocol::StatsReport;

use crate::blink::BlinkState;
use crate::thermal::{ThermalConfig, THERMAL_PERIOD_MS};
use crate::timer::{DelayedWork, Millis};
use crate::trigger::TriggerConfig;

/// Running counters for one device
///
/// Counters only ever grow; they start from zero when the device is
/// registered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LedStats {
    /// Toggles caused by edge triggers
    pub switches: u32,
    /// Proportional output enable/disable transitions
    pub pwm_changes: u32,
    /// Failed sensor reads and peripheral errors
    pub errors: u32,
    /// Seconds since registration, refreshed by the thermal cycle
    pub uptime_s: u32,
    /// Suspend transitions
    pub power_cycles: u32,
}

impl From<LedStats> for StatsReport {
    fn from(stats: LedStats) -> Self {
        StatsReport {
            switches: stats.switches,
            pwm_changes: stats.pwm_changes,
            errors: stats.errors,
            uptime_s: stats.uptime_s,
            power_cycles: stats.power_cycles,
        }
    }
}

/// State of one LED
pub struct DeviceRecord<L, P> {
    pub(crate) line: L,
    pub(crate) pwm: Option<P>,
    pub(crate) logical_state: bool,
    /// 0-100, only ever mapped to on/off
    pub(crate) brightness: u8,
    pub(crate) blink: BlinkState,
    pub(crate) stats: LedStats,
    pub(crate) trigger: TriggerConfig,
    pub(crate) thermal: ThermalConfig,
    pub(crate) thermal_override: bool,
    pub(crate) last_temp_c: i16,
    pub(crate) thermal_work: DelayedWork,
    pub(crate) registered_at: Millis,
}

impl<L: OutputLine, P: ProportionalOutput> DeviceRecord<L, P> {
    pub(crate) fn new(
        line: L,
        pwm: Option<P>,
        trigger: TriggerConfig,
        thermal: ThermalConfig,
        now: Millis,
    ) -> Self {
        Self {
            line,
            pwm,
            logical_state: false,
            brightness: 0,
            blink: BlinkState::new(),
            stats: LedStats::default(),
            trigger,
            thermal,
            thermal_override: false,
            last_temp_c: 0,
            thermal_work: DelayedWork::new(THERMAL_PERIOD_MS),
            registered_at: now,
        }
    }

    pub fn line_id(&self) -> LineId {
        self.line.id()
    }

    pub fn logical_state(&self) -> bool {
        self.logical_state
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    pub fn is_blinking(&self) -> bool {
        self.blink.is_blinking()
    }

    /// Level currently driven on the physical line
    pub fn output_level(&self) -> bool {
        self.line.is_set_high()
    }

    pub fn stats(&self) -> LedStats {
        self.stats
    }

    pub fn trigger_config(&self) -> TriggerConfig {
        self.trigger
    }

    pub fn thermal_config(&self) -> ThermalConfig {
        self.thermal
    }

    pub fn thermal_override_active(&self) -> bool {
        self.thermal_override
    }

    pub fn last_sampled_temp(&self) -> i16 {
        self.last_temp_c
    }

    pub fn has_proportional_output(&self) -> bool {
        self.pwm.is_some()
    }

    /// Drive the line from the logical state, honoring the thermal override
    pub(crate) fn drive_output(&mut self) {
        let level = self.logical_state && !self.thermal_override;
        self.line.set_level(level);
    }

    /// Drive the line off without touching the logical state
    pub(crate) fn force_off(&mut self) {
        self.line.set_low();
    }

    pub(crate) fn refresh_uptime(&mut self, now: Millis) {
        let elapsed_s = now.saturating_sub(self.registered_at) / 1000;
        let uptime = u32::try_from(elapsed_s).unwrap_or(u32::MAX);
        self.stats.uptime_s = self.stats.uptime_s.max(uptime);
    }

    /// Switch the proportional output on or off, if there is one
    ///
    /// Successful transitions are counted in `pwm_changes`, failures in
    /// `errors`.
    pub(crate) fn set_proportional(&mut self, enable: bool) {
        let Some(pwm) = self.pwm.as_mut() else {
            return;
        };
        let result = if enable { pwm.enable() } else { pwm.disable() };
        match result {
            Ok(()) => self.stats.pwm_changes = self.stats.pwm_changes.saturating_add(1),
            Err(e) => {
                warn!("proportional output on line {} failed: {:?}", self.line.id(), e);
                self.stats.errors = self.stats.errors.saturating_add(1);
            }
        }
    }

    pub(crate) fn count_error(&mut self) {
        self.stats.errors = self.stats.errors.saturating_add(1);
    }

    pub(crate) fn into_parts(self) -> (L, Option<P>) {
        (self.line, self.pwm)
    }
}
