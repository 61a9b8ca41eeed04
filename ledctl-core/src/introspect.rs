//! Read-only monitoring view
//!
//! A snapshot is copied out under the guard, so it is consistent but may
//! be stale by the time it is displayed. The only writable knob is the
//! thermal threshold.

use core::fmt;

use ledctl_hal::{LineId, OutputLine, ProportionalOutput};
use ledctl_protocol::Introspection;

use crate::device::{DeviceId, DeviceStore, LedStats};
use crate::error::ControlError;
use crate::timer::Millis;

/// Point-in-time copy of a device's observable state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct DeviceSnapshot {
    pub line: LineId,
    pub stats: LedStats,
    pub last_temp_c: i16,
    pub thermal_override: bool,
    pub proportional_output: bool,
    pub logical_state: bool,
    pub brightness: u8,
    pub blinking: bool,
    pub threshold_c: i16,
}

impl fmt::Display for DeviceSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Switches: {}", self.stats.switches)?;
        writeln!(f, "PWM changes: {}", self.stats.pwm_changes)?;
        writeln!(f, "Errors: {}", self.stats.errors)?;
        writeln!(f, "Uptime: {} seconds", self.stats.uptime_s)?;
        writeln!(f, "Power cycles: {}", self.stats.power_cycles)?;
        writeln!(f, "Temperature: {}°C", self.last_temp_c)?;
        writeln!(
            f,
            "Thermal shutdown: {}",
            if self.thermal_override { "yes" } else { "no" }
        )
    }
}

impl From<DeviceSnapshot> for Introspection {
    fn from(snap: DeviceSnapshot) -> Self {
        Introspection {
            stats: snap.stats.into(),
            last_temp_c: snap.last_temp_c,
            thermal_override: snap.thermal_override,
            proportional_output: snap.proportional_output,
            threshold_c: snap.threshold_c,
        }
    }
}

/// Take a snapshot of one device, refreshing its uptime to `now`
pub fn snapshot<L: OutputLine, P: ProportionalOutput>(
    store: &DeviceStore<L, P>,
    id: DeviceId,
    now: Millis,
) -> Result<DeviceSnapshot, ControlError> {
    store.with(id, |rec| {
        rec.refresh_uptime(now);
        DeviceSnapshot {
            line: rec.line_id(),
            stats: rec.stats(),
            last_temp_c: rec.last_sampled_temp(),
            thermal_override: rec.thermal_override_active(),
            proportional_output: rec.has_proportional_output(),
            logical_state: rec.logical_state(),
            brightness: rec.brightness(),
            blinking: rec.is_blinking(),
            threshold_c: rec.thermal_config().threshold_c,
        }
    })
}

/// Change the thermal threshold
///
/// Takes effect at the next sample; an active override is not
/// re-evaluated immediately.
pub fn set_thermal_threshold<L: OutputLine, P: ProportionalOutput>(
    store: &DeviceStore<L, P>,
    id: DeviceId,
    threshold_c: i16,
) -> Result<(), ControlError> {
    store.with(id, |rec| rec.thermal.threshold_c = threshold_c)?;
    info!("threshold <- {}C", threshold_c);
    Ok(())
}
