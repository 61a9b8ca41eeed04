//! Thermal monitor
//!
//! Periodic sampling with hysteresis. A cycle has two halves:
//!
//! 1. [`ThermalMonitor::begin_cycle`] claims the due run under the guard.
//! 2. The caller reads its temperature source with the guard released
//!    (conversions may suspend).
//! 3. [`ThermalMonitor::complete_cycle`] applies the reading under the
//!    guard and reschedules.
//!
//! If the device is torn down between the halves, completion fails with
//! `NoDevice` and the reading is dropped.
//!
//! The override only masks the physical output. The logical state keeps
//! following control writes, blink firings and triggers, and is restored
//! to the line when the override clears.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use ledctl_hal::{OutputLine, ProportionalOutput, SensorError, TemperatureSource};

use crate::device::{DeviceId, DeviceRecord, DeviceStore};
use crate::error::ControlError;
use crate::timer::Millis;

pub const DEFAULT_THRESHOLD_C: i16 = 80;
pub const DEFAULT_HYSTERESIS_C: i16 = 5;

/// Delay before the first sample after registration
pub const THERMAL_INITIAL_DELAY_MS: u32 = 1_000;
/// Interval between samples
pub const THERMAL_PERIOD_MS: u32 = 5_000;

/// Thermal policy of one device
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ThermalConfig {
    /// Override activates at or above this temperature
    pub threshold_c: i16,
    /// Override clears at or below `threshold_c - hysteresis_c`
    pub hysteresis_c: i16,
    /// Keep sampling periodically
    pub auto_throttle: bool,
}

impl Default for ThermalConfig {
    fn default() -> Self {
        Self {
            threshold_c: DEFAULT_THRESHOLD_C,
            hysteresis_c: DEFAULT_HYSTERESIS_C,
            auto_throttle: true,
        }
    }
}

/// Result of evaluating one sample
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ThermalAction {
    /// Override unchanged
    Hold,
    /// Override turned on, output forced off
    Activate,
    /// Override turned off, output restored
    Clear,
}

impl ThermalConfig {
    /// Temperature at or below which an active override clears
    pub fn clear_at(&self) -> i16 {
        self.threshold_c.saturating_sub(self.hysteresis_c)
    }

    /// Decide what a sample means given the current override state
    pub fn evaluate(&self, temp_c: i16, active: bool) -> ThermalAction {
        if !active && temp_c >= self.threshold_c {
            ThermalAction::Activate
        } else if active && temp_c <= self.clear_at() {
            ThermalAction::Clear
        } else {
            ThermalAction::Hold
        }
    }
}

impl<L: OutputLine, P: ProportionalOutput> DeviceRecord<L, P> {
    /// Record a sample and apply the hysteresis rule
    pub(crate) fn apply_temperature(&mut self, temp_c: i16) -> ThermalAction {
        self.last_temp_c = temp_c;
        let action = self.thermal.evaluate(temp_c, self.thermal_override);
        match action {
            ThermalAction::Activate => {
                warn!("line {}: {}C, thermal override on", self.line.id(), temp_c);
                self.thermal_override = true;
                self.force_off();
            }
            ThermalAction::Clear => {
                info!("line {}: {}C, thermal override off", self.line.id(), temp_c);
                self.thermal_override = false;
                self.drive_output();
            }
            ThermalAction::Hold => {}
        }
        action
    }

    /// Arm the first sample after registration
    pub(crate) fn arm_thermal(&mut self, now: Millis) {
        if self.thermal.auto_throttle {
            self.thermal_work.schedule(now, THERMAL_INITIAL_DELAY_MS);
        }
    }

    pub(crate) fn finish_thermal_cycle(
        &mut self,
        sample: Result<i16, SensorError>,
        now: Millis,
    ) -> Option<Millis> {
        match sample {
            Ok(temp_c) => {
                self.apply_temperature(temp_c);
            }
            Err(e) => {
                warn!("line {}: temperature read failed: {:?}", self.line.id(), e);
                self.count_error();
            }
        }
        self.refresh_uptime(now);

        if self.thermal.auto_throttle {
            self.thermal_work.reschedule(now);
        }
        self.thermal_work.next_run()
    }
}

/// Entry points for the thermal sampling context
pub struct ThermalMonitor<'a, L, P> {
    store: &'a DeviceStore<L, P>,
}

impl<'a, L: OutputLine, P: ProportionalOutput> ThermalMonitor<'a, L, P> {
    pub fn new(store: &'a DeviceStore<L, P>) -> Self {
        Self { store }
    }

    /// When the next sample is due, if any
    pub fn next_run(&self, id: DeviceId) -> Result<Option<Millis>, ControlError> {
        self.store.with(id, |rec| rec.thermal_work.next_run())
    }

    /// Claim the sample due at `now`
    ///
    /// Returns false if nothing is due (not yet, or cancelled).
    pub fn begin_cycle(&self, id: DeviceId, now: Millis) -> Result<bool, ControlError> {
        self.store.with(id, |rec| rec.thermal_work.take_due(now))
    }

    /// Apply a sample taken after [`begin_cycle`](Self::begin_cycle)
    ///
    /// Returns when the next sample is due; `None` once auto-throttle is off.
    pub fn complete_cycle(
        &self,
        id: DeviceId,
        sample: Result<i16, SensorError>,
        now: Millis,
    ) -> Result<Option<Millis>, ControlError> {
        self.store.with(id, |rec| rec.finish_thermal_cycle(sample, now))
    }

    /// Run a whole cycle against a blocking sensor
    pub fn run_cycle<S: TemperatureSource>(
        &self,
        id: DeviceId,
        sensor: &mut S,
        now: Millis,
    ) -> Result<Option<Millis>, ControlError> {
        if !self.begin_cycle(id, now)? {
            return self.next_run(id);
        }
        let sample = sensor.read_celsius();
        self.complete_cycle(id, sample, now)
    }

    /// Turn periodic sampling on or off
    ///
    /// Turning it off does not cancel a run that is already scheduled; that
    /// run happens once more and then stops rescheduling. Turning it on
    /// starts sampling one period from `now` if nothing is pending.
    pub fn set_auto_throttle(
        &self,
        id: DeviceId,
        enabled: bool,
        now: Millis,
    ) -> Result<(), ControlError> {
        self.store.with(id, |rec| {
            rec.thermal.auto_throttle = enabled;
            if enabled && !rec.thermal_work.is_scheduled() {
                rec.thermal_work.reschedule(now);
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::ControlPlane;
    use crate::testing::{register, MockProvider, ScriptedSensor, TestStore};
    use proptest::prelude::*;

    fn override_active(store: &TestStore, id: DeviceId) -> bool {
        store.with(id, |rec| rec.thermal_override_active()).unwrap()
    }

    #[test]
    fn test_hysteresis_sequence() {
        let store = TestStore::new();
        let mut provider = MockProvider::new();
        let id = register(&store, &mut provider, 1, 0);
        let monitor = ThermalMonitor::new(&store);
        let mut sensor = ScriptedSensor::celsius(&[70, 82, 79, 76, 74]);

        let mut now = 1_000;
        let mut seen = [false; 5];
        for active in seen.iter_mut() {
            now = monitor.run_cycle(id, &mut sensor, now).unwrap().unwrap();
            *active = override_active(&store, id);
        }

        assert_eq!(seen, [false, true, true, true, false]);
        assert_eq!(store.with(id, |rec| rec.last_sampled_temp()), Ok(74));
    }

    #[test]
    fn test_first_sample_after_initial_delay() {
        let store = TestStore::new();
        let mut provider = MockProvider::new();
        let id = register(&store, &mut provider, 1, 2_000);
        let monitor = ThermalMonitor::new(&store);

        assert_eq!(monitor.next_run(id), Ok(Some(3_000)));
        assert_eq!(monitor.begin_cycle(id, 2_999), Ok(false));
        assert_eq!(monitor.begin_cycle(id, 3_000), Ok(true));
        assert_eq!(monitor.complete_cycle(id, Ok(20), 3_000), Ok(Some(8_000)));
    }

    #[test]
    fn test_override_masks_but_keeps_logical_state() {
        let store = TestStore::new();
        let mut provider = MockProvider::new();
        let id = register(&store, &mut provider, 1, 0);
        let control = ControlPlane::new(&store);
        let monitor = ThermalMonitor::new(&store);

        control.write_state(id, b"1").unwrap();
        monitor.begin_cycle(id, 1_000).unwrap();
        monitor.complete_cycle(id, Ok(90), 1_000).unwrap();
        assert_eq!(
            store.with(id, |rec| (rec.logical_state(), rec.output_level())),
            Ok((true, false))
        );

        // Writes during the override update the logical state only
        control.write_state(id, b"0").unwrap();
        control.write_state(id, b"1").unwrap();
        assert_eq!(store.with(id, |rec| rec.output_level()), Ok(false));

        monitor.begin_cycle(id, 6_000).unwrap();
        monitor.complete_cycle(id, Ok(60), 6_000).unwrap();
        assert_eq!(store.with(id, |rec| rec.output_level()), Ok(true));
    }

    #[test]
    fn test_failed_sample_counts_error_and_reschedules() {
        let store = TestStore::new();
        let mut provider = MockProvider::new();
        let id = register(&store, &mut provider, 1, 0);
        let monitor = ThermalMonitor::new(&store);
        let mut sensor = ScriptedSensor::new(&[Err(SensorError::ConversionError)]);

        let next = monitor.run_cycle(id, &mut sensor, 1_000).unwrap();
        assert_eq!(next, Some(6_000));

        let (errors, temp, active) = store
            .with(id, |rec| {
                (
                    rec.stats().errors,
                    rec.last_sampled_temp(),
                    rec.thermal_override_active(),
                )
            })
            .unwrap();
        assert_eq!(errors, 1);
        assert_eq!(temp, 0);
        assert!(!active);
    }

    #[test]
    fn test_disabling_auto_throttle_runs_pending_cycle_once() {
        let store = TestStore::new();
        let mut provider = MockProvider::new();
        let id = register(&store, &mut provider, 1, 0);
        let monitor = ThermalMonitor::new(&store);

        monitor.set_auto_throttle(id, false, 500).unwrap();
        assert_eq!(monitor.next_run(id), Ok(Some(1_000)));

        let mut sensor = ScriptedSensor::celsius(&[85]);
        assert_eq!(monitor.run_cycle(id, &mut sensor, 1_000), Ok(None));
        assert!(override_active(&store, id));
        assert_eq!(monitor.next_run(id), Ok(None));

        monitor.set_auto_throttle(id, true, 2_000).unwrap();
        assert_eq!(monitor.next_run(id), Ok(Some(7_000)));
    }

    #[test]
    fn test_cycle_refreshes_uptime() {
        let store = TestStore::new();
        let mut provider = MockProvider::new();
        let id = register(&store, &mut provider, 1, 0);
        let monitor = ThermalMonitor::new(&store);

        monitor.begin_cycle(id, 11_000).unwrap();
        monitor.complete_cycle(id, Ok(30), 11_000).unwrap();
        assert_eq!(store.with(id, |rec| rec.stats().uptime_s), Ok(11));
    }

    #[test]
    fn test_sample_after_teardown_is_discarded() {
        let store = TestStore::new();
        let mut provider = MockProvider::new();
        let id = register(&store, &mut provider, 1, 0);
        let monitor = ThermalMonitor::new(&store);

        assert_eq!(monitor.begin_cycle(id, 1_000), Ok(true));
        crate::lifecycle::LifecycleManager::new(&store, &mut provider)
            .teardown(id)
            .unwrap();
        let again = register(&store, &mut provider, 1, 1_000);

        assert_eq!(
            monitor.complete_cycle(id, Ok(99), 1_000),
            Err(ControlError::NoDevice)
        );
        assert!(!override_active(&store, again));
    }

    proptest! {
        #[test]
        fn prop_hysteresis_rule(
            threshold in 0i16..120,
            hysteresis in 0i16..20,
            temps in proptest::collection::vec(-40i16..150, 1..40),
        ) {
            let config = ThermalConfig {
                threshold_c: threshold,
                hysteresis_c: hysteresis,
                auto_throttle: true,
            };
            let mut active = false;
            for temp in temps {
                let before = active;
                match config.evaluate(temp, active) {
                    ThermalAction::Activate => active = true,
                    ThermalAction::Clear => active = false,
                    ThermalAction::Hold => {}
                }

                if temp >= threshold {
                    prop_assert!(active);
                } else if temp <= threshold - hysteresis {
                    prop_assert!(!active);
                } else {
                    prop_assert_eq!(active, before);
                }
            }
        }
    }
}
