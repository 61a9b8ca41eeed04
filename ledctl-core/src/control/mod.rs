//! Control plane
//!
//! Synchronous operations invoked by a client: the byte interface
//! (`'0'`/`'1'` status symbol) and the command interface. Every operation
//! is a read-modify-write under the device guard and fails without side
//! effects.

mod link;
mod stream;

pub use link::{handle_frame, handle_request};
pub use stream::StatusStream;

use ledctl_hal::{OutputLine, ProportionalOutput};
use ledctl_protocol::Command;

use crate::blink::BlinkEngine;
use crate::device::{DeviceId, DeviceStore};
use crate::error::ControlError;
use crate::timer::Millis;

/// Highest accepted brightness
pub const MAX_BRIGHTNESS: i32 = 100;

/// Result of a successfully executed command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    /// Command took effect
    Applied,
    /// Command is recognized but has no effect yet
    NotImplemented,
}

/// Status symbol for a logical state
pub fn state_symbol(on: bool) -> u8 {
    if on {
        b'1'
    } else {
        b'0'
    }
}

/// Control operations on the devices of one store
pub struct ControlPlane<'a, L, P> {
    store: &'a DeviceStore<L, P>,
}

impl<'a, L, P> Clone for ControlPlane<'a, L, P> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<'a, L, P> Copy for ControlPlane<'a, L, P> {}

impl<'a, L: OutputLine, P: ProportionalOutput> ControlPlane<'a, L, P> {
    pub fn new(store: &'a DeviceStore<L, P>) -> Self {
        Self { store }
    }

    /// Current status symbol, `b'0'` or `b'1'`
    pub fn read_state(&self, id: DeviceId) -> Result<u8, ControlError> {
        self.store.with(id, |rec| state_symbol(rec.logical_state()))
    }

    /// Open a byte stream over the status symbol
    pub fn open(&self, id: DeviceId) -> Result<StatusStream<'a, L, P>, ControlError> {
        self.store.with(id, |_| ())?;
        Ok(StatusStream::new(*self, id))
    }

    /// Write the status symbol
    ///
    /// Accepts exactly one byte, `b'0'` or `b'1'`. Returns the number of
    /// bytes consumed.
    pub fn write_state(&self, id: DeviceId, bytes: &[u8]) -> Result<usize, ControlError> {
        let on = match bytes {
            [b'1'] => true,
            [b'0'] => false,
            _ => return Err(ControlError::InvalidArgument),
        };
        self.store.with(id, |rec| {
            rec.logical_state = on;
            rec.drive_output();
        })?;
        trace!("state <- {}", on);
        Ok(bytes.len())
    }

    /// Set brightness 0-100; the output is on for anything above zero
    pub fn set_brightness(&self, id: DeviceId, value: i32) -> Result<(), ControlError> {
        let brightness = u8::try_from(value)
            .ok()
            .filter(|&b| i32::from(b) <= MAX_BRIGHTNESS)
            .ok_or(ControlError::InvalidArgument)?;
        self.store.with(id, |rec| {
            rec.brightness = brightness;
            rec.logical_state = brightness > 0;
            rec.drive_output();
        })
    }

    pub fn start_blink(
        &self,
        id: DeviceId,
        on_ms: u32,
        off_ms: u32,
        now: Millis,
    ) -> Result<(), ControlError> {
        BlinkEngine::new(self.store).start(id, on_ms, off_ms, now)
    }

    /// Stop blinking and force the LED off, brightness 0
    ///
    /// Applies regardless of thermal override or blink phase.
    pub fn reset(&self, id: DeviceId) -> Result<(), ControlError> {
        self.store.with(id, |rec| {
            rec.brightness = 0;
            rec.stop_blink();
            rec.force_off();
        })
    }

    /// Execute a decoded command
    pub fn execute(
        &self,
        id: DeviceId,
        command: &Command,
        now: Millis,
    ) -> Result<Outcome, ControlError> {
        match command {
            Command::SetBrightness(value) => self.set_brightness(id, *value)?,
            Command::SetBlink(params) => {
                self.start_blink(id, params.delay_on_ms, params.delay_off_ms, now)?
            }
            Command::Reset => self.reset(id)?,
            Command::SetPwm(_)
            | Command::GetStats
            | Command::SetTrigger(_)
            | Command::SetThermal(_) => {
                // Device must still exist, but nothing is touched
                self.store.with(id, |_| ())?;
                debug!("reserved command {}", command.opcode());
                return Ok(Outcome::NotImplemented);
            }
        }
        Ok(Outcome::Applied)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{register, MockProvider, TestStore};
    use crate::thermal::ThermalMonitor;
    use ledctl_protocol::{BlinkParams, PwmParams, ThermalParams, TriggerParams};

    fn snapshot(store: &TestStore, id: DeviceId) -> (bool, bool, u8, bool) {
        store
            .with(id, |rec| {
                (
                    rec.logical_state(),
                    rec.output_level(),
                    rec.brightness(),
                    rec.is_blinking(),
                )
            })
            .unwrap()
    }

    #[test]
    fn test_write_and_read_state() {
        let store = TestStore::new();
        let mut provider = MockProvider::new();
        let id = register(&store, &mut provider, 0, 0);
        let control = ControlPlane::new(&store);

        assert_eq!(control.read_state(id), Ok(b'0'));
        assert_eq!(control.write_state(id, b"1"), Ok(1));
        assert_eq!(control.read_state(id), Ok(b'1'));
        assert!(snapshot(&store, id).1);
    }

    #[test]
    fn test_invalid_write_leaves_state() {
        let store = TestStore::new();
        let mut provider = MockProvider::new();
        let id = register(&store, &mut provider, 0, 0);
        let control = ControlPlane::new(&store);

        control.write_state(id, b"1").unwrap();
        assert_eq!(control.write_state(id, b"X"), Err(ControlError::InvalidArgument));
        assert_eq!(control.write_state(id, b""), Err(ControlError::InvalidArgument));
        assert_eq!(control.write_state(id, b"10"), Err(ControlError::InvalidArgument));
        assert_eq!(control.read_state(id), Ok(b'1'));
    }

    #[test]
    fn test_brightness_range() {
        let store = TestStore::new();
        let mut provider = MockProvider::new();
        let id = register(&store, &mut provider, 0, 0);
        let control = ControlPlane::new(&store);

        control.set_brightness(id, 40).unwrap();
        assert_eq!(snapshot(&store, id), (true, true, 40, false));

        assert_eq!(control.set_brightness(id, 101), Err(ControlError::InvalidArgument));
        assert_eq!(control.set_brightness(id, -1), Err(ControlError::InvalidArgument));
        assert_eq!(snapshot(&store, id).2, 40);

        control.set_brightness(id, 0).unwrap();
        assert_eq!(snapshot(&store, id), (false, false, 0, false));
    }

    #[test]
    fn test_reset_during_blink_and_override() {
        let store = TestStore::new();
        let mut provider = MockProvider::new();
        let id = register(&store, &mut provider, 0, 0);
        let control = ControlPlane::new(&store);

        control.set_brightness(id, 100).unwrap();
        control.start_blink(id, 50, 50, 0).unwrap();
        let monitor = ThermalMonitor::new(&store);
        monitor.begin_cycle(id, 1_000).unwrap();
        monitor.complete_cycle(id, Ok(95), 1_000).unwrap();

        control.reset(id).unwrap();
        assert_eq!(snapshot(&store, id), (false, false, 0, false));
    }

    #[test]
    fn test_execute_implemented_commands() {
        let store = TestStore::new();
        let mut provider = MockProvider::new();
        let id = register(&store, &mut provider, 0, 0);
        let control = ControlPlane::new(&store);

        assert_eq!(
            control.execute(id, &Command::SetBrightness(5), 0),
            Ok(Outcome::Applied)
        );
        let blink = Command::SetBlink(BlinkParams {
            delay_on_ms: 10,
            delay_off_ms: 20,
        });
        assert_eq!(control.execute(id, &blink, 0), Ok(Outcome::Applied));
        assert!(snapshot(&store, id).3);

        assert_eq!(control.execute(id, &Command::Reset, 0), Ok(Outcome::Applied));
        assert_eq!(snapshot(&store, id), (false, false, 0, false));
    }

    #[test]
    fn test_reserved_commands_change_nothing() {
        let store = TestStore::new();
        let mut provider = MockProvider::new();
        let id = register(&store, &mut provider, 0, 0);
        let control = ControlPlane::new(&store);
        control.set_brightness(id, 30).unwrap();

        let reserved = [
            Command::SetPwm(PwmParams {
                period_ns: 0,
                duty_cycle: u32::MAX,
                hardware_pwm: true,
            }),
            Command::GetStats,
            Command::SetTrigger(TriggerParams {
                line: -7,
                rising_edge: true,
                falling_edge: true,
                debounce_ms: 0,
            }),
            Command::SetThermal(ThermalParams {
                threshold_c: -300,
                hysteresis_c: 1_000,
                auto_throttle: false,
            }),
        ];
        let before = store.with(id, |rec| rec.thermal_config()).unwrap();
        for command in &reserved {
            assert_eq!(control.execute(id, command, 0), Ok(Outcome::NotImplemented));
        }
        assert_eq!(snapshot(&store, id), (true, true, 30, false));
        assert_eq!(store.with(id, |rec| rec.thermal_config()), Ok(before));
    }

    #[test]
    fn test_unknown_device() {
        let store = TestStore::new();
        let mut provider = MockProvider::new();
        let id = register(&store, &mut provider, 0, 0);
        crate::lifecycle::LifecycleManager::new(&store, &mut provider)
            .teardown(id)
            .unwrap();

        let control = ControlPlane::new(&store);
        assert_eq!(control.read_state(id), Err(ControlError::NoDevice));
        assert_eq!(control.execute(id, &Command::GetStats, 0), Err(ControlError::NoDevice));
    }
}
