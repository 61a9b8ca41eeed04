//! Blink engine
//!
//! ```text
//!            start_blink
//!   Idle ───────────────► Phase-On ◄──┐
//!    ▲                       │        │ off interval
//!    │ reset / teardown      │ on     │
//!    └────────────────── Phase-Off ───┘
//! ```
//!
//! The phase is the logical state while blinking. Each firing toggles it
//! and re-arms the one-shot timer for the interval of the phase just
//! entered. Firings run under the device guard and never suspend.

use ledctl_hal::{OutputLine, ProportionalOutput};

use crate::device::{DeviceId, DeviceRecord, DeviceStore};
use crate::error::ControlError;
use crate::timer::{Millis, OneShotTimer};

/// Shortest interval the timer is armed with
///
/// A zero interval would re-fire in the same instant forever.
pub const MIN_BLINK_INTERVAL_MS: u32 = 1;

/// Where a device is in its blink cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BlinkPhase {
    Idle,
    On,
    Off,
}

/// Blink bookkeeping stored in each device record
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlinkState {
    blinking: bool,
    on_ms: u32,
    off_ms: u32,
    timer: OneShotTimer,
}

impl Default for BlinkState {
    fn default() -> Self {
        Self::new()
    }
}

impl BlinkState {
    pub const fn new() -> Self {
        Self {
            blinking: false,
            on_ms: 0,
            off_ms: 0,
            timer: OneShotTimer::new(),
        }
    }

    pub fn is_blinking(&self) -> bool {
        self.blinking
    }

    /// Configured (on, off) intervals in milliseconds
    pub fn intervals(&self) -> (u32, u32) {
        (self.on_ms, self.off_ms)
    }

    pub fn deadline(&self) -> Option<Millis> {
        self.timer.deadline()
    }

    /// Stop blinking without touching the LED
    pub(crate) fn cancel(&mut self) {
        self.blinking = false;
        self.timer.cancel();
    }
}

impl<L: OutputLine, P: ProportionalOutput> DeviceRecord<L, P> {
    pub fn blink_phase(&self) -> BlinkPhase {
        match (self.blink.blinking, self.logical_state) {
            (false, _) => BlinkPhase::Idle,
            (true, true) => BlinkPhase::On,
            (true, false) => BlinkPhase::Off,
        }
    }

    /// Begin blinking; the first firing comes after the on interval
    /// regardless of the current state
    pub(crate) fn start_blink(&mut self, now: Millis, on_ms: u32, off_ms: u32) {
        self.blink.blinking = true;
        self.blink.on_ms = on_ms.max(MIN_BLINK_INTERVAL_MS);
        self.blink.off_ms = off_ms.max(MIN_BLINK_INTERVAL_MS);
        self.blink.timer.arm(now, self.blink.on_ms);
    }

    /// Stop blinking and leave the LED off
    pub(crate) fn stop_blink(&mut self) {
        self.blink.cancel();
        self.logical_state = false;
        self.drive_output();
    }

    /// Handle a timer firing at `now`
    ///
    /// Returns the next deadline. A firing that is early, stale or arrives
    /// after the timer was cancelled changes nothing.
    pub(crate) fn fire_blink(&mut self, now: Millis) -> Option<Millis> {
        if !self.blink.timer.take_expired(now) {
            return self.blink.timer.deadline();
        }

        self.logical_state = !self.logical_state;
        self.drive_output();

        if self.blink.blinking {
            let interval = if self.logical_state {
                self.blink.on_ms
            } else {
                self.blink.off_ms
            };
            self.blink.timer.arm(now, interval);
        }
        self.blink.timer.deadline()
    }
}

/// Blink entry points, shared by the control plane and the timer context
pub struct BlinkEngine<'a, L, P> {
    store: &'a DeviceStore<L, P>,
}

impl<'a, L: OutputLine, P: ProportionalOutput> BlinkEngine<'a, L, P> {
    pub fn new(store: &'a DeviceStore<L, P>) -> Self {
        Self { store }
    }

    pub fn start(
        &self,
        id: DeviceId,
        on_ms: u32,
        off_ms: u32,
        now: Millis,
    ) -> Result<(), ControlError> {
        debug!("blink start on={} off={}", on_ms, off_ms);
        self.store.with(id, |rec| rec.start_blink(now, on_ms, off_ms))
    }

    pub fn stop(&self, id: DeviceId) -> Result<(), ControlError> {
        self.store.with(id, |rec| rec.stop_blink())
    }

    /// Deadline the timer context should sleep until, if any
    pub fn deadline(&self, id: DeviceId) -> Result<Option<Millis>, ControlError> {
        self.store.with(id, |rec| rec.blink.deadline())
    }

    /// Timer context entry point
    ///
    /// Returns the next deadline, or `None` once blinking stopped or the
    /// device is gone.
    pub fn on_timer(&self, id: DeviceId, now: Millis) -> Option<Millis> {
        self.store.with(id, |rec| rec.fire_blink(now)).ok().flatten()
    }
}
