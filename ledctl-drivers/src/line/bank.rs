//! Config-driven pin allocation
//!
//! Holds every GPIO of the board and hands them out by number, so the
//! topology file decides which pins drive LEDs. A pin handed out cannot be
//! handed out again until it comes back through `release`.

use ledctl_hal::{LineError, LineId, LineProvider};

use super::gpio::{DirectionalPin, GpioLine};

/// Bank of `N` GPIO pins, indexed by pin number
pub struct PinBank<P, const N: usize> {
    pins: [Option<P>; N],
    active_low: [bool; N],
}

impl<P: DirectionalPin, const N: usize> PinBank<P, N> {
    /// Create a bank from all pins of the board
    ///
    /// Pins start as inputs.
    pub fn new(pins: [P; N]) -> Self {
        Self {
            pins: pins.map(|mut pin| {
                pin.set_as_input();
                Some(pin)
            }),
            active_low: [false; N],
        }
    }

    /// Create a bank where some pins are unavailable (reserved for UART,
    /// flash, the sensor, ...)
    pub fn with_reserved(pins: [Option<P>; N]) -> Self {
        Self {
            pins: pins.map(|pin| {
                pin.map(|mut pin| {
                    pin.set_as_input();
                    pin
                })
            }),
            active_low: [false; N],
        }
    }

    /// Mark an LED as wired active-low; takes effect on the next acquire
    pub fn set_active_low(&mut self, id: LineId, active_low: bool) -> Result<(), LineError> {
        let slot = self
            .active_low
            .get_mut(usize::from(id.number()))
            .ok_or(LineError::Invalid)?;
        *slot = active_low;
        Ok(())
    }

    pub fn is_available(&self, id: LineId) -> bool {
        matches!(self.pins.get(usize::from(id.number())), Some(Some(_)))
    }

    /// Take a raw pin for a non-LED use (trigger input, PWM)
    pub fn take(&mut self, id: LineId) -> Result<P, LineError> {
        self.pins
            .get_mut(usize::from(id.number()))
            .ok_or(LineError::Invalid)?
            .take()
            .ok_or(LineError::Busy)
    }
}

impl<P: DirectionalPin, const N: usize> LineProvider for PinBank<P, N> {
    type Line = GpioLine<P>;

    fn acquire(&mut self, id: LineId) -> Result<GpioLine<P>, LineError> {
        let mut pin = self.take(id)?;
        pin.set_as_output();
        let inverted = self.active_low[usize::from(id.number())];
        Ok(GpioLine::new(pin, id, inverted))
    }

    fn release(&mut self, line: GpioLine<P>) {
        let id = ledctl_hal::OutputLine::id(&line);
        let mut pin = line.into_inner();
        pin.set_as_input();
        if let Some(slot) = self.pins.get_mut(usize::from(id.number())) {
            *slot = Some(pin);
        }
    }
}
