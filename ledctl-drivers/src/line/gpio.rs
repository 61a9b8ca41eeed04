//! GPIO LED line
//!
//! Drives an LED directly from a GPIO pin. The pin can be wired active-high
//! (default) or active-low; the line always speaks in LED terms.

use core::convert::Infallible;

use embedded_hal::digital::OutputPin;
use ledctl_hal::{LineId, OutputLine};

/// Pin whose direction can be switched at runtime
///
/// Lines are released back to the bank as high-impedance inputs so an
/// unregistered LED is never driven.
pub trait DirectionalPin: OutputPin<Error = Infallible> {
    /// Switch to push-pull output
    fn set_as_output(&mut self);

    /// Switch to high-impedance input
    fn set_as_input(&mut self);
}

fn drive<P: OutputPin<Error = Infallible>>(pin: &mut P, high: bool) {
    let result = if high { pin.set_high() } else { pin.set_low() };
    match result {
        Ok(()) => {}
        Err(never) => match never {},
    }
}

/// LED output on a single GPIO pin
pub struct GpioLine<P> {
    pin: P,
    id: LineId,
    /// LED on = pin low
    inverted: bool,
    /// LED state (true = lit)
    on: bool,
}

impl<P: OutputPin<Error = Infallible>> GpioLine<P> {
    /// Wrap an output pin, starting with the LED off
    pub fn new(pin: P, id: LineId, inverted: bool) -> Self {
        let mut line = Self {
            pin,
            id,
            inverted,
            on: false,
        };
        line.set_low();
        line
    }

    pub fn new_active_high(pin: P, id: LineId) -> Self {
        Self::new(pin, id, false)
    }

    pub fn new_active_low(pin: P, id: LineId) -> Self {
        Self::new(pin, id, true)
    }

    pub fn is_inverted(&self) -> bool {
        self.inverted
    }

    /// Give the pin back
    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P: OutputPin<Error = Infallible>> OutputLine for GpioLine<P> {
    fn set_high(&mut self) {
        self.on = true;
        drive(&mut self.pin, !self.inverted);
    }

    fn set_low(&mut self) {
        self.on = false;
        drive(&mut self.pin, self.inverted);
    }

    fn is_set_high(&self) -> bool {
        self.on
    }

    fn id(&self) -> LineId {
        self.id
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use super::*;
    use embedded_hal::digital::ErrorType;

    /// Pin recording its electrical level and direction
    #[derive(Debug, Default)]
    pub struct MockPin {
        pub high: bool,
        pub output: bool,
        pub writes: u32,
    }

    impl ErrorType for MockPin {
        type Error = Infallible;
    }

    impl OutputPin for MockPin {
        fn set_low(&mut self) -> Result<(), Infallible> {
            self.high = false;
            self.writes += 1;
            Ok(())
        }

        fn set_high(&mut self) -> Result<(), Infallible> {
            self.high = true;
            self.writes += 1;
            Ok(())
        }
    }

    impl DirectionalPin for MockPin {
        fn set_as_output(&mut self) {
            self.output = true;
        }

        fn set_as_input(&mut self) {
            self.output = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mock::MockPin;
    use super::*;

    #[test]
    fn test_starts_off() {
        let line = GpioLine::new_active_high(MockPin::default(), LineId(25));
        assert!(!line.is_set_high());
        assert_eq!(line.id(), LineId(25));
        assert!(!line.into_inner().high);
    }

    #[test]
    fn test_active_high() {
        let mut line = GpioLine::new_active_high(MockPin::default(), LineId(0));
        line.set_high();
        assert!(line.is_set_high());
        assert!(line.pin.high);

        line.set_level(false);
        assert!(!line.pin.high);
    }

    #[test]
    fn test_active_low() {
        let mut line = GpioLine::new_active_low(MockPin::default(), LineId(0));
        // Off means the pin idles high
        assert!(line.pin.high);

        line.set_high();
        assert!(line.is_set_high());
        assert!(!line.pin.high);
        assert!(line.is_inverted());
    }
}
