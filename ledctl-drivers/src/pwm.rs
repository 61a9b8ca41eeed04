//! Duty-cycle peripheral as a proportional output
//!
//! The controller only switches the output on and off; the duty cycle is
//! whatever was last set (full on by default).

use embedded_hal::pwm::SetDutyCycle;
use ledctl_hal::{ProportionalOutput, PwmError};

/// Proportional output backed by an `embedded-hal` PWM channel
pub struct DutyCycleOutput<C> {
    channel: C,
    duty_percent: u8,
    enabled: bool,
}

impl<C: SetDutyCycle> DutyCycleOutput<C> {
    /// Wrap a PWM channel, leaving it fully off
    pub fn new(mut channel: C) -> Result<Self, PwmError> {
        channel
            .set_duty_cycle_fully_off()
            .map_err(|_| PwmError::Rejected)?;
        Ok(Self {
            channel,
            duty_percent: 100,
            enabled: false,
        })
    }

    pub fn duty_percent(&self) -> u8 {
        self.duty_percent
    }

    pub fn into_inner(self) -> C {
        self.channel
    }
}

impl<C: SetDutyCycle> ProportionalOutput for DutyCycleOutput<C> {
    fn enable(&mut self) -> Result<(), PwmError> {
        self.channel
            .set_duty_cycle_percent(self.duty_percent)
            .map_err(|_| PwmError::Rejected)?;
        self.enabled = true;
        Ok(())
    }

    fn disable(&mut self) -> Result<(), PwmError> {
        self.channel
            .set_duty_cycle_fully_off()
            .map_err(|_| PwmError::Rejected)?;
        self.enabled = false;
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_duty_percent(&mut self, percent: u8) -> Result<(), PwmError> {
        if percent > 100 {
            return Err(PwmError::InvalidDuty);
        }
        self.duty_percent = percent;
        if self.enabled {
            self.channel
                .set_duty_cycle_percent(percent)
                .map_err(|_| PwmError::Rejected)?;
        }
        Ok(())
    }
}

/// Placeholder for boards without any proportional output
///
/// Has no values, so a device typed with it can never carry one.
#[derive(Debug)]
pub enum NoProportionalOutput {}

impl ProportionalOutput for NoProportionalOutput {
    fn enable(&mut self) -> Result<(), PwmError> {
        match *self {}
    }

    fn disable(&mut self) -> Result<(), PwmError> {
        match *self {}
    }

    fn is_enabled(&self) -> bool {
        match *self {}
    }

    fn set_duty_percent(&mut self, _percent: u8) -> Result<(), PwmError> {
        match *self {}
    }
}
