//! Proportional output peripheral
//!
//! Some boards route an LED through a PWM slice as well as a plain GPIO.
//! The controller only switches the peripheral on and off; it never dims.

/// Errors reported by a proportional output peripheral
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PwmError {
    /// Peripheral rejected the request
    Rejected,
    /// Duty cycle outside 0-100%
    InvalidDuty,
}

/// Duty-cycle capable output
pub trait ProportionalOutput {
    /// Start driving the peripheral with its current duty cycle
    fn enable(&mut self) -> Result<(), PwmError>;

    /// Stop driving the peripheral
    fn disable(&mut self) -> Result<(), PwmError>;

    /// Check if the peripheral is currently enabled
    fn is_enabled(&self) -> bool;

    /// Set the duty cycle in percent (0-100)
    fn set_duty_percent(&mut self, percent: u8) -> Result<(), PwmError>;
}
