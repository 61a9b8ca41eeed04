//! Hardware driver implementations
//!
//! Adapters from `embedded-hal` peripherals to the traits in `ledctl-hal`:
//!
//! - GPIO output lines with active-low support
//! - Pin bank handing out exclusively owned lines
//! - Duty-cycle peripheral as proportional output
//! - RP2040 on-die temperature sensor

#![no_std]
#![deny(unsafe_code)]

pub mod line;
pub mod pwm;
pub mod sensor;
