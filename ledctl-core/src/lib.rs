//! Board-agnostic device state handling for the LED controller
//!
//! Everything here runs the same on the target and on the host:
//!
//! - Device record store with one guard per record
//! - Blink engine (one-shot timer driven)
//! - Thermal monitor with hysteresis (delayed work driven)
//! - Edge trigger handler
//! - Control plane (byte interface and commands)
//! - Power transitions and device lifecycle
//! - Topology configuration and introspection snapshots
//!
//! Time is never read here. Every context passes the current monotonic time
//! in milliseconds, so the firmware decides where it comes from.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod blink;
pub mod config;
pub mod control;
pub mod device;
pub mod error;
pub mod introspect;
pub mod lifecycle;
pub mod power;
pub mod thermal;
pub mod timer;
pub mod trigger;

#[cfg(test)]
mod testing;

pub use device::{DeviceId, DeviceRecord, DeviceStore, MAX_DEVICES};
pub use error::ControlError;
pub use timer::Millis;
