//! ledctl Hardware Abstraction Layer
//!
//! Traits that sit between the board-agnostic LED controller logic and the
//! chip-specific drivers. The core only ever talks to hardware through these.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  ledctl-core (device state machine)     │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  ledctl-hal (this crate - traits)       │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  ledctl-drivers (embedded-hal adapters) │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`line::OutputLine`] - Binary LED output
//! - [`line::LineProvider`] - Exclusive ownership of hardware lines
//! - [`pwm::ProportionalOutput`] - Optional duty-cycle peripheral
//! - [`sensor::TemperatureSource`] - Thermal sampling

#![no_std]
#![deny(unsafe_code)]

pub mod line;
pub mod pwm;
pub mod sensor;

pub use line::{LineError, LineId, LineProvider, OutputLine};
pub use pwm::{ProportionalOutput, PwmError};
pub use sensor::{SensorError, TemperatureSource};
