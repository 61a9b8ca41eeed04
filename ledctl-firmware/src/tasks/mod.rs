//! Embassy async tasks
//!
//! Each task owns one context (timer, sensor, edge input, link) and reaches
//! device state only through the core crate's guarded store.

pub mod blink;
pub mod control;
pub mod thermal;
pub mod trigger;

pub use blink::blink_task;
pub use control::control_task;
pub use thermal::thermal_task;
pub use trigger::trigger_task;
