//! ledctl command link protocol
//!
//! Defines the commands accepted by the LED controller and the binary frame
//! format used to carry them over a serial link.
//!
//! # Frame Format
//!
//! ```text
//! ┌───────┬────────┬────────┬────────┬─────────────┬──────────┐
//! │ START │ LENGTH │ DEVICE │ OPCODE │ PAYLOAD     │ CHECKSUM │
//! │ 1B    │ 1B     │ 1B     │ 1B     │ 0–64B       │ 1B       │
//! └───────┴────────┴────────┴────────┴─────────────┴──────────┘
//! ```
//!
//! Command opcodes mirror the controller's ioctl-style interface: three are
//! implemented, four are reserved with fully declared payloads so that
//! wiring them up later does not change the wire format.

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod command;
pub mod frame;
pub mod reply;
pub mod request;

pub use command::{
    BlinkParams, Command, CommandError, PwmParams, ThermalParams, TriggerParams,
};
pub use frame::{Frame, FrameError, FrameParser, FRAME_START, MAX_PAYLOAD_SIZE};
pub use reply::{Introspection, Reply, StatsReport, Status};
pub use request::Request;
