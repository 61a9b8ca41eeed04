//! Replies sent back over the command link
//!
//! Every reply echoes the request opcode with [`REPLY_FLAG`] set. The first
//! payload byte is a [`Status`]; the rest depends on the request.

use serde::{Deserialize, Serialize};

use crate::frame::{Frame, FrameError, MAX_PAYLOAD_SIZE};

/// Bit set on the opcode of every reply frame
pub const REPLY_FLAG: u8 = 0x80;

/// Outcome of a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Status {
    Ok = 0,
    /// Recognized reserved command, accepted without effect
    NotImplemented = 1,
    InvalidLine = 2,
    ResourceExhausted = 3,
    InvalidArgument = 4,
    Fault = 5,
    UnsupportedOperation = 6,
    NoDevice = 7,
}

impl Status {
    /// Create a status from its wire byte
    pub fn from_u8(value: u8) -> Option<Self> {
        Some(match value {
            0 => Status::Ok,
            1 => Status::NotImplemented,
            2 => Status::InvalidLine,
            3 => Status::ResourceExhausted,
            4 => Status::InvalidArgument,
            5 => Status::Fault,
            6 => Status::UnsupportedOperation,
            7 => Status::NoDevice,
            _ => return None,
        })
    }
}

/// Per-device counters as reported over the link
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StatsReport {
    pub switches: u32,
    pub pwm_changes: u32,
    pub errors: u32,
    pub uptime_s: u32,
    pub power_cycles: u32,
}

/// Read-only view of a device for external monitoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Introspection {
    pub stats: StatsReport,
    pub last_temp_c: i16,
    pub thermal_override: bool,
    pub proportional_output: bool,
    pub threshold_c: i16,
}

/// Reply to a single request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reply {
    /// Status only
    Status(Status),
    /// Status byte read from the device (`b'0'` or `b'1'`)
    State(u8),
    /// Monitoring snapshot
    Introspection(Introspection),
}

impl Reply {
    /// Build the reply frame for a request on `device` with `opcode`
    pub fn to_frame(&self, device: u8, opcode: u8) -> Result<Frame, FrameError> {
        let opcode = opcode | REPLY_FLAG;
        match self {
            Reply::Status(status) => Frame::new(device, opcode, &[*status as u8]),
            Reply::State(symbol) => Frame::new(device, opcode, &[Status::Ok as u8, *symbol]),
            Reply::Introspection(view) => {
                let mut payload = [0u8; MAX_PAYLOAD_SIZE];
                payload[0] = Status::Ok as u8;
                let used = postcard::to_slice(view, &mut payload[1..])
                    .map_err(|_| FrameError::PayloadTooLarge)?
                    .len();
                Frame::new(device, opcode, &payload[..1 + used])
            }
        }
    }

    /// Decode the monitoring snapshot carried by an introspection reply
    pub fn introspection_from_frame(frame: &Frame) -> Option<Introspection> {
        match frame.payload.split_first() {
            Some((&status, rest)) if status == Status::Ok as u8 => {
                postcard::from_bytes(rest).ok()
            }
            _ => None,
        }
    }
}
