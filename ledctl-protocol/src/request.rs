//! Requests carried by link frames
//!
//! Opcodes below 0x10 are controller commands (see [`crate::command`]).
//! The rest cover the byte interface, power hooks and monitoring:
//! - `READ_STATE` (0x10): read the status byte
//! - `WRITE_STATE` (0x11): write raw bytes to the device
//! - `SUSPEND` (0x20) / `RESUME` (0x21): power transitions
//! - `INTROSPECT` (0x30): fetch the monitoring snapshot
//! - `SET_THRESHOLD` (0x31): i16 thermal threshold in °C

use heapless::Vec;

use crate::command::{Command, CommandError};
use crate::frame::{Frame, MAX_PAYLOAD_SIZE};

pub const OP_READ_STATE: u8 = 0x10;
pub const OP_WRITE_STATE: u8 = 0x11;
pub const OP_SUSPEND: u8 = 0x20;
pub const OP_RESUME: u8 = 0x21;
pub const OP_INTROSPECT: u8 = 0x30;
pub const OP_SET_THRESHOLD: u8 = 0x31;

/// A request addressed to one device slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    Command(Command),
    ReadState,
    /// Raw bytes; validation is left to the controller
    WriteState(Vec<u8, MAX_PAYLOAD_SIZE>),
    Suspend,
    Resume,
    Introspect,
    SetThreshold(i16),
}

impl Request {
    /// Parse a request from a frame
    pub fn from_frame(frame: &Frame) -> Result<Self, CommandError> {
        let payload = frame.payload.as_slice();
        let no_payload = |request: Request| {
            if payload.is_empty() {
                Ok(request)
            } else {
                Err(CommandError::PayloadSize {
                    expected: 0,
                    actual: payload.len() as u8,
                })
            }
        };

        match frame.opcode {
            OP_READ_STATE => no_payload(Request::ReadState),
            OP_WRITE_STATE => Ok(Request::WriteState(frame.payload.clone())),
            OP_SUSPEND => no_payload(Request::Suspend),
            OP_RESUME => no_payload(Request::Resume),
            OP_INTROSPECT => no_payload(Request::Introspect),
            OP_SET_THRESHOLD => match payload {
                [lo, hi] => Ok(Request::SetThreshold(i16::from_le_bytes([*lo, *hi]))),
                _ => Err(CommandError::PayloadSize {
                    expected: 2,
                    actual: payload.len() as u8,
                }),
            },
            opcode => Command::decode(opcode, payload).map(Request::Command),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::OP_RESET;

    #[test]
    fn test_command_passthrough() {
        let frame = Frame::empty(0, OP_RESET);
        assert_eq!(
            Request::from_frame(&frame),
            Ok(Request::Command(Command::Reset))
        );
    }

    #[test]
    fn test_write_state_keeps_raw_bytes() {
        let frame = Frame::new(1, OP_WRITE_STATE, b"10").unwrap();
        match Request::from_frame(&frame).unwrap() {
            Request::WriteState(bytes) => assert_eq!(bytes.as_slice(), b"10"),
            other => panic!("unexpected request {:?}", other),
        }
    }

    #[test]
    fn test_set_threshold() {
        let frame = Frame::new(2, OP_SET_THRESHOLD, &72i16.to_le_bytes()).unwrap();
        assert_eq!(Request::from_frame(&frame), Ok(Request::SetThreshold(72)));
    }

    #[test]
    fn test_suspend_with_payload_rejected() {
        let frame = Frame::new(0, OP_SUSPEND, &[1]).unwrap();
        assert!(matches!(
            Request::from_frame(&frame),
            Err(CommandError::PayloadSize { .. })
        ));
    }

    #[test]
    fn test_unknown_opcode() {
        let frame = Frame::empty(0, 0x7E);
        assert_eq!(
            Request::from_frame(&frame),
            Err(CommandError::UnknownOpcode(0x7E))
        );
    }
}
