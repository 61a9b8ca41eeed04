//! Controller error kinds
//!
//! Returned synchronously by control calls. Background contexts (blink
//! timer, thermal task, edge handler) never surface these; they count
//! failures in the device statistics and carry on.

use ledctl_hal::{LineError, PwmError};
use ledctl_protocol::{CommandError, Status};

/// Errors reported to the caller of a control operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ControlError {
    /// Hardware line could not be claimed
    InvalidLine,
    /// No free device slot or other bounded resource
    ResourceExhausted,
    /// Value or symbol outside the accepted set
    InvalidArgument,
    /// Malformed request (wrong payload size, unwritable buffer)
    Fault,
    /// Request not recognized
    UnsupportedOperation,
    /// Device id is unknown or was torn down
    NoDevice,
}

impl From<LineError> for ControlError {
    fn from(_: LineError) -> Self {
        ControlError::InvalidLine
    }
}

impl From<PwmError> for ControlError {
    fn from(_: PwmError) -> Self {
        ControlError::Fault
    }
}

impl From<CommandError> for ControlError {
    fn from(err: CommandError) -> Self {
        match err {
            CommandError::UnknownOpcode(_) => ControlError::UnsupportedOperation,
            CommandError::PayloadSize { .. } | CommandError::BufferTooSmall => ControlError::Fault,
            CommandError::InvalidFlag => ControlError::InvalidArgument,
        }
    }
}

impl From<ControlError> for Status {
    fn from(err: ControlError) -> Self {
        match err {
            ControlError::InvalidLine => Status::InvalidLine,
            ControlError::ResourceExhausted => Status::ResourceExhausted,
            ControlError::InvalidArgument => Status::InvalidArgument,
            ControlError::Fault => Status::Fault,
            ControlError::UnsupportedOperation => Status::UnsupportedOperation,
            ControlError::NoDevice => Status::NoDevice,
        }
    }
}
