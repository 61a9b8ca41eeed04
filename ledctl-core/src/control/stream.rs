//! Byte-stream view of the status symbol
//!
//! Each open handle has its own offset. The content is a single byte, so
//! the first read returns it and every later read reports end of stream.

use ledctl_hal::{OutputLine, ProportionalOutput};

use super::ControlPlane;
use crate::device::DeviceId;
use crate::error::ControlError;

/// Length of the status content
const STATUS_LEN: usize = 1;

/// Open handle on one device's status symbol
pub struct StatusStream<'a, L, P> {
    control: ControlPlane<'a, L, P>,
    id: DeviceId,
    offset: usize,
}

impl<'a, L: OutputLine, P: ProportionalOutput> StatusStream<'a, L, P> {
    pub(crate) fn new(control: ControlPlane<'a, L, P>, id: DeviceId) -> Self {
        Self {
            control,
            id,
            offset: 0,
        }
    }

    /// Read into `buf`, returning the number of bytes copied (0 at end)
    pub fn read(&mut self, buf: &mut [u8]) -> Result<usize, ControlError> {
        if self.offset >= STATUS_LEN || buf.is_empty() {
            return Ok(0);
        }
        buf[0] = self.control.read_state(self.id)?;
        self.offset += 1;
        Ok(1)
    }

    /// Write through to the device; the offset is not affected
    pub fn write(&mut self, bytes: &[u8]) -> Result<usize, ControlError> {
        self.control.write_state(self.id, bytes)
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn device(&self) -> DeviceId {
        self.id
    }
}
