//! Frame encoding and decoding for the command link.
//!
//! Frame format:
//! - START (1 byte): 0xA5 synchronization byte
//! - LENGTH (1 byte): payload length (0-64)
//! - DEVICE (1 byte): target device slot
//! - OPCODE (1 byte): request or reply identifier
//! - PAYLOAD (0-64 bytes): opcode-specific data
//! - CHECKSUM (1 byte): XOR of LENGTH, DEVICE, OPCODE and all PAYLOAD bytes

use heapless::Vec;

/// Frame synchronization byte
pub const FRAME_START: u8 = 0xA5;

/// Maximum payload size in bytes
pub const MAX_PAYLOAD_SIZE: usize = 64;

/// Header bytes preceding the payload (START, LENGTH, DEVICE, OPCODE)
const HEADER_SIZE: usize = 4;

/// Maximum complete frame size (header + payload + checksum)
pub const MAX_FRAME_SIZE: usize = HEADER_SIZE + MAX_PAYLOAD_SIZE + 1;

/// Errors that can occur during frame parsing or encoding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FrameError {
    /// Payload exceeds maximum allowed size
    PayloadTooLarge,
    /// Checksum mismatch
    InvalidChecksum,
    /// Length byte out of range
    InvalidLength,
    /// Buffer too small for encoding
    BufferTooSmall,
}

/// A parsed or constructed frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Target device slot
    pub device: u8,
    /// Request or reply identifier
    pub opcode: u8,
    /// Payload data
    pub payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl Frame {
    /// Create a new frame for `device` carrying `payload`
    pub fn new(device: u8, opcode: u8, payload: &[u8]) -> Result<Self, FrameError> {
        let payload = Vec::from_slice(payload).map_err(|_| FrameError::PayloadTooLarge)?;
        Ok(Self {
            device,
            opcode,
            payload,
        })
    }

    /// Create a frame with no payload
    pub fn empty(device: u8, opcode: u8) -> Self {
        Self {
            device,
            opcode,
            payload: Vec::new(),
        }
    }

    fn checksum(length: u8, device: u8, opcode: u8, payload: &[u8]) -> u8 {
        payload
            .iter()
            .fold(length ^ device ^ opcode, |acc, &byte| acc ^ byte)
    }

    /// Encode this frame into a byte buffer
    ///
    /// Returns the number of bytes written
    pub fn encode(&self, buffer: &mut [u8]) -> Result<usize, FrameError> {
        let body = self.payload.len();
        let frame_len = HEADER_SIZE + body + 1;
        if buffer.len() < frame_len {
            return Err(FrameError::BufferTooSmall);
        }

        let length = body as u8;
        buffer[0] = FRAME_START;
        buffer[1] = length;
        buffer[2] = self.device;
        buffer[3] = self.opcode;
        buffer[HEADER_SIZE..HEADER_SIZE + body].copy_from_slice(&self.payload);
        buffer[HEADER_SIZE + body] =
            Self::checksum(length, self.device, self.opcode, &self.payload);

        Ok(frame_len)
    }

    /// Encode this frame into a heapless Vec
    pub fn encode_to_vec(&self) -> Result<Vec<u8, MAX_FRAME_SIZE>, FrameError> {
        let mut buffer = [0u8; MAX_FRAME_SIZE];
        let len = self.encode(&mut buffer)?;
        Vec::from_slice(&buffer[..len]).map_err(|_| FrameError::BufferTooSmall)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ParseState {
    Sync,
    Length,
    Device,
    Opcode,
    Payload,
    Checksum,
}

/// Byte-at-a-time frame parser
///
/// Bytes outside a frame are skipped until the next START byte, so the
/// parser resynchronizes on its own after line noise or a bad checksum.
#[derive(Debug, Clone)]
pub struct FrameParser {
    state: ParseState,
    length: u8,
    device: u8,
    opcode: u8,
    payload: Vec<u8, MAX_PAYLOAD_SIZE>,
}

impl Default for FrameParser {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameParser {
    /// Create a new frame parser
    pub fn new() -> Self {
        Self {
            state: ParseState::Sync,
            length: 0,
            device: 0,
            opcode: 0,
            payload: Vec::new(),
        }
    }

    /// Drop any partially received frame
    pub fn reset(&mut self) {
        self.state = ParseState::Sync;
        self.length = 0;
        self.device = 0;
        self.opcode = 0;
        self.payload.clear();
    }

    /// Feed a single byte to the parser
    ///
    /// Returns `Ok(Some(frame))` when a complete valid frame is parsed,
    /// `Ok(None)` when more bytes are needed, or `Err` on parse error.
    pub fn feed(&mut self, byte: u8) -> Result<Option<Frame>, FrameError> {
        match self.state {
            ParseState::Sync => {
                if byte == FRAME_START {
                    self.state = ParseState::Length;
                }
            }
            ParseState::Length => {
                if usize::from(byte) > MAX_PAYLOAD_SIZE {
                    self.reset();
                    return Err(FrameError::InvalidLength);
                }
                self.length = byte;
                self.state = ParseState::Device;
            }
            ParseState::Device => {
                self.device = byte;
                self.state = ParseState::Opcode;
            }
            ParseState::Opcode => {
                self.opcode = byte;
                self.payload.clear();
                self.state = if self.length == 0 {
                    ParseState::Checksum
                } else {
                    ParseState::Payload
                };
            }
            ParseState::Payload => {
                // Length was bounded when it was read
                let _ = self.payload.push(byte);
                if self.payload.len() == usize::from(self.length) {
                    self.state = ParseState::Checksum;
                }
            }
            ParseState::Checksum => {
                let expected =
                    Frame::checksum(self.length, self.device, self.opcode, &self.payload);
                if byte != expected {
                    self.reset();
                    return Err(FrameError::InvalidChecksum);
                }

                let frame = Frame {
                    device: self.device,
                    opcode: self.opcode,
                    payload: core::mem::take(&mut self.payload),
                };
                self.reset();
                return Ok(Some(frame));
            }
        }
        Ok(None)
    }

    /// Feed multiple bytes to the parser
    ///
    /// Returns the first complete frame found, if any.
    /// Remaining bytes after a complete frame are not consumed.
    pub fn feed_bytes(&mut self, bytes: &[u8]) -> Result<Option<Frame>, FrameError> {
        for &byte in bytes {
            if let Some(frame) = self.feed(byte)? {
                return Ok(Some(frame));
            }
        }
        Ok(None)
    }
}
