//! Controller commands
//!
//! Payloads are fixed-size little-endian structures. Implemented commands:
//! - `SET_BRIGHTNESS` (1): i32 brightness
//! - `SET_BLINK` (2): u32 on delay, u32 off delay (milliseconds)
//! - `RESET` (3): no payload
//!
//! Reserved commands, decoded but not yet acted upon by the controller:
//! - `SET_PWM` (4): u32 period, u32 duty cycle, u8 hardware flag
//! - `GET_STATS` (5): no payload
//! - `SET_TRIGGER` (6): i32 line, u8 rising, u8 falling, u32 debounce
//! - `SET_THERMAL` (7): i32 threshold, i32 hysteresis, u8 auto-throttle

pub const OP_SET_BRIGHTNESS: u8 = 1;
pub const OP_SET_BLINK: u8 = 2;
pub const OP_RESET: u8 = 3;
pub const OP_SET_PWM: u8 = 4;
pub const OP_GET_STATS: u8 = 5;
pub const OP_SET_TRIGGER: u8 = 6;
pub const OP_SET_THERMAL: u8 = 7;

/// Largest command payload (SET_TRIGGER)
pub const MAX_COMMAND_PAYLOAD: usize = 10;

/// Errors decoding a command payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum CommandError {
    /// Opcode outside the implemented and reserved set
    UnknownOpcode(u8),
    /// Payload size does not match the opcode's structure
    PayloadSize { expected: u8, actual: u8 },
    /// A flag byte was neither 0 nor 1
    InvalidFlag,
    /// Output buffer too small for encoding
    BufferTooSmall,
}

/// Blink timing parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BlinkParams {
    /// Time spent on, in milliseconds
    pub delay_on_ms: u32,
    /// Time spent off, in milliseconds
    pub delay_off_ms: u32,
}

/// Proportional output parameters (reserved)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PwmParams {
    pub period_ns: u32,
    pub duty_cycle: u32,
    pub hardware_pwm: bool,
}

/// External trigger parameters (reserved)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct TriggerParams {
    /// Watched line; negative disables the trigger
    pub line: i32,
    pub rising_edge: bool,
    pub falling_edge: bool,
    pub debounce_ms: u32,
}

/// Thermal policy parameters (reserved)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct ThermalParams {
    pub threshold_c: i32,
    pub hysteresis_c: i32,
    pub auto_throttle: bool,
}

/// A decoded controller command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Command {
    /// Set brightness; range is checked by the controller
    SetBrightness(i32),
    /// Start blinking
    SetBlink(BlinkParams),
    /// Stop blinking and force the LED off
    Reset,
    /// Reserved: configure the proportional output
    SetPwm(PwmParams),
    /// Reserved: fetch statistics
    GetStats,
    /// Reserved: configure the external trigger
    SetTrigger(TriggerParams),
    /// Reserved: configure the thermal policy
    SetThermal(ThermalParams),
}

/// Sequential little-endian reader over an exactly sized payload
struct Fields<'a> {
    bytes: &'a [u8],
}

impl<'a> Fields<'a> {
    fn exact(payload: &'a [u8], expected: usize) -> Result<Self, CommandError> {
        if payload.len() != expected {
            return Err(CommandError::PayloadSize {
                expected: expected as u8,
                actual: payload.len().min(u8::MAX as usize) as u8,
            });
        }
        Ok(Self { bytes: payload })
    }

    fn take<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        out.copy_from_slice(&self.bytes[..N]);
        self.bytes = &self.bytes[N..];
        out
    }

    fn u32(&mut self) -> u32 {
        u32::from_le_bytes(self.take())
    }

    fn i32(&mut self) -> i32 {
        i32::from_le_bytes(self.take())
    }

    fn flag(&mut self) -> Result<bool, CommandError> {
        match self.take::<1>()[0] {
            0 => Ok(false),
            1 => Ok(true),
            _ => Err(CommandError::InvalidFlag),
        }
    }
}

/// Little-endian writer used when building command payloads
struct Writer<'a> {
    buffer: &'a mut [u8],
    len: usize,
}

impl<'a> Writer<'a> {
    fn put(&mut self, bytes: &[u8]) -> Result<(), CommandError> {
        let end = self.len + bytes.len();
        if end > self.buffer.len() {
            return Err(CommandError::BufferTooSmall);
        }
        self.buffer[self.len..end].copy_from_slice(bytes);
        self.len = end;
        Ok(())
    }
}

impl Command {
    /// Wire opcode for this command
    pub fn opcode(&self) -> u8 {
        match self {
            Command::SetBrightness(_) => OP_SET_BRIGHTNESS,
            Command::SetBlink(_) => OP_SET_BLINK,
            Command::Reset => OP_RESET,
            Command::SetPwm(_) => OP_SET_PWM,
            Command::GetStats => OP_GET_STATS,
            Command::SetTrigger(_) => OP_SET_TRIGGER,
            Command::SetThermal(_) => OP_SET_THERMAL,
        }
    }

    /// Check if this command is recognized but not yet wired to the controller
    pub fn is_reserved(&self) -> bool {
        matches!(
            self,
            Command::SetPwm(_)
                | Command::GetStats
                | Command::SetTrigger(_)
                | Command::SetThermal(_)
        )
    }

    /// Decode a command from its opcode and payload
    pub fn decode(opcode: u8, payload: &[u8]) -> Result<Self, CommandError> {
        match opcode {
            OP_SET_BRIGHTNESS => {
                let mut f = Fields::exact(payload, 4)?;
                Ok(Command::SetBrightness(f.i32()))
            }
            OP_SET_BLINK => {
                let mut f = Fields::exact(payload, 8)?;
                Ok(Command::SetBlink(BlinkParams {
                    delay_on_ms: f.u32(),
                    delay_off_ms: f.u32(),
                }))
            }
            OP_RESET => {
                Fields::exact(payload, 0)?;
                Ok(Command::Reset)
            }
            OP_SET_PWM => {
                let mut f = Fields::exact(payload, 9)?;
                Ok(Command::SetPwm(PwmParams {
                    period_ns: f.u32(),
                    duty_cycle: f.u32(),
                    hardware_pwm: f.flag()?,
                }))
            }
            OP_GET_STATS => {
                Fields::exact(payload, 0)?;
                Ok(Command::GetStats)
            }
            OP_SET_TRIGGER => {
                let mut f = Fields::exact(payload, MAX_COMMAND_PAYLOAD)?;
                Ok(Command::SetTrigger(TriggerParams {
                    line: f.i32(),
                    rising_edge: f.flag()?,
                    falling_edge: f.flag()?,
                    debounce_ms: f.u32(),
                }))
            }
            OP_SET_THERMAL => {
                let mut f = Fields::exact(payload, 9)?;
                Ok(Command::SetThermal(ThermalParams {
                    threshold_c: f.i32(),
                    hysteresis_c: f.i32(),
                    auto_throttle: f.flag()?,
                }))
            }
            other => Err(CommandError::UnknownOpcode(other)),
        }
    }

    /// Encode the payload of this command into `buffer`
    ///
    /// Returns the number of bytes written.
    pub fn encode_payload(&self, buffer: &mut [u8]) -> Result<usize, CommandError> {
        let mut w = Writer { buffer, len: 0 };
        match self {
            Command::SetBrightness(value) => w.put(&value.to_le_bytes())?,
            Command::SetBlink(p) => {
                w.put(&p.delay_on_ms.to_le_bytes())?;
                w.put(&p.delay_off_ms.to_le_bytes())?;
            }
            Command::Reset | Command::GetStats => {}
            Command::SetPwm(p) => {
                w.put(&p.period_ns.to_le_bytes())?;
                w.put(&p.duty_cycle.to_le_bytes())?;
                w.put(&[p.hardware_pwm as u8])?;
            }
            Command::SetTrigger(p) => {
                w.put(&p.line.to_le_bytes())?;
                w.put(&[p.rising_edge as u8, p.falling_edge as u8])?;
                w.put(&p.debounce_ms.to_le_bytes())?;
            }
            Command::SetThermal(p) => {
                w.put(&p.threshold_c.to_le_bytes())?;
                w.put(&p.hysteresis_c.to_le_bytes())?;
                w.put(&[p.auto_throttle as u8])?;
            }
        }
        Ok(w.len)
    }
}
