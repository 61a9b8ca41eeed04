//! Hardware line abstractions
//!
//! A line is a single addressable signal driving one LED. Lines are handed
//! out by a [`LineProvider`] and must be given back when the owning device
//! is torn down.

/// Opaque hardware line identifier (GPIO number on most boards)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LineId(pub u8);

impl LineId {
    /// Raw line number
    pub const fn number(self) -> u8 {
        self.0
    }
}

/// Errors when requesting a line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LineError {
    /// Line does not exist on this board
    Invalid,
    /// Line is already owned by another device
    Busy,
}

/// Binary output line
///
/// Writes are infallible: a line that can fail must be filtered out when it
/// is acquired, not when it is driven.
pub trait OutputLine {
    /// Drive the line to its active level (LED on)
    fn set_high(&mut self);

    /// Drive the line to its inactive level (LED off)
    fn set_low(&mut self);

    /// Drive the line to a specific level
    fn set_level(&mut self, on: bool) {
        if on {
            self.set_high();
        } else {
            self.set_low();
        }
    }

    /// Check if the line is currently driven active
    fn is_set_high(&self) -> bool;

    /// Identifier of the underlying hardware line
    fn id(&self) -> LineId;
}

/// Source of exclusively owned output lines
///
/// A line handed out by `acquire` cannot be acquired again until it is
/// passed back to `release`.
pub trait LineProvider {
    /// Line type handed out by this provider
    type Line: OutputLine;

    /// Request exclusive ownership of a line
    fn acquire(&mut self, id: LineId) -> Result<Self::Line, LineError>;

    /// Return a line to the provider
    fn release(&mut self, line: Self::Line);
}

impl<T: LineProvider + ?Sized> LineProvider for &mut T {
    type Line = T::Line;

    fn acquire(&mut self, id: LineId) -> Result<Self::Line, LineError> {
        T::acquire(self, id)
    }

    fn release(&mut self, line: Self::Line) {
        T::release(self, line)
    }
}
