//! Output lines and the pin bank that owns them

mod bank;
mod gpio;

pub use bank::PinBank;
pub use gpio::{DirectionalPin, GpioLine};
