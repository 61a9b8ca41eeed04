//! Device records and the bounded store that owns them

mod record;
mod store;

pub use record::{DeviceRecord, LedStats};
pub use store::{DeviceId, DeviceStore, MAX_DEVICES};
