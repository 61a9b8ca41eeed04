//! Temperature sensors

mod die;

pub use die::{celsius_from_raw, AdcReader, DieTemperature};
