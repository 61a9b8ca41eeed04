//! RP2040 on-die temperature sensor
//!
//! The sensor is an ADC channel whose voltage falls as the die warms:
//!
//! ```text
//! T = 27 - (V - 0.706) / 0.001721
//! ```
//!
//! with a 12-bit ADC referenced to 3.3 V. Integer math only.

use ledctl_hal::{SensorError, TemperatureSource};

/// ADC reference in microvolts
const VREF_UV: i64 = 3_300_000;
/// ADC full scale (12-bit)
const ADC_MAX: u16 = 4096;
/// Sensor voltage at 27°C, microvolts
const V27_UV: i64 = 706_000;
/// Slope, microvolts per °C
const SLOPE_UV_PER_C: i64 = 1_721;

/// Plausible die temperatures
const MIN_C: i16 = -40;
const MAX_C: i16 = 150;

/// ADC reading trait for platform abstraction
pub trait AdcReader {
    /// Read a raw 12-bit sample (0-4095)
    fn read(&mut self) -> Result<u16, SensorError>;
}

/// Convert a raw 12-bit sample to whole degrees Celsius
pub fn celsius_from_raw(raw: u16) -> Result<i16, SensorError> {
    if raw >= ADC_MAX {
        return Err(SensorError::ConversionError);
    }
    let uv = i64::from(raw) * VREF_UV / i64::from(ADC_MAX);
    let milli_c = 27_000 - (uv - V27_UV) * 1_000 / SLOPE_UV_PER_C;
    let celsius = (milli_c + 500).div_euclid(1_000);

    i16::try_from(celsius)
        .ok()
        .filter(|c| (MIN_C..=MAX_C).contains(c))
        .ok_or(SensorError::OutOfRange)
}

/// Die temperature sensor on a blocking ADC
pub struct DieTemperature<A> {
    adc: A,
}

impl<A: AdcReader> DieTemperature<A> {
    pub fn new(adc: A) -> Self {
        Self { adc }
    }
}

impl<A: AdcReader> TemperatureSource for DieTemperature<A> {
    fn read_celsius(&mut self) -> Result<i16, SensorError> {
        celsius_from_raw(self.adc.read()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedAdc(Result<u16, SensorError>);

    impl AdcReader for FixedAdc {
        fn read(&mut self) -> Result<u16, SensorError> {
            self.0
        }
    }

    #[test]
    fn test_reference_point() {
        // 0.706 V is 27°C
        assert_eq!(celsius_from_raw(876), Ok(27));
    }

    #[test]
    fn test_warmer_die_reads_lower_voltage() {
        assert_eq!(celsius_from_raw(800), Ok(63));
        assert_eq!(celsius_from_raw(1000), Ok(-31));
    }

    #[test]
    fn test_implausible_readings() {
        assert_eq!(celsius_from_raw(0), Err(SensorError::OutOfRange));
        assert_eq!(celsius_from_raw(4095), Err(SensorError::OutOfRange));
        assert_eq!(celsius_from_raw(4096), Err(SensorError::ConversionError));
    }

    #[test]
    fn test_adc_error_passes_through() {
        let mut sensor = DieTemperature::new(FixedAdc(Err(SensorError::Unavailable)));
        assert_eq!(sensor.read_celsius(), Err(SensorError::Unavailable));

        let mut sensor = DieTemperature::new(FixedAdc(Ok(876)));
        assert_eq!(sensor.read_celsius(), Ok(27));
    }

    mod prop {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn higher_sample_never_reads_warmer(a in 0u16..4096, b in 0u16..4096) {
                let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
                if let (Ok(cool_side), Ok(warm_side)) = (celsius_from_raw(hi), celsius_from_raw(lo)) {
                    prop_assert!(cool_side <= warm_side);
                }
            }
        }
    }
}
