//! RP2040 board glue
//!
//! Wraps embassy-rp peripherals in the traits the driver and core crates
//! work with.

use core::convert::Infallible;

use embassy_rp::adc::{self, Adc, Blocking, Channel};
use embassy_rp::gpio::{AnyPin, Flex, Pull};
use embassy_rp::peripherals::{ADC, ADC_TEMP_SENSOR};
use embassy_rp::Peri;
use embassy_time::Instant;
use embedded_hal::digital::{ErrorType, OutputPin};

use ledctl_core::{DeviceStore, Millis};
use ledctl_drivers::line::{DirectionalPin, GpioLine, PinBank};
use ledctl_drivers::pwm::NoProportionalOutput;
use ledctl_drivers::sensor::AdcReader;
use ledctl_hal::SensorError;

/// User GPIOs on the RP2040 (GPIO0-GPIO29)
pub const GPIO_COUNT: usize = 30;

/// GPIO usable as LED output or trigger input
pub struct BoardPin(Flex<'static>);

impl BoardPin {
    pub fn new(pin: Peri<'static, AnyPin>) -> Self {
        Self(Flex::new(pin))
    }

    /// Hand the pin over to an edge-watching task
    pub fn into_input(self, pull_up: bool) -> Flex<'static> {
        let mut flex = self.0;
        flex.set_pull(if pull_up { Pull::Up } else { Pull::None });
        flex.set_as_input();
        flex
    }
}

impl ErrorType for BoardPin {
    type Error = Infallible;
}

impl OutputPin for BoardPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.0.set_low();
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.0.set_high();
        Ok(())
    }
}

impl DirectionalPin for BoardPin {
    fn set_as_output(&mut self) {
        self.0.set_as_output();
    }

    fn set_as_input(&mut self) {
        self.0.set_pull(Pull::None);
        self.0.set_as_input();
    }
}

pub type Bank = PinBank<BoardPin, GPIO_COUNT>;

/// No PWM slice is routed to the LED pins on this board
pub type LedStore = DeviceStore<GpioLine<BoardPin>, NoProportionalOutput>;

/// Build the pin bank; `None` entries are reserved for other peripherals
pub fn pin_bank(pins: [Option<Peri<'static, AnyPin>>; GPIO_COUNT]) -> Bank {
    PinBank::with_reserved(pins.map(|pin| pin.map(BoardPin::new)))
}

/// On-die temperature sensor on the blocking ADC
pub struct DieAdc {
    adc: Adc<'static, Blocking>,
    channel: Channel<'static>,
}

impl DieAdc {
    pub fn new(adc: Peri<'static, ADC>, sensor: Peri<'static, ADC_TEMP_SENSOR>) -> Self {
        Self {
            adc: Adc::new_blocking(adc, adc::Config::default()),
            channel: Channel::new_temp_sensor(sensor),
        }
    }
}

impl AdcReader for DieAdc {
    fn read(&mut self) -> Result<u16, SensorError> {
        self.adc
            .blocking_read(&mut self.channel)
            .map_err(|_| SensorError::Unavailable)
    }
}

/// Milliseconds since boot, the time base handed to the core crate
pub fn now_ms() -> Millis {
    Instant::now().as_millis()
}

pub fn instant_at(at: Millis) -> Instant {
    Instant::from_millis(at)
}
