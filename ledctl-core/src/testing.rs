//! Host doubles for the HAL traits

use heapless::{Deque, Vec};
use ledctl_hal::{
    LineError, LineId, LineProvider, OutputLine, ProportionalOutput, PwmError, SensorError,
    TemperatureSource,
};

use crate::config::{LedSpec, PinConfig};
use crate::device::{DeviceId, DeviceStore};
use crate::lifecycle::LifecycleManager;

pub type TestStore = DeviceStore<MockLine, MockPwm>;

#[derive(Debug)]
pub struct MockLine {
    id: LineId,
    level: bool,
}

impl MockLine {
    pub fn new(number: u8) -> Self {
        Self {
            id: LineId(number),
            level: false,
        }
    }
}

impl OutputLine for MockLine {
    fn set_high(&mut self) {
        self.level = true;
    }

    fn set_low(&mut self) {
        self.level = false;
    }

    fn is_set_high(&self) -> bool {
        self.level
    }

    fn id(&self) -> LineId {
        self.id
    }
}

#[derive(Debug, Default)]
pub struct MockPwm {
    enabled: bool,
    failing: bool,
}

impl MockPwm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            enabled: false,
            failing: true,
        }
    }
}

impl ProportionalOutput for MockPwm {
    fn enable(&mut self) -> Result<(), PwmError> {
        if self.failing {
            return Err(PwmError::Rejected);
        }
        self.enabled = true;
        Ok(())
    }

    fn disable(&mut self) -> Result<(), PwmError> {
        if self.failing {
            return Err(PwmError::Rejected);
        }
        self.enabled = false;
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }

    fn set_duty_percent(&mut self, percent: u8) -> Result<(), PwmError> {
        if percent > 100 {
            return Err(PwmError::InvalidDuty);
        }
        Ok(())
    }
}

/// Lines 0..30 exist; each can be held once
#[derive(Debug, Default)]
pub struct MockProvider {
    owned: [bool; 30],
    pub released: Vec<LineId, 32>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_owned(&self, id: LineId) -> bool {
        self.owned.get(usize::from(id.0)).copied().unwrap_or(false)
    }
}

impl LineProvider for MockProvider {
    type Line = MockLine;

    fn acquire(&mut self, id: LineId) -> Result<MockLine, LineError> {
        let owned = self
            .owned
            .get_mut(usize::from(id.0))
            .ok_or(LineError::Invalid)?;
        if *owned {
            return Err(LineError::Busy);
        }
        *owned = true;
        Ok(MockLine::new(id.0))
    }

    fn release(&mut self, line: MockLine) {
        if let Some(owned) = self.owned.get_mut(usize::from(line.id.0)) {
            *owned = false;
        }
        self.released.push(line.id).unwrap();
    }
}

/// Sensor replaying a fixed list of readings
pub struct ScriptedSensor {
    readings: Deque<Result<i16, SensorError>, 16>,
}

impl ScriptedSensor {
    pub fn new(readings: &[Result<i16, SensorError>]) -> Self {
        let mut queue = Deque::new();
        for reading in readings {
            queue.push_back(*reading).unwrap();
        }
        Self { readings: queue }
    }

    pub fn celsius(values: &[i16]) -> Self {
        let mut sensor = Self::new(&[]);
        for value in values {
            sensor.readings.push_back(Ok(*value)).unwrap();
        }
        sensor
    }
}

impl TemperatureSource for ScriptedSensor {
    fn read_celsius(&mut self) -> Result<i16, SensorError> {
        self.readings
            .pop_front()
            .unwrap_or(Err(SensorError::Unavailable))
    }
}

/// Register one LED on `line` at time `now` with default settings
pub fn register(store: &TestStore, provider: &mut MockProvider, line: u8, now: u64) -> DeviceId {
    let spec = LedSpec::new(PinConfig::new(line));
    LifecycleManager::new(store, provider)
        .register(&spec, None, now)
        .unwrap()
}

/// Register one LED with a proportional output attached
pub fn register_with_pwm(
    store: &TestStore,
    provider: &mut MockProvider,
    line: u8,
    pwm: MockPwm,
) -> DeviceId {
    let spec = LedSpec::new(PinConfig::new(line));
    LifecycleManager::new(store, provider)
        .register(&spec, Some(pwm), 0)
        .unwrap()
}
