//! Device registration and teardown
//!
//! The lifecycle manager is the only place records are created or
//! destroyed. It owns the line provider, so a line handed to a record is
//! returned exactly once, when that record goes away.

use heapless::Vec;

use ledctl_hal::{LineId, LineProvider, OutputLine, ProportionalOutput};

use crate::config::{LedSpec, Topology};
use crate::device::{DeviceId, DeviceRecord, DeviceStore, MAX_DEVICES};
use crate::error::ControlError;
use crate::timer::Millis;

/// Outcome of registering a whole topology
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistrationReport {
    /// Devices created, in topology order
    pub registered: Vec<DeviceId, MAX_DEVICES>,
    /// Entries that could not be registered
    pub failed: Vec<(LineId, ControlError), MAX_DEVICES>,
}

pub struct LifecycleManager<'a, LP: LineProvider, P> {
    store: &'a DeviceStore<LP::Line, P>,
    provider: LP,
}

impl<'a, LP, P> LifecycleManager<'a, LP, P>
where
    LP: LineProvider,
    P: ProportionalOutput,
{
    pub fn new(store: &'a DeviceStore<LP::Line, P>, provider: LP) -> Self {
        Self { store, provider }
    }

    pub fn provider(&self) -> &LP {
        &self.provider
    }

    /// Register every topology entry, up to [`MAX_DEVICES`]
    ///
    /// Entries past the limit are ignored. A failing entry is reported and
    /// does not stop the others. `pwm_for` supplies the proportional output
    /// for entries that declare one.
    pub fn register_all(
        &mut self,
        topology: &Topology,
        mut pwm_for: impl FnMut(&LedSpec) -> Option<P>,
        now: Millis,
    ) -> RegistrationReport {
        let mut report = RegistrationReport::default();
        if topology.leds.len() > MAX_DEVICES {
            warn!(
                "topology lists {} LEDs, registering the first {}",
                topology.leds.len(),
                MAX_DEVICES
            );
        }

        for spec in topology.leds.iter().take(MAX_DEVICES) {
            let pwm = if spec.pwm { pwm_for(spec) } else { None };
            // Both vectors hold at most MAX_DEVICES entries
            match self.register(spec, pwm, now) {
                Ok(id) => {
                    let _ = report.registered.push(id);
                }
                Err(e) => {
                    let _ = report.failed.push((spec.pin.line(), e));
                }
            }
        }
        report
    }

    /// Register one LED
    ///
    /// Claims the line, drives it off, enables the proportional output and
    /// arms the first thermal sample.
    pub fn register(
        &mut self,
        spec: &LedSpec,
        pwm: Option<P>,
        now: Millis,
    ) -> Result<DeviceId, ControlError> {
        let line_id = spec.pin.line();
        let line = self.provider.acquire(line_id).map_err(|e| {
            error!("line {} unavailable: {:?}", line_id, e);
            ControlError::from(e)
        })?;

        let mut record = DeviceRecord::new(line, pwm, spec.trigger, spec.thermal, now);
        record.force_off();
        record.set_proportional(true);
        record.arm_thermal(now);

        match self.store.insert(record) {
            Ok(id) => {
                info!("registered line {} as slot {}", line_id, id.index());
                Ok(id)
            }
            Err(mut record) => {
                record.set_proportional(false);
                let (line, _) = record.into_parts();
                self.provider.release(line);
                warn!("no free slot for line {}", line_id);
                Err(ControlError::ResourceExhausted)
            }
        }
    }

    /// Tear one device down
    ///
    /// Under a single hold of the guard: cancel thermal work, cancel the
    /// blink timer, disable the proportional output, force the line off and
    /// take the record out of the store. The line then goes back to the
    /// provider.
    pub fn teardown(&mut self, id: DeviceId) -> Result<(), ControlError> {
        let record = self.store.remove_with(id, |rec| {
            rec.thermal_work.cancel();
            rec.blink.cancel();
            rec.set_proportional(false);
            rec.force_off();
        })?;

        let (line, _pwm) = record.into_parts();
        debug!("released line {}", line.id());
        self.provider.release(line);
        Ok(())
    }

    /// Tear down every registered device
    pub fn teardown_all(&mut self) {
        for id in self.store.ids() {
            let _ = self.teardown(id);
        }
    }

    /// Give the provider back
    pub fn into_provider(self) -> LP {
        self.provider
    }
}
