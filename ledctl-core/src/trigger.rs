//! Edge trigger handler
//!
//! Each edge on the watched input toggles the LED. The handler runs from
//! interrupt-like context, so it only takes the (non-suspending) guard and
//! does a handful of writes.
//!
//! `debounce_ms` is stored and reported but never applied: every edge the
//! hardware reports is counted.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use ledctl_hal::{LineId, OutputLine, ProportionalOutput};

use crate::device::{DeviceId, DeviceRecord, DeviceStore};
use crate::error::ControlError;

/// Trigger wiring of one device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TriggerConfig {
    /// Watched input line, if any
    pub line: Option<LineId>,
    pub rising_edge: bool,
    pub falling_edge: bool,
    pub debounce_ms: u32,
}

/// Which edges the edge source should report
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum EdgeSelect {
    Rising,
    Falling,
    Both,
}

impl TriggerConfig {
    /// Watch `line` for rising edges
    pub const fn on_line(line: LineId) -> Self {
        Self {
            line: Some(line),
            rising_edge: true,
            falling_edge: false,
            debounce_ms: 0,
        }
    }

    /// Edges to listen for, or `None` if the trigger is inactive
    pub fn edges(&self) -> Option<EdgeSelect> {
        self.line?;
        match (self.rising_edge, self.falling_edge) {
            (true, true) => Some(EdgeSelect::Both),
            (true, false) => Some(EdgeSelect::Rising),
            (false, true) => Some(EdgeSelect::Falling),
            (false, false) => None,
        }
    }
}

impl<L: OutputLine, P: ProportionalOutput> DeviceRecord<L, P> {
    pub(crate) fn toggle_from_edge(&mut self) {
        self.logical_state = !self.logical_state;
        self.stats.switches = self.stats.switches.saturating_add(1);
        self.drive_output();
    }
}

/// Entry points for the edge context
pub struct TriggerHandler<'a, L, P> {
    store: &'a DeviceStore<L, P>,
}

impl<'a, L: OutputLine, P: ProportionalOutput> TriggerHandler<'a, L, P> {
    pub fn new(store: &'a DeviceStore<L, P>) -> Self {
        Self { store }
    }

    /// Handle one edge
    ///
    /// Returns false if the device is gone; the edge is dropped.
    pub fn on_edge(&self, id: DeviceId) -> bool {
        self.store.with(id, |rec| rec.toggle_from_edge()).is_ok()
    }

    pub fn config(&self, id: DeviceId) -> Result<TriggerConfig, ControlError> {
        self.store.with(id, |rec| rec.trigger_config())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::ControlPlane;
    use crate::testing::{register, MockProvider, TestStore};
    use crate::thermal::ThermalMonitor;
    use std::thread;

    #[test]
    fn test_edge_toggles_and_counts() {
        let store = TestStore::new();
        let mut provider = MockProvider::new();
        let id = register(&store, &mut provider, 6, 0);
        let trigger = TriggerHandler::new(&store);

        assert!(trigger.on_edge(id));
        assert_eq!(
            store.with(id, |rec| (rec.logical_state(), rec.output_level())),
            Ok((true, true))
        );
        assert!(trigger.on_edge(id));
        assert_eq!(store.with(id, |rec| rec.logical_state()), Ok(false));
        assert_eq!(store.with(id, |rec| rec.stats().switches), Ok(2));
    }

    #[test]
    fn test_edge_respects_thermal_override() {
        let store = TestStore::new();
        let mut provider = MockProvider::new();
        let id = register(&store, &mut provider, 6, 0);
        let monitor = ThermalMonitor::new(&store);
        monitor.begin_cycle(id, 1_000).unwrap();
        monitor.complete_cycle(id, Ok(100), 1_000).unwrap();

        TriggerHandler::new(&store).on_edge(id);
        assert_eq!(
            store.with(id, |rec| (rec.logical_state(), rec.output_level())),
            Ok((true, false))
        );
    }

    #[test]
    fn test_edge_on_removed_device_is_dropped() {
        let store = TestStore::new();
        let mut provider = MockProvider::new();
        let id = register(&store, &mut provider, 6, 0);
        crate::lifecycle::LifecycleManager::new(&store, &mut provider)
            .teardown(id)
            .unwrap();
        assert!(!TriggerHandler::new(&store).on_edge(id));
    }

    #[test]
    fn test_edge_selection() {
        let mut config = TriggerConfig::on_line(LineId(15));
        assert_eq!(config.edges(), Some(EdgeSelect::Rising));
        config.falling_edge = true;
        assert_eq!(config.edges(), Some(EdgeSelect::Both));
        config.rising_edge = false;
        assert_eq!(config.edges(), Some(EdgeSelect::Falling));
        assert_eq!(TriggerConfig::default().edges(), None);
    }

    #[test]
    fn test_concurrent_edges_and_writes() {
        const N: usize = 64;

        let store = TestStore::new();
        let mut provider = MockProvider::new();
        let id = register(&store, &mut provider, 6, 0);

        thread::scope(|s| {
            for i in 0..N {
                let store = &store;
                s.spawn(move || {
                    TriggerHandler::new(store).on_edge(id);
                });
                s.spawn(move || {
                    let symbol: &[u8] = if i % 2 == 0 { b"1" } else { b"0" };
                    ControlPlane::new(store).write_state(id, symbol).unwrap();
                });
            }
        });

        let (switches, logical, output) = store
            .with(id, |rec| {
                (rec.stats().switches, rec.logical_state(), rec.output_level())
            })
            .unwrap();
        assert_eq!(switches, N as u32);
        assert_eq!(logical, output);
    }
}
