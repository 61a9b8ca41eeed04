//! Thermal sampling task
//!
//! All devices share the die sensor. The task sleeps until the earliest
//! pending sample, then runs every cycle that is due.

use defmt::*;
use embassy_time::{Duration, Timer};

use ledctl_core::thermal::{ThermalMonitor, THERMAL_PERIOD_MS};
use ledctl_drivers::sensor::DieTemperature;

use crate::board::{self, DieAdc, LedStore};

#[embassy_executor::task]
pub async fn thermal_task(store: &'static LedStore, mut sensor: DieTemperature<DieAdc>) {
    info!("Thermal task started");

    let monitor = ThermalMonitor::new(store);

    loop {
        let now = board::now_ms();
        let mut earliest = None;

        for id in store.ids() {
            match monitor.run_cycle(id, &mut sensor, now) {
                Ok(Some(next)) => {
                    earliest = Some(earliest.map_or(next, |e: u64| e.min(next)));
                }
                Ok(None) => {}
                Err(e) => debug!("Slot {} skipped: {:?}", id.index(), e),
            }
        }

        match earliest {
            Some(at) => Timer::at(board::instant_at(at)).await,
            // Nothing scheduled; look again in a period in case sampling
            // was switched back on
            None => Timer::after(Duration::from_millis(u64::from(THERMAL_PERIOD_MS))).await,
        }
    }
}
