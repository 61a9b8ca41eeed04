//! Blink timer task
//!
//! One task per device slot. Sleeps until the slot's blink deadline and
//! lets the core toggle the LED; with no deadline it parks until the
//! control task rearms it.

use defmt::*;
use embassy_futures::select::{select, Either};
use embassy_time::Timer;

use ledctl_core::blink::BlinkEngine;
use ledctl_core::{DeviceId, MAX_DEVICES};

use crate::board::{self, LedStore};
use crate::channels::BLINK_REARM;

#[embassy_executor::task(pool_size = MAX_DEVICES)]
pub async fn blink_task(store: &'static LedStore, id: DeviceId) {
    let slot = id.index();
    info!("Blink task started for slot {}", slot);

    let engine = BlinkEngine::new(store);
    let rearm = &BLINK_REARM[slot];

    loop {
        let deadline = match engine.deadline(id) {
            Ok(deadline) => deadline,
            Err(_) => {
                info!("Slot {} gone, blink task exiting", slot);
                return;
            }
        };

        match deadline {
            Some(at) => match select(Timer::at(board::instant_at(at)), rearm.wait()).await {
                Either::First(()) => {
                    let next = engine.on_timer(id, board::now_ms());
                    trace!("Slot {} blink tick, next {:?}", slot, next);
                }
                Either::Second(()) => trace!("Slot {} blink rearmed", slot),
            },
            None => rearm.wait().await,
        }
    }
}
