//! Trigger input task
//!
//! Waits on the configured edge of a device's trigger input and toggles the
//! LED once per edge. Debounce is not applied.

use defmt::*;
use embassy_rp::gpio::Flex;

use ledctl_core::trigger::{EdgeSelect, TriggerHandler};
use ledctl_core::{DeviceId, MAX_DEVICES};

use crate::board::LedStore;

#[embassy_executor::task(pool_size = MAX_DEVICES)]
pub async fn trigger_task(
    store: &'static LedStore,
    id: DeviceId,
    mut input: Flex<'static>,
    edges: EdgeSelect,
) {
    info!("Trigger task started for slot {} ({:?})", id.index(), edges);

    let handler = TriggerHandler::new(store);

    loop {
        match edges {
            EdgeSelect::Rising => input.wait_for_rising_edge().await,
            EdgeSelect::Falling => input.wait_for_falling_edge().await,
            EdgeSelect::Both => input.wait_for_any_edge().await,
        }

        if !handler.on_edge(id) {
            info!("Slot {} gone, trigger task exiting", id.index());
            return;
        }
        trace!("Slot {} toggled by edge", id.index());
    }
}
