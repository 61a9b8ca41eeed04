//! ledctl - GPIO LED controller firmware
//!
//! Main firmware binary for RP2040-based boards. The LED topology is
//! compiled in from `topology.toml`; every LED gets its own blink task and,
//! if it has a trigger input, an edge task. One task samples the die
//! temperature for all LEDs and one serves the command link on UART0.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::gpio::Flex;
use embassy_rp::peripherals::UART0;
use embassy_rp::uart::{BufferedInterruptHandler, Config as UartConfig, Uart};
use embassy_time::Timer;
use portable_atomic::Ordering;
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use ledctl_core::config::{parse_topology, Topology};
use ledctl_core::introspect;
use ledctl_core::lifecycle::LifecycleManager;
use ledctl_core::trigger::TriggerHandler;
use ledctl_core::DeviceStore;
use ledctl_drivers::sensor::DieTemperature;

use crate::board::{Bank, DieAdc, LedStore, GPIO_COUNT};
use crate::channels::LINK_ERRORS;

mod board;
mod channels;
mod tasks;

/// Embedded LED topology (compiled into firmware)
/// Edit topology.toml and rebuild to change the wiring
const TOPOLOGY: &str = include_str!("../topology.toml");

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
});

// Static cells for UART buffers (must live forever)
static TX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();

// Device store shared by every task
static STORE: StaticCell<LedStore> = StaticCell::new();

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("ledctl firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let topology = load_topology();
    info!("Topology lists {} LEDs", topology.leds.len());

    // Command link on UART0 (GPIO0 TX, GPIO1 RX), 115200 baud default
    let tx_buf = TX_BUF.init([0u8; 256]);
    let rx_buf = RX_BUF.init([0u8; 256]);
    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, UartConfig::default());
    let uart = uart.into_buffered(Irqs, tx_buf, rx_buf);
    info!("UART initialized for command link");

    let mut bank = board::pin_bank([
        None, // GPIO0: UART0 TX
        None, // GPIO1: UART0 RX
        Some(p.PIN_2.into()),
        Some(p.PIN_3.into()),
        Some(p.PIN_4.into()),
        Some(p.PIN_5.into()),
        Some(p.PIN_6.into()),
        Some(p.PIN_7.into()),
        Some(p.PIN_8.into()),
        Some(p.PIN_9.into()),
        Some(p.PIN_10.into()),
        Some(p.PIN_11.into()),
        Some(p.PIN_12.into()),
        Some(p.PIN_13.into()),
        Some(p.PIN_14.into()),
        Some(p.PIN_15.into()),
        Some(p.PIN_16.into()),
        Some(p.PIN_17.into()),
        Some(p.PIN_18.into()),
        Some(p.PIN_19.into()),
        Some(p.PIN_20.into()),
        Some(p.PIN_21.into()),
        Some(p.PIN_22.into()),
        Some(p.PIN_23.into()),
        Some(p.PIN_24.into()),
        Some(p.PIN_25.into()),
        Some(p.PIN_26.into()),
        Some(p.PIN_27.into()),
        Some(p.PIN_28.into()),
        Some(p.PIN_29.into()),
    ]);

    // Trigger inputs are claimed before any LED so an LED cannot take one
    let mut inputs = claim_trigger_inputs(&mut bank, &topology);

    let store: &'static LedStore = STORE.init(DeviceStore::new());
    let report = {
        let mut lifecycle = LifecycleManager::new(store, &mut bank);
        lifecycle.register_all(
            &topology,
            |spec| {
                warn!("{}: no PWM slice on this board", spec.name.as_str());
                None
            },
            board::now_ms(),
        )
    };
    for (line, e) in report.failed.iter() {
        error!("LED on line {} not registered: {:?}", line, e);
    }
    info!("{} LEDs registered", report.registered.len());

    let triggers = TriggerHandler::new(store);
    for &id in report.registered.iter() {
        if let Err(e) = spawner.spawn(tasks::blink_task(store, id)) {
            error!("Failed to spawn blink task for slot {}: {:?}", id.index(), e);
        }

        let Ok(config) = triggers.config(id) else {
            continue;
        };
        let (Some(line), Some(edges)) = (config.line, config.edges()) else {
            continue;
        };
        let input = inputs
            .get_mut(usize::from(line.number()))
            .and_then(Option::take);
        match input {
            Some(input) => {
                if let Err(e) = spawner.spawn(tasks::trigger_task(store, id, input, edges)) {
                    error!("Failed to spawn trigger task for slot {}: {:?}", id.index(), e);
                }
            }
            None => warn!("Trigger line {} unavailable for slot {}", line, id.index()),
        }
    }

    let sensor = DieTemperature::new(DieAdc::new(p.ADC, p.ADC_TEMP_SENSOR));
    if let Err(e) = spawner.spawn(tasks::thermal_task(store, sensor)) {
        error!("Failed to spawn thermal task: {:?}", e);
    }
    if let Err(e) = spawner.spawn(tasks::control_task(store, uart)) {
        error!("Failed to spawn control task: {:?}", e);
    }

    info!("All tasks spawned, firmware running");

    // Periodic status dump over RTT
    loop {
        Timer::after_secs(60).await;
        let now = board::now_ms();
        for id in store.ids() {
            if let Ok(snap) = introspect::snapshot(store, id, now) {
                debug!("Slot {}:\n{}", id.index(), Display2Format(&snap));
            }
        }
        trace!(
            "Main loop heartbeat, {} link errors",
            LINK_ERRORS.load(Ordering::Relaxed)
        );
    }
}

/// Parse the embedded topology
///
/// A broken topology leaves the board with no LEDs but the link still up.
fn load_topology() -> Topology {
    match parse_topology(TOPOLOGY) {
        Ok(topology) => topology,
        Err(e) => {
            error!("Embedded topology invalid at line {}: {:?}", e.line, e.kind);
            Topology::new()
        }
    }
}

/// Take every trigger pin out of the bank, indexed by GPIO number
fn claim_trigger_inputs(bank: &mut Bank, topology: &Topology) -> [Option<Flex<'static>>; GPIO_COUNT] {
    let mut inputs: [Option<Flex<'static>>; GPIO_COUNT] = core::array::from_fn(|_| None);

    for spec in topology.leds.iter() {
        if let Err(e) = bank.set_active_low(spec.pin.line(), spec.pin.inverted) {
            warn!("{}: bad LED line: {:?}", spec.name.as_str(), e);
        }

        let Some(line) = spec.trigger.line else {
            continue;
        };
        match bank.take(line) {
            Ok(pin) => {
                inputs[usize::from(line.number())] = Some(pin.into_input(spec.trigger_pull_up));
            }
            Err(e) => warn!("{}: trigger line {} unavailable: {:?}", spec.name.as_str(), line, e),
        }
    }

    inputs
}
