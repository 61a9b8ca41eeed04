//! Inter-task signals
//!
//! The control task changes blink settings behind the blink tasks' backs;
//! these signals make a sleeping blink task look at its deadline again.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use portable_atomic::AtomicU32;

use ledctl_core::MAX_DEVICES;

#[allow(clippy::declare_interior_mutable_const)]
const REARM: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// One per device slot, indexed by slot
pub static BLINK_REARM: [Signal<CriticalSectionRawMutex, ()>; MAX_DEVICES] = [REARM; MAX_DEVICES];

/// Frames dropped by the link parser (bad length or checksum)
pub static LINK_ERRORS: AtomicU32 = AtomicU32::new(0);
