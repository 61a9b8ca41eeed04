//! Command link task
//!
//! Receives request frames over UART, runs them against the device store and
//! writes the reply frame back.

use defmt::*;
use embassy_rp::uart::BufferedUart;
use embedded_io_async::{Read, Write};
use portable_atomic::Ordering;

use ledctl_core::control::handle_frame;
use ledctl_protocol::{Frame, FrameParser};

use crate::board::{self, LedStore};
use crate::channels::{BLINK_REARM, LINK_ERRORS};

/// Buffer size for UART receive
const RX_BUF_SIZE: usize = 64;

#[embassy_executor::task]
pub async fn control_task(store: &'static LedStore, mut uart: BufferedUart) {
    info!("Control task started");

    let mut parser = FrameParser::new();
    let mut buf = [0u8; RX_BUF_SIZE];

    loop {
        match uart.read(&mut buf).await {
            Ok(n) if n > 0 => {
                trace!("RX: {} bytes", n);

                for &byte in &buf[..n] {
                    match parser.feed(byte) {
                        Ok(Some(frame)) => respond(store, &mut uart, &frame).await,
                        Ok(None) => {}
                        Err(e) => {
                            LINK_ERRORS.fetch_add(1, Ordering::Relaxed);
                            warn!("Frame parse error: {:?}", e);
                        }
                    }
                }
            }
            Ok(_) => {}
            Err(e) => {
                warn!("UART read error: {:?}", e);
            }
        }
    }
}

async fn respond(store: &LedStore, uart: &mut BufferedUart, frame: &Frame) {
    debug!("Request {:#x} for slot {}", frame.opcode, frame.device);

    let reply = match handle_frame(store, frame, board::now_ms()) {
        Ok(reply) => reply,
        Err(e) => {
            warn!("Failed to build reply: {:?}", e);
            return;
        }
    };

    // The request may have changed the slot's blink deadline
    if let Some(rearm) = BLINK_REARM.get(usize::from(frame.device)) {
        rearm.signal(());
    }

    match reply.encode_to_vec() {
        Ok(bytes) => {
            if let Err(e) = uart.write_all(&bytes).await {
                warn!("UART write error: {:?}", e);
            }
        }
        Err(e) => warn!("Failed to encode reply: {:?}", e),
    }
}
