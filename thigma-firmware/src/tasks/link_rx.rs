//! Link receive task
//!
//! Owns the poll engine. Bytes read from the board pass through the
//! overrun-aware receive queue into the engine, which updates the machine
//! model; on each tick the engine may emit one framed request, handed to
//! the TX task as a chunk. UI requests arrive over their channel and are
//! applied to the engine between reads.

use defmt::*;
use embassy_futures::select::{select3, Either3};
use embassy_rp::uart::BufferedUartRx;
use embassy_time::{Duration, Instant, Ticker};
use embedded_io_async::Read;

use thigma_core::poll::PollEngine;
use thigma_protocol::RxQueue;

use crate::channels::{
    LinkStatus, TxChunk, UiRequest, BEEP_REQUEST, LINK_STATUS, PRINTER_MESSAGE, TX_CHANNEL,
    UI_REQUESTS,
};

/// Buffer size for UART reads
const RX_BUF_SIZE: usize = 64;

/// Poll engine tick interval
const TICK_INTERVAL_MS: u64 = 100;

fn now_ms() -> u32 {
    Instant::now().as_millis() as u32
}

/// Link RX task - drives the poll engine
#[embassy_executor::task]
pub async fn link_rx_task(mut rx: BufferedUartRx) {
    info!("Link RX task started");

    let mut engine = PollEngine::new();
    let mut queue: RxQueue = RxQueue::new();
    let mut buf = [0u8; RX_BUF_SIZE];
    let mut ticker = Ticker::every(Duration::from_millis(TICK_INTERVAL_MS));
    let mut was_connected = false;

    loop {
        match select3(rx.read(&mut buf), ticker.next(), UI_REQUESTS.receive()).await {
            Either3::First(Ok(n)) if n > 0 => {
                trace!("RX: {} bytes", n);

                let was_overrun = queue.is_overrun();
                queue.push_slice(&buf[..n]);
                if queue.is_overrun() && !was_overrun {
                    warn!("RX queue overrun, dropping to next line");
                }

                let now = now_ms();
                while let Some(byte) = queue.pop() {
                    engine.feed_byte(now, byte);
                }
                publish_one_shots(&mut engine);
            }
            Either3::First(Ok(_)) => {
                // No bytes read, continue
            }
            Either3::First(Err(e)) => {
                warn!("UART read error: {:?}", e);
            }
            Either3::Second(()) => {
                let mut out = TxChunk::new();
                if engine.tick(now_ms(), &mut out) {
                    TX_CHANNEL.send(out).await;
                }
            }
            Either3::Third(request) => handle_request(&mut engine, request),
        }

        if engine.is_connected() != was_connected {
            was_connected = engine.is_connected();
            if was_connected {
                info!("Printer link up");
            } else {
                warn!("Printer link down");
            }
        }
        publish_status(&engine);
    }
}

/// Apply a UI request to the engine
fn handle_request(engine: &mut PollEngine, request: UiRequest) {
    match request {
        UiRequest::ListFiles(dir) => {
            debug!("UI requested listing of {}", dir.as_str());
            engine.request_files(&dir);
        }
    }
}

/// Hand one-shot model items to the UI side
fn publish_one_shots(engine: &mut PollEngine) {
    let model = engine.model_mut();
    if let Some((frequency, length)) = model.take_beep() {
        BEEP_REQUEST.signal((frequency, length));
    }
    if let Some(message) = model.take_message() {
        PRINTER_MESSAGE.signal(message);
    }
    if let Some(response) = model.take_response() {
        info!("Console: {}", response.as_str());
    }
    if model.take_files_changed() {
        debug!("File list refreshed: {} entries in {}", model.files().len(), model.files_dir());
    }
    if model.take_files_truncated() {
        warn!("File list incomplete, entries dropped");
    }
}

/// Publish the latest link state snapshot
fn publish_status(engine: &PollEngine) {
    let model = engine.model();
    LINK_STATUS.signal(LinkStatus {
        connected: engine.is_connected(),
        status: model.status(),
        bed_temp: model.current_temp(0),
        tool_temp: model.current_temp(1),
        fraction_printed: model.fraction_printed(),
        file_count: model.files().len(),
    });
}
