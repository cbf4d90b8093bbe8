//! Panel task
//!
//! The pendant's user-facing side: consumes link state snapshots and
//! one-shot items from the link task. Until the display and touch
//! drivers land this renders through defmt, but the data flow is the
//! one the panel will use.

use defmt::*;
use embassy_time::{Duration, Ticker};
use heapless::String;

use thigma_core::model::DIR_LEN;

use crate::channels::{UiRequest, BEEP_REQUEST, LINK_STATUS, PRINTER_MESSAGE, UI_REQUESTS};

/// Panel refresh interval
const UI_INTERVAL_MS: u64 = 500;

/// Directory listed when the printer connects
const GCODES_DIR: &str = "0:/gcodes";

/// UI task - renders link state and issues panel requests
#[embassy_executor::task]
pub async fn ui_task() {
    info!("UI task started");

    let mut ticker = Ticker::every(Duration::from_millis(UI_INTERVAL_MS));
    let mut was_connected = false;

    loop {
        ticker.next().await;

        if let Some(beep) = BEEP_REQUEST.try_take() {
            // TODO: route to a piezo driver once the buzzer is wired up
            info!("Beep {} Hz for {} ms", beep.0, beep.1);
        }

        if let Some(message) = PRINTER_MESSAGE.try_take() {
            info!("Printer message: {}", message.as_str());
        }

        if let Some(status) = LINK_STATUS.try_take() {
            if status.connected && !was_connected {
                // Fresh session: pull the job list for the files page.
                let mut dir: String<DIR_LEN> = String::new();
                let _ = dir.push_str(GCODES_DIR);
                if UI_REQUESTS.try_send(UiRequest::ListFiles(dir)).is_err() {
                    warn!("Request channel full, dropping listing request");
                }
            }
            was_connected = status.connected;

            if status.connected {
                info!(
                    "{:?} | bed {}°C tool {}°C | {}% | {} files",
                    status.status,
                    status.bed_temp,
                    status.tool_temp,
                    status.fraction_printed,
                    status.file_count,
                );
            } else {
                info!("Connecting to printer...");
            }
        }
    }
}
