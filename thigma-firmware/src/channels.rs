//! Inter-task communication channels
//!
//! Defines the static channels used for communication between Embassy tasks.
//! Uses embassy-sync primitives for safe async communication.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use embassy_sync::signal::Signal;
use heapless::{String, Vec};

use thigma_core::model::{DIR_LEN, MSG_LEN};
use thigma_core::status::PrinterStatus;

/// Capacity of one framed outbound chunk in bytes
pub const TX_CHUNK_LEN: usize = 160;

/// One framed command chunk headed for the UART
pub type TxChunk = Vec<u8, TX_CHUNK_LEN>;

/// Channel capacity for outbound chunks
const TX_CHANNEL_SIZE: usize = 4;

/// Channel capacity for UI requests
const REQUEST_CHANNEL_SIZE: usize = 4;

/// Requests from the UI toward the link engine
#[derive(Debug, Clone)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UiRequest {
    /// Fetch the listing of a directory on the board
    ListFiles(String<DIR_LEN>),
}

/// Snapshot of the link state for the UI task
#[derive(Debug, Clone, Copy)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct LinkStatus {
    pub connected: bool,
    pub status: PrinterStatus,
    pub bed_temp: f32,
    pub tool_temp: f32,
    pub fraction_printed: i32,
    pub file_count: usize,
}

/// Framed command chunks consumed by the TX task
pub static TX_CHANNEL: Channel<CriticalSectionRawMutex, TxChunk, TX_CHANNEL_SIZE> = Channel::new();

/// UI requests consumed by the link engine
pub static UI_REQUESTS: Channel<CriticalSectionRawMutex, UiRequest, REQUEST_CHANNEL_SIZE> =
    Channel::new();

/// Latest link state (updated by the link RX task)
pub static LINK_STATUS: Signal<CriticalSectionRawMutex, LinkStatus> = Signal::new();

/// Display message from the board
pub static PRINTER_MESSAGE: Signal<CriticalSectionRawMutex, String<MSG_LEN>> = Signal::new();

/// Beep request from the board: (frequency Hz, duration ms)
pub static BEEP_REQUEST: Signal<CriticalSectionRawMutex, (i32, i32)> = Signal::new();
