//! Link transmit task
//!
//! Writes framed command chunks to the board's UART.

use defmt::*;
use embassy_rp::uart::BufferedUartTx;
use embedded_io_async::Write;

use crate::channels::TX_CHANNEL;

/// Link TX task - sends framed commands to the board
#[embassy_executor::task]
pub async fn link_tx_task(mut tx: BufferedUartTx) {
    info!("Link TX task started");

    loop {
        let chunk = TX_CHANNEL.receive().await;
        if let Err(e) = tx.write_all(&chunk).await {
            warn!("UART write error: {:?}", e);
        } else {
            trace!("TX: {} bytes", chunk.len());
        }
    }
}
