//! Receive-side byte queue with line-aware overrun recovery.
//!
//! Incoming link bytes land in an [`RxQueue`] before parsing, decoupling
//! bursty arrival from the polling cadence of the consumer. When the queue
//! fills, bytes are not dropped at random: the queue latches an overrun
//! flag and discards everything up to and including the next newline,
//! queueing that newline so the parser downstream resynchronizes on the
//! same boundary. One overloaded line is lost whole instead of several
//! lines being corrupted piecemeal.

use heapless::Deque;

/// Default queue capacity in bytes, a few full status records deep
pub const RX_QUEUE_LEN: usize = 512;

/// FIFO byte queue that drops whole lines on overflow
#[derive(Debug)]
pub struct RxQueue<const N: usize = RX_QUEUE_LEN> {
    queue: Deque<u8, N>,
    /// Dropping until the next newline fits
    overrun: bool,
}

impl<const N: usize> Default for RxQueue<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RxQueue<N> {
    pub const fn new() -> Self {
        Self {
            queue: Deque::new(),
            overrun: false,
        }
    }

    /// Append one byte; returns whether it was stored
    ///
    /// After an overflow every byte is discarded until a newline both
    /// arrives and fits, which clears the latch. The newline itself is
    /// stored so the consumer sees the line boundary.
    pub fn push(&mut self, byte: u8) -> bool {
        if self.overrun {
            if byte == b'\n' && self.queue.push_back(byte).is_ok() {
                self.overrun = false;
                return true;
            }
            return false;
        }
        if self.queue.push_back(byte).is_err() {
            self.overrun = true;
            return false;
        }
        true
    }

    /// Append a slice; returns how many bytes were stored
    pub fn push_slice(&mut self, bytes: &[u8]) -> usize {
        let mut stored = 0;
        for &byte in bytes {
            if self.push(byte) {
                stored += 1;
            }
        }
        stored
    }

    /// Remove and return the oldest byte
    pub fn pop(&mut self) -> Option<u8> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// An overflow happened and the queue is still discarding
    pub fn is_overrun(&self) -> bool {
        self.overrun
    }
}
