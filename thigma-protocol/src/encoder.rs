//! Line framing for the outbound command stream.
//!
//! Every non-empty line sent to the board is wrapped in the classic
//! G-code link frame:
//!
//! ```text
//! +-----+-----+---------+-----+----------+------+
//! | 'N' | '0' | content | '*' | checksum | '\n' |
//! +-----+-----+---------+-----+----------+------+
//!    |     |                        |
//!    |     |                        +-- XOR of all bytes left of '*',
//!    |     |                            printed in decimal (2-3 digits)
//!    |     +-- line number, always 0 (the peer does not track ours)
//!    +-- header, lazily emitted with the first content byte
//! ```
//!
//! The checksum covers the header and the content but not the `*`, the
//! checksum digits or the terminating newline. A newline with no content
//! before it passes through bare, without header or checksum; the peer
//! treats it as a keep-alive.
//!
//! [`CommandEncoder`] holds only the running checksum and a line-open
//! flag, so a command may be streamed out piecewise with
//! [`send_byte`](CommandEncoder::send_byte), [`send_str`](CommandEncoder::send_str)
//! and [`send_int`](CommandEncoder::send_int); the frame closes when a
//! `\n` goes through.

/// Destination for encoded bytes
///
/// Writes are infallible by contract: an implementation that runs out of
/// room drops the byte. The link layer recovers from a clipped command the
/// same way it recovers from line noise, via the peer's checksum.
pub trait ByteSink {
    fn put(&mut self, byte: u8);
}

/// Bytes beyond the buffer capacity are dropped.
impl<const N: usize> ByteSink for heapless::Vec<u8, N> {
    fn put(&mut self, byte: u8) {
        let _ = self.push(byte);
    }
}

/// Streaming encoder producing checksummed line frames
#[derive(Debug)]
pub struct CommandEncoder {
    /// XOR fold of the current line, header included
    checksum: u8,
    /// Header emitted, at least one content byte on the wire
    line_open: bool,
}

impl Default for CommandEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl CommandEncoder {
    /// Create an encoder with no line in progress
    pub const fn new() -> Self {
        Self {
            checksum: 0,
            line_open: false,
        }
    }

    /// Encode a single byte
    ///
    /// The first content byte of a line pushes the `N0 ` header out ahead
    /// of itself. A `\n` terminates the frame and resets the checksum.
    pub fn send_byte<S: ByteSink>(&mut self, sink: &mut S, byte: u8) {
        if byte == b'\n' {
            self.finish_line(sink);
        } else {
            if !self.line_open {
                self.line_open = true;
                self.put_checksummed(sink, b'N');
                self.put_checksummed(sink, b'0');
                self.put_checksummed(sink, b' ');
            }
            self.put_checksummed(sink, byte);
        }
    }

    /// Encode a string slice; embedded newlines close frames as usual
    pub fn send_str<S: ByteSink>(&mut self, sink: &mut S, text: &str) {
        for byte in text.bytes() {
            self.send_byte(sink, byte);
        }
    }

    /// Encode a string slice and terminate the frame
    pub fn send_line<S: ByteSink>(&mut self, sink: &mut S, text: &str) {
        self.send_str(sink, text);
        self.send_byte(sink, b'\n');
    }

    /// Encode a signed integer in decimal
    pub fn send_int<S: ByteSink>(&mut self, sink: &mut S, value: i32) {
        if value < 0 {
            self.send_byte(sink, b'-');
        }
        // i32::MIN has no positive counterpart, hence the unsigned walk.
        let mut remaining = value.unsigned_abs();
        let mut digits = [0u8; 10];
        let mut count = 0;
        loop {
            digits[count] = b'0' + (remaining % 10) as u8;
            remaining /= 10;
            count += 1;
            if remaining == 0 {
                break;
            }
        }
        while count > 0 {
            count -= 1;
            self.send_byte(sink, digits[count]);
        }
    }

    fn put_checksummed<S: ByteSink>(&mut self, sink: &mut S, byte: u8) {
        sink.put(byte);
        self.checksum ^= byte;
    }

    fn finish_line<S: ByteSink>(&mut self, sink: &mut S) {
        if self.line_open {
            sink.put(b'*');
            let cs = self.checksum;
            if cs >= 100 {
                sink.put(b'0' + cs / 100);
            }
            sink.put(b'0' + (cs / 10) % 10);
            sink.put(b'0' + cs % 10);
        }
        sink.put(b'\n');
        self.checksum = 0;
        self.line_open = false;
    }
}
