//! Control-Link Protocol Engine
//!
//! This crate implements the serial protocol between the Thigma pendant and
//! the printer's motion-control board. One asynchronous link carries both
//! directions; the engine is a set of non-blocking state machines polled by
//! the firmware's main loop.
//!
//! # Inbound: status stream
//!
//! The board reports state as a restricted JSON-like object, one object per
//! newline-terminated record:
//!
//! ```text
//! {"status":"I","heaters":[21.3,18.9],"pos":[100.0,50.0,2.4],"sfactor":100}
//! ```
//!
//! Only flat objects are accepted: string values, numbers (no exponents),
//! and one-level arrays of either. [`ReceiveParser`] consumes the stream one
//! byte at a time and emits a *field event* per decoded value through a
//! [`ResponseSink`]; a raw newline resynchronizes the parser from any state,
//! so frame loss costs at most one record.
//!
//! # Outbound: checksummed command lines
//!
//! ```text
//! ┌──────┬─────────────┬─────┬──────────────┬────┐
//! │ "N0 "│ content     │ '*' │ checksum     │'\n'│
//! │ 3B   │ 0-n bytes   │ 1B  │ 2-3 digits   │ 1B │
//! └──────┴─────────────┴─────┴──────────────┴────┘
//! ```
//!
//! The checksum is the XOR of every header and content byte, rendered in
//! decimal by [`CommandEncoder`]. The synthetic `N0` line number lets the
//! board validate the frame with its stock line-checking code.
//!
//! # Scheduling
//!
//! [`RequestTimer`] decides *when* it is safe to repeat a query: each record
//! retries on a fixed delay but only while an application-supplied readiness
//! predicate holds, which is the engine's only backpressure mechanism
//! against a board that stops answering mid-operation.

#![no_std]
#![deny(unsafe_code)]

pub mod dispatch;
pub mod encoder;
pub mod parser;
pub mod ring;
pub mod timer;

pub use dispatch::{decode_float, decode_int, FieldTable};
pub use encoder::{ByteSink, CommandEncoder};
pub use parser::{ParserState, ReceiveParser, ResponseSink, FIELD_ID_LEN, FIELD_VALUE_LEN};
pub use ring::{RxQueue, RX_QUEUE_LEN};
pub use timer::{RequestTimer, TimerState};
