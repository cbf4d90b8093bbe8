//! Board-agnostic control logic for the touch pendant
//!
//! This crate sits between the wire protocol and the hardware crates. It
//! contains everything that can be reasoned about (and tested) without a
//! serial port attached:
//!
//! - Printer status codes and what they permit
//! - The machine model the UI renders from
//! - Field tables routing parsed values into the model
//! - The polling engine that decides which request goes out next
//!
//! The [`poll::PollEngine`] is the top of the stack: feed it link bytes
//! and a millisecond clock, take framed commands back out.

#![no_std]
#![deny(unsafe_code)]

pub mod fields;
pub mod model;
pub mod poll;
pub mod status;
