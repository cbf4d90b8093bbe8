//! Polled request scheduling.
//!
//! Each periodic request to the board gets a [`RequestTimer`]. The link
//! task polls every timer with [`process`](RequestTimer::process); a timer
//! whose delay has elapsed re-arms itself as *ready* and transmits as soon
//! as the caller's gate allows it. The gate is how the caller expresses
//! "the board is not accepting commands right now" (still connecting, or
//! a file transfer owns the line) without the timer losing its place: a
//! ready timer stays ready until it actually fires.
//!
//! Timestamps are millisecond counts that wrap at `u32::MAX`; elapsed
//! time is computed with wrapping subtraction so a rollover mid-delay is
//! harmless.

use heapless::String;

use crate::encoder::{ByteSink, CommandEncoder};

/// Capacity for a timer's dynamic argument, sized for the longest
/// directory path plus surrounding quotes
pub const ARG_LEN: usize = 104;

/// Scheduling state of a [`RequestTimer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TimerState {
    /// Not scheduled; `process` does nothing
    Stopped,
    /// Waiting for the delay to elapse since the last send
    Running,
    /// Due; fires on the next `process` call whose gate is open
    Ready,
}

/// One periodic request: a command, a repeat delay and a state
#[derive(Debug)]
pub struct RequestTimer {
    state: TimerState,
    start_ms: u32,
    delay_ms: u32,
    command: &'static str,
    argument: Option<String<ARG_LEN>>,
}

impl RequestTimer {
    /// Create a stopped timer for `command`, re-sent every `delay_ms`
    pub const fn new(delay_ms: u32, command: &'static str) -> Self {
        Self {
            state: TimerState::Stopped,
            start_ms: 0,
            delay_ms,
            command,
            argument: None,
        }
    }

    pub fn state(&self) -> TimerState {
        self.state
    }

    /// Make the timer due immediately, regardless of its current state
    pub fn set_pending(&mut self) {
        self.state = TimerState::Ready;
    }

    /// Cancel the timer; it stays off until the next `set_pending`
    pub fn stop(&mut self) {
        self.state = TimerState::Stopped;
    }

    /// Replace the text appended after the command on each send
    ///
    /// An argument longer than [`ARG_LEN`] is dropped entirely rather
    /// than truncated, so a mangled path is never transmitted.
    pub fn set_argument(&mut self, text: &str) {
        self.argument = None;
        let mut argument = String::new();
        if argument.push_str(text).is_ok() {
            self.argument = Some(argument);
        }
    }

    /// Advance the timer and transmit if due and allowed
    ///
    /// Returns `true` when a command was framed into `sink`. `ok_to_send`
    /// is the caller's gate; while it is false an elapsed timer holds in
    /// the ready state instead of rewinding.
    pub fn process<S: ByteSink>(
        &mut self,
        now_ms: u32,
        ok_to_send: bool,
        encoder: &mut CommandEncoder,
        sink: &mut S,
    ) -> bool {
        if self.state == TimerState::Running && now_ms.wrapping_sub(self.start_ms) > self.delay_ms {
            self.state = TimerState::Ready;
        }
        if self.state == TimerState::Ready && ok_to_send {
            encoder.send_str(sink, self.command);
            if let Some(argument) = &self.argument {
                encoder.send_str(sink, argument);
            }
            encoder.send_byte(sink, b'\n');
            self.start_ms = now_ms;
            self.state = TimerState::Running;
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use heapless::Vec;

    type Wire = Vec<u8, 256>;

    fn framed(line: &str) -> Wire {
        let mut enc = CommandEncoder::new();
        let mut wire = Wire::new();
        enc.send_line(&mut wire, line);
        wire
    }

    #[test]
    fn test_stopped_timer_never_fires() {
        let mut timer = RequestTimer::new(1000, "M408 S1");
        let mut enc = CommandEncoder::new();
        let mut wire = Wire::new();
        for now in [0, 5_000, 1_000_000] {
            assert!(!timer.process(now, true, &mut enc, &mut wire));
        }
        assert!(wire.is_empty());
    }

    #[test]
    fn test_pending_fires_once_gate_opens() {
        let mut timer = RequestTimer::new(1000, "M408 S1");
        let mut enc = CommandEncoder::new();
        let mut wire = Wire::new();

        timer.set_pending();
        assert!(!timer.process(100, false, &mut enc, &mut wire));
        assert!(wire.is_empty());
        assert_eq!(timer.state(), TimerState::Ready);

        assert!(timer.process(400, true, &mut enc, &mut wire));
        assert_eq!(wire, framed("M408 S1"));
        assert_eq!(timer.state(), TimerState::Running);
    }

    #[test]
    fn test_repeats_after_strict_delay() {
        let mut timer = RequestTimer::new(1000, "M408 S1");
        let mut enc = CommandEncoder::new();
        let mut wire = Wire::new();

        timer.set_pending();
        assert!(timer.process(0, true, &mut enc, &mut wire));
        wire.clear();

        // Exactly the delay is not enough.
        assert!(!timer.process(1000, true, &mut enc, &mut wire));
        assert!(timer.process(1001, true, &mut enc, &mut wire));
        assert_eq!(wire, framed("M408 S1"));
    }

    #[test]
    fn test_elapsed_timer_holds_ready_while_gated() {
        let mut timer = RequestTimer::new(100, "M36");
        let mut enc = CommandEncoder::new();
        let mut wire = Wire::new();

        timer.set_pending();
        assert!(timer.process(0, true, &mut enc, &mut wire));
        wire.clear();

        assert!(!timer.process(500, false, &mut enc, &mut wire));
        assert_eq!(timer.state(), TimerState::Ready);
        assert!(!timer.process(9_000, false, &mut enc, &mut wire));
        assert!(timer.process(9_500, true, &mut enc, &mut wire));
        assert_eq!(wire, framed("M36"));
    }

    #[test]
    fn test_stop_cancels_running_timer() {
        let mut timer = RequestTimer::new(100, "M408 S1");
        let mut enc = CommandEncoder::new();
        let mut wire = Wire::new();

        timer.set_pending();
        assert!(timer.process(0, true, &mut enc, &mut wire));
        timer.stop();
        wire.clear();

        assert!(!timer.process(10_000, true, &mut enc, &mut wire));
        assert!(wire.is_empty());
        assert_eq!(timer.state(), TimerState::Stopped);
    }

    #[test]
    fn test_clock_wraparound() {
        let mut timer = RequestTimer::new(1000, "M408 S1");
        let mut enc = CommandEncoder::new();
        let mut wire = Wire::new();

        timer.set_pending();
        assert!(timer.process(u32::MAX - 100, true, &mut enc, &mut wire));
        wire.clear();

        // 900 ms after the wrap is 1001 ms elapsed.
        assert!(timer.process(900, true, &mut enc, &mut wire));
        assert_eq!(wire, framed("M408 S1"));
    }

    #[test]
    fn test_argument_appended_to_command() {
        let mut timer = RequestTimer::new(2000, "M20 S2 P");
        let mut enc = CommandEncoder::new();
        let mut wire = Wire::new();

        timer.set_argument("\"0:/gcodes\"");
        timer.set_pending();
        assert!(timer.process(0, true, &mut enc, &mut wire));
        assert_eq!(wire, framed("M20 S2 P\"0:/gcodes\""));
    }

    #[test]
    fn test_oversized_argument_dropped() {
        let mut timer = RequestTimer::new(2000, "M20 S2 P");
        let mut enc = CommandEncoder::new();
        let mut wire = Wire::new();

        let long = [b'x'; ARG_LEN + 1];
        timer.set_argument(core::str::from_utf8(&long).unwrap());
        timer.set_pending();
        assert!(timer.process(0, true, &mut enc, &mut wire));
        assert_eq!(wire, framed("M20 S2 P"));
    }
}
