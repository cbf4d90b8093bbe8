//! The polling engine driving the control link.
//!
//! The board never pushes state on its own; the pendant asks. The
//! [`PollEngine`] owns the receive parser, the command encoder, the
//! machine model and one [`RequestTimer`] per request kind, and decides
//! on every tick which single request (if any) goes out next:
//!
//! 1. configuration (`M408 S1`), until a config-bearing response arrives
//! 2. macro listing (`M20 S2 P"0:/macros"`)
//! 3. file listing (`M20 S2 P"<dir>"`), when the UI asked for one
//! 4. print file metadata (`M36`), while a print is active
//! 5. the status poll (`M408`), as fallback
//!
//! Requests 1-4 are gated: they wait until the pendant is connected and
//! the printer is in a state that accepts commands. The status poll is
//! never gated, because it is how the pendant discovers the printer in
//! the first place; it asks for the full `S1` report until the
//! configuration has been seen and the lean `S0` report afterwards.
//!
//! Each request timer stops when its answer is observed on the wire, so
//! a healthy link settles into nothing but the status poll. A link that
//! stays silent past the connection timeout drops back to the
//! disconnected state and the discovery cycle starts over.

use heapless::String;

use thigma_protocol::timer::ARG_LEN;
use thigma_protocol::{ByteSink, CommandEncoder, ReceiveParser, RequestTimer, ResponseSink};

use crate::fields;
use crate::model::MachineModel;
use crate::status::PrinterStatus;

/// Status poll period
pub const STATUS_POLL_MS: u32 = 1000;

/// Configuration request period while unanswered
pub const CONFIG_POLL_MS: u32 = 5000;

/// Directory listing request period while unanswered
pub const FILE_LIST_POLL_MS: u32 = 2000;

/// Print file metadata request period while unanswered
pub const FILE_INFO_POLL_MS: u32 = 2000;

/// Silence on the link longer than this drops the connection
pub const CONNECT_TIMEOUT_MS: u32 = 8000;

/// Directory holding the user's macro files
pub const MACRO_DIR: &str = "0:/macros";

/// What a completed response contained, for stop-on-observe
#[derive(Debug, Default)]
struct Observations {
    message_complete: bool,
    config: bool,
    file_list: bool,
    file_info: bool,
    err: bool,
}

impl Observations {
    fn begin_message(&mut self) {
        *self = Self::default();
    }

    fn note_field(&mut self, name: &str) {
        // Geometry is the last identity field of the extended report, so
        // its arrival stands for the whole configuration answer.
        if name.eq_ignore_ascii_case("geometry") {
            self.config = true;
        } else if name.eq_ignore_ascii_case("files") || name.eq_ignore_ascii_case("dir") {
            self.file_list = true;
        } else if name.eq_ignore_ascii_case("height")
            || name.eq_ignore_ascii_case("generatedBy")
            || name.eq_ignore_ascii_case("size")
            || name.eq_ignore_ascii_case("filament")
        {
            self.file_info = true;
        } else if name.eq_ignore_ascii_case("err") {
            self.err = true;
        }
    }
}

/// Routes parser events into the model and records what was seen
struct ModelSink<'a> {
    model: &'a mut MachineModel,
    observed: &'a mut Observations,
}

impl ResponseSink for ModelSink<'_> {
    fn start_message(&mut self) {
        self.observed.begin_message();
    }

    fn field(&mut self, name: &str, value: &str, index: Option<u16>) {
        self.observed.note_field(name);
        // Unknown names are fields from newer board firmware; skip them.
        let _ = fields::apply(self.model, name, value, index);
    }

    fn end_message(&mut self) {
        self.observed.message_complete = true;
    }
}

/// Link driver: feed received bytes in, tick commands out
#[derive(Debug)]
pub struct PollEngine {
    model: MachineModel,
    parser: ReceiveParser,
    encoder: CommandEncoder,
    observed: Observations,

    status_timer: RequestTimer,
    config_timer: RequestTimer,
    macros_timer: RequestTimer,
    files_timer: RequestTimer,
    info_timer: RequestTimer,

    connected: bool,
    config_seen: bool,
    last_response_ms: u32,
    print_was_active: bool,
}

impl Default for PollEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl PollEngine {
    pub fn new() -> Self {
        let mut status_timer = RequestTimer::new(STATUS_POLL_MS, "M408 S");
        // Full report until the configuration has been seen.
        status_timer.set_argument("1");
        status_timer.set_pending();

        Self {
            model: MachineModel::new(),
            parser: ReceiveParser::new(),
            encoder: CommandEncoder::new(),
            observed: Observations::default(),
            status_timer,
            config_timer: RequestTimer::new(CONFIG_POLL_MS, "M408 S1"),
            macros_timer: RequestTimer::new(FILE_LIST_POLL_MS, "M20 S2 P\"0:/macros\""),
            files_timer: RequestTimer::new(FILE_LIST_POLL_MS, "M20 S2 P"),
            info_timer: RequestTimer::new(FILE_INFO_POLL_MS, "M36"),
            connected: false,
            config_seen: false,
            last_response_ms: 0,
            print_was_active: false,
        }
    }

    pub fn model(&self) -> &MachineModel {
        &self.model
    }

    /// Mutable model access, for the UI's `take_*` accessors
    pub fn model_mut(&mut self) -> &mut MachineModel {
        &mut self.model
    }

    /// A response has been seen within the connection timeout
    pub fn is_connected(&self) -> bool {
        self.connected
    }

    /// Consume one byte received from the board
    pub fn feed_byte(&mut self, now_ms: u32, byte: u8) {
        let mut sink = ModelSink {
            model: &mut self.model,
            observed: &mut self.observed,
        };
        self.parser.feed(byte, &mut sink);
        if self.observed.message_complete {
            self.handle_response(now_ms);
        }
    }

    /// Consume a chunk received from the board
    pub fn feed_bytes(&mut self, now_ms: u32, bytes: &[u8]) {
        for &byte in bytes {
            self.feed_byte(now_ms, byte);
        }
    }

    /// Advance time and emit at most one due request into `sink`
    ///
    /// Returns whether a command was sent.
    pub fn tick<S: ByteSink>(&mut self, now_ms: u32, sink: &mut S) -> bool {
        if self.connected && now_ms.wrapping_sub(self.last_response_ms) > CONNECT_TIMEOUT_MS {
            self.connected = false;
            self.model.set_status(PrinterStatus::Unknown);
        }

        let gate = self.connected && self.model.status().ready_for_requests();

        self.config_timer
            .process(now_ms, gate, &mut self.encoder, sink)
            || self
                .macros_timer
                .process(now_ms, gate, &mut self.encoder, sink)
            || self
                .files_timer
                .process(now_ms, gate, &mut self.encoder, sink)
            || self
                .info_timer
                .process(now_ms, gate, &mut self.encoder, sink)
            || self
                .status_timer
                .process(now_ms, true, &mut self.encoder, sink)
    }

    /// Ask for the listing of `dir`; polls until the board answers
    pub fn request_files(&mut self, dir: &str) {
        let mut quoted: String<ARG_LEN> = String::new();
        let fits = quoted.push('"').is_ok()
            && quoted.push_str(dir).is_ok()
            && quoted.push('"').is_ok();
        if fits {
            self.files_timer.set_argument(&quoted);
            self.files_timer.set_pending();
        }
    }

    /// Ask for a fresh macro listing
    pub fn request_macros(&mut self) {
        self.macros_timer.set_pending();
    }

    /// Ask for the configuration report again
    pub fn request_config(&mut self) {
        self.config_timer.set_pending();
    }

    /// Ask for the metadata of the file being printed
    pub fn request_file_info(&mut self) {
        self.info_timer.set_pending();
    }

    /// Frame and send one command line immediately, outside the timers
    ///
    /// Used for direct user actions (pause, resume, temperature changes)
    /// that must not wait for a poll slot.
    pub fn send_command<S: ByteSink>(&mut self, sink: &mut S, line: &str) {
        self.encoder.send_line(sink, line);
    }

    /// A complete response record was parsed
    fn handle_response(&mut self, now_ms: u32) {
        let observed = core::mem::take(&mut self.observed);
        self.note_alive(now_ms);

        if observed.config {
            self.config_seen = true;
            self.config_timer.stop();
            // The lean status report is enough from here on.
            self.status_timer.set_argument("0");
        }
        if observed.file_list {
            if self.model.files_dir().starts_with(MACRO_DIR) {
                self.macros_timer.stop();
            } else {
                self.files_timer.stop();
            }
        }
        // Listings carry err alongside their directory; a bare err
        // record is the board declining the metadata query.
        if observed.file_info || (observed.err && !observed.file_list) {
            self.info_timer.stop();
        }

        let print_active = self.model.status().is_print_active();
        if print_active && !self.print_was_active {
            self.info_timer.set_pending();
        } else if !print_active && self.print_was_active {
            self.info_timer.stop();
        }
        self.print_was_active = print_active;
    }

    fn note_alive(&mut self, now_ms: u32) {
        self.last_response_ms = now_ms;
        if !self.connected {
            self.connected = true;
            // A different board may be on the other end now; rediscover.
            self.config_seen = false;
            self.status_timer.set_argument("1");
            self.config_timer.set_pending();
            self.macros_timer.set_pending();
        }
    }
}
