//! Incremental parser for the inbound status stream.
//!
//! The board sends one restricted JSON-like object per newline-terminated
//! record. The grammar is deliberately flat:
//!
//! ```text
//! object := '{' ( pair ( ',' pair )* )? '}'
//! pair   := '"' name '"' ':' value
//! value  := string | number | '[' ( value ( ',' value )* )? ']'
//! ```
//!
//! Numbers are an optional `-`, digits, and at most one `.` followed by more
//! digits; no exponents. Strings pass `\"` and `\\` through, turn `\n` and
//! `\t` into a single space and drop every other escape. Nested objects and
//! nested arrays are protocol errors.
//!
//! [`ReceiveParser::feed`] consumes exactly one byte, never blocks, and
//! reports results through a [`ResponseSink`]: `start_message` when the
//! opening `{` is seen, one `field` call per completed value (a comma, an
//! array's `]` or the object's `}` completes a value) and `end_message` when
//! the top-level `}` closes cleanly. A record that violates the grammar is
//! dropped from the offending byte onwards: the parser discards input until
//! the next raw newline, which resets it from *any* state, so a lost or
//! corrupted frame costs at most one line.
//!
//! Overflow handling is asymmetric on purpose, matching the link peer's
//! expectations: a field name longer than [`FIELD_ID_LEN`] is a hard error
//! (the whole object is dropped), while a value longer than
//! [`FIELD_VALUE_LEN`] is silently truncated and the object continues.

use heapless::String;

/// Capacity of the field-name buffer in bytes
pub const FIELD_ID_LEN: usize = 20;

/// Capacity of the field-value buffer in bytes
pub const FIELD_VALUE_LEN: usize = 100;

/// Receives decoded results from [`ReceiveParser`]
pub trait ResponseSink {
    /// A new top-level object has started (its `{` was consumed)
    fn start_message(&mut self);

    /// A complete field value has been decoded
    ///
    /// - `name`: the field name (shared by all elements of an array field)
    /// - `value`: the raw value text, unescaped but not yet number-decoded
    /// - `index`: `Some(n)` for the n-th element of an array value,
    ///   `None` for a bare scalar
    fn field(&mut self, name: &str, value: &str, index: Option<u16>);

    /// The current object's top-level `}` was consumed cleanly
    ///
    /// Never called for an object that entered the error state.
    fn end_message(&mut self);
}

/// Parser states for the inbound status stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParserState {
    /// Waiting for the opening `{`; everything else is ignored
    Begin,
    /// Inside the object, expecting a quoted field name or `}`
    ExpectId,
    /// Accumulating a field name
    Id,
    /// Field name closed, expecting `:`
    HadId,
    /// Expecting a value (or `[`, or the `]` of an empty array)
    Val,
    /// Accumulating a string value
    StringVal,
    /// Just saw a backslash inside a string value
    StringEscape,
    /// Saw a leading `-`, expecting the first digit
    NegIntVal,
    /// Accumulating the integer part of a number
    IntVal,
    /// Accumulating the fractional part of a number
    FracVal,
    /// Value complete, expecting `,`, `]` or `}`
    EndVal,
    /// Grammar violated; discarding bytes until the next newline
    Error,
}

/// State machine decoding the status stream one byte at a time
#[derive(Debug)]
pub struct ReceiveParser {
    state: ParserState,
    field_id: String<FIELD_ID_LEN>,
    field_value: String<FIELD_VALUE_LEN>,
    /// `Some(n)` while inside an array: elements emitted so far
    array_index: Option<u16>,
    /// A completed value sits in `field_value` awaiting its delimiter
    value_pending: bool,
}

impl Default for ReceiveParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ReceiveParser {
    /// Create a parser in the `Begin` state
    pub const fn new() -> Self {
        Self {
            state: ParserState::Begin,
            field_id: String::new(),
            field_value: String::new(),
            array_index: None,
            value_pending: false,
        }
    }

    /// Current state (diagnostics and tests)
    pub fn state(&self) -> ParserState {
        self.state
    }

    /// Abandon any partial parse and return to `Begin`
    pub fn reset(&mut self) {
        self.state = ParserState::Begin;
        self.field_id.clear();
        self.field_value.clear();
        self.array_index = None;
        self.value_pending = false;
    }

    /// Consume one byte from the link
    ///
    /// May invoke any number of [`ResponseSink`] callbacks. A raw newline
    /// unconditionally resets the parser; nothing is emitted for a record
    /// interrupted this way.
    pub fn feed<S: ResponseSink>(&mut self, byte: u8, sink: &mut S) {
        if byte == b'\n' {
            // Line boundary: the one and only resynchronization point.
            self.reset();
            return;
        }

        match self.state {
            ParserState::Begin => {
                if byte == b'{' {
                    self.field_id.clear();
                    self.field_value.clear();
                    self.array_index = None;
                    self.value_pending = false;
                    sink.start_message();
                    self.state = ParserState::ExpectId;
                }
                // Inter-record garbage (including '\r') is ignored here.
            }

            ParserState::ExpectId => match byte {
                b' ' => {}
                b'"' => {
                    self.field_id.clear();
                    self.state = ParserState::Id;
                }
                // Empty object, or a trailing comma after the last pair.
                b'}' => {
                    sink.end_message();
                    self.state = ParserState::Begin;
                }
                _ => self.state = ParserState::Error,
            },

            ParserState::Id => match byte {
                b'"' => self.state = ParserState::HadId,
                b if b < b' ' => self.state = ParserState::Error,
                b => {
                    // Overlong names drop the whole object.
                    if self.field_id.push(b as char).is_err() {
                        self.state = ParserState::Error;
                    }
                }
            },

            ParserState::HadId => match byte {
                b':' => self.state = ParserState::Val,
                b' ' => {}
                _ => self.state = ParserState::Error,
            },

            ParserState::Val => match byte {
                b' ' => {}
                b'"' => {
                    self.field_value.clear();
                    self.state = ParserState::StringVal;
                }
                b'[' => {
                    if self.array_index.is_some() {
                        // One level of array only.
                        self.state = ParserState::Error;
                    } else {
                        self.array_index = Some(0);
                    }
                }
                b']' => {
                    // Legal only directly after '[': the empty array.
                    // It has no elements and emits no field events.
                    if self.array_index == Some(0) {
                        self.array_index = None;
                        self.value_pending = false;
                        self.state = ParserState::EndVal;
                    } else {
                        self.state = ParserState::Error;
                    }
                }
                b'-' => {
                    self.field_value.clear();
                    let _ = self.field_value.push('-');
                    self.state = ParserState::NegIntVal;
                }
                b'0'..=b'9' => {
                    self.field_value.clear();
                    let _ = self.field_value.push(byte as char);
                    self.state = ParserState::IntVal;
                }
                _ => self.state = ParserState::Error,
            },

            ParserState::StringVal => match byte {
                b'"' => {
                    self.value_pending = true;
                    self.state = ParserState::EndVal;
                }
                b'\\' => self.state = ParserState::StringEscape,
                b if b < b' ' => self.state = ParserState::Error,
                b => {
                    // Overlong values are truncated, not rejected.
                    let _ = self.field_value.push(b as char);
                }
            },

            ParserState::StringEscape => {
                match byte {
                    b'"' | b'\\' => {
                        let _ = self.field_value.push(byte as char);
                    }
                    b'n' | b't' => {
                        let _ = self.field_value.push(' ');
                    }
                    // Every other escape is dropped.
                    _ => {}
                }
                self.state = ParserState::StringVal;
            }

            ParserState::NegIntVal => match byte {
                b'0'..=b'9' => {
                    let _ = self.field_value.push(byte as char);
                    self.state = ParserState::IntVal;
                }
                _ => self.state = ParserState::Error,
            },

            ParserState::IntVal => match byte {
                b'0'..=b'9' => {
                    let _ = self.field_value.push(byte as char);
                }
                b'.' => {
                    let _ = self.field_value.push('.');
                    self.state = ParserState::FracVal;
                }
                b',' | b']' | b'}' => {
                    self.value_pending = true;
                    self.delimit(byte, sink);
                }
                _ => self.state = ParserState::Error,
            },

            ParserState::FracVal => match byte {
                b'0'..=b'9' => {
                    let _ = self.field_value.push(byte as char);
                }
                b',' | b']' | b'}' => {
                    self.value_pending = true;
                    self.delimit(byte, sink);
                }
                // A second '.' lands here and is rejected.
                _ => self.state = ParserState::Error,
            },

            ParserState::EndVal => match byte {
                b' ' => {}
                b',' | b']' | b'}' => self.delimit(byte, sink),
                _ => self.state = ParserState::Error,
            },

            ParserState::Error => {
                // Discard everything until the newline resets us.
            }
        }
    }

    /// Convenience wrapper feeding a whole slice
    pub fn feed_bytes<S: ResponseSink>(&mut self, bytes: &[u8], sink: &mut S) {
        for &byte in bytes {
            self.feed(byte, sink);
        }
    }

    /// Handle a value delimiter: `,`, `]` or `}`
    ///
    /// Emits the pending field event (if any), maintains the array index
    /// and picks the follow-on state.
    fn delimit<S: ResponseSink>(&mut self, byte: u8, sink: &mut S) {
        match byte {
            b',' => {
                self.flush_field(sink);
                if let Some(i) = self.array_index {
                    // Next element of the same field.
                    self.array_index = Some(i.saturating_add(1));
                    self.state = ParserState::Val;
                } else {
                    self.state = ParserState::ExpectId;
                }
            }
            b']' => {
                if self.array_index.is_none() {
                    self.state = ParserState::Error;
                } else {
                    self.flush_field(sink);
                    self.array_index = None;
                    self.state = ParserState::EndVal;
                }
            }
            b'}' => {
                if self.array_index.is_some() {
                    self.state = ParserState::Error;
                } else {
                    self.flush_field(sink);
                    sink.end_message();
                    self.state = ParserState::Begin;
                }
            }
            _ => self.state = ParserState::Error,
        }
    }

    /// Emit the pending field event and clear the value buffer
    fn flush_field<S: ResponseSink>(&mut self, sink: &mut S) {
        if self.value_pending {
            sink.field(
                self.field_id.as_str(),
                self.field_value.as_str(),
                self.array_index,
            );
            self.field_value.clear();
            self.value_pending = false;
        }
    }
}


// Grammar round-trip: any conforming object must come back out as exactly
// the encoded (name, value, index) triples in source order.
#[cfg(test)]
mod proptests {
    extern crate std;

    use super::*;
    use proptest::prelude::*;
    use std::string::String as StdString;
    use std::vec::Vec as StdVec;

    #[derive(Debug, Clone)]
    enum GenValue {
        Str(StdString),
        Num(StdString),
        Array(StdVec<StdString>),
    }

    fn name_strategy() -> impl Strategy<Value = StdString> {
        "[A-Za-z_][A-Za-z0-9_]{0,14}"
    }

    fn number_strategy() -> impl Strategy<Value = StdString> {
        (any::<bool>(), 0u32..100000, proptest::option::of(0u32..1000)).prop_map(
            |(neg, int, frac)| {
                use core::fmt::Write;
                let mut s = StdString::new();
                if neg {
                    s.push('-');
                }
                let _ = write!(s, "{}", int);
                if let Some(f) = frac {
                    let _ = write!(s, ".{}", f);
                }
                s
            },
        )
    }

    fn string_strategy() -> impl Strategy<Value = StdString> {
        // Printable ASCII minus '"' and '\\' so no escaping is involved.
        "[ !#-\\[\\]-~]{0,20}"
    }

    fn value_strategy() -> impl Strategy<Value = GenValue> {
        prop_oneof![
            string_strategy().prop_map(GenValue::Str),
            number_strategy().prop_map(GenValue::Num),
            proptest::collection::vec(number_strategy(), 1..5).prop_map(GenValue::Array),
        ]
    }

    #[derive(Default)]
    struct Collector {
        triples: StdVec<(StdString, StdString, Option<u16>)>,
        ended: bool,
    }

    impl ResponseSink for Collector {
        fn start_message(&mut self) {}

        fn field(&mut self, name: &str, value: &str, index: Option<u16>) {
            self.triples
                .push((StdString::from(name), StdString::from(value), index));
        }

        fn end_message(&mut self) {
            self.ended = true;
        }
    }

    proptest! {
        #[test]
        fn grammar_round_trip(
            pairs in proptest::collection::vec((name_strategy(), value_strategy()), 0..6)
        ) {
            // Encode.
            let mut wire = StdString::from("{");
            for (i, (name, value)) in pairs.iter().enumerate() {
                if i > 0 {
                    wire.push(',');
                }
                wire.push('"');
                wire.push_str(name);
                wire.push_str("\":");
                match value {
                    GenValue::Str(s) => {
                        wire.push('"');
                        wire.push_str(s);
                        wire.push('"');
                    }
                    GenValue::Num(n) => wire.push_str(n),
                    GenValue::Array(elems) => {
                        wire.push('[');
                        for (j, e) in elems.iter().enumerate() {
                            if j > 0 {
                                wire.push(',');
                            }
                            wire.push_str(e);
                        }
                        wire.push(']');
                    }
                }
            }
            wire.push('}');

            // Expected triples in source order.
            let mut expected = StdVec::new();
            for (name, value) in &pairs {
                match value {
                    GenValue::Str(s) => {
                        expected.push((name.clone(), s.clone(), None));
                    }
                    GenValue::Num(n) => {
                        expected.push((name.clone(), n.clone(), None));
                    }
                    GenValue::Array(elems) => {
                        for (j, e) in elems.iter().enumerate() {
                            expected.push((name.clone(), e.clone(), Some(j as u16)));
                        }
                    }
                }
            }

            // Decode.
            let mut parser = ReceiveParser::new();
            let mut sink = Collector::default();
            parser.feed_bytes(wire.as_bytes(), &mut sink);

            prop_assert!(sink.ended);
            prop_assert_eq!(sink.triples, expected);
        }
    }
}
