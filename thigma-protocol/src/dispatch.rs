//! Field lookup tables and value decoding.
//!
//! Parsed fields are routed through static tables of `(name, handler)`
//! pairs. The tables are sorted once at build time and searched with a
//! case-insensitive binary search, so dispatch cost is logarithmic in the
//! table size and no per-lookup storage is needed. Unknown names simply
//! miss, which is how fields from newer peer firmware are ignored.
//!
//! Value text stays raw until a handler asks for a number:
//! [`decode_int`] accepts both `"26"` and `"26.8"` (the latter rounds
//! half away from zero), because peers disagree on whether temperatures
//! and percentages carry a fractional part.

use core::cmp::Ordering;

/// ASCII case-insensitive ordering of two names
fn compare_ignore_case(a: &str, b: &str) -> Ordering {
    a.bytes()
        .map(|byte| byte.to_ascii_lowercase())
        .cmp(b.bytes().map(|byte| byte.to_ascii_lowercase()))
}

/// Sorted table mapping field names to handlers
///
/// `H` is the handler type, typically a `fn` pointer. Entries must be
/// sorted by [`compare_ignore_case`] with no duplicates; `is_sorted`
/// verifies this in tests.
#[derive(Debug)]
pub struct FieldTable<H: 'static> {
    entries: &'static [(&'static str, H)],
}

impl<H> FieldTable<H> {
    pub const fn new(entries: &'static [(&'static str, H)]) -> Self {
        Self { entries }
    }

    /// Case-insensitive binary search for `name`
    pub fn lookup(&self, name: &str) -> Option<&H> {
        self.entries
            .binary_search_by(|(entry, _)| compare_ignore_case(entry, name))
            .ok()
            .map(|i| &self.entries[i].1)
    }

    /// Entries strictly ascending under the search ordering
    pub fn is_sorted(&self) -> bool {
        self.entries
            .windows(2)
            .all(|pair| compare_ignore_case(pair[0].0, pair[1].0) == Ordering::Less)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Decode an integer field value
///
/// Tries a strict integer parse first, then falls back to a float parse
/// rounded half away from zero. Out-of-range floats saturate. Returns
/// `None` for text that is not a number at all.
pub fn decode_int(text: &str) -> Option<i32> {
    if let Ok(value) = text.parse::<i32>() {
        return Some(value);
    }
    decode_float(text).map(|value| {
        if value < 0.0 {
            (value - 0.5) as i32
        } else {
            (value + 0.5) as i32
        }
    })
}

/// Decode a float field value
pub fn decode_float(text: &str) -> Option<f32> {
    text.parse::<f32>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    static NUMBERS: FieldTable<u8> = FieldTable::new(&[("alpha", 1), ("Beta", 2), ("GAMMA", 3)]);

    #[test]
    fn test_lookup_ignores_case() {
        assert_eq!(NUMBERS.lookup("alpha"), Some(&1));
        assert_eq!(NUMBERS.lookup("ALPHA"), Some(&1));
        assert_eq!(NUMBERS.lookup("beta"), Some(&2));
        assert_eq!(NUMBERS.lookup("gAmMa"), Some(&3));
    }

    #[test]
    fn test_lookup_unknown_misses() {
        assert_eq!(NUMBERS.lookup("delta"), None);
        assert_eq!(NUMBERS.lookup(""), None);
        assert_eq!(NUMBERS.lookup("alphaa"), None);
        assert_eq!(NUMBERS.lookup("alph"), None);
    }

    #[test]
    fn test_sortedness_check() {
        assert!(NUMBERS.is_sorted());

        static BACKWARDS: FieldTable<u8> = FieldTable::new(&[("b", 1), ("a", 2)]);
        assert!(!BACKWARDS.is_sorted());

        // Duplicates under case folding are also rejected.
        static DOUBLED: FieldTable<u8> = FieldTable::new(&[("a", 1), ("A", 2)]);
        assert!(!DOUBLED.is_sorted());
    }

    #[test]
    fn test_decode_int_strict() {
        assert_eq!(decode_int("42"), Some(42));
        assert_eq!(decode_int("-7"), Some(-7));
        assert_eq!(decode_int("0"), Some(0));
    }

    #[test]
    fn test_decode_int_float_fallback() {
        assert_eq!(decode_int("26.8"), Some(27));
        assert_eq!(decode_int("26.4"), Some(26));
        assert_eq!(decode_int("-3.5"), Some(-4));
        assert_eq!(decode_int("-3.4"), Some(-3));
        assert_eq!(decode_int("100.0"), Some(100));
    }

    #[test]
    fn test_decode_int_saturates() {
        assert_eq!(decode_int("9999999999.0"), Some(i32::MAX));
        assert_eq!(decode_int("-9999999999.0"), Some(i32::MIN));
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert_eq!(decode_int(""), None);
        assert_eq!(decode_int("abc"), None);
        assert_eq!(decode_int("12x"), None);
        assert_eq!(decode_float(""), None);
        assert_eq!(decode_float("five"), None);
    }

    #[test]
    fn test_decode_float() {
        assert_eq!(decode_float("1.5"), Some(1.5));
        assert_eq!(decode_float("-0.25"), Some(-0.25));
        assert_eq!(decode_float("3"), Some(3.0));
    }
}
