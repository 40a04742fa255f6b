//! Field-line grammar: `<key>: <integer>` or `<key>: <lowercase tokens>`.
//!
//! The integer form wins when both could apply. Anything after the integer
//! (a ` kB` unit, say) is ignored.

use memchr::memchr;

use crate::cursor::Cursor;
use crate::record::FieldValue;

/// Maximum key length; longer keys do not match.
pub const MAX_KEY_LEN: usize = 20;
/// Maximum text value length; longer values are truncated.
pub const MAX_TEXT_LEN: usize = 32;

/// A line that at least matched `<key>:`.
///
/// `value` is `None` when neither value form matched; the key still counts
/// for terminator detection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldLine<'a> {
    pub key: &'a str,
    pub value: Option<FieldValue>,
}

pub(crate) const fn is_key_char(byte: u8) -> bool {
    byte.is_ascii_alphanumeric() || byte == b'_'
}

const fn is_text_char(byte: u8) -> bool {
    byte.is_ascii_lowercase() || byte == b' '
}

/// Parse one field line (without its line terminator).
#[must_use]
pub fn parse_field_line(line: &[u8]) -> Option<FieldLine<'_>> {
    let colon = memchr(b':', line)?;
    let key_bytes = &line[..colon];
    if key_bytes.is_empty()
        || key_bytes.len() > MAX_KEY_LEN
        || !key_bytes.iter().all(|b| is_key_char(*b))
    {
        return None;
    }
    let key = std::str::from_utf8(key_bytes).ok()?;

    let mut cursor = Cursor::new(&line[colon + 1..]);
    cursor.skip_blanks();
    let value = parse_integer(cursor).or_else(|| parse_text(cursor));

    Some(FieldLine { key, value })
}

fn parse_integer(mut cursor: Cursor<'_>) -> Option<FieldValue> {
    let negative = cursor.eat(b'-');
    if !negative {
        cursor.eat(b'+');
    }
    let digits = cursor.take_class_truncated(usize::MAX, |b| b.is_ascii_digit())?;

    let mut value: i64 = 0;
    for digit in digits {
        value = value.checked_mul(10)?.checked_add(i64::from(digit - b'0'))?;
        if value > i64::from(i32::MAX) + 1 {
            return None;
        }
    }
    let signed = if negative { -value } else { value };
    i32::try_from(signed).ok().map(FieldValue::Integer)
}

fn parse_text(mut cursor: Cursor<'_>) -> Option<FieldValue> {
    let token = cursor.take_class_truncated(MAX_TEXT_LEN, is_text_char)?;
    let text = std::str::from_utf8(token).ok()?.trim_end();
    if text.is_empty() {
        return None;
    }
    Some(FieldValue::Text(text.to_owned()))
}
