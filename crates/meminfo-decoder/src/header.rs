//! Region header grammar.
//!
//! `<hex>-<hex> <perms> <hex-offset> <hex>:<hex> <decimal-id> [<path>]`
//!
//! Token width limits are part of the format contract. A token longer than
//! its limit is a mismatch, except the path which is truncated.

use crate::cursor::{Cursor, is_lower_hex};
use crate::record::RegionHeader;

/// Maximum hex digits in each address bound.
pub const MAX_ADDRESS_DIGITS: usize = 32;
/// Exact width of the permission token.
pub const PERMISSION_WIDTH: usize = 4;
/// Maximum hex digits in the offset.
pub const MAX_OFFSET_DIGITS: usize = 12;
/// Maximum hex digits in the device major (12-bit major).
pub const MAX_DEVICE_MAJOR_DIGITS: usize = 3;
/// Maximum hex digits in the device minor (20-bit minor).
pub const MAX_DEVICE_MINOR_DIGITS: usize = 5;
/// Maximum decimal digits in the id; `u64::MAX` has 20.
pub const MAX_INODE_DIGITS: usize = 20;
/// Maximum path bytes kept; longer paths are truncated on a char boundary.
pub const MAX_PATH_BYTES: usize = 255;

const fn is_permission_char(byte: u8) -> bool {
    matches!(byte, b'r' | b'w' | b'x' | b's' | b'p' | b'-')
}

/// Parse one header line (without its line terminator).
///
/// Returns `None` when the line does not match the grammar.
#[must_use]
pub fn parse_header(line: &[u8]) -> Option<RegionHeader> {
    let mut cursor = Cursor::new(line);

    let start = cursor.take_class(MAX_ADDRESS_DIGITS, is_lower_hex)?;
    if !cursor.eat(b'-') {
        return None;
    }
    let end = cursor.take_class(MAX_ADDRESS_DIGITS, is_lower_hex)?;
    require_blanks(&mut cursor)?;

    let perms = cursor.take_class(PERMISSION_WIDTH, is_permission_char)?;
    if perms.len() != PERMISSION_WIDTH {
        return None;
    }
    require_blanks(&mut cursor)?;

    let offset = cursor.take_class(MAX_OFFSET_DIGITS, is_lower_hex)?;
    require_blanks(&mut cursor)?;

    let dev_major = cursor.take_class(MAX_DEVICE_MAJOR_DIGITS, is_lower_hex)?;
    if !cursor.eat(b':') {
        return None;
    }
    let dev_minor = cursor.take_class(MAX_DEVICE_MINOR_DIGITS, is_lower_hex)?;
    require_blanks(&mut cursor)?;

    let inode_digits = cursor.take_class(MAX_INODE_DIGITS, |b| b.is_ascii_digit())?;
    let inode = ascii(inode_digits).parse::<u64>().ok()?;

    // The id must be followed by a separator or the end of the line.
    let separated = cursor.skip_blanks() > 0;
    if !separated && !cursor.is_at_end() {
        return None;
    }

    Some(RegionHeader {
        start: ascii(start).to_owned(),
        end: ascii(end).to_owned(),
        perms: ascii(perms).to_owned(),
        offset: ascii(offset).to_owned(),
        dev_major: ascii(dev_major).to_owned(),
        dev_minor: ascii(dev_minor).to_owned(),
        inode,
        path: capture_path(cursor.rest()),
    })
}

fn require_blanks(cursor: &mut Cursor<'_>) -> Option<()> {
    (cursor.skip_blanks() > 0).then_some(())
}

/// Tokens reaching here matched an ASCII-only class.
fn ascii(token: &[u8]) -> &str {
    std::str::from_utf8(token).unwrap_or_default()
}

fn capture_path(rest: &[u8]) -> Option<String> {
    let text = String::from_utf8_lossy(rest);
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    let mut cut = trimmed.len().min(MAX_PATH_BYTES);
    while !trimmed.is_char_boundary(cut) {
        cut -= 1;
    }
    Some(trimmed[..cut].to_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_backed_header() {
        let header = parse_header(
            b"7f3a1c200000-7f3a1c222000 r--p 00000000 08:01 1835263                    /usr/lib/x86_64-linux-gnu/libc.so.6",
        )
        .expect("header should parse");
        assert_eq!(header.start, "7f3a1c200000");
        assert_eq!(header.end, "7f3a1c222000");
        assert_eq!(header.perms, "r--p");
        assert_eq!(header.offset, "00000000");
        assert_eq!(header.dev_major, "08");
        assert_eq!(header.dev_minor, "01");
        assert_eq!(header.inode, 1_835_263);
        assert_eq!(
            header.path.as_deref(),
            Some("/usr/lib/x86_64-linux-gnu/libc.so.6")
        );
    }

    #[test]
    fn test_anonymous_header_has_no_path() {
        let header = parse_header(b"7ffd5e3f0000-7ffd5e3f2000 rw-p 00000000 00:00 0")
            .expect("header should parse");
        assert_eq!(header.inode, 0);
        assert_eq!(header.path, None);

        let trailing = parse_header(b"7ffd5e3f0000-7ffd5e3f2000 rw-p 00000000 00:00 0   ")
            .expect("trailing blanks are fine");
        assert_eq!(trailing.path, None);
    }

    #[test]
    fn test_path_keeps_inner_spaces() {
        let header = parse_header(
            b"7f0000000000-7f0000001000 rw-s 00000000 00:05 12 /dev/shm/seg (deleted)",
        )
        .expect("header should parse");
        assert_eq!(header.path.as_deref(), Some("/dev/shm/seg (deleted)"));
    }

    #[test]
    fn test_long_path_truncated() {
        let path = "/".to_owned() + &"a".repeat(400);
        let line = format!("1000-2000 r-xp 00000000 fd:00 77 {path}");
        let header = parse_header(line.as_bytes()).expect("header should parse");
        assert_eq!(header.path.map(|p| p.len()), Some(MAX_PATH_BYTES));
    }

    #[test]
    fn test_field_line_is_not_a_header() {
        assert!(parse_header(b"Rss:                  12 kB").is_none());
        assert!(parse_header(b"VmFlags: rd wr mr mw me ac sd").is_none());
    }

    #[test]
    fn test_width_limits_reject() {
        // 5-char permission token.
        assert!(parse_header(b"1000-2000 rw-pp 00000000 00:00 0").is_none());
        // 3-char permission token.
        assert!(parse_header(b"1000-2000 rw- 00000000 00:00 0").is_none());
        // 13-digit offset.
        assert!(parse_header(b"1000-2000 rw-p 0000000000000 00:00 0").is_none());
        // 4-digit device major, 6-digit minor.
        assert!(parse_header(b"1000-2000 rw-p 00000000 1030:00 0").is_none());
        assert!(parse_header(b"1000-2000 rw-p 00000000 00:1a5000 0").is_none());
        // 21-digit inode.
        assert!(parse_header(b"1000-2000 rw-p 00000000 00:00 100000000000000000000").is_none());
        // 33-digit address.
        let long = format!("{}-2000 rw-p 00000000 00:00 0", "1".repeat(33));
        assert!(parse_header(long.as_bytes()).is_none());
    }

    #[test]
    fn test_wide_device_numbers() {
        let header = parse_header(b"3000-4000 r--p 00000000 00:1a5 123456 /usr/lib/libx.so")
            .expect("minor above 0xff");
        assert_eq!(header.dev_minor, "1a5");
        assert_eq!(header.device(), "00:1a5");

        let header = parse_header(b"3000-4000 r--p 00000000 103:fffff 7")
            .expect("widest major and minor");
        assert_eq!(header.dev_major, "103");
        assert_eq!(header.dev_minor, "fffff");
    }

    #[test]
    fn test_inode_spans_full_u64() {
        let header = parse_header(b"1000-2000 r--p 00000000 08:01 18446744073709551615 /x")
            .expect("u64::MAX inode");
        assert_eq!(header.inode, u64::MAX);
        assert_eq!(header.path.as_deref(), Some("/x"));

        assert!(parse_header(b"1000-2000 r--p 00000000 08:01 18446744073709551616 /x").is_none());
    }

    #[test]
    fn test_grammar_mismatches() {
        assert!(parse_header(b"").is_none());
        assert!(parse_header(b"1000 2000 rw-p 00000000 00:00 0").is_none());
        assert!(parse_header(b"1000-2000 rw-p 00000000 0000 0").is_none());
        assert!(parse_header(b"1000-2000 rw-p 00000000 00:00").is_none());
        assert!(parse_header(b"1000-2000 rw-p 00000000 00:00 12ab").is_none());
        assert!(parse_header(b"1000-2000 rwzp 00000000 00:00 0").is_none());
        assert!(parse_header(b"ABCD-2000 rw-p 00000000 00:00 0").is_none());
    }
}
